//! Sticky-note geometry and the coalescing reposition scheduler.
//!
//! Notes are fixed-size overlays anchored to a target section's rectangle.
//! Placement math is pure cell arithmetic so it is testable without a
//! terminal; the CLI maps the resulting rect straight onto its frame.

use crate::message::Directive;

pub const NOTE_WIDTH: u16 = 34;
pub const NOTE_HEIGHT: u16 = 7;
/// Minimum gap kept between a note and the screen edge.
pub const SCREEN_MARGIN: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotePlacement {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
    Center,
}

impl NotePlacement {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
            Some("top-left") => Self::TopLeft,
            Some("bottom-right") => Self::BottomRight,
            Some("bottom-left") => Self::BottomLeft,
            Some("center") => Self::Center,
            _ => Self::TopRight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl CellRect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteGeometry {
    pub placement: NotePlacement,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl NoteGeometry {
    pub fn from_directive(directive: &Directive) -> Self {
        Self {
            placement: NotePlacement::parse(directive.prop_str("placement")),
            offset_x: directive.prop_f64("offsetX").unwrap_or(0.0) as i32,
            offset_y: directive.prop_f64("offsetY").unwrap_or(0.0) as i32,
        }
    }
}

/// Compute the note rect for an anchor, clamped inside the screen with a
/// one-cell margin. A screen too small to hold the note returns `None`.
pub fn place_note(geometry: NoteGeometry, anchor: CellRect, screen: CellRect) -> Option<CellRect> {
    if screen.width < NOTE_WIDTH + 2 * SCREEN_MARGIN
        || screen.height < NOTE_HEIGHT + 2 * SCREEN_MARGIN
    {
        return None;
    }

    let (base_x, base_y) = match geometry.placement {
        NotePlacement::TopRight => (
            i32::from(anchor.x) + i32::from(anchor.width) - i32::from(NOTE_WIDTH),
            i32::from(anchor.y) - 1,
        ),
        NotePlacement::TopLeft => (i32::from(anchor.x), i32::from(anchor.y) - 1),
        NotePlacement::BottomRight => (
            i32::from(anchor.x) + i32::from(anchor.width) - i32::from(NOTE_WIDTH),
            i32::from(anchor.y) + i32::from(anchor.height) - i32::from(NOTE_HEIGHT) + 1,
        ),
        NotePlacement::BottomLeft => (
            i32::from(anchor.x),
            i32::from(anchor.y) + i32::from(anchor.height) - i32::from(NOTE_HEIGHT) + 1,
        ),
        NotePlacement::Center => (
            i32::from(anchor.x) + (i32::from(anchor.width) - i32::from(NOTE_WIDTH)) / 2,
            i32::from(anchor.y) + (i32::from(anchor.height) - i32::from(NOTE_HEIGHT)) / 2,
        ),
    };

    let min_x = i32::from(screen.x) + i32::from(SCREEN_MARGIN);
    let max_x = i32::from(screen.x) + i32::from(screen.width)
        - i32::from(NOTE_WIDTH)
        - i32::from(SCREEN_MARGIN);
    let min_y = i32::from(screen.y) + i32::from(SCREEN_MARGIN);
    let max_y = i32::from(screen.y) + i32::from(screen.height)
        - i32::from(NOTE_HEIGHT)
        - i32::from(SCREEN_MARGIN);

    let x = (base_x + geometry.offset_x).clamp(min_x, max_x);
    let y = (base_y + geometry.offset_y).clamp(min_y, max_y);
    Some(CellRect::new(x as u16, y as u16, NOTE_WIDTH, NOTE_HEIGHT))
}

/// Coalesces reposition requests so a burst of anchor-layout changes causes
/// one recomputation. `request` may be called any number of times before the
/// next `take`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositionScheduler {
    pending: bool,
}

impl RepositionScheduler {
    pub fn request(&mut self) {
        self.pending = true;
    }

    /// Returns true once per batch of requests and resets.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn cancel(&mut self) {
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn screen() -> CellRect {
        CellRect::new(0, 0, 120, 40)
    }

    #[test]
    fn default_placement_hangs_off_the_anchor_top_right() {
        let geometry = NoteGeometry::from_directive(&Directive::new("StickyNote"));
        let rect = place_note(geometry, CellRect::new(60, 10, 40, 8), screen())
            .expect("screen fits the note");
        assert_eq!(rect.x, 66);
        assert_eq!(rect.y, 9);
        assert_eq!((rect.width, rect.height), (NOTE_WIDTH, NOTE_HEIGHT));
    }

    #[test]
    fn offsets_shift_and_clamping_keeps_the_margin() {
        let directive = Directive::new("StickyNote")
            .with("offsetX", json!(500))
            .with("offsetY", json!(-500));
        let geometry = NoteGeometry::from_directive(&directive);
        let rect = place_note(geometry, CellRect::new(10, 10, 20, 5), screen())
            .expect("screen fits the note");
        assert_eq!(rect.x, 120 - NOTE_WIDTH - SCREEN_MARGIN);
        assert_eq!(rect.y, SCREEN_MARGIN);
    }

    #[test]
    fn tiny_screen_yields_no_rect() {
        let geometry = NoteGeometry::from_directive(&Directive::new("StickyNote"));
        assert_eq!(
            place_note(geometry, CellRect::new(0, 0, 10, 4), CellRect::new(0, 0, 20, 6)),
            None
        );
    }

    #[test]
    fn scheduler_coalesces_bursts() {
        let mut scheduler = RepositionScheduler::default();
        scheduler.request();
        scheduler.request();
        scheduler.request();
        assert!(scheduler.take());
        assert!(!scheduler.take());

        scheduler.request();
        scheduler.cancel();
        assert!(!scheduler.take());
    }
}
