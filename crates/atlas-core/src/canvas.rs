//! Side-effect reconciler: derives the renderable canvas from the normalized
//! message stream plus locally dispatched entries.
//!
//! The canvas is never mutated in place. Every change to the inputs re-runs
//! the derivation, so replayed or out-of-order deliveries converge on the
//! same set of entries.

use std::collections::HashSet;

use crate::message::canonical_json;
use crate::message::ChatMessage;
use crate::message::Directive;
use crate::registry::ComponentKind;
use crate::registry::ComponentRegistry;
use serde_json::Value;

/// Most recent sticky notes kept on screen at once.
pub const STICKY_NOTE_CAP: usize = 3;
/// Bound on locally dispatched entries awaiting reconciliation.
pub const LOCAL_ENTRY_CAP: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    Stream,
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasEntry {
    pub key: String,
    pub kind: ComponentKind,
    pub directive: Directive,
    pub origin: EntryOrigin,
}

impl CanvasEntry {
    fn from_directive(
        directive: &Directive,
        origin: EntryOrigin,
        fallback_key: impl FnOnce() -> String,
    ) -> Option<Self> {
        let kind = ComponentKind::parse(&directive.component_name)?;
        let key = directive
            .prop_str("id")
            .map(str::to_string)
            .unwrap_or_else(fallback_key);
        Some(Self {
            key,
            kind,
            directive: directive.clone(),
            origin,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamExtract {
    pub entries: Vec<CanvasEntry>,
    pub removed_ids: Vec<String>,
}

/// Walk the normalized stream and pull out every directive with a known
/// component name, plus the union of removal signals. Unknown component
/// names are skipped, never an error.
pub fn extract_entries(messages: &[ChatMessage]) -> StreamExtract {
    let mut extract = StreamExtract::default();
    for (idx, message) in messages.iter().enumerate() {
        for removed in &message.removed_component_ids {
            if !extract.removed_ids.contains(removed) {
                extract.removed_ids.push(removed.clone());
            }
        }
        let Some(directive) = &message.directive else {
            continue;
        };
        let entry = CanvasEntry::from_directive(directive, EntryOrigin::Stream, || {
            let anchor = message
                .id
                .clone()
                .unwrap_or_else(|| format!("idx-{idx}"));
            format!(
                "{}:{}:{}",
                anchor,
                directive.component_name,
                canonical_json(&Value::Object(directive.props.clone()))
            )
        });
        if let Some(entry) = entry {
            extract.entries.push(entry);
        }
    }
    extract
}

/// Build a local entry. Keys carry a monotonic dispatch sequence so two
/// dispatches of the same directive stay distinct.
pub fn local_entry(directive: &Directive, seq: u64, idx: usize) -> Option<CanvasEntry> {
    CanvasEntry::from_directive(directive, EntryOrigin::Local, || {
        format!("local-{seq}-{idx}-{}", directive.component_name)
    })
}

/// Merge stream and local entries into the final canvas set.
///
/// Local entries come after stream entries so a local dispatch wins the
/// latest-wins race. Per key, the latest occurrence wins; per component kind,
/// everything except sticky notes is single-instance (latest wins), and
/// sticky notes keep the most recent `STICKY_NOTE_CAP`. Entries whose key is
/// in the removal set are dropped.
pub fn reconcile(
    stream: &[CanvasEntry],
    local: &[CanvasEntry],
    removed_ids: &[String],
) -> Vec<CanvasEntry> {
    let removed: HashSet<&str> = removed_ids.iter().map(String::as_str).collect();
    let merged: Vec<&CanvasEntry> = stream
        .iter()
        .chain(local.iter())
        .filter(|entry| !removed.contains(entry.key.as_str()))
        .filter(|entry| ComponentRegistry::lookup(&entry.directive.component_name).is_some())
        .collect();

    // Latest occurrence per key wins, keeping the latest position.
    let mut deduped: Vec<&CanvasEntry> = Vec::with_capacity(merged.len());
    for entry in merged {
        deduped.retain(|kept| kept.key != entry.key);
        deduped.push(entry);
    }

    let mut out: Vec<CanvasEntry> = Vec::with_capacity(deduped.len());
    for (i, entry) in deduped.iter().enumerate() {
        let later_same_kind = deduped[i + 1..].iter().filter(|e| e.kind == entry.kind).count();
        let keep = match entry.kind {
            ComponentKind::StickyNote => later_same_kind < STICKY_NOTE_CAP,
            _ => later_same_kind == 0,
        };
        if keep {
            out.push((*entry).clone());
        }
    }
    out
}

pub fn latest_of(entries: &[CanvasEntry], kind: ComponentKind) -> Option<&CanvasEntry> {
    entries.iter().rev().find(|entry| entry.kind == kind)
}
