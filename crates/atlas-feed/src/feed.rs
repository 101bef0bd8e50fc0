//! Signal feeds: the simulated generator used out of the box and the
//! subprocess-backed feed for real data sources.

use std::io;
use std::process::Command;

use crate::contracts::CitySignal;
use crate::contracts::QuakeSignal;
use crate::contracts::RawSnapshot;
use crate::contracts::ScoredCity;
use crate::contracts::SignalSnapshot;

/// Most severe quakes kept per snapshot.
pub const QUAKE_CAP: usize = 10;

/// Composite hazard score on 0..=100. Each component saturates at 100 before
/// weighting, so one extreme reading cannot blow past the scale.
pub fn risk_score(
    aqi: Option<f64>,
    wind_kph: Option<f64>,
    rain_mm: Option<f64>,
    temp_c: Option<f64>,
) -> u8 {
    fn part(value: Option<f64>, scale: impl Fn(f64) -> f64) -> f64 {
        value.map(|v| scale(v).min(100.0)).unwrap_or(0.0)
    }

    let score = part(aqi, |v| v * 0.5) * 0.45
        + part(wind_kph, |v| v * 1.2) * 0.25
        + part(rain_mm, |v| v * 10.0) * 0.15
        + part(temp_c, |v| (v - 22.0).abs() * 3.0) * 0.15;
    score.round().clamp(0.0, 100.0) as u8
}

pub fn risk_label(score: u8) -> &'static str {
    match score {
        75.. => "Critical",
        55..=74 => "High",
        35..=54 => "Moderate",
        _ => "Low",
    }
}

/// Score every city, then sort quakes by magnitude descending and keep the
/// strongest `QUAKE_CAP`. Quake ties keep input order.
pub fn score_snapshot(raw: RawSnapshot) -> SignalSnapshot {
    let cities = raw
        .cities
        .into_iter()
        .map(|signal| {
            let risk = risk_score(signal.aqi, signal.wind_kph, signal.rain_mm, signal.temp_c);
            ScoredCity {
                signal,
                risk,
                risk_label: risk_label(risk).to_string(),
            }
        })
        .collect();

    let mut quakes = raw.quakes;
    quakes.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    quakes.truncate(QUAKE_CAP);

    SignalSnapshot {
        cities,
        quakes,
        updated_ms: raw.updated_ms,
    }
}

pub trait SignalFeed: Send {
    fn fetch(&mut self) -> io::Result<SignalSnapshot>;
}

struct CityBaseline {
    id: &'static str,
    name: &'static str,
    country: &'static str,
    temp_c: f64,
    wind_kph: f64,
    rain_mm: f64,
    aqi: f64,
}

const CITY_BASELINES: &[CityBaseline] = &[
    CityBaseline {
        id: "sf",
        name: "San Francisco",
        country: "US",
        temp_c: 16.0,
        wind_kph: 18.0,
        rain_mm: 0.0,
        aqi: 42.0,
    },
    CityBaseline {
        id: "nyc",
        name: "New York",
        country: "US",
        temp_c: 24.0,
        wind_kph: 14.0,
        rain_mm: 1.2,
        aqi: 58.0,
    },
    CityBaseline {
        id: "london",
        name: "London",
        country: "GB",
        temp_c: 15.0,
        wind_kph: 22.0,
        rain_mm: 2.4,
        aqi: 49.0,
    },
    CityBaseline {
        id: "tokyo",
        name: "Tokyo",
        country: "JP",
        temp_c: 27.0,
        wind_kph: 12.0,
        rain_mm: 0.6,
        aqi: 61.0,
    },
    CityBaseline {
        id: "delhi",
        name: "Delhi",
        country: "IN",
        temp_c: 34.0,
        wind_kph: 9.0,
        rain_mm: 0.0,
        aqi: 168.0,
    },
];

/// Deterministic tick-based feed. The same tick always yields the same
/// snapshot, which keeps demos and tests reproducible.
#[derive(Debug, Default)]
pub struct SimulatedFeed {
    tick: u64,
}

impl SimulatedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot_at(tick: u64) -> SignalSnapshot {
        let cities = CITY_BASELINES
            .iter()
            .enumerate()
            .map(|(i, base)| {
                // Small per-city phase drift so rows change at different ticks.
                let phase = ((tick + i as u64 * 3) % 7) as f64;
                CitySignal {
                    id: base.id.to_string(),
                    name: base.name.to_string(),
                    country: base.country.to_string(),
                    temp_c: Some(base.temp_c + phase * 0.4),
                    wind_kph: Some(base.wind_kph + phase * 1.1),
                    rain_mm: Some(base.rain_mm + if phase > 4.0 { 0.8 } else { 0.0 }),
                    aqi: Some(base.aqi + phase * 2.5),
                }
            })
            .collect();

        let quakes = vec![
            QuakeSignal {
                id: format!("sim-{}", tick / 5),
                place: "Off the coast of Honshu".to_string(),
                magnitude: 4.1 + ((tick % 9) as f64) * 0.3,
                depth_km: 22.0,
                time_ms: tick * 60_000,
            },
            QuakeSignal {
                id: format!("sim-{}-b", tick / 5),
                place: "Kermadec Islands region".to_string(),
                magnitude: 5.6 - ((tick % 4) as f64) * 0.2,
                depth_km: 80.0,
                time_ms: tick * 60_000 + 1,
            },
        ];

        score_snapshot(RawSnapshot {
            cities,
            quakes,
            updated_ms: tick * 60_000,
        })
    }
}

impl SignalFeed for SimulatedFeed {
    fn fetch(&mut self) -> io::Result<SignalSnapshot> {
        let snapshot = Self::snapshot_at(self.tick);
        self.tick += 1;
        Ok(snapshot)
    }
}

/// Runs an external command and parses one JSON `RawSnapshot` from stdout.
pub struct CommandFeed {
    program: String,
    args: Vec<String>,
}

impl CommandFeed {
    /// Split on whitespace: first token is the program, the rest are args.
    pub fn from_command_line(command: &str) -> io::Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| io::Error::other("feed command is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl SignalFeed for CommandFeed {
    fn fetch(&mut self) -> io::Result<SignalSnapshot> {
        let output = Command::new(&self.program).args(&self.args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(io::Error::other(format!(
                "feed command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        let raw: RawSnapshot = serde_json::from_slice(&output.stdout)
            .map_err(|err| io::Error::other(format!("feed output is not valid JSON: {err}")))?;
        Ok(score_snapshot(raw))
    }
}
