//! Snapshot of the live hazard board as the core consumes it.
//!
//! The feed crate owns the wire formats and the risk derivation; by the time a
//! snapshot reaches the reducer it is already scored and sorted.

use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLabel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLabel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn for_score(score: u8) -> Self {
        match score {
            75.. => Self::Critical,
            55..=74 => Self::High,
            35..=54 => Self::Moderate,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityReading {
    pub id: String,
    pub name: Arc<str>,
    pub country: Arc<str>,
    pub temp_c: Option<f64>,
    pub wind_kph: Option<f64>,
    pub rain_mm: Option<f64>,
    pub aqi: Option<f64>,
    pub risk: u8,
    pub risk_label: RiskLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuakeReading {
    pub id: String,
    pub place: Arc<str>,
    pub magnitude: f64,
    pub depth_km: f64,
    pub time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardSnapshot {
    pub cities: Vec<CityReading>,
    pub quakes: Vec<QuakeReading>,
    pub updated_ms: u64,
}

impl BoardSnapshot {
    pub fn top_risk_city(&self) -> Option<&CityReading> {
        self.cities.iter().max_by_key(|city| city.risk)
    }

    pub fn strongest_quake(&self) -> Option<&QuakeReading> {
        self.quakes
            .iter()
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
    }
}
