//! Wire contracts shared with external feed and assistant processes.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Raw per-city reading as produced by a feed process. All measurements are
/// optional; missing values simply contribute nothing to the risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySignal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub temp_c: Option<f64>,
    pub wind_kph: Option<f64>,
    pub rain_mm: Option<f64>,
    pub aqi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeSignal {
    pub id: String,
    pub place: String,
    pub magnitude: f64,
    #[serde(default)]
    pub depth_km: f64,
    #[serde(default)]
    pub time_ms: u64,
}

/// Payload emitted by a feed process on stdout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    pub cities: Vec<CitySignal>,
    #[serde(default)]
    pub quakes: Vec<QuakeSignal>,
    #[serde(default)]
    pub updated_ms: u64,
}

/// A city after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCity {
    #[serde(flatten)]
    pub signal: CitySignal,
    pub risk: u8,
    pub risk_label: String,
}

/// Scored, sorted, bounded snapshot handed to the consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub cities: Vec<ScoredCity>,
    pub quakes: Vec<QuakeSignal>,
    pub updated_ms: u64,
}

/// A generative-UI directive received over the assistant line protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectivePayload {
    #[serde(rename = "componentName")]
    pub component_name: String,
    #[serde(default)]
    pub props: Map<String, Value>,
}
