use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A numeric cell after normalization. Display text that carries no usable
/// number (sentinel dashes, "N/A", garbage) becomes `Unavailable`, never an
/// error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    Number(f64),
    Unavailable,
}

impl CellValue {
    pub fn is_available(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Unavailable => None,
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(n) => CellValue::Number(n),
            None => CellValue::Unavailable,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Unavailable => Ok(()),
        }
    }
}

// Serialized as a plain number or JSON null so the raw dump stays readable.
impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Unavailable => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.into())
    }
}

/// One scraped table row at a point in time. Raw fields keep the exact
/// trimmed display text (`None` when the column could not be resolved);
/// derived fields hold the normalizer's output. Never mutated after
/// construction, except that enrichment may attach additional fields under
/// its own namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub symbol: String,
    pub name: String,

    pub price_raw: Option<String>,
    pub change_raw: Option<String>,
    pub volume_raw: Option<String>,
    pub market_cap_raw: Option<String>,
    pub pe_raw: Option<String>,

    pub price: CellValue,
    pub change: CellValue,
    pub volume: CellValue,
    pub market_cap: CellValue,
    pub pe_ratio: CellValue,

    pub scraped_at: DateTime<Utc>,

    /// Fields attached by the optional enrichment pass. Keys never collide
    /// with the derived fields above.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enrichment: BTreeMap<String, CellValue>,
}

/// Why the pagination loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// The configured page cap was hit.
    ReachedLimit,
    /// No next-page control exists in the DOM (or activating it failed twice).
    ControlNotFound,
    /// The next-page control is present but disabled: last page.
    ControlDisabled,
    /// The page layout was fundamentally broken (no table at all).
    ExtractionError,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::ReachedLimit => "reached-limit",
            StopReason::ControlNotFound => "control-not-found",
            StopReason::ControlDisabled => "control-disabled",
            StopReason::ExtractionError => "extraction-error",
        };
        f.write_str(s)
    }
}

/// Result of a full scrape run: everything collected, in page-then-row
/// order, plus the terminal stop reason for observability.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub records: Vec<Record>,
    pub stop_reason: StopReason,
    pub pages: u32,
}
