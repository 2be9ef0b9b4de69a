//! Shared domain types.
//!
//! Everything here is request-scoped: decoded from a backend response, rendered,
//! then dropped when the next response for the same region arrives.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

/// A procurable item.
///
/// The backend emits the identifier as `material_id` (and, for numeric CSV
/// columns, as a JSON number). `name` may be missing, in which case the id is
/// shown instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMaterial")]
pub struct Material {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct RawMaterial {
    #[serde(alias = "material_id", deserialize_with = "string_or_number")]
    id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    name: Option<String>,
}

impl From<RawMaterial> for Material {
    fn from(raw: RawMaterial) -> Self {
        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| raw.id.clone());
        Self { id: raw.id, name }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: String,
    pub price: f64,
}

/// A single forecast date with its confidence interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub date: String,
    pub predicted_price: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
}

impl PredictionPoint {
    /// `confidence_low <= predicted_price <= confidence_high`
    pub fn interval_is_ordered(&self) -> bool {
        self.confidence_low <= self.predicted_price && self.predicted_price <= self.confidence_high
    }
}

/// Response of the price-prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub material_id: Option<String>,
    #[serde(rename = "historical_data", default)]
    pub historical: Vec<HistoricalPoint>,
    #[serde(default)]
    pub predictions: Vec<PredictionPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(deserialize_with = "string_or_number")]
    pub vendor_id: String,
    pub price_per_unit: f64,
    /// Weighted value metric in `[0, 1]`, used for ranking.
    pub final_score: f64,
    #[serde(default)]
    pub reliability_score: Option<f64>,
    #[serde(default)]
    pub delivery_days: Option<f64>,
}

/// How the best vendor's score splits across the weighted criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub price: f64,
    pub delivery: f64,
    pub reliability: f64,
}

/// Response of the vendor-recommendation endpoint.
///
/// `best_vendor` is the server's pick; the client re-sorts `all_vendors` on its
/// own and keeps both, even when they disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub material_id: Option<String>,
    pub best_vendor: Vendor,
    pub weighted_score: f64,
    #[serde(default)]
    pub all_vendors: Vec<Vendor>,
    #[serde(default)]
    pub score_breakdown: Option<ScoreBreakdown>,
}

/// Relative weights (percent) forwarded to the vendor scoring endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VendorWeights {
    pub price: f64,
    pub delivery: f64,
    pub reliability: f64,
}

impl Default for VendorWeights {
    fn default() -> Self {
        Self {
            price: 20.0,
            delivery: 30.0,
            reliability: 50.0,
        }
    }
}

/// The three fixed upload slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadRole {
    Materials,
    Prices,
    Vendors,
}

impl UploadRole {
    pub const ALL: [UploadRole; 3] = [UploadRole::Materials, UploadRole::Prices, UploadRole::Vendors];

    /// Multipart field name expected by the backend.
    pub fn field_name(self) -> &'static str {
        match self {
            UploadRole::Materials => "materials",
            UploadRole::Prices => "prices",
            UploadRole::Vendors => "vendors",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            UploadRole::Materials => "Materials CSV",
            UploadRole::Prices => "Prices CSV",
            UploadRole::Vendors => "Vendors CSV",
        }
    }

    pub fn index(self) -> usize {
        match self {
            UploadRole::Materials => 0,
            UploadRole::Prices => 1,
            UploadRole::Vendors => 2,
        }
    }
}

/// One file bound to each upload role. Only constructed after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFiles {
    pub materials: PathBuf,
    pub prices: PathBuf,
    pub vendors: PathBuf,
}

impl DatasetFiles {
    pub fn path(&self, role: UploadRole) -> &PathBuf {
        match role {
            UploadRole::Materials => &self.materials,
            UploadRole::Prices => &self.prices,
            UploadRole::Vendors => &self.vendors,
        }
    }
}

/// Server acknowledgement of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_accepts_backend_field_names() {
        let json = r#"[{"material_id": "M1", "name": "Copper"}, {"id": 42}]"#;
        let materials: Vec<Material> = serde_json::from_str(json).unwrap();
        assert_eq!(
            materials,
            vec![
                Material { id: "M1".to_string(), name: "Copper".to_string() },
                Material { id: "42".to_string(), name: "42".to_string() },
            ]
        );
    }

    #[test]
    fn prediction_decodes_historical_data_field() {
        let json = r#"{
            "material_id": "M1",
            "historical_data": [{"date": "2024-01", "price": 10, "vendor_id": "V1"}],
            "predictions": [{"date": "2024-02", "predicted_price": 12, "confidence_low": 11, "confidence_high": 13}]
        }"#;
        let p: PricePrediction = serde_json::from_str(json).unwrap();
        assert_eq!(p.historical.len(), 1);
        assert_eq!(p.historical[0].price, 10.0);
        assert!(p.predictions[0].interval_is_ordered());
    }

    #[test]
    fn recommendation_keeps_optional_breakdown() {
        let json = r#"{
            "best_vendor": {"vendor_id": 7, "price_per_unit": 3.5, "final_score": 0.8, "delivery_days": 4},
            "weighted_score": 0.8,
            "all_vendors": [],
            "score_breakdown": {"price": 0.1, "delivery": 0.2, "reliability": 0.5}
        }"#;
        let r: RecommendationResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.best_vendor.vendor_id, "7");
        assert_eq!(r.best_vendor.delivery_days, Some(4.0));
        assert!(r.score_breakdown.is_some());
    }
}
