//! Export the current analysis to CSV.
//!
//! One file, one `kind` column (`historical`, `prediction`, `vendor`) so it is
//! easy to filter in a spreadsheet. Vendors are written in display order.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::domain::{PricePrediction, RecommendationResult};
use crate::error::{AppError, EXIT_RUNTIME};
use crate::render::rank_vendors;

const HEADER: [&str; 11] = [
    "kind",
    "material_id",
    "date",
    "price",
    "predicted_price",
    "confidence_low",
    "confidence_high",
    "rank",
    "vendor_id",
    "price_per_unit",
    "final_score",
];

/// `exports/procure_<material>_<timestamp>.csv`
pub fn default_export_path(material_id: &str, now: DateTime<Local>) -> PathBuf {
    let safe: String = material_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    PathBuf::from("exports").join(format!(
        "procure_{safe}_{}.csv",
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Write whichever tracks are available. At least one must be.
///
/// Server text (ids, dates) is quoted by the CSV writer as needed.
pub fn write_analysis_csv(
    path: &Path,
    material_id: &str,
    prediction: Option<&PricePrediction>,
    recommendation: Option<&RecommendationResult>,
) -> Result<(), AppError> {
    if prediction.is_none() && recommendation.is_none() {
        return Err(AppError::new(EXIT_RUNTIME, "Nothing to export yet."));
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)
            .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to create '{}': {e}", dir.display())))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let row_err = |e: csv::Error| AppError::new(EXIT_RUNTIME, format!("Failed to write export CSV row: {e}"));

    writer.write_record(HEADER).map_err(row_err)?;

    if let Some(p) = prediction {
        for h in &p.historical {
            let price = format!("{:.4}", h.price);
            writer
                .write_record(["historical", material_id, h.date.as_str(), price.as_str(), "", "", "", "", "", "", ""])
                .map_err(row_err)?;
        }
        for f in &p.predictions {
            let predicted = format!("{:.4}", f.predicted_price);
            let low = format!("{:.4}", f.confidence_low);
            let high = format!("{:.4}", f.confidence_high);
            writer
                .write_record(["prediction", material_id, f.date.as_str(), "", predicted.as_str(), low.as_str(), high.as_str(), "", "", "", ""])
                .map_err(row_err)?;
        }
    }

    if let Some(r) = recommendation {
        for (i, v) in rank_vendors(&r.all_vendors).iter().enumerate() {
            let rank = (i + 1).to_string();
            let price = format!("{:.4}", v.price_per_unit);
            let score = format!("{:.6}", v.final_score);
            writer
                .write_record(["vendor", material_id, "", "", "", "", "", rank.as_str(), v.vendor_id.as_str(), price.as_str(), score.as_str()])
                .map_err(row_err)?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to flush export CSV '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), "analysis exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::{HistoricalPoint, PredictionPoint, Vendor};

    #[test]
    fn export_path_is_timestamped_and_sanitised() {
        let now = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            default_export_path("M 1/x", now),
            PathBuf::from("exports/procure_M_1_x_20250304_050607.csv")
        );
    }

    #[test]
    fn writes_both_tracks_with_ranked_vendors() {
        let prediction = PricePrediction {
            material_id: None,
            historical: vec![HistoricalPoint { date: "2024-01".into(), price: 10.0 }],
            predictions: vec![PredictionPoint {
                date: "2024-02".into(),
                predicted_price: 12.0,
                confidence_low: 11.0,
                confidence_high: 13.0,
            }],
        };
        let v = |id: &str, s: f64| Vendor {
            vendor_id: id.into(),
            price_per_unit: 2.0,
            final_score: s,
            reliability_score: None,
            delivery_days: None,
        };
        let recommendation = RecommendationResult {
            material_id: None,
            best_vendor: v("A", 0.2),
            weighted_score: 0.2,
            all_vendors: vec![v("A", 0.2), v("B", 0.7)],
            score_breakdown: None,
        };

        let path = std::env::temp_dir().join(format!("procure_export_test_{}.csv", std::process::id()));
        write_analysis_csv(&path, "M1", Some(&prediction), Some(&recommendation)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines[1], "historical,M1,2024-01,10.0000,,,,,,,");
        assert_eq!(lines[2], "prediction,M1,2024-02,,12.0000,11.0000,13.0000,,,,");
        assert_eq!(lines[3], "vendor,M1,,,,,,1,B,2.0000,0.700000");
        assert_eq!(lines[4], "vendor,M1,,,,,,2,A,2.0000,0.200000");
    }

    #[test]
    fn vendor_ids_with_commas_stay_in_one_field() {
        let recommendation = RecommendationResult {
            material_id: None,
            best_vendor: Vendor {
                vendor_id: "Acme, Inc".into(),
                price_per_unit: 2.0,
                final_score: 0.5,
                reliability_score: None,
                delivery_days: None,
            },
            weighted_score: 0.5,
            all_vendors: vec![Vendor {
                vendor_id: "Acme, Inc".into(),
                price_per_unit: 2.0,
                final_score: 0.5,
                reliability_score: None,
                delivery_days: None,
            }],
            score_breakdown: None,
        };

        let path = std::env::temp_dir().join(format!("procure_export_quoted_{}.csv", std::process::id()));
        write_analysis_csv(&path, "M,1", None, Some(&recommendation)).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        let _ = std::fs::remove_file(&path);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), HEADER.len());
        assert_eq!(&records[0][1], "M,1");
        assert_eq!(&records[0][8], "Acme, Inc");
        assert_eq!(&records[0][10], "0.500000");
    }

    #[test]
    fn refuses_empty_export() {
        let path = std::env::temp_dir().join("procure_export_never_written.csv");
        assert!(write_analysis_csv(&path, "M1", None, None).is_err());
    }
}
