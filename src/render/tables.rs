//! Prediction and vendor tables.

use std::cmp::Ordering;

use crate::domain::{PredictionPoint, Vendor};
use crate::render::format::{format_interval, format_money, format_percent};

pub const PREDICTION_COLUMNS: [&str; 3] = ["Date", "Predicted Price", "Confidence Interval"];
pub const VENDOR_COLUMNS: [&str; 6] = ["", "Vendor", "Price/Unit", "Reliability", "Delivery (days)", "Score"];

/// Column index of the score cell in a vendor row.
pub const VENDOR_SCORE_COLUMN: usize = 5;

pub const BEST_MARKER: &str = "★";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMarker {
    Plain,
    /// The top-ranked vendor; only this row's score cell is highlighted.
    Best { highlight_column: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    Cells { cells: Vec<String>, marker: RowMarker },
    /// A single "no data" cell spanning `span` columns.
    Placeholder { text: String, span: usize },
}

impl TableRow {
    pub fn cells(&self) -> Option<&[String]> {
        match self {
            TableRow::Cells { cells, .. } => Some(cells),
            TableRow::Placeholder { .. } => None,
        }
    }

    pub fn is_best(&self) -> bool {
        matches!(
            self,
            TableRow::Cells {
                marker: RowMarker::Best { .. },
                ..
            }
        )
    }
}

/// One row per prediction point; a placeholder row when there are none.
pub fn prediction_rows(points: &[PredictionPoint]) -> Vec<TableRow> {
    if points.is_empty() {
        return vec![TableRow::Placeholder {
            text: "No prediction data available.".to_string(),
            span: PREDICTION_COLUMNS.len(),
        }];
    }

    points
        .iter()
        .map(|p| {
            if !p.interval_is_ordered() {
                tracing::warn!(date = %p.date, "prediction outside its confidence interval");
            }
            TableRow::Cells {
                cells: vec![
                    p.date.clone(),
                    format_money(p.predicted_price),
                    format_interval(p.confidence_low, p.confidence_high),
                ],
                marker: RowMarker::Plain,
            }
        })
        .collect()
}

/// Vendors ordered by `final_score`, highest first.
///
/// The server's ordering is never trusted. The sort is stable so equal scores
/// keep their arrival order, and NaN scores sink to the bottom.
pub fn rank_vendors(vendors: &[Vendor]) -> Vec<Vendor> {
    fn key(v: &Vendor) -> f64 {
        if v.final_score.is_nan() {
            f64::NEG_INFINITY
        } else {
            v.final_score
        }
    }

    let mut sorted = vendors.to_vec();
    sorted.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
    sorted
}

/// Ranked vendor rows with the top row marked as best.
pub fn vendor_rows(vendors: &[Vendor]) -> Vec<TableRow> {
    if vendors.is_empty() {
        return vec![TableRow::Placeholder {
            text: "No vendor data available.".to_string(),
            span: VENDOR_COLUMNS.len(),
        }];
    }

    rank_vendors(vendors)
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            let marker = if i == 0 {
                RowMarker::Best {
                    highlight_column: VENDOR_SCORE_COLUMN,
                }
            } else {
                RowMarker::Plain
            };
            let lead = if i == 0 {
                BEST_MARKER.to_string()
            } else {
                (i + 1).to_string()
            };
            TableRow::Cells {
                cells: vec![
                    lead,
                    v.vendor_id,
                    format_money(v.price_per_unit),
                    v.reliability_score.map(|r| format!("{r:.1}")).unwrap_or_else(|| "-".to_string()),
                    v.delivery_days.map(|d| format!("{d:.0}")).unwrap_or_else(|| "-".to_string()),
                    format_percent(v.final_score),
                ],
                marker,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor(id: &str, score: f64) -> Vendor {
        Vendor {
            vendor_id: id.to_string(),
            price_per_unit: 10.0,
            final_score: score,
            reliability_score: None,
            delivery_days: None,
        }
    }

    fn point(date: &str, p: f64, lo: f64, hi: f64) -> PredictionPoint {
        PredictionPoint {
            date: date.to_string(),
            predicted_price: p,
            confidence_low: lo,
            confidence_high: hi,
        }
    }

    #[test]
    fn one_row_per_prediction_with_interval_text() {
        let points = vec![point("2024-02", 12.0, 11.0, 13.0), point("2024-03", 12.5, 11.25, 13.75)];
        let rows = prediction_rows(&points);
        assert_eq!(rows.len(), points.len());
        for (row, p) in rows.iter().zip(&points) {
            let cells = row.cells().unwrap();
            assert_eq!(
                cells[2],
                format!("{:.2} - {:.2}", p.confidence_low, p.confidence_high)
            );
        }
        assert_eq!(rows[0].cells().unwrap()[1], "$12.00");
    }

    #[test]
    fn empty_predictions_render_spanning_placeholder() {
        let rows = prediction_rows(&[]);
        assert_eq!(rows.len(), 1);
        assert!(matches!(&rows[0], TableRow::Placeholder { span: 3, .. }));
    }

    #[test]
    fn vendors_are_resorted_client_side() {
        let vendors = vec![vendor("V1", 0.2), vendor("V2", 0.9), vendor("V3", 0.5), vendor("V4", 0.9)];
        let rows = vendor_rows(&vendors);

        let ids: Vec<&str> = rows.iter().map(|r| r.cells().unwrap()[1].as_str()).collect();
        assert_eq!(ids, vec!["V2", "V4", "V3", "V1"]);

        assert!(rows[0].is_best());
        assert!(rows[1..].iter().all(|r| !r.is_best()));
        assert_eq!(rows[0].cells().unwrap()[0], BEST_MARKER);
        assert_eq!(rows[0].cells().unwrap()[VENDOR_SCORE_COLUMN], "90.00%");
    }

    #[test]
    fn ranking_is_non_increasing_and_nan_sinks() {
        let vendors = vec![vendor("A", f64::NAN), vendor("B", 0.1), vendor("C", 0.7)];
        let ranked = rank_vendors(&vendors);
        assert_eq!(ranked[0].vendor_id, "C");
        assert_eq!(ranked[2].vendor_id, "A");
        assert!(ranked[0].final_score >= ranked[1].final_score);
    }

    #[test]
    fn empty_vendors_render_placeholder() {
        let rows = vendor_rows(&[]);
        assert!(matches!(&rows[0], TableRow::Placeholder { span: 6, .. }));
    }

    #[test]
    fn rendering_twice_is_identical() {
        let vendors = vec![vendor("V1", 0.3), vendor("V2", 0.6)];
        assert_eq!(vendor_rows(&vendors), vendor_rows(&vendors));
        let points = vec![point("2024-02", 12.0, 11.0, 13.0)];
        assert_eq!(prediction_rows(&points), prediction_rows(&points));
    }
}
