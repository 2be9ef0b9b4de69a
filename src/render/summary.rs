//! Vendor-detail summary.

use crate::domain::RecommendationResult;
use crate::render::format::format_percent;

#[derive(Debug, Clone, PartialEq)]
pub struct VendorSummary {
    pub best_vendor_id: String,
    /// Overall weighted score as a percentage.
    pub weighted_score: String,
    /// `price / delivery / reliability` contributions, when the server sent them.
    pub breakdown: Option<String>,
}

/// Summarise the server's recommendation.
///
/// This reports the server's `best_vendor` as-is, even if the locally ranked
/// vendor table puts someone else on top.
pub fn vendor_summary(result: &RecommendationResult) -> VendorSummary {
    VendorSummary {
        best_vendor_id: result.best_vendor.vendor_id.clone(),
        weighted_score: format_percent(result.weighted_score),
        breakdown: result.score_breakdown.as_ref().map(|b| {
            format!(
                "price {} | delivery {} | reliability {}",
                format_percent(b.price),
                format_percent(b.delivery),
                format_percent(b.reliability)
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScoreBreakdown, Vendor};
    use crate::render::tables::vendor_rows;

    fn vendor(id: &str, score: f64) -> Vendor {
        Vendor {
            vendor_id: id.to_string(),
            price_per_unit: 5.0,
            final_score: score,
            reliability_score: Some(4.5),
            delivery_days: Some(3.0),
        }
    }

    #[test]
    fn summary_keeps_server_pick_when_ranking_differs() {
        let result = RecommendationResult {
            material_id: None,
            best_vendor: vendor("V1", 0.6),
            weighted_score: 0.6,
            all_vendors: vec![vendor("V1", 0.6), vendor("V2", 0.75)],
            score_breakdown: None,
        };

        let summary = vendor_summary(&result);
        assert_eq!(summary.best_vendor_id, "V1");
        assert_eq!(summary.weighted_score, "60.00%");
        assert_eq!(summary.breakdown, None);

        let rows = vendor_rows(&result.all_vendors);
        assert_eq!(rows[0].cells().unwrap()[1], "V2");
    }

    #[test]
    fn breakdown_is_formatted_as_percentages() {
        let result = RecommendationResult {
            material_id: None,
            best_vendor: vendor("V1", 0.8),
            weighted_score: 0.8,
            all_vendors: vec![],
            score_breakdown: Some(ScoreBreakdown {
                price: 0.1,
                delivery: 0.2,
                reliability: 0.5,
            }),
        };
        assert_eq!(
            vendor_summary(&result).breakdown.as_deref(),
            Some("price 10.00% | delivery 20.00% | reliability 50.00%")
        );
    }
}
