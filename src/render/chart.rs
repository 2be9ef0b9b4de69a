//! Forecast chart datasets and the single chart slot.
//!
//! The label axis is the historical dates followed by the prediction dates.
//! Each series has one entry per label; `None` marks "no value" so the
//! historical and forecast segments are drawn without interpolating across
//! the boundary.

use std::cell::Cell;
use std::rc::Rc;

use crate::domain::PricePrediction;

/// Derived, render-ready chart data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub labels: Vec<String>,
    pub historical: Vec<Option<f64>>,
    pub predicted: Vec<Option<f64>>,
    pub confidence_low: Vec<Option<f64>>,
    pub confidence_high: Vec<Option<f64>>,
}

pub fn build_chart_view(prediction: &PricePrediction) -> ChartView {
    let n_hist = prediction.historical.len();
    let n_pred = prediction.predictions.len();

    let labels = prediction
        .historical
        .iter()
        .map(|h| h.date.clone())
        .chain(prediction.predictions.iter().map(|p| p.date.clone()))
        .collect();

    let historical = prediction
        .historical
        .iter()
        .map(|h| Some(h.price))
        .chain(std::iter::repeat_n(None, n_pred))
        .collect();

    let forecast = |f: fn(&crate::domain::PredictionPoint) -> f64| -> Vec<Option<f64>> {
        std::iter::repeat_n(None, n_hist)
            .chain(prediction.predictions.iter().map(|p| Some(f(p))))
            .collect()
    };

    ChartView {
        labels,
        historical,
        predicted: forecast(|p| p.predicted_price),
        confidence_low: forecast(|p| p.confidence_low),
        confidence_high: forecast(|p| p.confidence_high),
    }
}

impl ChartView {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(x, y)` pairs for the defined entries of a series, `x` being the label index.
    pub fn points(series: &[Option<f64>]) -> Vec<(f64, f64)> {
        series
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|y| y.is_finite()).map(|y| (i as f64, y)))
            .collect()
    }

    /// Closed outline of the confidence band: high edge left to right, then low edge back.
    pub fn band_polygon(&self) -> Vec<(f64, f64)> {
        let mut upper = Vec::new();
        let mut lower = Vec::new();
        for (i, (lo, hi)) in self.confidence_low.iter().zip(&self.confidence_high).enumerate() {
            if let (Some(lo), Some(hi)) = (lo, hi) {
                if lo.is_finite() && hi.is_finite() {
                    upper.push((i as f64, *hi));
                    lower.push((i as f64, *lo));
                }
            }
        }
        lower.reverse();
        upper.extend(lower);
        upper
    }

    /// Y range over every defined value, padded by 5%.
    pub fn y_bounds(&self) -> [f64; 2] {
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for series in [
            &self.historical,
            &self.predicted,
            &self.confidence_low,
            &self.confidence_high,
        ] {
            for y in series.iter().flatten().filter(|y| y.is_finite()) {
                y_min = y_min.min(*y);
                y_max = y_max.max(*y);
            }
        }

        if !y_min.is_finite() || !y_max.is_finite() {
            return [0.0, 1.0];
        }
        if y_max <= y_min {
            return [y_min - 1.0, y_max + 1.0];
        }

        let pad = (y_max - y_min).abs() * 0.05;
        [y_min - pad, y_max + pad]
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.labels.len().max(2) - 1) as f64]
    }
}

/// A live chart. Dropping it destroys it.
#[derive(Debug)]
pub struct ChartInstance {
    pub id: u64,
    pub view: ChartView,
    live: Rc<Cell<usize>>,
}

impl Drop for ChartInstance {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
        tracing::trace!(chart_id = self.id, "chart destroyed");
    }
}

/// Owned slot holding at most one chart.
#[derive(Debug, Default)]
pub struct ChartSlot {
    current: Option<ChartInstance>,
    created: u64,
    live: Rc<Cell<usize>>,
}

impl ChartSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy the current chart (if any), then create one from `view`.
    pub fn render(&mut self, view: ChartView) -> &ChartInstance {
        self.destroy();

        self.created += 1;
        self.live.set(self.live.get() + 1);
        tracing::trace!(chart_id = self.created, labels = view.labels.len(), "chart created");
        self.current.insert(ChartInstance {
            id: self.created,
            view,
            live: Rc::clone(&self.live),
        })
    }

    pub fn destroy(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&ChartInstance> {
        self.current.as_ref()
    }

    /// Charts constructed and not yet destroyed.
    pub fn live_instances(&self) -> usize {
        self.live.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HistoricalPoint, PredictionPoint};

    fn sample() -> PricePrediction {
        PricePrediction {
            material_id: Some("M1".to_string()),
            historical: vec![HistoricalPoint { date: "2024-01".to_string(), price: 10.0 }],
            predictions: vec![PredictionPoint {
                date: "2024-02".to_string(),
                predicted_price: 12.0,
                confidence_low: 11.0,
                confidence_high: 13.0,
            }],
        }
    }

    #[test]
    fn labels_and_series_split_at_forecast_boundary() {
        let view = build_chart_view(&sample());
        assert_eq!(view.labels, vec!["2024-01", "2024-02"]);
        assert_eq!(view.historical, vec![Some(10.0), None]);
        assert_eq!(view.predicted, vec![None, Some(12.0)]);
        assert_eq!(view.confidence_low, vec![None, Some(11.0)]);
        assert_eq!(view.confidence_high, vec![None, Some(13.0)]);
    }

    #[test]
    fn band_polygon_walks_high_then_low() {
        let mut p = sample();
        p.predictions.push(PredictionPoint {
            date: "2024-03".to_string(),
            predicted_price: 14.0,
            confidence_low: 12.0,
            confidence_high: 16.0,
        });
        let view = build_chart_view(&p);
        assert_eq!(
            view.band_polygon(),
            vec![(1.0, 13.0), (2.0, 16.0), (2.0, 12.0), (1.0, 11.0)]
        );
    }

    #[test]
    fn y_bounds_cover_band_with_padding() {
        let view = build_chart_view(&sample());
        let [lo, hi] = view.y_bounds();
        assert!(lo < 10.0 && hi > 13.0);

        let empty = build_chart_view(&PricePrediction {
            material_id: None,
            historical: vec![],
            predictions: vec![],
        });
        assert!(empty.is_empty());
        assert_eq!(empty.y_bounds(), [0.0, 1.0]);
    }

    #[test]
    fn slot_holds_exactly_one_chart() {
        let mut slot = ChartSlot::new();
        assert_eq!(slot.live_instances(), 0);

        let view = build_chart_view(&sample());
        slot.render(view.clone());
        let first_id = slot.current().unwrap().id;
        slot.render(view.clone());

        assert_eq!(slot.live_instances(), 1);
        assert_ne!(slot.current().unwrap().id, first_id);
        assert_eq!(slot.current().unwrap().view, view);

        slot.destroy();
        assert_eq!(slot.live_instances(), 0);
        assert!(slot.current().is_none());
    }
}
