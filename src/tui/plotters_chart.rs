//! Plotters-powered forecast chart widget for Ratatui.
//!
//! Draws one `ChartView`: the historical price line, the forecast line, and the
//! confidence band as a filled region between the low and high series. The
//! x axis is the label index; tick labels map back to the dates.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
// `ratatui::style::Color` below shadows the plotters trait of the same name.
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::render::ChartView;

/// A render-only view over the live chart.
///
/// All series and bounds come from `ChartView`; `render()` only draws.
pub struct ForecastChart<'a> {
    pub view: &'a ChartView,
}

impl<'a> Widget for ForecastChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        if self.view.is_empty() {
            buf.set_string(
                area.x,
                area.y,
                "No price data to chart.",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.view.x_bounds();
        let [y0, y1] = self.view.y_bounds();
        if !(y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let labels = &self.view.labels;
        let historical = ChartView::points(&self.view.historical);
        let predicted = ChartView::points(&self.view.predicted);
        let low = ChartView::points(&self.view.confidence_low);
        let high = ChartView::points(&self.view.confidence_high);
        let band = self.view.band_polygon();

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            let label_at = |v: &f64| -> String {
                let i = v.round();
                if (v - i).abs() > 1e-6 || i < 0.0 {
                    return String::new();
                }
                labels.get(i as usize).cloned().unwrap_or_default()
            };

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc("price")
                .x_labels(labels.len().clamp(2, 6))
                .y_labels(5)
                .x_label_formatter(&label_at)
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // Series styling: keep the palette high-contrast for terminal readability.
            let band_color = RGBColor(0, 70, 110);
            let bound_color = RGBColor(0, 140, 220);
            let forecast_color = RGBColor(0, 255, 255); // cyan
            let history_color = WHITE;

            // 1) Confidence band, underneath everything else.
            if band.len() >= 3 {
                chart.draw_series(std::iter::once(Polygon::new(band.clone(), band_color.filled())))?;
            }

            // 2) Band edges.
            chart.draw_series(LineSeries::new(low.iter().copied(), &bound_color))?;
            chart.draw_series(LineSeries::new(high.iter().copied(), &bound_color))?;

            // 3) History and forecast. Each is drawn only over its own range.
            chart.draw_series(LineSeries::new(historical.iter().copied(), &history_color))?;
            chart.draw_series(LineSeries::new(predicted.iter().copied(), &forecast_color))?;

            // Single-point series don't produce a visible line; mark them.
            for (series, color) in [(&historical, history_color), (&predicted, forecast_color)] {
                if series.len() == 1 {
                    chart.draw_series(series.iter().map(|&(x, y)| Pixel::new((x, y), color)))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::build_chart_view;
    use crate::domain::PricePrediction;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn empty_view() -> ChartView {
        build_chart_view(&PricePrediction {
            material_id: None,
            historical: vec![],
            predictions: vec![],
        })
    }

    #[test]
    fn tiny_area_shows_resize_hint() {
        let view = empty_view();
        let area = Rect::new(0, 0, 60, 4);
        let mut buf = Buffer::empty(area);
        ForecastChart { view: &view }.render(area, &mut buf);
        assert!(row_text(&buf, 0).starts_with("Chart area too small"));
    }

    #[test]
    fn empty_prediction_shows_no_data_hint() {
        let view = empty_view();
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        ForecastChart { view: &view }.render(area, &mut buf);
        assert!(row_text(&buf, 0).starts_with("No price data to chart."));
    }
}
