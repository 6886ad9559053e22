//! SVG charts for forecasts and model comparison

use std::path::Path;

use chrono::NaiveDateTime;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::{EvaluationRow, PredictionRecord, SeasonalForecastPoint, TimeSeries};
use crate::error::{PipelineError, Result};

const LINE_CHART_SIZE: (u32, u32) = (1000, 450);
const BAR_CHART_SIZE: (u32, u32) = (800, 450);

/// Actual vs predicted line chart with an optional uncertainty band.
#[derive(Debug, Clone, Default)]
pub struct ForecastChart {
    pub title: String,
    pub actual: Vec<(NaiveDateTime, f64)>,
    pub predicted: Vec<(NaiveDateTime, f64)>,
    pub band: Vec<(NaiveDateTime, f64, f64)>,
}

impl ForecastChart {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Chart of a persisted prediction table
    pub fn from_records(title: impl Into<String>, records: &[PredictionRecord]) -> Self {
        let mut chart = Self::new(title);
        for r in records {
            if let Some(actual) = r.actual {
                chart.actual.push((r.timestamp, actual));
            }
            chart.predicted.push((r.timestamp, r.predicted));
            if let (Some(lo), Some(hi)) = (r.predicted_lower, r.predicted_upper) {
                chart.band.push((r.timestamp, lo, hi));
            }
        }
        chart
    }

    /// Chart of a seasonal forecast against the history it was fitted on
    pub fn from_forecast(
        title: impl Into<String>,
        history: &TimeSeries,
        forecast: &[SeasonalForecastPoint],
    ) -> Self {
        let mut chart = Self::new(title);
        chart.actual = history
            .readings()
            .iter()
            .map(|r| (r.timestamp, r.energy_kwh))
            .collect();
        chart.predicted = forecast.iter().map(|p| (p.timestamp, p.yhat)).collect();
        chart.band = forecast
            .iter()
            .map(|p| (p.timestamp, p.yhat_lower, p.yhat_upper))
            .collect();
        chart
    }

    pub fn render_to(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let root = SVGBackend::new(path, LINE_CHART_SIZE).into_drawing_area();
        self.draw(root)
    }

    pub fn render_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, LINE_CHART_SIZE).into_drawing_area();
            self.draw(root)?;
        }
        Ok(svg)
    }

    fn origin(&self) -> Option<NaiveDateTime> {
        self.actual
            .iter()
            .chain(&self.predicted)
            .map(|(ts, _)| *ts)
            .min()
    }

    fn draw<DB: DrawingBackend>(&self, root: DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&WHITE).map_err(PipelineError::plot)?;

        let origin = self.origin().unwrap_or_default();
        let x = |ts: NaiveDateTime| (ts - origin).num_minutes() as f64 / 60.0;

        let xs = self.actual.iter().chain(&self.predicted).map(|(ts, _)| x(*ts));
        let x_max = xs.fold(1.0_f64, f64::max);

        let ys = self
            .actual
            .iter()
            .chain(&self.predicted)
            .map(|(_, v)| *v)
            .chain(self.band.iter().flat_map(|(_, lo, hi)| [*lo, *hi]));
        let (y_min, y_max) = padded_range(ys);

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(55)
            .build_cartesian_2d(0.0..x_max, y_min..y_max)
            .map_err(PipelineError::plot)?;

        let date_label = |offset: &f64| {
            let ts = origin + chrono::Duration::minutes((offset * 60.0).round() as i64);
            ts.format("%m-%d %H:%M").to_string()
        };
        chart
            .configure_mesh()
            .x_desc("Time")
            .y_desc("Energy (kWh)")
            .x_label_formatter(&date_label)
            .x_labels(8)
            .draw()
            .map_err(PipelineError::plot)?;

        if !self.band.is_empty() {
            let mut outline: Vec<(f64, f64)> =
                self.band.iter().map(|(ts, _, hi)| (x(*ts), *hi)).collect();
            outline.extend(self.band.iter().rev().map(|(ts, lo, _)| (x(*ts), *lo)));
            chart
                .draw_series(std::iter::once(Polygon::new(outline, BLUE.mix(0.15))))
                .map_err(PipelineError::plot)?
                .label("Interval")
                .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.15).filled()));
        }

        chart
            .draw_series(LineSeries::new(
                self.actual.iter().map(|(ts, v)| (x(*ts), *v)),
                &BLACK,
            ))
            .map_err(PipelineError::plot)?
            .label("Actual")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

        chart
            .draw_series(LineSeries::new(
                self.predicted.iter().map(|(ts, v)| (x(*ts), *v)),
                &BLUE,
            ))
            .map_err(PipelineError::plot)?
            .label("Predicted")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(PipelineError::plot)?;

        root.present().map_err(PipelineError::plot)
    }
}

/// Grouped RMSE/MAE bars, one group per evaluated model.
pub fn render_comparison(path: &Path, rows: &[EvaluationRow]) -> Result<()> {
    ensure_parent(path)?;
    let root = SVGBackend::new(path, BAR_CHART_SIZE).into_drawing_area();
    draw_comparison(root, rows)
}

pub fn comparison_svg(rows: &[EvaluationRow]) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, BAR_CHART_SIZE).into_drawing_area();
        draw_comparison(root, rows)?;
    }
    Ok(svg)
}

fn draw_comparison<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, rows: &[EvaluationRow]) -> Result<()> {
    root.fill(&WHITE).map_err(PipelineError::plot)?;

    // Each model takes three slots: RMSE bar, MAE bar, gap
    let slots = (3 * rows.len()).max(1) as i32;
    let top = rows
        .iter()
        .flat_map(|r| [r.rmse, r.mae])
        .fold(0.0_f64, f64::max)
        .max(1e-3)
        * 1.15;

    let caption = if rows.is_empty() {
        "Model Comparison (no models evaluated)"
    } else {
        "Model Comparison"
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(0..slots, 0.0..top)
        .map_err(PipelineError::plot)?;

    let model_label = |slot: &i32| {
        let group = (*slot / 3) as usize;
        match rows.get(group) {
            Some(row) if slot % 3 == 1 => row.model.clone(),
            _ => String::new(),
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots as usize + 1)
        .x_label_formatter(&model_label)
        .y_desc("Error (kWh)")
        .draw()
        .map_err(PipelineError::plot)?;

    let rmse_color = RGBColor(31, 119, 180);
    let mae_color = RGBColor(255, 127, 14);
    let bar = |slot: i32, value: f64, color: RGBColor| Rectangle::new([(slot, 0.0), (slot + 1, value)], color.filled());

    chart
        .draw_series(rows.iter().enumerate().map(|(i, r)| bar(3 * i as i32, r.rmse, rmse_color)))
        .map_err(PipelineError::plot)?
        .label("RMSE")
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], rmse_color.filled()));
    chart
        .draw_series(rows.iter().enumerate().map(|(i, r)| bar(3 * i as i32 + 1, r.mae, mae_color)))
        .map_err(PipelineError::plot)?
        .label("MAE")
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], mae_color.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(PipelineError::plot)?;

    root.present().map_err(PipelineError::plot)
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(0.1);
    (lo - pad, hi + pad)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timestamp;

    fn records() -> Vec<PredictionRecord> {
        let start = timestamp::parse("2024-06-01 00:00:00").unwrap();
        (0..12)
            .map(|i| PredictionRecord::point(start + chrono::Duration::hours(i), i as f64, i as f64 + 0.3))
            .collect()
    }

    #[test]
    fn test_forecast_chart_svg() {
        let chart = ForecastChart::from_records("Linear Regression Forecast", &records());
        assert_eq!(chart.actual.len(), 12);
        assert!(chart.band.is_empty());

        let svg = chart.render_svg().unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Linear Regression Forecast"));
    }

    #[test]
    fn test_forecast_chart_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots/plot_forecast_linear_regression.svg");
        ForecastChart::from_records("Forecast", &records())
            .render_to(&path)
            .unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_empty_chart_renders() {
        let svg = ForecastChart::new("Nothing yet").render_svg().unwrap();
        assert!(svg.contains("Nothing yet"));
    }

    #[test]
    fn test_comparison_chart() {
        let rows = vec![
            EvaluationRow { model: "Seasonal".to_string(), rmse: 0.6, mae: 0.45 },
            EvaluationRow { model: "LinearRegression".to_string(), rmse: 0.3, mae: 0.2 },
        ];
        let svg = comparison_svg(&rows).unwrap();
        assert!(svg.contains("RMSE") && svg.contains("MAE"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_comparison.svg");
        render_comparison(&path, &[]).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("no models evaluated"));
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
        let (lo, hi) = padded_range([2.0, 4.0].into_iter());
        assert!(lo < 2.0 && hi > 4.0);
    }
}
