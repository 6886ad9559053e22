//! Server-rendered HTML for the dashboard

use std::fmt::Write;

use axum::http::StatusCode;
use strum::IntoEnumIterator;

use super::forecast::{
    UploadForecast, DEFAULT_HORIZON_HOURS, DOWNLOAD_FILE_NAME, HORIZON_STEP_HOURS, MAX_HORIZON_HOURS,
    MIN_HORIZON_HOURS,
};
use crate::domain::{timestamp, EvaluationRow, ModelKind};

const TITLE: &str = "Energy Consumption Forecast Dashboard";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:1100px;color:#222}\
table{border-collapse:collapse;margin:0.5rem 0}\
th,td{border:1px solid #ccc;padding:0.3rem 0.7rem;text-align:right}\
th{background:#f3f3f3}\
.warning{background:#fff4e5;border-left:4px solid #f0a020;padding:0.6rem}\
.info{background:#e8f1fb;border-left:4px solid #2f7ed8;padding:0.6rem}\
.error{background:#fdecea;border-left:4px solid #d93025;padding:0.6rem}\
.chart svg{max-width:100%;height:auto}";

/// Content of the landing page. `Err` holds the warning shown in place of
/// the section.
#[derive(Debug, Clone)]
pub struct IndexView {
    pub selected: ModelKind,
    pub chart: Result<String, String>,
    pub summary: Result<Vec<EvaluationRow>, String>,
    pub comparison: Option<String>,
}

pub fn index_page(view: &IndexView) -> String {
    let mut body = String::new();

    body.push_str("<h2>Model Predictions</h2>\n");
    body.push_str(&model_selector(view.selected));
    match &view.chart {
        Ok(svg) => section_chart(&mut body, svg),
        Err(warning) => notice(&mut body, "warning", warning),
    }

    body.push_str("<h2>Model Evaluation Summary</h2>\n");
    match &view.summary {
        Ok(rows) => {
            body.push_str(&summary_table(rows));
            if let Some(svg) = &view.comparison {
                section_chart(&mut body, svg);
            }
        }
        Err(warning) => notice(&mut body, "warning", warning),
    }

    body.push_str("<h2>Forecast Your Own Data</h2>\n");
    body.push_str(&upload_form());

    layout(TITLE, &body)
}

pub fn forecast_page(forecast: &UploadForecast, chart_svg: &str, csv: &str) -> String {
    let mut body = String::new();

    body.push_str("<h2>Uploaded Data Preview</h2>\n<table>\n<tr><th>timestamp</th><th>energy_kwh</th></tr>\n");
    for reading in forecast.preview() {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{:.3}</td></tr>",
            timestamp::format(&reading.timestamp),
            reading.energy_kwh
        );
    }
    let _ = writeln!(
        body,
        "</table>\n<p>{} rows uploaded, forecasting {} hours ahead.</p>",
        forecast.history.len(),
        forecast.horizon_hours
    );
    if forecast.dropped_rows > 0 {
        notice(
            &mut body,
            "info",
            &format!(
                "Skipped {} rows with a blank or NaN energy_kwh value.",
                forecast.dropped_rows
            ),
        );
    }
    if forecast.reordered {
        notice(&mut body, "info", "Rows were sorted by timestamp before forecasting.");
    }

    body.push_str("<h2>Forecast</h2>\n");
    section_chart(&mut body, chart_svg);

    body.push_str("<h2>Forecast Accuracy on Uploaded Data</h2>\n");
    match &forecast.overlap {
        Some(metrics) => {
            let _ = writeln!(
                body,
                "<table>\n<tr><th>RMSE</th><th>MAE</th><th>Rows</th></tr>\n\
                 <tr><td>{:.3}</td><td>{:.3}</td><td>{}</td></tr>\n</table>",
                metrics.rmse, metrics.mae, metrics.sample_count
            );
        }
        None => notice(
            &mut body,
            "info",
            "No uploaded values overlap the forecast, so accuracy cannot be computed.",
        ),
    }

    let _ = writeln!(
        body,
        "<p><a download=\"{name}\" href=\"data:text/csv;charset=utf-8,{data}\">Download {name}</a></p>",
        name = DOWNLOAD_FILE_NAME,
        data = percent_encode(csv)
    );
    body.push_str("<p><a href=\"/\">Back to dashboard</a></p>\n");

    layout(&format!("{TITLE}: uploaded forecast"), &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let mut body = String::new();
    notice(&mut body, "error", message);
    let _ = writeln!(body, "<p>Status: {status}</p>\n<p><a href=\"/\">Back to dashboard</a></p>");
    layout(&format!("{TITLE}: error"), &body)
}

fn model_selector(selected: ModelKind) -> String {
    let mut html = String::from("<form method=\"get\" action=\"/\">\n<label for=\"model\">Model</label>\n<select id=\"model\" name=\"model\" onchange=\"this.form.submit()\">\n");
    for kind in ModelKind::iter() {
        let marker = if kind == selected { " selected" } else { "" };
        let _ = writeln!(html, "<option value=\"{}\"{marker}>{}</option>", kind.slug(), kind.label());
    }
    html.push_str("</select>\n<noscript><button type=\"submit\">Show</button></noscript>\n</form>\n");
    html
}

fn summary_table(rows: &[EvaluationRow]) -> String {
    let mut html = String::from("<table>\n<tr><th>Model</th><th>RMSE</th><th>MAE</th></tr>\n");
    for row in rows {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{:.3}</td><td>{:.3}</td></tr>",
            escape(&row.model),
            row.rmse,
            row.mae
        );
    }
    html.push_str("</table>\n");
    html
}

fn upload_form() -> String {
    format!(
        "<form method=\"post\" action=\"/forecast\" enctype=\"multipart/form-data\">\n\
         <p><label>CSV file with <code>timestamp</code> and <code>energy_kwh</code> columns \
         <input type=\"file\" name=\"file\" accept=\".csv,text/csv\" required></label></p>\n\
         <p><label for=\"horizon_hours\">Forecast horizon (hours)</label> \
         <input type=\"range\" id=\"horizon_hours\" name=\"horizon_hours\" min=\"{MIN_HORIZON_HOURS}\" max=\"{MAX_HORIZON_HOURS}\" \
         step=\"{HORIZON_STEP_HOURS}\" value=\"{DEFAULT_HORIZON_HOURS}\" \
         oninput=\"this.nextElementSibling.value = this.value\"> \
         <output for=\"horizon_hours\">{DEFAULT_HORIZON_HOURS}</output></p>\n\
         <p><button type=\"submit\">Forecast</button></p>\n</form>\n"
    )
}

fn section_chart(body: &mut String, svg: &str) {
    let _ = writeln!(body, "<div class=\"chart\">{svg}</div>");
}

fn notice(body: &mut String, class: &str, text: &str) {
    let _ = writeln!(body, "<p class=\"{class}\">{}</p>", escape(text));
}

fn layout(title: &str, body: &str) -> String {
    let title = escape(title);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n"
    )
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// RFC 3986 percent-encoding, everything but unreserved characters
pub fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3 / 2);
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}
