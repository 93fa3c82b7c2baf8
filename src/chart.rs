// src/chart.rs

use std::{fs, path::PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::error::DataError;

/// One named bar series; `None` points leave a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Grouped bar chart over a shared category axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    categories: Vec<String>,
    series: Vec<Series>,
}

/// Plotly figure layout, the shape `plotly.js` expects.
#[derive(Serialize)]
struct Figure<'a> {
    data: Vec<Trace<'a>>,
    layout: Layout,
}

#[derive(Serialize)]
struct Trace<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    x: &'a [String],
    y: &'a [Option<f64>],
}

#[derive(Serialize)]
struct Layout {
    barmode: &'static str,
}

impl BarChart {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            categories,
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, name: &str, values: Vec<Option<f64>>) {
        self.series.push(Series {
            name: name.to_string(),
            values,
        });
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Figure as plotly JSON (`{"data": [...], "layout": {...}}`).
    pub fn to_json(&self) -> Result<String, DataError> {
        let figure = Figure {
            data: self
                .series
                .iter()
                .map(|s| Trace {
                    kind: "bar",
                    name: &s.name,
                    x: &self.categories,
                    y: &s.values,
                })
                .collect(),
            layout: Layout { barmode: "group" },
        };
        Ok(serde_json::to_string(&figure)?)
    }

    /// Self-contained HTML page drawing the figure with plotly.js.
    pub fn to_html(&self) -> Result<String, DataError> {
        let figure = self.to_json()?;
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
</head>
<body>
<div id="chart" style="width:100%;height:100vh;"></div>
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout);
</script>
</body>
</html>
"#
        ))
    }

    /// Render the page into the temp directory and return where it went.
    pub fn show(&self) -> Result<PathBuf, DataError> {
        let path = std::env::temp_dir().join(format!(
            "sp500-chart-{}.html",
            Utc::now().timestamp_micros()
        ));
        fs::write(&path, self.to_html()?)?;
        debug!(path = %path.display(), "wrote chart page");
        Ok(path)
    }
}
