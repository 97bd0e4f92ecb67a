//! Detail-view graphs: range parsing, callbacks and chart payloads.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Map, Value};
use shared_types::Row;

use super::error::PipelineError;
use super::text::title_case;

/// Range requested by the client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphRange {
    Date {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    Numeric {
        from: Option<f64>,
        to: Option<f64>,
    },
}

impl Default for GraphRange {
    fn default() -> Self {
        GraphRange::Date {
            from: None,
            to: None,
        }
    }
}

impl GraphRange {
    /// Build from `range_type`, `range_from` and `range_to` query values.
    ///
    /// `range_type` defaults to `date`. Date bounds accept RFC 3339, a naive
    /// `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) or a bare `YYYY-MM-DD`.
    pub fn parse(
        range_type: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Self, PipelineError> {
        let from = from.filter(|s| !s.is_empty());
        let to = to.filter(|s| !s.is_empty());
        match range_type.unwrap_or("date") {
            "date" => Ok(GraphRange::Date {
                from: from.map(parse_datetime).transpose()?,
                to: to.map(parse_datetime).transpose()?,
            }),
            "numeric" => Ok(GraphRange::Numeric {
                from: from.map(parse_number).transpose()?,
                to: to.map(parse_number).transpose()?,
            }),
            other => Err(PipelineError::BadRequest(format!(
                "Invalid range type: {other}"
            ))),
        }
    }

    /// Build from a raw query string.
    pub fn from_query(query: &str) -> Result<Self, PipelineError> {
        let (mut range_type, mut from, mut to) = (None, None, None);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "range_type" => range_type = Some(value.into_owned()),
                "range_from" => from = Some(value.into_owned()),
                "range_to" => to = Some(value.into_owned()),
                _ => {}
            }
        }
        Self::parse(range_type.as_deref(), from.as_deref(), to.as_deref())
    }
}

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, PipelineError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| PipelineError::BadRequest(format!("Invalid date: {raw}")))
}

fn parse_number(raw: &str) -> Result<f64, PipelineError> {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| PipelineError::BadRequest(format!("Invalid number: {raw}")))
}

/// Chart payload: `{type, config}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphData {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub config: Value,
}

/// Line chart options. Unset options are omitted from the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChart {
    pub data: Vec<Map<String, Value>>,
    /// `{name, color}` per plotted key.
    pub series: Vec<Map<String, Value>>,
    /// Key of the x-axis value in each `data` item.
    pub data_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_nulls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_dots: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_legend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_point_labels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
}

impl LineChart {
    pub fn new(
        data: Vec<Map<String, Value>>,
        series: Vec<Map<String, Value>>,
        data_key: impl Into<String>,
    ) -> Self {
        Self {
            data,
            series,
            data_key: data_key.into(),
            curve_type: None,
            connect_nulls: None,
            fill_opacity: None,
            grid_axis: None,
            tick_line: None,
            unit: None,
            with_dots: None,
            with_legend: Some(true),
            with_point_labels: None,
            x_axis_label: None,
            y_axis_label: None,
        }
    }

    pub fn curve_type(mut self, curve: impl Into<String>) -> Self {
        self.curve_type = Some(curve.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn axis_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_axis_label = Some(x.into());
        self.y_axis_label = Some(y.into());
        self
    }

    pub fn into_graph(self) -> GraphData {
        GraphData {
            chart_type: "line".to_string(),
            config: serde_json::to_value(self).unwrap_or(Value::Null),
        }
    }
}

impl From<LineChart> for GraphData {
    fn from(chart: LineChart) -> Self {
        chart.into_graph()
    }
}

type GraphFn =
    Arc<dyn Fn(Row, GraphRange) -> BoxFuture<'static, anyhow::Result<GraphData>> + Send + Sync>;

/// A graph attached to a detail view.
#[derive(Clone)]
pub struct GraphSpec {
    pub reference: String,
    pub title: String,
    pub description: String,
    handler: GraphFn,
}

impl GraphSpec {
    pub fn new<F>(reference: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Row, GraphRange) -> BoxFuture<'static, anyhow::Result<GraphData>>
            + Send
            + Sync
            + 'static,
    {
        let reference = reference.into();
        Self {
            title: title_case(&reference),
            reference,
            description: String::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub(crate) async fn call(&self, entry: Row, range: GraphRange) -> anyhow::Result<GraphData> {
        (self.handler)(entry, range).await
    }
}

impl fmt::Debug for GraphSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphSpec")
            .field("reference", &self.reference)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}
