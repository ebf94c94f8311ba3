//! Generic hierarchical renderer for debug payloads.
//!
//! Source data arrives with no fixed schema, so [`render_value`] inspects each
//! value at runtime and turns it into a [`DisplayNode`] tree. Dispatch order
//! matters: sequences are checked first (so `[label, value]` pairs become
//! labelled rows), then mappings, null, numbers, and finally anything else
//! as plain text.
//!
//! The tree holds raw text. Escaping happens when it is emitted as markup
//! (see `markup.rs`).

use crate::debug_payload::{DebugPayload, SourceResult};
use serde::Serialize;
use serde_json::{Number, Value};

/// Sequences longer than this are cut off in the display
pub const MAX_SEQUENCE_ROWS: usize = 20;

pub const NO_DATA_PLACEHOLDER: &str = "No data returned";

/// Status shown when a source did not report one
pub const UNKNOWN_STATUS: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayNode {
    /// Two-column row table
    Table { rows: Vec<DisplayRow> },
    /// Explicit null, never rendered as blank
    Null,
    Text { text: String },
}

impl DisplayNode {
    pub fn text(text: impl Into<String>) -> Self {
        DisplayNode::Text { text: text.into() }
    }

    pub fn rows(&self) -> &[DisplayRow] {
        match self {
            DisplayNode::Table { rows } => rows,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayRow {
    Pair { label: String, value: DisplayNode },
    /// Single cell spanning both columns
    Span { text: String },
}

/// Overall health of one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceHealth {
    Ok,
    Failed,
    Warning,
}

impl SourceHealth {
    pub fn glyph(&self) -> &'static str {
        match self {
            SourceHealth::Ok => "✅",
            SourceHealth::Failed => "❌",
            SourceHealth::Warning => "⚠️",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            SourceHealth::Ok => "debug-ok",
            SourceHealth::Failed => "debug-fail",
            SourceHealth::Warning => "debug-warn",
        }
    }
}

/// `OK` and `FAILED` are recognized; every other status, or none, is a warning
pub fn classify_source(status: Option<&str>) -> SourceHealth {
    match status {
        Some("OK") => SourceHealth::Ok,
        Some("FAILED") => SourceHealth::Failed,
        _ => SourceHealth::Warning,
    }
}

/// Integral values print without a fraction, the rest with 4 fixed decimals
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else if !n.is_finite() || n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        fixed_half_up(n, 4)
    }
}

/// Exact ties round away from zero (`0.03125` -> `0.0313`), unlike `{:.N}`
fn fixed_half_up(n: f64, places: usize) -> String {
    // Every finite f64 has a terminating decimal expansion of at most 1074 fraction digits
    let exact = format!("{:.1074}", n.abs());
    let (int_part, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac.bytes().chain(std::iter::repeat(b'0')).take(places))
        .map(|b| b - b'0')
        .collect();

    if frac.as_bytes().get(places).map_or(false, |d| *d >= b'5') {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == 9 {
                *d = 0;
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - places;
    let to_str = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    format!(
        "{}{}.{}",
        if n < 0.0 { "-" } else { "" },
        to_str(&digits[..split]),
        to_str(&digits[split..])
    )
}

fn format_json_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())
    }
}

/// Plain string form of a value: strings unquoted, numbers as-is, null as `null`
pub fn plain_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => plain_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Non-null and holding at least one entry, element or character.
/// Numbers and booleans have no entries.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.is_empty(),
    }
}

pub fn render_value(value: &Value) -> DisplayNode {
    match value {
        Value::Array(items) => DisplayNode::Table {
            rows: items
                .iter()
                .take(MAX_SEQUENCE_ROWS)
                .map(sequence_row)
                .collect(),
        },
        Value::Object(map) => DisplayNode::Table {
            rows: map
                .iter()
                .map(|(key, v)| DisplayRow::Pair {
                    label: key.clone(),
                    value: render_value(v),
                })
                .collect(),
        },
        Value::Null => DisplayNode::Null,
        Value::Number(n) => DisplayNode::text(format_json_number(n)),
        other => DisplayNode::text(plain_string(other)),
    }
}

fn sequence_row(item: &Value) -> DisplayRow {
    match item {
        Value::Array(pair) if pair.len() == 2 => DisplayRow::Pair {
            label: plain_string(&pair[0]),
            value: DisplayNode::text(plain_string(&pair[1])),
        },
        other => DisplayRow::Span {
            text: plain_string(other),
        },
    }
}

/// `shot_chart_api` -> `Shot Chart Api`
pub fn humanize_source_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_alphanumeric();
        if is_word && !in_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        in_word = is_word;
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockBody {
    Data { node: DisplayNode },
    NoData,
}

/// Rendered form of one source: header plus body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayBlock {
    pub source: String,
    pub title: String,
    pub status: String,
    pub health: SourceHealth,
    pub error: Option<String>,
    pub body: BlockBody,
}

pub fn render_source(source_name: &str, result: &SourceResult) -> DisplayBlock {
    let body = match &result.data {
        Some(data) if is_present(data) => BlockBody::Data {
            node: render_value(data),
        },
        _ => BlockBody::NoData,
    };

    DisplayBlock {
        source: source_name.to_string(),
        title: humanize_source_name(source_name),
        status: result
            .status
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        health: classify_source(result.status.as_deref()),
        error: result.error.clone(),
        body,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewHeader {
    pub player_name: String,
    pub player_id: String,
    pub position: String,
    pub team: String,
}

/// The whole diagnostic panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugView {
    pub header: ViewHeader,
    pub blocks: Vec<DisplayBlock>,
}

impl DebugView {
    pub fn count(&self, health: SourceHealth) -> usize {
        self.blocks.iter().filter(|b| b.health == health).count()
    }
}

pub fn render_payload(payload: &DebugPayload) -> DebugView {
    DebugView {
        header: ViewHeader {
            player_name: payload.player_name.clone().unwrap_or_default(),
            player_id: payload.player_id.clone().unwrap_or_default(),
            position: payload.position.clone().unwrap_or_default(),
            team: payload.team.clone().unwrap_or_default(),
        },
        blocks: payload
            .sources
            .iter()
            .map(|(name, result)| render_source(name, result))
            .collect(),
    }
}
