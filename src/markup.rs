// HTML emission for the diagnostic panel
use crate::debug_render::{
    BlockBody, DebugView, DisplayBlock, DisplayNode, DisplayRow, NO_DATA_PLACEHOLDER,
};
use anyhow::{Context, Result};
use std::fmt::Write;
use std::fs;
use std::path::Path;
use tracing::info;

const PAGE_STYLE: &str = "\
body{font-family:system-ui,sans-serif;background:#0f172a;color:#e2e8f0;margin:24px}\
.debug-header{font-size:18px;margin-bottom:16px}\
.badge{border-radius:4px;padding:2px 6px;background:#334155;font-size:12px}\
.debug-source{border:1px solid #334155;border-radius:6px;margin-bottom:8px;padding:6px 10px}\
.debug-ok{border-left:4px solid #22c55e}\
.debug-fail{border-left:4px solid #ef4444}\
.debug-warn{border-left:4px solid #eab308}\
.debug-error{color:#f87171}\
.debug-table,.debug-subtable{border-collapse:collapse;margin:4px 0}\
.debug-table td,.debug-subtable td{border-bottom:1px solid #1e293b;padding:2px 8px;vertical-align:top}\
.debug-key{color:#94a3b8}\
.debug-num{font-family:monospace}\
.debug-null{color:#f59e0b}\
.debug-empty{color:#64748b;font-style:italic}";

/// Escape `& < > "` before text lands in markup. Apostrophes pass through.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Panel markup: player header followed by one collapsible block per source
pub fn render_panel(view: &DebugView) -> String {
    let mut out = String::with_capacity(4096);
    let h = &view.header;

    let _ = writeln!(
        out,
        "<div class=\"debug-header\"><strong>{}</strong> (ID: {}) — \
         <span class=\"badge badge-pos\">{}</span> \
         <span class=\"badge badge-team\">{}</span></div>",
        escape(&h.player_name),
        escape(&h.player_id),
        escape(&h.position),
        escape(&h.team)
    );

    for block in &view.blocks {
        write_block(&mut out, block);
    }
    out
}

fn write_block(out: &mut String, block: &DisplayBlock) {
    let _ = writeln!(
        out,
        "<details class=\"debug-source {}\">",
        block.health.css_class()
    );
    let _ = write!(
        out,
        "<summary><span class=\"debug-status\">{} {}</span> <strong>{}</strong>",
        block.health.glyph(),
        escape(&block.status),
        escape(&block.title)
    );
    if let Some(error) = &block.error {
        let _ = write!(out, "<span class=\"debug-error\"> — {}</span>", escape(error));
    }
    let _ = writeln!(out, "</summary>");

    out.push_str("<div class=\"debug-data\">");
    match &block.body {
        BlockBody::Data { node } => write_node(out, node, 0),
        BlockBody::NoData => {
            let _ = write!(out, "<p class=\"debug-empty\">{}</p>", NO_DATA_PLACEHOLDER);
        }
    }
    let _ = writeln!(out, "</div></details>");
}

fn write_node(out: &mut String, node: &DisplayNode, depth: usize) {
    match node {
        DisplayNode::Table { rows } => {
            let class = if depth == 0 { "debug-table" } else { "debug-subtable" };
            let _ = write!(out, "<table class=\"{}\"><tbody>", class);
            for row in rows {
                match row {
                    DisplayRow::Pair { label, value } => {
                        let key_open = if depth == 0 { "<td class=\"debug-key\">" } else { "<td>" };
                        let _ = write!(out, "<tr>{}{}</td>", key_open, escape(label));
                        out.push_str("<td class=\"debug-num\">");
                        write_node(out, value, depth + 1);
                        out.push_str("</td></tr>");
                    }
                    DisplayRow::Span { text } => {
                        let _ = write!(out, "<tr><td colspan=\"2\">{}</td></tr>", escape(text));
                    }
                }
            }
            out.push_str("</tbody></table>");
        }
        DisplayNode::Null => out.push_str("<span class=\"debug-null\">null ⚠️</span>"),
        DisplayNode::Text { text } => out.push_str(&escape(text)),
    }
}

/// Standalone page wrapping [`render_panel`]
pub fn render_document(view: &DebugView) -> String {
    let title = if view.header.player_name.is_empty() {
        "Raw data".to_string()
    } else {
        format!("Raw data — {}", view.header.player_name)
    };

    let mut out = String::with_capacity(8192);
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"en\"><head><meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>{}</title>", escape(&title));
    let _ = writeln!(out, "<style>{}</style></head><body>", PAGE_STYLE);
    out.push_str(&render_panel(view));
    let _ = writeln!(out, "</body></html>");
    out
}

pub fn write_document(view: &DebugView, path: &Path) -> Result<()> {
    fs::write(path, render_document(view))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote debug panel to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_payload::DebugPayload;
    use crate::debug_render::render_payload;
    use serde_json::json;

    fn view(value: serde_json::Value) -> DebugView {
        render_payload(&DebugPayload::from_value(value).unwrap())
    }

    #[test]
    fn test_escape_reserved_characters() {
        assert_eq!(escape("a&b"), "a&amp;b");
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape("D'Angelo"), "D'Angelo");
    }

    #[test]
    fn test_escapes_every_text_position() {
        let html = render_panel(&view(json!({
            "player_name": "<b>Bad</b>",
            "team": "A&B",
            "data_sources": {
                "src_<x>": {
                    "status": "<WEIRD>",
                    "error": "\"quoted\"",
                    "data": {
                        "<k>": "<v>",
                        "list": [["<l>", "<r>"], "<span>"]
                    }
                }
            }
        })));

        assert!(!html.contains("<b>"));
        assert!(!html.contains("<x>"));
        assert!(!html.contains("<k>"));
        assert!(!html.contains("<v>"));
        assert!(!html.contains("<l>"));
        assert!(!html.contains("<r>"));
        assert!(!html.contains("<WEIRD>"));
        assert!(html.contains("&lt;b&gt;Bad&lt;/b&gt;"));
        assert!(html.contains("A&amp;B"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(html.contains("&lt;span&gt;"));
    }

    #[test]
    fn test_failed_source_markup() {
        let html = render_panel(&view(json!({
            "data_sources": {"shot_chart_api": {"status": "FAILED", "error": "timeout"}}
        })));
        assert!(html.contains("debug-source debug-fail"));
        assert!(html.contains("❌ FAILED"));
        assert!(html.contains("<strong>Shot Chart Api</strong>"));
        assert!(html.contains("<span class=\"debug-error\"> — timeout</span>"));
        assert!(html.contains("<p class=\"debug-empty\">No data returned</p>"));
    }

    #[test]
    fn test_null_and_nested_tables() {
        let html = render_panel(&view(json!({
            "data_sources": {"tracking": {"status": "ALL_NULL", "data": {"drives": null, "splits": {"a": 1}}}}
        })));
        assert!(html.contains("debug-warn"));
        assert!(html.contains("<span class=\"debug-null\">null ⚠️</span>"));
        assert!(html.contains("<table class=\"debug-table\">"));
        assert!(html.contains("<table class=\"debug-subtable\">"));
    }

    #[test]
    fn test_document_wraps_panel() {
        let v = view(json!({"player_name": "Jalen Brunson", "data_sources": {}}));
        let doc = render_document(&v);
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Raw data — Jalen Brunson</title>"));
        assert!(doc.contains(&render_panel(&v)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.html");
        write_document(&v, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), doc);
    }
}
