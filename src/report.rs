// Terminal rendering of the tendency tables and the debug panel
use crate::catalog::Catalog;
use crate::cli_output::{OutputMode, OutputWriter};
use crate::debug_render::{
    BlockBody, DebugView, DisplayBlock, DisplayNode, DisplayRow, SourceHealth,
    NO_DATA_PLACEHOLDER,
};
use crate::generation::PlayerCard;
use crate::tendency::{ColorClass, TendencyEditor, TendencyEntry};
use colored::Colorize;
use comfy_table::presets::{ASCII_FULL, UTF8_FULL};
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

fn new_table(mode: OutputMode) -> Table {
    let mut table = Table::new();
    match mode {
        OutputMode::Human => table.load_preset(UTF8_FULL),
        _ => table.load_preset(ASCII_FULL),
    };
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn table_color(color: ColorClass) -> Color {
    match color {
        ColorClass::Green => Color::Green,
        ColorClass::Yellow => Color::Yellow,
        ColorClass::Red => Color::Red,
    }
}

pub fn catalog_table(catalog: &Catalog, category: Option<&str>, mode: OutputMode) -> Table {
    let mut table = new_table(mode);
    table.set_header(vec!["Category", "Tendency", "Cap"]);

    let selected = catalog
        .categories()
        .iter()
        .filter(|c| category.map_or(true, |name| c.name.eq_ignore_ascii_case(name)));
    for cat in selected {
        for (i, tendency) in cat.tendencies.iter().enumerate() {
            let label = if i == 0 { cat.name.as_str() } else { "" };
            table.add_row(vec![
                Cell::new(label),
                Cell::new(tendency),
                Cell::new(catalog.cap_for(tendency)).set_alignment(CellAlignment::Right),
            ]);
        }
    }
    table
}

fn override_note(entry: &TendencyEntry) -> String {
    match (&entry.pending, entry.invalid) {
        (Some(raw), true) => format!("invalid: {}", raw),
        _ if entry.is_overridden() => format!("edited (was {})", entry.generated),
        _ => String::new(),
    }
}

/// One table per category, value cells colored by band
pub fn category_table(entries: &[&TendencyEntry], mode: OutputMode) -> Table {
    let mut table = new_table(mode);
    table.set_header(vec!["Tendency", "Cap", "Value", "Override"]);

    for entry in entries {
        let mut value = Cell::new(entry.current).set_alignment(CellAlignment::Right);
        let mut note = Cell::new(override_note(entry));
        if mode == OutputMode::Human {
            value = value.fg(table_color(entry.color));
            if entry.invalid {
                note = note.fg(Color::Red);
            }
        }
        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(entry.cap).set_alignment(CellAlignment::Right),
            value,
            note,
        ]);
    }
    table
}

pub fn print_tendencies(out: &OutputWriter, editor: &TendencyEditor) {
    let player = editor.player();
    let title = if player.name.is_empty() {
        "Tendencies".to_string()
    } else {
        format!("{} — {} {}", player.name, player.team, player.position)
    };
    out.section(title.trim_end());

    for (category, entries) in editor.groups() {
        println!();
        if out.is_human() {
            println!("{}", category.bold());
        } else {
            println!("{}", category);
        }
        println!("{}", category_table(&entries, out.mode()));
    }

    println!();
    out.table(&[
        ("Tendencies", editor.entries().len().to_string()),
        ("Overridden", editor.overridden_count().to_string()),
        ("Invalid edits", editor.invalid_count().to_string()),
    ]);
}

pub fn cards_table(cards: &[PlayerCard], mode: OutputMode) -> Table {
    let mut table = new_table(mode);
    table.set_header(vec!["#", "Player", "Details"]);
    for card in cards {
        table.add_row(vec![
            Cell::new(card.index).set_alignment(CellAlignment::Right),
            Cell::new(&card.name),
            Cell::new(card.label()),
        ]);
    }
    table
}

/// Indented text tree of the debug panel; `color` toggles ANSI styling
pub fn debug_tree_lines(view: &DebugView, color: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let h = &view.header;
    let mut header = h.player_name.clone();
    if !h.player_id.is_empty() {
        header.push_str(&format!(" (ID: {})", h.player_id));
    }
    let badges: Vec<&str> = [h.position.as_str(), h.team.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !badges.is_empty() {
        header.push_str(&format!(" — {}", badges.join(" · ")));
    }
    if !header.trim().is_empty() {
        lines.push(if color { header.bold().to_string() } else { header });
    }

    for block in &view.blocks {
        lines.push(String::new());
        lines.push(block_header(block, color));
        match &block.body {
            BlockBody::Data { node } => node_lines(node, 1, color, &mut lines),
            BlockBody::NoData => {
                let text = format!("  ({})", NO_DATA_PLACEHOLDER);
                lines.push(if color { text.dimmed().to_string() } else { text });
            }
        }
    }
    lines
}

fn block_header(block: &DisplayBlock, color: bool) -> String {
    let status = format!("{} {}", block.health.glyph(), block.status);
    let status = if color {
        match block.health {
            SourceHealth::Ok => status.green().to_string(),
            SourceHealth::Failed => status.red().to_string(),
            SourceHealth::Warning => status.yellow().to_string(),
        }
    } else {
        status
    };
    let title = if color {
        block.title.bold().to_string()
    } else {
        block.title.clone()
    };

    let mut line = format!("{}  {}", status, title);
    if let Some(error) = &block.error {
        let note = format!(" — {}", error);
        line.push_str(&if color { note.red().to_string() } else { note });
    }
    line
}

fn null_marker(color: bool) -> String {
    if color {
        "null ⚠".yellow().to_string()
    } else {
        "null ⚠".to_string()
    }
}

fn node_lines(node: &DisplayNode, depth: usize, color: bool, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match node {
        DisplayNode::Table { rows } => {
            for row in rows {
                match row {
                    DisplayRow::Pair { label, value } => match value {
                        DisplayNode::Table { .. } => {
                            lines.push(format!("{}{}:", indent, label));
                            node_lines(value, depth + 1, color, lines);
                        }
                        DisplayNode::Null => {
                            lines.push(format!("{}{}: {}", indent, label, null_marker(color)))
                        }
                        DisplayNode::Text { text } => {
                            lines.push(format!("{}{}: {}", indent, label, text))
                        }
                    },
                    DisplayRow::Span { text } => lines.push(format!("{}• {}", indent, text)),
                }
            }
        }
        DisplayNode::Null => lines.push(format!("{}{}", indent, null_marker(color))),
        DisplayNode::Text { text } => lines.push(format!("{}{}", indent, text)),
    }
}

pub fn print_debug_view(out: &OutputWriter, view: &DebugView) {
    out.section("Raw data");
    for line in debug_tree_lines(view, out.is_human()) {
        println!("{}", line);
    }
    println!();
    out.table(&[
        ("Sources", view.blocks.len().to_string()),
        ("OK", view.count(SourceHealth::Ok).to_string()),
        ("Failed", view.count(SourceHealth::Failed).to_string()),
        ("Warnings", view.count(SourceHealth::Warning).to_string()),
    ]);
}
