use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

mod catalog;
mod cli_output;
mod config;
mod debug_payload;
mod debug_render;
mod export;
mod generation;
mod markup;
mod payload;
mod report;
mod tendency;
mod tui;

use catalog::Catalog;
use cli_output::{OutputMode, OutputWriter};
use config::{EditorConfig, CATALOG_ENV};
use debug_payload::DebugPayload;
use export::{resolve_output_path, write_snapshot, ExportSnapshot};
use generation::{Generated, GenerationResult};
use tendency::{TendencyEditor, TendencyEntry};

/// Default file for `debug --open` when no `--html` path is given
const DEFAULT_PANEL_FILE: &str = "debug_panel.html";

#[derive(Parser)]
#[command(name = "tendedit")]
#[command(about = "Review, override and export generated player tendencies", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Catalog JSON to use instead of the built-in one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List tendency categories and their caps
    Catalog {
        /// Only show one category (case-insensitive)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show a generated player's tendencies grouped by category
    Show {
        /// Generation result JSON ("-" for stdin)
        file: PathBuf,

        /// Player to show from a bulk result (card number or name)
        #[arg(short, long)]
        player: Option<String>,
    },

    /// Apply overrides and export the final values
    Edit {
        /// Generation result JSON ("-" for stdin)
        file: PathBuf,

        /// Player to edit from a bulk result (card number or name)
        #[arg(short, long)]
        player: Option<String>,

        /// Override as NAME=VALUE (repeatable)
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Export file (default: <export dir>/<Player_Name>_tendencies.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only report the outcome, don't write the export file
        #[arg(long)]
        no_export: bool,
    },

    /// Render a raw-data debug payload
    Debug {
        /// Debug payload JSON ("-" for stdin)
        file: PathBuf,

        /// Also write the panel as a standalone HTML page
        #[arg(long)]
        html: Option<PathBuf>,

        /// Open the HTML page in the browser
        #[arg(long = "open")]
        open_browser: bool,
    },

    /// Interactive tendency editor
    Tui {
        /// Generation result JSON ("-" for stdin)
        file: PathBuf,

        /// Player to start on in a bulk result (card number or name)
        #[arg(short, long)]
        player: Option<String>,
    },

    /// Show or change persisted defaults
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Persist a default catalog file and/or export directory
    Set {
        /// Default catalog JSON
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Default directory for exported files
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct OverrideOutcome {
    name: String,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    current: i64,
}

#[derive(Debug, Serialize)]
struct EditReport {
    player: String,
    overrides: Vec<OverrideOutcome>,
    snapshot: ExportSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    export_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ShowReport<'a> {
    player: &'a tendency::PlayerInfo,
    tendencies: &'a [TendencyEntry],
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    config_file: PathBuf,
    catalog_path: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    effective_catalog: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so only errors reach stderr there
    let level = if cli.verbose {
        Level::DEBUG
    } else if matches!(cli.command, Commands::Tui { .. }) {
        Level::ERROR
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let out = OutputWriter::new(OutputMode::detect(cli.json));
    let config = EditorConfig::load_or_default();
    let catalog_path =
        config.resolve_catalog_path(cli.catalog.clone(), std::env::var(CATALOG_ENV).ok());

    match cli.command {
        Commands::Catalog { category } => {
            let catalog = load_catalog(catalog_path.as_deref())?;
            run_catalog(&out, &catalog, category.as_deref())?;
        }

        Commands::Show { file, player } => {
            let catalog = load_catalog(catalog_path.as_deref())?;
            let generated = load_generated(&file)?;

            if generated.is_bulk() && player.is_none() {
                let cards = generated.cards();
                if out.is_json() {
                    out.emit_result(&cards)?;
                } else {
                    out.section(&format!("Bulk result: {} players", cards.len()));
                    println!("{}", report::cards_table(&cards, out.mode()));
                    out.info("Pick one with --player <number|name>");
                }
                return Ok(());
            }

            let result = pick_player(&generated, player.as_deref())?;
            let editor = TendencyEditor::from_result(catalog, result);
            if out.is_json() {
                out.emit_result(&ShowReport {
                    player: editor.player(),
                    tendencies: editor.entries(),
                })?;
            } else {
                report::print_tendencies(&out, &editor);
            }
        }

        Commands::Edit {
            file,
            player,
            set,
            output,
            no_export,
        } => {
            let catalog = load_catalog(catalog_path.as_deref())?;
            let generated = load_generated(&file)?;
            let result = pick_player(&generated, player.as_deref())?;
            let export_path = if no_export {
                None
            } else {
                Some(resolve_output_path(
                    output,
                    config.export_dir.as_deref(),
                    &result.name,
                ))
            };
            run_edit(&out, catalog, result, &set, export_path)?;
        }

        Commands::Debug {
            file,
            html,
            open_browser,
        } => {
            let document = payload::read_document(&file)?;
            let payload = DebugPayload::from_value(document)
                .with_context(|| format!("Invalid debug payload in {}", file.display()))?;
            let view = debug_render::render_payload(&payload);

            if out.is_json() {
                out.emit_result(&view)?;
            } else {
                report::print_debug_view(&out, &view);
            }

            let html_path = html.or_else(|| open_browser.then(|| PathBuf::from(DEFAULT_PANEL_FILE)));
            if let Some(path) = html_path {
                markup::write_document(&view, &path)?;
                out.success(&format!("Debug panel written to {}", path.display()));
                if open_browser && open::that(&path).is_err() {
                    out.warning("Could not auto-open browser - please open manually");
                }
            }
        }

        Commands::Tui { file, player } => {
            let catalog = load_catalog(catalog_path.as_deref())?;
            let generated = load_generated(&file)?;
            let idx = match player.as_deref() {
                Some(selector) => generated.select_index(selector)?,
                None => 0,
            };
            let app = tui::App::new(catalog, generated, idx).with_export_dir(config.export_dir);
            tui::run_tui(app)?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let report = ConfigReport {
                    config_file: EditorConfig::config_file_path()?,
                    catalog_path: config.catalog_path.clone(),
                    export_dir: config.export_dir.clone(),
                    effective_catalog: catalog_path,
                };
                if out.is_json() {
                    out.emit_result(&report)?;
                } else {
                    out.section("Configuration");
                    out.table(&[
                        ("Config file", report.config_file.display().to_string()),
                        ("Catalog", display_or(&report.catalog_path, "(built-in)")),
                        ("Export dir", display_or(&report.export_dir, "(current directory)")),
                        (
                            "Effective catalog",
                            display_or(&report.effective_catalog, "(built-in)"),
                        ),
                    ]);
                }
            }
            ConfigAction::Set {
                catalog,
                export_dir,
            } => {
                if catalog.is_none() && export_dir.is_none() {
                    bail!("Nothing to set: pass --catalog and/or --export-dir");
                }

                let mut config = config;
                if let Some(path) = catalog {
                    // Fail early instead of on the next run
                    Catalog::from_file(&path)
                        .with_context(|| format!("Invalid catalog {}", path.display()))?;
                    config.catalog_path = Some(path);
                }
                if let Some(dir) = export_dir {
                    config.export_dir = Some(dir);
                }

                let path = config.save()?;
                info!("Saved config to {}", path.display());
                if out.is_json() {
                    out.emit_result(&config)?;
                } else {
                    out.success(&format!("Saved {}", path.display()));
                }
            }
        },
    }

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<Arc<Catalog>> {
    let catalog = Catalog::load(path).with_context(|| match path {
        Some(p) => format!("Failed to load catalog {}", p.display()),
        None => "Failed to load built-in catalog".to_string(),
    })?;
    debug!(
        "Catalog: {} categories, {} tendencies",
        catalog.categories().len(),
        catalog.tendency_count()
    );
    Ok(catalog)
}

fn load_generated(file: &Path) -> Result<Generated> {
    let document = payload::read_document(file)?;
    Generated::from_value(document)
        .with_context(|| format!("Invalid generation result in {}", file.display()))
}

fn pick_player<'a>(
    generated: &'a Generated,
    selector: Option<&str>,
) -> Result<&'a GenerationResult> {
    match (selector, generated) {
        (Some(s), _) => Ok(generated.select(s)?),
        (None, Generated::Single(result)) => Ok(result),
        (None, Generated::Bulk(results)) if results.len() == 1 => Ok(&results[0]),
        (None, Generated::Bulk(results)) => Err(anyhow!(
            "Bulk result has {} players; pick one with --player",
            results.len()
        )),
    }
}

/// Split `NAME=VALUE` at the last `=`; both halves are trimmed
fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Missing tendency name in '{}'", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn run_catalog(out: &OutputWriter, catalog: &Catalog, category: Option<&str>) -> Result<()> {
    if let Some(name) = category {
        if catalog.category(name).is_none() {
            bail!("Unknown category '{}'", name);
        }
    }

    if out.is_json() {
        let categories: Vec<_> = catalog
            .categories()
            .iter()
            .filter(|c| category.map_or(true, |name| c.name.eq_ignore_ascii_case(name)))
            .map(|c| {
                let tendencies: serde_json::Map<String, serde_json::Value> = c
                    .tendencies
                    .iter()
                    .map(|t| (t.clone(), catalog.cap_for(t).into()))
                    .collect();
                serde_json::json!({"category": c.name, "caps": tendencies})
            })
            .collect();
        return out.emit_result(&categories);
    }

    out.section("Tendency catalog");
    println!("{}", report::catalog_table(catalog, category, out.mode()));
    out.info(&format!(
        "{} categories, {} tendencies",
        catalog.categories().len(),
        catalog.tendency_count()
    ));
    Ok(())
}

fn run_edit(
    out: &OutputWriter,
    catalog: Arc<Catalog>,
    result: &GenerationResult,
    assignments: &[String],
    export_path: Option<PathBuf>,
) -> Result<()> {
    let mut editor = TendencyEditor::from_result(catalog, result);
    let mut outcomes = Vec::with_capacity(assignments.len());

    for raw in assignments {
        let (name, input) = parse_assignment(raw)?;
        if !editor.catalog().contains(&name) && editor.entry(&name).is_none() {
            out.warning(&format!(
                "'{}' is not in the catalog (cap {})",
                name,
                editor.catalog().cap_for(&name)
            ));
        }

        let outcome = match editor.apply_override(&name, &input) {
            Ok(value) => {
                out.success(&format!("{} = {}", name, value));
                OverrideOutcome {
                    current: value,
                    name,
                    input,
                    applied: Some(value),
                    error: None,
                }
            }
            Err(err) => {
                let current = editor.current(&name).unwrap_or(0);
                out.error(&format!("{} = '{}' rejected: {} (kept {})", name, input, err, current));
                OverrideOutcome {
                    name,
                    input,
                    applied: None,
                    error: Some(err.to_string()),
                    current,
                }
            }
        };
        outcomes.push(outcome);
    }

    if !out.is_json() {
        report::print_tendencies(out, &editor);
    }

    let snapshot = editor.snapshot();
    let export_path = export_path.filter(|_| !snapshot.is_empty());
    match &export_path {
        Some(path) => {
            write_snapshot(&snapshot, path)?;
            out.success(&format!("Exported to {}", path.display()));
        }
        None if snapshot.is_empty() => out.warning("No tendencies to export"),
        None => {}
    }

    out.emit_result(&EditReport {
        player: editor.player().name.clone(),
        overrides: outcomes,
        snapshot,
        export_path,
    })
}

fn display_or(path: &Option<PathBuf>, fallback: &str) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cli_parses_edit() {
        let cli = Cli::try_parse_from([
            "tendedit", "--json", "edit", "player.json", "--set", "Shot=70", "-s", "Drive=45",
            "--no-export",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Edit { set, no_export, .. } => {
                assert_eq!(set, vec!["Shot=70", "Drive=45"]);
                assert!(no_export);
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment(" Shot Three = 70 ").unwrap(),
            ("Shot Three".to_string(), "70".to_string())
        );
        assert_eq!(
            parse_assignment("Shot=").unwrap(),
            ("Shot".to_string(), String::new())
        );
        assert!(parse_assignment("Shot 70").is_err());
        assert!(parse_assignment("=70").is_err());
    }

    #[test]
    fn test_pick_player_requires_selector_for_bulk() {
        let bulk = Generated::from_value(json!([
            {"name": "A", "tendencies": {}},
            {"name": "B", "tendencies": {}}
        ]))
        .unwrap();
        assert!(pick_player(&bulk, None).is_err());
        assert_eq!(pick_player(&bulk, Some("b")).unwrap().name, "B");

        let single = Generated::from_value(json!({"name": "Solo", "tendencies": {}})).unwrap();
        assert_eq!(pick_player(&single, None).unwrap().name, "Solo");
    }

    #[test]
    fn test_run_edit_exports_final_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("p.json");
        let result = GenerationResult {
            name: "Jalen Brunson".to_string(),
            team: "NYK".to_string(),
            position: "PG".to_string(),
            tendencies: vec![("Shot".to_string(), 70), ("Drive".to_string(), 55)],
        };
        let out = OutputWriter::new(OutputMode::Plain);
        let sets = vec!["Shot=85".to_string(), "Drive=42".to_string()];

        run_edit(&out, Catalog::builtin(), &result, &sets, Some(path.clone())).unwrap();

        let written: ExportSnapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.name, "Jalen Brunson");
        // Clamped to the Shot cap
        assert_eq!(written.get("Shot"), Some(75));
        assert_eq!(written.get("Drive"), Some(55));
    }

    #[test]
    fn test_run_edit_skips_empty_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        let catalog = Arc::new(Catalog::new(Vec::new(), Default::default()).unwrap());
        let result = GenerationResult {
            name: "Nobody".to_string(),
            team: String::new(),
            position: String::new(),
            tendencies: Vec::new(),
        };
        let out = OutputWriter::new(OutputMode::Plain);

        run_edit(&out, catalog, &result, &[], Some(path.clone())).unwrap();
        assert!(!path.exists());
    }
}
