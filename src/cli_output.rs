// Output-mode aware CLI writer
use colored::Colorize;
use serde::Serialize;
use std::io::{self, IsTerminal};

/// Environment variable that forces JSON output
pub const JSON_ENV: &str = "TENDEDIT_JSON";

/// Output mode for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Colors, glyphs and boxed tables
    Human,
    /// Machine-readable JSON on stdout
    Json,
    /// Plain text without colors (for pipes/logs)
    Plain,
}

impl OutputMode {
    /// `--json` or `TENDEDIT_JSON` wins; otherwise a TTY gets human output
    pub fn detect(force_json: bool) -> Self {
        Self::resolve(
            force_json || std::env::var_os(JSON_ENV).is_some(),
            io::stdout().is_terminal(),
        )
    }

    fn resolve(json: bool, terminal: bool) -> Self {
        if json {
            Self::Json
        } else if terminal {
            Self::Human
        } else {
            Self::Plain
        }
    }
}

/// Level tag for messages emitted in JSON mode
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
enum MessageLevel {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    level: MessageLevel,
    message: &'a str,
}

/// CLI output writer with mode awareness
pub struct OutputWriter {
    mode: OutputMode,
}

impl OutputWriter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        match self.mode {
            OutputMode::Human => {
                println!();
                println!("{}", title.cyan().bold());
                println!("{}", "═".repeat(title.chars().count()).cyan());
            }
            OutputMode::Plain => {
                println!();
                println!("{}", title);
                println!("{}", "=".repeat(title.chars().count()));
            }
            OutputMode::Json => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("  {} {}", "✓".green(), message),
            OutputMode::Plain => println!("  [OK] {}", message),
            OutputMode::Json => self.emit_message(MessageLevel::Ok, message),
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => eprintln!("  {} {}", "✗".red(), message),
            OutputMode::Plain => eprintln!("  [ERROR] {}", message),
            OutputMode::Json => self.emit_message(MessageLevel::Error, message),
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("  {} {}", "⚠".yellow(), message),
            OutputMode::Plain => println!("  [WARN] {}", message),
            OutputMode::Json => self.emit_message(MessageLevel::Warning, message),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        match self.mode {
            OutputMode::Human | OutputMode::Plain => println!("  {}", message),
            OutputMode::Json => {}
        }
    }

    /// Print a key-value table
    pub fn table(&self, rows: &[(&str, String)]) {
        let max_key_len = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        match self.mode {
            OutputMode::Human => {
                for (key, value) in rows {
                    println!("  {:width$} │ {}", key.yellow(), value, width = max_key_len);
                }
            }
            OutputMode::Plain => {
                for (key, value) in rows {
                    println!("  {:width$} : {}", key, value, width = max_key_len);
                }
            }
            OutputMode::Json => {}
        }
    }

    /// Structured messages go to stderr so stdout carries only the result
    fn emit_message(&self, level: MessageLevel, message: &str) {
        if let Ok(json) = serde_json::to_string(&Message { level, message }) {
            eprintln!("{}", json);
        }
    }

    /// Emit the command's result document (JSON mode only)
    pub fn emit_result<T: Serialize>(&self, result: &T) -> anyhow::Result<()> {
        if self.is_json() {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        Ok(())
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn is_human(&self) -> bool {
        matches!(self.mode, OutputMode::Human)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, OutputMode::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_resolution() {
        assert_eq!(OutputMode::resolve(true, true), OutputMode::Json);
        assert_eq!(OutputMode::resolve(true, false), OutputMode::Json);
        assert_eq!(OutputMode::resolve(false, true), OutputMode::Human);
        assert_eq!(OutputMode::resolve(false, false), OutputMode::Plain);
    }

    #[test]
    fn test_detect_honours_flag() {
        assert_eq!(OutputMode::detect(true), OutputMode::Json);
        // Plain under cargo test (no TTY) unless the env var is set
        assert!(matches!(
            OutputMode::detect(false),
            OutputMode::Plain | OutputMode::Human | OutputMode::Json
        ));
    }

    #[test]
    fn test_writer_mode_queries() {
        let writer = OutputWriter::new(OutputMode::Json);
        assert!(writer.is_json());
        assert!(!writer.is_human());
        assert_eq!(writer.mode(), OutputMode::Json);
    }
}
