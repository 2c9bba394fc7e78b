use anyhow::Result;
use clap::ValueEnum;
use colored::{Color, Colorize};
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;
use strata::{RunReport, StatusReport};

use crate::theme::{Badge, ICONS, THEME};
use crate::utils::format_datetime;

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Data that can be rendered as a table or a one-liner.
pub trait TableDisplay {
    fn to_table(&self, output: &OutputManager) -> Table;
    fn to_compact(&self) -> String;
}

pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// True when decorative lines should be skipped (quiet or machine output).
    fn silent(&self) -> bool {
        self.options.quiet || self.options.output_format != OutputFormat::Table
    }

    fn paint(&self, icon: &str, message: &str, color: Color) -> String {
        if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
            OutputFormat::Table => println!("{}", data.to_table(self)),
            OutputFormat::Compact => println!("{}", data.to_compact()),
        }
        Ok(())
    }

    pub fn success(&self, message: &str) {
        if !self.silent() {
            println!("{}", self.paint(ICONS.success, message, THEME.success));
        }
    }

    /// Errors are always printed, to stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.paint(ICONS.error, message, THEME.error));
    }

    pub fn warning(&self, message: &str) {
        if !self.silent() {
            println!("{}", self.paint(ICONS.warning, message, THEME.warning));
        }
    }

    pub fn info(&self, message: &str) {
        if !self.silent() {
            println!("{}", self.paint(ICONS.info, message, THEME.info));
        }
    }

    /// Only shown with `--verbose`.
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            eprintln!("{}", self.paint(ICONS.arrow, message, THEME.muted));
        }
    }

    pub fn heading(&self, text: &str) {
        if self.silent() {
            return;
        }
        if self.options.no_color {
            println!("\n{text}\n{}", "=".repeat(text.chars().count()));
        } else {
            println!("\n{}", text.color(THEME.primary).bold());
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if self.silent() {
            return;
        }
        if self.options.no_color {
            println!("{key}: {value}");
        } else {
            println!("{}: {}", key.color(THEME.key).bold(), value.color(THEME.value));
        }
    }

    pub fn bullet(&self, text: &str) {
        if self.silent() {
            return;
        }
        let bullet = if self.options.no_color {
            ICONS.bullet.to_string()
        } else {
            ICONS.bullet.color(THEME.muted).to_string()
        };
        println!("  {bullet} {text}");
    }

    /// Table with the themed preset and a bold header row.
    pub fn create_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        if self.options.no_color {
            table.load_preset(comfy_table::presets::ASCII_FULL);
        } else {
            table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        }

        let header_cells: Vec<Cell> = headers
            .iter()
            .map(|header| {
                let cell = Cell::new(header).add_attribute(Attribute::Bold);
                if self.options.no_color {
                    cell
                } else {
                    cell.fg(TableColor::Cyan)
                }
            })
            .collect();
        table.set_header(header_cells);
        table
    }

    fn colored_cell(&self, text: impl ToString, color: TableColor) -> Cell {
        let cell = Cell::new(text.to_string());
        if self.options.no_color { cell } else { cell.fg(color) }
    }
}

impl TableDisplay for StatusReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table(&["", "Migration", "Status", "Applied at", "Description"]);
        for status in &self.migrations {
            let badge = Badge::for_state(status.state, status.checksum_mismatch);
            table.add_row(vec![
                output.colored_cell(badge.icon, badge.color),
                Cell::new(&status.id),
                output.colored_cell(badge.label, badge.color),
                Cell::new(status.applied_at.map(format_datetime).unwrap_or_default()),
                Cell::new(status.description.as_deref().unwrap_or_default()),
            ]);
        }
        let orphaned = Badge::ORPHANED;
        for record in &self.orphaned {
            table.add_row(vec![
                output.colored_cell(orphaned.icon, orphaned.color),
                Cell::new(&record.id),
                output.colored_cell(orphaned.label, orphaned.color),
                Cell::new(format_datetime(record.applied_at)),
                Cell::new("no migration file for this ledger record"),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "applied={} pending={} orphaned={}",
            self.applied_count(),
            self.pending_count(),
            self.orphaned.len()
        )
    }
}

impl TableDisplay for RunReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table(&["#", "Migration"]);
        for (index, id) in self.processed.iter().enumerate() {
            table.add_row(vec![Cell::new(index + 1), Cell::new(id)]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "processed={} skipped={} elapsed_ms={}",
            self.processed.len(),
            self.skipped,
            self.elapsed_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(format: OutputFormat) -> OutputManager {
        OutputManager::new(GlobalOptions {
            output_format: format,
            no_color: true,
            ..Default::default()
        })
    }

    #[test]
    fn run_report_compact_line() {
        let report = RunReport {
            processed: vec!["1747732722_updated_playlists".to_string()],
            skipped: 3,
            elapsed_ms: 12,
        };
        assert_eq!(report.to_compact(), "processed=1 skipped=3 elapsed_ms=12");
        assert!(manager(OutputFormat::Json).display(&report).is_ok());
    }

    #[test]
    fn status_table_lists_orphans() {
        let report = StatusReport {
            migrations: vec![],
            orphaned: vec![strata::MigrationRecord::new("1700000000_gone", "x", 0)],
        };
        let rendered = report.to_table(&manager(OutputFormat::Table)).to_string();
        assert!(rendered.contains("1700000000_gone"));
        assert!(rendered.contains("missing"));
        assert_eq!(report.to_compact(), "applied=0 pending=0 orphaned=1");
    }
}
