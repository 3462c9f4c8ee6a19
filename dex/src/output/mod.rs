use std::{fs, io::Write as _, path::PathBuf};

use anyhow::Result;
use serde::Serialize;

mod table;

pub use table::{TableRow, render_table};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Pretty,
    Table,
    Quiet,
}

/// Where and how command results are written.
#[derive(Clone, Debug)]
pub struct Output {
    format: OutputFormat,
    path: Option<PathBuf>,
}

/// Position line printed under paged tables.
pub struct PageFooter<'a> {
    /// 0-based
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub query: &'a str,
}

impl std::fmt::Display for PageFooter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "page {} of {} ({} total)",
            self.page.saturating_add(1),
            self.total_pages.max(1),
            self.total
        )?;
        if !self.query.is_empty() {
            write!(f, "  ?{}", self.query)?;
        }
        Ok(())
    }
}

impl Output {
    pub fn new(format: OutputFormat, path: Option<PathBuf>) -> Self {
        Self { format, path }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let data = match self.format {
            OutputFormat::Quiet => return Ok(()),
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Json | OutputFormat::Table => serde_json::to_string(value)?,
        };
        self.write(&data)
    }

    /// Table rows in table format, otherwise a json array.
    pub fn emit_table<T: TableRow + Serialize>(&self, items: &[T]) -> Result<()> {
        match self.format {
            OutputFormat::Table => self.write(&render_table(items)),
            _ => self.emit_json(items),
        }
    }

    /// One page of a list: table rows and a footer in table format, otherwise `json`.
    pub fn emit_page<T: TableRow, J: Serialize>(
        &self,
        rows: &[T],
        footer: &PageFooter<'_>,
        json: &J,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Table => self.write(&format!("{}\n\n{footer}", render_table(rows))),
            _ => self.emit_json(json),
        }
    }

    pub fn emit_text(&self, text: &str) -> Result<()> {
        if self.format == OutputFormat::Quiet {
            return Ok(());
        }
        self.write(text)
    }

    fn write(&self, data: &str) -> Result<()> {
        let newline = if data.ends_with('\n') { "" } else { "\n" };
        match &self.path {
            Some(path) => fs::write(path, format!("{data}{newline}"))?,
            None => {
                let mut stdout = std::io::stdout().lock();
                write!(stdout, "{data}{newline}")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}
