//! Tabular output
//!
//! A [`TableView`] collects string cells once and renders them as an aligned
//! table, CSV, or a bare identifier list.

use miette::{IntoDiagnostic, Result};
use std::io::{self, Write};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

#[derive(Debug, Clone, Default)]
pub struct TableView {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) -> &mut Self {
        self.rows.push(cells);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Aligned table with rounded borders
    pub fn render(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|h| h.to_string()));
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }

    /// Header line followed by one record per row
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.headers)?;
        for row in &self.rows {
            csv.write_record(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Print in the requested format; JSON is the caller's responsibility
    pub fn print(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Csv => self.write_csv(io::stdout().lock()).into_diagnostic(),
            OutputFormat::Id => {
                for row in &self.rows {
                    if let Some(id) = row.first() {
                        println!("{}", id);
                    }
                }
                Ok(())
            }
            OutputFormat::Auto | OutputFormat::Table | OutputFormat::Json => {
                println!("{}", self.render());
                Ok(())
            }
        }
    }
}
