//! Where finalized tables go.

use crate::errors::*;
use crate::setting::Setting;
use evaluation::Table;
use std::fs;
use std::path::PathBuf;

/// Accepts finalized tables. Implementations only move bytes; every value in a
/// table is already computed and formatted.
pub trait TableSink {
    /// Stores `table` under `name`.
    fn accept(&mut self, name: &str, table: &Table) -> Result<()>;
}

/// Writes each table as a CSV file in the output directory.
pub struct CsvSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvSink {
    /// Creates the output directory if needed.
    pub fn new(setting: &Setting) -> Result<CsvSink> {
        let dir = PathBuf::from(&setting.output_dir);
        fs::create_dir_all(&dir)
            .chain_err(|| format!("failed to create {}", dir.display()))?;
        Ok(CsvSink {
            dir: dir,
            written: Vec::new(),
        })
    }

    /// Paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl TableSink for CsvSink {
    fn accept(&mut self, name: &str, table: &Table) -> Result<()> {
        let path = self.dir.join(name);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(table.header())?;
        for row in table.rows() {
            writer.write_record(row)?;
        }
        writer.flush()?;
        info!("wrote {} rows to {}", table.len(), path.display());
        self.written.push(path);
        Ok(())
    }
}

/// Keeps tables in memory, keyed by name.
#[derive(Default)]
pub struct MemorySink {
    /// Tables in the order they were accepted.
    pub tables: Vec<(String, Table)>,
}

impl MemorySink {
    /// The table stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.0 == name).map(|t| &t.1)
    }
}

impl TableSink for MemorySink {
    fn accept(&mut self, name: &str, table: &Table) -> Result<()> {
        self.tables.push((name.to_string(), table.clone()));
        Ok(())
    }
}
