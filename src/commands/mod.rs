//! Command implementations
//!
//! Each command renders one engine query for the terminal (or as JSON for a
//! presentation layer) through the session's writer:
//!
//! - `graph`: dataflow tree with statuses, stage summaries and inferred edges
//! - `log`: commit log, newest first
//! - `diff`: change list of one commit, or between a revision and `HEAD`
//! - `history`: commits touching one path
//! - `show`: raw file content at a revision
//! - `restore`: point-in-time restoration of one file

pub mod diff;
pub mod graph;
pub mod history;
pub mod log;
pub mod restore;
pub mod show;

use crate::areas::dataset::Dataset;
use serde::Serialize;
use std::cell::{RefCell, RefMut};
use std::io::Write;

pub struct Session {
    dataset: Dataset,
    writer: RefCell<Box<dyn Write>>,
}

impl Session {
    pub fn new(dataset: Dataset, writer: Box<dyn Write>) -> Self {
        Session {
            dataset,
            writer: RefCell::new(writer),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }

    fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        let mut writer = self.writer();
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writeln!(writer)?;

        Ok(())
    }
}

/// Human-readable size; `-` when unknown.
pub fn format_size(size: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    let Some(bytes) = size else {
        return "-".to_string();
    };
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.1} {}", UNITS[unit])
}
