//! Per-year JSON array files
//!
//! Each calendar year gets one `<year>.json` file holding a single JSON
//! array. The file is written incrementally: `[` on open, one record per
//! line separated by `,\n`, and `\n]` on close. While open, the file on disk
//! is always a prefix of the final array missing only the closing bracket.

use eyre::{Context, Result, bail};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const ARRAY_OPEN: &[u8] = b"[\n";
const ARRAY_CLOSE: &[u8] = b"\n]";
const SEPARATOR: &[u8] = b",\n";

/// Outcome of one closed year file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSummary {
    pub year: i32,
    pub path: PathBuf,
    pub records: usize,
    /// A file of the same name existed and was truncated.
    pub overwritten: bool,
}

struct YearFile {
    year: i32,
    path: PathBuf,
    writer: BufWriter<File>,
    first_record: bool,
    records: usize,
    overwritten: bool,
}

impl YearFile {
    fn create(year: i32, path: PathBuf) -> Result<Self> {
        let overwritten = path.exists();
        if overwritten {
            log::warn!(
                "{} already exists and will be overwritten",
                path.display().bright_black()
            );
        }

        let file = File::create(&path)
            .with_context(|| format!("Failed to create year file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(ARRAY_OPEN)?;
        writer.flush()?;

        Ok(Self {
            year,
            path,
            writer,
            first_record: true,
            records: 0,
            overwritten,
        })
    }

    fn append(&mut self, records: &[Value]) -> Result<()> {
        for record in records {
            if !self.first_record {
                self.writer.write_all(SEPARATOR)?;
            }
            serde_json::to_writer(&mut self.writer, record)?;
            self.first_record = false;
            self.records += 1;
        }
        self.writer
            .flush()
            .with_context(|| format!("Failed to write to {}", self.path.display()))
    }

    fn close(mut self) -> Result<YearSummary> {
        self.writer.write_all(ARRAY_CLOSE)?;
        self.writer
            .flush()
            .with_context(|| format!("Failed to close {}", self.path.display()))?;

        Ok(YearSummary {
            year: self.year,
            path: self.path,
            records: self.records,
            overwritten: self.overwritten,
        })
    }
}

/// Owns the lifecycle of the per-year output files.
///
/// At most one file is open at a time. Moving to a new year closes the
/// previous file before the next one is truncated and opened, so a record
/// can never land in a year that has already been closed.
///
/// # Example
/// ```no_run
/// use mca_company_extractor::storage::YearFileRotator;
/// use serde_json::json;
///
/// # fn example() -> eyre::Result<()> {
/// let mut rotator = YearFileRotator::new("output")?;
/// rotator.rotate_to(2020)?;
/// rotator.append(&[json!({"CIN": "U1"}), json!({"CIN": "U2"})])?;
/// let years = rotator.finish()?;
/// assert_eq!(years[0].records, 2);
/// # Ok(())
/// # }
/// ```
pub struct YearFileRotator {
    dir: PathBuf,
    current: Option<YearFile>,
    opened: BTreeSet<i32>,
    closed: Vec<YearSummary>,
}

impl YearFileRotator {
    /// Create a rotator writing into `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        Ok(Self {
            dir,
            current: None,
            opened: BTreeSet::new(),
            closed: Vec::new(),
        })
    }

    /// Path of the file for `year`.
    pub fn path_for(&self, year: i32) -> PathBuf {
        self.dir.join(format!("{}.json", year))
    }

    /// Year of the file currently open, if any.
    pub fn current_year(&self) -> Option<i32> {
        self.current.as_ref().map(|f| f.year)
    }

    /// Records written to the file currently open.
    pub fn current_records(&self) -> usize {
        self.current.as_ref().map_or(0, |f| f.records)
    }

    /// Make `year` the open file, rotating only if it is not already open.
    pub fn ensure_year(&mut self, year: i32) -> Result<()> {
        if self.current_year() == Some(year) {
            return Ok(());
        }
        self.rotate_to(year)
    }

    /// Close the open file (if any) and truncate-open the file for `year`.
    ///
    /// # Errors
    /// Returns an error if `year` was already opened during this run, or on
    /// any filesystem failure.
    pub fn rotate_to(&mut self, year: i32) -> Result<()> {
        if self.opened.contains(&year) {
            bail!("Year {} was already written during this run", year);
        }

        self.close_current()?;

        let path = self.path_for(year);
        log::debug!("Opening {}", path.display());
        self.current = Some(YearFile::create(year, path)?);
        self.opened.insert(year);
        Ok(())
    }

    /// Append records to the open file, returning how many were written.
    ///
    /// The first record of a file is written bare; every later record is
    /// preceded by `,\n`, regardless of which call wrote it.
    pub fn append(&mut self, records: &[Value]) -> Result<usize> {
        let Some(file) = self.current.as_mut() else {
            bail!("No year file is open");
        };
        file.append(records)?;
        Ok(records.len())
    }

    /// Write the closing bracket of the open file, if any.
    pub fn close_current(&mut self) -> Result<()> {
        if let Some(file) = self.current.take() {
            let summary = file.close()?;
            log::debug!(
                "Closed {} with {} record(s)",
                summary.path.display(),
                summary.records
            );
            self.closed.push(summary);
        }
        Ok(())
    }

    /// Close the open file and return a summary of every file written.
    pub fn finish(&mut self) -> Result<Vec<YearSummary>> {
        self.close_current()?;
        Ok(self.closed.clone())
    }
}

impl Drop for YearFileRotator {
    fn drop(&mut self) {
        if let Some(file) = self.current.take() {
            let path = file.path.clone();
            if let Err(e) = file.close() {
                log::error!("Failed to close {}: {}", path.display(), e);
            }
        }
    }
}

/// Read a year file back as its array of records.
pub fn read_year_file(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read year file: {}", path.display()))?;

    match serde_json::from_str::<Value>(&content)
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))?
    {
        Value::Array(records) => Ok(records),
        other => bail!(
            "{} does not hold a JSON array (found {})",
            path.display(),
            json_kind(&other)
        ),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
