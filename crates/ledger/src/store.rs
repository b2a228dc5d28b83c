//! Append-only text-file store for expense records.
//!
//! The store keeps no cache: every [`LedgerStore::read_all`] goes back to the
//! file. A missing file is an empty ledger.

use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use crate::{DEFAULT_CATEGORY, ExpenseRecord, RecordKey, ResultLedger};

/// What [`LedgerStore::clear`] found before clearing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearOutcome {
    Removed,
    AlreadyEmpty,
}

/// Result of a category update by match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryUpdate {
    Updated(ExpenseRecord),
    NotFound,
}

#[derive(Clone, Debug)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every well-formed record in file order.
    ///
    /// Malformed lines are skipped with a warning, never reported as errors.
    pub fn read_all(&self) -> ResultLedger<Vec<ExpenseRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match ExpenseRecord::from_line(line) {
                Some(record) => records.push(record),
                None => tracing::warn!(
                    "skipping malformed ledger line {} in {}",
                    idx + 1,
                    self.path.display()
                ),
            }
        }
        Ok(records)
    }

    /// Appends one record with a single write.
    pub fn append(&self, record: &ExpenseRecord) -> ResultLedger<()> {
        ensure_parent(&self.path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        let mut line = String::new();
        if !ends_with_newline(&mut file)? {
            line.push('\n');
        }
        line.push_str(&record.to_line());
        line.push('\n');

        file.write_all(line.as_bytes())?;
        file.flush()?;
        tracing::debug!("appended record {:?} to {}", record.id, self.path.display());
        Ok(())
    }

    /// Replaces the whole file with `records`, in the given order.
    ///
    /// The new content is written next to the ledger and renamed over it.
    pub fn rewrite_all(&self, records: &[ExpenseRecord]) -> ResultLedger<()> {
        ensure_parent(&self.path)?;

        let mut content = String::new();
        for record in records {
            content.push_str(&record.to_line());
            content.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        match fs::rename(&tmp, &self.path) {
            Ok(()) => Ok(()),
            Err(_) => {
                fs::copy(&tmp, &self.path)?;
                let _ = fs::remove_file(&tmp);
                Ok(())
            }
        }
    }

    /// Removes the ledger file.
    pub fn clear(&self) -> ResultLedger<ClearOutcome> {
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ClearOutcome::AlreadyEmpty),
            Err(err) => return Err(err.into()),
        };

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ClearOutcome::AlreadyEmpty),
            Err(err) => return Err(err.into()),
        }

        if len == 0 {
            Ok(ClearOutcome::AlreadyEmpty)
        } else {
            tracing::info!("ledger {} cleared", self.path.display());
            Ok(ClearOutcome::Removed)
        }
    }

    /// Sets `category` on the newest record matching `key` whose category is
    /// still the default one, then rewrites the file.
    ///
    /// A record that was already categorized is never touched, so repeating
    /// the same update yields [`CategoryUpdate::NotFound`].
    pub fn update_category(&self, key: &RecordKey, category: &str) -> ResultLedger<CategoryUpdate> {
        let mut records = self.read_all()?;

        let Some(idx) = records
            .iter()
            .rposition(|r| r.matches(key) && r.category == DEFAULT_CATEGORY)
        else {
            return Ok(CategoryUpdate::NotFound);
        };

        records[idx].category = category.to_string();
        let updated = records[idx].clone();
        self.rewrite_all(&records)?;
        Ok(CategoryUpdate::Updated(updated))
    }
}

fn ensure_parent(path: &Path) -> ResultLedger<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn ends_with_newline(file: &mut File) -> ResultLedger<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
