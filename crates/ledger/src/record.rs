//! Expense records and their on-disk line format.
//!
//! One record per line, fields separated by `;`:
//!
//! ```text
//! timestamp;value;description;category;id
//! ```
//!
//! `category` and `id` are optional on read (older lines carry three or four
//! fields). Field text is escaped so that `;`, `\` and line breaks inside a
//! description never split a record.

use chrono::{DateTime, FixedOffset, SecondsFormat, SubsecRound};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, MoneyCents, ResultLedger};

/// Category given to every record until the user confirms a suggestion.
pub const DEFAULT_CATEGORY: &str = "Other";

const FIELD_SEPARATOR: char = ';';
const ESCAPE: char = '\\';

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Stable identifier, absent on lines written before ids existed.
    pub id: Option<Uuid>,
    pub timestamp: DateTime<FixedOffset>,
    pub value: MoneyCents,
    pub description: String,
    pub category: String,
}

/// Identifying fields of a record, used to find it again after a round trip
/// through the file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordKey {
    pub id: Option<Uuid>,
    pub timestamp: DateTime<FixedOffset>,
    pub value: MoneyCents,
    pub description: String,
}

impl ExpenseRecord {
    /// Builds a fresh record with a new id and the default category.
    ///
    /// The timestamp is truncated to milliseconds, the precision it is stored
    /// with, so the in-memory record equals the one read back later.
    pub fn new(
        timestamp: DateTime<FixedOffset>,
        value: MoneyCents,
        description: &str,
    ) -> ResultLedger<Self> {
        if !value.is_positive() || value > MoneyCents::MAX_ENTRY {
            return Err(LedgerError::InvalidRecord(format!(
                "value must be in (0, {}], got {}",
                MoneyCents::MAX_ENTRY.to_ledger_string(),
                value.to_ledger_string()
            )));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(LedgerError::InvalidRecord(
                "description must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Some(Uuid::new_v4()),
            timestamp: timestamp.trunc_subsecs(3),
            value,
            description: description.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
        })
    }

    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey {
            id: self.id,
            timestamp: self.timestamp,
            value: self.value,
            description: self.description.clone(),
        }
    }

    #[must_use]
    pub fn matches(&self, key: &RecordKey) -> bool {
        self.id == key.id
            && self.timestamp == key.timestamp
            && self.value == key.value
            && self.description == key.description
    }

    #[must_use]
    pub fn has_default_category(&self) -> bool {
        self.category == DEFAULT_CATEGORY
    }

    /// Serializes the record as one line, without the trailing newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
            self.value.to_ledger_string(),
            escape(&self.description),
            escape(&self.category),
            sep = FIELD_SEPARATOR,
        );
        if let Some(id) = self.id {
            line.push(FIELD_SEPARATOR);
            line.push_str(&id.to_string());
        }
        line
    }

    /// Parses one stored line. Returns `None` for anything malformed: fewer
    /// than three fields, an unparsable timestamp, a non-positive value or an
    /// empty description.
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        let fields = split_fields(line.trim_end_matches(['\r', '\n']));
        if !(3..=5).contains(&fields.len()) {
            return None;
        }

        let timestamp = DateTime::parse_from_rfc3339(fields[0].trim()).ok()?;
        let value: MoneyCents = fields[1].parse().ok()?;
        if !value.is_positive() {
            return None;
        }
        let description = fields[2].trim();
        if description.is_empty() {
            return None;
        }
        let category = fields
            .get(3)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);
        let id = match fields.get(4).map(|raw| raw.trim()) {
            None | Some("") => None,
            Some(raw) => Some(Uuid::parse_str(raw).ok()?),
        };

        Some(Self {
            id,
            timestamp,
            value,
            description: description.to_string(),
            category: category.to_string(),
        })
    }
}

fn escape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for ch in field.chars() {
        match ch {
            ESCAPE => out.push_str("\\\\"),
            FIELD_SEPARATOR => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE => match chars.next() {
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some(other) => current.push(other),
                None => current.push(ESCAPE),
            },
            FIELD_SEPARATOR => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}
