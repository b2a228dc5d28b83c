//! Reports derived from a snapshot of the ledger.
//!
//! Nothing here is stored: every report is recomputed from the records passed
//! in, so it always reflects the latest committed state. Calendar dates are
//! taken in the time zone the caller passes in.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};

use crate::{ExpenseRecord, LedgerError, MoneyCents, ResultLedger};

const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Records of one calendar day, ascending by timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub records: Vec<ExpenseRecord>,
    pub total: MoneyCents,
}

/// Several days, ascending, with their grand total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodReport {
    pub days: Vec<DayGroup>,
    pub total: MoneyCents,
}

/// Sortable month identity. Sorting always uses this, never the label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// Display label, e.g. `outubro de 2026`.
    #[must_use]
    pub fn label(self) -> String {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("?");
        format!("{name} de {}", self.year)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthGroup {
    pub key: MonthKey,
    pub label: String,
    pub days: Vec<DayGroup>,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullReport {
    pub months: Vec<MonthGroup>,
    /// Descending by total; ties keep first-seen order.
    pub categories: Vec<CategoryTotal>,
    pub total: MoneyCents,
}

/// Sum of all values.
///
/// Fails with [`LedgerError::Overflow`] instead of wrapping.
pub fn total(records: &[ExpenseRecord]) -> ResultLedger<MoneyCents> {
    sum(records.iter().map(|r| r.value), "records")
}

/// Records whose local calendar date is `now`'s date, ascending by timestamp.
#[must_use]
pub fn today<Tz: TimeZone>(records: &[ExpenseRecord], now: &DateTime<Tz>) -> Vec<ExpenseRecord> {
    let tz = now.timezone();
    let date = now.date_naive();
    let mut out: Vec<ExpenseRecord> = records
        .iter()
        .filter(|r| local_date(r, &tz) == date)
        .cloned()
        .collect();
    out.sort_by_key(|r| r.timestamp);
    out
}

/// Records of the inclusive range `[today - (n-1), today]` grouped by day.
///
/// `n` is clamped to at least one day.
pub fn last_n_days<Tz: TimeZone>(
    records: &[ExpenseRecord],
    now: &DateTime<Tz>,
    n: u32,
) -> ResultLedger<PeriodReport> {
    let tz = now.timezone();
    let end = now.date_naive();
    let start = end
        .checked_sub_days(Days::new(u64::from(n.max(1) - 1)))
        .unwrap_or(NaiveDate::MIN);

    let mut by_day: BTreeMap<NaiveDate, Vec<ExpenseRecord>> = BTreeMap::new();
    for record in records {
        let date = local_date(record, &tz);
        if date >= start && date <= end {
            by_day.entry(date).or_default().push(record.clone());
        }
    }

    let days = by_day
        .into_iter()
        .map(|(d, r)| day_group(d, r))
        .collect::<ResultLedger<Vec<DayGroup>>>()?;
    let total = sum(days.iter().map(|d| d.total), "period")?;
    Ok(PeriodReport { days, total })
}

/// Month → day grouping of every record plus the category ranking.
pub fn full_report<Tz: TimeZone>(
    records: &[ExpenseRecord],
    tz: &Tz,
) -> ResultLedger<FullReport> {
    let mut by_month: BTreeMap<MonthKey, BTreeMap<NaiveDate, Vec<ExpenseRecord>>> =
        BTreeMap::new();
    for record in records {
        let date = local_date(record, tz);
        let key = MonthKey {
            year: date.year(),
            month: date.month(),
        };
        by_month
            .entry(key)
            .or_default()
            .entry(date)
            .or_default()
            .push(record.clone());
    }

    let mut months = Vec::with_capacity(by_month.len());
    for (key, days) in by_month {
        let days = days
            .into_iter()
            .map(|(d, r)| day_group(d, r))
            .collect::<ResultLedger<Vec<DayGroup>>>()?;
        let total = sum(days.iter().map(|d| d.total), "month")?;
        months.push(MonthGroup {
            key,
            label: key.label(),
            days,
            total,
        });
    }

    Ok(FullReport {
        months,
        categories: category_ranking(records)?,
        total: total(records)?,
    })
}

/// Per-category totals, descending; equal totals keep first-seen order.
pub fn category_ranking(records: &[ExpenseRecord]) -> ResultLedger<Vec<CategoryTotal>> {
    let mut ranking: Vec<CategoryTotal> = Vec::new();
    for record in records {
        match ranking.iter_mut().find(|c| c.category == record.category) {
            Some(entry) => {
                entry.total = entry
                    .total
                    .checked_add(record.value)
                    .ok_or(LedgerError::Overflow("category"))?;
            }
            None => ranking.push(CategoryTotal {
                category: record.category.clone(),
                total: record.value,
            }),
        }
    }
    // Stable sort.
    ranking.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(ranking)
}

fn local_date<Tz: TimeZone>(record: &ExpenseRecord, tz: &Tz) -> NaiveDate {
    record.timestamp.with_timezone(tz).date_naive()
}

fn day_group(date: NaiveDate, mut records: Vec<ExpenseRecord>) -> ResultLedger<DayGroup> {
    records.sort_by_key(|r| r.timestamp);
    let total = sum(records.iter().map(|r| r.value), "day")?;
    Ok(DayGroup {
        date,
        records,
        total,
    })
}

fn sum(
    amounts: impl IntoIterator<Item = MoneyCents>,
    what: &'static str,
) -> ResultLedger<MoneyCents> {
    MoneyCents::checked_sum(amounts).ok_or(LedgerError::Overflow(what))
}
