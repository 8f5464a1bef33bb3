//! Contribution split of a resolution across subcommittees.
//!
//! Everything here is a pure function over a row slice. Validation runs after
//! every keystroke in the editor, so it classifies instead of failing: the
//! caller always gets the full list of problems back as data.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{RowId, SubcommitteeId};

/// The exact total a complete allocation must reach.
pub const FULL_ALLOCATION: i64 = 100;
pub const MIN_ROW_PERCENT: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub row_id: RowId,
    pub subcommittee_id: Option<SubcommitteeId>,
    pub contribution_percent: i64,
}

impl AllocationRow {
    pub fn new(subcommittee_id: Option<SubcommitteeId>, contribution_percent: i64) -> Self {
        Self {
            row_id: RowId::new(),
            subcommittee_id,
            contribution_percent,
        }
    }

    pub fn unassigned(contribution_percent: i64) -> Self {
        Self::new(None, contribution_percent)
    }

    /// Row carries both a subcommittee and a positive share.
    pub fn is_assigned(&self) -> bool {
        self.subcommittee_id.is_some() && self.contribution_percent > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("at least one subcommittee row is required")]
    EmptySet,
    #[error("total contribution must be exactly 100% (currently {actual}%)")]
    TotalMismatch { actual: i64 },
    #[error("subcommittee assigned more than once: {}", join_ids(.ids))]
    DuplicateSubcommittee { ids: Vec<SubcommitteeId> },
    #[error("only {limit} subcommittee rows can be assigned ({count} present)")]
    TooManyRows { count: usize, limit: usize },
    #[error("row {index}: select a subcommittee")]
    RowMissingSubcommittee { index: usize },
    #[error("row {index}: contribution must be between 1 and 100 (got {value})")]
    RowPercentOutOfRange { index: usize, value: i64 },
}

fn join_ids(ids: &[SubcommitteeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses percent text the way the form field does: surrounding whitespace
/// is ignored, an optional sign and the leading run of digits are taken, and
/// anything without digits becomes 0.
pub fn coerce_percent(raw: &str) -> i64 {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for digit in digits.chars().map_while(|c| c.to_digit(10)) {
        seen_digit = true;
        value = value.saturating_mul(10).saturating_add(i64::from(digit));
    }

    match (seen_digit, negative) {
        (false, _) => 0,
        (true, true) => -value,
        (true, false) => value,
    }
}

/// Running total shown under the editor. Counts every row, assigned or not.
pub fn total_percent(rows: &[AllocationRow]) -> i64 {
    rows.iter()
        .fold(0i64, |acc, row| acc.saturating_add(row.contribution_percent))
}

/// Upper bound on rows for a catalog of `catalog_size` subcommittees. A set
/// always keeps its first row, even against an empty catalog.
pub fn row_limit(catalog_size: usize) -> usize {
    catalog_size.max(1)
}

/// Percent left before the set reaches 100, floored at 0.
pub fn remaining_percent(rows: &[AllocationRow]) -> i64 {
    FULL_ALLOCATION.saturating_sub(total_percent(rows)).max(0)
}

pub fn validate(rows: &[AllocationRow], catalog_size: usize) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if rows.is_empty() {
        errors.push(ValidationError::EmptySet);
    }

    let total = total_percent(rows);
    if total != FULL_ALLOCATION {
        errors.push(ValidationError::TotalMismatch { actual: total });
    }

    let ids = duplicate_subcommittees(rows);
    if !ids.is_empty() {
        errors.push(ValidationError::DuplicateSubcommittee { ids });
    }

    let limit = row_limit(catalog_size);
    if rows.len() > limit {
        errors.push(ValidationError::TooManyRows {
            count: rows.len(),
            limit,
        });
    }

    for (offset, row) in rows.iter().enumerate() {
        let index = offset + 1;
        if row.subcommittee_id.is_none() {
            errors.push(ValidationError::RowMissingSubcommittee { index });
        }
        if !(MIN_ROW_PERCENT..=FULL_ALLOCATION).contains(&row.contribution_percent) {
            errors.push(ValidationError::RowPercentOutOfRange {
                index,
                value: row.contribution_percent,
            });
        }
    }

    errors
}

/// Ids held by two or more rows, each listed once in first-appearance order.
fn duplicate_subcommittees(rows: &[AllocationRow]) -> Vec<SubcommitteeId> {
    let mut counts: HashMap<SubcommitteeId, usize> = HashMap::new();
    for id in rows.iter().filter_map(|row| row.subcommittee_id) {
        *counts.entry(id).or_default() += 1;
    }

    let mut duplicates = Vec::new();
    for id in rows.iter().filter_map(|row| row.subcommittee_id) {
        if counts.get(&id).copied().unwrap_or_default() > 1 && !duplicates.contains(&id) {
            duplicates.push(id);
        }
    }
    duplicates
}

/// Snapshot backing the live "Total: X%" indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStatus {
    pub total: i64,
    pub errors: Vec<ValidationError>,
}

impl AllocationStatus {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.is_valid() { "valid" } else { "invalid" };
        write!(f, "Total: {}% ({verdict})", self.total)
    }
}

pub fn allocation_status(rows: &[AllocationRow], catalog_size: usize) -> AllocationStatus {
    AllocationStatus {
        total: total_percent(rows),
        errors: validate(rows, catalog_size),
    }
}

#[cfg(test)]
#[path = "tests/allocation_tests.rs"]
mod tests;
