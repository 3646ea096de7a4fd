//! Sortable unique identifiers
//!
//! An id is 30 ASCII digits: a 19-digit zero-padded tick count (100ns units since
//! 0001-01-01T00:00:00Z) followed by an 11-digit random suffix. Ordinal string
//! comparison therefore orders ids by embedded time first.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ColdError, ColdResult};

/// Total length of a well-formed id
pub const SORTABLE_ID_LEN: usize = TICK_DIGITS + RANDOM_DIGITS;

const TICK_DIGITS: usize = 19;
const RANDOM_DIGITS: usize = 11;
const RANDOM_MODULUS: u64 = 100_000_000_000;
const MAX_TICKS: i128 = 9_999_999_999_999_999_999;
const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;
/// Ticks between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Lexicographically ordered event id with an embedded timestamp
///
/// Deserialization does not validate the shape so that documents written by
/// other tooling still load; `timestamp()` returns `None` for ids it cannot decode.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortableUniqueId(String);

impl SortableUniqueId {
    /// Build an id for instant `at` with the given random component
    ///
    /// Only the low 11 decimal digits of `random` are used.
    pub fn generate(at: DateTime<Utc>, random: u64) -> Self {
        let ticks = ticks_from_datetime(at);
        Self(format!(
            "{:0tw$}{:0rw$}",
            ticks,
            random % RANDOM_MODULUS,
            tw = TICK_DIGITS,
            rw = RANDOM_DIGITS
        ))
    }

    /// Build an id for `at` with a random suffix
    pub fn generate_at(at: DateTime<Utc>) -> Self {
        Self::generate(at, Uuid::new_v4().as_u128() as u64)
    }

    /// Build an id for the current instant
    pub fn generate_new() -> Self {
        Self::generate_at(Utc::now())
    }

    /// Smallest id that can carry timestamp `at`
    pub fn min_at(at: DateTime<Utc>) -> Self {
        Self::generate(at, 0)
    }

    /// Largest id that can carry timestamp `at`
    pub fn max_at(at: DateTime<Utc>) -> Self {
        Self::generate(at, RANDOM_MODULUS - 1)
    }

    /// Parse and validate an id
    pub fn parse(value: impl Into<String>) -> ColdResult<Self> {
        let value = value.into();
        if value.len() != SORTABLE_ID_LEN || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ColdError::InvalidSortableId(value));
        }
        Ok(Self(value))
    }

    /// Wrap a string without validating it
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The id as its wire string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the wire string
    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode the embedded timestamp
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let digits = self.0.get(..TICK_DIGITS)?;
        if self.0.len() != SORTABLE_ID_LEN || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let ticks: i64 = digits.parse().ok()?;
        let unix_ticks = ticks - UNIX_EPOCH_TICKS;
        let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
        let nanos = unix_ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
        DateTime::from_timestamp(secs, nanos as u32)
    }

    /// Strictly greater in ordinal order
    pub fn is_later_than(&self, other: &SortableUniqueId) -> bool {
        self > other
    }
}

fn ticks_from_datetime(at: DateTime<Utc>) -> i128 {
    let secs = at.timestamp() as i128;
    let sub_ticks = (at.timestamp_subsec_nanos() as i128) / NANOS_PER_TICK as i128;
    let ticks = UNIX_EPOCH_TICKS as i128 + secs * TICKS_PER_SECOND as i128 + sub_ticks;
    ticks.clamp(0, MAX_TICKS)
}

impl fmt::Display for SortableUniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SortableUniqueId {
    type Err = ColdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for SortableUniqueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
