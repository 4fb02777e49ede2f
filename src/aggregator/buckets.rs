//! Time bucket generation and nearest-bucket lookup.
//!
//! Buckets are generated from the window alone, independent of any
//! records. The n-th bucket is `start + n * step` using calendar
//! arithmetic, so month-end starts clamp per bucket instead of drifting.

use crate::utils::config::MAX_LOOKBACK_YEARS;
use crate::utils::error::EngineError;
use chrono::{DateTime, Datelike, Duration, Months, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Step between consecutive buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annually,
}

impl Granularity {
    pub fn all() -> [Granularity; 5] {
        [
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
            Granularity::Quarterly,
            Granularity::Annually,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Quarterly => "quarterly",
            Granularity::Annually => "annually",
        }
    }

    /// The `n`-th step after `start`, or `None` past chrono's range
    fn offset(&self, start: DateTime<Utc>, n: u32) -> Option<DateTime<Utc>> {
        match self {
            Granularity::Daily => start.checked_add_signed(Duration::days(i64::from(n))),
            Granularity::Weekly => start.checked_add_signed(Duration::weeks(i64::from(n))),
            Granularity::Monthly => start.checked_add_months(Months::new(n)),
            Granularity::Quarterly => start.checked_add_months(Months::new(n.checked_mul(3)?)),
            Granularity::Annually => start.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    /// Short axis label for a bucket at this granularity
    pub fn label(&self, bucket: &DateTime<Utc>) -> String {
        match self {
            Granularity::Daily | Granularity::Weekly => bucket.format("%Y-%m-%d").to_string(),
            Granularity::Monthly => bucket.format("%Y-%m").to_string(),
            Granularity::Quarterly => format!("{}-Q{}", bucket.year(), bucket.month0() / 3 + 1),
            Granularity::Annually => bucket.year().to_string(),
        }
    }
}

impl FromStr for Granularity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Granularity::Daily),
            "weekly" | "week" => Ok(Granularity::Weekly),
            "monthly" | "month" => Ok(Granularity::Monthly),
            "quarterly" | "quarter" => Ok(Granularity::Quarterly),
            "annually" | "annual" | "yearly" | "year" => Ok(Granularity::Annually),
            _ => Err(EngineError::InvalidGranularity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Granularity {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed time range covered by the buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LookbackWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[now - years, now]`
    ///
    /// # Errors
    /// * `EngineError::InvalidLookback` - Years above the supported maximum
    pub fn ending_at(now: DateTime<Utc>, years: u32) -> Result<Self, EngineError> {
        if years > MAX_LOOKBACK_YEARS {
            return Err(EngineError::InvalidLookback(years));
        }

        let start = now
            .checked_sub_months(Months::new(years * 12))
            .ok_or(EngineError::InvalidLookback(years))?;

        Ok(Self { start, end: now })
    }
}

/// Generate bucket boundaries from `window.start` to `window.end` inclusive
///
/// **Public** - main entry point for bucket generation
///
/// The sequence is strictly increasing. An inverted window yields no
/// buckets.
pub fn generate_buckets(granularity: Granularity, window: &LookbackWindow) -> Vec<DateTime<Utc>> {
    if window.start > window.end {
        debug!("Window start {} is after end {}, no buckets", window.start, window.end);
        return Vec::new();
    }

    let mut buckets: Vec<DateTime<Utc>> = Vec::new();

    for n in 0u32.. {
        let Some(bucket) = granularity.offset(window.start, n) else {
            break;
        };
        if bucket > window.end {
            break;
        }
        if buckets.last().map_or(true, |last| bucket > *last) {
            buckets.push(bucket);
        }
    }

    debug!(
        "Generated {} {} buckets from {} to {}",
        buckets.len(),
        granularity,
        window.start,
        window.end
    );

    buckets
}

/// Index of the bucket nearest to `ts` by absolute distance
///
/// Ties go to the earlier bucket. Timestamps outside the buckets map to
/// the first or last one. `None` only when `buckets` is empty.
pub fn nearest_bucket(buckets: &[DateTime<Utc>], ts: DateTime<Utc>) -> Option<usize> {
    if buckets.is_empty() {
        return None;
    }

    // First bucket at or after ts
    let next = buckets.partition_point(|bucket| *bucket < ts);

    if next == 0 {
        return Some(0);
    }
    if next == buckets.len() {
        return Some(buckets.len() - 1);
    }

    let before = ts - buckets[next - 1];
    let after = buckets[next] - ts;

    if before <= after {
        Some(next - 1)
    } else {
        Some(next)
    }
}
