//! Staleness policy.
//!
//! A symbol is stale when its introduction time is strictly older than
//! `now - cutoff`, or than midnight UTC of a cutoff date. Every usage of a
//! stale symbol yields one diagnostic; symbols without a known introduction
//! never do.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::analysis::Occurrence;
use crate::history::Introduction;

use super::Diagnostic;

/// How old a symbol may get before it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cutoff {
    /// A fixed age, in whole days.
    Days(u32),
    /// Everything introduced before this date.
    Since(NaiveDate),
}

impl Cutoff {
    /// Cutoff age in whole days, as seen from `now`.
    ///
    /// A `Since` date in the future yields zero.
    pub fn days_at(&self, now: DateTime<Utc>) -> i64 {
        match self {
            Cutoff::Days(days) => i64::from(*days),
            Cutoff::Since(date) => (now.date_naive() - *date).num_days().max(0),
        }
    }

    /// Introductions strictly before the returned instant are stale.
    ///
    /// A `Since` date means midnight UTC of that day, never later than `now`.
    pub fn threshold_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Cutoff::Days(days) => now - TimeDelta::days(i64::from(*days)),
            Cutoff::Since(date) => date.and_time(NaiveTime::MIN).and_utc().min(now),
        }
    }
}

impl FromStr for Cutoff {
    type Err = String;

    /// Accepts `30`, `30d`, `6w` or an ISO date such as `2023-01-01`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty cutoff".to_string());
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Cutoff::Since(date));
        }

        let (digits, multiplier) = if let Some(d) = s.strip_suffix('w') {
            (d, 7)
        } else if let Some(d) = s.strip_suffix('d') {
            (d, 1)
        } else {
            (s, 1)
        };

        digits
            .parse::<u32>()
            .ok()
            .and_then(|n| n.checked_mul(multiplier))
            .map(Cutoff::Days)
            .ok_or_else(|| {
                format!(
                    "invalid cutoff '{}': expected days (30, 30d), weeks (6w) or a date (YYYY-MM-DD)",
                    s
                )
            })
    }
}

impl fmt::Display for Cutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cutoff::Days(days) => write!(f, "{}d", days),
            Cutoff::Since(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Decides which symbols are stale relative to a fixed "now".
#[derive(Debug, Clone, Copy)]
pub struct StalenessPolicy {
    now: DateTime<Utc>,
    cutoff_days: i64,
    threshold: DateTime<Utc>,
}

impl StalenessPolicy {
    pub fn new(cutoff: Cutoff, now: DateTime<Utc>) -> Self {
        Self {
            now,
            cutoff_days: cutoff.days_at(now),
            threshold: cutoff.threshold_at(now),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn cutoff_days(&self) -> i64 {
        self.cutoff_days
    }

    /// Introductions strictly before this instant are stale.
    pub fn threshold(&self) -> DateTime<Utc> {
        self.threshold
    }

    pub fn is_stale(&self, introduced_at: DateTime<Utc>) -> bool {
        introduced_at < self.threshold()
    }

    /// One diagnostic per usage of every stale symbol.
    ///
    /// Output is grouped by symbol name, usages in the order given.
    pub fn evaluate(
        &self,
        introductions: &BTreeMap<String, Introduction>,
        usages: &BTreeMap<String, Vec<Occurrence>>,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (symbol, occurrences) in usages {
            let introduced_at = match introductions.get(symbol) {
                Some(Introduction::Found(t)) => *t,
                _ => continue,
            };
            if !self.is_stale(introduced_at) {
                continue;
            }

            diagnostics.extend(occurrences.iter().map(|usage| {
                Diagnostic::new(
                    usage.position.clone(),
                    symbol.as_str(),
                    introduced_at,
                    self.cutoff_days,
                )
            }));
        }

        diagnostics
    }
}
