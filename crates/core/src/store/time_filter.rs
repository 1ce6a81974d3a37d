//! Time-window filtering of hazard features.

use crate::core_types::HazardFeature;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time window selected by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    /// Observed more than six months before the anchor
    Past,
    /// Observed between one month before and four days after the anchor
    Present,
    /// Forecast placeholder: the first half of the input, in order.
    ///
    /// There is no forecast data behind this window; it is synthetic and only
    /// meant for demos.
    Future,
    /// No filtering
    #[default]
    All,
}

impl TimePeriod {
    pub const ALL_PERIODS: [TimePeriod; 4] = [
        TimePeriod::Past,
        TimePeriod::Present,
        TimePeriod::Future,
        TimePeriod::All,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Past => "past",
            Self::Present => "present",
            Self::Future => "future",
            Self::All => "all",
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "past" => Ok(Self::Past),
            "present" => Ok(Self::Present),
            "future" => Ok(Self::Future),
            "all" => Ok(Self::All),
            other => Err(format!("unknown time period '{other}'")),
        }
    }
}

/// Window bounds relative to an anchor. `None` means the bound could not be
/// represented, in which case nothing matches.
fn past_cutoff(anchor: DateTime<Utc>) -> Option<DateTime<Utc>> {
    anchor.checked_sub_months(Months::new(6))
}

fn present_window(anchor: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = anchor.checked_sub_months(Months::new(1))?;
    let end = anchor.checked_add_signed(Duration::days(4))?;
    Some((start, end))
}

/// Write the indices of `features` that fall inside `period` into `out`.
///
/// `out` is cleared first; its capacity is reused across frames. Indices are
/// emitted in input order.
pub fn filter_indices(
    features: &[HazardFeature],
    period: TimePeriod,
    anchor: DateTime<Utc>,
    out: &mut Vec<usize>,
) {
    out.clear();
    match period {
        TimePeriod::All => out.extend(0..features.len()),
        TimePeriod::Future => out.extend(0..features.len() / 2),
        TimePeriod::Past => {
            let Some(cutoff) = past_cutoff(anchor) else {
                return;
            };
            out.extend(
                features
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| f.observed_at < cutoff)
                    .map(|(i, _)| i),
            );
        }
        TimePeriod::Present => {
            let Some((start, end)) = present_window(anchor) else {
                return;
            };
            out.extend(
                features
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| start <= f.observed_at && f.observed_at <= end)
                    .map(|(i, _)| i),
            );
        }
    }
}

/// Features of `features` that fall inside `period`, in input order.
#[must_use]
pub fn filter_by_time(
    features: &[HazardFeature],
    period: TimePeriod,
    anchor: DateTime<Utc>,
) -> Vec<&HazardFeature> {
    let mut indices = Vec::with_capacity(features.len());
    filter_indices(features, period, anchor, &mut indices);
    indices.into_iter().map(|i| &features[i]).collect()
}
