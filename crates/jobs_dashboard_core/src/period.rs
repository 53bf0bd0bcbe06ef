//! crates/jobs_dashboard_core/src/period.rs
//!
//! Named period presets and the date windows they resolve to.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::decode;

/// A named preset date-range shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    Last7Days,
    #[default]
    Last30Days,
    Last60Days,
    Last90Days,
    ThisMonth,
    LastMonth,
    /// The dates were chosen by hand and are never recomputed.
    Custom,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::Last7Days,
        Period::Last30Days,
        Period::Last60Days,
        Period::Last90Days,
        Period::ThisMonth,
        Period::LastMonth,
        Period::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Last7Days => "last7days",
            Period::Last30Days => "last30days",
            Period::Last60Days => "last60days",
            Period::Last90Days => "last90days",
            Period::ThisMonth => "thisMonth",
            Period::LastMonth => "lastMonth",
            Period::Custom => "custom",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|period| period.as_str() == tag)
    }

    /// Unknown tags behave like `last30days`.
    pub fn from_tag(tag: &str) -> Self {
        Self::parse(tag).unwrap_or_default()
    }

    /// The inclusive range this preset implies on `today`. `Custom` implies nothing.
    pub fn resolve(self, today: NaiveDate) -> Option<DateRange> {
        match self {
            Period::Last7Days => Some(DateRange::trailing(today, 7)),
            Period::Last30Days => Some(DateRange::trailing(today, 30)),
            Period::Last60Days => Some(DateRange::trailing(today, 60)),
            Period::Last90Days => Some(DateRange::trailing(today, 90)),
            Period::ThisMonth => Some(DateRange {
                from: today.with_day(1)?,
                to: today,
            }),
            Period::LastMonth => {
                let to = today.with_day(1)?.pred_opt()?;
                Some(DateRange {
                    from: to.with_day(1)?,
                    to,
                })
            }
            Period::Custom => None,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.as_deref().map(Period::from_tag).unwrap_or_default())
    }
}

/// An inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// `today - days ..= today`.
    pub fn trailing(today: NaiveDate, days: u64) -> Self {
        Self {
            from: today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN),
            to: today,
        }
    }

    pub fn span_days(&self) -> i64 {
        (self.to - self.from).num_days()
    }

    /// The comparison window ending the day before `from`, with the same span.
    pub fn previous(&self) -> Self {
        let to = self.from.pred_opt().unwrap_or(NaiveDate::MIN);
        let span = u64::try_from(self.span_days()).unwrap_or(0);
        Self {
            from: to.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN),
            to,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// The date fields every filter model carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateWindow {
    #[serde(rename = "dateFrom", default, deserialize_with = "decode::optional_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(rename = "dateTo", default, deserialize_with = "decode::optional_date")]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub period: Period,
}

impl DateWindow {
    pub fn from_range(range: DateRange, period: Period) -> Self {
        Self {
            date_from: Some(range.from),
            date_to: Some(range.to),
            period,
        }
    }

    /// Both dates, when both are set.
    pub fn range(&self) -> Option<DateRange> {
        Some(DateRange {
            from: self.date_from?,
            to: self.date_to?,
        })
    }

    /// The stored range, or the trailing `days` ending today when a date is missing.
    pub fn range_or_trailing(&self, today: NaiveDate, days: u64) -> DateRange {
        self.range()
            .unwrap_or_else(|| DateRange::trailing(today, days))
    }

    pub fn is_complete(&self) -> bool {
        self.date_from.is_some() && self.date_to.is_some()
    }

    /// Stores `period` and recomputes both dates from it. `Custom` leaves them alone.
    pub fn apply(&mut self, period: Period, today: NaiveDate) {
        self.period = period;
        if let Some(range) = period.resolve(today) {
            self.date_from = Some(range.from);
            self.date_to = Some(range.to);
        }
    }
}

/// What a caller may hand to `set_period`.
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodSelection {
    /// A raw tag as it arrives from the UI; unknown tags act as `last30days`.
    Tag(String),
    Preset(Period),
    /// Copied verbatim, the caller asserts the fields agree.
    Explicit(DateWindow),
}

impl From<Period> for PeriodSelection {
    fn from(period: Period) -> Self {
        PeriodSelection::Preset(period)
    }
}

impl From<&str> for PeriodSelection {
    fn from(tag: &str) -> Self {
        PeriodSelection::Tag(tag.to_string())
    }
}

impl From<DateWindow> for PeriodSelection {
    fn from(window: DateWindow) -> Self {
        PeriodSelection::Explicit(window)
    }
}
