//! Calendar-month keys and the inclusive month window the grid covers.
//!
//! A month is persisted as the first day of that month (no time component)
//! and addressed in memory by its `"YYYY-MM"` key. The two forms round-trip
//! losslessly through [`MonthKey`].

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── MonthKey ────────────────────────────────────────────────────────────────

/// One calendar month, held as its first day.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey(NaiveDate);

impl MonthKey {
  pub fn new(year: i32, month: u32) -> Result<Self> {
    NaiveDate::from_ymd_opt(year, month, 1)
      .map(Self)
      .ok_or_else(|| Error::InvalidMonth(format!("{year:04}-{month:02}")))
  }

  /// Truncate any date to the month it falls in.
  pub fn from_date(date: NaiveDate) -> Self {
    Self(date - Days::new(u64::from(date.day0())))
  }

  /// The store representation: the first day of the month.
  pub fn first_day(self) -> NaiveDate { self.0 }

  pub fn year(self) -> i32 { self.0.year() }

  pub fn month(self) -> u32 { self.0.month() }

  /// The following month, or `None` past the end of the calendar.
  pub fn succ(self) -> Option<Self> {
    self.0.checked_add_months(Months::new(1)).map(Self)
  }
}

impl fmt::Display for MonthKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year(), self.month())
  }
}

impl FromStr for MonthKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidMonth(s.to_owned());
    let (year, month) = s.split_once('-').ok_or_else(invalid)?;
    let digits = |part: &str, len: usize| {
      part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(year, 4) || !digits(month, 2) {
      return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    Self::new(year, month).map_err(|_| invalid())
  }
}

impl TryFrom<String> for MonthKey {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<MonthKey> for String {
  fn from(key: MonthKey) -> Self { key.to_string() }
}

impl From<MonthKey> for NaiveDate {
  fn from(key: MonthKey) -> Self { key.0 }
}

// ─── MonthRange ──────────────────────────────────────────────────────────────

/// A contiguous, inclusive run of months inside one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRange {
  start: MonthKey,
  end:   MonthKey,
}

impl MonthRange {
  /// Build the range `start_month..=end_month` of `year`.
  ///
  /// Returns [`Error::InvalidMonthRange`] when `start_month > end_month`.
  pub fn new(year: i32, start_month: u32, end_month: u32) -> Result<Self> {
    if start_month > end_month {
      return Err(Error::InvalidMonthRange {
        start: start_month,
        end:   end_month,
      });
    }
    Ok(Self {
      start: MonthKey::new(year, start_month)?,
      end:   MonthKey::new(year, end_month)?,
    })
  }

  /// The whole calendar year.
  pub fn full_year(year: i32) -> Result<Self> { Self::new(year, 1, 12) }

  pub fn year(&self) -> i32 { self.start.year() }

  pub fn start(&self) -> MonthKey { self.start }

  pub fn end(&self) -> MonthKey { self.end }

  pub fn contains(&self, month: MonthKey) -> bool {
    self.start <= month && month <= self.end
  }

  /// Number of months covered; always at least one.
  pub fn len(&self) -> usize {
    (self.end.month() - self.start.month() + 1) as usize
  }

  pub fn is_empty(&self) -> bool { false }

  /// Every month of the range, in calendar order.
  pub fn months(&self) -> impl Iterator<Item = MonthKey> + use<> {
    let end = self.end;
    std::iter::successors(Some(self.start), |m| m.succ())
      .take_while(move |m| *m <= end)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn month_key_round_trips_through_string_and_date() {
    let key: MonthKey = "2026-02".parse().unwrap();
    assert_eq!(key.to_string(), "2026-02");
    assert_eq!(
      key.first_day(),
      NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    );
    assert_eq!(MonthKey::from_date(key.first_day()), key);
  }

  #[test]
  fn from_date_truncates_to_first_day() {
    let date = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
    assert_eq!(MonthKey::from_date(date).to_string(), "2026-03");
  }

  #[test]
  fn malformed_keys_are_rejected() {
    for bad in [
      "2026-13", "2026-00", "2026-1", "26-01", "2026/01", "", "abcd-ef", "+202-01",
      "-202-01", "2026-+1", " 202-01",
    ] {
      assert!(
        matches!(bad.parse::<MonthKey>(), Err(Error::InvalidMonth(_))),
        "{bad:?} should not parse"
      );
    }
  }

  #[test]
  fn serde_uses_the_string_form() {
    let key = MonthKey::new(2026, 1).unwrap();
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, "\"2026-01\"");
    let back: MonthKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
    assert!(serde_json::from_str::<MonthKey>("\"2026-1\"").is_err());
  }

  #[test]
  fn range_lists_every_month_inclusive() {
    let range = MonthRange::new(2026, 1, 3).unwrap();
    let months: Vec<String> = range.months().map(|m| m.to_string()).collect();
    assert_eq!(months, ["2026-01", "2026-02", "2026-03"]);
    assert_eq!(range.len(), 3);
    assert_eq!(MonthRange::full_year(2026).unwrap().months().count(), 12);
  }

  #[test]
  fn single_month_range() {
    let range = MonthRange::new(2026, 7, 7).unwrap();
    assert_eq!(range.months().count(), 1);
    assert!(range.contains(MonthKey::new(2026, 7).unwrap()));
    assert!(!range.contains(MonthKey::new(2026, 8).unwrap()));
  }

  #[test]
  fn inverted_range_is_rejected() {
    assert!(matches!(
      MonthRange::new(2026, 5, 2),
      Err(Error::InvalidMonthRange { start: 5, end: 2 })
    ));
  }

  #[test]
  fn out_of_calendar_months_are_rejected() {
    assert!(matches!(
      MonthRange::new(2026, 1, 13),
      Err(Error::InvalidMonth(_))
    ));
    assert!(MonthRange::new(2026, 0, 3).is_err());
  }
}
