// src/resample/timeframe.rs

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DataError;

static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d*)\s*([A-Za-z]+)\s*$").expect("resample code regex"));

/// Calendar or clock unit a bucket is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

/// Which edge of a bucket names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
}

/// A parsed resample code such as `Y`, `3Y`, `QS` or `6H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeframe {
    pub count: u32,
    pub unit: Unit,
    pub anchor: Anchor,
}

impl Timeframe {
    pub fn parse(code: &str) -> Result<Self, DataError> {
        let invalid = || DataError::InvalidTimeframe(code.to_string());
        let caps = CODE_RE.captures(code).ok_or_else(invalid)?;

        let count = match caps.get(1).map(|m| m.as_str()).unwrap_or("") {
            "" => 1,
            digits => digits.parse::<u32>().map_err(|_| invalid())?,
        };
        if count == 0 {
            return Err(invalid());
        }

        let alias = caps[2].to_ascii_uppercase();
        let (unit, anchor) = match alias.as_str() {
            "Y" | "A" | "YE" | "AE" => (Unit::Year, Anchor::End),
            "YS" | "AS" => (Unit::Year, Anchor::Start),
            "Q" | "QE" => (Unit::Quarter, Anchor::End),
            "QS" => (Unit::Quarter, Anchor::Start),
            "M" | "ME" => (Unit::Month, Anchor::End),
            "MS" => (Unit::Month, Anchor::Start),
            "W" => (Unit::Week, Anchor::End),
            "D" => (Unit::Day, Anchor::Start),
            "H" => (Unit::Hour, Anchor::Start),
            "T" | "MIN" => (Unit::Minute, Anchor::Start),
            "S" => (Unit::Second, Anchor::Start),
            _ => return Err(invalid()),
        };

        Ok(Self {
            count,
            unit,
            anchor,
        })
    }

    /// Clock units start counting at midnight of the first day, calendar units
    /// at the period holding the first timestamp.
    pub(crate) fn origin(&self, first: NaiveDateTime) -> i64 {
        match self.unit {
            Unit::Day | Unit::Hour | Unit::Minute | Unit::Second => {
                self.period_of(first.date().and_time(NaiveTime::MIN))
            }
            _ => self.period_of(first),
        }
    }

    /// Index of the single period (ignoring `count`) containing `ts`.
    fn period_of(&self, ts: NaiveDateTime) -> i64 {
        let year = ts.year() as i64;
        let month0 = ts.month0() as i64;
        match self.unit {
            Unit::Year => year,
            Unit::Quarter => year * 4 + month0 / 3,
            Unit::Month => year * 12 + month0,
            // day 1 of the common era is a Monday
            Unit::Week => (ts.num_days_from_ce() as i64 - 1).div_euclid(7),
            Unit::Day => ts.and_utc().timestamp().div_euclid(86_400),
            Unit::Hour => ts.and_utc().timestamp().div_euclid(3_600),
            Unit::Minute => ts.and_utc().timestamp().div_euclid(60),
            Unit::Second => ts.and_utc().timestamp(),
        }
    }

    /// Bucket number of `ts`, counted from period `origin`.
    ///
    /// Start-labelled buckets open at `origin`. End-labelled buckets close at
    /// `origin`, so the first one only holds the origin period and every later
    /// one spans `count` periods.
    pub(crate) fn bucket_of(&self, origin: i64, ts: NaiveDateTime) -> i64 {
        let step = self.count as i64;
        let offset = self.period_of(ts) - origin;
        match self.anchor {
            Anchor::Start => offset.div_euclid(step),
            Anchor::End => (offset + step - 1).div_euclid(step),
        }
    }

    /// Label of bucket number `bucket`, counted from period `origin`.
    pub(crate) fn label(&self, origin: i64, bucket: i64) -> Option<NaiveDateTime> {
        let period = bucket
            .checked_mul(self.count as i64)
            .and_then(|p| p.checked_add(origin))?;
        match self.anchor {
            Anchor::Start => self.period_start(period),
            Anchor::End => self.period_end(period),
        }
    }

    fn period_start(&self, period: i64) -> Option<NaiveDateTime> {
        let date = match self.unit {
            Unit::Year => NaiveDate::from_ymd_opt(i32::try_from(period).ok()?, 1, 1)?,
            Unit::Quarter => month_start(period.div_euclid(4) * 12 + period.rem_euclid(4) * 3)?,
            Unit::Month => month_start(period)?,
            Unit::Week => week_start(period)?,
            Unit::Day => return from_unix(period * 86_400),
            Unit::Hour => return from_unix(period * 3_600),
            Unit::Minute => return from_unix(period * 60),
            Unit::Second => return from_unix(period),
        };
        Some(date.and_time(NaiveTime::MIN))
    }

    fn period_end(&self, period: i64) -> Option<NaiveDateTime> {
        let date = match self.unit {
            Unit::Year => NaiveDate::from_ymd_opt(i32::try_from(period).ok()?, 12, 31)?,
            Unit::Quarter => {
                month_start(period.div_euclid(4) * 12 + period.rem_euclid(4) * 3 + 3)?.pred_opt()?
            }
            Unit::Month => month_start(period + 1)?.pred_opt()?,
            Unit::Week => week_start(period)?.checked_add_days(Days::new(6))?,
            // clock units are always start-labelled
            _ => return self.period_start(period),
        };
        Some(date.and_time(NaiveTime::MIN))
    }
}

fn month_start(month_index: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        i32::try_from(month_index.div_euclid(12)).ok()?,
        month_index.rem_euclid(12) as u32 + 1,
        1,
    )
}

fn week_start(week: i64) -> Option<NaiveDate> {
    let day = week.checked_mul(7)?.checked_add(1)?;
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(day).ok()?)
}

fn from_unix(secs: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn parses_codes() {
        let y = Timeframe::parse("Y").unwrap();
        assert_eq!((y.count, y.unit, y.anchor), (1, Unit::Year, Anchor::End));

        let three = Timeframe::parse("3Y").unwrap();
        assert_eq!((three.count, three.unit), (3, Unit::Year));

        assert_eq!(Timeframe::parse("qs").unwrap().anchor, Anchor::Start);
        assert_eq!(Timeframe::parse("min").unwrap().unit, Unit::Minute);
        assert_eq!(Timeframe::parse(" 6H ").unwrap().count, 6);
    }

    #[test]
    fn rejects_bad_codes() {
        for code in ["", "0Y", "X", "Y3", "-1M", "99999999999Y"] {
            assert!(
                matches!(Timeframe::parse(code), Err(DataError::InvalidTimeframe(_))),
                "{code:?} should be rejected"
            );
        }
    }

    #[test]
    fn end_labels_fall_on_period_ends() {
        let tf = Timeframe::parse("M").unwrap();
        let origin = tf.origin(at(2020, 1, 15, 0));
        assert_eq!(tf.label(origin, 0), Some(at(2020, 1, 31, 0)));
        assert_eq!(tf.label(origin, 1), Some(at(2020, 2, 29, 0)));
        assert_eq!(tf.label(origin, 11), Some(at(2020, 12, 31, 0)));

        let q = Timeframe::parse("Q").unwrap();
        let origin = q.origin(at(1871, 1, 1, 0));
        assert_eq!(q.label(origin, 3), Some(at(1871, 12, 31, 0)));
        assert_eq!(q.label(origin, 4), Some(at(1872, 3, 31, 0)));
    }

    #[test]
    fn multi_year_buckets_close_on_first_year() {
        let tf = Timeframe::parse("3Y").unwrap();
        let origin = tf.origin(at(1990, 6, 1, 0));
        assert_eq!(tf.bucket_of(origin, at(1990, 12, 31, 0)), 0);
        assert_eq!(tf.bucket_of(origin, at(1991, 1, 1, 0)), 1);
        assert_eq!(tf.bucket_of(origin, at(1993, 12, 31, 0)), 1);
        assert_eq!(tf.bucket_of(origin, at(1994, 1, 1, 0)), 2);
        assert_eq!(tf.label(origin, 0), Some(at(1990, 12, 31, 0)));
        assert_eq!(tf.label(origin, 1), Some(at(1993, 12, 31, 0)));
    }

    #[test]
    fn multi_period_start_labels_open_on_first_period() {
        let tf = Timeframe::parse("2QS").unwrap();
        let origin = tf.origin(at(1871, 5, 1, 0));
        assert_eq!(tf.bucket_of(origin, at(1871, 9, 30, 0)), 0);
        assert_eq!(tf.bucket_of(origin, at(1871, 10, 1, 0)), 1);
        assert_eq!(tf.label(origin, 0), Some(at(1871, 4, 1, 0)));
    }

    #[test]
    fn out_of_range_labels_are_none() {
        let tf = Timeframe::parse("4294967295Y").unwrap();
        let origin = tf.origin(at(1990, 6, 1, 0));
        assert_eq!(tf.bucket_of(origin, at(1991, 6, 1, 0)), 1);
        assert_eq!(tf.label(origin, 1), None);

        let weeks = Timeframe::parse("4294967295W").unwrap();
        let origin = weeks.origin(at(1990, 6, 1, 0));
        assert_eq!(weeks.label(origin, 1), None);
    }

    #[test]
    fn weeks_run_monday_to_sunday() {
        let tf = Timeframe::parse("W").unwrap();
        // 2024-01-01 is a Monday, 2024-01-07 a Sunday
        let monday = tf.period_of(at(2024, 1, 1, 0));
        assert_eq!(tf.period_of(at(2024, 1, 7, 23)), monday);
        assert_eq!(tf.period_of(at(2024, 1, 8, 0)), monday + 1);
        assert_eq!(tf.label(monday, 0), Some(at(2024, 1, 7, 0)));
    }

    #[test]
    fn clock_units_anchor_on_first_midnight() {
        let tf = Timeframe::parse("6H").unwrap();
        let origin = tf.origin(at(2024, 3, 1, 7));
        let bucket = tf.bucket_of(origin, at(2024, 3, 1, 7));
        assert_eq!(bucket, 1);
        assert_eq!(tf.label(origin, bucket), Some(at(2024, 3, 1, 6)));
    }
}
