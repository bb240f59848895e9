// Copyright 2026 The MOHID Access Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Simulation instants.
//!
//! MOHID writes instants as six whitespace separated fields,
//! `YYYY MM DD hh mm ss`, where any field may carry a trailing `.` (the
//! values are read as Fortran reals) and seconds may be fractional. The
//! native library formats them with `-`, `:` or `T` separators instead
//! (`2002-01-01 12:30:15`); that layout is only tried when the text does
//! not split into six whitespace separated fields.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::common::Result;
use crate::init_err;

const NANOS_PER_SECOND: f64 = 1e9;

fn is_native_separator(c: char) -> bool {
    matches!(c, '-' | ':' | 'T' | '/' | ',')
}

/// Splits `source` into its fields. Returns `None` on an empty field, such
/// as the one left by a doubled or trailing separator.
fn split_fields(source: &str) -> Option<Vec<&str>> {
    let fields: Vec<&str> = source.split_whitespace().collect();
    if fields.len() == 6 {
        return Some(fields);
    }
    let mut native = Vec::new();
    for token in fields {
        for field in token.split(is_native_separator) {
            if field.is_empty() {
                return None;
            }
            native.push(field);
        }
    }
    Some(native)
}

fn integral_field(field: &str) -> Option<i64> {
    let value: f64 = field.parse().ok()?;
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    Some(value as i64)
}

/// Parses an instant in any of the layouts MOHID produces.
pub fn parse_instant(source: &str) -> Result<NaiveDateTime> {
    let fields = split_fields(source).unwrap_or_default();
    if fields.len() != 6 {
        return init_err!(
            BadInstant,
            format!("expected 6 fields (year month day hour minute second), got '{source}'")
        );
    }

    let mut parts = [0i64; 5];
    for (i, field) in fields[..5].iter().enumerate() {
        match integral_field(field) {
            Some(value) => parts[i] = value,
            None => {
                return init_err!(
                    BadInstant,
                    format!("field '{field}' of '{source}' is not a whole number")
                );
            }
        }
    }

    let seconds: f64 = match fields[5].parse() {
        Ok(seconds) => seconds,
        Err(_) => {
            return init_err!(BadInstant, format!("bad seconds field in '{source}'"));
        }
    };
    if !(0.0..60.0).contains(&seconds) {
        return init_err!(BadInstant, format!("seconds out of range in '{source}'"));
    }

    let [year, month, day, hour, minute] = parts;
    let minute_start = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
        .zip(u32::try_from(hour).ok().zip(u32::try_from(minute).ok()))
        .and_then(|(date, (h, m))| date.and_hms_opt(h, m, 0));

    match minute_start {
        Some(instant) => {
            let nanos = (seconds * NANOS_PER_SECOND).round() as i64;
            Ok(instant + Duration::nanoseconds(nanos))
        }
        None => init_err!(BadInstant, format!("'{source}' is not a calendar date")),
    }
}

/// Formats an instant the way MOHID data files spell it.
pub fn format_instant(instant: &NaiveDateTime) -> String {
    format!(
        "{} {} {} {} {} {}",
        instant.year(),
        instant.month(),
        instant.day(),
        instant.hour(),
        instant.minute(),
        format_seconds(second_of_minute(instant)),
    )
}

/// The seconds component including its fraction.
pub fn second_of_minute(instant: &NaiveDateTime) -> f64 {
    instant.second() as f64 + instant.nanosecond() as f64 / NANOS_PER_SECOND
}

fn format_seconds(seconds: f64) -> String {
    if seconds.fract() == 0.0 {
        format!("{}", seconds as u32)
    } else {
        format!("{seconds}")
    }
}

/// Converts a step length in seconds to a duration, rounded to the
/// nanosecond. `None` if the value does not fit.
pub fn duration_from_seconds(seconds: f64) -> Option<Duration> {
    let nanos = seconds * NANOS_PER_SECOND;
    if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::nanoseconds(nanos.round() as i64))
}

pub fn seconds_between(from: &NaiveDateTime, to: &NaiveDateTime) -> f64 {
    let delta = *to - *from;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / NANOS_PER_SECOND,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn parses_mohid_layout() {
        assert_eq!(at(2002, 1, 1, 0, 0, 0), parse_instant("2002 1 1 0 0 0").unwrap());
        assert_eq!(
            at(2002, 1, 1, 12, 0, 0),
            parse_instant("  2002  1  1  12  0  0  ").unwrap()
        );
        assert_eq!(
            at(1999, 12, 31, 23, 59, 59),
            parse_instant("1999. 12. 31. 23. 59. 59.").unwrap()
        );
    }

    #[test]
    fn parses_native_layouts() {
        let expected = at(2002, 1, 1, 12, 30, 15);
        assert_eq!(expected, parse_instant("2002-01-01 12:30:15").unwrap());
        assert_eq!(expected, parse_instant("2002-01-01T12:30:15").unwrap());
        assert_eq!(expected, parse_instant("2002:01:01:12:30:15").unwrap());
    }

    #[test]
    fn keeps_sub_second_resolution() {
        let instant = parse_instant("2002 1 1 0 0 0.25").unwrap();
        assert_eq!(250_000_000, instant.nanosecond());
        assert_eq!(0.25, second_of_minute(&instant));
        assert_eq!("2002 1 1 0 0 0.25", format_instant(&instant));
    }

    #[test]
    fn rejects_malformed_instants() {
        for source in [
            "",
            "2002 1 1",
            "2002 1 1 0 0 0 0",
            "2002 13 1 0 0 0",
            "2002 2 30 0 0 0",
            "2002 1 1 25 0 0",
            "2002 1 1.5 0 0 0",
            "2002 1 1 0 0 60",
            "year 1 1 0 0 0",
            "2002 1 -1 0 0 0",
            "2002 1 1 0 0 -5",
            "2002 1 -1 0 0 -5",
            "2002-01--1 00:00:00",
            "2002-01-01 00:00:00,",
        ] {
            let err = parse_instant(source).unwrap_err();
            assert_eq!(ErrorCode::BadInstant, err.code, "accepted '{source}'");
        }
    }

    #[test]
    fn formats_whole_seconds_without_fraction() {
        assert_eq!("2002 1 1 12 0 0", format_instant(&at(2002, 1, 1, 12, 0, 0)));
    }

    #[test]
    fn durations() {
        assert_eq!(Some(Duration::seconds(5)), duration_from_seconds(5.0));
        assert_eq!(Some(Duration::milliseconds(1500)), duration_from_seconds(1.5));
        assert_eq!(None, duration_from_seconds(f64::NAN));
        assert_eq!(None, duration_from_seconds(f64::INFINITY));
        assert_eq!(None, duration_from_seconds(1e30));

        let start = at(2002, 1, 1, 0, 0, 0);
        let stop = at(2002, 1, 1, 12, 0, 0);
        assert_eq!(43_200.0, seconds_between(&start, &stop));
        assert_eq!(-43_200.0, seconds_between(&stop, &start));
    }
}
