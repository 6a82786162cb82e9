//! Value coercions shared by grammars, aliases and handlers.

use chrono::{Days, NaiveDate};

use crate::bag::Arg;
use crate::error::Error;

/// A parsed interval token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalSpec {
    /// `<N><unit>`, normalised to days (w = 7, m = 30, y = 365).
    Days(u32),
    /// Bare keyword such as `today` or `yesterday`, lower-cased.
    Keyword(String),
}

/// Parse `7d`, `2w`, `today`, ... Returns `None` for anything else.
pub fn parse_interval(token: &str) -> Option<IntervalSpec> {
    let token = token.trim().to_ascii_lowercase();
    if let Some(caps) = regex!(r"^([0-9]+)([dwmy])$").captures(&token) {
        let amount: u32 = caps.get(1)?.as_str().parse().ok()?;
        let scale = match caps.get(2)?.as_str() {
            "d" => 1,
            "w" => 7,
            "m" => 30,
            _ => 365,
        };
        return amount.checked_mul(scale).map(IntervalSpec::Days);
    }
    if regex!(r"^[a-z]+$").is_match(&token) {
        return Some(IntervalSpec::Keyword(token));
    }
    None
}

/// Start/end dates covered by `spec`, relative to `reference`.
///
/// ```text
/// 7d, ref 2013-02-12   -> 2013-02-05 ..= 2013-02-12
/// yesterday            -> 2013-02-11 ..= 2013-02-11
/// lastweek (unknown)   -> None
/// ```
pub fn window_bounds(spec: &IntervalSpec, reference: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match spec {
        IntervalSpec::Days(days) => Some((reference.checked_sub_days(Days::new(u64::from(*days)))?, reference)),
        IntervalSpec::Keyword(word) => match word.as_str() {
            "today" => Some((reference, reference)),
            "yesterday" => {
                let day = reference.checked_sub_days(Days::new(1))?;
                Some((day, day))
            }
            _ => None,
        },
    }
}

/// Parse the `/date:` flag: a single ISO date or `start-end`.
pub fn parse_date_range(value: &str) -> Option<(NaiveDate, NaiveDate)> {
    let caps = regex!(r"^(\d{4}-\d{2}-\d{2})(?:-(\d{4}-\d{2}-\d{2}))?$").captures(value.trim())?;
    let start = NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d").ok()?;
    let end = match caps.get(2) {
        Some(m) => NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok()?,
        None => start,
    };
    if end < start {
        return None;
    }
    Some((start, end))
}

/// MGID `dateInterval` parameter for an interval token.
///
/// The API knows a fixed set of named windows; any other day count becomes a
/// custom `interval` with explicit start/end dates.
pub fn mgid_date_interval(arg: &Arg) -> Result<Arg, Error> {
    let raw = arg.to_string().to_ascii_lowercase();
    let named = match raw.as_str() {
        "1d" | "today" => Some("today"),
        "yesterday" => Some("yesterday"),
        "7d" | "1w" => Some("lastSeven"),
        "30d" | "1m" => Some("last30Days"),
        _ => None,
    };
    if let Some(named) = named {
        return Ok(Arg::Text(named.to_string()));
    }
    match parse_interval(&raw) {
        Some(IntervalSpec::Days(_)) => Ok(Arg::Text("interval".to_string())),
        _ => Err(Error::InvalidCommandFlag { flag: "time_range", value: raw }),
    }
}

/// Zeropark `interval` parameter. Unknown tokens pass through upper-cased.
pub fn zeropark_interval(arg: &Arg) -> Result<Arg, Error> {
    let raw = arg.to_string().to_ascii_lowercase();
    let value = match raw.as_str() {
        "1d" | "today" => "TODAY".to_string(),
        "yesterday" => "YESTERDAY".to_string(),
        "7d" | "1w" => "LAST_7_DAYS".to_string(),
        "30d" | "1m" => "LAST_30_DAYS".to_string(),
        other => other.to_ascii_uppercase(),
    };
    Ok(Arg::Text(value))
}

/// Identity transform, stringifying the value.
pub fn as_text(arg: &Arg) -> Result<Arg, Error> {
    Ok(match arg {
        Arg::None => Arg::None,
        other => Arg::Text(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_interval_scales_units() {
        assert_eq!(parse_interval("7d"), Some(IntervalSpec::Days(7)));
        assert_eq!(parse_interval("2W"), Some(IntervalSpec::Days(14)));
        assert_eq!(parse_interval("1m"), Some(IntervalSpec::Days(30)));
        assert_eq!(parse_interval("1y"), Some(IntervalSpec::Days(365)));
        assert_eq!(parse_interval("Today"), Some(IntervalSpec::Keyword("today".into())));
        assert_eq!(parse_interval("7x"), None);
        assert_eq!(parse_interval(""), None);
    }

    #[test]
    fn window_bounds_counts_back_from_reference() {
        let reference = date(2013, 2, 12);
        assert_eq!(window_bounds(&IntervalSpec::Days(7), reference), Some((date(2013, 2, 5), reference)));
        assert_eq!(
            window_bounds(&IntervalSpec::Keyword("yesterday".into()), reference),
            Some((date(2013, 2, 11), date(2013, 2, 11)))
        );
        assert_eq!(window_bounds(&IntervalSpec::Keyword("thisweek".into()), reference), None);
    }

    #[test]
    fn parse_date_range_accepts_single_and_pair() {
        assert_eq!(parse_date_range("2024-01-05"), Some((date(2024, 1, 5), date(2024, 1, 5))));
        assert_eq!(parse_date_range("2024-01-01-2024-01-31"), Some((date(2024, 1, 1), date(2024, 1, 31))));
        assert_eq!(parse_date_range("2024-02-01-2024-01-01"), None);
        assert_eq!(parse_date_range("2024-13-01"), None);
    }

    #[test]
    fn mgid_interval_maps_named_windows() {
        let text = |s: &str| Arg::Text(s.to_string());
        assert_eq!(mgid_date_interval(&text("1d")).unwrap(), text("today"));
        assert_eq!(mgid_date_interval(&text("7d")).unwrap(), text("lastSeven"));
        assert_eq!(mgid_date_interval(&text("30D")).unwrap(), text("last30Days"));
        assert_eq!(mgid_date_interval(&text("90d")).unwrap(), text("interval"));
        assert!(matches!(
            mgid_date_interval(&text("fortnight")),
            Err(Error::InvalidCommandFlag { flag: "time_range", .. })
        ));
    }

    #[test]
    fn zeropark_interval_passes_unknown_tokens_through() {
        let text = |s: &str| Arg::Text(s.to_string());
        assert_eq!(zeropark_interval(&text("7d")).unwrap(), text("LAST_7_DAYS"));
        assert_eq!(zeropark_interval(&text("this_month")).unwrap(), text("THIS_MONTH"));
    }
}
