//! Date range expansion for multi-day fare queries.
//!
//! The CLI accepts a start date and an optional end date; fetchers run once per
//! calendar day in the inclusive range.

use chrono::NaiveDate;

/// Date range errors
#[derive(Debug, thiserror::Error)]
pub enum DateRangeError {
    /// Input did not parse as an ISO calendar date
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    BadFormat(String),

    /// End date precedes start date
    #[error("end date {end} precedes start date {start}")]
    EndBeforeStart {
        /// Requested range start
        start: NaiveDate,
        /// Requested range end
        end: NaiveDate,
    },
}

/// Parse a `YYYY-MM-DD` argument into a calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| DateRangeError::BadFormat(input.to_string()))
}

/// Expand a start date and optional end date into the ordered sequence of dates
/// to query, one per day inclusive.
///
/// With no end date the sequence is just `[start]`. An end date before the
/// start is an error, never an empty or reversed sequence.
pub fn expand(
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<Vec<NaiveDate>, DateRangeError> {
    let Some(end) = end else {
        return Ok(vec![start]);
    };

    if end < start {
        return Err(DateRangeError::EndBeforeStart { start, end });
    }

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(
            parse_date("2023-10-18").unwrap(),
            NaiveDate::from_ymd_opt(2023, 10, 18).unwrap()
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("18-10-2023").is_err());
        assert!(parse_date("2023-13-01").is_err());
        assert!(parse_date("tomorrow").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_expand_without_end_is_single_start() {
        let dates = expand(date("2023-10-18"), None).unwrap();
        assert_eq!(dates, vec![date("2023-10-18")]);
    }

    #[test]
    fn test_expand_inclusive_ascending() {
        let dates = expand(date("2023-10-18"), Some(date("2023-10-20"))).unwrap();
        assert_eq!(
            dates,
            vec![date("2023-10-18"), date("2023-10-19"), date("2023-10-20")]
        );
    }

    #[test]
    fn test_expand_count_matches_day_span() {
        let start = date("2023-02-26");
        let end = date("2023-03-05");
        let dates = expand(start, Some(end)).unwrap();
        assert_eq!(dates.len() as i64, (end - start).num_days() + 1);
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert!(dates
            .iter()
            .all(|d| parse_date(&d.to_string()).is_ok()));
    }

    #[test]
    fn test_expand_same_start_and_end() {
        let dates = expand(date("2023-10-18"), Some(date("2023-10-18"))).unwrap();
        assert_eq!(dates, vec![date("2023-10-18")]);
    }

    #[test]
    fn test_expand_end_before_start_is_error() {
        let result = expand(date("2023-10-20"), Some(date("2023-10-18")));
        assert!(matches!(result, Err(DateRangeError::EndBeforeStart { .. })));
    }
}
