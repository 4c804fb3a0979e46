//! Gregorian to Jalali calendar conversion
//!
//! Domestic fare timestamps are displayed in the Jalali (Solar Hijri)
//! calendar. The conversion uses the standard integer arithmetic over the
//! 33-year cycle; no external service is involved.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Render a Gregorian timestamp as a Jalali display string, `YYYY/MM/DD HH:MM`.
pub fn to_jalali(dt: NaiveDateTime) -> String {
    let (jy, jm, jd) = jalali_ymd(dt.year(), dt.month(), dt.day());
    format!(
        "{jy:04}/{jm:02}/{jd:02} {:02}:{:02}",
        dt.hour(),
        dt.minute()
    )
}

/// Convert a Gregorian calendar date to Jalali year/month/day.
pub fn jalali_ymd(gy: i32, gm: u32, gd: u32) -> (i32, u32, u32) {
    const G_DAYS_BEFORE_MONTH: [i64; 12] =
        [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

    let (gy, gm, gd) = (i64::from(gy), i64::from(gm), i64::from(gd));
    let gy2 = if gm > 2 { gy + 1 } else { gy };

    let mut days = 355_666
        + 365 * gy
        + (gy2 + 3) / 4
        - (gy2 + 99) / 100
        + (gy2 + 399) / 400
        + gd
        + G_DAYS_BEFORE_MONTH[(gm - 1) as usize];

    let mut jy = -1595 + 33 * (days / 12_053);
    days %= 12_053;
    jy += 4 * (days / 1461);
    days %= 1461;
    if days > 365 {
        jy += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let (jm, jd) = if days < 186 {
        (1 + days / 31, 1 + days % 31)
    } else {
        (7 + (days - 186) / 30, 1 + (days - 186) % 30)
    };

    (jy as i32, jm as u32, jd as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDateTime::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            NaiveTime::from_hms_opt(h, min, 0).unwrap(),
        )
    }

    #[test]
    fn test_nowruz_boundaries() {
        // First day of the Jalali year.
        assert_eq!(jalali_ymd(2023, 3, 21), (1402, 1, 1));
        assert_eq!(jalali_ymd(2024, 3, 20), (1403, 1, 1));
        // Last day of the preceding (leap) year.
        assert_eq!(jalali_ymd(2024, 3, 19), (1402, 12, 29));
    }

    #[test]
    fn test_mid_year_conversion() {
        assert_eq!(jalali_ymd(2023, 10, 18), (1402, 7, 26));
        assert_eq!(jalali_ymd(2024, 1, 1), (1402, 10, 11));
    }

    #[test]
    fn test_display_format() {
        assert_eq!(to_jalali(at(2023, 10, 18, 7, 5)), "1402/07/26 07:05");
        assert_eq!(to_jalali(at(2023, 3, 21, 23, 59)), "1402/01/01 23:59");
    }
}
