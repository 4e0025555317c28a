// src/fetch/urls.rs
//
// Locators carry the period they were written for. Before every run the edition
// (`.<YYYYMM>.Q/`) and end-time (`endTime=...`) tokens are moved to the current period.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static EDITION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(\d+)\.Q/").unwrap());
static END_QUARTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"endTime=\d+-Q\d+").unwrap());
static END_MONTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"endTime=\d+-\d+").unwrap());

/// `YYYYMM` edition code for `today`.
pub fn current_edition(today: NaiveDate) -> String {
    format!("{:04}{:02}", today.year(), today.month())
}

/// `YYYY-Qn` for the quarter containing `today`.
pub fn current_quarter(today: NaiveDate) -> String {
    let quarter = (today.month() - 1) / 3 + 1;
    format!("{}-Q{}", today.year(), quarter)
}

/// Whether the locator embeds an edition token (quarterly economic-outlook style).
pub fn has_edition(locator: &str) -> bool {
    EDITION_RE.is_match(locator)
}

pub fn update_edition(locator: &str, today: NaiveDate) -> String {
    let edition = current_edition(today);
    match EDITION_RE.captures(locator) {
        Some(caps) if &caps[1] == edition => locator.to_string(),
        Some(_) => EDITION_RE
            .replace_all(locator, format!(".{}.Q/", edition).as_str())
            .into_owned(),
        None => locator.to_string(),
    }
}

pub fn update_end_quarter(locator: &str, today: NaiveDate) -> String {
    let replacement = format!("endTime={}", current_quarter(today));
    END_QUARTER_RE
        .replace_all(locator, replacement.as_str())
        .into_owned()
}

pub fn update_end_month(locator: &str, today: NaiveDate) -> String {
    let replacement = format!("endTime={:04}-{:02}", today.year(), today.month());
    END_MONTH_RE
        .replace_all(locator, replacement.as_str())
        .into_owned()
}

/// Refresh every locator for `today`, preserving order.
///
/// Locators with an edition token are quarterly: both the edition and the end quarter move.
/// Everything else is treated as monthly.
pub fn update_locators<S: AsRef<str>>(locators: &[S], today: NaiveDate) -> Vec<String> {
    locators
        .iter()
        .map(|l| {
            let l = l.as_ref();
            let updated = if has_edition(l) {
                update_end_quarter(&update_edition(l, today), today)
            } else {
                update_end_month(l, today)
            };
            if updated != l {
                debug!(from = %l, to = %updated, "locator updated");
            }
            updated
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn quarter_boundaries() {
        assert_eq!(current_quarter(day(2023, 1, 1)), "2023-Q1");
        assert_eq!(current_quarter(day(2023, 3, 31)), "2023-Q1");
        assert_eq!(current_quarter(day(2023, 4, 1)), "2023-Q2");
        assert_eq!(current_quarter(day(2023, 9, 30)), "2023-Q3");
        assert_eq!(current_quarter(day(2023, 12, 31)), "2023-Q4");
    }

    #[test]
    fn edition_is_zero_padded() {
        assert_eq!(current_edition(day(2024, 3, 15)), "202403");
    }

    #[test]
    fn edition_and_end_quarter_are_refreshed() {
        let old = "https://stats.oecd.org/SDMX-JSON/data/EO/AUS+USA.GDPV_ANNPCT.114.Q/all?startTime=2008-Q4&endTime=2022-Q1";
        let out = update_locators(&[old], day(2024, 5, 2));
        assert_eq!(
            out[0],
            "https://stats.oecd.org/SDMX-JSON/data/EO/AUS+USA.GDPV_ANNPCT.202405.Q/all?startTime=2008-Q4&endTime=2024-Q2"
        );
    }

    #[test]
    fn current_edition_left_alone() {
        let loc = "https://x/data/EO/AUS.GDP.202405.Q/all";
        assert_eq!(update_edition(loc, day(2024, 5, 20)), loc);
    }

    #[test]
    fn monthly_end_time_refreshed() {
        let old = "https://stats.oecd.org/SDMX-JSON/data/MEI_CLI/LOLITOAA.AUS+USA.M/all?startTime=2008-12&endTime=2022-07";
        let out = update_locators(&[old], day(2024, 11, 9));
        assert!(out[0].ends_with("startTime=2008-12&endTime=2024-11"));
    }

    #[test]
    fn monthly_rewrite_ignores_quarter_tokens() {
        // `endTime=2022-Q1` has no digits after the dash, so the month pattern skips it
        let loc = "https://x/data/QNA/AUS.B1_GE.Q/all?endTime=2022-Q1";
        assert_eq!(update_end_month(loc, day(2024, 1, 1)), loc);
    }

    #[test]
    fn locator_without_tokens_unchanged() {
        let loc = "https://x/data/QNA/AUS/all";
        assert_eq!(update_locators(&[loc], day(2024, 1, 1)), vec![loc.to_string()]);
    }
}
