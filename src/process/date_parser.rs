use chrono::NaiveDate;

use crate::error::{MacroError, Result};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Month lengths used for period ends. February is always 28, leap years included;
/// published tables depend on this, so `Feb-2020` ends on the 28th.
const MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Quarterly,
    Monthly,
}

impl Frequency {
    /// Quarterly if any label starts with `Q`, monthly otherwise.
    pub fn detect<'a, I: IntoIterator<Item = &'a str>>(labels: I) -> Self {
        if labels.into_iter().any(|l| l.starts_with('Q')) {
            Frequency::Quarterly
        } else {
            Frequency::Monthly
        }
    }
}

/// Last calendar day of the period named by `label`.
pub fn period_end(label: &str, frequency: Frequency) -> Result<NaiveDate> {
    match frequency {
        Frequency::Quarterly => quarter_end(label),
        Frequency::Monthly => month_end(label),
    }
}

/// `"Q4-2022"` → 2022-12-31
pub fn quarter_end(label: &str) -> Result<NaiveDate> {
    let bad = || MacroError::InvalidPeriod(label.to_string());
    let (quarter, year) = label.trim().split_once('-').ok_or_else(bad)?;
    let q: u32 = quarter
        .strip_prefix('Q')
        .and_then(|q| q.parse().ok())
        .filter(|q| (1..=4).contains(q))
        .ok_or_else(bad)?;
    let year: i32 = year.parse().map_err(|_| bad())?;
    let month = q * 3;
    NaiveDate::from_ymd_opt(year, month, MONTH_DAYS[month as usize - 1]).ok_or_else(bad)
}

/// `"Dec-2022"` → 2022-12-31, `"Feb-2020"` → 2020-02-28
pub fn month_end(label: &str) -> Result<NaiveDate> {
    let bad = || MacroError::InvalidPeriod(label.to_string());
    let (name, year) = label.trim().split_once('-').ok_or_else(bad)?;
    let idx = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .ok_or_else(bad)?;
    let year: i32 = year.parse().map_err(|_| bad())?;
    NaiveDate::from_ymd_opt(year, idx as u32 + 1, MONTH_DAYS[idx]).ok_or_else(bad)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn quarters_end_on_last_day() {
        assert_eq!(quarter_end("Q1-2021").unwrap(), ymd(2021, 3, 31));
        assert_eq!(quarter_end("Q2-2021").unwrap(), ymd(2021, 6, 30));
        assert_eq!(quarter_end("Q3-2021").unwrap(), ymd(2021, 9, 30));
        assert_eq!(quarter_end("Q4-2022").unwrap(), ymd(2022, 12, 31));
    }

    #[test]
    fn months_end_on_fixed_table_day() {
        assert_eq!(month_end("Dec-2022").unwrap(), ymd(2022, 12, 31));
        assert_eq!(month_end("Apr-2019").unwrap(), ymd(2019, 4, 30));
        assert_eq!(month_end("Feb-2021").unwrap(), ymd(2021, 2, 28));
        // leap year still ends on the 28th
        assert_eq!(month_end("Feb-2020").unwrap(), ymd(2020, 2, 28));
    }

    #[test]
    fn detection_is_per_table() {
        assert_eq!(
            Frequency::detect(["Q1-2020", "Q2-2020"]),
            Frequency::Quarterly
        );
        assert_eq!(
            Frequency::detect(["Jan-2020", "Feb-2020"]),
            Frequency::Monthly
        );
        assert_eq!(Frequency::detect(["Jan-2020", "Q1-2020"]), Frequency::Quarterly);
        assert_eq!(Frequency::detect(std::iter::empty()), Frequency::Monthly);
    }

    #[test]
    fn bad_labels_rejected() {
        for label in ["Q5-2020", "Q1/2020", "2020-Q1", "Foo-2020", "Jan-20x", ""] {
            assert!(
                matches!(
                    period_end(label, Frequency::detect([label])),
                    Err(MacroError::InvalidPeriod(_))
                ),
                "{label} should be rejected"
            );
        }
    }
}
