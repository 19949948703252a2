use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

const INDONESIAN: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// Month names used when typing a date into the booking form. Passed in
/// explicitly instead of relying on the process locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct MonthNames(Vec<String>);

impl MonthNames {
    pub fn indonesian() -> Self {
        MonthNames(INDONESIAN.iter().map(|m| m.to_string()).collect())
    }

    /// `month` is 1-based, as returned by `Datelike::month`.
    pub fn name(&self, month: u32) -> &str {
        let idx = month.clamp(1, 12) as usize - 1;
        &self.0[idx]
    }

    /// `02-Juni-2025`
    pub fn format_form_date(&self, date: NaiveDate) -> String {
        format!("{:02}-{}-{}", date.day(), self.name(date.month()), date.year())
    }
}

impl Default for MonthNames {
    fn default() -> Self {
        MonthNames::indonesian()
    }
}

impl TryFrom<Vec<String>> for MonthNames {
    type Error = String;

    fn try_from(names: Vec<String>) -> std::result::Result<Self, Self::Error> {
        if names.len() != 12 {
            return Err(format!("expected 12 month names, got {}", names.len()));
        }
        Ok(MonthNames(names))
    }
}

impl From<MonthNames> for Vec<String> {
    fn from(names: MonthNames) -> Self {
        names.0
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ScrapeError::InvalidDate(s.to_string()))
}

pub fn calendar_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `days` consecutive dates starting at `start`.
pub fn date_range(start: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .filter_map(|i| start.checked_add_days(Days::new(i.into())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn form_date_indonesian() {
        let months = MonthNames::indonesian();
        assert_eq!(months.format_form_date(d(2025, 6, 2)), "02-Juni-2025");
        assert_eq!(months.format_form_date(d(2025, 8, 17)), "17-Agustus-2025");
    }

    #[test]
    fn form_date_custom_table() {
        let english: Vec<String> = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ]
        .iter()
        .map(|m| m.to_string())
        .collect();
        let months = MonthNames::try_from(english).unwrap();
        assert_eq!(months.format_form_date(d(2025, 5, 1)), "01-May-2025");
    }

    #[test]
    fn month_table_must_have_twelve_entries() {
        assert!(MonthNames::try_from(vec!["Jan".to_string()]).is_err());
        let parsed: MonthNames = serde_json::from_str(
            r#"["1","2","3","4","5","6","7","8","9","10","11","12"]"#,
        )
        .unwrap();
        assert_eq!(parsed.name(12), "12");
        assert!(serde_json::from_str::<MonthNames>(r#"["1"]"#).is_err());
    }

    #[test]
    fn range_crosses_month_end() {
        let range = date_range(d(2025, 6, 29), 3);
        assert_eq!(range, vec![d(2025, 6, 29), d(2025, 6, 30), d(2025, 7, 1)]);
        assert!(date_range(d(2025, 6, 29), 0).is_empty());
    }

    #[test]
    fn parse_calendar_date() {
        assert_eq!(parse_date("2025-06-02").unwrap(), d(2025, 6, 2));
        assert_eq!(calendar_string(d(2025, 6, 2)), "2025-06-02");
        assert!(matches!(parse_date("02/06/2025"), Err(ScrapeError::InvalidDate(_))));
    }
}
