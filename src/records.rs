use std::fmt;

use serde::{Deserialize, Serialize};

/// Text written in place of a field the page did not provide.
pub const UNAVAILABLE: &str = "Tidak tersedia";

/// Recorded as `query_url` when the browser could not report where it ended up.
pub const UNKNOWN_URL: &str = "N/A";

/// A scalar pulled out of a record block. `Unavailable` means the element
/// was not on the page; `Value("")` means it was there but empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Value(String),
    Unavailable,
}

impl Field {
    pub fn as_str(&self) -> &str {
        match self {
            Field::Value(v) => v,
            Field::Unavailable => UNAVAILABLE,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Field::Value(_))
    }
}

impl From<Option<String>> for Field {
    fn from(value: Option<String>) -> Self {
        value.map(Field::Value).unwrap_or(Field::Unavailable)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Price {
    /// Whole rupiah, separators removed.
    Amount(i64),
    /// Carried a currency marker but did not parse; kept trimmed as-is.
    Raw(String),
    Unavailable,
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Amount(n) => write!(f, "{}", n),
            Price::Raw(s) => f.write_str(s),
            Price::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

/// A station as named on the booking form, with its short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationRef {
    pub name: String,
    pub code: String,
}

impl StationRef {
    pub fn new(name: &str, code: &str) -> Self {
        StationRef {
            name: name.to_string(),
            code: code.to_string(),
        }
    }
}

/// Parameters of the search that produced a page. Fixed at fetch time and
/// shared by every record extracted from that page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub url: String,
    pub origin: StationRef,
    pub destination: StationRef,
    /// Calendar date, `YYYY-MM-DD`.
    pub date_calendar: String,
    /// Date exactly as typed into the form, e.g. `02-Juni-2025`.
    pub date_input: String,
}

impl QueryContext {
    /// Key/value view used for the `hidden_*` CSV columns.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("query_url", self.url.as_str()),
            ("query_origin_name", self.origin.name.as_str()),
            ("query_origin_code", self.origin.code.as_str()),
            ("query_destination_name", self.destination.name.as_str()),
            ("query_destination_code", self.destination.code.as_str()),
            ("query_date_calendar", self.date_calendar.as_str()),
            ("query_date_input_format", self.date_input.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRecord {
    pub train_name: Field,
    pub train_number: Field,
    pub train_class: Field,
    pub departure_station: Field,
    pub departure_time: Field,
    pub departure_date: Field,
    pub duration: Field,
    pub arrival_station: Field,
    pub arrival_date: Field,
    pub arrival_time: Field,
    pub price: Price,
    pub availability: Field,
    pub query: QueryContext,
}

impl ScheduleRecord {
    /// Column names of the record itself, in output order.
    pub const BASE_FIELDS: [&'static str; 12] = [
        "train_name",
        "train_number",
        "train_class",
        "departure_station",
        "departure_time",
        "departure_date",
        "duration",
        "arrival_station",
        "arrival_date",
        "arrival_time",
        "price",
        "availability",
    ];

    /// How many base fields fell back to the sentinel.
    pub fn unavailable_count(&self) -> usize {
        let fields = [
            &self.train_name,
            &self.train_number,
            &self.train_class,
            &self.departure_station,
            &self.departure_time,
            &self.departure_date,
            &self.duration,
            &self.arrival_station,
            &self.arrival_date,
            &self.arrival_time,
            &self.availability,
        ];
        let missing = fields.iter().filter(|f| !f.is_available()).count();
        missing + usize::from(self.price == Price::Unavailable)
    }

    /// Values matching `BASE_FIELDS`, sentinels rendered as text.
    pub fn base_values(&self) -> [String; 12] {
        [
            self.train_name.to_string(),
            self.train_number.to_string(),
            self.train_class.to_string(),
            self.departure_station.to_string(),
            self.departure_time.to_string(),
            self.departure_date.to_string(),
            self.duration.to_string(),
            self.arrival_station.to_string(),
            self.arrival_date.to_string(),
            self.arrival_time.to_string(),
            self.price.to_string(),
            self.availability.to_string(),
        ]
    }
}

/// A station name/code pair recovered from an encyclopedia page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StationRecord {
    pub name: String,
    pub code: String,
}

impl fmt::Display for StationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(\"{}\", \"{}\"),", self.name, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_is_distinct_from_empty() {
        let empty = Field::Value(String::new());
        assert!(empty.is_available());
        assert_eq!(empty.as_str(), "");
        assert!(!Field::Unavailable.is_available());
        assert_eq!(Field::Unavailable.to_string(), UNAVAILABLE);
    }

    #[test]
    fn price_display() {
        assert_eq!(Price::Amount(150000).to_string(), "150000");
        assert_eq!(Price::Raw("Rp Habis".into()).to_string(), "Rp Habis");
        assert_eq!(Price::Unavailable.to_string(), UNAVAILABLE);
    }

    #[test]
    fn station_tuple_literal() {
        let s = StationRecord {
            name: "GAMBIR".into(),
            code: "GMR".into(),
        };
        assert_eq!(s.to_string(), r#"("GAMBIR", "GMR"),"#);
    }
}
