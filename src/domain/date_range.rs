// Date range domain model
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq)]
#[error("invalid {field} '{value}', expected YYYY-MM-DD")]
pub struct DateError {
    pub field: &'static str,
    pub value: String,
}

/// Half-open `[start, end)` observation window. Ordering of the bounds is
/// left to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    #[cfg(test)]
    pub fn parse(start: &str, end: &str) -> Result<Self, DateError> {
        Ok(Self {
            start: parse_date("start_date", start)?,
            end: parse_date("end_date", end)?,
        })
    }

    /// Raw request fields; anything but a `YYYY-MM-DD` string is rejected
    pub fn from_json(start: Option<&Value>, end: Option<&Value>) -> Result<Self, DateError> {
        Ok(Self {
            start: parse_json_date("start_date", start)?,
            end: parse_json_date("end_date", end)?,
        })
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, DateError> {
    // chrono accepts unpadded fields, the wire format does not
    let well_formed = value.len() == 10
        && value
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });

    well_formed
        .then(|| NaiveDate::parse_from_str(value, DATE_FORMAT).ok())
        .flatten()
        .ok_or_else(|| DateError {
            field,
            value: value.to_string(),
        })
}

fn parse_json_date(field: &'static str, value: Option<&Value>) -> Result<NaiveDate, DateError> {
    match value {
        Some(Value::String(s)) => parse_date(field, s),
        Some(other) => Err(DateError {
            field,
            value: other.to_string(),
        }),
        None => Err(DateError {
            field,
            value: String::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let range = DateRange::parse("2020-01-01", "2020-01-08").unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(range.end_str(), "2020-01-08");
        assert!(!range.is_inverted());
    }

    #[test]
    fn test_inverted_range_is_accepted() {
        let range = DateRange::parse("2023-01-01", "2020-01-01").unwrap();
        assert!(range.is_inverted());
    }

    #[test]
    fn test_from_json_requires_date_strings() {
        use serde_json::json;

        let range = DateRange::from_json(Some(&json!("2020-01-01")), Some(&json!("2020-01-08"))).unwrap();
        assert_eq!(range.start_str(), "2020-01-01");

        assert_eq!(
            DateRange::from_json(None, Some(&json!("2020-01-08"))),
            Err(DateError {
                field: "start_date",
                value: String::new()
            })
        );
        assert_eq!(
            DateRange::from_json(Some(&json!("2020-01-01")), Some(&json!(20200108))),
            Err(DateError {
                field: "end_date",
                value: "20200108".to_string()
            })
        );
        assert!(DateRange::from_json(Some(&Value::Null), Some(&json!("2020-01-08"))).is_err());
    }

    #[test]
    fn test_rejects_bad_dates() {
        assert_eq!(
            DateRange::parse("2020-1-01", "2020-01-08"),
            Err(DateError {
                field: "start_date",
                value: "2020-1-01".to_string()
            })
        );
        assert!(DateRange::parse("2020-01-01", "2020-02-30").is_err());
        assert!(DateRange::parse("2020-01-01", "01/08/2020").is_err());
        assert!(DateRange::parse("", "2020-01-08").is_err());
    }
}
