//! Field level checks for document values.

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Wire format of every date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const INN10_WEIGHTS: [u32; 9] = [2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN12_WEIGHTS_11: [u32; 10] = [7, 2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN12_WEIGHTS_12: [u32; 11] = [3, 7, 2, 4, 10, 3, 5, 9, 4, 6, 8];

/// Check a taxpayer identification number (INN).
///
/// Organisations have 10 digits, individuals 12; the trailing digits are
/// weighted checksums mod 11 mod 10.
pub fn validate_inn(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidInn {
        field,
        value: value.to_string(),
    };

    let digits: Vec<u32> = value
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<_>>()
        .ok_or_else(invalid)?;

    let valid = match digits.len() {
        10 => checksum(&digits[..9], &INN10_WEIGHTS) == digits[9],
        12 => {
            checksum(&digits[..10], &INN12_WEIGHTS_11) == digits[10]
                && checksum(&digits[..11], &INN12_WEIGHTS_12) == digits[11]
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(invalid())
    }
}

fn checksum(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    sum % 11 % 10
}

/// Check a TN VED (commodity nomenclature) code: 4 to 10 ASCII digits.
pub fn validate_tnved_code(value: &str) -> Result<(), ValidationError> {
    if (4..=10).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidTnvedCode(value.to_string()))
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_legal_entity_inn() {
        assert!(validate_inn("owner_inn", "7707083893").is_ok());
    }

    #[test]
    fn test_valid_individual_inn() {
        assert!(validate_inn("owner_inn", "500100732259").is_ok());
    }

    #[test]
    fn test_inn_bad_checksum() {
        let err = validate_inn("owner_inn", "7707083894").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidInn {
                field: "owner_inn",
                value: "7707083894".to_string()
            }
        );
        assert!(validate_inn("owner_inn", "500100732258").is_err());
    }

    #[test]
    fn test_inn_bad_shape() {
        assert!(validate_inn("producer_inn", "").is_err());
        assert!(validate_inn("producer_inn", "12345").is_err());
        assert!(validate_inn("producer_inn", "77070838a3").is_err());
        assert!(validate_inn("producer_inn", "77070838931").is_err());
    }

    #[test]
    fn test_tnved_code() {
        assert!(validate_tnved_code("6401").is_ok());
        assert!(validate_tnved_code("6401100000").is_ok());
        assert!(validate_tnved_code("640").is_err());
        assert!(validate_tnved_code("64011000001").is_err());
        assert!(validate_tnved_code("64O1").is_err());
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("production_date", "2024-02-29").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        assert!(parse_date("production_date", "2023-02-29").is_err());
        assert!(parse_date("production_date", "29.02.2024").is_err());
    }
}
