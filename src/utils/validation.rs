use crate::domain::codes;
use crate::utils::error::{DeliveryError, Result};
use regex::Regex;
use std::sync::OnceLock;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// DHL post numbers are 6 to 10 alphanumeric characters.
const POSTNUMBER_PATTERN: &str = r"^[A-Za-z0-9]{6,10}$";
const COUNTRY_PATTERN: &str = r"^[A-Z]{2}$";

fn postnumber_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(POSTNUMBER_PATTERN).expect("post number pattern compiles"))
}

fn country_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(COUNTRY_PATTERN).expect("country pattern compiles"))
}

/// Post number check for a Packstation selection. Required for lockers,
/// optional (but still format-checked) for every other location type.
pub fn validate_postnumber(location_type: &str, postnumber: &str) -> Result<()> {
    let postnumber = postnumber.trim();

    if postnumber.is_empty() {
        if location_type == codes::LOCATION_TYPE_LOCKER {
            return Err(DeliveryError::validation(
                codes::FIELD_POSTNUMBER,
                "A DHL post number is required for delivery to a Packstation.",
            ));
        }
        return Ok(());
    }

    if !postnumber_regex().is_match(postnumber) {
        return Err(DeliveryError::validation(
            codes::FIELD_POSTNUMBER,
            "The DHL post number must consist of 6 to 10 letters or digits.",
        ));
    }

    Ok(())
}

pub fn validate_country_code(field_name: &str, value: &str) -> Result<()> {
    if !country_regex().is_match(value) {
        return Err(DeliveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected a two-letter ISO country code such as DE".to_string(),
        });
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DeliveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DeliveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DeliveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_fee(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DeliveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Fee must be a non-negative amount".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_postnumber() {
        assert!(validate_postnumber("locker", "12345678").is_ok());
        assert!(validate_postnumber("locker", "AB12cd").is_ok());
        assert!(validate_postnumber("locker", "").is_err());
        assert!(validate_postnumber("locker", "12345").is_err());
        assert!(validate_postnumber("locker", "12345678901").is_err());
        assert!(validate_postnumber("locker", "1234-5678").is_err());
        assert!(validate_postnumber("postoffice", "").is_ok());
        assert!(validate_postnumber("postoffice", "12-34").is_err());
    }

    #[test]
    fn test_validate_country_code() {
        assert!(validate_country_code("checkout.domestic_country", "DE").is_ok());
        assert!(validate_country_code("checkout.domestic_country", "de").is_err());
        assert!(validate_country_code("checkout.domestic_country", "DEU").is_err());
    }

    #[test]
    fn test_validate_fee() {
        assert!(validate_fee("fees.preferredDay", 1.2).is_ok());
        assert!(validate_fee("fees.preferredDay", 0.0).is_ok());
        assert!(validate_fee("fees.preferredDay", -0.5).is_err());
        assert!(validate_fee("fees.preferredDay", f64::NAN).is_err());
    }
}
