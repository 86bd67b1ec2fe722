use super::error::ValidationError;
use super::types::{MAX_ID_LEN, MAX_TEXT_LEN};

/// Validates a required text field (`name` or `manufacturer`).
pub fn validate_field(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// Validates a device id taken from a request path.
///
/// Ids are opaque, so only shape is checked: an id that is well formed but
/// unknown is an absence, not a validation failure.
pub fn validate_device_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() || id.len() > MAX_ID_LEN {
        return Err(ValidationError::MalformedId(id.to_string()));
    }
    if id.chars().any(char::is_control) {
        return Err(ValidationError::MalformedId(id.escape_debug().to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_field() {
        assert!(validate_field("name", "Air Conditioner").is_ok());
    }

    #[test]
    fn test_blank_field_is_rejected() {
        assert_eq!(
            validate_field("name", "   "),
            Err(ValidationError::Empty { field: "name" })
        );
    }

    #[test]
    fn test_field_length_counts_characters() {
        let japanese = "機".repeat(MAX_TEXT_LEN);
        assert!(validate_field("name", &japanese).is_ok());

        let too_long = "a".repeat(MAX_TEXT_LEN + 1);
        assert_eq!(
            validate_field("manufacturer", &too_long),
            Err(ValidationError::TooLong {
                field: "manufacturer",
                max: MAX_TEXT_LEN
            })
        );
    }

    #[test]
    fn test_unknown_but_well_formed_id_is_valid() {
        assert!(validate_device_id("not-a-real-id").is_ok());
        assert!(validate_device_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
    }

    #[test]
    fn test_malformed_ids_are_rejected() {
        assert!(validate_device_id("").is_err());
        assert!(validate_device_id(" ").is_err());
        assert!(validate_device_id(&"x".repeat(MAX_ID_LEN + 1)).is_err());
        assert!(validate_device_id("abc\n").is_err());
    }
}
