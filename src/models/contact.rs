use serde::{Deserialize, Serialize};

/// Shortest phone number accepted (digits only, excluding a leading `+`)
const PHONE_MIN_DIGITS: usize = 10;

/// Longest phone number accepted (ITU E.164 allows up to 15 digits)
const PHONE_MAX_DIGITS: usize = 15;

/// An emergency contact configured by the user.
///
/// Serialized camelCase to match both the persisted store format and the
/// backend wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub email: String,
}

impl Contact {
    /// Loose international phone validation: optional leading `+`,
    /// then 10-15 digits. Applied at creation time only.
    pub fn is_valid_phone(number: &str) -> bool {
        let digits = number.strip_prefix('+').unwrap_or(number);
        (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit())
    }
}
