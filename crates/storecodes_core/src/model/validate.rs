//! Input validators shared across ledger operations.
//!
//! Every operation that takes an identifier calls [`parse_identifier`] before
//! touching storage, and every required text field goes through
//! [`require_non_empty`].

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::{Uuid, Variant};

/// Length of the hyphenated `8-4-4-4-12` UUID text form.
const CANONICAL_UUID_LEN: usize = 36;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Identifier text is not a canonical hyphenated UUID.
    InvalidIdentifier(String),
    /// Required field is absent or empty.
    MissingField(&'static str),
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(raw) => write!(f, "invalid identifier `{raw}`"),
            Self::MissingField(field) => write!(f, "field `{field}` is required"),
        }
    }
}

impl Error for InputError {}

/// Parses a canonical hyphenated RFC 4122 UUID of version 1 through 5, or
/// the nil UUID.
///
/// `uuid` also accepts simple, braced and URN forms; those are rejected here
/// so that one record has exactly one textual key.
pub fn parse_identifier(raw: &str) -> Result<Uuid, InputError> {
    let invalid = || InputError::InvalidIdentifier(raw.to_string());
    if raw.len() != CANONICAL_UUID_LEN {
        return Err(invalid());
    }
    let id = Uuid::parse_str(raw).map_err(|_| invalid())?;
    if id.is_nil() || is_rfc4122_v1_to_v5(&id) {
        Ok(id)
    } else {
        Err(invalid())
    }
}

fn is_rfc4122_v1_to_v5(id: &Uuid) -> bool {
    matches!(id.get_version_num(), 1..=5) && id.get_variant() == Variant::RFC4122
}

/// Returns the value when it is present and not empty.
pub fn require_non_empty<'a>(
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, InputError> {
    match value {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(InputError::MissingField(field)),
    }
}
