//! # Constraint Evaluator
//!
//! Pure predicates that check one field value against one constraint kind.
//!
//! Shape constraints ([`Constraint::Email`], [`Constraint::Identifier`],
//! [`Constraint::PasswordStrength`]) treat the empty string as "not
//! supplied" and pass it; presence is the job of [`Constraint::Required`]
//! alone. Values are never trimmed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A named validation rule attachable to a payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// The field must not be the empty string.
    Required,
    /// The field, when non-empty, must be an email address.
    Email,
    /// The field, when non-empty, must be a UUID-shaped identifier.
    Identifier,
    /// The field, when non-empty, must be at least [`MIN_PASSWORD_LEN`] characters.
    PasswordStrength,
}

impl Constraint {
    /// Shape constraints in evaluation order. `Required` always runs first
    /// and is not part of this list.
    pub const SHAPE_ORDER: [Constraint; 3] = [
        Constraint::Email,
        Constraint::Identifier,
        Constraint::PasswordStrength,
    ];

    /// Return the string representation of this constraint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Email => "email",
            Self::Identifier => "identifier",
            Self::PasswordStrength => "password_strength",
        }
    }

    /// Whether `value` satisfies this constraint.
    pub fn check(&self, value: &str) -> bool {
        match self {
            Self::Required => is_present(value),
            Self::Email => value.is_empty() || is_email(value),
            Self::Identifier => value.is_empty() || is_identifier(value),
            Self::PasswordStrength => value.is_empty() || is_strong_password(value),
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence check. Only the empty string is absent; `"   "` is present.
pub fn is_present(value: &str) -> bool {
    !value.is_empty()
}

/// Permissive email check: `local-part@domain`, where the domain contains
/// at least one dot and no empty labels.
///
/// The `Display Name <local@domain>` form is accepted; the address between
/// the angle brackets is what gets checked.
pub fn is_email(value: &str) -> bool {
    let Some(addr) = address_part(value) else {
        return false;
    };

    let mut parts = addr.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if local.is_empty() || local.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-')
    })
}

/// Extract the bare address from `Name <addr>` or return the input as-is.
fn address_part(value: &str) -> Option<&str> {
    match (value.rfind('<'), value.strip_suffix('>')) {
        (Some(open), Some(inner)) => inner.get(open + 1..),
        (None, None) => Some(value),
        _ => None,
    }
}

/// UUID-shaped identifier check: 32 hex digits, either bare or hyphenated
/// in the canonical 8-4-4-4-12 layout.
///
/// Braced and `urn:uuid:` forms are rejected even though `Uuid` can parse
/// them.
pub fn is_identifier(value: &str) -> bool {
    matches!(value.len(), 32 | 36) && Uuid::try_parse(value).is_ok()
}

/// Length-only password strength check.
pub fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= MIN_PASSWORD_LEN
}
