//! # Validation Errors
//!
//! A request either fails to parse ([`ValidationError::Malformed`]) or parses
//! and violates exactly one constraint kind ([`ValidationError::Invalid`]).

use serde::Serialize;
use thiserror::Error;

use crate::constraint::Constraint;

/// Fields that violated a single constraint kind.
///
/// The four lists mirror the gate's external failure shape. Evaluation
/// short-circuits on the first kind with any violation, so exactly one list
/// is non-empty in any report produced by [`crate::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldViolations {
    /// Required fields that were empty or absent.
    pub missing_fields: Vec<String>,
    /// Fields that are not email addresses.
    pub invalid_email_fields: Vec<String>,
    /// Fields that are not UUID-shaped identifiers.
    pub invalid_identifier_fields: Vec<String>,
    /// Fields that are shorter than the minimum password length.
    pub invalid_password_fields: Vec<String>,
}

impl FieldViolations {
    /// Build a report for one constraint kind.
    pub fn new<I, S>(kind: Constraint, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let mut report = Self::default();
        match kind {
            Constraint::Required => report.missing_fields = fields,
            Constraint::Email => report.invalid_email_fields = fields,
            Constraint::Identifier => report.invalid_identifier_fields = fields,
            Constraint::PasswordStrength => report.invalid_password_fields = fields,
        }
        report
    }

    /// The constraint kind this report describes, or `None` if empty.
    pub fn kind(&self) -> Option<Constraint> {
        if !self.missing_fields.is_empty() {
            Some(Constraint::Required)
        } else if !self.invalid_email_fields.is_empty() {
            Some(Constraint::Email)
        } else if !self.invalid_identifier_fields.is_empty() {
            Some(Constraint::Identifier)
        } else if !self.invalid_password_fields.is_empty() {
            Some(Constraint::PasswordStrength)
        } else {
            None
        }
    }

    /// The offending field names, in schema declaration order.
    pub fn fields(&self) -> &[String] {
        match self.kind() {
            Some(Constraint::Required) => &self.missing_fields,
            Some(Constraint::Email) => &self.invalid_email_fields,
            Some(Constraint::Identifier) => &self.invalid_identifier_fields,
            Some(Constraint::PasswordStrength) => &self.invalid_password_fields,
            None => &[],
        }
    }

    /// Whether no field violated anything.
    pub fn is_empty(&self) -> bool {
        self.kind().is_none()
    }
}

impl std::fmt::Display for FieldViolations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = self.fields().join(", ");
        match self.kind() {
            Some(Constraint::Required) => write!(f, "{fields} required"),
            Some(Constraint::Email) => write!(f, "{fields} must be valid email address(es)"),
            Some(Constraint::Identifier) => write!(f, "{fields} must be valid UUID(s)"),
            Some(Constraint::PasswordStrength) => write!(
                f,
                "{fields} must be at least {} characters",
                crate::constraint::MIN_PASSWORD_LEN
            ),
            None => f.write_str("no violations"),
        }
    }
}

impl std::error::Error for FieldViolations {}

/// Failure of the validation gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The body is not a well-formed instance of the payload shape.
    /// Constraints were not evaluated.
    #[error("invalid request body: {0}")]
    Malformed(String),

    /// The body parsed but violated one constraint kind.
    #[error("{0}")]
    Invalid(#[from] FieldViolations),
}

impl ValidationError {
    /// The violation report, if the body parsed.
    pub fn violations(&self) -> Option<&FieldViolations> {
        match self {
            Self::Malformed(_) => None,
            Self::Invalid(v) => Some(v),
        }
    }
}
