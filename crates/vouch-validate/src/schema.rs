//! # Schema Validator
//!
//! A payload shape opts into validation by implementing [`Schema`] with a
//! static rule table. Each [`FieldRule`] names the field as it appears on the
//! wire, a plain function that reads the value out of the parsed payload, and
//! the constraint kinds attached to it.
//!
//! ```
//! use serde::Deserialize;
//! use vouch_validate::{Constraint, FieldRule, Schema};
//!
//! #[derive(Debug, Deserialize)]
//! struct Login {
//!     #[serde(default)]
//!     username: String,
//!     #[serde(default)]
//!     password: String,
//! }
//!
//! impl Schema for Login {
//!     const RULES: &'static [FieldRule<Self>] = &[
//!         FieldRule {
//!             field: "username",
//!             accessor: |r| r.username.as_str(),
//!             constraints: &[Constraint::Required],
//!         },
//!         FieldRule {
//!             field: "password",
//!             accessor: |r| r.password.as_str(),
//!             constraints: &[Constraint::Required],
//!         },
//!     ];
//! }
//!
//! let err = vouch_validate::validate::<Login>(br#"{"username":"alice"}"#).unwrap_err();
//! assert_eq!(err.to_string(), "password required");
//! ```

use serde::de::DeserializeOwned;

use crate::constraint::Constraint;
use crate::error::{FieldViolations, ValidationError};

/// One row of a constraint table.
pub struct FieldRule<T> {
    /// Field name reported in violations.
    pub field: &'static str,
    /// Reads the field value out of a parsed payload.
    pub accessor: fn(&T) -> &str,
    /// Constraint kinds attached to the field. Order within a rule does not
    /// affect evaluation.
    pub constraints: &'static [Constraint],
}

impl<T> FieldRule<T> {
    fn has(&self, kind: Constraint) -> bool {
        self.constraints.contains(&kind)
    }
}

impl<T> std::fmt::Debug for FieldRule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule")
            .field("field", &self.field)
            .field("constraints", &self.constraints)
            .finish()
    }
}

/// A payload shape with a static constraint table.
///
/// Fields that a client may omit should carry `#[serde(default)]` so an
/// absent field surfaces as a `Required` violation rather than a parse
/// failure.
pub trait Schema: DeserializeOwned + Send + Sync + 'static {
    /// The constraint table, in field declaration order.
    const RULES: &'static [FieldRule<Self>];
}

/// Parse `raw` as `T` and run its constraint table.
pub fn validate<T: Schema>(raw: &[u8]) -> Result<T, ValidationError> {
    let payload: T =
        serde_json::from_slice(raw).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    check(&payload)?;
    Ok(payload)
}

/// Run the constraint table of an already-parsed payload.
///
/// `Required` runs over every field first. Each shape kind then runs over
/// every field in turn, and the first kind with any violation is returned.
pub fn check<T: Schema>(payload: &T) -> Result<(), FieldViolations> {
    let kinds = std::iter::once(Constraint::Required).chain(Constraint::SHAPE_ORDER);

    for kind in kinds {
        let failed: Vec<&'static str> = T::RULES
            .iter()
            .filter(|rule| rule.has(kind) && !kind.check((rule.accessor)(payload)))
            .map(|rule| rule.field)
            .collect();

        if !failed.is_empty() {
            return Err(FieldViolations::new(kind, failed));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Profile {
        #[serde(default)]
        name: String,
        #[serde(default)]
        email: String,
        #[serde(default)]
        backup_email: String,
        #[serde(default)]
        user_id: String,
        #[serde(default)]
        password: String,
    }

    impl Schema for Profile {
        const RULES: &'static [FieldRule<Self>] = &[
            FieldRule {
                field: "name",
                accessor: |p| p.name.as_str(),
                constraints: &[Constraint::Required],
            },
            FieldRule {
                field: "email",
                accessor: |p| p.email.as_str(),
                constraints: &[Constraint::Required, Constraint::Email],
            },
            FieldRule {
                field: "backup_email",
                accessor: |p| p.backup_email.as_str(),
                constraints: &[Constraint::Email],
            },
            FieldRule {
                field: "user_id",
                accessor: |p| p.user_id.as_str(),
                constraints: &[Constraint::Required, Constraint::Identifier],
            },
            FieldRule {
                field: "password",
                accessor: |p| p.password.as_str(),
                constraints: &[Constraint::PasswordStrength],
            },
        ];
    }

    const ID: &str = "f47ac10b-58cc-4372-a567-0e02b2c3d479";

    fn body(name: &str, email: &str, backup: &str, id: &str, password: &str) -> Vec<u8> {
        serde_json::json!({
            "name": name,
            "email": email,
            "backup_email": backup,
            "user_id": id,
            "password": password,
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn valid_payload_is_returned() {
        let p = validate::<Profile>(&body("alice", "a@example.com", "", ID, "")).unwrap();
        assert_eq!(p.name, "alice");
        assert_eq!(p.user_id, ID);
    }

    #[test]
    fn malformed_body_skips_constraints() {
        let err = validate::<Profile>(b"{not json").unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let err = validate::<Profile>(br#"{"name": 42}"#).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn absent_fields_are_reported_as_missing() {
        let err = validate::<Profile>(b"{}").unwrap_err();
        let v = err.violations().unwrap();
        assert_eq!(v.missing_fields, vec!["name", "email", "user_id"]);
    }

    #[test]
    fn missing_fields_hide_shape_violations() {
        let err = validate::<Profile>(&body("", "not-an-email", "", "", "")).unwrap_err();
        let v = err.violations().unwrap();
        assert_eq!(v.missing_fields, vec!["name", "user_id"]);
        assert!(v.invalid_email_fields.is_empty());
        assert_eq!(err.to_string(), "name, user_id required");
    }

    #[test]
    fn bad_identifier_is_a_violation_not_a_parse_error() {
        let err = validate::<Profile>(&body("alice", "a@example.com", "", "not-a-uuid", ""))
            .unwrap_err();
        let v = err.violations().unwrap();
        assert_eq!(v.invalid_identifier_fields, vec!["user_id"]);
    }

    #[test]
    fn two_bad_emails_are_reported_together() {
        let err = validate::<Profile>(&body("alice", "user@", "invalidemail.com", ID, ""))
            .unwrap_err();
        let v = err.violations().unwrap();
        assert_eq!(v.invalid_email_fields, vec!["email", "backup_email"]);
    }

    #[test]
    fn email_violations_hide_later_kinds() {
        let err = validate::<Profile>(&body("alice", "user@", "", "not-a-uuid", "short"))
            .unwrap_err();
        let v = err.violations().unwrap();
        assert_eq!(v.kind(), Some(Constraint::Email));
        assert!(v.invalid_identifier_fields.is_empty());
        assert!(v.invalid_password_fields.is_empty());
    }

    #[test]
    fn identifier_violations_hide_password_violations() {
        let err = validate::<Profile>(&body("alice", "a@example.com", "", "not-a-uuid", "short"))
            .unwrap_err();
        assert_eq!(err.violations().unwrap().kind(), Some(Constraint::Identifier));
    }

    #[test]
    fn short_password_reported_last() {
        let err = validate::<Profile>(&body("alice", "a@example.com", "", ID, "pass123"))
            .unwrap_err();
        let v = err.violations().unwrap();
        assert_eq!(v.invalid_password_fields, vec!["password"]);
    }

    #[test]
    fn optional_empty_fields_are_skipped() {
        assert!(validate::<Profile>(&body("alice", "a@example.com", "", ID, "")).is_ok());
    }

    #[test]
    fn whitespace_satisfies_required() {
        assert!(validate::<Profile>(&body("   ", "a@example.com", "", ID, "12345678")).is_ok());
    }

    proptest! {
        #[test]
        fn reported_violations_are_always_a_single_kind(
            name in prop_oneof![Just(""), Just("alice")],
            email in prop_oneof![Just(""), Just("user@"), Just("a@example.com")],
            backup in prop_oneof![Just(""), Just("invalidemail.com")],
            id in prop_oneof![Just(""), Just("not-a-uuid"), Just(ID)],
            password in prop_oneof![Just(""), Just("short"), Just("12345678")],
        ) {
            match validate::<Profile>(&body(name, email, backup, id, password)) {
                Ok(_) => {}
                Err(err) => {
                    let v = err.violations().unwrap();
                    let non_empty = [
                        &v.missing_fields,
                        &v.invalid_email_fields,
                        &v.invalid_identifier_fields,
                        &v.invalid_password_fields,
                    ]
                    .iter()
                    .filter(|l| !l.is_empty())
                    .count();
                    prop_assert_eq!(non_empty, 1);

                    let any_missing = name.is_empty() || email.is_empty() || id.is_empty();
                    prop_assert_eq!(v.kind() == Some(Constraint::Required), any_missing);
                }
            }
        }
    }
}
