#![deny(missing_docs)]

//! # vouch-validate: Declarative Request Validation
//!
//! The gate that runs before any handler sees a request body. A payload
//! shape declares a static constraint table ([`Schema::RULES`]); the
//! validator parses the raw body, then evaluates the table in a fixed
//! priority order and returns either the typed payload or a single
//! [`FieldViolations`] report.
//!
//! ## Evaluation Order
//!
//! ```text
//! Received → Parsed ─┬─ Required   (all fields) ─ any missing?  → Invalid
//!                    ├─ Email      (all fields) ─ any invalid?  → Invalid
//!                    ├─ Identifier (all fields) ─ any invalid?  → Invalid
//!                    ├─ Password   (all fields) ─ any invalid?  → Invalid
//!                    └─ Valid
//! ```
//!
//! A malformed body short-circuits to [`ValidationError::Malformed`] before
//! any constraint runs. Violations of a later kind are never merged into the
//! report of an earlier kind.
//!
//! ## Crate Policy
//!
//! - Pure and synchronous. No I/O, no async, no global state.
//! - No runtime reflection: constraint tables are `const` data.

pub mod constraint;
pub mod error;
pub mod schema;

pub use constraint::{Constraint, MIN_PASSWORD_LEN};
pub use error::{FieldViolations, ValidationError};
pub use schema::{check, validate, FieldRule, Schema};
