//! Error types for onboarding.
//!
//! Field and form errors stay inside the wizard state and block transitions.
//! Provider and mutation errors travel back through actions and end up in the
//! notification channel. Nothing here is meant to abort the client.

use crate::types::{SportId, VariantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Failure reported by a backend collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The requested record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend refused the request
    #[error("rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached or did not answer in time
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The session token is missing or expired
    #[error("unauthorized")]
    Unauthorized,
}

/// One invalid field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidationError {
    /// Form field name
    pub field: String,
    /// Machine-readable validation code
    pub code: String,
    /// Human-readable message, when the rule provides one
    pub message: Option<String>,
}

impl FieldValidationError {
    /// Error with a code and no message
    #[must_use]
    pub fn new(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: None,
        }
    }

    /// Attach a human-readable message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for FieldValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = self.message.as_deref().unwrap_or(&self.code);
        write!(f, "{}: {detail}", self.field)
    }
}

impl std::error::Error for FieldValidationError {}

/// Invalid fields keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, FieldValidationError>);

impl FieldErrors {
    /// No errors
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record an error, keeping the first one reported for a field
    pub fn insert(&mut self, error: FieldValidationError) {
        self.0.entry(error.field.clone()).or_insert(error);
    }

    /// Drop the error of one field
    pub fn remove(&mut self, field: &str) -> Option<FieldValidationError> {
        self.0.remove(field)
    }

    /// Whether every field is valid
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of invalid fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Error for one field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValidationError> {
        self.0.get(field)
    }

    /// Whether `field` is invalid
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Invalid field names in order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Keep only the errors of `fields`
    #[must_use]
    pub fn restricted_to(&self, fields: &[&str]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(field, _)| fields.contains(&field.as_str()))
                .map(|(field, error)| (field.clone(), error.clone()))
                .collect(),
        )
    }
}

impl From<&validator::ValidationErrors> for FieldErrors {
    fn from(errors: &validator::ValidationErrors) -> Self {
        let mut result = Self::new();
        for (field, field_errors) in errors.field_errors() {
            if let Some(first) = field_errors.first() {
                result.insert(FieldValidationError {
                    field: field.to_string(),
                    code: first.code.to_string(),
                    message: first.message.as_ref().map(ToString::to_string),
                });
            }
        }
        result
    }
}

/// Whole-form failure that blocks submission but not navigation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormLevelError {
    /// A required product has no selected variant
    #[error("{product_name} is required")]
    MissingRequiredProduct {
        /// Name of the first missing product
        product_name: String,
    },

    /// Some fields are invalid
    #[error("the form has invalid fields: {}", .fields.join(", "))]
    InvalidForm {
        /// Invalid field names
        fields: Vec<String>,
    },

    /// There is no active edition to register for
    #[error("no edition is open for registration")]
    NoActiveEdition,
}

/// Kind of backend mutation, each with its own pending flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Record creation
    Create,
    /// Record update
    Update,
    /// Record deletion
    Delete,
    /// BDS validation
    Validate,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Validate => "validate",
        };
        f.write_str(label)
    }
}

/// Record a mutation was aimed at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationTarget {
    /// The user's registration
    CompetitionUser,
    /// The user's entry in a sport
    Participant(SportId),
    /// A purchase of a variant
    Purchase(VariantId),
}

impl fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompetitionUser => write!(f, "registration"),
            Self::Participant(sport_id) => write!(f, "participant for sport {sport_id}"),
            Self::Purchase(variant_id) => write!(f, "purchase of variant {variant_id}"),
        }
    }
}

/// A backend mutation that failed
///
/// Only the targeted item stays unreconciled; nothing is rolled back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} {target} failed: {source}")]
pub struct MutationError {
    /// Kind of mutation
    pub kind: MutationKind,
    /// Record targeted
    pub target: MutationTarget,
    /// Underlying provider failure
    #[source]
    pub source: ProviderError,
}

impl MutationError {
    /// Wrap a provider failure
    #[must_use]
    pub const fn new(kind: MutationKind, target: MutationTarget, source: ProviderError) -> Self {
        Self {
            kind,
            target,
            source,
        }
    }
}
