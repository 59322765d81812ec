//! Session context injected into the onboarding environment.

use crate::types::{SchoolId, SchoolType, UserId};
use serde::{Deserialize, Serialize};

/// Identity fields shown on the Information step
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
}

/// The signed-in user and their school
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Signed-in user
    pub user_id: UserId,
    /// User's school
    pub school_id: SchoolId,
    /// School category, drives catalog filtering
    pub school_type: SchoolType,
    /// Whether the school opened registrations for the active edition
    pub school_inscription_enabled: bool,
    /// Bearer token, `None` when signed out
    pub token: Option<String>,
    /// Profile used to prefill the wizard
    pub profile: UserProfile,
}

impl Session {
    /// Creates a session with inscriptions enabled and no token yet
    #[must_use]
    pub fn new(user_id: UserId, school_id: SchoolId, school_type: SchoolType) -> Self {
        Self {
            user_id,
            school_id,
            school_type,
            school_inscription_enabled: true,
            token: None,
            profile: UserProfile::default(),
        }
    }

    /// Sets the bearer token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Drops the bearer token
    #[must_use]
    pub fn signed_out(mut self) -> Self {
        self.token = None;
        self
    }

    /// Sets whether the school accepts inscriptions
    #[must_use]
    pub const fn with_inscription_enabled(mut self, enabled: bool) -> Self {
        self.school_inscription_enabled = enabled;
        self
    }

    /// Sets the profile used to prefill the wizard
    #[must_use]
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Whether a bearer token is present
    #[must_use]
    pub const fn token_present(&self) -> bool {
        self.token.is_some()
    }
}
