//! Participation declaration.
//!
//! The wizard edits one flat [`RegistrationForm`]. Sport fields only matter
//! when the participation is [`ParticipationKind::Sport`]; they are kept when
//! the user switches away so switching back restores them.

use crate::error::{FieldErrors, FieldValidationError};
use crate::session::UserProfile;
use crate::types::{
    CompetitionUser, CompetitionUserBody, EditionId, Participant, ParticipantInfo, Roles,
    SchoolId, SportCategory, SportId, TeamId,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// Field names as reported in [`FieldErrors`]
pub mod fields {
    /// Given name
    pub const FIRST_NAME: &str = "first_name";
    /// Family name
    pub const LAST_NAME: &str = "last_name";
    /// Contact email
    pub const EMAIL: &str = "email";
    /// Contact phone
    pub const PHONE: &str = "phone";
    /// Participation kind
    pub const PARTICIPATION: &str = "participation";
    /// Volunteering on top of the main participation
    pub const ALSO_VOLUNTEER: &str = "also_volunteer";
    /// Sport entered
    pub const SPORT_ID: &str = "sport_id";
    /// Sport category
    pub const SPORT_CATEGORY: &str = "sport_category";
    /// Team
    pub const TEAM_ID: &str = "team_id";
    /// License number
    pub const LICENSE: &str = "license";
    /// Substitute flag
    pub const SUBSTITUTE: &str = "substitute";
}

/// How a user takes part in the edition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationKind {
    /// Athlete in a sport
    Sport,
    /// Cheerleading squad
    Pompom,
    /// School band
    Fanfare,
    /// Camera crew
    Cameraman,
    /// Volunteer only
    Volunteer,
}

impl ParticipationKind {
    /// Whether the Sport step applies
    #[must_use]
    pub const fn is_sport(self) -> bool {
        matches!(self, Self::Sport)
    }

    /// Primary participation implied by server-side roles
    #[must_use]
    pub const fn from_roles(roles: &Roles) -> Option<Self> {
        if roles.athlete {
            Some(Self::Sport)
        } else if roles.pompom {
            Some(Self::Pompom)
        } else if roles.fanfare {
            Some(Self::Fanfare)
        } else if roles.cameraman {
            Some(Self::Cameraman)
        } else if roles.volunteer {
            Some(Self::Volunteer)
        } else {
            None
        }
    }
}

impl fmt::Display for ParticipationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Sport => "sport",
            Self::Pompom => "pompom",
            Self::Fanfare => "fanfare",
            Self::Cameraman => "cameraman",
            Self::Volunteer => "volunteer",
        };
        f.write_str(label)
    }
}

/// Values edited by the wizard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RegistrationForm {
    /// Given name
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    /// Family name
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    /// Contact email
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,

    /// Contact phone
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    /// Main participation
    #[validate(required(message = "Choose how you take part"))]
    pub participation: Option<ParticipationKind>,

    /// Volunteering on top of the main participation
    pub also_volunteer: bool,

    /// Sport entered
    pub sport_id: Option<SportId>,

    /// Sport category
    pub sport_category: Option<SportCategory>,

    /// Team, for team sports
    pub team_id: Option<TeamId>,

    /// Sports federation license number
    #[validate(length(max = 50, message = "License number is too long"))]
    pub license: Option<String>,

    /// Registered as a substitute
    pub substitute: bool,
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '.' | '-'));

    if allowed && (8..=15).contains(&digits) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

/// One field edit sent by the wizard
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormEdit {
    /// Given name
    FirstName(String),
    /// Family name
    LastName(String),
    /// Contact email
    Email(String),
    /// Contact phone
    Phone(Option<String>),
    /// Volunteering on top of the main participation
    AlsoVolunteer(bool),
    /// Sport entered
    Sport(Option<SportId>),
    /// Sport category
    SportCategory(Option<SportCategory>),
    /// Team
    Team(Option<TeamId>),
    /// License number
    License(Option<String>),
    /// Substitute flag
    Substitute(bool),
}

impl FormEdit {
    /// Field the edit touches
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::FirstName(_) => fields::FIRST_NAME,
            Self::LastName(_) => fields::LAST_NAME,
            Self::Email(_) => fields::EMAIL,
            Self::Phone(_) => fields::PHONE,
            Self::AlsoVolunteer(_) => fields::ALSO_VOLUNTEER,
            Self::Sport(_) => fields::SPORT_ID,
            Self::SportCategory(_) => fields::SPORT_CATEGORY,
            Self::Team(_) => fields::TEAM_ID,
            Self::License(_) => fields::LICENSE,
            Self::Substitute(_) => fields::SUBSTITUTE,
        }
    }
}

impl RegistrationForm {
    /// Form prefilled with the user's profile
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            ..Self::default()
        }
    }

    /// Form prefilled from existing registration records
    #[must_use]
    pub fn from_records(
        profile: &UserProfile,
        user: &CompetitionUser,
        participant: Option<&Participant>,
    ) -> Self {
        let roles = user.roles();
        let participation = ParticipationKind::from_roles(&roles);
        let mut form = Self {
            participation,
            also_volunteer: roles.volunteer && participation != Some(ParticipationKind::Volunteer),
            sport_category: user.sport_category,
            ..Self::from_profile(profile)
        };
        if let Some(participant) = participant {
            form.sport_id = Some(participant.sport_id);
            form.team_id = participant.team_id;
            form.license.clone_from(&participant.license);
            form.substitute = participant.substitute;
        }
        form
    }

    /// Apply one edit
    pub fn apply(&mut self, edit: FormEdit) {
        match edit {
            FormEdit::FirstName(value) => self.first_name = value,
            FormEdit::LastName(value) => self.last_name = value,
            FormEdit::Email(value) => self.email = value,
            FormEdit::Phone(value) => self.phone = value,
            FormEdit::AlsoVolunteer(value) => self.also_volunteer = value,
            FormEdit::Sport(value) => self.sport_id = value,
            FormEdit::SportCategory(value) => self.sport_category = value,
            FormEdit::Team(value) => self.team_id = value,
            FormEdit::License(value) => {
                self.license = value.filter(|license| !license.trim().is_empty());
            },
            FormEdit::Substitute(value) => self.substitute = value,
        }
    }

    /// Whether the sport branch applies
    #[must_use]
    pub fn is_sport(&self) -> bool {
        self.participation.is_some_and(ParticipationKind::is_sport)
    }

    /// Roles implied by the current answers
    #[must_use]
    pub fn roles(&self) -> Roles {
        let kind = self.participation;
        Roles {
            athlete: kind == Some(ParticipationKind::Sport),
            volunteer: kind == Some(ParticipationKind::Volunteer) || self.also_volunteer,
            pompom: kind == Some(ParticipationKind::Pompom),
            fanfare: kind == Some(ParticipationKind::Fanfare),
            cameraman: kind == Some(ParticipationKind::Cameraman),
        }
    }

    /// Every invalid field of the form
    ///
    /// Sport fields are only checked on the sport branch.
    #[must_use]
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(&e),
        };
        if self.is_sport() {
            if self.sport_id.is_none() {
                errors.insert(
                    FieldValidationError::new(fields::SPORT_ID, "required")
                        .with_message("Choose a sport"),
                );
            }
            if self.sport_category.is_none() {
                errors.insert(
                    FieldValidationError::new(fields::SPORT_CATEGORY, "required")
                        .with_message("Choose a category"),
                );
            }
        } else {
            errors.remove(fields::LICENSE);
        }
        errors
    }

    /// The declaration to submit, `None` while the form is invalid
    #[must_use]
    pub fn declaration(&self) -> Option<Declaration> {
        if !self.field_errors().is_empty() {
            return None;
        }
        let sport = if self.is_sport() {
            Some(SportEntry {
                sport_id: self.sport_id?,
                team_id: self.team_id,
                license: self.license.clone(),
                substitute: self.substitute,
            })
        } else {
            None
        };
        Some(Declaration {
            roles: self.roles(),
            sport_category: if self.is_sport() { self.sport_category } else { None },
            sport,
        })
    }
}

/// Sport part of a declaration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SportEntry {
    /// Sport entered
    pub sport_id: SportId,
    /// Team
    pub team_id: Option<TeamId>,
    /// License number
    pub license: Option<String>,
    /// Substitute flag
    pub substitute: bool,
}

impl SportEntry {
    /// Participant details for the user's school
    #[must_use]
    pub fn info(&self, school_id: SchoolId) -> ParticipantInfo {
        ParticipantInfo {
            school_id,
            team_id: self.team_id,
            license: self.license.clone(),
            substitute: self.substitute,
        }
    }
}

/// Validated roles and sport choice
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Declared roles
    pub roles: Roles,
    /// Category, for athletes
    pub sport_category: Option<SportCategory>,
    /// Sport choice, for athletes
    pub sport: Option<SportEntry>,
}

impl Declaration {
    /// Body registering the user for `edition_id`
    #[must_use]
    pub const fn competition_user(&self, edition_id: EditionId) -> CompetitionUserBody {
        CompetitionUserBody {
            edition_id,
            roles: self.roles,
            sport_category: self.sport_category,
        }
    }
}
