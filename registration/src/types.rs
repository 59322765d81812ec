//! Domain types for competition onboarding.
//!
//! Records mirror what the backend returns: editions, competition users,
//! participants, product variants, purchases and payments. Identifiers are
//! UUID newtypes and prices are integer cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Creates a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a competition edition
    EditionId
);
uuid_id!(
    /// Unique identifier for a user account
    UserId
);
uuid_id!(
    /// Unique identifier for a school
    SchoolId
);
uuid_id!(
    /// Unique identifier for a sport
    SportId
);
uuid_id!(
    /// Unique identifier for a sport team
    TeamId
);
uuid_id!(
    /// Unique identifier for a product
    ProductId
);
uuid_id!(
    /// Unique identifier for a product variant
    VariantId
);

// ============================================================================
// Money
// ============================================================================

/// Price in integer cents
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Adds two amounts, saturating at `u64::MAX` cents
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Multiplies by a quantity, saturating at `u64::MAX` cents
    #[must_use]
    pub fn saturating_mul(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(quantity)))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02} €", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Edition
// ============================================================================

/// One yearly competition instance with its own start/end window
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edition {
    /// Edition ID
    pub id: EditionId,
    /// Competition year
    pub year: i32,
    /// Display name
    pub name: String,
    /// Opening of the competition
    pub start_date: DateTime<Utc>,
    /// Close of the competition
    pub end_date: DateTime<Utc>,
    /// Only one edition is active at a time
    pub active: bool,
}

impl Edition {
    /// Whether the edition has started at `now`
    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_date
    }

    /// Whether the edition is over at `now` (`now >= end_date`)
    #[must_use]
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_date
    }
}

// ============================================================================
// Registration records
// ============================================================================

/// Category an athlete competes in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SportCategory {
    /// Men's competition
    Masculine,
    /// Women's competition
    Feminine,
    /// Mixed competition
    Mixed,
}

/// Roles a user declared for the edition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roles {
    /// Competes in a sport
    pub athlete: bool,
    /// Helps the organisation
    pub volunteer: bool,
    /// Cheerleading squad
    pub pompom: bool,
    /// School band
    pub fanfare: bool,
    /// Films the competition
    pub cameraman: bool,
}

impl Roles {
    /// Whether variants targeted at `public_type` may be offered to these roles
    #[must_use]
    pub const fn allows(&self, public_type: PublicType) -> bool {
        match public_type {
            PublicType::Athlete => self.athlete,
            PublicType::Volunteer => self.volunteer,
            PublicType::Pompom => self.pompom,
            PublicType::Fanfare => self.fanfare,
            PublicType::Cameraman => self.cameraman,
        }
    }
}

/// A user's registration for one edition
///
/// Created on the first wizard submission with `validated = false`. Only a
/// BDS approval outside this client flips `validated`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionUser {
    /// Registered user
    pub user_id: UserId,
    /// Edition registered for
    pub edition_id: EditionId,
    /// Competes in a sport
    pub is_athlete: bool,
    /// Volunteers
    pub is_volunteer: bool,
    /// Cheerleading squad member
    pub is_pompom: bool,
    /// Band member
    pub is_fanfare: bool,
    /// Films the competition
    pub is_cameraman: bool,
    /// Category, for athletes
    pub sport_category: Option<SportCategory>,
    /// Approved by the school's BDS
    pub validated: bool,
}

impl CompetitionUser {
    /// Declared roles as a value
    #[must_use]
    pub const fn roles(&self) -> Roles {
        Roles {
            athlete: self.is_athlete,
            volunteer: self.is_volunteer,
            pompom: self.is_pompom,
            fanfare: self.is_fanfare,
            cameraman: self.is_cameraman,
        }
    }

    /// Whether `body` declares the same roles and category
    #[must_use]
    pub fn matches(&self, body: &CompetitionUserBody) -> bool {
        self.roles() == body.roles && self.sport_category == body.sport_category
    }
}

/// Body sent when creating or updating a competition user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionUserBody {
    /// Edition to register for
    pub edition_id: EditionId,
    /// Declared roles
    pub roles: Roles,
    /// Category, for athletes
    pub sport_category: Option<SportCategory>,
}

/// An athlete's entry in one sport
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Athlete
    pub user_id: UserId,
    /// Sport entered
    pub sport_id: SportId,
    /// Athlete's school
    pub school_id: SchoolId,
    /// Team, for team sports
    pub team_id: Option<TeamId>,
    /// Sports federation license number
    pub license: Option<String>,
    /// License checked by the organisation
    pub is_license_valid: bool,
    /// Registered as a substitute
    pub substitute: bool,
}

/// Details sent when entering or updating a sport
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// Athlete's school
    pub school_id: SchoolId,
    /// Team, for team sports
    pub team_id: Option<TeamId>,
    /// License number
    pub license: Option<String>,
    /// Registered as a substitute
    pub substitute: bool,
}

impl Participant {
    /// The editable part of the record
    #[must_use]
    pub fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            school_id: self.school_id,
            team_id: self.team_id,
            license: self.license.clone(),
            substitute: self.substitute,
        }
    }
}

// ============================================================================
// Catalog and purchases
// ============================================================================

/// School category a variant is sold to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolType {
    /// The organising school
    Centrale,
    /// Schools from the host city
    FromLyon,
    /// Everyone else
    Others,
}

/// Audience a variant is restricted to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicType {
    /// Athletes
    Athlete,
    /// Volunteers
    Volunteer,
    /// Cheerleaders
    Pompom,
    /// Band members
    Fanfare,
    /// Camera crew
    Cameraman,
}

/// Product-level data carried by each variant
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Display name
    pub name: String,
    /// Every required product needs a selected variant before submission
    pub required: bool,
}

/// A purchasable configuration of a product
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID
    pub id: VariantId,
    /// Owning product
    pub product_id: ProductId,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: Money,
    /// Unique variants are always bought exactly once
    pub unique: bool,
    /// Disabled variants are hidden
    pub enabled: bool,
    /// School category the variant is sold to
    pub school_type: SchoolType,
    /// Audience restriction, `None` for everyone
    pub public_type: Option<PublicType>,
    /// Product-level data
    pub product: ProductSummary,
}

/// A persisted selection of a variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Purchase {
    /// Variant bought
    pub product_variant_id: VariantId,
    /// Quantity, above 1 only for non-unique variants
    pub quantity: u32,
}

/// A payment received for a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Paying user
    pub user_id: UserId,
    /// Amount received
    pub amount: Money,
    /// When the payment was received
    pub paid_at: DateTime<Utc>,
}

/// Filters for the catalog provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilters {
    /// Edition the products belong to
    pub edition_id: EditionId,
    /// School category of the buyer
    pub school_type: SchoolType,
}
