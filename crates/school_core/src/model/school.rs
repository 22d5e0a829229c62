//! School domain model.
//!
//! # Responsibility
//! - Define the stored `School` record and its create input `NewSchool`.
//! - Enforce field rules before any backend persists a record.
//!
//! # Invariants
//! - `id` is assigned by the owning backend and never reused.
//! - `created_at` is epoch milliseconds assigned by the owning backend.
//! - Text fields are non-empty after trimming.
//! - `contact` fits in 10 decimal digits.
//! - An empty `image` string is treated as no image.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Largest value representable by a 10-digit contact number.
pub const MAX_CONTACT: i64 = 9_999_999_999;

/// Backend-assigned integer identifier.
pub type SchoolId = i64;

/// Stored school record, as returned by list/get operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: i64,
    pub email_id: String,
    /// Image URL or path; `None` when the school has no image.
    pub image: Option<String>,
    /// Creation time in epoch milliseconds. Listing sort key.
    pub created_at: i64,
}

/// Create input: a school without backend-assigned fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchool {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: i64,
    pub email_id: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchoolField {
    Name,
    Address,
    City,
    State,
    Contact,
    EmailId,
}

impl SchoolField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::Contact => "contact",
            Self::EmailId => "email_id",
        }
    }
}

/// Validation failures for school records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchoolValidationError {
    /// Required text field is empty or whitespace only.
    EmptyField(SchoolField),
    /// Contact is negative or longer than 10 digits.
    InvalidContact(i64),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
}

impl Display for SchoolValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{} is required", field.as_str()),
            Self::InvalidContact(value) => {
                write!(f, "contact `{value}` is not a valid 10-digit number")
            }
            Self::InvalidEmail(value) => write!(f, "email_id `{value}` is not a valid email"),
        }
    }
}

impl Error for SchoolValidationError {}

impl NewSchool {
    /// Builds a create input without an image.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        contact: i64,
        email_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            city: city.into(),
            state: state.into(),
            contact,
            email_id: email_id.into(),
            image: None,
        }
    }

    /// Sets the optional image, normalizing blank values to `None`.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = normalize_image(Some(image.into()));
        self
    }

    /// Checks every field rule, reporting the first violation.
    pub fn validate(&self) -> Result<(), SchoolValidationError> {
        let required = [
            (SchoolField::Name, &self.name),
            (SchoolField::Address, &self.address),
            (SchoolField::City, &self.city),
            (SchoolField::State, &self.state),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SchoolValidationError::EmptyField(field));
            }
        }

        if !(0..=MAX_CONTACT).contains(&self.contact) {
            return Err(SchoolValidationError::InvalidContact(self.contact));
        }

        if self.email_id.trim().is_empty() {
            return Err(SchoolValidationError::EmptyField(SchoolField::EmailId));
        }
        if !EMAIL_RE.is_match(&self.email_id) {
            return Err(SchoolValidationError::InvalidEmail(self.email_id.clone()));
        }

        Ok(())
    }

    /// Materializes the stored record once a backend assigned id and time.
    pub fn into_school(self, id: SchoolId, created_at: i64) -> School {
        School {
            id,
            name: self.name,
            address: self.address,
            city: self.city,
            state: self.state,
            contact: self.contact,
            email_id: self.email_id,
            image: normalize_image(self.image),
            created_at,
        }
    }
}

/// Treats blank image values as absent.
pub fn normalize_image(image: Option<String>) -> Option<String> {
    image.filter(|value| !value.trim().is_empty())
}

/// Newest first; equal timestamps fall back to the larger id first.
pub fn sort_newest_first(schools: &mut [School]) {
    schools.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
