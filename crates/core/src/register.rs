//! Multi-step registration wizard.
//!
//! The wizard walks through [`RegistrationStep::Personal`],
//! [`RegistrationStep::Contact`], [`RegistrationStep::Password`] and
//! [`RegistrationStep::Review`]. Each forward move validates the fields of
//! the current step; moving back never validates. The finished draft turns
//! into a [`NewUser`] for the backend's `/register` endpoint.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Email, EmailError};

/// Minimum length of first and last name (after trimming).
pub const MIN_NAME_LENGTH: usize = 2;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum number of digits in a phone number.
pub const MIN_PHONE_DIGITS: usize = 6;

/// A wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegistrationStep {
    #[default]
    Personal,
    Contact,
    Password,
    Review,
}

impl RegistrationStep {
    pub const ALL: [Self; 4] = [Self::Personal, Self::Contact, Self::Password, Self::Review];

    /// 1-based position, as shown in the step indicator.
    #[must_use]
    pub const fn number(self) -> usize {
        match self {
            Self::Personal => 1,
            Self::Contact => 2,
            Self::Password => 3,
            Self::Review => 4,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Personal => "Personal details",
            Self::Contact => "Contact",
            Self::Password => "Choose a password",
            Self::Review => "Review",
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Personal => Some(Self::Contact),
            Self::Contact => Some(Self::Password),
            Self::Password => Some(Self::Review),
            Self::Review => None,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self {
            Self::Personal => None,
            Self::Contact => Some(Self::Personal),
            Self::Password => Some(Self::Contact),
            Self::Review => Some(Self::Password),
        }
    }
}

/// A single validation failure, tied to the form field it concerns.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("{label} must be at least {min} characters")]
    TooShort {
        field: &'static str,
        label: &'static str,
        min: usize,
    },
    #[error("{0}")]
    Email(#[from] EmailError),
    #[error("enter a phone number with at least 6 digits")]
    Phone,
    #[error("password needs 6+ characters including a lowercase letter, an uppercase letter and a digit")]
    WeakPassword,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("registration is not complete yet")]
    Incomplete,
}

impl RegistrationError {
    /// Form field name the error belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::TooShort { field, .. } => *field,
            Self::Email(_) => "email",
            Self::Phone => "phone",
            Self::WeakPassword => "password",
            Self::PasswordMismatch => "confirm_password",
            Self::Incomplete => "form",
        }
    }
}

/// Fields posted by one wizard step. Fields of other steps are absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StepFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Checkbox value; present (usually `"on"`) when ticked.
    pub subscribe: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Wizard state kept between requests.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationDraft {
    pub step: RegistrationStep,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub subscribe: bool,
    password: String,
}

impl fmt::Debug for RegistrationDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationDraft")
            .field("step", &self.step)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_owned()).unwrap_or_default()
}

fn check_name(
    value: &str,
    field: &'static str,
    label: &'static str,
    errors: &mut Vec<RegistrationError>,
) {
    if value.chars().count() < MIN_NAME_LENGTH {
        errors.push(RegistrationError::TooShort {
            field,
            label,
            min: MIN_NAME_LENGTH,
        });
    }
}

/// Digits, spaces and `+-()` only, with enough digits to be dialable.
fn is_valid_phone(phone: &str) -> bool {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    allowed && phone.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
}

fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

impl RegistrationDraft {
    /// Whether a password has been accepted.
    #[must_use]
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Validate the current step's fields, store them, and move forward.
    ///
    /// # Errors
    ///
    /// Returns every validation failure of the step; the draft is left
    /// unchanged in that case. On the review step, use [`Self::finish`].
    pub fn advance(
        &mut self,
        fields: &StepFields,
    ) -> Result<RegistrationStep, Vec<RegistrationError>> {
        let mut errors = Vec::new();
        let mut next = self.clone();

        match self.step {
            RegistrationStep::Personal => {
                next.first_name = trimmed(fields.first_name.as_deref());
                next.last_name = trimmed(fields.last_name.as_deref());
                check_name(&next.first_name, "first_name", "First name", &mut errors);
                check_name(&next.last_name, "last_name", "Last name", &mut errors);
            }
            RegistrationStep::Contact => {
                next.email = trimmed(fields.email.as_deref());
                next.phone = trimmed(fields.phone.as_deref());
                next.subscribe = fields.subscribe.is_some();
                match Email::parse(&next.email) {
                    Ok(email) => next.email = email.to_string(),
                    Err(e) => errors.push(e.into()),
                }
                if !is_valid_phone(&next.phone) {
                    errors.push(RegistrationError::Phone);
                }
            }
            RegistrationStep::Password => {
                let password = fields.password.clone().unwrap_or_default();
                let confirm = fields.confirm_password.clone().unwrap_or_default();
                if !is_strong_password(&password) {
                    errors.push(RegistrationError::WeakPassword);
                }
                if password != confirm {
                    errors.push(RegistrationError::PasswordMismatch);
                }
                next.password = password;
            }
            RegistrationStep::Review => errors.push(RegistrationError::Incomplete),
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        if let Some(step) = self.step.next() {
            next.step = step;
        }
        *self = next;
        Ok(self.step)
    }

    /// Go back one step without validating. Stays on the first step.
    pub fn back(&mut self) -> RegistrationStep {
        if let Some(step) = self.step.prev() {
            self.step = step;
        }
        self.step
    }

    /// Build the backend payload from a completed draft.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::Incomplete`] unless the draft is on the review
    /// step; otherwise the first field that no longer validates.
    pub fn finish(&self) -> Result<NewUser, RegistrationError> {
        if self.step != RegistrationStep::Review {
            return Err(RegistrationError::Incomplete);
        }
        let mut errors = Vec::new();
        check_name(&self.first_name, "first_name", "First name", &mut errors);
        check_name(&self.last_name, "last_name", "Last name", &mut errors);
        if !is_valid_phone(&self.phone) {
            errors.push(RegistrationError::Phone);
        }
        if !is_strong_password(&self.password) {
            errors.push(RegistrationError::WeakPassword);
        }
        if let Some(first) = errors.into_iter().next() {
            return Err(first);
        }

        Ok(NewUser {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: Email::parse(&self.email)?,
            phone: self.phone.clone(),
            password: self.password.clone(),
            role: NewUser::ROLE,
            subscribe: self.subscribe,
        })
    }

    /// Forget the password. A draft already past the password step goes
    /// back to it, so the password is asked for again before the next
    /// submit.
    pub fn clear_password(&mut self) {
        self.password.clear();
        if self.step == RegistrationStep::Review {
            self.step = RegistrationStep::Password;
        }
    }
}

/// Registration payload for `POST /register`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    password: String,
    pub role: &'static str,
    pub subscribe: bool,
}

impl NewUser {
    /// Role assigned to self-registered accounts.
    pub const ROLE: &'static str = "user";
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
