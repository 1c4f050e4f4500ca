//! Form validation for sign-in, sign-up, profile and certification forms.
//!
//! Validation never fails with an `Err`: each form yields `FieldErrors`, a
//! field → message map that the input layer renders next to the field and
//! clears as the user edits.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{RegisterData, UserRole};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static INDIAN_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+91\s\d{5}\s\d{5}$").unwrap());
static LETTERS_AND_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]+$").unwrap());
static ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

pub const SIGN_IN_MIN_PASSWORD: usize = 6;
pub const SIGN_UP_MIN_PASSWORD: usize = 8;
pub const MAX_YEARS_OF_EXPERIENCE: u32 = 50;

pub const SPECIALIZATIONS: &[&str] = &[
    "Cardiology",
    "Dermatology",
    "Endocrinology",
    "Gastroenterology",
    "General Practice",
    "Neurology",
    "Oncology",
    "Orthopedics",
    "Pediatrics",
    "Psychiatry",
    "Pulmonology",
    "Radiology",
];

/// Per-field error messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Called when the user edits `field`.
    pub fn clear(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

pub fn is_valid_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

/// `+91 XXXXX XXXXX`.
pub fn is_valid_phone(s: &str) -> bool {
    INDIAN_PHONE.is_match(s)
}

pub fn is_letters_and_spaces(s: &str) -> bool {
    LETTERS_AND_SPACES.is_match(s)
}

pub fn is_alphanumeric(s: &str) -> bool {
    ALPHANUMERIC.is_match(s)
}

/// At least one lowercase letter, one uppercase letter and one digit.
pub fn has_password_complexity(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_lowercase())
        && s.chars().any(|c| c.is_ascii_uppercase())
        && s.chars().any(|c| c.is_ascii_digit())
}

/// Normalizes typed input to `+91 XXXXX XXXXX`. The first two digits are
/// taken as the country code and replaced by 91.
pub fn format_phone_number(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        0..=2 => "+91 ".to_string(),
        3..=7 => format!("+91 {}", &digits[2..]),
        n => format!("+91 {} {}", &digits[2..7], &digits[7..n.min(12)]),
    }
}

fn check_email(errors: &mut FieldErrors, field: &str, email: &str) {
    if email.is_empty() {
        errors.insert(field, "Email is required");
    } else if !is_valid_email(email) {
        errors.insert(field, "Please enter a valid email address");
    }
}

fn check_name(errors: &mut FieldErrors, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field, &format!("{label} is required"));
    } else if !is_letters_and_spaces(value) {
        errors.insert(field, &format!("{label} should contain only letters"));
    }
}

// ═══════════════════════════════════════════
// Sign in
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", &self.email);
        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        } else if self.password.chars().count() < SIGN_IN_MIN_PASSWORD {
            errors.insert("password", "Password must be at least 6 characters");
        }
        errors
    }
}

// ═══════════════════════════════════════════
// Sign up
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub specialization: String,
    pub license_number: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_to_terms: bool,
}

impl SignUpForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_name(&mut errors, "firstName", "First name", &self.first_name);
        check_name(&mut errors, "lastName", "Last name", &self.last_name);
        check_email(&mut errors, "email", &self.email);

        if self.phone.is_empty() {
            errors.insert("phone", "Phone number is required");
        } else if !is_valid_phone(&self.phone) {
            errors.insert("phone", "Please enter a valid Indian phone number (+91 XXXXX XXXXX)");
        }

        if self.specialization.is_empty() {
            errors.insert("specialization", "Specialization is required");
        } else if !SPECIALIZATIONS.contains(&self.specialization.as_str()) {
            errors.insert("specialization", "Please select a valid specialization");
        }

        if self.license_number.trim().is_empty() {
            errors.insert("licenseNumber", "Medical license number is required");
        } else if !is_alphanumeric(&self.license_number) {
            errors.insert("licenseNumber", "License number should be alphanumeric");
        }

        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        } else if self.password.chars().count() < SIGN_UP_MIN_PASSWORD {
            errors.insert("password", "Password must be at least 8 characters");
        } else if !has_password_complexity(&self.password) {
            errors.insert(
                "password",
                "Password must contain at least one uppercase letter, \
                 one lowercase letter, and one number",
            );
        }

        if self.confirm_password.is_empty() {
            errors.insert("confirmPassword", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.insert("confirmPassword", "Passwords do not match");
        }

        if !self.agree_to_terms {
            errors.insert("agreeToTerms", "You must agree to the terms and conditions");
        }

        errors
    }

    /// Registration payload, or the field errors that block it.
    pub fn to_register_data(&self) -> Result<RegisterData, FieldErrors> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(RegisterData {
            name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
            email: self.email.clone(),
            phone: self.phone.clone(),
            password: self.password.clone(),
            role: UserRole::Doctor,
            specialization: Some(self.specialization.clone()),
            license_number: Some(self.license_number.clone()),
        })
    }
}

// ═══════════════════════════════════════════
// Profile
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub full_name: String,
    pub medical_registration_number: String,
    pub years_of_experience: i32,
    pub contact_number: String,
    pub email: String,
}

impl ProfileForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !is_letters_and_spaces(&self.full_name) {
            errors.insert("fullName", "Full name should contain only letters and spaces");
        }
        if !is_alphanumeric(&self.medical_registration_number) {
            errors.insert(
                "medicalRegistrationNumber",
                "Registration number should be alphanumeric",
            );
        }
        if !(0..=MAX_YEARS_OF_EXPERIENCE as i32).contains(&self.years_of_experience) {
            errors.insert("yearsOfExperience", "Years of experience should be between 0 and 50");
        }
        if !is_valid_phone(&self.contact_number) {
            errors.insert(
                "contactNumber",
                "Please enter a valid Indian phone number (+91 XXXXX XXXXX)",
            );
        }
        if !is_valid_email(&self.email) {
            errors.insert("email", "Please enter a valid email address");
        }
        errors
    }
}
