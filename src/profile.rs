//! Doctor profile and professional certifications.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Address;
use crate::validation::{FieldErrors, ProfileForm};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationFees {
    pub in_person: u32,
    pub online: u32,
    pub follow_up: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub id: String,
    pub name: String,
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    pub certificate_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationStatus {
    Valid,
    Expired,
    NoExpiry,
}

impl CertificationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::Expired => "Expired",
            Self::NoExpiry => "No Expiry",
        }
    }
}

impl Certification {
    /// Valid while the expiry date is still in the future; expiring today
    /// counts as expired.
    pub fn status_on(&self, today: NaiveDate) -> CertificationStatus {
        match self.expiry_date {
            None => CertificationStatus::NoExpiry,
            Some(expiry) if expiry > today => CertificationStatus::Valid,
            Some(_) => CertificationStatus::Expired,
        }
    }
}

/// Certification form as entered, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationDraft {
    pub name: String,
    pub issuing_organization: String,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub certificate_number: String,
}

impl CertificationDraft {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.insert("name", "Certification name is required");
        }
        if self.issuing_organization.trim().is_empty() {
            errors.insert("issuingOrganization", "Issuing organization is required");
        }
        if self.issue_date.is_none() {
            errors.insert("issueDate", "Issue date is required");
        }
        if self.certificate_number.trim().is_empty() {
            errors.insert("certificateNumber", "Certificate number is required");
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub full_name: String,
    pub medical_registration_number: String,
    pub specialization: String,
    pub years_of_experience: u32,
    pub contact_number: String,
    pub email: String,
    #[serde(default)]
    pub profile_photo: String,
    #[serde(default)]
    pub educational_qualifications: Vec<String>,
    #[serde(default)]
    pub hospital_affiliations: Vec<String>,
    #[serde(default)]
    pub languages_spoken: Vec<String>,
    #[serde(default)]
    pub consultation_fees: ConsultationFees,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub certifications: Vec<Certification>,
}

impl DoctorProfile {
    pub fn form(&self) -> ProfileForm {
        ProfileForm {
            full_name: self.full_name.clone(),
            medical_registration_number: self.medical_registration_number.clone(),
            years_of_experience: self.years_of_experience as i32,
            contact_number: self.contact_number.clone(),
            email: self.email.clone(),
        }
    }

    /// Saves the editable identity fields. Nothing changes when any field
    /// fails validation.
    pub fn apply_form(&mut self, form: &ProfileForm) -> Result<(), FieldErrors> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        self.full_name = form.full_name.clone();
        self.medical_registration_number = form.medical_registration_number.clone();
        self.years_of_experience = form.years_of_experience.max(0) as u32;
        self.contact_number = form.contact_number.clone();
        self.email = form.email.clone();
        Ok(())
    }

    /// Validates `draft` and appends it with a fresh id.
    pub fn add_certification(
        &mut self,
        draft: CertificationDraft,
    ) -> Result<&Certification, FieldErrors> {
        let errors = draft.validate();
        let Some(issue_date) = draft.issue_date.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };
        let certification = Certification {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            issuing_organization: draft.issuing_organization.trim().to_string(),
            issue_date,
            expiry_date: draft.expiry_date,
            certificate_number: draft.certificate_number.trim().to_string(),
            attachment_url: None,
        };
        tracing::debug!(id = %certification.id, "Certification added");
        self.certifications.push(certification);
        Ok(&self.certifications[self.certifications.len() - 1])
    }

    pub fn remove_certification(&mut self, id: &str) -> bool {
        let before = self.certifications.len();
        self.certifications.retain(|c| c.id != id);
        self.certifications.len() != before
    }
}
