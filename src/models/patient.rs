use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Gender, VisitKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceInfo {
    pub provider: String,
    pub policy_number: String,
    pub group_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub address: Address,
    pub emergency_contact: EmergencyContact,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_info: Option<InsuranceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_association: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<VisitKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// First letter of each name, used for avatar badges.
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .collect()
    }

    pub fn age_on(&self, today: NaiveDate) -> i32 {
        age_on(self.date_of_birth, today)
    }
}

/// Whole years between `date_of_birth` and `today`. One year less until the
/// birthday has been reached in `today`'s year.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}


#[cfg(test)]
mod tests {
    use super::fixtures::patient;
    use super::*;
    use crate::models::appointment::fixtures::date;

    #[test]
    fn age_counts_completed_years_only() {
        let dob = date(1985, 6, 15);
        assert_eq!(age_on(dob, date(2024, 6, 14)), 38);
        assert_eq!(age_on(dob, date(2024, 6, 15)), 39);
        assert_eq!(age_on(dob, date(2024, 12, 1)), 39);
        assert_eq!(age_on(dob, date(2024, 1, 20)), 38);
    }

    #[test]
    fn leap_day_birthday() {
        let dob = date(2000, 2, 29);
        assert_eq!(age_on(dob, date(2023, 2, 28)), 22);
        assert_eq!(age_on(dob, date(2023, 3, 1)), 23);
    }

    #[test]
    fn initials_and_full_name() {
        let p = patient("p1", "Rajesh", "Kumar");
        assert_eq!(p.initials(), "RK");
        assert_eq!(p.full_name(), "Rajesh Kumar");
    }

    #[test]
    fn camel_case_wire_fields() {
        let mut p = patient("p1", "Priya", "Sharma");
        p.appointment_type = Some(VisitKind::Personal);
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["firstName"], "Priya");
        assert_eq!(value["dateOfBirth"], "1985-06-15");
        assert_eq!(value["appointmentType"], "personal");
        assert_eq!(value["address"]["zipCode"], "");
        assert!(value.get("bloodGroup").is_none());
    }
}
