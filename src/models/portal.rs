//! Payload shapes exchanged with the portal REST service that the core
//! itself does not operate on.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::appointment::hh_mm;
use super::enums::{CalendarEventType, NotificationType, RecordType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_id: String,
    pub medications: Vec<PrescribedMedication>,
    pub diagnosis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_dispensed: bool,
    pub created_at: DateTime<Utc>,
    pub valid_until: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub title: String,
    pub description: String,
    pub findings: String,
    pub recommendations: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Persisted form of one template day, keyed by doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorAvailability {
    pub id: String,
    pub doctor_id: String,
    pub day_of_week: u8,
    #[serde(with = "hh_mm")]
    pub start_time: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_hh_mm")]
    pub break_start: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_hh_mm")]
    pub break_end: Option<NaiveTime>,
    pub is_available: bool,
    pub max_appointments: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: u32,
    pub today_appointments: u32,
    pub completed_appointments: u32,
    pub pending_appointments: u32,
    pub cancelled_appointments: u32,
    pub revenue: f64,
    pub new_patients: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: CalendarEventType,
    pub status: String,
}

pub(crate) mod opt_hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::hh_mm;

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => hh_mm::serialize(t, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| hh_mm::parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_payload_optional_break() {
        let json = r#"{
            "id": "a1", "doctorId": "doc_1", "dayOfWeek": 6,
            "startTime": "10:00", "endTime": "14:00",
            "isAvailable": false, "maxAppointments": 8
        }"#;
        let row: DoctorAvailability = serde_json::from_str(json).unwrap();
        assert!(row.break_start.is_none());
        assert_eq!(row.start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());

        let back = serde_json::to_value(&row).unwrap();
        assert!(back.get("breakStart").is_none());
        assert_eq!(back["endTime"], "14:00");
    }

    #[test]
    fn availability_payload_with_break() {
        let json = r#"{
            "id": "a1", "doctorId": "doc_1", "dayOfWeek": 1,
            "startTime": "09:00", "endTime": "17:00",
            "breakStart": "12:00", "breakEnd": "13:00",
            "isAvailable": true, "maxAppointments": 16
        }"#;
        let row: DoctorAvailability = serde_json::from_str(json).unwrap();
        assert_eq!(row.break_end, NaiveTime::from_hms_opt(13, 0, 0));
    }

    #[test]
    fn medical_record_type_field() {
        let json = r#"{
            "id": "r1", "patientId": "p1", "doctorId": "doc_1", "appointmentId": "1",
            "type": "imaging", "title": "Chest X-ray", "description": "",
            "findings": "Clear", "recommendations": "None",
            "createdAt": "2024-01-15T10:00:00Z"
        }"#;
        let record: MedicalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.record_type, RecordType::Imaging);
        assert!(record.attachments.is_empty());
    }
}
