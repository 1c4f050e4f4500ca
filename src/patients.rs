//! Patient history: search over the patient list and medical record export.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Appointment, Patient, VisitKind};

/// Document written by `export_record`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordExport<'a> {
    pub patient: &'a Patient,
    pub export_date: DateTime<Utc>,
    pub exported_by: &'a str,
}

/// In-memory patient list with the history page's search and filter.
#[derive(Debug, Clone, Default)]
pub struct PatientDirectory {
    patients: Vec<Patient>,
}

impl PatientDirectory {
    pub fn new(patients: Vec<Patient>) -> Self {
        Self { patients }
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn get(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// Inserts or replaces by id.
    pub fn upsert(&mut self, patient: Patient) {
        match self.patients.iter_mut().find(|p| p.id == patient.id) {
            Some(existing) => *existing = patient,
            None => self.patients.push(patient),
        }
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Case-insensitive match on first name, last name or email; substring
    /// match on phone. An empty query matches everyone.
    pub fn search(&self, query: &str) -> Vec<&Patient> {
        let query = query.trim();
        if query.is_empty() {
            return self.patients.iter().collect();
        }
        let lowered = query.to_lowercase();
        self.patients
            .iter()
            .filter(|p| {
                p.first_name.to_lowercase().contains(&lowered)
                    || p.last_name.to_lowercase().contains(&lowered)
                    || p.email.to_lowercase().contains(&lowered)
                    || p.phone.contains(query)
            })
            .collect()
    }

    /// Search narrowed to clinic or personal visits. `None` keeps all.
    pub fn search_by_kind(&self, query: &str, kind: Option<VisitKind>) -> Vec<&Patient> {
        self.search(query)
            .into_iter()
            .filter(|p| kind.is_none() || p.appointment_type == kind)
            .collect()
    }
}

/// Appointments belonging to `patient_id`, most recent first.
pub fn history_for<'a>(appointments: &'a [Appointment], patient_id: &str) -> Vec<&'a Appointment> {
    let mut history: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.patient_id == patient_id)
        .collect();
    history.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
    history
}

pub fn export_file_name(patient: &Patient) -> String {
    format!("{}_{}_medical_record.json", patient.first_name, patient.last_name)
}

/// Pretty-printed JSON export of a patient's record, with its file name.
pub fn export_record(
    patient: &Patient,
    exported_by: &str,
    now: DateTime<Utc>,
) -> Result<(String, String), serde_json::Error> {
    let export = RecordExport {
        patient,
        export_date: now,
        exported_by,
    };
    let json = serde_json::to_string_pretty(&export)?;
    tracing::info!(patient_id = %patient.id, "Exported medical record");
    Ok((export_file_name(patient), json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appointment::fixtures::{appointment, date, time, ts};
    use crate::models::patient::fixtures::patient;
    use crate::models::AppointmentStatus;

    fn directory() -> PatientDirectory {
        let mut anita = patient("p1", "Anita", "Sharma");
        anita.phone = "+91 91234 56789".into();
        anita.appointment_type = Some(VisitKind::Clinic);
        let mut rahul = patient("p2", "Rahul", "Verma");
        rahul.appointment_type = Some(VisitKind::Personal);
        PatientDirectory::new(vec![anita, rahul, patient("p3", "Meera", "Iyer")])
    }

    #[test]
    fn search_names_case_insensitive() {
        let dir = directory();
        let hits: Vec<_> = dir.search("SHAR").iter().map(|p| p.id.clone()).collect();
        assert_eq!(hits, vec!["p1"]);
        assert_eq!(dir.search("meera").len(), 1);
    }

    #[test]
    fn search_email_and_phone() {
        let dir = directory();
        assert_eq!(dir.search("rahul.verma@").len(), 1);
        assert_eq!(dir.search("91234")[0].id, "p1");
    }

    #[test]
    fn empty_query_matches_all() {
        assert_eq!(directory().search("  ").len(), 3);
    }

    #[test]
    fn kind_filter() {
        let dir = directory();
        assert_eq!(dir.search_by_kind("", Some(VisitKind::Personal))[0].id, "p2");
        assert_eq!(dir.search_by_kind("", None).len(), 3);
    }

    #[test]
    fn upsert_replaces_existing() {
        let mut dir = directory();
        let mut updated = patient("p2", "Rahul", "Kapoor");
        updated.blood_group = Some("O+".into());
        dir.upsert(updated);
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.get("p2").unwrap().last_name, "Kapoor");
        dir.upsert(patient("p4", "Dev", "Nair"));
        assert_eq!(dir.len(), 4);
    }

    #[test]
    fn history_newest_first() {
        let visit = |id: &str, day, at| {
            let mut a = appointment(id, day, at, AppointmentStatus::Completed);
            a.patient_id = "p1".into();
            a
        };
        let appts = vec![
            visit("morning", date(2024, 1, 12), time(9, 0)),
            visit("oldest", date(2024, 1, 3), time(16, 0)),
            visit("newest", date(2024, 2, 1), time(8, 30)),
            visit("afternoon", date(2024, 1, 12), time(15, 0)),
            appointment("other", date(2024, 3, 1), time(9, 0), AppointmentStatus::Scheduled),
        ];
        let ids: Vec<&str> = history_for(&appts, "p1").iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "afternoon", "morning", "oldest"]);
        assert!(history_for(&appts, "nobody").is_empty());
    }

    #[test]
    fn export_document_shape() {
        let p = patient("p1", "Anita", "Sharma");
        let (name, json) = export_record(&p, "Dr. Sarah Johnson", ts(2024, 1, 15, 10, 30)).unwrap();
        assert_eq!(name, "Anita_Sharma_medical_record.json");

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["exportedBy"], "Dr. Sarah Johnson");
        assert_eq!(value["patient"]["firstName"], "Anita");
        assert!(value["exportDate"].as_str().unwrap().starts_with("2024-01-15T10:30:00"));
    }
}
