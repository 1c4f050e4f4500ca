use std::cell::RefCell;

use reqwest::blocking::RequestBuilder;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use super::endpoints;
use super::error::ApiError;
use super::ApiEnvelope;
use crate::config::PortalConfig;
use crate::models::{
    Appointment, DashboardStats, DoctorAvailability, LoginRequest, MedicalRecord, Notification,
    Patient, Prescription, RegisterData, Session, User,
};

/// Operations the portal core needs from the REST service.
pub trait PortalApi {
    fn request_otp(&self, phone: &str) -> Result<(), ApiError>;
    fn register(&self, data: &RegisterData) -> Result<User, ApiError>;
    fn login(&self, request: &LoginRequest) -> Result<Session, ApiError>;
    fn current_user(&self) -> Result<User, ApiError>;
    fn patients(&self) -> Result<Vec<Patient>, ApiError>;
    fn appointments(&self) -> Result<Vec<Appointment>, ApiError>;
    fn create_appointment(&self, appointment: &Appointment) -> Result<Appointment, ApiError>;
    fn prescriptions(&self, patient_id: &str) -> Result<Vec<Prescription>, ApiError>;
    fn medical_records(&self, patient_id: &str) -> Result<Vec<MedicalRecord>, ApiError>;
    fn doctor_availability(&self, doctor_id: &str) -> Result<Vec<DoctorAvailability>, ApiError>;
    fn save_availability(
        &self,
        rows: &[DoctorAvailability],
    ) -> Result<Vec<DoctorAvailability>, ApiError>;
    fn notifications(&self) -> Result<Vec<Notification>, ApiError>;
    fn stats(&self) -> Result<DashboardStats, ApiError>;
}

/// Blocking HTTP client for the portal REST service.
pub struct HttpPortalClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    token: Option<String>,
}

impl HttpPortalClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
            token: None,
        })
    }

    pub fn from_config(config: &PortalConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Logs in and keeps the returned token for later requests.
    pub fn sign_in(&mut self, request: &LoginRequest) -> Result<User, ApiError> {
        let session = self.login(request)?;
        self.token = Some(session.token);
        tracing::info!(user_id = %session.user.id, "Signed in to portal service");
        Ok(session.user)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::Unauthorized)?;
        Ok(request.bearer_auth(token))
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_connect() {
            ApiError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ApiError::Timeout(self.timeout_secs)
        } else {
            ApiError::HttpClient(e.to_string())
        }
    }

    fn envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let response = request.send().map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Portal service request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .map_err(|e| ApiError::ResponseParsing(e.to_string()))
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.envelope(request)?.into_result()
    }

    fn get_authed<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.authed(self.client.get(self.url(path)))?;
        self.send(request)
    }

    /// GET `path?patientId=<id>`, with the id form-encoded.
    fn by_patient(&self, path: &str, patient_id: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .query(&[("patientId", patient_id)])
    }

    /// `<base>/doctor-availability/<id>`, with the id percent-encoded as a
    /// single path segment.
    fn availability_url(&self, doctor_id: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url(endpoints::DOCTOR_AVAILABILITY))
            .map_err(|e| ApiError::HttpClient(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::HttpClient("Base URL cannot take a path".into()))?
            .push(doctor_id);
        Ok(url)
    }
}

impl PortalApi for HttpPortalClient {
    fn request_otp(&self, phone: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url(endpoints::REQUEST_OTP))
            .json(&serde_json::json!({ "phone": phone }));
        let envelope: ApiEnvelope<serde_json::Value> = self.envelope(request)?;
        if envelope.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(envelope.error.unwrap_or_default()))
        }
    }

    fn register(&self, data: &RegisterData) -> Result<User, ApiError> {
        self.send(self.client.post(self.url(endpoints::REGISTER)).json(data))
    }

    fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        self.send(self.client.post(self.url(endpoints::LOGIN)).json(request))
    }

    fn current_user(&self) -> Result<User, ApiError> {
        self.get_authed(endpoints::GET_USER)
    }

    fn patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.get_authed(endpoints::PATIENTS)
    }

    fn appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.get_authed(endpoints::APPOINTMENTS)
    }

    fn create_appointment(&self, appointment: &Appointment) -> Result<Appointment, ApiError> {
        let request = self.authed(
            self.client
                .post(self.url(endpoints::APPOINTMENTS))
                .json(appointment),
        )?;
        self.send(request)
    }

    fn prescriptions(&self, patient_id: &str) -> Result<Vec<Prescription>, ApiError> {
        let request = self.authed(self.by_patient(endpoints::PRESCRIPTIONS, patient_id))?;
        self.send(request)
    }

    fn medical_records(&self, patient_id: &str) -> Result<Vec<MedicalRecord>, ApiError> {
        let request = self.authed(self.by_patient(endpoints::MEDICAL_RECORDS, patient_id))?;
        self.send(request)
    }

    fn doctor_availability(&self, doctor_id: &str) -> Result<Vec<DoctorAvailability>, ApiError> {
        let url = self.availability_url(doctor_id)?;
        let request = self.authed(self.client.get(url))?;
        self.send(request)
    }

    fn save_availability(
        &self,
        rows: &[DoctorAvailability],
    ) -> Result<Vec<DoctorAvailability>, ApiError> {
        let request = self.authed(
            self.client
                .put(self.url(endpoints::DOCTOR_AVAILABILITY))
                .json(rows),
        )?;
        self.send(request)
    }

    fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get_authed(endpoints::NOTIFICATIONS)
    }

    fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_authed(endpoints::STATS)
    }
}

/// In-memory client for tests. Requests other than OTP, register and login
/// fail with `Unauthorized` until `login` has succeeded.
pub struct MockPortalClient {
    user: User,
    password: String,
    signed_in: RefCell<bool>,
    patients: Vec<Patient>,
    appointments: RefCell<Vec<Appointment>>,
    prescriptions: Vec<Prescription>,
    records: Vec<MedicalRecord>,
    availability: RefCell<Vec<DoctorAvailability>>,
    notifications: Vec<Notification>,
    stats: DashboardStats,
}

impl MockPortalClient {
    pub fn new(user: User, password: &str) -> Self {
        Self {
            user,
            password: password.to_string(),
            signed_in: RefCell::new(false),
            patients: Vec::new(),
            appointments: RefCell::new(Vec::new()),
            prescriptions: Vec::new(),
            records: Vec::new(),
            availability: RefCell::new(Vec::new()),
            notifications: Vec::new(),
            stats: DashboardStats::default(),
        }
    }

    pub fn with_patients(mut self, patients: Vec<Patient>) -> Self {
        self.patients = patients;
        self
    }

    pub fn with_appointments(self, appointments: Vec<Appointment>) -> Self {
        *self.appointments.borrow_mut() = appointments;
        self
    }

    pub fn with_prescriptions(mut self, prescriptions: Vec<Prescription>) -> Self {
        self.prescriptions = prescriptions;
        self
    }

    pub fn with_records(mut self, records: Vec<MedicalRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn with_notifications(mut self, notifications: Vec<Notification>) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn with_stats(mut self, stats: DashboardStats) -> Self {
        self.stats = stats;
        self
    }

    fn require_session(&self) -> Result<(), ApiError> {
        if *self.signed_in.borrow() {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

impl PortalApi for MockPortalClient {
    fn request_otp(&self, phone: &str) -> Result<(), ApiError> {
        if phone == self.user.phone {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("No account for {phone}")))
        }
    }

    fn register(&self, data: &RegisterData) -> Result<User, ApiError> {
        if data.email == self.user.email {
            return Err(ApiError::Rejected("Email already registered".into()));
        }
        Ok(User {
            id: format!("user_{}", data.email),
            name: data.name.clone(),
            email: data.email.clone(),
            phone: data.phone.clone(),
            role: data.role,
            specialization: data.specialization.clone(),
            license_number: data.license_number.clone(),
            avatar: None,
            created_at: self.user.created_at,
            is_active: true,
        })
    }

    fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        if request.email != self.user.email || request.password != self.password {
            return Err(ApiError::Rejected("Invalid email or password".into()));
        }
        *self.signed_in.borrow_mut() = true;
        Ok(Session {
            token: "mock-token".into(),
            user: self.user.clone(),
        })
    }

    fn current_user(&self) -> Result<User, ApiError> {
        self.require_session()?;
        Ok(self.user.clone())
    }

    fn patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.require_session()?;
        Ok(self.patients.clone())
    }

    fn appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.require_session()?;
        Ok(self.appointments.borrow().clone())
    }

    fn create_appointment(&self, appointment: &Appointment) -> Result<Appointment, ApiError> {
        self.require_session()?;
        appointment
            .validate()
            .map_err(|e| ApiError::Rejected(e.to_string()))?;
        self.appointments.borrow_mut().push(appointment.clone());
        Ok(appointment.clone())
    }

    fn prescriptions(&self, patient_id: &str) -> Result<Vec<Prescription>, ApiError> {
        self.require_session()?;
        Ok(self
            .prescriptions
            .iter()
            .filter(|p| p.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn medical_records(&self, patient_id: &str) -> Result<Vec<MedicalRecord>, ApiError> {
        self.require_session()?;
        Ok(self
            .records
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn doctor_availability(&self, doctor_id: &str) -> Result<Vec<DoctorAvailability>, ApiError> {
        self.require_session()?;
        Ok(self
            .availability
            .borrow()
            .iter()
            .filter(|row| row.doctor_id == doctor_id)
            .cloned()
            .collect())
    }

    fn save_availability(
        &self,
        rows: &[DoctorAvailability],
    ) -> Result<Vec<DoctorAvailability>, ApiError> {
        self.require_session()?;
        let mut stored = self.availability.borrow_mut();
        for row in rows {
            stored.retain(|r| !(r.doctor_id == row.doctor_id && r.day_of_week == row.day_of_week));
            stored.push(row.clone());
        }
        Ok(rows.to_vec())
    }

    fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.require_session()?;
        Ok(self.notifications.clone())
    }

    fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.require_session()?;
        Ok(self.stats.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::AvailabilityTemplate;
    use crate::models::appointment::fixtures::{appointment, date, time, ts};
    use crate::models::{AppointmentStatus, UserRole};

    fn doctor() -> User {
        User {
            id: "doc_1".into(),
            name: "Dr. Sarah Johnson".into(),
            email: "sarah@clinic.in".into(),
            phone: "+91 98765 43210".into(),
            role: UserRole::Doctor,
            specialization: Some("Cardiology".into()),
            license_number: Some("MH12345".into()),
            avatar: None,
            created_at: ts(2024, 1, 1, 9, 0),
            is_active: true,
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn http_client_trims_trailing_slash() {
        let client = HttpPortalClient::new("http://localhost:8000/api/", 5).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url(endpoints::STATS), "http://localhost:8000/api/stats");
    }

    #[test]
    fn http_client_from_config() {
        let client = HttpPortalClient::from_config(&PortalConfig::default()).unwrap();
        assert_eq!(client.base_url(), crate::config::DEFAULT_API_BASE_URL);
        assert!(!client.is_authenticated());
        assert!(client.with_token("abc").is_authenticated());
    }

    #[test]
    fn patient_ids_are_encoded_in_the_query() {
        let client = HttpPortalClient::new("http://localhost:8000/api", 5).unwrap();
        let request = client
            .by_patient(endpoints::PRESCRIPTIONS, "p 1&role=admin")
            .build()
            .unwrap();
        let url = request.url();
        assert_eq!(url.path(), "/api/prescriptions");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("patientId".to_string(), "p 1&role=admin".to_string())]);
    }

    #[test]
    fn doctor_id_stays_one_path_segment() {
        let client = HttpPortalClient::new("http://localhost:8000/api/", 5).unwrap();
        let url = client.availability_url("doc/../admin?x=1").unwrap();
        assert_eq!(url.path_segments().unwrap().count(), 3);
        assert!(url.query().is_none());
        assert!(url.path().starts_with("/api/doctor-availability/doc%2F"));

        let plain = client.availability_url("doc_1").unwrap();
        assert_eq!(plain.as_str(), "http://localhost:8000/api/doctor-availability/doc_1");
    }

    #[test]
    fn http_client_requires_token_before_sending() {
        let client = HttpPortalClient::new("http://127.0.0.1:9", 1).unwrap();
        assert!(matches!(client.patients(), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn mock_requires_login() {
        let api = MockPortalClient::new(doctor(), "Secure123");
        assert!(matches!(api.current_user(), Err(ApiError::Unauthorized)));
        assert!(matches!(
            api.login(&login("sarah@clinic.in", "wrong")),
            Err(ApiError::Rejected(_))
        ));

        let session = api.login(&login("sarah@clinic.in", "Secure123")).unwrap();
        assert_eq!(session.user.id, "doc_1");
        assert_eq!(api.current_user().unwrap().name, "Dr. Sarah Johnson");
    }

    #[test]
    fn mock_otp_and_register() {
        let api = MockPortalClient::new(doctor(), "Secure123");
        assert!(api.request_otp("+91 98765 43210").is_ok());
        assert!(matches!(api.request_otp("+91 11111 22222"), Err(ApiError::NotFound(_))));

        let mut data = RegisterData {
            name: "Ravi Menon".into(),
            email: "sarah@clinic.in".into(),
            phone: "+91 90000 00000".into(),
            password: "Secure123".into(),
            role: UserRole::Doctor,
            specialization: None,
            license_number: None,
        };
        assert!(api.register(&data).is_err());
        data.email = "ravi@clinic.in".into();
        assert_eq!(api.register(&data).unwrap().name, "Ravi Menon");
    }

    #[test]
    fn mock_appointments_round_trip_through_queue() {
        let today = date(2024, 1, 15);
        let api = MockPortalClient::new(doctor(), "Secure123").with_appointments(vec![
            appointment("a1", today, time(9, 0), AppointmentStatus::Waiting),
            appointment("a2", today, time(9, 30), AppointmentStatus::Scheduled),
        ]);
        api.login(&login("sarah@clinic.in", "Secure123")).unwrap();

        let mut bad = appointment("a3", today, time(10, 0), AppointmentStatus::Confirmed);
        bad.duration = 0;
        assert!(matches!(api.create_appointment(&bad), Err(ApiError::Rejected(_))));
        api.create_appointment(&appointment("a3", today, time(10, 0), AppointmentStatus::Confirmed))
            .unwrap();

        let store = crate::queue::QueueStore::from_appointments(api.appointments().unwrap(), today);
        let ids: Vec<_> = store.visible().iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }

    #[test]
    fn mock_availability_persists_template_rows() {
        let api = MockPortalClient::new(doctor(), "Secure123");
        api.login(&login("sarah@clinic.in", "Secure123")).unwrap();

        let template = AvailabilityTemplate::default();
        api.save_availability(&template.to_rows("doc_1")).unwrap();
        api.save_availability(&template.to_rows("doc_1")).unwrap();

        let rows = api.doctor_availability("doc_1").unwrap();
        assert_eq!(rows.len(), 7);
        assert!(api.doctor_availability("doc_2").unwrap().is_empty());

        let mut restored = AvailabilityTemplate::default();
        restored.apply_rows(&rows);
        assert_eq!(restored.days(), template.days());
    }

    #[test]
    fn mock_filters_by_patient() {
        let api = MockPortalClient::new(doctor(), "Secure123");
        api.login(&login("sarah@clinic.in", "Secure123")).unwrap();
        assert!(api.prescriptions("p1").unwrap().is_empty());
        assert!(api.medical_records("p1").unwrap().is_empty());
        assert_eq!(api.stats().unwrap(), DashboardStats::default());
    }
}
