//! Client side of the portal REST service.
//!
//! Every response is wrapped in an [`ApiEnvelope`]. `PortalApi` is the seam
//! between the core and the transport: `HttpPortalClient` talks to the
//! service, `MockPortalClient` serves canned data in tests.

pub mod client;
pub mod error;

use serde::{Deserialize, Serialize};

pub use client::{HttpPortalClient, MockPortalClient, PortalApi};
pub use error::ApiError;

pub mod endpoints {
    pub const REQUEST_OTP: &str = "/requestOTP";
    pub const REGISTER: &str = "/register";
    pub const LOGIN: &str = "/login";
    pub const GET_USER: &str = "/me";
    pub const PATIENTS: &str = "/patients";
    pub const APPOINTMENTS: &str = "/appointments";
    pub const PRESCRIPTIONS: &str = "/prescriptions";
    pub const MEDICAL_RECORDS: &str = "/medical-records";
    pub const DOCTOR_AVAILABILITY: &str = "/doctor-availability";
    pub const NOTIFICATIONS: &str = "/notifications";
    pub const UPLOAD: &str = "/upload";
    pub const STATS: &str = "/stats";
}

/// Response wrapper used by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        self.data.ok_or(ApiError::MissingData)
    }
}
