use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same wire strings as `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentType {
    Consultation => "consultation",
    FollowUp => "follow-up",
    Emergency => "emergency",
    Checkup => "checkup",
});

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    InProgress => "in-progress",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no-show",
    Waiting => "waiting",
});

str_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

str_enum!(VisitKind {
    Clinic => "clinic",
    Personal => "personal",
});

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(UserRole {
    Doctor => "doctor",
    Receptionist => "receptionist",
    Admin => "admin",
});

str_enum!(RecordType {
    Consultation => "consultation",
    LabReport => "lab-report",
    Imaging => "imaging",
    Procedure => "procedure",
});

str_enum!(NotificationType {
    Appointment => "appointment",
    Cancellation => "cancellation",
    Reminder => "reminder",
    Urgent => "urgent",
    System => "system",
});

str_enum!(CalendarEventType {
    Appointment => "appointment",
    Break => "break",
    Unavailable => "unavailable",
});

str_enum!(LeaveStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl AppointmentStatus {
    /// Statuses that put an appointment into today's waiting line.
    pub fn is_queueable(&self) -> bool {
        matches!(self, Self::Waiting | Self::Confirmed)
    }

    /// Still expected to happen (counted as pending on the dashboard).
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::Scheduled | Self::Confirmed | Self::Waiting | Self::InProgress
        )
    }
}

impl VisitKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clinic => "Clinic Visit",
            Self::Personal => "Personal Visit",
        }
    }
}
