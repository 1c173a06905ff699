// common/src/models/appointment.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Appointment as listed by `GET /appointments` and `GET /dashboard`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: u64,
    pub patient_id: u64,
    #[serde(default)]
    pub patient_name: String,
    /// Calendar date, `YYYY-MM-DD` or a longer ISO timestamp
    #[serde(default)]
    pub date: Option<String>,
    /// Venue-local wall-clock time, `HH:mm` or `HH:mm:ss`
    #[serde(default)]
    pub time: Option<String>,
    /// Status as stored by the service. The appointment list ignores it.
    #[serde(default, rename = "status")]
    pub persisted_status: Option<String>,
}

impl Appointment {
    /// The `YYYY-MM-DD` part of the date, if any
    pub fn date_part(&self) -> Option<&str> {
        self.date.as_deref().map(|d| d.get(..10).unwrap_or(d))
    }
}

/// Lifecycle state computed from an appointment's date and time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveStatus {
    Pending,
    Completed,
}

impl EffectiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectiveStatus::Pending => "pending",
            EffectiveStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EffectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /appointments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: u64,
    pub date: String,
    pub time: String,
}
