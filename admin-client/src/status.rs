// admin-client/src/status.rs
//! Appointment lifecycle derived from date and time.
//!
//! The appointment list never trusts the stored status; it recomputes it on
//! every render. The dashboard shows the stored status instead. Both are kept
//! on purpose until the clinic decides which one is authoritative.
use chrono::NaiveDateTime;
use common::{Appointment, EffectiveStatus};

/// Status of an appointment at `now` (viewer-local wall clock).
///
/// Dates and times are compared as zero-padded `YYYY-MM-DD` and `HH:mm`
/// strings. An appointment is completed from its scheduled minute onwards.
/// A missing date reads as pending.
pub fn derive_status(date: Option<&str>, time: Option<&str>, now: NaiveDateTime) -> EffectiveStatus {
    let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(date) => date,
        None => return EffectiveStatus::Pending,
    };
    let date_part = date.get(..10).unwrap_or(date);
    let time = time.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("00:00");
    let time_part = time.get(..5).unwrap_or(time);

    let today = now.format("%Y-%m-%d").to_string();
    let now_hhmm = now.format("%H:%M").to_string();

    if date_part > today.as_str() {
        EffectiveStatus::Pending
    } else if date_part < today.as_str() {
        EffectiveStatus::Completed
    } else if time_part > now_hhmm.as_str() {
        EffectiveStatus::Pending
    } else {
        EffectiveStatus::Completed
    }
}

/// Convenience over [`derive_status`] for a listed appointment
pub fn effective_status(appointment: &Appointment, now: NaiveDateTime) -> EffectiveStatus {
    derive_status(appointment.date.as_deref(), appointment.time.as_deref(), now)
}
