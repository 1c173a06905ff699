// admin-client/src/render.rs
//! Plain-text rendering for the terminal front-end.
use chrono::NaiveDateTime;
use common::{Identity, Patient, StaffUser};
use std::fmt::Write;

use crate::guards::MenuEntry;
use crate::notification::{Notification, NotificationKind};
use crate::policy;
use crate::validation::ValidationErrors;
use crate::views::{AppointmentsState, DashboardState};

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut out = String::new();
    let _ = writeln!(out, "{}", line(headers, &widths));
    let _ = writeln!(out, "{}", line(rule.as_slice(), &widths));
    for row in rows {
        let _ = writeln!(out, "{}", line(row.as_slice(), &widths));
    }
    out
}

fn line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect();
    padded.join("  ").trim_end().to_string()
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

pub fn identity(identity: &Identity) -> String {
    let capabilities: Vec<String> = policy::capabilities(&identity.role)
        .iter()
        .map(|cap| cap.to_string())
        .collect();

    let mut out = format!("{} (id {}, role {})\n", identity.name, identity.id, identity.role);
    if capabilities.is_empty() {
        out.push_str("No permitted actions\n");
    } else {
        let _ = writeln!(out, "Permitted: {}", capabilities.join(", "));
    }
    out
}

pub fn menu(entries: &[MenuEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{} ({})", entry.label, entry.route))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Today's appointments with the status the service stored
pub fn dashboard(state: &DashboardState) -> String {
    if let Some(error) = &state.error {
        return format!("{}\n", error);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Total patients:     {}", state.stats.total_patients);
    let _ = writeln!(out, "Total appointments: {}", state.stats.total_appointments);
    let _ = writeln!(out, "Total users:        {}", state.stats.total_users);
    out.push('\n');

    if state.today_appointments.is_empty() {
        out.push_str("No appointments scheduled for today.\n");
        return out;
    }

    let rows: Vec<Vec<String>> = state
        .today_appointments
        .iter()
        .map(|a| {
            vec![
                or_dash(a.time.as_deref()),
                a.patient_name.clone(),
                or_dash(a.persisted_status.as_deref()),
            ]
        })
        .collect();
    out.push_str(&table(&["Time", "Patient", "Status"], &rows));
    out
}

/// Appointment list; status is derived from `now`
pub fn appointments(state: &AppointmentsState, now: NaiveDateTime) -> String {
    if let Some(error) = &state.error {
        return format!("{}\n", error);
    }
    if state.appointments.is_empty() {
        return "No appointments.\n".to_string();
    }

    let rows: Vec<Vec<String>> = state
        .rows(now)
        .iter()
        .map(|row| {
            vec![
                row.appointment.id.to_string(),
                row.appointment.patient_name.clone(),
                or_dash(row.appointment.date_part()),
                or_dash(row.appointment.time.as_deref()),
                row.status.to_string(),
            ]
        })
        .collect();
    table(&["ID", "Patient", "Date", "Time", "Status"], &rows)
}

pub fn patients(patients: &[Patient]) -> String {
    if patients.is_empty() {
        return "No patients.\n".to_string();
    }

    let rows: Vec<Vec<String>> = patients
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                or_dash(p.email.as_deref()),
                or_dash(p.phone.as_deref()),
            ]
        })
        .collect();
    table(&["ID", "Name", "Email", "Phone"], &rows)
}

pub fn patient(patient: &Patient) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Patient #{}", patient.id);
    let _ = writeln!(out, "  Name:          {}", patient.name);
    let _ = writeln!(out, "  Email:         {}", or_dash(patient.email.as_deref()));
    let _ = writeln!(out, "  Phone:         {}", or_dash(patient.phone.as_deref()));
    let _ = writeln!(out, "  Date of birth: {}", or_dash(patient.date_of_birth.as_deref()));
    out
}

pub fn users(users: &[StaffUser]) -> String {
    if users.is_empty() {
        return "No users.\n".to_string();
    }

    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| vec![u.id.to_string(), u.name.clone(), u.email.clone(), u.role.clone()])
        .collect();
    table(&["ID", "Name", "Email", "Role"], &rows)
}

pub fn validation(errors: &ValidationErrors) -> String {
    errors
        .fields()
        .map(|(field, message)| format!("  {}: {}\n", field, message))
        .collect()
}

pub fn notification(notification: &Notification) -> String {
    match notification.kind {
        NotificationKind::Success => format!("[ok] {}", notification.message),
        NotificationKind::Error => format!("[error] {}", notification.message),
    }
}
