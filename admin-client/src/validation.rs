// admin-client/src/validation.rs
//! Form checks that run before anything is sent to the service.
use chrono::{NaiveDate, NaiveTime};
use common::{LoginRequest, NewAppointment, NewPatient, NewUser, Role};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Field name to message. Ordered so the output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// First message per field wins
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in self.fields.values() {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Login form: both fields are required
pub fn login(email: &str, password: &str) -> Result<LoginRequest, ValidationErrors> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ValidationErrors::single("form", "Email and password are required"));
    }
    Ok(LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Staff account form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl NewUserForm {
    pub fn validate(&self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim();
        let email = self.email.trim();

        if name.is_empty() {
            errors.add("name", "Name is required");
        }
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(email) {
            errors.add("email", "Invalid email format");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
        }
        if self.role.is_empty() {
            errors.add("role", "Role is required");
        } else if self.role.parse::<Role>().is_err() {
            errors.add("role", "Role must be one of admin, doctor, receptionist");
        }

        errors.into_result(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            role: self.role.clone(),
        })
    }
}

/// Appointment booking form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAppointmentForm {
    pub patient_id: Option<u64>,
    pub date: String,
    pub time: String,
}

impl NewAppointmentForm {
    pub fn validate(&self) -> Result<NewAppointment, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let date = self.date.trim();
        let time = self.time.trim();

        let patient_id = match self.patient_id {
            Some(id) if id > 0 => id,
            _ => {
                errors.add("patient_id", "Patient is required");
                0
            }
        };
        if date.is_empty() {
            errors.add("date", "Date is required");
        } else if date.len() != 10 || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            // Zero-padded only; dates are compared as strings
            errors.add("date", "Date must be YYYY-MM-DD");
        }
        if time.is_empty() {
            errors.add("time", "Time is required");
        } else if time.len() != 5 || NaiveTime::parse_from_str(time, "%H:%M").is_err() {
            errors.add("time", "Time must be HH:mm");
        }

        errors.into_result(NewAppointment {
            patient_id,
            date: date.to_string(),
            time: time.to_string(),
        })
    }
}

/// Patient registration form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPatientForm {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
}

impl NewPatientForm {
    pub fn validate(&self) -> Result<NewPatient, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = self.name.trim();
        let email = non_blank(&self.email);
        let date_of_birth = non_blank(&self.date_of_birth);

        if name.is_empty() {
            errors.add("name", "Name is required");
        }
        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.add("email", "Invalid email format");
            }
        }
        if let Some(dob) = &date_of_birth {
            if NaiveDate::parse_from_str(dob, "%Y-%m-%d").is_err() {
                errors.add("date_of_birth", "Date of birth must be YYYY-MM-DD");
            }
        }

        errors.into_result(NewPatient {
            name: name.to_string(),
            email,
            phone: non_blank(&self.phone),
            date_of_birth,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
