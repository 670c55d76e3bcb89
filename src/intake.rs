//! Public intake: contact messages and appointment requests.
//!
//! Both forms are open to anonymous visitors, so input is validated here
//! before anything reaches the store. Rows are append-only from the public
//! side; only the admin surface lists them or moves an appointment through
//! its triage states.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::store::StoreClient;

const MESSAGES_TABLE: &str = "messages";
const APPOINTMENTS_TABLE: &str = "appointments";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Triage state of an appointment request. New requests always start
/// `Pending`; the admin surface moves them to `Confirmed` or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub service: String,
    #[serde(default)]
    pub notes: String,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Fields a visitor supplies when requesting an appointment. The triage
/// status is never client-controlled.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub service: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct Intake {
    store: StoreClient,
}

impl Intake {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    /// Store a contact-form message.
    pub async fn submit_message(&self, name: &str, email: &str, message: &str) -> AppResult<()> {
        validate_required(&[("name", name), ("email", email), ("message", message)])?;
        validate_email(email)?;

        let row = ContactMessage {
            id: None,
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            message: message.trim().to_string(),
            created_at: None,
        };
        self.store.insert(MESSAGES_TABLE, &[row]).await?;
        info!("Stored contact message from {}", email.trim());
        Ok(())
    }

    /// Store an appointment request in the `pending` state.
    pub async fn submit_appointment(&self, request: NewAppointment) -> AppResult<AppointmentRequest> {
        validate_required(&[
            ("name", &request.name),
            ("email", &request.email),
            ("phone", &request.phone),
            ("date", &request.date),
            ("service", &request.service),
        ])?;
        validate_email(&request.email)?;
        validate_date(&request.date)?;

        let row = AppointmentRequest {
            id: None,
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            date: request.date.trim().to_string(),
            service: request.service.trim().to_string(),
            notes: request.notes.trim().to_string(),
            status: AppointmentStatus::Pending,
            created_at: None,
        };
        self.store.insert(APPOINTMENTS_TABLE, &[row.clone()]).await?;
        info!("Stored appointment request from {}", row.email);
        Ok(row)
    }

    /// Newest-first listing for the admin inbox.
    pub async fn list_messages(&self) -> AppResult<Vec<ContactMessage>> {
        self.store.select(MESSAGES_TABLE, "created_at.desc").await
    }

    /// Newest-first listing for the admin appointment board.
    pub async fn list_appointments(&self) -> AppResult<Vec<AppointmentRequest>> {
        self.store.select(APPOINTMENTS_TABLE, "created_at.desc").await
    }

    /// Move an appointment out of triage. Only `confirmed` and `cancelled`
    /// are admin-assignable; `pending` is the birth state, not a target.
    pub async fn set_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> AppResult<()> {
        if status == AppointmentStatus::Pending {
            return Err(AppError::ValidationFailed(
                "appointments cannot be moved back to pending".to_string(),
            ));
        }
        self.store
            .update(
                APPOINTMENTS_TABLE,
                id,
                &serde_json::json!({ "status": status.as_str() }),
            )
            .await?;
        info!("Appointment {} marked {}", id, status.as_str());
        Ok(())
    }
}

fn validate_required(fields: &[(&str, &str)]) -> AppResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationFailed(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn validate_date(date: &str) -> AppResult<()> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::ValidationFailed(format!("date must be YYYY-MM-DD, got '{date}'"))
    })?;
    Ok(())
}

fn validate_email(email: &str) -> AppResult<()> {
    if email_regex().is_match(email.trim()) {
        Ok(())
    } else {
        Err(AppError::ValidationFailed(format!(
            "invalid email address: {email}"
        )))
    }
}

/// Count appointments per triage state, for the admin board header.
pub fn status_counts(appointments: &[AppointmentRequest]) -> HashMap<AppointmentStatus, usize> {
    let mut counts = HashMap::new();
    for appointment in appointments {
        *counts.entry(appointment.status).or_insert(0) += 1;
    }
    counts
}
