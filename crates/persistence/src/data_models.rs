// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plain data carriers crossing the persistence boundary, plus the text
//! encodings used for dates and times in `SQLite`.
//!
//! Dates are stored as `YYYY-MM-DD`, times of day as `HH:MM`, and full
//! timestamps as RFC 3339 text. Session and payment-context expiries are
//! stored as Unix seconds so expiry comparisons stay integer valued.

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

use caissa_domain::{BillingCycle, Guardian, KnowledgeLevel, PaymentMethod, Plan};

use crate::error::PersistenceError;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");

/// An account row: identity and credentials for a guardian or admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountData {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: Option<String>,
}

/// A session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub user_id: i64,
    pub created_at: i64,
    pub expires_at: i64,
}

/// A guardian profile joined with its account row, for admin listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianAccountData {
    pub guardian: Guardian,
    pub email: String,
    pub name: String,
}

/// The resolved identity behind a valid session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalData {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    /// The guardian profile owned by this account, if one exists.
    /// Admin accounts typically have none.
    pub guardian_id: Option<i64>,
}

/// A stored payment retry context, keyed by an opaque token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentContextData {
    pub token: String,
    pub order_id: i64,
    pub guardian_email: String,
    pub plan_id: i64,
    pub billing_cycle: BillingCycle,
    pub created_at: i64,
    pub expires_at: i64,
}

/// Child fields collected during signup, before any row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChildData {
    pub name: String,
    pub birthdate: Option<Date>,
    pub knowledge_level: Option<KnowledgeLevel>,
    pub health_info: Option<String>,
    pub allow_media: bool,
}

/// Everything the single signup transaction needs.
///
/// The amount is computed by the caller before the transaction starts so
/// a later plan edit can never change what this signup is charged.
#[derive(Debug, Clone)]
pub struct SignupData {
    pub guardian_name: String,
    pub guardian_email: String,
    pub password: String,
    pub phone: String,
    pub allow_whatsapp_group: bool,
    pub plan: Plan,
    pub billing_cycle: BillingCycle,
    pub payment_method: PaymentMethod,
    pub children: Vec<NewChildData>,
    /// One enrollment is created per (child, workshop) pair, every child
    /// crossed with every workshop listed here.
    pub workshop_ids: Vec<i64>,
    pub amount_clp: i64,
    pub start_date: Option<Date>,
    pub terms_accepted_at: OffsetDateTime,
}

/// Identifiers produced by a successful signup transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupOutcome {
    pub user_id: i64,
    pub guardian_id: i64,
    pub subscription_id: i64,
    pub child_ids: Vec<i64>,
    pub order_id: i64,
    pub amount_clp: i64,
}

/// Formats a date as `YYYY-MM-DD` for storage.
pub(crate) fn format_date(date: Date) -> Result<String, PersistenceError> {
    date.format(&DATE_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Parses a stored `YYYY-MM-DD` date.
pub(crate) fn parse_date(text: &str) -> Result<Date, PersistenceError> {
    Date::parse(text, &DATE_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(format!("invalid date {text:?}: {e}")))
}

/// Formats a time of day as `HH:MM` for storage.
pub(crate) fn format_time(time: Time) -> Result<String, PersistenceError> {
    time.format(&TIME_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Parses a stored `HH:MM` time of day.
pub(crate) fn parse_time(text: &str) -> Result<Time, PersistenceError> {
    Time::parse(text, &TIME_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(format!("invalid time {text:?}: {e}")))
}

/// Formats a timestamp as RFC 3339 text for storage.
pub(crate) fn format_timestamp(ts: OffsetDateTime) -> Result<String, PersistenceError> {
    ts.format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Parses a stored RFC 3339 timestamp.
pub(crate) fn parse_timestamp(text: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(text, &Rfc3339).map_err(|e| {
        PersistenceError::SerializationError(format!("invalid timestamp {text:?}: {e}"))
    })
}

/// Narrows a domain `u32` into the `INTEGER` column type.
pub(crate) fn to_db_u32(value: u32) -> Result<i32, PersistenceError> {
    i32::try_from(value).map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Widens an `INTEGER` column back into a domain `u32`.
pub(crate) fn from_db_u32(value: i32) -> Result<u32, PersistenceError> {
    u32::try_from(value).map_err(|e| PersistenceError::SerializationError(e.to_string()))
}
