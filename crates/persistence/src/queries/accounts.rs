// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account and session queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use crate::data_models::{AccountData, SessionData};
use crate::diesel_schema::{sessions, users};
use crate::error::PersistenceError;

/// Diesel Queryable struct for account rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
struct AccountRow {
    user_id: i64,
    email: String,
    name: String,
    password_hash: String,
    is_admin: i32,
    created_at: Option<String>,
}

/// Diesel Queryable struct for session rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = sessions)]
struct SessionRow {
    session_id: i64,
    session_token: String,
    user_id: i64,
    created_at: i64,
    expires_at: i64,
}

impl AccountRow {
    fn into_data(self) -> AccountData {
        AccountData {
            user_id: self.user_id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            is_admin: self.is_admin != 0,
            created_at: self.created_at,
        }
    }
}

/// Retrieves an account by email.
///
/// The email is normalized to lowercase for case-insensitive lookup.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no account exists for the email.
pub fn find_account_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<AccountData>, PersistenceError> {
    let normalized_email: String = email.trim().to_lowercase();

    debug!("Looking up account by email: {}", normalized_email);

    let result: Result<AccountRow, diesel::result::Error> = users::table
        .filter(users::email.eq(&normalized_email))
        .select(AccountRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.into_data())),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves an account by ID.
///
/// # Errors
///
/// Returns an error if the account does not exist or the query fails.
pub fn get_account(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<AccountData, PersistenceError> {
    debug!("Looking up account by ID: {}", user_id);

    let row: AccountRow = users::table
        .filter(users::user_id.eq(user_id))
        .select(AccountRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::AccountNotFound(format!("user_id {user_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    Ok(row.into_data())
}

/// Retrieves a session by token.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the session is not found.
pub fn get_session_by_token(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<Option<SessionData>, PersistenceError> {
    let result: Result<SessionRow, diesel::result::Error> = sessions::table
        .filter(sessions::session_token.eq(session_token))
        .select(SessionRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(SessionData {
            session_id: row.session_id,
            session_token: row.session_token,
            user_id: row.user_id,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Verifies a password against a stored bcrypt hash.
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| PersistenceError::Other(format!("Failed to verify password: {e}")))
}
