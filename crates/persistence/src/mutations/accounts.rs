// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account and session mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::diesel_schema::{sessions, users};
use crate::error::PersistenceError;
use crate::queries::accounts::find_account_by_email;
use crate::sqlite::get_last_insert_rowid;

/// Creates a new account.
///
/// The email is normalized to lowercase for case-insensitive uniqueness.
///
/// # Errors
///
/// Returns `DuplicateEmail` if an account already exists for the email,
/// or an error if the account cannot be created.
pub fn create_account(
    conn: &mut SqliteConnection,
    email: &str,
    name: &str,
    password: &str,
    is_admin: bool,
) -> Result<i64, PersistenceError> {
    let normalized_email: String = email.trim().to_lowercase();

    info!("Creating account for email: {}", normalized_email);

    if find_account_by_email(conn, &normalized_email)?.is_some() {
        return Err(PersistenceError::DuplicateEmail(normalized_email));
    }

    // Hash the password using bcrypt
    let password_hash: String = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))?;

    diesel::insert_into(users::table)
        .values((
            users::email.eq(&normalized_email),
            users::name.eq(name),
            users::password_hash.eq(&password_hash),
            users::is_admin.eq(i32::from(is_admin)),
            users::created_at.eq(diesel::dsl::sql::<
                diesel::sql_types::Nullable<diesel::sql_types::Text>,
            >("CURRENT_TIMESTAMP")),
        ))
        .execute(conn)?;

    let user_id: i64 = get_last_insert_rowid(conn)?;

    info!(user_id, "Account created successfully");

    Ok(user_id)
}

/// Creates a new session for an account.
///
/// # Arguments
///
/// * `session_token` - The unique session token
/// * `user_id` - The owning account
/// * `expires_at` - Expiry as Unix seconds
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn create_session(
    conn: &mut SqliteConnection,
    session_token: &str,
    user_id: i64,
    expires_at: i64,
) -> Result<i64, PersistenceError> {
    debug!("Creating session for user ID: {}", user_id);

    let created_at: i64 = OffsetDateTime::now_utc().unix_timestamp();

    diesel::insert_into(sessions::table)
        .values((
            sessions::session_token.eq(session_token),
            sessions::user_id.eq(user_id),
            sessions::created_at.eq(created_at),
            sessions::expires_at.eq(expires_at),
        ))
        .execute(conn)?;

    let session_id: i64 = get_last_insert_rowid(conn)?;

    Ok(session_id)
}

/// Deletes a session by token.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_session(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<(), PersistenceError> {
    diesel::delete(sessions::table)
        .filter(sessions::session_token.eq(session_token))
        .execute(conn)?;

    Ok(())
}

/// Deletes all sessions that expired before `now` (Unix seconds).
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_sessions(
    conn: &mut SqliteConnection,
    now: i64,
) -> Result<usize, PersistenceError> {
    let deleted: usize = diesel::delete(sessions::table)
        .filter(sessions::expires_at.lt(now))
        .execute(conn)?;

    if deleted > 0 {
        debug!("Deleted {} expired sessions", deleted);
    }

    Ok(deleted)
}
