// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Guardian and child queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use caissa_domain::{Child, Guardian, KnowledgeLevel};

use crate::data_models::{GuardianAccountData, parse_date};
use crate::diesel_schema::{children, guardians, users};
use crate::error::PersistenceError;

/// Diesel Queryable struct for guardian rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = guardians)]
struct GuardianRow {
    guardian_id: i64,
    user_id: i64,
    phone: String,
    allow_whatsapp_group: i32,
}

/// Diesel Queryable struct for child rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = children)]
struct ChildRow {
    child_id: i64,
    guardian_id: i64,
    name: String,
    birthdate: Option<String>,
    knowledge_level: Option<String>,
    health_info: Option<String>,
    allow_media: i32,
}

impl GuardianRow {
    fn into_domain(self) -> Guardian {
        Guardian {
            guardian_id: Some(self.guardian_id),
            user_id: self.user_id,
            phone: self.phone,
            allow_whatsapp_group: self.allow_whatsapp_group != 0,
        }
    }
}

impl ChildRow {
    fn into_domain(self) -> Result<Child, PersistenceError> {
        Ok(Child {
            child_id: Some(self.child_id),
            guardian_id: self.guardian_id,
            name: self.name,
            birthdate: self.birthdate.as_deref().map(parse_date).transpose()?,
            knowledge_level: self
                .knowledge_level
                .as_deref()
                .map(str::parse::<KnowledgeLevel>)
                .transpose()
                .map_err(|e| PersistenceError::SerializationError(e.to_string()))?,
            health_info: self.health_info,
            allow_media: self.allow_media != 0,
        })
    }
}

/// Retrieves a guardian by ID.
///
/// # Errors
///
/// Returns an error if the guardian does not exist or the query fails.
pub fn get_guardian(
    conn: &mut SqliteConnection,
    guardian_id: i64,
) -> Result<Guardian, PersistenceError> {
    debug!("Looking up guardian ID: {}", guardian_id);

    let row: GuardianRow = guardians::table
        .filter(guardians::guardian_id.eq(guardian_id))
        .select(GuardianRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Guardian {guardian_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    Ok(row.into_domain())
}

/// Retrieves the guardian profile owned by an account, if any.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_guardian_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Option<Guardian>, PersistenceError> {
    let result: Result<GuardianRow, diesel::result::Error> = guardians::table
        .filter(guardians::user_id.eq(user_id))
        .select(GuardianRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.into_domain())),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves the account email for a guardian.
///
/// # Errors
///
/// Returns an error if the guardian does not exist or the query fails.
pub fn guardian_email(
    conn: &mut SqliteConnection,
    guardian_id: i64,
) -> Result<String, PersistenceError> {
    guardians::table
        .inner_join(users::table)
        .filter(guardians::guardian_id.eq(guardian_id))
        .select(users::email)
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Guardian {guardian_id}"))
            }
            other => PersistenceError::from(other),
        })
}

/// Lists all guardian profiles joined with their account rows.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_guardians(
    conn: &mut SqliteConnection,
) -> Result<Vec<GuardianAccountData>, PersistenceError> {
    let rows: Vec<(GuardianRow, String, String)> = guardians::table
        .inner_join(users::table)
        .order(guardians::guardian_id.asc())
        .select((GuardianRow::as_select(), users::email, users::name))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(row, email, name)| GuardianAccountData {
            guardian: row.into_domain(),
            email,
            name,
        })
        .collect())
}

/// Retrieves a child by ID.
///
/// # Errors
///
/// Returns an error if the child does not exist or the query fails.
pub fn get_child(conn: &mut SqliteConnection, child_id: i64) -> Result<Child, PersistenceError> {
    debug!("Looking up child ID: {}", child_id);

    let row: ChildRow = children::table
        .filter(children::child_id.eq(child_id))
        .select(ChildRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Child {child_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.into_domain()
}

/// Lists all children of a guardian.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_children(
    conn: &mut SqliteConnection,
    guardian_id: i64,
) -> Result<Vec<Child>, PersistenceError> {
    let rows: Vec<ChildRow> = children::table
        .filter(children::guardian_id.eq(guardian_id))
        .order(children::child_id.asc())
        .select(ChildRow::as_select())
        .load(conn)?;

    rows.into_iter().map(ChildRow::into_domain).collect()
}
