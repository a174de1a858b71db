// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Guardian and child mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::info;

use caissa_domain::{Child, Guardian, KnowledgeLevel};

use crate::data_models::{NewChildData, format_date};
use crate::diesel_schema::{children, guardians, users};
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;

/// Creates a guardian profile for an account.
///
/// # Errors
///
/// Returns an error if the account does not exist or already has a
/// guardian profile.
pub fn create_guardian(
    conn: &mut SqliteConnection,
    user_id: i64,
    phone: &str,
    allow_whatsapp_group: bool,
) -> Result<i64, PersistenceError> {
    info!("Creating guardian for user ID: {}", user_id);

    diesel::insert_into(guardians::table)
        .values((
            guardians::user_id.eq(user_id),
            guardians::phone.eq(phone),
            guardians::allow_whatsapp_group.eq(i32::from(allow_whatsapp_group)),
        ))
        .execute(conn)?;

    let guardian_id: i64 = get_last_insert_rowid(conn)?;

    info!(guardian_id, "Guardian created successfully");

    Ok(guardian_id)
}

/// Updates a guardian's profile fields.
///
/// # Errors
///
/// Returns an error if the guardian carries no id or does not exist.
pub fn update_guardian(
    conn: &mut SqliteConnection,
    guardian: &Guardian,
) -> Result<(), PersistenceError> {
    let guardian_id: i64 = guardian.guardian_id.ok_or_else(|| {
        PersistenceError::MissingIdentifier("Guardian has no guardian_id".to_string())
    })?;

    let updated: usize = diesel::update(guardians::table)
        .filter(guardians::guardian_id.eq(guardian_id))
        .set((
            guardians::phone.eq(&guardian.phone),
            guardians::allow_whatsapp_group.eq(i32::from(guardian.allow_whatsapp_group)),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Guardian {guardian_id}"
        )));
    }

    Ok(())
}

/// Deletes a guardian by removing the owning account row.
///
/// Foreign key cascades remove the guardian profile, its children, its
/// subscriptions, and everything under them.
///
/// # Errors
///
/// Returns an error if the guardian does not exist or the delete fails.
pub fn delete_guardian(
    conn: &mut SqliteConnection,
    guardian_id: i64,
) -> Result<(), PersistenceError> {
    info!("Deleting guardian ID: {}", guardian_id);

    let user_id: i64 = guardians::table
        .filter(guardians::guardian_id.eq(guardian_id))
        .select(guardians::user_id)
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Guardian {guardian_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    diesel::delete(users::table)
        .filter(users::user_id.eq(user_id))
        .execute(conn)?;

    Ok(())
}

/// Creates a child under a guardian.
///
/// # Errors
///
/// Returns an error if the guardian does not exist or the insert fails.
pub fn create_child(
    conn: &mut SqliteConnection,
    guardian_id: i64,
    child: &NewChildData,
) -> Result<i64, PersistenceError> {
    info!("Creating child for guardian ID: {}", guardian_id);

    let birthdate: Option<String> = child.birthdate.map(format_date).transpose()?;

    diesel::insert_into(children::table)
        .values((
            children::guardian_id.eq(guardian_id),
            children::name.eq(&child.name),
            children::birthdate.eq(birthdate),
            children::knowledge_level
                .eq(child.knowledge_level.as_ref().map(KnowledgeLevel::as_str)),
            children::health_info.eq(&child.health_info),
            children::allow_media.eq(i32::from(child.allow_media)),
        ))
        .execute(conn)?;

    let child_id: i64 = get_last_insert_rowid(conn)?;

    Ok(child_id)
}

/// Updates a child's profile fields.
///
/// The owning guardian never changes; children are not transferable
/// between guardians.
///
/// # Errors
///
/// Returns an error if the child carries no id or does not exist.
pub fn update_child(conn: &mut SqliteConnection, child: &Child) -> Result<(), PersistenceError> {
    let child_id: i64 = child
        .child_id
        .ok_or_else(|| PersistenceError::MissingIdentifier("Child has no child_id".to_string()))?;

    let birthdate: Option<String> = child.birthdate.map(format_date).transpose()?;

    let updated: usize = diesel::update(children::table)
        .filter(children::child_id.eq(child_id))
        .set((
            children::name.eq(&child.name),
            children::birthdate.eq(birthdate),
            children::knowledge_level
                .eq(child.knowledge_level.as_ref().map(KnowledgeLevel::as_str)),
            children::health_info.eq(&child.health_info),
            children::allow_media.eq(i32::from(child.allow_media)),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Child {child_id}")));
    }

    Ok(())
}

/// Deletes a child. Cascades remove the child's enrollment history.
///
/// # Errors
///
/// Returns an error if the child does not exist or the delete fails.
pub fn delete_child(conn: &mut SqliteConnection, child_id: i64) -> Result<(), PersistenceError> {
    info!("Deleting child ID: {}", child_id);

    let deleted: usize = diesel::delete(children::table)
        .filter(children::child_id.eq(child_id))
        .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!("Child {child_id}")));
    }

    Ok(())
}
