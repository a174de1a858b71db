// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plan and workshop catalog mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::info;

use caissa_domain::{Plan, Workshop};

use crate::data_models::{format_time, to_db_u32};
use crate::diesel_schema::{plans, workshops};
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;

/// Creates a new plan.
///
/// # Errors
///
/// Returns an error if the plan cannot be created, including when the
/// plan name already exists.
pub fn create_plan(conn: &mut SqliteConnection, plan: &Plan) -> Result<i64, PersistenceError> {
    info!("Creating plan: {}", plan.name);

    diesel::insert_into(plans::table)
        .values((
            plans::name.eq(&plan.name),
            plans::max_children.eq(to_db_u32(plan.max_children)?),
            plans::max_workshops_per_child.eq(to_db_u32(plan.max_workshops_per_child)?),
            plans::price_monthly.eq(plan.price_monthly),
            plans::quarterly_discount_pct.eq(to_db_u32(plan.quarterly_discount_pct)?),
            plans::is_active.eq(i32::from(plan.is_active)),
        ))
        .execute(conn)?;

    let plan_id: i64 = get_last_insert_rowid(conn)?;

    info!(plan_id, "Plan created successfully");

    Ok(plan_id)
}

/// Updates an existing plan.
///
/// Plan edits never touch already-created orders; amounts are computed
/// once at order-creation time.
///
/// # Errors
///
/// Returns an error if the plan carries no id or does not exist.
pub fn update_plan(conn: &mut SqliteConnection, plan: &Plan) -> Result<(), PersistenceError> {
    let plan_id: i64 = plan
        .plan_id
        .ok_or_else(|| PersistenceError::MissingIdentifier("Plan has no plan_id".to_string()))?;

    info!("Updating plan ID: {}", plan_id);

    let updated: usize = diesel::update(plans::table)
        .filter(plans::plan_id.eq(plan_id))
        .set((
            plans::name.eq(&plan.name),
            plans::max_children.eq(to_db_u32(plan.max_children)?),
            plans::max_workshops_per_child.eq(to_db_u32(plan.max_workshops_per_child)?),
            plans::price_monthly.eq(plan.price_monthly),
            plans::quarterly_discount_pct.eq(to_db_u32(plan.quarterly_discount_pct)?),
            plans::is_active.eq(i32::from(plan.is_active)),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Plan {plan_id}")));
    }

    Ok(())
}

/// Toggles a plan's active flag.
///
/// Deactivation hides the plan from the public catalog; existing
/// subscriptions on the plan are untouched.
///
/// # Errors
///
/// Returns an error if the plan does not exist or the update fails.
pub fn set_plan_active(
    conn: &mut SqliteConnection,
    plan_id: i64,
    active: bool,
) -> Result<(), PersistenceError> {
    info!("Setting plan ID {} active = {}", plan_id, active);

    let updated: usize = diesel::update(plans::table)
        .filter(plans::plan_id.eq(plan_id))
        .set(plans::is_active.eq(i32::from(active)))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Plan {plan_id}")));
    }

    Ok(())
}

/// Deletes a plan.
///
/// Fails at the database level if any subscription still references the
/// plan; deactivation is the supported way to retire a plan in use.
///
/// # Errors
///
/// Returns an error if the plan does not exist or is still referenced.
pub fn delete_plan(conn: &mut SqliteConnection, plan_id: i64) -> Result<(), PersistenceError> {
    info!("Deleting plan ID: {}", plan_id);

    let deleted: usize = diesel::delete(plans::table)
        .filter(plans::plan_id.eq(plan_id))
        .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!("Plan {plan_id}")));
    }

    Ok(())
}

/// Creates a new workshop.
///
/// # Errors
///
/// Returns an error if the workshop cannot be created.
pub fn create_workshop(
    conn: &mut SqliteConnection,
    workshop: &Workshop,
) -> Result<i64, PersistenceError> {
    info!("Creating workshop: {}", workshop.name);

    let end_time: Option<String> = workshop.end_time.map(format_time).transpose()?;
    let capacity: Option<i32> = workshop.capacity.map(to_db_u32).transpose()?;

    diesel::insert_into(workshops::table)
        .values((
            workshops::name.eq(&workshop.name),
            workshops::day_of_week.eq(workshop.day_of_week.as_str()),
            workshops::start_time.eq(format_time(workshop.start_time)?),
            workshops::end_time.eq(end_time),
            workshops::address.eq(&workshop.address),
            workshops::capacity.eq(capacity),
            workshops::is_active.eq(i32::from(workshop.is_active)),
        ))
        .execute(conn)?;

    let workshop_id: i64 = get_last_insert_rowid(conn)?;

    info!(workshop_id, "Workshop created successfully");

    Ok(workshop_id)
}

/// Updates an existing workshop.
///
/// # Errors
///
/// Returns an error if the workshop carries no id or does not exist.
pub fn update_workshop(
    conn: &mut SqliteConnection,
    workshop: &Workshop,
) -> Result<(), PersistenceError> {
    let workshop_id: i64 = workshop.workshop_id.ok_or_else(|| {
        PersistenceError::MissingIdentifier("Workshop has no workshop_id".to_string())
    })?;

    info!("Updating workshop ID: {}", workshop_id);

    let end_time: Option<String> = workshop.end_time.map(format_time).transpose()?;
    let capacity: Option<i32> = workshop.capacity.map(to_db_u32).transpose()?;

    let updated: usize = diesel::update(workshops::table)
        .filter(workshops::workshop_id.eq(workshop_id))
        .set((
            workshops::name.eq(&workshop.name),
            workshops::day_of_week.eq(workshop.day_of_week.as_str()),
            workshops::start_time.eq(format_time(workshop.start_time)?),
            workshops::end_time.eq(end_time),
            workshops::address.eq(&workshop.address),
            workshops::capacity.eq(capacity),
            workshops::is_active.eq(i32::from(workshop.is_active)),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Workshop {workshop_id}"
        )));
    }

    Ok(())
}

/// Toggles a workshop's active flag.
///
/// Deactivation hides the workshop from the public catalog and blocks
/// new enrollments; existing enrollments are untouched.
///
/// # Errors
///
/// Returns an error if the workshop does not exist or the update fails.
pub fn set_workshop_active(
    conn: &mut SqliteConnection,
    workshop_id: i64,
    active: bool,
) -> Result<(), PersistenceError> {
    info!("Setting workshop ID {} active = {}", workshop_id, active);

    let updated: usize = diesel::update(workshops::table)
        .filter(workshops::workshop_id.eq(workshop_id))
        .set(workshops::is_active.eq(i32::from(active)))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Workshop {workshop_id}"
        )));
    }

    Ok(())
}

/// Deletes a workshop.
///
/// Fails at the database level if any enrollment still references the
/// workshop.
///
/// # Errors
///
/// Returns an error if the workshop does not exist or is still referenced.
pub fn delete_workshop(
    conn: &mut SqliteConnection,
    workshop_id: i64,
) -> Result<(), PersistenceError> {
    info!("Deleting workshop ID: {}", workshop_id);

    let deleted: usize = diesel::delete(workshops::table)
        .filter(workshops::workshop_id.eq(workshop_id))
        .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Workshop {workshop_id}"
        )));
    }

    Ok(())
}
