// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plan and workshop catalog queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use caissa_domain::{Plan, Workshop};

use crate::data_models::{from_db_u32, parse_time};
use crate::diesel_schema::{plans, workshops};
use crate::error::PersistenceError;

/// Diesel Queryable struct for plan rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = plans)]
pub(crate) struct PlanRow {
    plan_id: i64,
    name: String,
    max_children: i32,
    max_workshops_per_child: i32,
    price_monthly: i64,
    quarterly_discount_pct: i32,
    is_active: i32,
}

/// Diesel Queryable struct for workshop rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = workshops)]
pub(crate) struct WorkshopRow {
    workshop_id: i64,
    name: String,
    day_of_week: String,
    start_time: String,
    end_time: Option<String>,
    address: Option<String>,
    capacity: Option<i32>,
    is_active: i32,
}

impl PlanRow {
    pub(crate) fn into_domain(self) -> Result<Plan, PersistenceError> {
        Ok(Plan {
            plan_id: Some(self.plan_id),
            name: self.name,
            max_children: from_db_u32(self.max_children)?,
            max_workshops_per_child: from_db_u32(self.max_workshops_per_child)?,
            price_monthly: self.price_monthly,
            quarterly_discount_pct: from_db_u32(self.quarterly_discount_pct)?,
            is_active: self.is_active != 0,
        })
    }
}

impl WorkshopRow {
    pub(crate) fn into_domain(self) -> Result<Workshop, PersistenceError> {
        Ok(Workshop {
            workshop_id: Some(self.workshop_id),
            name: self.name,
            day_of_week: self
                .day_of_week
                .parse()
                .map_err(|e: caissa_domain::DomainError| {
                    PersistenceError::SerializationError(e.to_string())
                })?,
            start_time: parse_time(&self.start_time)?,
            end_time: self.end_time.as_deref().map(parse_time).transpose()?,
            address: self.address,
            capacity: self.capacity.map(from_db_u32).transpose()?,
            is_active: self.is_active != 0,
        })
    }
}

/// Retrieves a plan by ID.
///
/// # Errors
///
/// Returns an error if the plan does not exist or the query fails.
pub fn get_plan(conn: &mut SqliteConnection, plan_id: i64) -> Result<Plan, PersistenceError> {
    debug!("Looking up plan ID: {}", plan_id);

    let row: PlanRow = plans::table
        .filter(plans::plan_id.eq(plan_id))
        .select(PlanRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Plan {plan_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.into_domain()
}

/// Lists plans ordered by monthly price, cheapest first.
///
/// # Arguments
///
/// * `include_inactive` - When false, only active plans are returned
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_plans(
    conn: &mut SqliteConnection,
    include_inactive: bool,
) -> Result<Vec<Plan>, PersistenceError> {
    let mut query = plans::table.into_boxed();
    if !include_inactive {
        query = query.filter(plans::is_active.eq(1));
    }

    let rows: Vec<PlanRow> = query
        .order(plans::price_monthly.asc())
        .select(PlanRow::as_select())
        .load(conn)?;

    rows.into_iter().map(PlanRow::into_domain).collect()
}

/// Retrieves a workshop by ID.
///
/// # Errors
///
/// Returns an error if the workshop does not exist or the query fails.
pub fn get_workshop(
    conn: &mut SqliteConnection,
    workshop_id: i64,
) -> Result<Workshop, PersistenceError> {
    debug!("Looking up workshop ID: {}", workshop_id);

    let row: WorkshopRow = workshops::table
        .filter(workshops::workshop_id.eq(workshop_id))
        .select(WorkshopRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Workshop {workshop_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.into_domain()
}

/// Lists workshops in schedule order (weekday, then start time).
///
/// The weekday column is text, so the chronological sort happens here
/// rather than in SQL.
///
/// # Arguments
///
/// * `include_inactive` - When false, only active workshops are returned
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_workshops(
    conn: &mut SqliteConnection,
    include_inactive: bool,
) -> Result<Vec<Workshop>, PersistenceError> {
    let mut query = workshops::table.into_boxed();
    if !include_inactive {
        query = query.filter(workshops::is_active.eq(1));
    }

    let rows: Vec<WorkshopRow> = query.select(WorkshopRow::as_select()).load(conn)?;

    let mut result: Vec<Workshop> = rows
        .into_iter()
        .map(WorkshopRow::into_domain)
        .collect::<Result<_, _>>()?;
    result.sort_by_key(|w| (w.day_of_week.sort_index(), w.start_time));

    Ok(result)
}
