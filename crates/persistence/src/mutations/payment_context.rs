// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Payment retry context storage.
//!
//! When a gateway handoff starts, the API layer stores a small keyed
//! context so the return leg can rehydrate the flow without trusting
//! anything the gateway echoes back. Contexts are single-use: consuming
//! one deletes it. Expired contexts are rejected and deleted on read.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::debug;

use caissa_domain::BillingCycle;

use crate::data_models::PaymentContextData;
use crate::diesel_schema::payment_contexts;
use crate::error::PersistenceError;

/// Diesel Queryable struct for payment context rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = payment_contexts)]
struct PaymentContextRow {
    token: String,
    order_id: i64,
    guardian_email: String,
    plan_id: i64,
    billing_cycle: String,
    created_at: i64,
    expires_at: i64,
}

/// Stores a payment retry context under a caller-generated token.
///
/// # Arguments
///
/// * `ttl_seconds` - How long the context stays consumable
///
/// # Errors
///
/// Returns an error if the insert fails, including a token collision.
pub fn store_payment_context(
    conn: &mut SqliteConnection,
    token: &str,
    order_id: i64,
    guardian_email: &str,
    plan_id: i64,
    billing_cycle: BillingCycle,
    ttl_seconds: i64,
) -> Result<(), PersistenceError> {
    debug!("Storing payment context for order ID: {}", order_id);

    let created_at: i64 = OffsetDateTime::now_utc().unix_timestamp();

    diesel::insert_into(payment_contexts::table)
        .values((
            payment_contexts::token.eq(token),
            payment_contexts::order_id.eq(order_id),
            payment_contexts::guardian_email.eq(guardian_email),
            payment_contexts::plan_id.eq(plan_id),
            payment_contexts::billing_cycle.eq(billing_cycle.as_str()),
            payment_contexts::created_at.eq(created_at),
            payment_contexts::expires_at.eq(created_at + ttl_seconds),
        ))
        .execute(conn)?;

    Ok(())
}

/// Consumes a payment retry context: reads it and deletes it.
///
/// # Errors
///
/// Returns `PaymentContextNotFound` for an unknown token and
/// `PaymentContextExpired` for a stale one. An expired context is
/// deleted as part of the rejection.
pub fn consume_payment_context(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<PaymentContextData, PersistenceError> {
    let result: Result<PaymentContextRow, diesel::result::Error> = payment_contexts::table
        .filter(payment_contexts::token.eq(token))
        .select(PaymentContextRow::as_select())
        .first(conn);

    let row: PaymentContextRow = match result {
        Ok(row) => row,
        Err(diesel::result::Error::NotFound) => {
            return Err(PersistenceError::PaymentContextNotFound(token.to_string()));
        }
        Err(e) => return Err(PersistenceError::from(e)),
    };

    diesel::delete(payment_contexts::table)
        .filter(payment_contexts::token.eq(token))
        .execute(conn)?;

    let now: i64 = OffsetDateTime::now_utc().unix_timestamp();
    if row.expires_at < now {
        return Err(PersistenceError::PaymentContextExpired(token.to_string()));
    }

    let billing_cycle: BillingCycle = row
        .billing_cycle
        .parse()
        .map_err(|e: caissa_domain::DomainError| {
            PersistenceError::SerializationError(e.to_string())
        })?;

    Ok(PaymentContextData {
        token: row.token,
        order_id: row.order_id,
        guardian_email: row.guardian_email,
        plan_id: row.plan_id,
        billing_cycle,
        created_at: row.created_at,
        expires_at: row.expires_at,
    })
}

/// Deletes all contexts that expired before `now` (Unix seconds).
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_payment_contexts(
    conn: &mut SqliteConnection,
    now: i64,
) -> Result<usize, PersistenceError> {
    let deleted: usize = diesel::delete(payment_contexts::table)
        .filter(payment_contexts::expires_at.lt(now))
        .execute(conn)?;

    if deleted > 0 {
        debug!("Deleted {} expired payment contexts", deleted);
    }

    Ok(deleted)
}
