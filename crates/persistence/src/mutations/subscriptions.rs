// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Subscription, enrollment, and order mutations.
//!
//! The central entry point is [`persist_subscription_state`]: it diffs an
//! aggregate produced by the core transition function against the database
//! by id. Rows with `None` ids are inserted and receive their ids; rows
//! with `Some` ids are updated in place. The whole diff runs in one
//! transaction.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use caissa::SubscriptionState;
use caissa_domain::{Enrollment, Order, Subscription};

use crate::data_models::{format_date, format_timestamp};
use crate::diesel_schema::{enrollments, orders, subscriptions};
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;

/// Creates a subscription row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_subscription(
    conn: &mut SqliteConnection,
    subscription: &Subscription,
) -> Result<i64, PersistenceError> {
    info!(
        "Creating subscription for guardian ID: {}",
        subscription.guardian_id
    );

    let end_date: Option<String> = subscription.end_date.map(format_date).transpose()?;
    let terms_accepted_at: Option<String> = subscription
        .terms_accepted_at
        .map(format_timestamp)
        .transpose()?;

    diesel::insert_into(subscriptions::table)
        .values((
            subscriptions::guardian_id.eq(subscription.guardian_id),
            subscriptions::plan_id.eq(subscription.plan_id),
            subscriptions::billing_cycle.eq(subscription.billing_cycle.as_str()),
            subscriptions::status.eq(subscription.status.as_str()),
            subscriptions::start_date.eq(format_date(subscription.start_date)?),
            subscriptions::end_date.eq(end_date),
            subscriptions::terms_accepted_at.eq(terms_accepted_at),
        ))
        .execute(conn)?;

    let subscription_id: i64 = get_last_insert_rowid(conn)?;

    info!(subscription_id, "Subscription created successfully");

    Ok(subscription_id)
}

/// Updates the mutable fields of a subscription row.
///
/// # Errors
///
/// Returns an error if the subscription carries no id or does not exist.
pub fn update_subscription(
    conn: &mut SqliteConnection,
    subscription: &Subscription,
) -> Result<(), PersistenceError> {
    let subscription_id: i64 = subscription.subscription_id.ok_or_else(|| {
        PersistenceError::MissingIdentifier("Subscription has no subscription_id".to_string())
    })?;

    debug!("Updating subscription ID: {}", subscription_id);

    let end_date: Option<String> = subscription.end_date.map(format_date).transpose()?;
    let terms_accepted_at: Option<String> = subscription
        .terms_accepted_at
        .map(format_timestamp)
        .transpose()?;

    let updated: usize = diesel::update(subscriptions::table)
        .filter(subscriptions::subscription_id.eq(subscription_id))
        .set((
            subscriptions::billing_cycle.eq(subscription.billing_cycle.as_str()),
            subscriptions::status.eq(subscription.status.as_str()),
            subscriptions::start_date.eq(format_date(subscription.start_date)?),
            subscriptions::end_date.eq(end_date),
            subscriptions::terms_accepted_at.eq(terms_accepted_at),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Subscription {subscription_id}"
        )));
    }

    Ok(())
}

/// Inserts an enrollment row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_enrollment(
    conn: &mut SqliteConnection,
    enrollment: &Enrollment,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(enrollments::table)
        .values((
            enrollments::subscription_id.eq(enrollment.subscription_id),
            enrollments::child_id.eq(enrollment.child_id),
            enrollments::workshop_id.eq(enrollment.workshop_id),
            enrollments::status.eq(enrollment.status.as_str()),
            enrollments::notes.eq(&enrollment.notes),
        ))
        .execute(conn)?;

    let enrollment_id: i64 = get_last_insert_rowid(conn)?;

    Ok(enrollment_id)
}

/// Updates the mutable fields of an enrollment row.
///
/// The (subscription, child, workshop) binding is immutable once
/// persisted; a move creates a new row instead.
///
/// # Errors
///
/// Returns an error if the enrollment carries no id or does not exist.
pub fn update_enrollment(
    conn: &mut SqliteConnection,
    enrollment: &Enrollment,
) -> Result<(), PersistenceError> {
    let enrollment_id: i64 = enrollment.enrollment_id.ok_or_else(|| {
        PersistenceError::MissingIdentifier("Enrollment has no enrollment_id".to_string())
    })?;

    let updated: usize = diesel::update(enrollments::table)
        .filter(enrollments::enrollment_id.eq(enrollment_id))
        .set((
            enrollments::status.eq(enrollment.status.as_str()),
            enrollments::notes.eq(&enrollment.notes),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Enrollment {enrollment_id}"
        )));
    }

    Ok(())
}

/// Inserts an order row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_order(conn: &mut SqliteConnection, order: &Order) -> Result<i64, PersistenceError> {
    diesel::insert_into(orders::table)
        .values((
            orders::subscription_id.eq(order.subscription_id),
            orders::amount_clp.eq(order.amount_clp),
            orders::payment_method.eq(order.payment_method.as_str()),
            orders::payment_status.eq(order.payment_status.as_str()),
            orders::currency.eq(&order.currency),
            orders::detail.eq(&order.detail),
            orders::external_id.eq(&order.external_id),
        ))
        .execute(conn)?;

    let order_id: i64 = get_last_insert_rowid(conn)?;

    info!(order_id, "Order created successfully");

    Ok(order_id)
}

/// Updates the mutable fields of an order row.
///
/// The amount, method, and currency are fixed at creation; only the
/// status and gateway bookkeeping fields change afterwards.
///
/// # Errors
///
/// Returns an error if the order carries no id or does not exist.
pub fn update_order(conn: &mut SqliteConnection, order: &Order) -> Result<(), PersistenceError> {
    let order_id: i64 = order
        .order_id
        .ok_or_else(|| PersistenceError::MissingIdentifier("Order has no order_id".to_string()))?;

    debug!("Updating order ID: {}", order_id);

    let updated: usize = diesel::update(orders::table)
        .filter(orders::order_id.eq(order_id))
        .set((
            orders::payment_status.eq(order.payment_status.as_str()),
            orders::detail.eq(&order.detail),
            orders::external_id.eq(&order.external_id),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Order {order_id}")));
    }

    Ok(())
}

/// Persists an aggregate produced by the core transition function.
///
/// Runs in one transaction: the subscription row is updated, enrollments
/// and orders with `None` ids are inserted, the rest are updated. Returns
/// the aggregate with every id filled in.
///
/// # Errors
///
/// Returns an error if any part of the diff fails; the transaction is
/// rolled back.
pub fn persist_subscription_state(
    conn: &mut SqliteConnection,
    state: &SubscriptionState,
) -> Result<SubscriptionState, PersistenceError> {
    let subscription_id: i64 = state.subscription.subscription_id.ok_or_else(|| {
        PersistenceError::MissingIdentifier("Subscription has no subscription_id".to_string())
    })?;

    debug!("Persisting aggregate for subscription ID: {}", subscription_id);

    conn.transaction::<SubscriptionState, PersistenceError, _>(|conn| {
        update_subscription(conn, &state.subscription)?;

        let mut persisted: SubscriptionState = state.clone();

        for enrollment in &mut persisted.enrollments {
            if enrollment.enrollment_id.is_none() {
                enrollment.enrollment_id = Some(insert_enrollment(conn, enrollment)?);
            } else {
                update_enrollment(conn, enrollment)?;
            }
        }

        for order in &mut persisted.orders {
            if order.order_id.is_none() {
                order.order_id = Some(insert_order(conn, order)?);
            } else {
                update_order(conn, order)?;
            }
        }

        Ok(persisted)
    })
}
