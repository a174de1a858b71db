// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Subscription, enrollment, and order queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use caissa::SubscriptionState;
use caissa_domain::{Enrollment, Order, PaymentStatus, Plan, Subscription};

use crate::data_models::{parse_date, parse_timestamp};
use crate::diesel_schema::{enrollments, orders, subscriptions};
use crate::error::PersistenceError;
use crate::queries::catalog;

/// Diesel Queryable struct for subscription rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = subscriptions)]
struct SubscriptionRow {
    subscription_id: i64,
    guardian_id: i64,
    plan_id: i64,
    billing_cycle: String,
    status: String,
    start_date: String,
    end_date: Option<String>,
    terms_accepted_at: Option<String>,
}

/// Diesel Queryable struct for enrollment rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = enrollments)]
struct EnrollmentRow {
    enrollment_id: i64,
    subscription_id: i64,
    child_id: i64,
    workshop_id: i64,
    status: String,
    notes: Option<String>,
}

/// Diesel Queryable struct for order rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = orders)]
struct OrderRow {
    order_id: i64,
    subscription_id: i64,
    amount_clp: i64,
    payment_method: String,
    payment_status: String,
    currency: String,
    detail: Option<String>,
    external_id: Option<String>,
}

fn serialization_error(e: caissa_domain::DomainError) -> PersistenceError {
    PersistenceError::SerializationError(e.to_string())
}

impl SubscriptionRow {
    fn into_domain(self) -> Result<Subscription, PersistenceError> {
        Ok(Subscription {
            subscription_id: Some(self.subscription_id),
            guardian_id: self.guardian_id,
            plan_id: self.plan_id,
            billing_cycle: self.billing_cycle.parse().map_err(serialization_error)?,
            status: self.status.parse().map_err(serialization_error)?,
            start_date: parse_date(&self.start_date)?,
            end_date: self.end_date.as_deref().map(parse_date).transpose()?,
            terms_accepted_at: self
                .terms_accepted_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

impl EnrollmentRow {
    fn into_domain(self) -> Result<Enrollment, PersistenceError> {
        Ok(Enrollment {
            enrollment_id: Some(self.enrollment_id),
            subscription_id: self.subscription_id,
            child_id: self.child_id,
            workshop_id: self.workshop_id,
            status: self.status.parse().map_err(serialization_error)?,
            notes: self.notes,
        })
    }
}

impl OrderRow {
    fn into_domain(self) -> Result<Order, PersistenceError> {
        Ok(Order {
            order_id: Some(self.order_id),
            subscription_id: self.subscription_id,
            amount_clp: self.amount_clp,
            payment_method: self.payment_method.parse().map_err(serialization_error)?,
            payment_status: self.payment_status.parse().map_err(serialization_error)?,
            currency: self.currency,
            detail: self.detail,
            external_id: self.external_id,
        })
    }
}

/// Retrieves a subscription by ID.
///
/// # Errors
///
/// Returns an error if the subscription does not exist or the query fails.
pub fn get_subscription(
    conn: &mut SqliteConnection,
    subscription_id: i64,
) -> Result<Subscription, PersistenceError> {
    debug!("Looking up subscription ID: {}", subscription_id);

    let row: SubscriptionRow = subscriptions::table
        .filter(subscriptions::subscription_id.eq(subscription_id))
        .select(SubscriptionRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Subscription {subscription_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.into_domain()
}

/// Lists all subscriptions, newest first. Used by the admin dashboard.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_subscriptions(
    conn: &mut SqliteConnection,
) -> Result<Vec<Subscription>, PersistenceError> {
    let rows: Vec<SubscriptionRow> = subscriptions::table
        .order(subscriptions::subscription_id.desc())
        .select(SubscriptionRow::as_select())
        .load(conn)?;

    rows.into_iter().map(SubscriptionRow::into_domain).collect()
}

/// Lists all subscriptions belonging to a guardian, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_subscriptions_for_guardian(
    conn: &mut SqliteConnection,
    guardian_id: i64,
) -> Result<Vec<Subscription>, PersistenceError> {
    let rows: Vec<SubscriptionRow> = subscriptions::table
        .filter(subscriptions::guardian_id.eq(guardian_id))
        .order(subscriptions::subscription_id.desc())
        .select(SubscriptionRow::as_select())
        .load(conn)?;

    rows.into_iter().map(SubscriptionRow::into_domain).collect()
}

/// Lists all enrollments under a subscription, including historical
/// `changed` and `canceled` rows.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_enrollments(
    conn: &mut SqliteConnection,
    subscription_id: i64,
) -> Result<Vec<Enrollment>, PersistenceError> {
    let rows: Vec<EnrollmentRow> = enrollments::table
        .filter(enrollments::subscription_id.eq(subscription_id))
        .order(enrollments::enrollment_id.asc())
        .select(EnrollmentRow::as_select())
        .load(conn)?;

    rows.into_iter().map(EnrollmentRow::into_domain).collect()
}

/// Retrieves an enrollment by ID.
///
/// # Errors
///
/// Returns an error if the enrollment does not exist or the query fails.
pub fn get_enrollment(
    conn: &mut SqliteConnection,
    enrollment_id: i64,
) -> Result<Enrollment, PersistenceError> {
    debug!("Looking up enrollment ID: {}", enrollment_id);

    let row: EnrollmentRow = enrollments::table
        .filter(enrollments::enrollment_id.eq(enrollment_id))
        .select(EnrollmentRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Enrollment {enrollment_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.into_domain()
}

/// Retrieves an order by ID.
///
/// # Errors
///
/// Returns an error if the order does not exist or the query fails.
pub fn get_order(conn: &mut SqliteConnection, order_id: i64) -> Result<Order, PersistenceError> {
    debug!("Looking up order ID: {}", order_id);

    let row: OrderRow = orders::table
        .filter(orders::order_id.eq(order_id))
        .select(OrderRow::as_select())
        .first(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                PersistenceError::NotFound(format!("Order {order_id}"))
            }
            other => PersistenceError::from(other),
        })?;

    row.into_domain()
}

/// Retrieves an order by its gateway-assigned token.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no order carries the token.
pub fn find_order_by_external_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<Option<Order>, PersistenceError> {
    let result: Result<OrderRow, diesel::result::Error> = orders::table
        .filter(orders::external_id.eq(external_id))
        .select(OrderRow::as_select())
        .first(conn);

    match result {
        Ok(row) => row.into_domain().map(Some),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists all orders under a subscription, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_orders_for_subscription(
    conn: &mut SqliteConnection,
    subscription_id: i64,
) -> Result<Vec<Order>, PersistenceError> {
    let rows: Vec<OrderRow> = orders::table
        .filter(orders::subscription_id.eq(subscription_id))
        .order(orders::order_id.desc())
        .select(OrderRow::as_select())
        .load(conn)?;

    rows.into_iter().map(OrderRow::into_domain).collect()
}

/// Lists all orders belonging to a guardian across their subscriptions,
/// newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_orders_for_guardian(
    conn: &mut SqliteConnection,
    guardian_id: i64,
) -> Result<Vec<Order>, PersistenceError> {
    let rows: Vec<OrderRow> = orders::table
        .inner_join(subscriptions::table)
        .filter(subscriptions::guardian_id.eq(guardian_id))
        .order(orders::order_id.desc())
        .select(OrderRow::as_select())
        .load(conn)?;

    rows.into_iter().map(OrderRow::into_domain).collect()
}

/// Lists all orders in a given payment status. Used by the admin
/// reconciliation view for pending transfers.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_orders_by_status(
    conn: &mut SqliteConnection,
    status: PaymentStatus,
) -> Result<Vec<Order>, PersistenceError> {
    let rows: Vec<OrderRow> = orders::table
        .filter(orders::payment_status.eq(status.as_str()))
        .order(orders::order_id.asc())
        .select(OrderRow::as_select())
        .load(conn)?;

    rows.into_iter().map(OrderRow::into_domain).collect()
}

/// Loads the full aggregate for a subscription: the subscription row,
/// its plan, and every enrollment and order under it.
///
/// # Errors
///
/// Returns an error if the subscription does not exist or any part of
/// the aggregate cannot be loaded.
pub fn load_subscription_state(
    conn: &mut SqliteConnection,
    subscription_id: i64,
) -> Result<SubscriptionState, PersistenceError> {
    let subscription: Subscription = get_subscription(conn, subscription_id)?;
    let plan: Plan = catalog::get_plan(conn, subscription.plan_id)?;
    let enrollment_rows: Vec<Enrollment> = list_enrollments(conn, subscription_id)?;
    let order_rows: Vec<Order> = list_orders_for_subscription(conn, subscription_id)?;

    Ok(SubscriptionState {
        subscription,
        plan,
        enrollments: enrollment_rows,
        orders: order_rows,
    })
}
