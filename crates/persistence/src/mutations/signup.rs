// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The signup transaction.
//!
//! Signup is the one operation that creates rows across five tables at
//! once: account, guardian, children, subscription, enrollments, and the
//! first order. It runs in a single transaction so a capacity violation
//! on the last (child, workshop) pair leaves nothing behind.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::Date;
use tracing::info;

use caissa::{Command, CoreError, SubscriptionState, apply};
use caissa_domain::{Order, Subscription};

use crate::data_models::{SignupData, SignupOutcome};
use crate::error::PersistenceError;
use crate::mutations::{accounts, guardians, subscriptions};

/// Errors that can abort a signup.
///
/// Domain violations (capacity limits) are kept apart from storage
/// failures so the API layer can map them to different status codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupError {
    /// A capacity limit or other domain rule was violated.
    Domain(CoreError),
    /// A database operation failed.
    Storage(PersistenceError),
}

impl std::fmt::Display for SignupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "Signup rejected: {e}"),
            Self::Storage(e) => write!(f, "Signup failed: {e}"),
        }
    }
}

impl std::error::Error for SignupError {}

impl From<CoreError> for SignupError {
    fn from(err: CoreError) -> Self {
        Self::Domain(err)
    }
}

impl From<PersistenceError> for SignupError {
    fn from(err: PersistenceError) -> Self {
        Self::Storage(err)
    }
}

impl From<diesel::result::Error> for SignupError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Storage(PersistenceError::from(err))
    }
}

/// Executes the signup transaction.
///
/// Every child is enrolled in every listed workshop; each pair goes
/// through the core transition function so the plan capacity limits are
/// enforced with the aggregate in scope. The first order is created
/// pending with the caller-computed amount.
///
/// # Errors
///
/// Returns `Domain` if a capacity limit is exceeded, `Storage` for a
/// duplicate email or any database failure. Either way the transaction
/// is rolled back.
pub fn signup(
    conn: &mut SqliteConnection,
    data: &SignupData,
    today: Date,
) -> Result<SignupOutcome, SignupError> {
    let plan_id: i64 = data.plan.plan_id.ok_or_else(|| {
        SignupError::Storage(PersistenceError::MissingIdentifier(
            "Plan has no plan_id".to_string(),
        ))
    })?;

    info!(
        "Signup for {} with {} children and {} workshops",
        data.guardian_email,
        data.children.len(),
        data.workshop_ids.len()
    );

    conn.transaction::<SignupOutcome, SignupError, _>(|conn| {
        let user_id: i64 = accounts::create_account(
            conn,
            &data.guardian_email,
            &data.guardian_name,
            &data.password,
            false,
        )?;
        let guardian_id: i64 =
            guardians::create_guardian(conn, user_id, &data.phone, data.allow_whatsapp_group)?;

        let mut child_ids: Vec<i64> = Vec::with_capacity(data.children.len());
        for child in &data.children {
            child_ids.push(guardians::create_child(conn, guardian_id, child)?);
        }

        let mut subscription: Subscription = Subscription::new_pending(
            guardian_id,
            plan_id,
            data.billing_cycle,
            data.start_date.unwrap_or(today),
        );
        subscription.terms_accepted_at = Some(data.terms_accepted_at);
        subscription.subscription_id =
            Some(subscriptions::create_subscription(conn, &subscription)?);
        let subscription_id: i64 = subscription.subscription_id.unwrap_or_default();

        let mut state = SubscriptionState {
            subscription,
            plan: data.plan.clone(),
            enrollments: Vec::new(),
            orders: Vec::new(),
        };

        for &child_id in &child_ids {
            for &workshop_id in &data.workshop_ids {
                state = apply(
                    &state,
                    Command::CreateEnrollment {
                        child_id,
                        workshop_id,
                    },
                    today,
                )?
                .new_state;
            }
        }

        for enrollment in &mut state.enrollments {
            enrollment.enrollment_id = Some(subscriptions::insert_enrollment(conn, enrollment)?);
        }

        let order: Order =
            Order::new_pending(subscription_id, data.amount_clp, data.payment_method);
        let order_id: i64 = subscriptions::insert_order(conn, &order)?;

        info!(
            user_id,
            guardian_id, subscription_id, order_id, "Signup completed"
        );

        Ok(SignupOutcome {
            user_id,
            guardian_id,
            subscription_id,
            child_ids,
            order_id,
            amount_clp: data.amount_clp,
        })
    })
}
