// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Caissa workshop system.
//!
//! This crate provides `SQLite` persistence, via Diesel, for the catalog
//! (plans and workshops), accounts and sessions, guardians and children,
//! and the subscription aggregate (subscription, enrollments, orders).
//!
//! ## Aggregate persistence
//!
//! The subscription state machine lives in the `caissa` core crate and is
//! pure: it takes a [`caissa::SubscriptionState`] and a command and
//! returns a new state. This crate closes the loop:
//!
//! - [`Persistence::load_subscription_state`] assembles the aggregate
//! - [`Persistence::persist_subscription_state`] diffs it back by id in
//!   one transaction (`None` id means insert, `Some` means update)
//!
//! ## Testing
//!
//! Tests run against unique shared in-memory `SQLite` databases so they
//! are deterministic and need no external infrastructure.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{Date, OffsetDateTime};

use caissa::SubscriptionState;
use caissa_domain::{
    Child, Enrollment, Guardian, Order, PaymentStatus, Plan, Subscription, Workshop,
};

/// Atomic counter for generating unique in-memory database names.
///
/// This ensures deterministic test isolation by eliminating time-based collisions.
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod sqlite;

#[cfg(test)]
mod tests;

pub use data_models::{
    AccountData, GuardianAccountData, NewChildData, PaymentContextData, PrincipalData,
    SessionData, SignupData, SignupOutcome,
};
pub use error::PersistenceError;
pub use mutations::SignupError;

/// Persistence adapter over a single `SQLite` connection.
///
/// The adapter is not internally synchronized; the server wraps it in a
/// mutex, which also serializes the capacity checks in the signup and
/// enrollment flows against their writes.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation without time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        // Create a unique shared in-memory database name per call so tests are isolated.
        // Use atomic counter instead of timestamp to eliminate race conditions.
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = sqlite::initialize_database(&shared_memory_url)?;

        sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = sqlite::initialize_database(path_str)?;

        // Enable WAL mode for better read concurrency
        sqlite::enable_wal_mode(&mut conn)?;

        sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// This is a startup-time check required to ensure
    /// referential integrity constraints are enforced.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Catalog: Plans
    // ========================================================================

    /// Creates a new plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be created.
    pub fn create_plan(&mut self, plan: &Plan) -> Result<i64, PersistenceError> {
        mutations::catalog::create_plan(&mut self.conn, plan)
    }

    /// Updates an existing plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan carries no id or does not exist.
    pub fn update_plan(&mut self, plan: &Plan) -> Result<(), PersistenceError> {
        mutations::catalog::update_plan(&mut self.conn, plan)
    }

    /// Toggles a plan's active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan does not exist.
    pub fn set_plan_active(&mut self, plan_id: i64, active: bool) -> Result<(), PersistenceError> {
        mutations::catalog::set_plan_active(&mut self.conn, plan_id, active)
    }

    /// Deletes a plan that no subscription references.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan does not exist or is still referenced.
    pub fn delete_plan(&mut self, plan_id: i64) -> Result<(), PersistenceError> {
        mutations::catalog::delete_plan(&mut self.conn, plan_id)
    }

    /// Retrieves a plan by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan does not exist.
    pub fn get_plan(&mut self, plan_id: i64) -> Result<Plan, PersistenceError> {
        queries::catalog::get_plan(&mut self.conn, plan_id)
    }

    /// Lists active plans, cheapest first. The public catalog view.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_active_plans(&mut self) -> Result<Vec<Plan>, PersistenceError> {
        queries::catalog::list_plans(&mut self.conn, false)
    }

    /// Lists all plans including inactive ones. The admin view.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all_plans(&mut self) -> Result<Vec<Plan>, PersistenceError> {
        queries::catalog::list_plans(&mut self.conn, true)
    }

    // ========================================================================
    // Catalog: Workshops
    // ========================================================================

    /// Creates a new workshop.
    ///
    /// # Errors
    ///
    /// Returns an error if the workshop cannot be created.
    pub fn create_workshop(&mut self, workshop: &Workshop) -> Result<i64, PersistenceError> {
        mutations::catalog::create_workshop(&mut self.conn, workshop)
    }

    /// Updates an existing workshop.
    ///
    /// # Errors
    ///
    /// Returns an error if the workshop carries no id or does not exist.
    pub fn update_workshop(&mut self, workshop: &Workshop) -> Result<(), PersistenceError> {
        mutations::catalog::update_workshop(&mut self.conn, workshop)
    }

    /// Toggles a workshop's active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the workshop does not exist.
    pub fn set_workshop_active(
        &mut self,
        workshop_id: i64,
        active: bool,
    ) -> Result<(), PersistenceError> {
        mutations::catalog::set_workshop_active(&mut self.conn, workshop_id, active)
    }

    /// Deletes a workshop that no enrollment references.
    ///
    /// # Errors
    ///
    /// Returns an error if the workshop does not exist or is still referenced.
    pub fn delete_workshop(&mut self, workshop_id: i64) -> Result<(), PersistenceError> {
        mutations::catalog::delete_workshop(&mut self.conn, workshop_id)
    }

    /// Retrieves a workshop by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the workshop does not exist.
    pub fn get_workshop(&mut self, workshop_id: i64) -> Result<Workshop, PersistenceError> {
        queries::catalog::get_workshop(&mut self.conn, workshop_id)
    }

    /// Lists active workshops in schedule order. The public catalog view.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_active_workshops(&mut self) -> Result<Vec<Workshop>, PersistenceError> {
        queries::catalog::list_workshops(&mut self.conn, false)
    }

    /// Lists all workshops including inactive ones. The admin view.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all_workshops(&mut self) -> Result<Vec<Workshop>, PersistenceError> {
        queries::catalog::list_workshops(&mut self.conn, true)
    }

    // ========================================================================
    // Accounts & Sessions
    // ========================================================================

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEmail` if an account already exists for the email.
    pub fn create_account(
        &mut self,
        email: &str,
        name: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<i64, PersistenceError> {
        mutations::accounts::create_account(&mut self.conn, email, name, password, is_admin)
    }

    /// Retrieves an account by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    /// Returns `Ok(None)` if no account exists for the email.
    pub fn find_account_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<AccountData>, PersistenceError> {
        queries::accounts::find_account_by_email(&mut self.conn, email)
    }

    /// Retrieves an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist.
    pub fn get_account(&mut self, user_id: i64) -> Result<AccountData, PersistenceError> {
        queries::accounts::get_account(&mut self.conn, user_id)
    }

    /// Verifies a password against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is malformed.
    pub fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, PersistenceError> {
        queries::accounts::verify_password(password, password_hash)
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
        &mut self,
        session_token: &str,
        user_id: i64,
        expires_at: i64,
    ) -> Result<i64, PersistenceError> {
        mutations::accounts::create_session(&mut self.conn, session_token, user_id, expires_at)
    }

    /// Resolves a session token to the identity behind it.
    ///
    /// An expired session is deleted as part of the rejection.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for an unknown token and `SessionExpired`
    /// for a stale one.
    pub fn validate_session(
        &mut self,
        session_token: &str,
    ) -> Result<PrincipalData, PersistenceError> {
        let session: SessionData =
            queries::accounts::get_session_by_token(&mut self.conn, session_token)?
                .ok_or_else(|| PersistenceError::SessionNotFound(session_token.to_string()))?;

        let now: i64 = OffsetDateTime::now_utc().unix_timestamp();
        if session.expires_at < now {
            mutations::accounts::delete_session(&mut self.conn, session_token)?;
            return Err(PersistenceError::SessionExpired(session_token.to_string()));
        }

        let account: AccountData = queries::accounts::get_account(&mut self.conn, session.user_id)?;
        let guardian: Option<Guardian> =
            queries::guardians::get_guardian_by_user(&mut self.conn, account.user_id)?;

        Ok(PrincipalData {
            user_id: account.user_id,
            email: account.email,
            name: account.name,
            is_admin: account.is_admin,
            guardian_id: guardian.and_then(|g| g.guardian_id),
        })
    }

    /// Deletes a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_session(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        mutations::accounts::delete_session(&mut self.conn, session_token)
    }

    /// Deletes all expired sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_expired_sessions(&mut self) -> Result<usize, PersistenceError> {
        let now: i64 = OffsetDateTime::now_utc().unix_timestamp();
        mutations::accounts::delete_expired_sessions(&mut self.conn, now)
    }

    // ========================================================================
    // Guardians & Children
    // ========================================================================

    /// Creates a guardian profile for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or already has one.
    pub fn create_guardian(
        &mut self,
        user_id: i64,
        phone: &str,
        allow_whatsapp_group: bool,
    ) -> Result<i64, PersistenceError> {
        mutations::guardians::create_guardian(&mut self.conn, user_id, phone, allow_whatsapp_group)
    }

    /// Retrieves a guardian by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the guardian does not exist.
    pub fn get_guardian(&mut self, guardian_id: i64) -> Result<Guardian, PersistenceError> {
        queries::guardians::get_guardian(&mut self.conn, guardian_id)
    }

    /// Retrieves the guardian profile owned by an account, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_guardian_by_user(
        &mut self,
        user_id: i64,
    ) -> Result<Option<Guardian>, PersistenceError> {
        queries::guardians::get_guardian_by_user(&mut self.conn, user_id)
    }

    /// Retrieves the account email for a guardian.
    ///
    /// # Errors
    ///
    /// Returns an error if the guardian does not exist.
    pub fn guardian_email(&mut self, guardian_id: i64) -> Result<String, PersistenceError> {
        queries::guardians::guardian_email(&mut self.conn, guardian_id)
    }

    /// Lists all guardian profiles with their account rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_guardians(&mut self) -> Result<Vec<GuardianAccountData>, PersistenceError> {
        queries::guardians::list_guardians(&mut self.conn)
    }

    /// Updates a guardian's profile fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the guardian carries no id or does not exist.
    pub fn update_guardian(&mut self, guardian: &Guardian) -> Result<(), PersistenceError> {
        mutations::guardians::update_guardian(&mut self.conn, guardian)
    }

    /// Deletes a guardian, their account, and everything under them.
    ///
    /// # Errors
    ///
    /// Returns an error if the guardian does not exist or the delete fails.
    pub fn delete_guardian(&mut self, guardian_id: i64) -> Result<(), PersistenceError> {
        mutations::guardians::delete_guardian(&mut self.conn, guardian_id)
    }

    /// Creates a child under a guardian.
    ///
    /// # Errors
    ///
    /// Returns an error if the guardian does not exist.
    pub fn create_child(
        &mut self,
        guardian_id: i64,
        child: &NewChildData,
    ) -> Result<i64, PersistenceError> {
        mutations::guardians::create_child(&mut self.conn, guardian_id, child)
    }

    /// Retrieves a child by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the child does not exist.
    pub fn get_child(&mut self, child_id: i64) -> Result<Child, PersistenceError> {
        queries::guardians::get_child(&mut self.conn, child_id)
    }

    /// Lists all children of a guardian.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_children(&mut self, guardian_id: i64) -> Result<Vec<Child>, PersistenceError> {
        queries::guardians::list_children(&mut self.conn, guardian_id)
    }

    /// Updates a child's profile fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the child carries no id or does not exist.
    pub fn update_child(&mut self, child: &Child) -> Result<(), PersistenceError> {
        mutations::guardians::update_child(&mut self.conn, child)
    }

    /// Deletes a child along with the child's enrollment history.
    ///
    /// # Errors
    ///
    /// Returns an error if the child does not exist or the delete fails.
    pub fn delete_child(&mut self, child_id: i64) -> Result<(), PersistenceError> {
        mutations::guardians::delete_child(&mut self.conn, child_id)
    }

    // ========================================================================
    // Signup
    // ========================================================================

    /// Executes the signup transaction: account, guardian, children,
    /// pending subscription, enrollments, and the first pending order,
    /// all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `SignupError::Domain` for a capacity violation and
    /// `SignupError::Storage` for a duplicate email or database failure.
    pub fn signup(
        &mut self,
        data: &SignupData,
        today: Date,
    ) -> Result<SignupOutcome, SignupError> {
        mutations::signup::signup(&mut self.conn, data, today)
    }

    // ========================================================================
    // Subscription Aggregate
    // ========================================================================

    /// Loads the full aggregate for a subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription does not exist.
    pub fn load_subscription_state(
        &mut self,
        subscription_id: i64,
    ) -> Result<SubscriptionState, PersistenceError> {
        queries::subscriptions::load_subscription_state(&mut self.conn, subscription_id)
    }

    /// Persists an aggregate produced by the core transition function,
    /// in one transaction. Returns the aggregate with all ids filled.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the diff fails.
    pub fn persist_subscription_state(
        &mut self,
        state: &SubscriptionState,
    ) -> Result<SubscriptionState, PersistenceError> {
        mutations::subscriptions::persist_subscription_state(&mut self.conn, state)
    }

    /// Retrieves a subscription row by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription does not exist.
    pub fn get_subscription(
        &mut self,
        subscription_id: i64,
    ) -> Result<Subscription, PersistenceError> {
        queries::subscriptions::get_subscription(&mut self.conn, subscription_id)
    }

    /// Lists all subscriptions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_subscriptions(&mut self) -> Result<Vec<Subscription>, PersistenceError> {
        queries::subscriptions::list_subscriptions(&mut self.conn)
    }

    /// Lists all subscriptions belonging to a guardian, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_subscriptions_for_guardian(
        &mut self,
        guardian_id: i64,
    ) -> Result<Vec<Subscription>, PersistenceError> {
        queries::subscriptions::list_subscriptions_for_guardian(&mut self.conn, guardian_id)
    }

    /// Retrieves an enrollment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the enrollment does not exist.
    pub fn get_enrollment(&mut self, enrollment_id: i64) -> Result<Enrollment, PersistenceError> {
        queries::subscriptions::get_enrollment(&mut self.conn, enrollment_id)
    }

    /// Retrieves an order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist.
    pub fn get_order(&mut self, order_id: i64) -> Result<Order, PersistenceError> {
        queries::subscriptions::get_order(&mut self.conn, order_id)
    }

    /// Retrieves an order by its gateway-assigned token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    /// Returns `Ok(None)` if no order carries the token.
    pub fn find_order_by_external_id(
        &mut self,
        external_id: &str,
    ) -> Result<Option<Order>, PersistenceError> {
        queries::subscriptions::find_order_by_external_id(&mut self.conn, external_id)
    }

    /// Lists all orders under a subscription, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_orders_for_subscription(
        &mut self,
        subscription_id: i64,
    ) -> Result<Vec<Order>, PersistenceError> {
        queries::subscriptions::list_orders_for_subscription(&mut self.conn, subscription_id)
    }

    /// Lists all orders belonging to a guardian, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_orders_for_guardian(
        &mut self,
        guardian_id: i64,
    ) -> Result<Vec<Order>, PersistenceError> {
        queries::subscriptions::list_orders_for_guardian(&mut self.conn, guardian_id)
    }

    /// Lists all orders in a given payment status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_orders_by_status(
        &mut self,
        status: PaymentStatus,
    ) -> Result<Vec<Order>, PersistenceError> {
        queries::subscriptions::list_orders_by_status(&mut self.conn, status)
    }

    // ========================================================================
    // Payment Contexts
    // ========================================================================

    /// Stores a payment retry context under a caller-generated token.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn store_payment_context(
        &mut self,
        token: &str,
        order_id: i64,
        guardian_email: &str,
        plan_id: i64,
        billing_cycle: caissa_domain::BillingCycle,
        ttl_seconds: i64,
    ) -> Result<(), PersistenceError> {
        mutations::payment_context::store_payment_context(
            &mut self.conn,
            token,
            order_id,
            guardian_email,
            plan_id,
            billing_cycle,
            ttl_seconds,
        )
    }

    /// Consumes a payment retry context: reads it and deletes it.
    ///
    /// # Errors
    ///
    /// Returns `PaymentContextNotFound` for an unknown token and
    /// `PaymentContextExpired` for a stale one.
    pub fn consume_payment_context(
        &mut self,
        token: &str,
    ) -> Result<PaymentContextData, PersistenceError> {
        mutations::payment_context::consume_payment_context(&mut self.conn, token)
    }

    /// Deletes all expired payment contexts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_expired_payment_contexts(&mut self) -> Result<usize, PersistenceError> {
        let now: i64 = OffsetDateTime::now_utc().unix_timestamp();
        mutations::payment_context::delete_expired_payment_contexts(&mut self.conn, now)
    }
}
