// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Entity records.
//!
//! Records carry `Option<i64>` canonical ids: `None` means the record has
//! not been persisted yet; the persistence layer fills the id on first save.

use crate::types::{
    BillingCycle, DayOfWeek, EnrollmentStatus, KnowledgeLevel, PaymentMethod, PaymentStatus,
    SubscriptionStatus,
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};

/// A guardian: the account holder responsible for one or more children.
///
/// Identity (email, password) is owned by the account record; the guardian
/// row holds only the profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    /// Canonical id assigned by the database. `None` until persisted.
    pub guardian_id: Option<i64>,
    /// The owning account row.
    pub user_id: i64,
    pub phone: String,
    pub allow_whatsapp_group: bool,
}

/// A child enrolled (or enrollable) in workshops under a guardian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    /// Canonical id assigned by the database. `None` until persisted.
    pub child_id: Option<i64>,
    pub guardian_id: i64,
    pub name: String,
    pub birthdate: Option<Date>,
    pub knowledge_level: Option<KnowledgeLevel>,
    pub health_info: Option<String>,
    /// Consent to appear in club photos and videos.
    pub allow_media: bool,
}

/// A catalog plan bounding how many children and workshops-per-child a
/// subscription may cover, at a given price.
///
/// Plan edits never retroactively recompute amounts on already-created
/// orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Canonical id assigned by the database. `None` until persisted.
    pub plan_id: Option<i64>,
    pub name: String,
    /// Cap on distinct children coverable by one subscription.
    pub max_children: u32,
    /// Cap on concurrent active enrollments per child.
    pub max_workshops_per_child: u32,
    /// Monthly price in Chilean pesos.
    pub price_monthly: i64,
    /// Percentage discount applied to the quarterly amount.
    pub quarterly_discount_pct: u32,
    pub is_active: bool,
}

impl Plan {
    /// Total active-enrollment capacity of a subscription on this plan.
    #[must_use]
    pub const fn total_enrollment_limit(&self) -> u32 {
        self.max_children * self.max_workshops_per_child
    }
}

/// A scheduled recurring class session.
///
/// `capacity` is stored but not enforced against enrollment counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workshop {
    /// Canonical id assigned by the database. `None` until persisted.
    pub workshop_id: Option<i64>,
    pub name: String,
    pub day_of_week: DayOfWeek,
    pub start_time: Time,
    pub end_time: Option<Time>,
    pub address: Option<String>,
    pub capacity: Option<u32>,
    pub is_active: bool,
}

/// A guardian's commitment to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Canonical id assigned by the database. `None` until persisted.
    pub subscription_id: Option<i64>,
    pub guardian_id: i64,
    pub plan_id: i64,
    pub billing_cycle: BillingCycle,
    pub status: SubscriptionStatus,
    pub start_date: Date,
    /// Set when the subscription is canceled; cleared on reactivation.
    pub end_date: Option<Date>,
    /// When the guardian accepted the club rules during signup.
    pub terms_accepted_at: Option<OffsetDateTime>,
}

impl Subscription {
    /// Creates a new pending subscription starting on the given date.
    #[must_use]
    pub const fn new_pending(
        guardian_id: i64,
        plan_id: i64,
        billing_cycle: BillingCycle,
        start_date: Date,
    ) -> Self {
        Self {
            subscription_id: None,
            guardian_id,
            plan_id,
            billing_cycle,
            status: SubscriptionStatus::Pending,
            start_date,
            end_date: None,
            terms_accepted_at: None,
        }
    }
}

/// The binding of one child to one workshop under one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Canonical id assigned by the database. `None` until persisted.
    pub enrollment_id: Option<i64>,
    pub subscription_id: i64,
    pub child_id: i64,
    pub workshop_id: i64,
    pub status: EnrollmentStatus,
    pub notes: Option<String>,
}

impl Enrollment {
    /// Creates a new active enrollment.
    #[must_use]
    pub const fn new_active(subscription_id: i64, child_id: i64, workshop_id: i64) -> Self {
        Self {
            enrollment_id: None,
            subscription_id,
            child_id,
            workshop_id,
            status: EnrollmentStatus::Active,
            notes: None,
        }
    }
}

/// A single payment obligation tied to a subscription's billing cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Canonical id assigned by the database. `None` until persisted.
    pub order_id: Option<i64>,
    pub subscription_id: i64,
    /// Amount in Chilean pesos, computed once at creation time.
    pub amount_clp: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub currency: String,
    /// Opaque JSON snapshot used to rehydrate a gateway retry flow.
    pub detail: Option<String>,
    /// Gateway-assigned token, once the handshake has started.
    pub external_id: Option<String>,
}

impl Order {
    /// Creates a new pending order.
    #[must_use]
    pub fn new_pending(subscription_id: i64, amount_clp: i64, method: PaymentMethod) -> Self {
        Self {
            order_id: None,
            subscription_id,
            amount_clp,
            payment_method: method,
            payment_status: PaymentStatus::Pending,
            currency: String::from("CLP"),
            detail: None,
            external_id: None,
        }
    }
}
