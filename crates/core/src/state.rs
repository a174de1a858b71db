// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use caissa_domain::{
    BillingCycle, Enrollment, EnrollmentStatus, Order, Plan, Subscription, SubscriptionStatus,
};
use time::Date;

/// The complete state of one subscription aggregate.
///
/// Holds the subscription row, the plan it references (for the capacity
/// limits and billing math), and every enrollment and order under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionState {
    pub subscription: Subscription,
    pub plan: Plan,
    pub enrollments: Vec<Enrollment>,
    pub orders: Vec<Order>,
}

impl SubscriptionState {
    /// Creates the aggregate for a brand-new pending subscription.
    ///
    /// `start_date` defaults to `today` when not given.
    #[must_use]
    pub fn new_pending(
        guardian_id: i64,
        plan: Plan,
        billing_cycle: BillingCycle,
        start_date: Option<Date>,
        today: Date,
    ) -> Self {
        let plan_id: i64 = plan.plan_id.unwrap_or_default();
        Self {
            subscription: Subscription::new_pending(
                guardian_id,
                plan_id,
                billing_cycle,
                start_date.unwrap_or(today),
            ),
            plan,
            enrollments: Vec::new(),
            orders: Vec::new(),
        }
    }

    /// Counts enrollments currently in the `active` state.
    #[must_use]
    pub fn active_enrollment_count(&self) -> u32 {
        let count: usize = self
            .enrollments
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Active)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Counts active enrollments for one child under this subscription.
    #[must_use]
    pub fn active_enrollment_count_for_child(&self, child_id: i64) -> u32 {
        let count: usize = self
            .enrollments
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Active && e.child_id == child_id)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Looks up an enrollment by canonical id.
    #[must_use]
    pub fn find_enrollment(&self, enrollment_id: i64) -> Option<&Enrollment> {
        self.enrollments
            .iter()
            .find(|e| e.enrollment_id == Some(enrollment_id))
    }

    /// Looks up an order by canonical id.
    #[must_use]
    pub fn find_order(&self, order_id: i64) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_id == Some(order_id))
    }

    /// Returns whether the subscription is still awaiting first payment.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.subscription.status == SubscriptionStatus::Pending
    }
}

/// The result of applying a command: the new aggregate state.
///
/// The input state is never mutated; persistence diffs by id (`None` id
/// means insert, `Some` means update).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: SubscriptionState,
}
