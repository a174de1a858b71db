// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Command, SubscriptionState, apply};
use caissa_domain::{BillingCycle, Plan, Subscription, SubscriptionStatus};
use time::{Date, Month};

pub fn today() -> Date {
    Date::from_calendar_date(2026, Month::March, 2).unwrap()
}

pub fn test_plan(max_children: u32, max_workshops_per_child: u32) -> Plan {
    Plan {
        plan_id: Some(1),
        name: String::from("Familia"),
        max_children,
        max_workshops_per_child,
        price_monthly: 25_000,
        quarterly_discount_pct: 10,
        is_active: true,
    }
}

/// A persisted pending subscription on the given plan, with no enrollments
/// or orders yet.
pub fn pending_state(plan: Plan) -> SubscriptionState {
    let plan_id = plan.plan_id.unwrap();
    SubscriptionState {
        subscription: Subscription {
            subscription_id: Some(10),
            guardian_id: 5,
            plan_id,
            billing_cycle: BillingCycle::Monthly,
            status: SubscriptionStatus::Pending,
            start_date: today(),
            end_date: None,
            terms_accepted_at: None,
        },
        plan,
        enrollments: Vec::new(),
        orders: Vec::new(),
    }
}

/// Applies a command, panicking on error, and simulates persistence by
/// assigning ids to any freshly created rows.
pub fn apply_ok(state: &SubscriptionState, command: Command) -> SubscriptionState {
    let mut new_state = apply(state, command, today()).expect("apply failed").new_state;
    let mut next_enrollment_id = new_state
        .enrollments
        .iter()
        .filter_map(|e| e.enrollment_id)
        .max()
        .unwrap_or(100);
    for enrollment in &mut new_state.enrollments {
        if enrollment.enrollment_id.is_none() {
            next_enrollment_id += 1;
            enrollment.enrollment_id = Some(next_enrollment_id);
        }
    }
    let mut next_order_id = new_state
        .orders
        .iter()
        .filter_map(|o| o.order_id)
        .max()
        .unwrap_or(500);
    for order in &mut new_state.orders {
        if order.order_id.is_none() {
            next_order_id += 1;
            order.order_id = Some(next_order_id);
        }
    }
    new_state
}
