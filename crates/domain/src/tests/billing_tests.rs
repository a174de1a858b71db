// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BillingCycle, Plan, subscription_amount_clp};

fn plan_priced(price_monthly: i64, quarterly_discount_pct: u32) -> Plan {
    Plan {
        plan_id: Some(1),
        name: String::from("Test plan"),
        max_children: 2,
        max_workshops_per_child: 2,
        price_monthly,
        quarterly_discount_pct,
        is_active: true,
    }
}

#[test]
fn test_monthly_amount_is_plan_price() {
    let plan = plan_priced(25_000, 10);
    assert_eq!(subscription_amount_clp(&plan, BillingCycle::Monthly), 25_000);
}

#[test]
fn test_quarterly_amount_applies_discount() {
    // floor(25000 * 3 * 0.9) = 67500
    let plan = plan_priced(25_000, 10);
    assert_eq!(
        subscription_amount_clp(&plan, BillingCycle::Quarterly),
        67_500
    );
}

#[test]
fn test_quarterly_amount_rounds_down() {
    // 9999 * 3 * 0.85 = 25497.45 -> 25497
    let plan = plan_priced(9_999, 15);
    assert_eq!(
        subscription_amount_clp(&plan, BillingCycle::Quarterly),
        25_497
    );
}

#[test]
fn test_quarterly_amount_with_zero_discount() {
    let plan = plan_priced(10_000, 0);
    assert_eq!(
        subscription_amount_clp(&plan, BillingCycle::Quarterly),
        30_000
    );
}

#[test]
fn test_quarterly_discount_is_clamped_to_hundred() {
    let plan = plan_priced(10_000, 150);
    assert_eq!(subscription_amount_clp(&plan, BillingCycle::Quarterly), 0);
}
