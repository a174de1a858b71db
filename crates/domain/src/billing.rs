// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Billing-amount computation.

use crate::records::Plan;
use crate::types::BillingCycle;

/// Computes the order amount for one billing cycle of a subscription.
///
/// Monthly: the plan's monthly price. Quarterly: three months with the
/// plan's percentage discount applied, rounded down to a whole peso:
/// `floor(price_monthly * 3 * (1 - discount_pct/100))`.
///
/// The amount is computed once at order-creation time; later plan edits do
/// not touch existing orders.
#[must_use]
pub fn subscription_amount_clp(plan: &Plan, cycle: BillingCycle) -> i64 {
    match cycle {
        BillingCycle::Monthly => plan.price_monthly,
        BillingCycle::Quarterly => {
            // Integer math keeps the round-down exact for whole-peso prices.
            let discounted_pct = i64::from(100 - plan.quarterly_discount_pct.min(100));
            plan.price_monthly * 3 * discounted_pct / 100
        }
    }
}
