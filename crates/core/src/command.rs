// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use caissa_domain::PaymentMethod;
use time::Date;

/// A command represents user or admin intent as data only.
///
/// Commands are the only way to request state changes on a subscription
/// aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enroll a child in a workshop under this subscription.
    ///
    /// Guarded by the plan's global capacity and per-child workshop limits,
    /// checked in that order. Duplicate (child, workshop) pairs are not
    /// rejected; only the aggregate counts are enforced.
    CreateEnrollment {
        child_id: i64,
        workshop_id: i64,
    },
    /// Move an enrollment to another workshop.
    ///
    /// Marks the existing row `changed` and opens a fresh `active` row for
    /// the same child in the new workshop. Capacity is not re-checked: one
    /// enrollment closes, one opens. Callers must only move `active`
    /// enrollments; the engine does not re-validate the source status.
    MoveEnrollment {
        enrollment_id: i64,
        new_workshop_id: i64,
    },
    /// Cancel an enrollment unconditionally.
    CancelEnrollment {
        enrollment_id: i64,
    },
    /// Set the subscription `active` and clear any prior `end_date`.
    ///
    /// Idempotent. Canceled enrollments are never resurrected.
    ActivateSubscription,
    /// Cancel the subscription, optionally cascading over its currently
    /// active enrollments. Orders are never touched.
    CancelSubscription {
        cancel_enrollments: bool,
        /// Defaults to today when `None`.
        end_date: Option<Date>,
    },
    /// Create a pending order for the given precomputed amount.
    ///
    /// The amount is the caller's responsibility (see
    /// `caissa_domain::subscription_amount_clp`); the engine does not
    /// recompute or validate it against the plan.
    CreateOrder {
        amount_clp: i64,
        method: PaymentMethod,
    },
    /// Mark an order paid. Activates the owning subscription iff it was
    /// still `pending`.
    MarkOrderPaid {
        order_id: i64,
    },
    /// Mark an order failed. Never touches the subscription.
    MarkOrderFailed {
        order_id: i64,
    },
    /// Administrative revert: reopen an order as `pending` regardless of
    /// its prior state. Does not reverse a subscription activation already
    /// triggered by an earlier paid transition.
    MarkOrderPending {
        order_id: i64,
    },
}
