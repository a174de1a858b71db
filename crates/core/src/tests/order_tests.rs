// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Order/payment lifecycle tests, including the activation side effect.

use crate::{Command, CoreError, SubscriptionState, apply};
use caissa_domain::{DomainError, PaymentMethod, PaymentStatus, SubscriptionStatus};

use super::helpers::{apply_ok, pending_state, test_plan, today};

fn state_with_order(method: PaymentMethod) -> (SubscriptionState, i64) {
    let state = pending_state(test_plan(2, 2));
    let state = apply_ok(
        &state,
        Command::CreateOrder {
            amount_clp: 10_000,
            method,
        },
    );
    let order_id = state.orders[0].order_id.unwrap();
    (state, order_id)
}

#[test]
fn test_create_order_is_pending_with_given_amount() {
    let (state, order_id) = state_with_order(PaymentMethod::Transfer);
    let order = state.find_order(order_id).unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.amount_clp, 10_000);
    assert_eq!(order.currency, "CLP");
}

#[test]
fn test_paid_order_activates_pending_subscription() {
    let (state, order_id) = state_with_order(PaymentMethod::Transfer);
    assert!(state.is_pending());

    let state = apply_ok(&state, Command::MarkOrderPaid { order_id });
    assert_eq!(
        state.find_order(order_id).unwrap().payment_status,
        PaymentStatus::Paid
    );
    assert_eq!(state.subscription.status, SubscriptionStatus::Active);
    assert!(state.subscription.end_date.is_none());
}

#[test]
fn test_paid_order_does_not_touch_non_pending_subscription() {
    for status in [
        SubscriptionStatus::Active,
        SubscriptionStatus::Suspended,
        SubscriptionStatus::Canceled,
    ] {
        let (mut state, order_id) = state_with_order(PaymentMethod::Transfer);
        state.subscription.status = status;

        let state = apply_ok(&state, Command::MarkOrderPaid { order_id });
        assert_eq!(state.subscription.status, status, "status {status} changed");
        assert_eq!(
            state.find_order(order_id).unwrap().payment_status,
            PaymentStatus::Paid
        );
    }
}

#[test]
fn test_failed_renewal_leaves_active_subscription_active() {
    // Scenario: first order paid activates; a second failed renewal order
    // must not suspend or cancel.
    let (state, first_order) = state_with_order(PaymentMethod::Transfer);
    let state = apply_ok(&state, Command::MarkOrderPaid { order_id: first_order });
    assert_eq!(state.subscription.status, SubscriptionStatus::Active);

    let state = apply_ok(
        &state,
        Command::CreateOrder {
            amount_clp: 10_000,
            method: PaymentMethod::Webpay,
        },
    );
    let renewal_id = state
        .orders
        .iter()
        .find(|o| o.order_id != Some(first_order))
        .and_then(|o| o.order_id)
        .unwrap();

    let state = apply_ok(&state, Command::MarkOrderFailed { order_id: renewal_id });
    assert_eq!(state.subscription.status, SubscriptionStatus::Active);
    assert_eq!(
        state.find_order(renewal_id).unwrap().payment_status,
        PaymentStatus::Failed
    );
}

#[test]
fn test_revert_to_pending_keeps_subscription_active() {
    // The activation side effect is one-way: reverting the payment does
    // not deactivate the subscription.
    let (state, order_id) = state_with_order(PaymentMethod::InPerson);
    let state = apply_ok(&state, Command::MarkOrderPaid { order_id });
    let state = apply_ok(&state, Command::MarkOrderPending { order_id });

    assert_eq!(
        state.find_order(order_id).unwrap().payment_status,
        PaymentStatus::Pending
    );
    assert_eq!(state.subscription.status, SubscriptionStatus::Active);
}

#[test]
fn test_paid_and_failed_are_not_directly_interconvertible() {
    let (state, order_id) = state_with_order(PaymentMethod::Webpay);
    let paid = apply_ok(&state, Command::MarkOrderPaid { order_id });

    let err = apply(&paid, Command::MarkOrderFailed { order_id }, today()).unwrap_err();
    assert_eq!(
        err,
        CoreError::DomainViolation(DomainError::InvalidPaymentTransition {
            from: PaymentStatus::Paid,
            to: PaymentStatus::Failed,
        })
    );

    let failed = apply_ok(&state, Command::MarkOrderFailed { order_id });
    let err = apply(&failed, Command::MarkOrderPaid { order_id }, today()).unwrap_err();
    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::InvalidPaymentTransition { .. })
    ));
}

#[test]
fn test_marking_paid_twice_is_a_noop() {
    let (state, order_id) = state_with_order(PaymentMethod::Transfer);
    let state = apply_ok(&state, Command::MarkOrderPaid { order_id });
    // Cancel the subscription, then re-mark the already-paid order: the
    // no-op must not re-fire activation.
    let state = apply_ok(
        &state,
        Command::CancelSubscription {
            cancel_enrollments: true,
            end_date: None,
        },
    );
    let state = apply_ok(&state, Command::MarkOrderPaid { order_id });
    assert_eq!(state.subscription.status, SubscriptionStatus::Canceled);
}

#[test]
fn test_failed_order_can_be_retried_through_pending() {
    let (state, order_id) = state_with_order(PaymentMethod::Webpay);
    let state = apply_ok(&state, Command::MarkOrderFailed { order_id });
    let state = apply_ok(&state, Command::MarkOrderPending { order_id });
    let state = apply_ok(&state, Command::MarkOrderPaid { order_id });

    assert_eq!(
        state.find_order(order_id).unwrap().payment_status,
        PaymentStatus::Paid
    );
    assert_eq!(state.subscription.status, SubscriptionStatus::Active);
}

#[test]
fn test_unknown_order_fails() {
    let state = pending_state(test_plan(2, 2));
    let err = apply(&state, Command::MarkOrderPaid { order_id: 42 }, today()).unwrap_err();
    assert_eq!(err, CoreError::OrderNotFound(42));
}
