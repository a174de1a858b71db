// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for payment retry context storage.

use time::macros::time;

use caissa_domain::{BillingCycle, DayOfWeek};

use crate::{Persistence, PersistenceError};

fn order_for_context(persistence: &mut Persistence) -> (i64, i64) {
    let plan_id = persistence
        .create_plan(&super::sample_plan("Familiar", 2, 2))
        .unwrap();
    let plan = persistence.get_plan(plan_id).unwrap();
    let workshop_id = persistence
        .create_workshop(&super::sample_workshop(
            "Lunes",
            DayOfWeek::Monday,
            time!(17:00),
        ))
        .unwrap();
    let data = super::sample_signup(
        "maria@example.cl",
        plan,
        vec![super::sample_child("Tomas")],
        vec![workshop_id],
    );
    let outcome = persistence.signup(&data, super::today()).unwrap();
    (outcome.order_id, plan_id)
}

#[test]
fn test_context_is_single_use() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (order_id, plan_id) = order_for_context(&mut persistence);

    persistence
        .store_payment_context(
            "ctx-1",
            order_id,
            "maria@example.cl",
            plan_id,
            BillingCycle::Monthly,
            600,
        )
        .unwrap();

    let context = persistence.consume_payment_context("ctx-1").unwrap();
    assert_eq!(context.order_id, order_id);
    assert_eq!(context.guardian_email, "maria@example.cl");
    assert_eq!(context.billing_cycle, BillingCycle::Monthly);

    // Consuming again finds nothing.
    let result = persistence.consume_payment_context("ctx-1");
    assert!(matches!(
        result,
        Err(PersistenceError::PaymentContextNotFound(_))
    ));
}

#[test]
fn test_unknown_context_rejected() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let result = persistence.consume_payment_context("missing");
    assert!(matches!(
        result,
        Err(PersistenceError::PaymentContextNotFound(_))
    ));
}

#[test]
fn test_expired_context_rejected_and_removed() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (order_id, plan_id) = order_for_context(&mut persistence);

    // Already stale when stored.
    persistence
        .store_payment_context(
            "ctx-stale",
            order_id,
            "maria@example.cl",
            plan_id,
            BillingCycle::Quarterly,
            -10,
        )
        .unwrap();

    let result = persistence.consume_payment_context("ctx-stale");
    assert!(matches!(
        result,
        Err(PersistenceError::PaymentContextExpired(_))
    ));

    // The rejection deleted the row.
    let result = persistence.consume_payment_context("ctx-stale");
    assert!(matches!(
        result,
        Err(PersistenceError::PaymentContextNotFound(_))
    ));
}

#[test]
fn test_sweep_removes_only_expired_contexts() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (order_id, plan_id) = order_for_context(&mut persistence);

    persistence
        .store_payment_context(
            "ctx-stale",
            order_id,
            "maria@example.cl",
            plan_id,
            BillingCycle::Monthly,
            -10,
        )
        .unwrap();
    persistence
        .store_payment_context(
            "ctx-fresh",
            order_id,
            "maria@example.cl",
            plan_id,
            BillingCycle::Monthly,
            600,
        )
        .unwrap();

    let deleted = persistence.delete_expired_payment_contexts().unwrap();
    assert_eq!(deleted, 1);
    assert!(persistence.consume_payment_context("ctx-fresh").is_ok());
}
