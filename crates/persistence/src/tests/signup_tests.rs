// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for the signup transaction.

use time::macros::time;

use caissa::CoreError;
use caissa_domain::{
    DayOfWeek, DomainError, EnrollmentStatus, PaymentStatus, Plan, SubscriptionStatus,
};

use crate::{Persistence, PersistenceError, SignupError};

fn seed_catalog(
    persistence: &mut Persistence,
    max_children: u32,
    max_workshops_per_child: u32,
) -> (Plan, Vec<i64>) {
    let plan_id = persistence
        .create_plan(&super::sample_plan("Familiar", max_children, max_workshops_per_child))
        .unwrap();
    let plan = persistence.get_plan(plan_id).unwrap();

    let monday = persistence
        .create_workshop(&super::sample_workshop(
            "Lunes",
            DayOfWeek::Monday,
            time!(17:00),
        ))
        .unwrap();
    let thursday = persistence
        .create_workshop(&super::sample_workshop(
            "Jueves",
            DayOfWeek::Thursday,
            time!(17:00),
        ))
        .unwrap();

    (plan, vec![monday, thursday])
}

#[test]
fn test_signup_creates_full_aggregate() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (plan, workshop_ids) = seed_catalog(&mut persistence, 2, 2);

    let data = super::sample_signup(
        "maria@example.cl",
        plan,
        vec![super::sample_child("Tomas"), super::sample_child("Emilia")],
        workshop_ids,
    );
    let outcome = persistence.signup(&data, super::today()).unwrap();

    assert_eq!(outcome.child_ids.len(), 2);

    let state = persistence
        .load_subscription_state(outcome.subscription_id)
        .unwrap();
    assert_eq!(state.subscription.status, SubscriptionStatus::Pending);
    assert_eq!(state.subscription.start_date, super::today());
    assert_eq!(
        state.subscription.terms_accepted_at,
        Some(super::terms_timestamp())
    );

    // Two children crossed with two workshops.
    assert_eq!(state.enrollments.len(), 4);
    assert!(
        state
            .enrollments
            .iter()
            .all(|e| e.status == EnrollmentStatus::Active && e.enrollment_id.is_some())
    );

    assert_eq!(state.orders.len(), 1);
    assert_eq!(state.orders[0].payment_status, PaymentStatus::Pending);
    assert_eq!(state.orders[0].amount_clp, 25_000);

    let account = persistence
        .find_account_by_email("maria@example.cl")
        .unwrap()
        .unwrap();
    let guardian = persistence
        .get_guardian_by_user(account.user_id)
        .unwrap()
        .unwrap();
    assert_eq!(guardian.guardian_id, Some(outcome.guardian_id));
}

#[test]
fn test_signup_capacity_violation_rolls_back_everything() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (plan, workshop_ids) = seed_catalog(&mut persistence, 2, 1);

    // One child in two workshops exceeds the per-child limit of 1 while
    // staying under the plan-wide limit of 2.
    let data = super::sample_signup(
        "maria@example.cl",
        plan,
        vec![super::sample_child("Tomas")],
        workshop_ids,
    );
    let result = persistence.signup(&data, super::today());

    assert!(matches!(
        result,
        Err(SignupError::Domain(CoreError::DomainViolation(
            DomainError::ChildWorkshopLimitExceeded { limit: 1 }
        )))
    ));

    // Nothing survived the rollback, not even the account row.
    assert!(
        persistence
            .find_account_by_email("maria@example.cl")
            .unwrap()
            .is_none()
    );
    assert!(persistence.list_subscriptions().unwrap().is_empty());
}

#[test]
fn test_signup_duplicate_email_fails() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (plan, workshop_ids) = seed_catalog(&mut persistence, 2, 2);

    persistence
        .create_account("maria@example.cl", "Maria", "secret", false)
        .unwrap();

    let data = super::sample_signup(
        "maria@example.cl",
        plan,
        vec![super::sample_child("Tomas")],
        workshop_ids,
    );
    let result = persistence.signup(&data, super::today());

    assert!(matches!(
        result,
        Err(SignupError::Storage(PersistenceError::DuplicateEmail(_)))
    ));
}

#[test]
fn test_signup_honors_explicit_start_date() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (plan, workshop_ids) = seed_catalog(&mut persistence, 2, 2);

    let start = time::Date::from_calendar_date(2026, time::Month::April, 1).unwrap();
    let mut data = super::sample_signup(
        "maria@example.cl",
        plan,
        vec![super::sample_child("Tomas")],
        workshop_ids,
    );
    data.start_date = Some(start);

    let outcome = persistence.signup(&data, super::today()).unwrap();
    let subscription = persistence.get_subscription(outcome.subscription_id).unwrap();
    assert_eq!(subscription.start_date, start);
}
