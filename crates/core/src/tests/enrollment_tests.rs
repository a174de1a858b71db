// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capacity-limit and enrollment-movement tests.

use crate::{Command, CoreError, apply};
use caissa_domain::{DomainError, EnrollmentStatus};

use super::helpers::{apply_ok, pending_state, test_plan, today};

#[test]
fn test_first_enrollment_succeeds() {
    let state = pending_state(test_plan(2, 2));
    let state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 1,
        },
    );

    assert_eq!(state.active_enrollment_count(), 1);
    assert_eq!(state.enrollments[0].status, EnrollmentStatus::Active);
}

#[test]
fn test_per_child_limit_rejects_third_workshop() {
    // Plan allows 2 children x 2 workshops; one child maxes out at 2.
    let mut state = pending_state(test_plan(2, 2));
    for workshop_id in [1, 2] {
        state = apply_ok(
            &state,
            Command::CreateEnrollment {
                child_id: 1,
                workshop_id,
            },
        );
    }
    assert_eq!(state.active_enrollment_count(), 2);

    let err = apply(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 3,
        },
        today(),
    )
    .unwrap_err();

    assert_eq!(
        err,
        CoreError::DomainViolation(DomainError::ChildWorkshopLimitExceeded { limit: 2 })
    );
    // No state was mutated: the original still has 2 active rows.
    assert_eq!(state.active_enrollment_count(), 2);
}

#[test]
fn test_global_limit_rejects_enrollment_across_children() {
    // 1 child x 2 workshops = 2 total; a second child hits the global cap
    // before the per-child cap.
    let mut state = pending_state(test_plan(1, 2));
    for workshop_id in [1, 2] {
        state = apply_ok(
            &state,
            Command::CreateEnrollment {
                child_id: 1,
                workshop_id,
            },
        );
    }

    let err = apply(
        &state,
        Command::CreateEnrollment {
            child_id: 2,
            workshop_id: 1,
        },
        today(),
    )
    .unwrap_err();

    assert_eq!(
        err,
        CoreError::DomainViolation(DomainError::PlanCapacityExceeded { limit: 2 })
    );
}

#[test]
fn test_global_limit_checked_before_per_child_limit() {
    // Both limits are violated at once; the global one must win.
    let mut state = pending_state(test_plan(1, 1));
    state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 1,
        },
    );

    let err = apply(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 2,
        },
        today(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::PlanCapacityExceeded { .. })
    ));
}

#[test]
fn test_duplicate_child_workshop_pair_is_not_rejected() {
    // Only the aggregate counts are guarded; re-enrolling the same child in
    // the same workshop succeeds up to the limits.
    let mut state = pending_state(test_plan(2, 2));
    state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 1,
        },
    );
    state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 1,
        },
    );

    assert_eq!(state.active_enrollment_count_for_child(1), 2);
}

#[test]
fn test_canceled_enrollments_free_capacity() {
    let mut state = pending_state(test_plan(1, 1));
    state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 1,
        },
    );
    let enrollment_id = state.enrollments[0].enrollment_id.unwrap();
    state = apply_ok(&state, Command::CancelEnrollment { enrollment_id });

    // The slot reopened.
    let state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 2,
        },
    );
    assert_eq!(state.active_enrollment_count(), 1);
    assert_eq!(state.enrollments.len(), 2);
}

#[test]
fn test_move_enrollment_is_count_neutral_and_history_preserving() {
    let mut state = pending_state(test_plan(2, 2));
    state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 1,
        },
    );
    let enrollment_id = state.enrollments[0].enrollment_id.unwrap();
    let before_count = state.active_enrollment_count();

    let state = apply_ok(
        &state,
        Command::MoveEnrollment {
            enrollment_id,
            new_workshop_id: 2,
        },
    );

    assert_eq!(state.active_enrollment_count(), before_count);
    assert_eq!(state.enrollments.len(), 2);

    let old = state.find_enrollment(enrollment_id).unwrap();
    assert_eq!(old.status, EnrollmentStatus::Changed);
    assert_eq!(old.workshop_id, 1);

    let new = state
        .enrollments
        .iter()
        .find(|e| e.status == EnrollmentStatus::Active)
        .unwrap();
    assert_eq!(new.workshop_id, 2);
    assert_eq!(new.child_id, 1);
    assert_eq!(new.subscription_id, old.subscription_id);
}

#[test]
fn test_move_unknown_enrollment_fails() {
    let state = pending_state(test_plan(2, 2));
    let err = apply(
        &state,
        Command::MoveEnrollment {
            enrollment_id: 999,
            new_workshop_id: 2,
        },
        today(),
    )
    .unwrap_err();
    assert_eq!(err, CoreError::EnrollmentNotFound(999));
}

#[test]
fn test_cancel_enrollment_is_unconditional_and_idempotent() {
    let mut state = pending_state(test_plan(2, 2));
    state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 1,
        },
    );
    let enrollment_id = state.enrollments[0].enrollment_id.unwrap();

    let state = apply_ok(&state, Command::CancelEnrollment { enrollment_id });
    assert_eq!(
        state.find_enrollment(enrollment_id).unwrap().status,
        EnrollmentStatus::Canceled
    );

    // Re-applying lands on the same terminal state.
    let state = apply_ok(&state, Command::CancelEnrollment { enrollment_id });
    assert_eq!(
        state.find_enrollment(enrollment_id).unwrap().status,
        EnrollmentStatus::Canceled
    );
}

#[test]
fn test_scenario_one_child_two_slots() {
    // Plan 2x2, one child: W1 ok, W2 ok, W3 rejected on the per-child cap.
    let mut state = pending_state(test_plan(2, 2));
    state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 1,
        },
    );
    assert_eq!(state.active_enrollment_count(), 1);

    state = apply_ok(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 2,
        },
    );
    assert_eq!(state.active_enrollment_count(), 2);

    let err = apply(
        &state,
        Command::CreateEnrollment {
            child_id: 1,
            workshop_id: 3,
        },
        today(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        CoreError::DomainViolation(DomainError::ChildWorkshopLimitExceeded { limit: 2 })
    );
}
