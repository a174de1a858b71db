// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for login, sessions, and the admin gates on the catalog.

use caissa_persistence::Persistence;

use crate::auth::AuthenticationService;
use crate::error::{ApiError, AuthError};
use crate::gateway::UnconfiguredGateway;
use crate::handlers::{
    create_plan, delete_workshop, list_active_plans, list_all_plans, login, logout,
    set_plan_active, signup, whoami,
};
use crate::request_response::{LoginRequest, PlanPayload};

use super::helpers;

fn plan_payload(name: &str) -> PlanPayload {
    PlanPayload {
        name: name.to_string(),
        max_children: 1,
        max_workshops_per_child: 1,
        price_monthly: 18_000,
        quarterly_discount_pct: 0,
        is_active: true,
    }
}

#[test]
fn test_login_returns_principal_with_guardian_profile() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (plan_id, workshop_ids) = helpers::seed_catalog(&mut persistence);
    let request = helpers::signup_request("maria@example.cl", plan_id, workshop_ids, "transfer");
    let response = signup(
        &mut persistence,
        &UnconfiguredGateway,
        &helpers::RecordingNotifier::new(),
        &request,
        helpers::today(),
    )
    .unwrap();

    let session = login(
        &mut persistence,
        &LoginRequest {
            email: String::from("maria@example.cl"),
            password: String::from("caissa-pass"),
        },
    )
    .unwrap();

    assert!(!session.is_admin);
    assert_eq!(session.guardian_id, Some(response.guardian_id));
    assert_eq!(session.session_token.len(), 64);

    let principal =
        AuthenticationService::validate_session(&mut persistence, &session.session_token).unwrap();
    let me = whoami(&principal);
    assert_eq!(me.email, "maria@example.cl");
    assert_eq!(me.guardian_id, Some(response.guardian_id));
}

#[test]
fn test_login_failure_is_indistinguishable() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (plan_id, workshop_ids) = helpers::seed_catalog(&mut persistence);
    let request = helpers::signup_request("maria@example.cl", plan_id, workshop_ids, "transfer");
    signup(
        &mut persistence,
        &UnconfiguredGateway,
        &helpers::RecordingNotifier::new(),
        &request,
        helpers::today(),
    )
    .unwrap();

    let wrong_password = login(
        &mut persistence,
        &LoginRequest {
            email: String::from("maria@example.cl"),
            password: String::from("not-the-password"),
        },
    )
    .unwrap_err();
    let unknown_email = login(
        &mut persistence,
        &LoginRequest {
            email: String::from("nobody@example.cl"),
            password: String::from("caissa-pass"),
        },
    )
    .unwrap_err();

    assert_eq!(wrong_password, unknown_email);
}

#[test]
fn test_logout_invalidates_the_session() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (plan_id, workshop_ids) = helpers::seed_catalog(&mut persistence);
    let request = helpers::signup_request("maria@example.cl", plan_id, workshop_ids, "transfer");
    signup(
        &mut persistence,
        &UnconfiguredGateway,
        &helpers::RecordingNotifier::new(),
        &request,
        helpers::today(),
    )
    .unwrap();

    let session = login(
        &mut persistence,
        &LoginRequest {
            email: String::from("maria@example.cl"),
            password: String::from("caissa-pass"),
        },
    )
    .unwrap();
    logout(&mut persistence, &session.session_token).unwrap();

    let err = AuthenticationService::validate_session(&mut persistence, &session.session_token)
        .unwrap_err();
    assert!(matches!(err, AuthError::AuthenticationFailed { .. }));
}

#[test]
fn test_catalog_mutations_are_admin_only() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let guardian = helpers::guardian_principal(7, 3);

    let err = create_plan(&mut persistence, &guardian, &plan_payload("Inicial")).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    let err = set_plan_active(&mut persistence, &guardian, 1, false).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    let err = delete_workshop(&mut persistence, &guardian, 1).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
}

#[test]
fn test_retired_plans_are_hidden_from_the_public_listing() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let admin = helpers::admin();

    let offered = create_plan(&mut persistence, &admin, &plan_payload("Inicial")).unwrap();
    let retired = create_plan(&mut persistence, &admin, &plan_payload("Antiguo")).unwrap();
    set_plan_active(
        &mut persistence,
        &admin,
        retired.plan_id.expect("Stored id"),
        false,
    )
    .unwrap();

    let public = list_active_plans(&mut persistence).unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].plan_id, offered.plan_id);

    let all = list_all_plans(&mut persistence, &admin).unwrap();
    assert_eq!(all.len(), 2);

    let err = list_all_plans(&mut persistence, &helpers::guardian_principal(7, 3)).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
}
