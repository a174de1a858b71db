// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for guardian and child profile management.

use caissa_persistence::Persistence;

use crate::error::ApiError;
use crate::gateway::UnconfiguredGateway;
use crate::handlers::{
    create_child, delete_child, delete_guardian, get_guardian, list_children, list_guardians,
    signup, update_child, update_guardian,
};
use crate::request_response::{SignupResponse, UpdateGuardianRequest};

use super::helpers;

fn signed_up(persistence: &mut Persistence) -> SignupResponse {
    let (plan_id, workshop_ids) = helpers::seed_catalog(persistence);
    let request = helpers::signup_request("maria@example.cl", plan_id, workshop_ids, "transfer");
    signup(
        persistence,
        &UnconfiguredGateway,
        &helpers::RecordingNotifier::new(),
        &request,
        helpers::today(),
    )
    .unwrap()
}

#[test]
fn test_guardian_can_update_own_contact_details() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let response = signed_up(&mut persistence);
    let guardian = helpers::guardian_principal(response.user_id, response.guardian_id);

    let updated = update_guardian(
        &mut persistence,
        &guardian,
        response.guardian_id,
        &UpdateGuardianRequest {
            phone: String::from("+56 9 8765 4321"),
            allow_whatsapp_group: false,
        },
    )
    .unwrap();

    assert_eq!(updated.phone, "+56 9 8765 4321");
    assert!(!updated.allow_whatsapp_group);

    let stored = get_guardian(&mut persistence, &guardian, response.guardian_id).unwrap();
    assert_eq!(stored, updated);
}

#[test]
fn test_guardian_cannot_read_another_profile() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let response = signed_up(&mut persistence);

    let stranger = helpers::guardian_principal(999, response.guardian_id + 1);
    let err = get_guardian(&mut persistence, &stranger, response.guardian_id).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
}

#[test]
fn test_child_crud_under_own_guardian() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let response = signed_up(&mut persistence);
    let guardian = helpers::guardian_principal(response.user_id, response.guardian_id);

    let created = create_child(
        &mut persistence,
        &guardian,
        response.guardian_id,
        &helpers::sample_child("Emilia"),
    )
    .unwrap();
    let child_id = created.child_id.expect("Stored id");
    assert_eq!(created.guardian_id, response.guardian_id);
    assert_eq!(created.knowledge_level, Some(caissa_domain::KnowledgeLevel::Basic));

    // The signup child plus the new one.
    let children = list_children(&mut persistence, &guardian, response.guardian_id).unwrap();
    assert_eq!(children.len(), 2);

    let mut payload = helpers::sample_child("Emilia");
    payload.knowledge_level = Some(String::from("regular"));
    let updated = update_child(&mut persistence, &guardian, child_id, &payload).unwrap();
    assert_eq!(
        updated.knowledge_level,
        Some(caissa_domain::KnowledgeLevel::Regular)
    );

    delete_child(&mut persistence, &guardian, child_id).unwrap();
    let children = list_children(&mut persistence, &guardian, response.guardian_id).unwrap();
    assert_eq!(children.len(), 1);
}

#[test]
fn test_child_edits_require_the_owning_guardian() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let response = signed_up(&mut persistence);
    assert_eq!(response.child_ids.len(), 1);

    let stranger = helpers::guardian_principal(999, response.guardian_id + 1);
    let err = delete_child(&mut persistence, &stranger, response.child_ids[0]).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
}

#[test]
fn test_child_rejects_unknown_knowledge_level() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let response = signed_up(&mut persistence);
    let guardian = helpers::guardian_principal(response.user_id, response.guardian_id);

    let mut payload = helpers::sample_child("Emilia");
    payload.knowledge_level = Some(String::from("grandmaster"));
    let err = create_child(&mut persistence, &guardian, response.guardian_id, &payload)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput { field, .. } if field == "knowledge_level"));
}

#[test]
fn test_delete_guardian_cascades_to_the_account() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let response = signed_up(&mut persistence);

    delete_guardian(&mut persistence, &helpers::admin(), response.guardian_id).unwrap();

    assert!(
        persistence
            .find_account_by_email("maria@example.cl")
            .unwrap()
            .is_none()
    );
    let guardians = list_guardians(&mut persistence, &helpers::admin()).unwrap();
    assert!(guardians.is_empty());
}

#[test]
fn test_delete_guardian_is_admin_only() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let response = signed_up(&mut persistence);
    let guardian = helpers::guardian_principal(response.user_id, response.guardian_id);

    let err = delete_guardian(&mut persistence, &guardian, response.guardian_id).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
}

#[test]
fn test_list_guardians_reports_account_details() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let response = signed_up(&mut persistence);

    let guardians = list_guardians(&mut persistence, &helpers::admin()).unwrap();
    assert_eq!(guardians.len(), 1);
    assert_eq!(guardians[0].email, "maria@example.cl");
    assert_eq!(
        guardians[0].guardian.guardian_id,
        Some(response.guardian_id)
    );
}
