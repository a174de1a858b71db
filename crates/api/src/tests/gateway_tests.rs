// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for the redirect-based gateway payment flow.

use caissa_domain::{PaymentStatus, SubscriptionStatus};
use caissa_persistence::Persistence;

use crate::error::ApiError;
use crate::handlers::{
    complete_gateway_payment, get_order_view, signup, start_gateway_payment,
};
use crate::request_response::{SignupResponse, StartGatewayPaymentRequest};

use super::helpers;
use super::helpers::{StubGateway, StubMode};

fn webpay_signup(persistence: &mut Persistence, gateway: &StubGateway) -> SignupResponse {
    let (plan_id, workshop_ids) = helpers::seed_catalog(persistence);
    let request = helpers::signup_request("maria@example.cl", plan_id, workshop_ids, "webpay");
    signup(
        persistence,
        gateway,
        &helpers::RecordingNotifier::new(),
        &request,
        helpers::today(),
    )
    .unwrap()
}

#[test]
fn test_webpay_signup_returns_redirect_and_stamps_the_order() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let gateway = StubGateway {
        mode: StubMode::Authorize,
    };
    let response = webpay_signup(&mut persistence, &gateway);

    let redirect = response.gateway.expect("Gateway redirect expected");
    assert_eq!(redirect.url, "https://gateway.example/pay");

    let view = get_order_view(&mut persistence, response.order_id).unwrap();
    assert_eq!(view.order.external_id, Some(redirect.token));
    assert_eq!(view.order.payment_status, PaymentStatus::Pending);
}

#[test]
fn test_authorized_return_pays_the_order_and_activates() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let gateway = StubGateway {
        mode: StubMode::Authorize,
    };
    let response = webpay_signup(&mut persistence, &gateway);
    let token = response.gateway.expect("Gateway redirect expected").token;
    let notifier = helpers::RecordingNotifier::new();

    let result =
        complete_gateway_payment(&mut persistence, &gateway, &notifier, &token, helpers::today())
            .unwrap();

    assert!(result.authorized);
    assert_eq!(result.order.payment_status, PaymentStatus::Paid);
    assert_eq!(result.subscription.status, SubscriptionStatus::Active);
    // The gateway's raw answer is kept on the order.
    let detail = result.order.detail.expect("Commit snapshot expected");
    assert!(detail.contains("AUTHORIZED"));

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Pago confirmado");
}

#[test]
fn test_declined_return_fails_the_order() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let gateway = StubGateway {
        mode: StubMode::Decline,
    };
    let response = webpay_signup(&mut persistence, &gateway);
    let token = response.gateway.expect("Gateway redirect expected").token;
    let notifier = helpers::RecordingNotifier::new();

    let result =
        complete_gateway_payment(&mut persistence, &gateway, &notifier, &token, helpers::today())
            .unwrap();

    assert!(!result.authorized);
    assert_eq!(result.order.payment_status, PaymentStatus::Failed);
    assert_eq!(result.subscription.status, SubscriptionStatus::Pending);
    // No payment confirmation for a declined commit.
    assert!(notifier.sent.borrow().is_empty());
}

#[test]
fn test_return_token_is_single_use() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let gateway = StubGateway {
        mode: StubMode::Authorize,
    };
    let response = webpay_signup(&mut persistence, &gateway);
    let token = response.gateway.expect("Gateway redirect expected").token;
    let notifier = helpers::RecordingNotifier::new();

    complete_gateway_payment(&mut persistence, &gateway, &notifier, &token, helpers::today())
        .unwrap();
    let err =
        complete_gateway_payment(&mut persistence, &gateway, &notifier, &token, helpers::today())
            .unwrap_err();

    assert!(matches!(err, ApiError::ResourceNotFound { .. }));
}

#[test]
fn test_unreachable_gateway_fails_the_order_at_signup() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (plan_id, workshop_ids) = helpers::seed_catalog(&mut persistence);
    let gateway = StubGateway {
        mode: StubMode::Unreachable,
    };

    let request = helpers::signup_request("maria@example.cl", plan_id, workshop_ids, "webpay");
    let err = signup(
        &mut persistence,
        &gateway,
        &helpers::RecordingNotifier::new(),
        &request,
        helpers::today(),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::GatewayFailure { .. }));

    // The signup itself committed; only the order is failed, and it can be
    // retried from the portal.
    let account = persistence
        .find_account_by_email("maria@example.cl")
        .unwrap()
        .expect("Account expected");
    let orders = persistence.list_orders_by_status(PaymentStatus::Failed).unwrap();
    assert_eq!(orders.len(), 1);
    assert!(account.user_id > 0);
}

#[test]
fn test_unreachable_commit_fails_the_order() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let creating = StubGateway {
        mode: StubMode::Authorize,
    };
    let response = webpay_signup(&mut persistence, &creating);
    let token = response.gateway.expect("Gateway redirect expected").token;

    let commit_gateway = StubGateway {
        mode: StubMode::Unreachable,
    };
    let err = complete_gateway_payment(
        &mut persistence,
        &commit_gateway,
        &helpers::RecordingNotifier::new(),
        &token,
        helpers::today(),
    )
    .unwrap_err();

    assert!(matches!(err, ApiError::GatewayFailure { .. }));
    let view = get_order_view(&mut persistence, response.order_id).unwrap();
    assert_eq!(view.order.payment_status, PaymentStatus::Failed);
}

#[test]
fn test_start_gateway_payment_retries_a_failed_order_after_revert() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (plan_id, workshop_ids) = helpers::seed_catalog(&mut persistence);
    let broken = StubGateway {
        mode: StubMode::Unreachable,
    };
    let request = helpers::signup_request("maria@example.cl", plan_id, workshop_ids, "webpay");
    signup(
        &mut persistence,
        &broken,
        &helpers::RecordingNotifier::new(),
        &request,
        helpers::today(),
    )
    .unwrap_err();

    let order = persistence
        .list_orders_by_status(PaymentStatus::Failed)
        .unwrap()
        .remove(0);
    let order_id = order.order_id.expect("Stored order has an id");

    // A failed order is not retryable as-is.
    let working = StubGateway {
        mode: StubMode::Authorize,
    };
    let start = StartGatewayPaymentRequest {
        return_url: String::from("https://caissa.cl/pago/retorno"),
    };
    let err = start_gateway_payment(
        &mut persistence,
        &working,
        &helpers::admin(),
        order_id,
        &start,
        helpers::today(),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::DomainRuleViolation { ref rule, .. } if rule == "order_not_pending"));

    // After an admin revert it goes through.
    crate::handlers::revert_order(&mut persistence, &helpers::admin(), order_id, helpers::today())
        .unwrap();
    let redirect = start_gateway_payment(
        &mut persistence,
        &working,
        &helpers::admin(),
        order_id,
        &start,
        helpers::today(),
    )
    .unwrap();
    assert_eq!(redirect.token, format!("tok-{order_id}"));
}
