// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The API layer: sessions, authorization, DTOs, and handler functions.
//!
//! Handlers are plain functions over `&mut Persistence` so they can be
//! driven by any transport. The HTTP server wires them to routes; the
//! tests call them directly.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod error;
mod gateway;
mod handlers;
mod notify;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticationService, AuthorizationService, Principal};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error,
    translate_persistence_error, translate_signup_error,
};
pub use gateway::{
    GatewayCommit, GatewayError, GatewayRedirect, PaymentGateway, UnconfiguredGateway,
};
pub use handlers::{
    cancel_enrollment, cancel_subscription, complete_gateway_payment, confirm_order, create_child,
    create_plan, create_renewal_order, create_workshop, delete_child, delete_guardian, delete_plan,
    delete_workshop, get_guardian, get_order_view, list_active_plans, list_active_workshops,
    list_all_plans, list_all_workshops, list_children, list_guardian_orders,
    list_guardian_subscriptions, list_guardians, list_orders_by_status, list_subscriptions, login,
    logout, move_enrollment, reactivate_subscription, revert_order, set_plan_active,
    set_workshop_active, signup, start_gateway_payment, update_child, update_guardian, update_plan,
    update_workshop, whoami,
};
pub use notify::{LogNotifier, Notification, NotificationSender, send_best_effort};
pub use request_response::{
    CancelSubscriptionRequest, ChildPayload, GatewayReturnRequest, LoginRequest, LoginResponse,
    MoveEnrollmentRequest, OrderView, PaymentResultResponse, PlanPayload, RenewalOrderRequest,
    SignupRequest, SignupResponse, StartGatewayPaymentRequest, SubscriptionOverview,
    UpdateGuardianRequest, WhoAmIResponse, WorkshopPayload,
};
