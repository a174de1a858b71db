// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Enum-valued fields cross the boundary as strings and are parsed in the
//! handlers; times of day use `HH:MM`.

use caissa_domain::{Enrollment, Order, Subscription};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::gateway::GatewayRedirect;

/// API request to authenticate an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The account email.
    pub email: String,
    /// The account password.
    pub password: String,
}

/// API response for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The opaque session token for subsequent requests.
    pub session_token: String,
    /// The account identifier.
    pub user_id: i64,
    /// The account email.
    pub email: String,
    /// The account display name.
    pub name: String,
    /// Whether the account has administrative authority.
    pub is_admin: bool,
    /// The guardian profile owned by the account, if any.
    pub guardian_id: Option<i64>,
}

/// API response describing the authenticated principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    /// The account identifier.
    pub user_id: i64,
    /// The account email.
    pub email: String,
    /// The account display name.
    pub name: String,
    /// Whether the account has administrative authority.
    pub is_admin: bool,
    /// The guardian profile owned by the account, if any.
    pub guardian_id: Option<i64>,
}

/// Plan fields for create and update requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPayload {
    /// The unique plan name.
    pub name: String,
    /// Maximum number of children covered by the plan.
    pub max_children: u32,
    /// Maximum number of workshops per child.
    pub max_workshops_per_child: u32,
    /// Monthly price in CLP.
    pub price_monthly: i64,
    /// Quarterly discount percentage applied to three months.
    pub quarterly_discount_pct: u32,
    /// Whether the plan is offered to new signups.
    pub is_active: bool,
}

/// Workshop fields for create and update requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopPayload {
    /// The workshop display name.
    pub name: String,
    /// The weekday, e.g. `monday`.
    pub day_of_week: String,
    /// Start time of day as `HH:MM`.
    pub start_time: String,
    /// End time of day as `HH:MM`, if fixed.
    pub end_time: Option<String>,
    /// The venue address.
    pub address: Option<String>,
    /// The advertised capacity, if limited.
    pub capacity: Option<u32>,
    /// Whether the workshop is offered to new enrollments.
    pub is_active: bool,
}

/// Child fields for signup and profile requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildPayload {
    /// The child's name.
    pub name: String,
    /// The child's birthdate.
    pub birthdate: Option<Date>,
    /// Chess knowledge level, e.g. `basic`.
    pub knowledge_level: Option<String>,
    /// Free-text health information for the instructors.
    pub health_info: Option<String>,
    /// Whether photos and video of the child may be published.
    pub allow_media: bool,
}

/// API request for the public signup flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    /// The guardian's name.
    pub guardian_name: String,
    /// The guardian's email; becomes the account login.
    pub guardian_email: String,
    /// The account password.
    pub password: String,
    /// The guardian's phone number.
    pub phone: String,
    /// Whether the guardian opts into the WhatsApp group.
    pub allow_whatsapp_group: bool,
    /// The chosen plan.
    pub plan_id: i64,
    /// The billing cycle, `monthly` or `quarterly`.
    pub billing_cycle: String,
    /// The payment method, `webpay`, `transfer` or `in_person`.
    pub payment_method: String,
    /// The children to register.
    pub children: Vec<ChildPayload>,
    /// Workshops to enroll each child in; every child is crossed with
    /// every workshop listed.
    pub workshop_ids: Vec<i64>,
    /// The subscription start date; defaults to today.
    pub start_date: Option<Date>,
    /// Whether the guardian accepted the terms and conditions.
    pub accepts_terms: bool,
    /// Where the gateway should send the guardian back to, for webpay.
    pub return_url: Option<String>,
}

/// API response for a successful signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    /// The created account identifier.
    pub user_id: i64,
    /// The created guardian profile identifier.
    pub guardian_id: i64,
    /// The created subscription identifier.
    pub subscription_id: i64,
    /// The created child identifiers, in request order.
    pub child_ids: Vec<i64>,
    /// The initial pending order identifier.
    pub order_id: i64,
    /// The charged amount in CLP.
    pub amount_clp: i64,
    /// Gateway redirect for webpay orders; absent for other methods.
    pub gateway: Option<GatewayRedirect>,
    /// A success message.
    pub message: String,
}

/// API response for the public order view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    /// The order.
    pub order: Order,
    /// The subscription the order belongs to.
    pub subscription: Subscription,
}

/// One subscription with its enrollments and orders, for the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionOverview {
    /// The subscription.
    pub subscription: Subscription,
    /// All enrollment rows under the subscription, history included.
    pub enrollments: Vec<Enrollment>,
    /// All orders under the subscription, newest first.
    pub orders: Vec<Order>,
}

/// API request to update a guardian profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGuardianRequest {
    /// The guardian's phone number.
    pub phone: String,
    /// Whether the guardian opts into the WhatsApp group.
    pub allow_whatsapp_group: bool,
}

/// API request to move an enrollment to another workshop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveEnrollmentRequest {
    /// The destination workshop.
    pub new_workshop_id: i64,
}

/// API request to cancel a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSubscriptionRequest {
    /// Whether currently-active enrollments are canceled as well.
    pub cancel_enrollments: bool,
    /// The effective end date; defaults to today.
    pub end_date: Option<Date>,
}

/// API request to open a renewal order on a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewalOrderRequest {
    /// The payment method, `webpay`, `transfer` or `in_person`.
    pub payment_method: String,
}

/// API request to start a gateway payment for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGatewayPaymentRequest {
    /// Where the gateway should send the guardian back to.
    pub return_url: String,
}

/// API request delivered by the gateway return redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayReturnRequest {
    /// The gateway-assigned transaction token.
    pub token: String,
}

/// API response for a settled payment attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResultResponse {
    /// The order after the attempt.
    pub order: Order,
    /// The subscription after the attempt.
    pub subscription: Subscription,
    /// Whether the payment was authorized.
    pub authorized: bool,
    /// A human-readable outcome message.
    pub message: String,
}
