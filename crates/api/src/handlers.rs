// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Handlers own the boundary work: authorization, DTO parsing, command
//! construction, and error translation. Every subscription mutation goes
//! through `caissa::apply` on a loaded aggregate and is written back with
//! `persist_subscription_state`.

use std::str::FromStr;

use serde_json::json;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};
use tracing::{info, warn};

use caissa::{Command, SubscriptionState, apply};
use caissa_domain::{
    BillingCycle, Child, DayOfWeek, Enrollment, EnrollmentStatus, Guardian, KnowledgeLevel, Order,
    PaymentMethod, PaymentStatus, Plan, Subscription, Workshop, subscription_amount_clp,
};
use caissa_persistence::{
    GuardianAccountData, NewChildData, PaymentContextData, Persistence, SignupData, SignupOutcome,
};

use crate::auth::{AuthenticationService, AuthorizationService, Principal};
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
    translate_signup_error,
};
use crate::gateway::{GatewayCommit, GatewayRedirect, PaymentGateway};
use crate::notify::{Notification, NotificationSender, send_best_effort};
use crate::request_response::{
    CancelSubscriptionRequest, ChildPayload, LoginRequest, LoginResponse, MoveEnrollmentRequest,
    OrderView, PaymentResultResponse, PlanPayload, RenewalOrderRequest, SignupRequest,
    SignupResponse, StartGatewayPaymentRequest, SubscriptionOverview, UpdateGuardianRequest,
    WhoAmIResponse, WorkshopPayload,
};

const TIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");

/// How long a stored payment context stays redeemable (30 minutes).
const PAYMENT_CONTEXT_TTL_SECONDS: i64 = 30 * 60;

// ============================================================================
// Authentication
// ============================================================================

/// Authenticates an account and opens a session.
///
/// # Errors
///
/// Returns `AuthenticationFailed` on bad credentials.
pub fn login(
    persistence: &mut Persistence,
    request: &LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let (session_token, principal): (String, Principal) =
        AuthenticationService::login(persistence, &request.email, &request.password)?;

    Ok(LoginResponse {
        session_token,
        user_id: principal.user_id,
        email: principal.email,
        name: principal.name,
        is_admin: principal.is_admin,
        guardian_id: principal.guardian_id,
    })
}

/// Closes the session behind a token.
///
/// # Errors
///
/// Returns an error if the session delete fails.
pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(())
}

/// Describes the authenticated principal.
#[must_use]
pub fn whoami(principal: &Principal) -> WhoAmIResponse {
    WhoAmIResponse {
        user_id: principal.user_id,
        email: principal.email.clone(),
        name: principal.name.clone(),
        is_admin: principal.is_admin,
        guardian_id: principal.guardian_id,
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Lists the plans offered to new signups. Public.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_active_plans(persistence: &mut Persistence) -> Result<Vec<Plan>, ApiError> {
    persistence
        .list_active_plans()
        .map_err(translate_persistence_error)
}

/// Lists the workshops offered to new enrollments, in schedule order.
/// Public.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_active_workshops(persistence: &mut Persistence) -> Result<Vec<Workshop>, ApiError> {
    persistence
        .list_active_workshops()
        .map_err(translate_persistence_error)
}

/// Lists every plan, retired ones included. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the query fails.
pub fn list_all_plans(
    persistence: &mut Persistence,
    principal: &Principal,
) -> Result<Vec<Plan>, ApiError> {
    AuthorizationService::require_admin(principal, "list_all_plans")?;
    persistence
        .list_all_plans()
        .map_err(translate_persistence_error)
}

/// Lists every workshop, retired ones included. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the query fails.
pub fn list_all_workshops(
    persistence: &mut Persistence,
    principal: &Principal,
) -> Result<Vec<Workshop>, ApiError> {
    AuthorizationService::require_admin(principal, "list_all_workshops")?;
    persistence
        .list_all_workshops()
        .map_err(translate_persistence_error)
}

fn plan_from_payload(payload: &PlanPayload, plan_id: Option<i64>) -> Plan {
    Plan {
        plan_id,
        name: payload.name.clone(),
        max_children: payload.max_children,
        max_workshops_per_child: payload.max_workshops_per_child,
        price_monthly: payload.price_monthly,
        quarterly_discount_pct: payload.quarterly_discount_pct,
        is_active: payload.is_active,
    }
}

fn workshop_from_payload(
    payload: &WorkshopPayload,
    workshop_id: Option<i64>,
) -> Result<Workshop, ApiError> {
    let day_of_week: DayOfWeek =
        DayOfWeek::from_str(&payload.day_of_week).map_err(translate_domain_error)?;
    let start_time: Time = parse_time_of_day(&payload.start_time, "start_time")?;
    let end_time: Option<Time> = payload
        .end_time
        .as_deref()
        .map(|s| parse_time_of_day(s, "end_time"))
        .transpose()?;

    Ok(Workshop {
        workshop_id,
        name: payload.name.clone(),
        day_of_week,
        start_time,
        end_time,
        address: payload.address.clone(),
        capacity: payload.capacity,
        is_active: payload.is_active,
    })
}

fn parse_time_of_day(value: &str, field: &str) -> Result<Time, ApiError> {
    Time::parse(value, &TIME_FORMAT).map_err(|_| ApiError::InvalidInput {
        field: field.to_string(),
        message: format!("Expected HH:MM, got '{value}'"),
    })
}

/// Creates a plan. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the insert fails.
pub fn create_plan(
    persistence: &mut Persistence,
    principal: &Principal,
    payload: &PlanPayload,
) -> Result<Plan, ApiError> {
    AuthorizationService::require_admin(principal, "create_plan")?;

    let plan: Plan = plan_from_payload(payload, None);
    let plan_id: i64 = persistence
        .create_plan(&plan)
        .map_err(translate_persistence_error)?;

    info!(plan_id, name = %payload.name, "Plan created");
    Ok(Plan {
        plan_id: Some(plan_id),
        ..plan
    })
}

/// Updates a plan in place. Admin only.
///
/// Existing orders keep the amount they were created with; a price edit
/// only affects orders created afterwards.
///
/// # Errors
///
/// Returns an error if the principal is not an admin, the plan does not
/// exist, or the update fails.
pub fn update_plan(
    persistence: &mut Persistence,
    principal: &Principal,
    plan_id: i64,
    payload: &PlanPayload,
) -> Result<Plan, ApiError> {
    AuthorizationService::require_admin(principal, "update_plan")?;

    let plan: Plan = plan_from_payload(payload, Some(plan_id));
    persistence
        .update_plan(&plan)
        .map_err(translate_persistence_error)?;

    info!(plan_id, "Plan updated");
    Ok(plan)
}

/// Flips a plan's active flag. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the plan does
/// not exist.
pub fn set_plan_active(
    persistence: &mut Persistence,
    principal: &Principal,
    plan_id: i64,
    active: bool,
) -> Result<(), ApiError> {
    AuthorizationService::require_admin(principal, "set_plan_active")?;
    persistence
        .set_plan_active(plan_id, active)
        .map_err(translate_persistence_error)
}

/// Deletes a plan. Admin only; fails while subscriptions reference it.
///
/// # Errors
///
/// Returns an error if the principal is not an admin, the plan does not
/// exist, or rows still reference it.
pub fn delete_plan(
    persistence: &mut Persistence,
    principal: &Principal,
    plan_id: i64,
) -> Result<(), ApiError> {
    AuthorizationService::require_admin(principal, "delete_plan")?;
    persistence
        .delete_plan(plan_id)
        .map_err(translate_persistence_error)
}

/// Creates a workshop. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin, a field fails to
/// parse, or the insert fails.
pub fn create_workshop(
    persistence: &mut Persistence,
    principal: &Principal,
    payload: &WorkshopPayload,
) -> Result<Workshop, ApiError> {
    AuthorizationService::require_admin(principal, "create_workshop")?;

    let workshop: Workshop = workshop_from_payload(payload, None)?;
    let workshop_id: i64 = persistence
        .create_workshop(&workshop)
        .map_err(translate_persistence_error)?;

    info!(workshop_id, name = %payload.name, "Workshop created");
    Ok(Workshop {
        workshop_id: Some(workshop_id),
        ..workshop
    })
}

/// Updates a workshop in place. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin, a field fails to
/// parse, or the workshop does not exist.
pub fn update_workshop(
    persistence: &mut Persistence,
    principal: &Principal,
    workshop_id: i64,
    payload: &WorkshopPayload,
) -> Result<Workshop, ApiError> {
    AuthorizationService::require_admin(principal, "update_workshop")?;

    let workshop: Workshop = workshop_from_payload(payload, Some(workshop_id))?;
    persistence
        .update_workshop(&workshop)
        .map_err(translate_persistence_error)?;

    info!(workshop_id, "Workshop updated");
    Ok(workshop)
}

/// Flips a workshop's active flag. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the workshop
/// does not exist.
pub fn set_workshop_active(
    persistence: &mut Persistence,
    principal: &Principal,
    workshop_id: i64,
    active: bool,
) -> Result<(), ApiError> {
    AuthorizationService::require_admin(principal, "set_workshop_active")?;
    persistence
        .set_workshop_active(workshop_id, active)
        .map_err(translate_persistence_error)
}

/// Deletes a workshop. Admin only; fails while enrollments reference it.
///
/// # Errors
///
/// Returns an error if the principal is not an admin, the workshop does
/// not exist, or rows still reference it.
pub fn delete_workshop(
    persistence: &mut Persistence,
    principal: &Principal,
    workshop_id: i64,
) -> Result<(), ApiError> {
    AuthorizationService::require_admin(principal, "delete_workshop")?;
    persistence
        .delete_workshop(workshop_id)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Signup
// ============================================================================

/// Runs the public signup flow.
///
/// Validates the catalog references, computes the charge from the plan's
/// current price, executes the all-or-nothing signup transaction, sends
/// the confirmation notification, and for webpay orders hands the initial
/// order to the payment gateway.
///
/// # Errors
///
/// Returns `InvalidInput` for bad fields or a duplicate email,
/// `DomainRuleViolation` when the enrollment mix exceeds the plan's
/// limits, and `GatewayFailure` when the gateway cannot accept the order
/// (the order is marked `failed` first).
#[allow(clippy::too_many_lines)]
pub fn signup(
    persistence: &mut Persistence,
    gateway: &dyn PaymentGateway,
    notifier: &dyn NotificationSender,
    request: &SignupRequest,
    today: Date,
) -> Result<SignupResponse, ApiError> {
    if !request.accepts_terms {
        return Err(ApiError::InvalidInput {
            field: String::from("accepts_terms"),
            message: String::from("The terms and conditions must be accepted"),
        });
    }
    if request.children.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("children"),
            message: String::from("At least one child is required"),
        });
    }
    if request.workshop_ids.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("workshop_ids"),
            message: String::from("At least one workshop is required"),
        });
    }

    // Reject the duplicate before any work happens; the transaction would
    // also catch it, but this keeps the common case cheap and the error
    // precise.
    let existing = persistence
        .find_account_by_email(&request.guardian_email)
        .map_err(translate_persistence_error)?;
    if existing.is_some() {
        return Err(ApiError::InvalidInput {
            field: String::from("guardian_email"),
            message: format!("An account already exists for '{}'", request.guardian_email),
        });
    }

    let billing_cycle: BillingCycle =
        BillingCycle::from_str(&request.billing_cycle).map_err(translate_domain_error)?;
    let payment_method: PaymentMethod =
        PaymentMethod::from_str(&request.payment_method).map_err(translate_domain_error)?;
    let return_url: Option<&str> = request.return_url.as_deref();
    if payment_method == PaymentMethod::Webpay && return_url.is_none() {
        return Err(ApiError::InvalidInput {
            field: String::from("return_url"),
            message: String::from("A return URL is required for webpay payments"),
        });
    }

    let plan: Plan = persistence
        .get_plan(request.plan_id)
        .map_err(translate_persistence_error)?;
    if !plan.is_active {
        return Err(ApiError::InvalidInput {
            field: String::from("plan_id"),
            message: format!("Plan '{}' is not currently offered", plan.name),
        });
    }

    for workshop_id in &request.workshop_ids {
        let workshop: Workshop = persistence
            .get_workshop(*workshop_id)
            .map_err(translate_persistence_error)?;
        if !workshop.is_active {
            return Err(ApiError::InvalidInput {
                field: String::from("workshop_ids"),
                message: format!("Workshop '{}' is not currently offered", workshop.name),
            });
        }
    }

    let children: Vec<NewChildData> = request
        .children
        .iter()
        .map(|c| child_data_from_payload(c))
        .collect::<Result<_, _>>()?;

    // The amount is fixed here, before the transaction: a later plan edit
    // never changes what this signup is charged.
    let amount_clp: i64 = subscription_amount_clp(&plan, billing_cycle);

    let data: SignupData = SignupData {
        guardian_name: request.guardian_name.clone(),
        guardian_email: request.guardian_email.clone(),
        password: request.password.clone(),
        phone: request.phone.clone(),
        allow_whatsapp_group: request.allow_whatsapp_group,
        plan,
        billing_cycle,
        payment_method,
        children,
        workshop_ids: request.workshop_ids.clone(),
        amount_clp,
        start_date: request.start_date,
        terms_accepted_at: OffsetDateTime::now_utc(),
    };

    let outcome: SignupOutcome = persistence
        .signup(&data, today)
        .map_err(translate_signup_error)?;

    info!(
        user_id = outcome.user_id,
        subscription_id = outcome.subscription_id,
        order_id = outcome.order_id,
        amount_clp = outcome.amount_clp,
        "Signup completed"
    );

    send_best_effort(
        notifier,
        &Notification {
            recipient: request.guardian_email.clone(),
            subject: String::from("Inscripción recibida"),
            body: format!(
                "Your subscription is registered and pending payment of {} CLP.",
                outcome.amount_clp
            ),
        },
    );

    let gateway_redirect: Option<GatewayRedirect> = match (payment_method, return_url) {
        (PaymentMethod::Webpay, Some(url)) => Some(start_gateway_for_order(
            persistence,
            gateway,
            outcome.order_id,
            url,
            today,
        )?),
        _ => None,
    };

    Ok(SignupResponse {
        user_id: outcome.user_id,
        guardian_id: outcome.guardian_id,
        subscription_id: outcome.subscription_id,
        child_ids: outcome.child_ids,
        order_id: outcome.order_id,
        amount_clp: outcome.amount_clp,
        gateway: gateway_redirect,
        message: String::from("Signup registered; the subscription activates once paid"),
    })
}

fn child_data_from_payload(payload: &ChildPayload) -> Result<NewChildData, ApiError> {
    let knowledge_level: Option<KnowledgeLevel> = payload
        .knowledge_level
        .as_deref()
        .map(KnowledgeLevel::from_str)
        .transpose()
        .map_err(translate_domain_error)?;

    Ok(NewChildData {
        name: payload.name.clone(),
        birthdate: payload.birthdate,
        knowledge_level,
        health_info: payload.health_info.clone(),
        allow_media: payload.allow_media,
    })
}

// ============================================================================
// Aggregate helpers
// ============================================================================

fn load_state(
    persistence: &mut Persistence,
    subscription_id: i64,
) -> Result<SubscriptionState, ApiError> {
    persistence
        .load_subscription_state(subscription_id)
        .map_err(translate_persistence_error)
}

/// Applies one command to a subscription aggregate and writes the result
/// back. Returns the persisted aggregate with all ids filled.
fn apply_and_persist(
    persistence: &mut Persistence,
    subscription_id: i64,
    command: Command,
    today: Date,
) -> Result<SubscriptionState, ApiError> {
    let state: SubscriptionState = load_state(persistence, subscription_id)?;
    let result = apply(&state, command, today).map_err(translate_core_error)?;
    persistence
        .persist_subscription_state(&result.new_state)
        .map_err(translate_persistence_error)
}

fn find_order_in_state(state: &SubscriptionState, order_id: i64) -> Result<Order, ApiError> {
    state
        .orders
        .iter()
        .find(|o| o.order_id == Some(order_id))
        .cloned()
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Order"),
            message: format!("Order {order_id} does not exist in this subscription"),
        })
}

// ============================================================================
// Orders
// ============================================================================

/// Retrieves an order together with its subscription. Public: the order
/// id doubles as the payment reference printed on transfer instructions.
///
/// # Errors
///
/// Returns an error if the order does not exist.
pub fn get_order_view(persistence: &mut Persistence, order_id: i64) -> Result<OrderView, ApiError> {
    let order: Order = persistence
        .get_order(order_id)
        .map_err(translate_persistence_error)?;
    let subscription: Subscription = persistence
        .get_subscription(order.subscription_id)
        .map_err(translate_persistence_error)?;

    Ok(OrderView {
        order,
        subscription,
    })
}

/// Marks an order paid, activating a pending subscription. Admin only.
///
/// This is the manual confirmation path for transfer and in-person
/// payments.
///
/// # Errors
///
/// Returns an error if the principal is not an admin, the order does not
/// exist, or the transition is not permitted (a `failed` order must be
/// reverted to `pending` first).
pub fn confirm_order(
    persistence: &mut Persistence,
    principal: &Principal,
    notifier: &dyn NotificationSender,
    order_id: i64,
    today: Date,
) -> Result<PaymentResultResponse, ApiError> {
    AuthorizationService::require_admin(principal, "confirm_order")?;

    let order: Order = persistence
        .get_order(order_id)
        .map_err(translate_persistence_error)?;
    let persisted: SubscriptionState = apply_and_persist(
        persistence,
        order.subscription_id,
        Command::MarkOrderPaid { order_id },
        today,
    )?;

    info!(order_id, subscription_id = order.subscription_id, "Order confirmed paid");

    let email: String = persistence
        .guardian_email(persisted.subscription.guardian_id)
        .map_err(translate_persistence_error)?;
    send_best_effort(
        notifier,
        &Notification {
            recipient: email,
            subject: String::from("Pago confirmado"),
            body: format!("Payment for order {order_id} was confirmed. Thank you!"),
        },
    );

    let order: Order = find_order_in_state(&persisted, order_id)?;
    Ok(PaymentResultResponse {
        order,
        subscription: persisted.subscription,
        authorized: true,
        message: String::from("Payment confirmed"),
    })
}

/// Administrative revert: reopens an order as `pending`. Admin only.
///
/// A prior subscription activation is never reversed by this.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the order does
/// not exist.
pub fn revert_order(
    persistence: &mut Persistence,
    principal: &Principal,
    order_id: i64,
    today: Date,
) -> Result<Order, ApiError> {
    AuthorizationService::require_admin(principal, "revert_order")?;

    let order: Order = persistence
        .get_order(order_id)
        .map_err(translate_persistence_error)?;
    let persisted: SubscriptionState = apply_and_persist(
        persistence,
        order.subscription_id,
        Command::MarkOrderPending { order_id },
        today,
    )?;

    info!(order_id, "Order reverted to pending");
    find_order_in_state(&persisted, order_id)
}

/// Opens a renewal order on a subscription, charged at the plan's
/// current price for the subscription's billing cycle. Owner or admin.
///
/// # Errors
///
/// Returns an error if the principal may not act on the subscription or
/// the payment method fails to parse.
pub fn create_renewal_order(
    persistence: &mut Persistence,
    principal: &Principal,
    subscription_id: i64,
    request: &RenewalOrderRequest,
    today: Date,
) -> Result<Order, ApiError> {
    let subscription: Subscription = persistence
        .get_subscription(subscription_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_owner_or_admin(
        principal,
        subscription.guardian_id,
        "create_renewal_order",
    )?;

    let method: PaymentMethod =
        PaymentMethod::from_str(&request.payment_method).map_err(translate_domain_error)?;
    let plan: Plan = persistence
        .get_plan(subscription.plan_id)
        .map_err(translate_persistence_error)?;
    let amount_clp: i64 = subscription_amount_clp(&plan, subscription.billing_cycle);

    let persisted: SubscriptionState = apply_and_persist(
        persistence,
        subscription_id,
        Command::CreateOrder { amount_clp, method },
        today,
    )?;

    // CreateOrder appends; the renewal is the newest row.
    let order: Order = persisted
        .orders
        .last()
        .cloned()
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Renewal order missing after persist"),
        })?;

    info!(
        subscription_id,
        order_id = order.order_id,
        amount_clp,
        "Renewal order created"
    );
    Ok(order)
}

/// Lists all orders in a given payment status. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the status
/// string fails to parse.
pub fn list_orders_by_status(
    persistence: &mut Persistence,
    principal: &Principal,
    status: &str,
) -> Result<Vec<Order>, ApiError> {
    AuthorizationService::require_admin(principal, "list_orders_by_status")?;
    let status: PaymentStatus = PaymentStatus::from_str(status).map_err(translate_domain_error)?;
    persistence
        .list_orders_by_status(status)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Gateway flows
// ============================================================================

/// Hands a pending order to the payment gateway and stores the retry
/// context under the gateway token.
///
/// A gateway fault marks the order `failed` so it is never left pending
/// behind a transaction that no longer exists.
fn start_gateway_for_order(
    persistence: &mut Persistence,
    gateway: &dyn PaymentGateway,
    order_id: i64,
    return_url: &str,
    today: Date,
) -> Result<GatewayRedirect, ApiError> {
    let order: Order = persistence
        .get_order(order_id)
        .map_err(translate_persistence_error)?;
    if order.payment_status != PaymentStatus::Pending {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("order_not_pending"),
            message: format!(
                "Order {order_id} is '{}' and cannot be sent to the gateway",
                order.payment_status
            ),
        });
    }

    let subscription: Subscription = persistence
        .get_subscription(order.subscription_id)
        .map_err(translate_persistence_error)?;
    let guardian_email: String = persistence
        .guardian_email(subscription.guardian_id)
        .map_err(translate_persistence_error)?;

    let redirect: GatewayRedirect = match gateway.create_for_order(&order, return_url) {
        Ok(redirect) => redirect,
        Err(e) => {
            warn!(order_id, error = %e, "Gateway refused the order; marking it failed");
            apply_and_persist(
                persistence,
                order.subscription_id,
                Command::MarkOrderFailed { order_id },
                today,
            )?;
            return Err(ApiError::from(e));
        }
    };

    // Stamp the gateway token on the order so the return flow can be
    // reconciled even if the stored context is lost.
    let state: SubscriptionState = load_state(persistence, order.subscription_id)?;
    let mut stamped: SubscriptionState = state;
    for o in &mut stamped.orders {
        if o.order_id == Some(order_id) {
            o.external_id = Some(redirect.token.clone());
        }
    }
    persistence
        .persist_subscription_state(&stamped)
        .map_err(translate_persistence_error)?;

    persistence
        .store_payment_context(
            &redirect.token,
            order_id,
            &guardian_email,
            subscription.plan_id,
            subscription.billing_cycle,
            PAYMENT_CONTEXT_TTL_SECONDS,
        )
        .map_err(translate_persistence_error)?;

    info!(order_id, token = %redirect.token, "Gateway transaction created");
    Ok(redirect)
}

/// Starts a gateway payment for a pending order. Owner or admin.
///
/// # Errors
///
/// Returns an error if the principal may not act on the order, the order
/// is not `pending`, or the gateway refuses it (the order is marked
/// `failed` first).
pub fn start_gateway_payment(
    persistence: &mut Persistence,
    gateway: &dyn PaymentGateway,
    principal: &Principal,
    order_id: i64,
    request: &StartGatewayPaymentRequest,
    today: Date,
) -> Result<GatewayRedirect, ApiError> {
    let order: Order = persistence
        .get_order(order_id)
        .map_err(translate_persistence_error)?;
    let subscription: Subscription = persistence
        .get_subscription(order.subscription_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_owner_or_admin(
        principal,
        subscription.guardian_id,
        "start_gateway_payment",
    )?;

    start_gateway_for_order(persistence, gateway, order_id, &request.return_url, today)
}

/// Settles a gateway payment on the return redirect. Unauthenticated:
/// the single-use token is the credential.
///
/// The stored context is consumed first, so a replayed token is rejected
/// even before the gateway is asked. An authorized commit marks the
/// order paid (activating a pending subscription); a declined commit
/// marks it failed. A gateway fault on commit also marks it failed.
///
/// # Errors
///
/// Returns an error for an unknown, replayed, or expired token, or when
/// the gateway cannot be reached.
pub fn complete_gateway_payment(
    persistence: &mut Persistence,
    gateway: &dyn PaymentGateway,
    notifier: &dyn NotificationSender,
    token: &str,
    today: Date,
) -> Result<PaymentResultResponse, ApiError> {
    let context: PaymentContextData = persistence
        .consume_payment_context(token)
        .map_err(translate_persistence_error)?;
    let order: Order = persistence
        .get_order(context.order_id)
        .map_err(translate_persistence_error)?;

    let commit: GatewayCommit = match gateway.commit(token) {
        Ok(commit) => commit,
        Err(e) => {
            warn!(order_id = context.order_id, error = %e,
                "Gateway commit failed; marking the order failed");
            apply_and_persist(
                persistence,
                order.subscription_id,
                Command::MarkOrderFailed {
                    order_id: context.order_id,
                },
                today,
            )?;
            return Err(ApiError::from(e));
        }
    };

    let authorized: bool = commit.is_authorized();
    let command: Command = if authorized {
        Command::MarkOrderPaid {
            order_id: context.order_id,
        }
    } else {
        Command::MarkOrderFailed {
            order_id: context.order_id,
        }
    };

    let state: SubscriptionState = load_state(persistence, order.subscription_id)?;
    let result = apply(&state, command, today).map_err(translate_core_error)?;

    // Keep the gateway's raw answer on the order for later reconciliation.
    let mut settled: SubscriptionState = result.new_state;
    let detail: String = json!({
        "status": commit.status,
        "response_code": commit.response_code,
        "authorization_code": commit.authorization_code,
    })
    .to_string();
    for o in &mut settled.orders {
        if o.order_id == Some(context.order_id) {
            o.detail = Some(detail.clone());
        }
    }
    let persisted: SubscriptionState = persistence
        .persist_subscription_state(&settled)
        .map_err(translate_persistence_error)?;

    info!(
        order_id = context.order_id,
        authorized, "Gateway payment settled"
    );

    if authorized {
        send_best_effort(
            notifier,
            &Notification {
                recipient: context.guardian_email.clone(),
                subject: String::from("Pago confirmado"),
                body: format!(
                    "Payment for order {} was authorized. Thank you!",
                    context.order_id
                ),
            },
        );
    }

    let order: Order = find_order_in_state(&persisted, context.order_id)?;
    Ok(PaymentResultResponse {
        order,
        subscription: persisted.subscription,
        authorized,
        message: if authorized {
            String::from("Payment authorized")
        } else {
            String::from("Payment declined by the gateway")
        },
    })
}

// ============================================================================
// Portal
// ============================================================================

/// Lists a guardian's subscriptions with their enrollments and orders.
/// Owner or admin.
///
/// # Errors
///
/// Returns an error if the principal may not view the guardian's data.
pub fn list_guardian_subscriptions(
    persistence: &mut Persistence,
    principal: &Principal,
    guardian_id: i64,
) -> Result<Vec<SubscriptionOverview>, ApiError> {
    AuthorizationService::require_owner_or_admin(
        principal,
        guardian_id,
        "list_guardian_subscriptions",
    )?;

    let subscriptions: Vec<Subscription> = persistence
        .list_subscriptions_for_guardian(guardian_id)
        .map_err(translate_persistence_error)?;

    let mut overviews: Vec<SubscriptionOverview> = Vec::with_capacity(subscriptions.len());
    for subscription in subscriptions {
        let subscription_id: i64 =
            subscription
                .subscription_id
                .ok_or_else(|| ApiError::Internal {
                    message: String::from("Stored subscription has no id"),
                })?;
        let state: SubscriptionState = load_state(persistence, subscription_id)?;
        overviews.push(SubscriptionOverview {
            subscription: state.subscription,
            enrollments: state.enrollments,
            orders: state.orders,
        });
    }

    Ok(overviews)
}

/// Lists a guardian's orders across all subscriptions, newest first.
/// Owner or admin.
///
/// # Errors
///
/// Returns an error if the principal may not view the guardian's data.
pub fn list_guardian_orders(
    persistence: &mut Persistence,
    principal: &Principal,
    guardian_id: i64,
) -> Result<Vec<Order>, ApiError> {
    AuthorizationService::require_owner_or_admin(principal, guardian_id, "list_guardian_orders")?;
    persistence
        .list_orders_for_guardian(guardian_id)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Guardians & children
// ============================================================================

/// Retrieves a guardian profile. Owner or admin.
///
/// # Errors
///
/// Returns an error if the principal may not view the profile or it does
/// not exist.
pub fn get_guardian(
    persistence: &mut Persistence,
    principal: &Principal,
    guardian_id: i64,
) -> Result<Guardian, ApiError> {
    AuthorizationService::require_owner_or_admin(principal, guardian_id, "get_guardian")?;
    persistence
        .get_guardian(guardian_id)
        .map_err(translate_persistence_error)
}

/// Updates a guardian's contact fields. Owner or admin.
///
/// # Errors
///
/// Returns an error if the principal may not edit the profile or it does
/// not exist.
pub fn update_guardian(
    persistence: &mut Persistence,
    principal: &Principal,
    guardian_id: i64,
    request: &UpdateGuardianRequest,
) -> Result<Guardian, ApiError> {
    AuthorizationService::require_owner_or_admin(principal, guardian_id, "update_guardian")?;

    let mut guardian: Guardian = persistence
        .get_guardian(guardian_id)
        .map_err(translate_persistence_error)?;
    guardian.phone = request.phone.clone();
    guardian.allow_whatsapp_group = request.allow_whatsapp_group;

    persistence
        .update_guardian(&guardian)
        .map_err(translate_persistence_error)?;
    Ok(guardian)
}

/// Deletes a guardian and everything under them: account, children,
/// subscriptions, enrollments, and orders. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the guardian
/// does not exist.
pub fn delete_guardian(
    persistence: &mut Persistence,
    principal: &Principal,
    guardian_id: i64,
) -> Result<(), ApiError> {
    AuthorizationService::require_admin(principal, "delete_guardian")?;
    persistence
        .delete_guardian(guardian_id)
        .map_err(translate_persistence_error)?;

    info!(guardian_id, "Guardian deleted with full cascade");
    Ok(())
}

/// Lists all guardians with their account details. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the query fails.
pub fn list_guardians(
    persistence: &mut Persistence,
    principal: &Principal,
) -> Result<Vec<GuardianAccountData>, ApiError> {
    AuthorizationService::require_admin(principal, "list_guardians")?;
    persistence
        .list_guardians()
        .map_err(translate_persistence_error)
}

/// Lists a guardian's children. Owner or admin.
///
/// # Errors
///
/// Returns an error if the principal may not view the guardian's data.
pub fn list_children(
    persistence: &mut Persistence,
    principal: &Principal,
    guardian_id: i64,
) -> Result<Vec<Child>, ApiError> {
    AuthorizationService::require_owner_or_admin(principal, guardian_id, "list_children")?;
    persistence
        .list_children(guardian_id)
        .map_err(translate_persistence_error)
}

/// Adds a child to a guardian's profile. Owner or admin.
///
/// Adding a child never creates enrollments; those are a separate,
/// capacity-guarded step.
///
/// # Errors
///
/// Returns an error if the principal may not edit the profile or a field
/// fails to parse.
pub fn create_child(
    persistence: &mut Persistence,
    principal: &Principal,
    guardian_id: i64,
    payload: &ChildPayload,
) -> Result<Child, ApiError> {
    AuthorizationService::require_owner_or_admin(principal, guardian_id, "create_child")?;

    let data: NewChildData = child_data_from_payload(payload)?;
    let child_id: i64 = persistence
        .create_child(guardian_id, &data)
        .map_err(translate_persistence_error)?;

    Ok(Child {
        child_id: Some(child_id),
        guardian_id,
        name: data.name,
        birthdate: data.birthdate,
        knowledge_level: data.knowledge_level,
        health_info: data.health_info,
        allow_media: data.allow_media,
    })
}

/// Updates a child's profile fields. Owner or admin.
///
/// # Errors
///
/// Returns an error if the principal may not edit the child or a field
/// fails to parse.
pub fn update_child(
    persistence: &mut Persistence,
    principal: &Principal,
    child_id: i64,
    payload: &ChildPayload,
) -> Result<Child, ApiError> {
    let existing: Child = persistence
        .get_child(child_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_owner_or_admin(principal, existing.guardian_id, "update_child")?;

    let data: NewChildData = child_data_from_payload(payload)?;
    let child: Child = Child {
        child_id: Some(child_id),
        guardian_id: existing.guardian_id,
        name: data.name,
        birthdate: data.birthdate,
        knowledge_level: data.knowledge_level,
        health_info: data.health_info,
        allow_media: data.allow_media,
    };
    persistence
        .update_child(&child)
        .map_err(translate_persistence_error)?;
    Ok(child)
}

/// Removes a child from a guardian's profile. Owner or admin.
///
/// # Errors
///
/// Returns an error if the principal may not edit the child or it does
/// not exist.
pub fn delete_child(
    persistence: &mut Persistence,
    principal: &Principal,
    child_id: i64,
) -> Result<(), ApiError> {
    let existing: Child = persistence
        .get_child(child_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_owner_or_admin(principal, existing.guardian_id, "delete_child")?;

    persistence
        .delete_child(child_id)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Enrollment administration
// ============================================================================

/// Moves an active enrollment to another workshop. Admin only.
///
/// The old row is kept as `changed` history and a fresh `active` row
/// opens in the destination workshop; only `active` enrollments may be
/// moved.
///
/// # Errors
///
/// Returns an error if the principal is not an admin, the enrollment is
/// not `active`, or the destination workshop is not offered.
pub fn move_enrollment(
    persistence: &mut Persistence,
    principal: &Principal,
    enrollment_id: i64,
    request: &MoveEnrollmentRequest,
    today: Date,
) -> Result<Enrollment, ApiError> {
    AuthorizationService::require_admin(principal, "move_enrollment")?;

    let enrollment: Enrollment = persistence
        .get_enrollment(enrollment_id)
        .map_err(translate_persistence_error)?;
    if enrollment.status != EnrollmentStatus::Active {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("enrollment_not_active"),
            message: format!(
                "Enrollment {enrollment_id} is '{}' and cannot be moved",
                enrollment.status
            ),
        });
    }

    let workshop: Workshop = persistence
        .get_workshop(request.new_workshop_id)
        .map_err(translate_persistence_error)?;
    if !workshop.is_active {
        return Err(ApiError::InvalidInput {
            field: String::from("new_workshop_id"),
            message: format!("Workshop '{}' is not currently offered", workshop.name),
        });
    }

    let persisted: SubscriptionState = apply_and_persist(
        persistence,
        enrollment.subscription_id,
        Command::MoveEnrollment {
            enrollment_id,
            new_workshop_id: request.new_workshop_id,
        },
        today,
    )?;

    // MoveEnrollment appends the replacement row.
    let moved: Enrollment = persisted
        .enrollments
        .last()
        .cloned()
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Replacement enrollment missing after persist"),
        })?;

    info!(
        enrollment_id,
        new_enrollment_id = moved.enrollment_id,
        new_workshop_id = request.new_workshop_id,
        "Enrollment moved"
    );
    Ok(moved)
}

/// Cancels an enrollment. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the enrollment
/// does not exist.
pub fn cancel_enrollment(
    persistence: &mut Persistence,
    principal: &Principal,
    enrollment_id: i64,
    today: Date,
) -> Result<Enrollment, ApiError> {
    AuthorizationService::require_admin(principal, "cancel_enrollment")?;

    let enrollment: Enrollment = persistence
        .get_enrollment(enrollment_id)
        .map_err(translate_persistence_error)?;
    let persisted: SubscriptionState = apply_and_persist(
        persistence,
        enrollment.subscription_id,
        Command::CancelEnrollment { enrollment_id },
        today,
    )?;

    persisted
        .enrollments
        .iter()
        .find(|e| e.enrollment_id == Some(enrollment_id))
        .cloned()
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Enrollment missing after persist"),
        })
}

// ============================================================================
// Subscription administration
// ============================================================================

/// Lists every subscription, newest first. Admin only.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the query fails.
pub fn list_subscriptions(
    persistence: &mut Persistence,
    principal: &Principal,
) -> Result<Vec<Subscription>, ApiError> {
    AuthorizationService::require_admin(principal, "list_subscriptions")?;
    persistence
        .list_subscriptions()
        .map_err(translate_persistence_error)
}

/// Cancels a subscription, optionally cascading over its active
/// enrollments. Admin only. Orders are never touched.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the subscription
/// does not exist.
pub fn cancel_subscription(
    persistence: &mut Persistence,
    principal: &Principal,
    subscription_id: i64,
    request: &CancelSubscriptionRequest,
    today: Date,
) -> Result<Subscription, ApiError> {
    AuthorizationService::require_admin(principal, "cancel_subscription")?;

    let persisted: SubscriptionState = apply_and_persist(
        persistence,
        subscription_id,
        Command::CancelSubscription {
            cancel_enrollments: request.cancel_enrollments,
            end_date: request.end_date,
        },
        today,
    )?;

    info!(
        subscription_id,
        cancel_enrollments = request.cancel_enrollments,
        "Subscription canceled"
    );
    Ok(persisted.subscription)
}

/// Reactivates a canceled or suspended subscription. Admin only.
///
/// Canceled enrollments stay canceled; re-enrollment is a separate,
/// capacity-guarded step.
///
/// # Errors
///
/// Returns an error if the principal is not an admin or the subscription
/// does not exist.
pub fn reactivate_subscription(
    persistence: &mut Persistence,
    principal: &Principal,
    subscription_id: i64,
    today: Date,
) -> Result<Subscription, ApiError> {
    AuthorizationService::require_admin(principal, "reactivate_subscription")?;

    let persisted: SubscriptionState = apply_and_persist(
        persistence,
        subscription_id,
        Command::ActivateSubscription,
        today,
    )?;

    info!(subscription_id, "Subscription reactivated");
    Ok(persisted.subscription)
}
