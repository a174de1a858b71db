// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{error, info};

use caissa_api::{
    ApiError, CancelSubscriptionRequest, ChildPayload, GatewayRedirect, GatewayReturnRequest,
    LogNotifier, LoginRequest, LoginResponse, MoveEnrollmentRequest, NotificationSender, OrderView,
    PaymentGateway, PaymentResultResponse, PlanPayload, RenewalOrderRequest, SignupRequest,
    SignupResponse, StartGatewayPaymentRequest, SubscriptionOverview, UnconfiguredGateway,
    UpdateGuardianRequest, WhoAmIResponse, WorkshopPayload, cancel_enrollment, cancel_subscription,
    complete_gateway_payment, confirm_order, create_child, create_plan, create_renewal_order,
    create_workshop, delete_child, delete_guardian, delete_plan, delete_workshop, get_guardian,
    get_order_view, list_active_plans, list_active_workshops, list_all_plans, list_all_workshops,
    list_children, list_guardian_orders, list_guardian_subscriptions, list_guardians,
    list_orders_by_status, list_subscriptions, login, logout, move_enrollment,
    reactivate_subscription, revert_order, set_plan_active, set_workshop_active, signup,
    start_gateway_payment, update_child, update_guardian, update_plan, update_workshop, whoami,
};
use caissa_domain::{Child, Enrollment, Guardian, Order, Plan, Subscription, Workshop};
use caissa_persistence::{GuardianAccountData, Persistence, PersistenceError};

mod session;

use session::SessionPrincipal;

/// Caissa Server - HTTP server for the chess workshop platform
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Email for a bootstrap admin account, created at startup if absent
    #[arg(long)]
    admin_email: Option<String>,

    /// Password for the bootstrap admin account
    #[arg(long)]
    admin_password: Option<String>,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The persistence layer wrapped in a Mutex for safe concurrent
    /// access. Capacity checks rely on mutations being serialized here.
    persistence: Arc<Mutex<Persistence>>,
    /// The payment gateway adapter.
    gateway: Arc<dyn PaymentGateway + Send + Sync>,
    /// The outbound notification transport.
    notifier: Arc<dyn NotificationSender + Send + Sync>,
}

/// Request body for toggling a catalog entry's availability.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct SetActiveRequest {
    /// Whether the entry is offered to new signups.
    active: bool,
}

/// Query parameters for the admin order listing.
#[derive(Debug, Deserialize)]
struct OrdersQuery {
    /// The payment status to filter by.
    status: String,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::GatewayFailure { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<PersistenceError> for HttpError {
    fn from(err: PersistenceError) -> Self {
        error!(error = %err, "Persistence error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Persistence error: {err}"),
        }
    }
}

/// The server's clock, as a calendar date in UTC.
fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

async fn handle_login(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    let response: LoginResponse = login(&mut persistence, &req)?;
    Ok(Json(response))
}

async fn handle_logout(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<StatusCode, HttpError> {
    let mut persistence = state.persistence.lock().await;
    logout(&mut persistence, &session.session_token)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_whoami(session: SessionPrincipal) -> Json<WhoAmIResponse> {
    Json(whoami(&session.principal))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

async fn handle_list_plans(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Vec<Plan>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_active_plans(&mut persistence)?))
}

async fn handle_list_workshops(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Vec<Workshop>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_active_workshops(&mut persistence)?))
}

async fn handle_list_all_plans(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Json<Vec<Plan>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_all_plans(&mut persistence, &session.principal)?))
}

async fn handle_create_plan(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Json(payload): Json<PlanPayload>,
) -> Result<Json<Plan>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(create_plan(
        &mut persistence,
        &session.principal,
        &payload,
    )?))
}

async fn handle_update_plan(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(plan_id): Path<i64>,
    Json(payload): Json<PlanPayload>,
) -> Result<Json<Plan>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(update_plan(
        &mut persistence,
        &session.principal,
        plan_id,
        &payload,
    )?))
}

async fn handle_set_plan_active(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(plan_id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> Result<StatusCode, HttpError> {
    let mut persistence = state.persistence.lock().await;
    set_plan_active(&mut persistence, &session.principal, plan_id, req.active)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_delete_plan(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(plan_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    let mut persistence = state.persistence.lock().await;
    delete_plan(&mut persistence, &session.principal, plan_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_list_all_workshops(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Json<Vec<Workshop>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_all_workshops(
        &mut persistence,
        &session.principal,
    )?))
}

async fn handle_create_workshop(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Json(payload): Json<WorkshopPayload>,
) -> Result<Json<Workshop>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(create_workshop(
        &mut persistence,
        &session.principal,
        &payload,
    )?))
}

async fn handle_update_workshop(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(workshop_id): Path<i64>,
    Json(payload): Json<WorkshopPayload>,
) -> Result<Json<Workshop>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(update_workshop(
        &mut persistence,
        &session.principal,
        workshop_id,
        &payload,
    )?))
}

async fn handle_set_workshop_active(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(workshop_id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> Result<StatusCode, HttpError> {
    let mut persistence = state.persistence.lock().await;
    set_workshop_active(
        &mut persistence,
        &session.principal,
        workshop_id,
        req.active,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_delete_workshop(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(workshop_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    let mut persistence = state.persistence.lock().await;
    delete_workshop(&mut persistence, &session.principal, workshop_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------------

async fn handle_signup(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, HttpError> {
    info!(guardian_email = %req.guardian_email, "Handling signup request");
    let mut persistence = state.persistence.lock().await;
    let response: SignupResponse = signup(
        &mut persistence,
        state.gateway.as_ref(),
        state.notifier.as_ref(),
        &req,
        today(),
    )?;
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Orders & payments
// ---------------------------------------------------------------------------

async fn handle_get_order(
    AxumState(state): AxumState<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderView>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(get_order_view(&mut persistence, order_id)?))
}

async fn handle_confirm_order(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(order_id): Path<i64>,
) -> Result<Json<PaymentResultResponse>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(confirm_order(
        &mut persistence,
        &session.principal,
        state.notifier.as_ref(),
        order_id,
        today(),
    )?))
}

async fn handle_revert_order(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(order_id): Path<i64>,
) -> Result<Json<Order>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(revert_order(
        &mut persistence,
        &session.principal,
        order_id,
        today(),
    )?))
}

async fn handle_create_renewal_order(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(subscription_id): Path<i64>,
    Json(req): Json<RenewalOrderRequest>,
) -> Result<Json<Order>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(create_renewal_order(
        &mut persistence,
        &session.principal,
        subscription_id,
        &req,
        today(),
    )?))
}

async fn handle_start_gateway_payment(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(order_id): Path<i64>,
    Json(req): Json<StartGatewayPaymentRequest>,
) -> Result<Json<GatewayRedirect>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(start_gateway_payment(
        &mut persistence,
        state.gateway.as_ref(),
        &session.principal,
        order_id,
        &req,
        today(),
    )?))
}

async fn handle_gateway_return(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<GatewayReturnRequest>,
) -> Result<Json<PaymentResultResponse>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(complete_gateway_payment(
        &mut persistence,
        state.gateway.as_ref(),
        state.notifier.as_ref(),
        &req.token,
        today(),
    )?))
}

async fn handle_list_orders(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_orders_by_status(
        &mut persistence,
        &session.principal,
        &query.status,
    )?))
}

// ---------------------------------------------------------------------------
// Subscriptions & enrollments
// ---------------------------------------------------------------------------

async fn handle_list_subscriptions(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Json<Vec<Subscription>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_subscriptions(
        &mut persistence,
        &session.principal,
    )?))
}

async fn handle_cancel_subscription(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(subscription_id): Path<i64>,
    Json(req): Json<CancelSubscriptionRequest>,
) -> Result<Json<Subscription>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(cancel_subscription(
        &mut persistence,
        &session.principal,
        subscription_id,
        &req,
        today(),
    )?))
}

async fn handle_reactivate_subscription(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(subscription_id): Path<i64>,
) -> Result<Json<Subscription>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(reactivate_subscription(
        &mut persistence,
        &session.principal,
        subscription_id,
        today(),
    )?))
}

async fn handle_move_enrollment(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(enrollment_id): Path<i64>,
    Json(req): Json<MoveEnrollmentRequest>,
) -> Result<Json<Enrollment>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(move_enrollment(
        &mut persistence,
        &session.principal,
        enrollment_id,
        &req,
        today(),
    )?))
}

async fn handle_cancel_enrollment(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(enrollment_id): Path<i64>,
) -> Result<Json<Enrollment>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(cancel_enrollment(
        &mut persistence,
        &session.principal,
        enrollment_id,
        today(),
    )?))
}

// ---------------------------------------------------------------------------
// Guardians & children
// ---------------------------------------------------------------------------

async fn handle_list_guardians(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
) -> Result<Json<Vec<GuardianAccountData>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_guardians(&mut persistence, &session.principal)?))
}

async fn handle_get_guardian(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(guardian_id): Path<i64>,
) -> Result<Json<Guardian>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(get_guardian(
        &mut persistence,
        &session.principal,
        guardian_id,
    )?))
}

async fn handle_update_guardian(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(guardian_id): Path<i64>,
    Json(req): Json<UpdateGuardianRequest>,
) -> Result<Json<Guardian>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(update_guardian(
        &mut persistence,
        &session.principal,
        guardian_id,
        &req,
    )?))
}

async fn handle_delete_guardian(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(guardian_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    let mut persistence = state.persistence.lock().await;
    delete_guardian(&mut persistence, &session.principal, guardian_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_list_children(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(guardian_id): Path<i64>,
) -> Result<Json<Vec<Child>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_children(
        &mut persistence,
        &session.principal,
        guardian_id,
    )?))
}

async fn handle_create_child(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(guardian_id): Path<i64>,
    Json(payload): Json<ChildPayload>,
) -> Result<Json<Child>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(create_child(
        &mut persistence,
        &session.principal,
        guardian_id,
        &payload,
    )?))
}

async fn handle_update_child(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(child_id): Path<i64>,
    Json(payload): Json<ChildPayload>,
) -> Result<Json<Child>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(update_child(
        &mut persistence,
        &session.principal,
        child_id,
        &payload,
    )?))
}

async fn handle_delete_child(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(child_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    let mut persistence = state.persistence.lock().await;
    delete_child(&mut persistence, &session.principal, child_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_guardian_subscriptions(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(guardian_id): Path<i64>,
) -> Result<Json<Vec<SubscriptionOverview>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_guardian_subscriptions(
        &mut persistence,
        &session.principal,
        guardian_id,
    )?))
}

async fn handle_guardian_orders(
    AxumState(state): AxumState<AppState>,
    session: SessionPrincipal,
    Path(guardian_id): Path<i64>,
) -> Result<Json<Vec<Order>>, HttpError> {
    let mut persistence = state.persistence.lock().await;
    Ok(Json(list_guardian_orders(
        &mut persistence,
        &session.principal,
        guardian_id,
    )?))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/whoami", get(handle_whoami))
        .route("/catalog/plans", get(handle_list_plans))
        .route("/catalog/workshops", get(handle_list_workshops))
        .route("/signup", post(handle_signup))
        .route("/orders/{order_id}", get(handle_get_order))
        .route("/orders/{order_id}/confirm", post(handle_confirm_order))
        .route("/orders/{order_id}/revert", post(handle_revert_order))
        .route(
            "/orders/{order_id}/gateway/start",
            post(handle_start_gateway_payment),
        )
        .route("/gateway/return", post(handle_gateway_return))
        .route(
            "/subscriptions/{subscription_id}/orders",
            post(handle_create_renewal_order),
        )
        .route(
            "/subscriptions/{subscription_id}/cancel",
            post(handle_cancel_subscription),
        )
        .route(
            "/subscriptions/{subscription_id}/reactivate",
            post(handle_reactivate_subscription),
        )
        .route(
            "/enrollments/{enrollment_id}/move",
            post(handle_move_enrollment),
        )
        .route(
            "/enrollments/{enrollment_id}/cancel",
            post(handle_cancel_enrollment),
        )
        .route("/guardians", get(handle_list_guardians))
        .route("/guardians/{guardian_id}", get(handle_get_guardian))
        .route("/guardians/{guardian_id}", put(handle_update_guardian))
        .route("/guardians/{guardian_id}", delete(handle_delete_guardian))
        .route(
            "/guardians/{guardian_id}/children",
            get(handle_list_children),
        )
        .route(
            "/guardians/{guardian_id}/children",
            post(handle_create_child),
        )
        .route("/children/{child_id}", put(handle_update_child))
        .route("/children/{child_id}", delete(handle_delete_child))
        .route(
            "/guardians/{guardian_id}/subscriptions",
            get(handle_guardian_subscriptions),
        )
        .route(
            "/guardians/{guardian_id}/orders",
            get(handle_guardian_orders),
        )
        .route("/admin/plans", get(handle_list_all_plans))
        .route("/admin/plans", post(handle_create_plan))
        .route("/admin/plans/{plan_id}", put(handle_update_plan))
        .route("/admin/plans/{plan_id}", delete(handle_delete_plan))
        .route("/admin/plans/{plan_id}/active", post(handle_set_plan_active))
        .route("/admin/workshops", get(handle_list_all_workshops))
        .route("/admin/workshops", post(handle_create_workshop))
        .route("/admin/workshops/{workshop_id}", put(handle_update_workshop))
        .route(
            "/admin/workshops/{workshop_id}",
            delete(handle_delete_workshop),
        )
        .route(
            "/admin/workshops/{workshop_id}/active",
            post(handle_set_workshop_active),
        )
        .route("/admin/subscriptions", get(handle_list_subscriptions))
        .route("/admin/orders", get(handle_list_orders))
        .with_state(app_state)
}

/// Creates the bootstrap admin account when configured and absent.
fn bootstrap_admin(
    persistence: &mut Persistence,
    email: &str,
    password: &str,
) -> Result<(), PersistenceError> {
    if persistence.find_account_by_email(email)?.is_some() {
        info!(email, "Admin account already exists");
        return Ok(());
    }
    let user_id: i64 = persistence.create_account(email, "Administrator", password, true)?;
    info!(email, user_id, "Bootstrap admin account created");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Caissa server");

    let mut persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    if let (Some(email), Some(password)) = (&args.admin_email, &args.admin_password) {
        bootstrap_admin(&mut persistence, email, password)?;
    }

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        gateway: Arc::new(UnconfiguredGateway),
        notifier: Arc::new(LogNotifier),
    };

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
