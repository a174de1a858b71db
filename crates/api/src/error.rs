// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use caissa::CoreError;
use caissa_domain::DomainError;
use caissa_persistence::{PersistenceError, SignupError};

use crate::gateway::GatewayError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// What the action requires.
        requirement: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                requirement,
            } => {
                write!(f, "Unauthorized: '{action}' requires {requirement}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core/persistence errors and represent
/// the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the principal does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// What the action requires.
        requirement: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The payment gateway failed or returned an unusable response.
    GatewayFailure {
        /// A description of the gateway fault.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                requirement,
            } => {
                write!(f, "Unauthorized: '{action}' requires {requirement}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::GatewayFailure { message } => {
                write!(f, "Payment gateway failure: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                requirement,
            } => Self::Unauthorized {
                action,
                requirement,
            },
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self::GatewayFailure {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked
/// directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::PlanCapacityExceeded { limit } => ApiError::DomainRuleViolation {
            rule: String::from("plan_capacity"),
            message: format!("The plan allows at most {limit} active enrollment(s) in total"),
        },
        DomainError::ChildWorkshopLimitExceeded { limit } => ApiError::DomainRuleViolation {
            rule: String::from("child_workshop_limit"),
            message: format!("The plan allows at most {limit} workshop(s) per child"),
        },
        DomainError::InvalidPaymentTransition { from, to } => ApiError::DomainRuleViolation {
            rule: String::from("payment_transition"),
            message: format!("An order cannot move from '{from}' to '{to}'"),
        },
        DomainError::InvalidBillingCycle(s) => ApiError::InvalidInput {
            field: String::from("billing_cycle"),
            message: format!("Unknown billing cycle: '{s}'"),
        },
        DomainError::InvalidSubscriptionStatus(s) => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("Unknown subscription status: '{s}'"),
        },
        DomainError::InvalidEnrollmentStatus(s) => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("Unknown enrollment status: '{s}'"),
        },
        DomainError::InvalidPaymentMethod(s) => ApiError::InvalidInput {
            field: String::from("payment_method"),
            message: format!("Unknown payment method: '{s}'"),
        },
        DomainError::InvalidPaymentStatus(s) => ApiError::InvalidInput {
            field: String::from("payment_status"),
            message: format!("Unknown payment status: '{s}'"),
        },
        DomainError::InvalidDayOfWeek(s) => ApiError::InvalidInput {
            field: String::from("day_of_week"),
            message: format!("Unknown day of week: '{s}'"),
        },
        DomainError::InvalidKnowledgeLevel(s) => ApiError::InvalidInput {
            field: String::from("knowledge_level"),
            message: format!("Unknown knowledge level: '{s}'"),
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked
/// directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::EnrollmentNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Enrollment"),
            message: format!("Enrollment {id} does not exist in this subscription"),
        },
        CoreError::OrderNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Order"),
            message: format!("Order {id} does not exist in this subscription"),
        },
        CoreError::UnpersistedSubscription => ApiError::Internal {
            message: String::from("Subscription aggregate was not persisted before use"),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Not-found and duplicate-key conditions become client errors; everything
/// else is an internal fault.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(msg) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message: msg,
        },
        PersistenceError::AccountNotFound(msg) => ApiError::ResourceNotFound {
            resource_type: String::from("Account"),
            message: msg,
        },
        PersistenceError::DuplicateEmail(email) => ApiError::InvalidInput {
            field: String::from("guardian_email"),
            message: format!("An account already exists for '{email}'"),
        },
        PersistenceError::SessionNotFound(_) | PersistenceError::SessionExpired(_) => {
            ApiError::AuthenticationFailed {
                reason: String::from("Invalid or expired session"),
            }
        }
        PersistenceError::PaymentContextNotFound(_) => ApiError::ResourceNotFound {
            resource_type: String::from("Payment context"),
            message: String::from("Unknown or already-used payment token"),
        },
        PersistenceError::PaymentContextExpired(_) => ApiError::InvalidInput {
            field: String::from("token"),
            message: String::from("The payment token has expired"),
        },
        PersistenceError::MissingIdentifier(msg) => ApiError::Internal {
            message: format!("Missing identifier: {msg}"),
        },
        other => ApiError::Internal {
            message: format!("Storage failure: {other}"),
        },
    }
}

/// Translates a signup transaction error into an API error.
#[must_use]
pub fn translate_signup_error(err: SignupError) -> ApiError {
    match err {
        SignupError::Domain(core_err) => translate_core_error(core_err),
        SignupError::Storage(persistence_err) => translate_persistence_error(persistence_err),
    }
}
