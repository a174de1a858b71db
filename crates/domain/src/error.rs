// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::PaymentStatus;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The subscription already holds as many active enrollments as the
    /// plan allows across all children.
    PlanCapacityExceeded {
        /// `max_children * max_workshops_per_child` for the plan.
        limit: u32,
    },
    /// The child already holds as many active enrollments as the plan
    /// allows per child.
    ChildWorkshopLimitExceeded {
        /// `max_workshops_per_child` for the plan.
        limit: u32,
    },
    /// The requested payment-status transition is not permitted.
    ///
    /// `paid` and `failed` are never directly interconvertible; an order
    /// must pass back through `pending` first.
    InvalidPaymentTransition {
        /// The order's current payment status.
        from: PaymentStatus,
        /// The requested payment status.
        to: PaymentStatus,
    },
    /// Billing cycle string is not recognized.
    InvalidBillingCycle(String),
    /// Subscription status string is not recognized.
    InvalidSubscriptionStatus(String),
    /// Enrollment status string is not recognized.
    InvalidEnrollmentStatus(String),
    /// Payment method string is not recognized.
    InvalidPaymentMethod(String),
    /// Payment status string is not recognized.
    InvalidPaymentStatus(String),
    /// Day-of-week string is not recognized.
    InvalidDayOfWeek(String),
    /// Knowledge-level string is not recognized.
    InvalidKnowledgeLevel(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlanCapacityExceeded { limit } => {
                write!(f, "Global plan limit exceeded: at most {limit} active enrollment(s)")
            }
            Self::ChildWorkshopLimitExceeded { limit } => {
                write!(
                    f,
                    "Per-child workshop limit exceeded: at most {limit} workshop(s) per child"
                )
            }
            Self::InvalidPaymentTransition { from, to } => {
                write!(f, "Invalid payment transition: {from} -> {to}")
            }
            Self::InvalidBillingCycle(s) => write!(f, "Invalid billing cycle: {s}"),
            Self::InvalidSubscriptionStatus(s) => write!(f, "Invalid subscription status: {s}"),
            Self::InvalidEnrollmentStatus(s) => write!(f, "Invalid enrollment status: {s}"),
            Self::InvalidPaymentMethod(s) => write!(f, "Invalid payment method: {s}"),
            Self::InvalidPaymentStatus(s) => write!(f, "Invalid payment status: {s}"),
            Self::InvalidDayOfWeek(s) => write!(f, "Invalid day of week: {s}"),
            Self::InvalidKnowledgeLevel(s) => write!(f, "Invalid knowledge level: {s}"),
        }
    }
}

impl std::error::Error for DomainError {}
