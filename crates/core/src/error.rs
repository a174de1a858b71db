// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use caissa_domain::DomainError;

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The command references an enrollment id not present in the aggregate.
    EnrollmentNotFound(i64),
    /// The command references an order id not present in the aggregate.
    OrderNotFound(i64),
    /// The subscription has no canonical id yet; persist it before applying
    /// enrollment or order commands.
    UnpersistedSubscription,
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::EnrollmentNotFound(id) => write!(f, "Enrollment not found: {id}"),
            Self::OrderNotFound(id) => write!(f, "Order not found: {id}"),
            Self::UnpersistedSubscription => {
                write!(f, "Subscription has not been persisted yet")
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
