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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod billing;
mod error;
mod records;
mod types;

#[cfg(test)]
mod tests;

pub use billing::subscription_amount_clp;
pub use error::DomainError;
pub use records::{Child, Enrollment, Guardian, Order, Plan, Subscription, Workshop};
pub use types::{
    BillingCycle, DayOfWeek, EnrollmentStatus, KnowledgeLevel, PaymentMethod, PaymentStatus,
    SubscriptionStatus,
};
