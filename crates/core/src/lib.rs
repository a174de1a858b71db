// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The enrollment/subscription/order state machine.
//!
//! All mutations of a subscription aggregate go through [`apply`]: a pure
//! function from a [`SubscriptionState`] snapshot and a [`Command`] to a
//! [`TransitionResult`]. The caller owns loading the snapshot and persisting
//! the result within a single request-scoped transaction.

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

mod apply;
mod command;
mod error;
mod state;

#[cfg(test)]
mod tests;

pub use apply::apply;
pub use command::Command;
pub use error::CoreError;
pub use state::{SubscriptionState, TransitionResult};
