// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side database operations.
//!
//! All mutations take a `&mut SqliteConnection` and use Diesel DSL, with
//! `last_insert_rowid()` from the `sqlite` module to recover generated ids.

pub mod accounts;
pub mod catalog;
pub mod guardians;
pub mod payment_context;
pub mod signup;
pub mod subscriptions;

pub use signup::SignupError;
