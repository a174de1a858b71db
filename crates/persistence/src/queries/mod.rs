// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side database operations.
//!
//! All queries take a `&mut SqliteConnection` and use Diesel DSL. Row
//! structs stay private to the module that loads them; callers get domain
//! records or the plain data carriers from `data_models`.

pub mod accounts;
pub mod catalog;
pub mod guardians;
pub mod subscriptions;
