// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod enrollment_tests;
mod helpers;
mod order_tests;
