// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod payment_context_tests;
mod signup_tests;

use time::macros::{datetime, time};
use time::{Date, OffsetDateTime, Time};

use caissa_domain::{BillingCycle, DayOfWeek, KnowledgeLevel, PaymentMethod, Plan, Workshop};

use crate::data_models::{NewChildData, SignupData};

/// A fixed "today" so tests never depend on the wall clock.
pub fn today() -> Date {
    Date::from_calendar_date(2026, time::Month::March, 2).expect("Valid test date")
}

pub fn terms_timestamp() -> OffsetDateTime {
    datetime!(2026-03-02 10:00 UTC)
}

pub fn sample_plan(name: &str, max_children: u32, max_workshops_per_child: u32) -> Plan {
    Plan {
        plan_id: None,
        name: name.to_string(),
        max_children,
        max_workshops_per_child,
        price_monthly: 25_000,
        quarterly_discount_pct: 10,
        is_active: true,
    }
}

pub fn sample_workshop(name: &str, day_of_week: DayOfWeek, start_time: Time) -> Workshop {
    Workshop {
        workshop_id: None,
        name: name.to_string(),
        day_of_week,
        start_time,
        end_time: Some(time!(19:00)),
        address: Some(String::from("Club hall, Santiago")),
        capacity: Some(16),
        is_active: true,
    }
}

pub fn sample_child(name: &str) -> NewChildData {
    NewChildData {
        name: name.to_string(),
        birthdate: Some(Date::from_calendar_date(2018, time::Month::June, 15).expect("Valid date")),
        knowledge_level: Some(KnowledgeLevel::Basic),
        health_info: None,
        allow_media: true,
    }
}

pub fn sample_signup(
    email: &str,
    plan: Plan,
    children: Vec<NewChildData>,
    workshop_ids: Vec<i64>,
) -> SignupData {
    SignupData {
        guardian_name: String::from("Maria Lagos"),
        guardian_email: email.to_string(),
        password: String::from("caissa-pass"),
        phone: String::from("+56 9 1234 5678"),
        allow_whatsapp_group: true,
        plan,
        billing_cycle: BillingCycle::Monthly,
        payment_method: PaymentMethod::Transfer,
        children,
        workshop_ids,
        amount_clp: 25_000,
        start_date: None,
        terms_accepted_at: terms_timestamp(),
    }
}
