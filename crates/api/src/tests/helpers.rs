// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shared fixtures: a seeded store, canned principals, and stub
//! gateway/notifier doubles.

use std::cell::RefCell;

use time::Date;
use time::macros::time;

use caissa_domain::{DayOfWeek, Order, Plan, Workshop};
use caissa_persistence::Persistence;

use crate::auth::Principal;
use crate::gateway::{GatewayCommit, GatewayError, GatewayRedirect, PaymentGateway};
use crate::notify::{Notification, NotificationSender};
use crate::request_response::{ChildPayload, SignupRequest};

/// A fixed "today" so tests never depend on the wall clock.
pub fn today() -> Date {
    Date::from_calendar_date(2026, time::Month::March, 2).expect("Valid test date")
}

pub fn admin() -> Principal {
    Principal {
        user_id: 1,
        email: String::from("admin@caissa.cl"),
        name: String::from("Club Admin"),
        is_admin: true,
        guardian_id: None,
    }
}

pub fn guardian_principal(user_id: i64, guardian_id: i64) -> Principal {
    Principal {
        user_id,
        email: format!("guardian{guardian_id}@example.cl"),
        name: String::from("Guardian"),
        is_admin: false,
        guardian_id: Some(guardian_id),
    }
}

/// Seeds one plan (2 children x 2 workshops, $25.000 monthly, 10%
/// quarterly discount) and two workshops. Returns the plan id and the
/// workshop ids.
pub fn seed_catalog(persistence: &mut Persistence) -> (i64, Vec<i64>) {
    let plan_id = persistence
        .create_plan(&Plan {
            plan_id: None,
            name: String::from("Familiar"),
            max_children: 2,
            max_workshops_per_child: 2,
            price_monthly: 25_000,
            quarterly_discount_pct: 10,
            is_active: true,
        })
        .unwrap();

    let monday = persistence
        .create_workshop(&Workshop {
            workshop_id: None,
            name: String::from("Lunes"),
            day_of_week: DayOfWeek::Monday,
            start_time: time!(17:00),
            end_time: Some(time!(19:00)),
            address: Some(String::from("Club hall, Santiago")),
            capacity: Some(16),
            is_active: true,
        })
        .unwrap();
    let thursday = persistence
        .create_workshop(&Workshop {
            workshop_id: None,
            name: String::from("Jueves"),
            day_of_week: DayOfWeek::Thursday,
            start_time: time!(17:00),
            end_time: Some(time!(19:00)),
            address: None,
            capacity: None,
            is_active: true,
        })
        .unwrap();

    (plan_id, vec![monday, thursday])
}

pub fn sample_child(name: &str) -> ChildPayload {
    ChildPayload {
        name: name.to_string(),
        birthdate: Some(Date::from_calendar_date(2018, time::Month::June, 15).expect("Valid date")),
        knowledge_level: Some(String::from("basic")),
        health_info: None,
        allow_media: true,
    }
}

pub fn signup_request(
    email: &str,
    plan_id: i64,
    workshop_ids: Vec<i64>,
    payment_method: &str,
) -> SignupRequest {
    SignupRequest {
        guardian_name: String::from("Maria Lagos"),
        guardian_email: email.to_string(),
        password: String::from("caissa-pass"),
        phone: String::from("+56 9 1234 5678"),
        allow_whatsapp_group: true,
        plan_id,
        billing_cycle: String::from("monthly"),
        payment_method: payment_method.to_string(),
        children: vec![sample_child("Tomas")],
        workshop_ids,
        start_date: None,
        accepts_terms: true,
        return_url: Some(String::from("https://caissa.cl/pago/retorno")),
    }
}

/// How the stub gateway answers.
pub enum StubMode {
    /// Accept the transaction and authorize the commit.
    Authorize,
    /// Accept the transaction but decline the commit.
    Decline,
    /// Fail every call with a transport error.
    Unreachable,
}

pub struct StubGateway {
    pub mode: StubMode,
}

impl PaymentGateway for StubGateway {
    fn create_for_order(
        &self,
        order: &Order,
        _return_url: &str,
    ) -> Result<GatewayRedirect, GatewayError> {
        match self.mode {
            StubMode::Authorize | StubMode::Decline => Ok(GatewayRedirect {
                token: format!("tok-{}", order.order_id.unwrap_or(0)),
                url: String::from("https://gateway.example/pay"),
            }),
            StubMode::Unreachable => {
                Err(GatewayError::Transport(String::from("connection refused")))
            }
        }
    }

    fn commit(&self, _token: &str) -> Result<GatewayCommit, GatewayError> {
        match self.mode {
            StubMode::Authorize => Ok(GatewayCommit {
                status: String::from("AUTHORIZED"),
                response_code: 0,
                authorization_code: Some(String::from("1213")),
            }),
            StubMode::Decline => Ok(GatewayCommit {
                status: String::from("FAILED"),
                response_code: -1,
                authorization_code: None,
            }),
            StubMode::Unreachable => {
                Err(GatewayError::Transport(String::from("connection refused")))
            }
        }
    }
}

/// Records every notification handed to it.
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
        }
    }
}

impl NotificationSender for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<(), String> {
        self.sent.borrow_mut().push(notification.clone());
        Ok(())
    }
}

/// A notifier whose transport always fails.
pub struct FailingNotifier;

impl NotificationSender for FailingNotifier {
    fn send(&self, _notification: &Notification) -> Result<(), String> {
        Err(String::from("smtp relay unavailable"))
    }
}
