// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Payment gateway abstraction.
//!
//! The platform talks to a redirect-based card gateway: an order is handed
//! to the gateway for a token and a redirect URL, the guardian pays on the
//! gateway's site, and the gateway calls back with the token for the
//! platform to commit. Everything behind that handshake is deployment
//! wiring; the API layer only depends on this trait.

use caissa_domain::Order;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a payment gateway adapter.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway is not configured for this deployment.
    #[error("payment gateway is not configured")]
    NotConfigured,
    /// The gateway rejected the request.
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
    /// The gateway could not be reached or returned garbage.
    #[error("gateway transport failure: {0}")]
    Transport(String),
}

/// A created gateway transaction: where to send the guardian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRedirect {
    /// The gateway-assigned transaction token.
    pub token: String,
    /// The URL the guardian must be redirected to for payment.
    pub url: String,
}

/// The gateway's answer when a transaction is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCommit {
    /// The transaction status string reported by the gateway.
    pub status: String,
    /// The numeric response code. Zero means approved.
    pub response_code: i64,
    /// The gateway's own transaction identifier, if reported.
    pub authorization_code: Option<String>,
}

impl GatewayCommit {
    /// Whether the commit represents an approved payment.
    ///
    /// Either signal is accepted: gateways report approval as the
    /// `AUTHORIZED` status or as response code zero.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.status == "AUTHORIZED" || self.response_code == 0
    }
}

/// A redirect-based payment gateway.
pub trait PaymentGateway {
    /// Creates a gateway transaction for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway cannot accept the transaction.
    fn create_for_order(
        &self,
        order: &Order,
        return_url: &str,
    ) -> Result<GatewayRedirect, GatewayError>;

    /// Commits a previously created transaction by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway cannot resolve the token.
    fn commit(&self, token: &str) -> Result<GatewayCommit, GatewayError>;
}

/// The default gateway: always refuses.
///
/// Deployments without card payments run with this adapter; transfer and
/// in-person orders never reach the gateway at all.
pub struct UnconfiguredGateway;

impl PaymentGateway for UnconfiguredGateway {
    fn create_for_order(
        &self,
        _order: &Order,
        _return_url: &str,
    ) -> Result<GatewayRedirect, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn commit(&self, _token: &str) -> Result<GatewayCommit, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}
