// Copyright (C) 2026 Caissa Chess Club
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization services.

use rand::RngExt;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use caissa_persistence::{AccountData, Persistence, PersistenceError, PrincipalData};

use crate::error::AuthError;

/// The identity behind an authenticated request.
///
/// Admin accounts carry no guardian profile; guardian accounts carry the
/// id of the profile they own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The account identifier.
    pub user_id: i64,
    /// The account email, stored lowercase.
    pub email: String,
    /// The account display name.
    pub name: String,
    /// Whether this account has administrative authority.
    pub is_admin: bool,
    /// The guardian profile owned by this account, if any.
    pub guardian_id: Option<i64>,
}

impl From<PrincipalData> for Principal {
    fn from(data: PrincipalData) -> Self {
        Self {
            user_id: data.user_id,
            email: data.email,
            name: data.name,
            is_admin: data.is_admin,
            guardian_id: data.guardian_id,
        }
    }
}

/// Session-based authentication over the account store.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Default session lifetime (30 days).
    const DEFAULT_SESSION_LIFETIME: Duration = Duration::days(30);

    /// Authenticates an account by email and password and opens a session.
    ///
    /// The failure message never distinguishes an unknown email from a
    /// wrong password.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` on bad credentials or a storage
    /// fault.
    pub fn login(
        persistence: &mut Persistence,
        email: &str,
        password: &str,
    ) -> Result<(String, Principal), AuthError> {
        let account: AccountData = persistence
            .find_account_by_email(email)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Database error: {e}"),
            })?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid email or password"),
            })?;

        let valid: bool = persistence
            .verify_password(password, &account.password_hash)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Password verification error: {e}"),
            })?;
        if !valid {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Invalid email or password"),
            });
        }

        let session_token: String = Self::generate_session_token();
        let expires_at: i64 =
            (OffsetDateTime::now_utc() + Self::DEFAULT_SESSION_LIFETIME).unix_timestamp();

        persistence
            .create_session(&session_token, account.user_id, expires_at)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to create session: {e}"),
            })?;

        let principal: Principal = persistence
            .validate_session(&session_token)
            .map(Principal::from)
            .map_err(Self::map_persistence_error)?;

        info!(user_id = principal.user_id, "Login succeeded");
        Ok((session_token, principal))
    }

    /// Resolves a session token to the principal behind it.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` for an unknown or expired token.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
    ) -> Result<Principal, AuthError> {
        let principal: Principal = persistence
            .validate_session(session_token)
            .map(Principal::from)
            .map_err(Self::map_persistence_error)?;

        debug!(user_id = principal.user_id, "Session validated");
        Ok(principal)
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session delete fails.
    pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete session: {e}"),
            })
    }

    /// Generates an opaque session token from the thread-local CSPRNG.
    fn generate_session_token() -> String {
        let mut rng = rand::rng();
        let bytes: [u8; 32] = rng.random();
        let mut token: String = String::with_capacity(64);
        for byte in bytes {
            token.push_str(&format!("{byte:02x}"));
        }
        token
    }

    /// Maps persistence errors to authentication errors.
    fn map_persistence_error(err: PersistenceError) -> AuthError {
        match err {
            PersistenceError::SessionExpired(_) => AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            },
            PersistenceError::SessionNotFound(_) => AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            },
            _ => AuthError::AuthenticationFailed {
                reason: format!("Database error: {err}"),
            },
        }
    }
}

/// Authorization service for enforcing access control.
///
/// Two gates cover the whole API: admin-only actions, and actions on a
/// guardian's own data which an admin may also perform.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that the principal has administrative authority.
    ///
    /// # Errors
    ///
    /// Returns an error if the principal is not an admin.
    pub fn require_admin(principal: &Principal, action: &str) -> Result<(), AuthError> {
        if principal.is_admin {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                requirement: String::from("admin access"),
            })
        }
    }

    /// Checks that the principal owns the guardian profile or is an admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the principal is neither the owner nor an
    /// admin.
    pub fn require_owner_or_admin(
        principal: &Principal,
        guardian_id: i64,
        action: &str,
    ) -> Result<(), AuthError> {
        if principal.is_admin || principal.guardian_id == Some(guardian_id) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                requirement: String::from("ownership of the guardian profile or admin access"),
            })
        }
    }
}
