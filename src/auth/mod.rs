//! Login, session tokens and credential handling.
//!
//! A token is accepted only while its signature and expiry verify, its
//! session row exists, and its employee is still active.

mod password;
mod token;

pub use password::CredentialHasher;
pub use token::{Claims, TokenKeys};

use crate::config::Config;
use crate::db::Database;
use crate::error::ApiError;
use crate::types::{Employee, EmployeeUpdate, NewEmployee, SessionUser};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub session_id: String,
    pub user: SessionUser,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    /// Fail with FORBIDDEN unless the caller is an administrator.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Session expiry (ms since epoch).
    pub expires_at: i64,
    pub user: SessionUser,
}

/// Authentication service shared by the HTTP layer and the CLI.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    hasher: Arc<CredentialHasher>,
    keys: Arc<TokenKeys>,
    ttl_ms: i64,
}

impl AuthService {
    pub fn new(db: Database, config: &Config) -> Result<Self> {
        let secret = match config.auth.token_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => secret.to_string(),
            None => {
                warn!(
                    "No auth.token_secret configured; using a random secret. \
                     Sessions will not survive a restart."
                );
                TokenKeys::random_secret()
            }
        };

        Ok(Self {
            db,
            hasher: Arc::new(CredentialHasher::new(&config.auth.argon2)?),
            keys: Arc::new(TokenKeys::from_secret(secret.as_bytes())),
            ttl_ms: config.token_ttl_ms(),
        })
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        self.hasher.hash(password)
    }

    /// Check the username, then the password, and open a session.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ApiError::missing_field("username").into());
        }
        if password.is_empty() {
            return Err(ApiError::missing_field("password").into());
        }

        let employee = self
            .db
            .find_active_employee_by_username(username)?
            .ok_or_else(|| {
                info!(%username, "Login failed: unknown username");
                ApiError::user_not_found()
            })?;

        if !self.hasher.verify(password, &employee.password_hash)? {
            info!(%username, "Login failed: wrong password");
            return Err(ApiError::wrong_password().into());
        }

        let purged = self.db.purge_expired_sessions()?;
        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }

        let session = self.db.create_session(&employee.id, self.ttl_ms)?;
        let token = self.keys.issue(&Claims {
            sub: employee.id.clone(),
            jti: session.id.clone(),
            role: employee.role,
            iat: session.created_at / 1000,
            exp: session.expires_at / 1000,
        })?;

        info!(employee_id = %employee.id, role = employee.role.as_str(), "Login succeeded");

        Ok(LoginResponse {
            token,
            expires_at: session.expires_at,
            user: employee.session_user(),
        })
    }

    /// Resolve a bearer token to a session.
    pub fn authenticate(&self, token: &str) -> Result<Session> {
        let claims = self.keys.verify(token).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            ApiError::unauthorized("invalid or expired token")
        })?;

        let session = self
            .db
            .get_active_session(&claims.jti)?
            .filter(|s| s.employee_id == claims.sub)
            .ok_or_else(|| ApiError::unauthorized("session ended"))?;

        let employee = self
            .db
            .get_employee(&session.employee_id)?
            .filter(|e| e.is_active)
            .ok_or_else(|| ApiError::unauthorized("account disabled"))?;

        Ok(Session {
            session_id: session.id,
            user: employee.session_user(),
        })
    }

    pub fn logout(&self, session: &Session) -> Result<()> {
        self.db.delete_session(&session.session_id)?;
        info!(employee_id = %session.user.id, "Logged out");
        Ok(())
    }

    /// Create an employee, hashing the supplied password.
    pub fn create_employee(&self, input: &NewEmployee) -> Result<Employee> {
        input.validate()?;
        let hash = self.hasher.hash(&input.password)?;
        let employee = self.db.create_employee(input, &hash)?;
        info!(employee_id = %employee.id, username = %employee.username, "Employee created");
        Ok(employee)
    }

    /// Update an employee, rehashing the password when a new one is given.
    ///
    /// A password change ends every session the employee has open.
    pub fn update_employee(&self, id: &str, update: &EmployeeUpdate) -> Result<Employee> {
        let hash = update
            .new_password()
            .map(|password| self.hasher.hash(password))
            .transpose()?;
        let employee = self.db.update_employee(id, update, hash.as_deref())?;
        if hash.is_some() {
            let ended = self.db.delete_sessions_for_employee(&employee.id)?;
            info!(employee_id = %employee.id, sessions = ended, "Password changed");
        }
        info!(employee_id = %employee.id, "Employee updated");
        Ok(employee)
    }
}
