//! Caller identity and permissions
//!
//! Authentication itself (cookie sessions, API keys) lives outside this
//! crate. The engine only consumes its result: an [`AuthContext`] saying who
//! the caller is and what they may do. Every mutating operation requires
//! [`Permission::Write`]; reads require [`Permission::Read`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::OperatorType;

/// Operator name recorded for unattended operations
pub const SYSTEM_OPERATOR: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
        }
    }
}

/// How the caller authenticated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum AuthMethod {
    /// Interactive cookie session
    Session { username: String },
    /// Named API key
    #[serde(rename = "apikey")]
    ApiKey { name: String },
    /// Unattended operation (daemon, maintenance)
    System,
}

/// Authenticated caller, as produced by an [`Authenticator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub method: AuthMethod,
    pub permissions: Vec<Permission>,
}

impl AuthContext {
    /// Session users hold every permission
    pub fn session(username: impl Into<String>) -> Self {
        Self {
            method: AuthMethod::Session {
                username: username.into(),
            },
            permissions: vec![Permission::Read, Permission::Write],
        }
    }

    /// API keys hold exactly the permissions they were issued with
    pub fn api_key(name: impl Into<String>, permissions: &[Permission]) -> Self {
        Self {
            method: AuthMethod::ApiKey { name: name.into() },
            permissions: permissions.to_vec(),
        }
    }

    /// The engine acting on its own behalf
    pub fn system() -> Self {
        Self {
            method: AuthMethod::System,
            permissions: vec![Permission::Read, Permission::Write],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Fail with `Error::Forbidden` unless the permission is held
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "{} lacks {} permission",
                self.operator_name(),
                permission.as_str()
            )))
        }
    }

    /// Operator type recorded in the change log
    pub fn operator_type(&self) -> OperatorType {
        match self.method {
            AuthMethod::Session { .. } => OperatorType::Cookie,
            AuthMethod::ApiKey { .. } => OperatorType::ApiKey,
            AuthMethod::System => OperatorType::System,
        }
    }

    /// Operator name recorded in the change log
    pub fn operator_name(&self) -> &str {
        match &self.method {
            AuthMethod::Session { username } => username,
            AuthMethod::ApiKey { name } => name,
            AuthMethod::System => SYSTEM_OPERATOR,
        }
    }
}

/// Raw credentials presented with a request
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Session cookie value
    pub session_cookie: Option<String>,
    /// API key presented in a header
    pub api_key: Option<String>,
}

/// Authentication capability provided by the host application
pub trait Authenticator: Send + Sync {
    /// Resolve credentials to a caller, or `None` when they are not valid
    fn authenticate(&self, credentials: &Credentials) -> Option<AuthContext>;
}
