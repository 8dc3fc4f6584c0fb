//! # Security Module
//!
//! Pluggable authentication for controllers.
//!
//! ## Overview
//!
//! - [`Authenticator`] - turns request credentials into an optional [`Principal`]
//! - [`AuthHooks`] - two-phase lifecycle callbacks run around every authentication
//! - [`AuthenticatorRegistry`] - resolves the configured authenticator id
//!
//! ## Lifecycle contract
//!
//! [`authenticate`] runs `before_authenticate` on every hook, then the
//! authenticator, then `after_authenticate` on every hook. Each phase returns a
//! `Result`; a phase that does not return `Ok` is a broken hook implementation and
//! fails fast with [`RestError::Configuration`]. Authentication itself never
//! fails: an unauthenticated request yields `Ok(None)` and the handler decides
//! what that means.
//!
//! ## Example
//!
//! A hook that counts authentication attempts and records who got through.
//! Hooks observe; rejecting a client belongs in the handler, which sees the
//! `Option<Principal>`.
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Mutex;
//!
//! use restful_dispatch::security::{AuthHooks, Principal};
//! use restful_dispatch::server::RestRequest;
//!
//! #[derive(Default)]
//! struct AuditHook {
//!     attempts: AtomicUsize,
//!     principals: Mutex<Vec<String>>,
//! }
//!
//! impl AuthHooks for AuditHook {
//!     fn before_authenticate(&self, _req: &RestRequest) -> anyhow::Result<()> {
//!         self.attempts.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//!
//!     fn after_authenticate(&self, principal: Option<&Principal>) -> anyhow::Result<()> {
//!         if let Some(p) = principal {
//!             self.principals
//!                 .lock()
//!                 .map_err(|_| anyhow::anyhow!("audit log poisoned"))?
//!                 .push(p.id.clone());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # use std::sync::Arc;
//! # use http::Method;
//! # use restful_dispatch::security::{authenticate, NoAuthenticator};
//! let hook = Arc::new(AuditHook::default());
//! let hooks = vec![Arc::clone(&hook) as Arc<dyn AuthHooks>];
//! let principal = authenticate(&NoAuthenticator, &hooks, &RestRequest::new(Method::GET)).unwrap();
//! assert!(principal.is_none());
//! assert_eq!(hook.attempts.load(Ordering::Relaxed), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::RestConfig;
use crate::error::RestError;
use crate::server::RestRequest;

mod authenticators;

pub use authenticators::{HeaderTokenAuthenticator, NoAuthenticator};

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    /// Stable identifier of the caller
    pub id: String,
    /// Authenticator-specific details (token kind, scopes, ...)
    pub claims: Value,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            claims: Value::Null,
        }
    }

    #[must_use]
    pub fn with_claims(mut self, claims: Value) -> Self {
        self.claims = claims;
        self
    }
}

/// Resolves request credentials into a principal.
pub trait Authenticator: Send + Sync {
    /// Authenticate the request
    ///
    /// # Returns
    ///
    /// * `Some(Principal)` - credentials were present and valid
    /// * `None` - anonymous or invalid credentials
    fn authenticate(&self, req: &RestRequest) -> Option<Principal>;
}

/// Lifecycle callbacks around authentication.
///
/// Both phases default to `Ok(())`. Overrides must return `Ok(())` once their
/// phase is complete; anything else is reported as a configuration error.
pub trait AuthHooks: Send + Sync {
    /// Runs before the authenticator; may inspect headers
    fn before_authenticate(&self, _req: &RestRequest) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the authenticator with its outcome
    fn after_authenticate(&self, _principal: Option<&Principal>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Run the full authentication lifecycle for `req`.
///
/// # Errors
///
/// Returns [`RestError::Configuration`] when a hook phase does not complete.
pub fn authenticate(
    authenticator: &dyn Authenticator,
    hooks: &[Arc<dyn AuthHooks>],
    req: &RestRequest,
) -> Result<Option<Principal>, RestError> {
    for (idx, hook) in hooks.iter().enumerate() {
        if let Err(err) = hook.before_authenticate(req) {
            error!(
                request_id = %req.request_id,
                hook_idx = idx,
                error = %err,
                "before_authenticate hook did not complete - CRITICAL"
            );
            return Err(RestError::configuration(format!(
                "before_authenticate hook #{} did not complete: {}",
                idx, err
            )));
        }
    }

    let principal = authenticator.authenticate(req);
    debug!(
        request_id = %req.request_id,
        authenticated = principal.is_some(),
        principal = ?principal.as_ref().map(|p| p.id.as_str()),
        "Authenticator finished"
    );

    for (idx, hook) in hooks.iter().enumerate() {
        if let Err(err) = hook.after_authenticate(principal.as_ref()) {
            error!(
                request_id = %req.request_id,
                hook_idx = idx,
                error = %err,
                "after_authenticate hook did not complete - CRITICAL"
            );
            return Err(RestError::configuration(format!(
                "after_authenticate hook #{} did not complete: {}",
                idx, err
            )));
        }
    }

    Ok(principal)
}

/// Named authenticators available to [`RestConfig::authenticator`].
#[derive(Clone, Default)]
pub struct AuthenticatorRegistry {
    authenticators: HashMap<String, Arc<dyn Authenticator>>,
}

impl AuthenticatorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `none` and `header-token` (fed from `config.tokens`)
    #[must_use]
    pub fn with_defaults(config: &RestConfig) -> Self {
        let mut registry = Self::new();
        registry.register("none", Arc::new(NoAuthenticator));
        registry.register(
            "header-token",
            Arc::new(HeaderTokenAuthenticator::new(config.tokens.clone())),
        );
        registry
    }

    pub fn register(&mut self, id: &str, authenticator: Arc<dyn Authenticator>) {
        info!(authenticator = %id, "Authenticator registered");
        self.authenticators.insert(id.to_string(), authenticator);
    }

    /// Look up an authenticator by id.
    ///
    /// # Errors
    ///
    /// Unknown ids are a [`RestError::Configuration`].
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Authenticator>, RestError> {
        self.authenticators.get(id).cloned().ok_or_else(|| {
            let mut known: Vec<&String> = self.authenticators.keys().collect();
            known.sort();
            RestError::configuration(format!(
                "unknown authenticator '{}' (registered: {:?})",
                id, known
            ))
        })
    }
}
