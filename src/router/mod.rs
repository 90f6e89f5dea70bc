//! Navigation guard with per-route auth policies.
//!
//! The route table is static: four paths, each tagged with a policy at
//! construction and never mutated. Every navigation first passes the
//! one-shot [`AuthGate`], then reads the current principal synchronously
//! and applies the target route's policy. The guard is UX-only; real
//! access control must live on the API.

pub mod gate;

pub use gate::{AuthGate, DEFAULT_GATE_TIMEOUT};

use crate::identity::IdentityProvider;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::debug;

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const PROFILE_PATH: &str = "/profile";

/// Static per-route metadata controlling guard behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutePolicy {
    RequiresAuth,
    RequiresGuest,
    Public,
}

#[derive(Clone, Debug)]
pub struct Route {
    pub path: String,
    pub policy: RoutePolicy,
}

impl Route {
    #[must_use]
    pub fn new(path: &str, policy: RoutePolicy) -> Self {
        Self {
            path: path.to_string(),
            policy,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The application's route table: home requires a signed-in
    /// principal, the remaining views are guest routes.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Route::new(ROOT_PATH, RoutePolicy::RequiresAuth),
            Route::new(LOGIN_PATH, RoutePolicy::RequiresGuest),
            Route::new(REGISTER_PATH, RoutePolicy::RequiresGuest),
            Route::new(PROFILE_PATH, RoutePolicy::RequiresGuest),
        ])
    }

    /// Policy for `path`; unknown paths carry no policy.
    #[must_use]
    pub fn policy(&self, path: &str) -> RoutePolicy {
        self.routes
            .iter()
            .find(|route| route.path == path)
            .map_or(RoutePolicy::Public, |route| route.policy)
    }
}

/// Outcome of a navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(String),
}

pub struct NavigationGuard {
    table: RouteTable,
    gate: AuthGate,
    identity: Arc<dyn IdentityProvider>,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(table: RouteTable, identity: Arc<dyn IdentityProvider>, timeout: Duration) -> Self {
        let gate = AuthGate::new(identity.auth_state(), timeout);

        Self {
            table,
            gate,
            identity,
        }
    }

    #[must_use]
    pub fn with_defaults(identity: Arc<dyn IdentityProvider>) -> Self {
        Self::new(RouteTable::with_defaults(), identity, DEFAULT_GATE_TIMEOUT)
    }

    /// Whether the first auth-state resolution has been observed.
    #[must_use]
    pub fn is_auth_checked(&self) -> bool {
        self.gate.is_checked()
    }

    /// Evaluate a navigation to `to`.
    ///
    /// The first call suspends until the provider's initial auth state is
    /// known (bounded by the gate timeout); every later call completes
    /// synchronously. A sign-in or sign-out happening between navigations
    /// is picked up here because the principal is re-read per call, but
    /// consumers wanting to react without navigating must subscribe to
    /// the auth-state stream themselves.
    pub async fn before_each(&self, to: &str) -> GuardOutcome {
        self.gate.wait_checked().await;

        let principal = self.identity.current_principal();

        let outcome = match self.table.policy(to) {
            RoutePolicy::RequiresAuth if principal.is_none() => {
                GuardOutcome::Redirect(LOGIN_PATH.to_string())
            }
            RoutePolicy::RequiresGuest
                if principal.is_some() && (to == LOGIN_PATH || to == REGISTER_PATH) =>
            {
                GuardOutcome::Redirect(ROOT_PATH.to_string())
            }
            _ => GuardOutcome::Allow,
        };

        debug!("navigation to {to}: {outcome:?}");

        outcome
    }
}
