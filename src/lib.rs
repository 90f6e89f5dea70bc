//! # Kawal (session & navigation guarding client)
//!
//! `kawal` is client-side glue for applications backed by an external
//! identity provider, a document store, and a small backend HTTP API. It
//! wraps the provider's REST surface behind a capability interface and
//! layers four things on top:
//!
//! - a token-injecting HTTP client that attaches a fresh bearer credential
//!   to every backend request made while a principal is signed in,
//! - a registration flow that creates a principal and writes its profile
//!   record into the document store,
//! - a session store holding the current profile and user list as
//!   process-wide reactive state,
//! - a navigation guard that delays the first route evaluation until the
//!   provider reports its initial auth state, then applies per-route
//!   authenticated/guest policies.
//!
//! ## Auth-gate
//!
//! The provider restores a persisted session asynchronously at startup.
//! Until that first resolution, route evaluation would either flash
//! unauthenticated content or redirect incorrectly, so the guard suspends
//! behind a one-shot latch ([`router::AuthGate`]) that opens on the first
//! auth-state value and never closes again. The wait is bounded; on
//! timeout the navigation proceeds treating the session as unauthenticated.

pub mod account;
pub mod api;
pub mod cli;
pub mod identity;
pub mod router;
pub mod session;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
