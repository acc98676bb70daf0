//! pdn-remote - Hosted backend clients for PDN
//!
//! `reqwest` implementations of the two pdn-core boundaries: a token-grant
//! auth client behind [`auth::RestIdentityProvider`] and per-collection REST
//! clients behind [`collections::RestCollection`]. Live queries are realized
//! as polling watchers that emit on change and retry with capped exponential
//! backoff.

pub mod auth;
pub mod collections;
pub mod config;

pub use auth::RestIdentityProvider;
pub use collections::RestCollection;
pub use config::RemoteConfig;
