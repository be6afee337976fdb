//! Provider-facing endpoint descriptors.
//!
//! An [`Endpoint`] is static provider data: the URLs each protocol step talks to plus the
//! header and parameter quirks that differ between providers. Adapters build one through
//! [`EndpointBuilder`] and hand it to a [`Config`](crate::config::Config); engines never
//! mutate it.

pub mod endpoint;

pub use endpoint::*;
