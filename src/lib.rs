//! Client library for the APNs binary push gateway.
//!
//! One [`connection::ConnectionHandle`] owns one encrypted session to the
//! gateway. Notifications are encoded as a JSON payload ([`payload`]),
//! wrapped in the gateway's fixed binary frame ([`frame`]) and transmitted
//! over TLS ([`tls`]). The connection actor ([`connection`]) reacts to
//! connection-level events and reports its termination reason to the owner.
//! Reconnection policy belongs to an external supervisor, not this crate.

pub mod config;
pub mod connection;
pub mod frame;
pub mod message;
pub mod payload;
pub mod tls;
pub mod token;
