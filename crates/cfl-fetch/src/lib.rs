//! Config Layers fetch layer
//!
//! Supplies the documents an aggregation build consumes:
//! - the device ids of a group
//! - the group's own configuration
//! - one configuration per device, requested in batches
//!
//! # Sources
//!
//! - [`EcmClient`]: the remote management API, with retry/backoff and
//!   pagination
//! - [`DirectorySource`]: documents stored on disk, for offline use
//!
//! Both implement [`ConfigSource`], which is all the build procedure needs.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod payload;
pub mod source;

pub use client::EcmClient;
pub use config::{ApiConfig, Credentials, RetryPolicy};
pub use directory::DirectorySource;
pub use error::FetchError;
pub use source::{ConfigSource, GroupId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
