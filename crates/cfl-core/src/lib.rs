//! Config Layers service
//!
//! Ties the fetch layer to the aggregation tree:
//! - Loads configuration (TOML file plus API keys from the environment)
//! - Builds a tree for a group from any [`ConfigSource`](cfl_fetch::ConfigSource)
//! - Keeps the latest tree and serves chart, subtree, and stats queries
//!
//! # Example
//!
//! ```rust,ignore
//! use cfl_core::{LayerService, LayersConfig};
//! use cfl_fetch::{DirectorySource, GroupId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = LayerService::new(LayersConfig::new());
//! service
//!     .rebuild_from(&DirectorySource::new("./snapshot"), &GroupId::from(1))
//!     .await?;
//!
//! let chart = service.chart()?;
//! println!("{} nodes", chart.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod build;
pub mod config;
pub mod error;
pub mod service;

pub use build::build_tree;
pub use config::{ChartConfig, LayersConfig};
pub use error::{ConfigError, ServiceError};
pub use service::{LayerService, Snapshot};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the layer service
    pub use crate::{ChartConfig, LayerService, LayersConfig, ServiceError, Snapshot};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
