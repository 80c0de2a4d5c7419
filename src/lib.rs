// Module declarations
pub mod aggregate;
pub mod cli_context;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatting;
pub mod graphql_fields;
pub mod logging;
pub mod models;
pub mod pipeline;


// Re-export commonly used items
pub use aggregate::{aggregate, MembershipAggregator};
pub use client::{GitHubClient, Governor, LimitAction, PortClient, RateLimitPolicy};
pub use config::{load_config, Config, Settings};
pub use error::{SyncError, SyncResult};
pub use models::*;
pub use pipeline::{Pipeline, PipelineStage, SyncReport};
