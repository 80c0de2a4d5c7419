pub mod github_client;
pub mod governor;
pub mod graphql;
pub mod port_client;

pub use github_client::GitHubClient;
pub use governor::{Governor, LimitAction, RateLimitPolicy};
pub use graphql::GraphQLClient;
pub use port_client::PortClient;
