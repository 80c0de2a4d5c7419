pub mod config;
pub mod sync;

use std::path::PathBuf;

use clap::ArgMatches;

use crate::cli_context::CliContextBuilder;
use crate::config::Config;

/// Collect the flags shared by every subcommand into a config layer
pub fn overrides_from_matches(matches: &ArgMatches) -> Config {
    let string = |name: &str| matches.get_one::<String>(name).cloned();

    Config {
        token: string("token"),
        org: string("org"),
        port_client_id: string("port-client-id"),
        port_client_secret: string("port-client-secret"),
        github_api_url: string("github-api-url"),
        port_api_url: string("port-api-url"),
        blueprint: string("blueprint"),
        include_email: matches.get_flag("include-email").then_some(true),
        max_retries: matches.get_one::<u32>("max-retries").copied(),
        secondary_limit: string("secondary-limit"),
        request_timeout_secs: matches.get_one::<u64>("timeout").copied(),
    }
}

pub fn context_builder(matches: &ArgMatches) -> CliContextBuilder {
    CliContextBuilder::new()
        .with_config_path(matches.get_one::<String>("config").map(PathBuf::from))
        .with_overrides(overrides_from_matches(matches))
}
