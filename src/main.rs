use std::env;
use std::process;

use clap::{value_parser, Arg, ArgAction, Command};

use team_sync::commands::config::handle_config;
use team_sync::commands::sync::handle_sync;
use team_sync::logging::{get_log_file_path, init_logging, log_debug};

fn shared_args() -> Vec<Arg> {
    vec![
        Arg::new("config")
            .long("config")
            .short('c')
            .value_name("PATH")
            .help("JSON config file (default: ~/.team-sync-config.json)"),
        Arg::new("token")
            .long("token")
            .value_name("TOKEN")
            .help("GitHub token with read:org scope (env: INPUT_TOKEN, GITHUB_TOKEN)"),
        Arg::new("org")
            .long("org")
            .short('o')
            .value_name("ORG")
            .help("GitHub organization login (env: INPUT_ORG)"),
        Arg::new("port-client-id")
            .long("port-client-id")
            .value_name("CLIENT_ID")
            .help("Port client id (env: INPUT_PORT_CLIENT_ID, PORT_CLIENT_ID)"),
        Arg::new("port-client-secret")
            .long("port-client-secret")
            .value_name("CLIENT_SECRET")
            .help("Port client secret (env: INPUT_PORT_CLIENT_SECRET, PORT_CLIENT_SECRET)"),
        Arg::new("github-api-url")
            .long("github-api-url")
            .value_name("URL")
            .help("GitHub GraphQL endpoint"),
        Arg::new("port-api-url")
            .long("port-api-url")
            .value_name("URL")
            .help("Port API base URL"),
        Arg::new("blueprint")
            .long("blueprint")
            .short('b')
            .value_name("BLUEPRINT")
            .help("Port blueprint for user entities (default: githubUser)"),
        Arg::new("include-email")
            .long("include-email")
            .help("Also request member emails and store them as an entity property")
            .action(ArgAction::SetTrue),
        Arg::new("max-retries")
            .long("max-retries")
            .value_name("N")
            .help("Retry budget per request for rate limits and transient failures")
            .value_parser(value_parser!(u32)),
        Arg::new("secondary-limit")
            .long("secondary-limit")
            .value_name("ACTION")
            .help("On a secondary rate limit: abort, retry-once or retry")
            .value_parser(["abort", "retry-once", "retry"]),
        Arg::new("timeout")
            .long("timeout")
            .value_name("SECONDS")
            .help("Per-request timeout")
            .value_parser(value_parser!(u64)),
    ]
}

#[tokio::main]
async fn main() {
    let app = Command::new("team-sync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Synchronize GitHub team membership into Port")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Print debug logs to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("sync")
                .about("Fetch all teams and upsert one user entity per member")
                .args(shared_args())
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .short('n')
                        .help("Fetch and aggregate only; print what would be sent")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_name("FORMAT")
                        .help("Output format: simple, table, json")
                        .value_parser(["simple", "table", "json"])
                        .default_value("simple"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show the resolved configuration with secrets masked")
                .args(shared_args()),
        );

    let matches = app.get_matches();

    if let Err(e) = init_logging(matches.get_flag("verbose")) {
        eprintln!("Warning: could not open log file: {}", e);
    }

    let result = match matches.subcommand() {
        Some(("sync", sub_matches)) => handle_sync(sub_matches).await,
        Some(("config", sub_matches)) => handle_config(sub_matches).await,
        _ => {
            eprintln!("Unknown command. Use 'team-sync --help' for available commands.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        log_debug(&format!("Exiting after {} error", e.kind()));
        if env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false) {
            println!("::error::{}", e);
        }
        eprintln!("Error: {}", e);
        if let Some(path) = get_log_file_path() {
            eprintln!("Log file: {}", path.display());
        }
        process::exit(1);
    }
}
