pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub const PORT_API_URL: &str = "https://api.getport.io/v1";
pub const CONFIG_FILE: &str = ".team-sync-config.json";
pub const USER_AGENT: &str = concat!("team-sync/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_BLUEPRINT: &str = "githubUser";
pub const TEAMS_RELATION: &str = "githubTeams";

// GitHub caps connection pages at 100 nodes
pub const TEAMS_PAGE_SIZE: u32 = 100;
pub const MEMBERS_PAGE_SIZE: u32 = 100;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TRANSIENT_BACKOFF_MS: u64 = 2_000;
pub const DEFAULT_FALLBACK_WAIT_SECS: u64 = 60;

pub const TEAM_FIELDS: &[&str] = &["name", "databaseId", "slug"];
pub const MEMBER_FIELDS: &[&str] = &["login", "id"];
