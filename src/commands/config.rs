use clap::ArgMatches;

use crate::error::SyncResult;

use super::context_builder;

/// Print the resolved configuration with secrets masked.
pub async fn handle_config(matches: &ArgMatches) -> SyncResult<()> {
    let context = context_builder(matches).build()?;
    println!("{}", serde_json::to_string_pretty(&context.settings().redacted())?);
    Ok(())
}
