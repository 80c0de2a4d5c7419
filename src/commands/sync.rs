use clap::ArgMatches;

use crate::error::SyncResult;
use crate::formatting::print_report;
use crate::logging::log_info;

use super::context_builder;

pub async fn handle_sync(matches: &ArgMatches) -> SyncResult<()> {
    let context = context_builder(matches).build()?;
    let format = matches.get_one::<String>("format").map(|s| s.as_str()).unwrap_or("simple");
    let dry_run = matches.get_flag("dry-run");

    log_info(&format!(
        "Syncing GitHub teams of '{}' into blueprint '{}'",
        context.settings().org,
        context.settings().blueprint
    ));

    let mut pipeline = context.pipeline()?.with_dry_run(dry_run);
    let report = pipeline.run().await?;

    print_report(&report, format);
    Ok(())
}
