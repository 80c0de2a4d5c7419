use colored::*;

use crate::constants::TEAMS_RELATION;
use crate::models::UpsertPayload;
use crate::pipeline::SyncReport;

use super::utils::truncate;

pub fn print_report(report: &SyncReport, format: &str) {
    match format {
        "json" => {
            let value = if report.dry_run {
                serde_json::to_value(&report.payload)
            } else {
                serde_json::to_value(report)
            };
            match value.and_then(|v| serde_json::to_string_pretty(&v)) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to render report: {}", e),
            }
        }
        "table" => {
            if let Some(payload) = &report.payload {
                print_entities(payload);
            }
            println!("{}", summary_line(report));
        }
        _ => println!("{}", summary_line(report)),
    }

    for slug in &report.truncated_teams {
        eprintln!(
            "{} team '{}' exceeded the member page size; some members were not synced",
            "⚠️".yellow(),
            slug
        );
    }
}

pub fn summary_line(report: &SyncReport) -> String {
    if report.dry_run {
        format!(
            "{} Dry run: {} users from {} teams in '{}' would be synchronized",
            "ℹ️".cyan(),
            report.entities.to_string().bold(),
            report.teams,
            report.org
        )
    } else {
        format!(
            "{} Synchronized {} users from {} teams in '{}'",
            "✅".green(),
            report.entities.to_string().bold(),
            report.teams,
            report.org
        )
    }
}

fn print_entities(payload: &UpsertPayload) {
    println!("{}", "─".repeat(90).dimmed());
    println!(
        "{:<30} {:<24} {:<34}",
        "Identifier".bold(),
        "Login".bold(),
        "Teams".bold()
    );
    println!("{}", "─".repeat(90).dimmed());

    for entity in &payload.entities {
        let teams = entity
            .relations
            .get(TEAMS_RELATION)
            .map(|ids| ids.join(","))
            .unwrap_or_default();
        println!(
            "{:<30} {:<24} {:<34}",
            truncate(&entity.identifier, 30),
            truncate(&entity.title, 24),
            truncate(&teams, 34).dimmed()
        );
    }
}
