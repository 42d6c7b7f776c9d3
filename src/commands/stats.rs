use std::collections::HashMap;

use super::resolve_project;
use crate::config::Settings;
use crate::db::Database;

/// Issue and sponsorship counts, plus the live pledge total.
pub fn run(settings: &Settings, project: Option<&str>, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project_id = match project {
        Some(reference) => Some(resolve_project(&db, reference)?.project_id),
        None => None,
    };

    let issues = db.issue_count_by_status(project_id)?;
    let sponsorships = db.sponsorship_count_by_status(project_id)?;
    let pledged = db.total_pledged(project_id)?;

    if json {
        let issue_map: HashMap<&str, i64> =
            issues.iter().map(|(s, c)| (s.as_str(), *c)).collect();
        let sponsorship_map: HashMap<&str, i64> =
            sponsorships.iter().map(|(s, c)| (s.as_str(), *c)).collect();

        let out = serde_json::json!({
            "issues_by_status": issue_map,
            "sponsorships_by_status": sponsorship_map,
            "total_pledged": pledged,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).map_err(|e| format!("json error: {e}"))?
        );
        return Ok(());
    }

    if issues.is_empty() && sponsorships.is_empty() {
        println!("No issues or sponsorships found.");
        return Ok(());
    }

    if !issues.is_empty() {
        println!("Issues");
        println!("{}", "-".repeat(24));
        for (status, count) in &issues {
            println!("  {:<14} {}", status, count);
        }
    }

    if !sponsorships.is_empty() {
        if !issues.is_empty() {
            println!();
        }
        println!("Sponsorships");
        println!("{}", "-".repeat(24));
        for (status, count) in &sponsorships {
            println!("  {:<14} {}", status, count);
        }
    }

    println!();
    println!("Total pledged: {pledged}");
    Ok(())
}
