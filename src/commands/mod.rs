pub mod account;
pub mod changes;
pub mod config;
pub mod email;
pub mod init;
pub mod issue;
pub mod project;
pub mod sponsor;
pub mod stats;
pub mod token;
pub mod user;

use colored::Colorize;

use crate::db::Database;
use crate::models::{Issue, IssueStatus, Project, Sponsorship, SponsorshipStatus};

/// Resolve a project reference: a numeric project id or an access token.
pub fn resolve_project(db: &Database, reference: &str) -> Result<Project, String> {
    if let Ok(id) = reference.parse::<i64>() {
        if let Some(project) = db.get_project(id)? {
            return Ok(project);
        }
    } else if let Some(project) = db.get_project_by_token(reference)? {
        return Ok(project);
    }
    Err(format!("project not found: {reference}"))
}

/// Reject writes to projects that cannot be edited.
pub fn ensure_mutable(project: &Project) -> Result<(), String> {
    if project.is_mutable() {
        Ok(())
    } else {
        Err(format!("project is not mutable: {}", project.name))
    }
}

/// Open an audit record for a mutating command.
pub fn audit_start(
    db: &Database,
    project_id: i64,
    method: &str,
    path: &str,
    arguments: &serde_json::Value,
) -> Result<i64, String> {
    db.insert_change(project_id, method, path, &arguments.to_string())
}

/// Record the outcome of a mutating command.
pub fn audit_finish(db: &Database, change_id: i64, response: &str) -> Result<(), String> {
    db.finish_change(change_id, 0, response)
}

/// Format an issue status as a colored string.
pub fn format_issue_status(s: &IssueStatus) -> String {
    match s {
        IssueStatus::Ready => "ready".green().to_string(),
        IssueStatus::Started => "started".cyan().to_string(),
        IssueStatus::Completed => "completed".bright_black().to_string(),
    }
}

/// Format a sponsorship status as a colored string.
pub fn format_sponsorship_status(s: &SponsorshipStatus) -> String {
    match s {
        SponsorshipStatus::Pledged => "pledged".yellow().to_string(),
        SponsorshipStatus::Confirmed => "confirmed".cyan().to_string(),
        SponsorshipStatus::Validated => "validated".green().to_string(),
        SponsorshipStatus::Transferred => "transferred".bright_black().to_string(),
        SponsorshipStatus::Rejected => "rejected".red().to_string(),
        SponsorshipStatus::Refunded => "refunded".red().to_string(),
    }
}

/// Print a list of issues as a table or JSON.
pub fn print_issues(issues: &[Issue], json: bool) -> Result<(), String> {
    if json {
        let j = serde_json::to_string_pretty(issues).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    println!("{:<8} {:<12} {:<12} TITLE", "REF", "STATUS", "OWNER");
    println!("{}", "-".repeat(80));
    for issue in issues {
        let owner = issue
            .owner_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        let title = if issue.title.len() > 46 {
            format!("{}...", &issue.title[..43])
        } else {
            issue.title.clone()
        };
        println!(
            "{:<8} {:<12} {:<12} {}",
            issue.issue_ref,
            format_issue_status(&issue.status),
            owner,
            title,
        );
    }
    Ok(())
}

/// Print a list of sponsorships as a table or JSON.
pub fn print_sponsorships(db: &Database, sponsorships: &[Sponsorship], json: bool) -> Result<(), String> {
    if json {
        let j =
            serde_json::to_string_pretty(sponsorships).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if sponsorships.is_empty() {
        println!("No sponsorships found.");
        return Ok(());
    }

    println!("{:<6} {:<16} {:>8} STATUS", "ID", "SPONSOR", "AMOUNT");
    println!("{}", "-".repeat(48));
    let mut total = 0;
    for sp in sponsorships {
        let sponsor = match sp.user_id {
            Some(user_id) => db
                .get_user(user_id)?
                .map(|u| u.name)
                .unwrap_or_else(|| user_id.to_string()),
            None => sp
                .account_id
                .map(|id| format!("account {id}"))
                .unwrap_or_default(),
        };
        total += sp.amount;
        println!(
            "{:<6} {:<16} {:>8} {}",
            sp.sponsorship_id,
            sponsor,
            sp.amount,
            format_sponsorship_status(&sp.status),
        );
    }
    println!("{}", "-".repeat(48));
    println!("{:<23} {:>8}", "total", total);
    Ok(())
}
