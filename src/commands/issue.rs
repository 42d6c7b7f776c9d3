use super::{
    audit_finish, audit_start, ensure_mutable, format_issue_status, format_sponsorship_status,
    print_issues, resolve_project,
};
use crate::config::Settings;
use crate::db::Database;
use crate::models::{IssueStatus, SponsorshipStatus};

pub fn add(
    settings: &Settings,
    reference: &str,
    issue_ref: &str,
    title: &str,
    link: Option<&str>,
    owner: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    ensure_mutable(&project)?;

    let link = link
        .map(str::to_string)
        .unwrap_or_else(|| format!("/issues/{issue_ref}"));
    let owner_id = resolve_owner(&db, project.project_id, owner)?;

    let change = audit_start(
        &db,
        project.project_id,
        "issue",
        "add",
        &serde_json::json!({ "issue_ref": issue_ref, "title": title }),
    )?;
    let issue = db.insert_issue(project.project_id, issue_ref, title, &link, owner_id)?;
    audit_finish(&db, change, &format!("registered issue {issue_ref}"))?;

    if json {
        let j = serde_json::to_string_pretty(&issue).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Registered issue {}: {}", issue.issue_ref, issue.title);
    }
    Ok(())
}

pub fn list(
    settings: &Settings,
    reference: &str,
    status: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    let issues = db.list_issues(project.project_id, status)?;
    print_issues(&issues, json)
}

pub fn show(settings: &Settings, reference: &str, issue_ref: &str, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    let issue = db
        .get_issue_by_ref(project.project_id, issue_ref)?
        .ok_or_else(|| format!("issue not found: {issue_ref}"))?;

    let scoped = settings.for_project(&db, project.project_id);
    let full_link = issue.full_link(&scoped.tracker_url()?);
    let sponsorships = db.list_sponsorships(issue.issue_id)?;
    let pledged: i64 = sponsorships
        .iter()
        .filter(|s| {
            !matches!(
                s.status,
                SponsorshipStatus::Rejected | SponsorshipStatus::Refunded
            )
        })
        .map(|s| s.amount)
        .sum();

    if json {
        let mut value = serde_json::to_value(&issue).map_err(|e| format!("json error: {e}"))?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("full_link".to_string(), serde_json::json!(full_link));
            obj.insert(
                "sponsorships".to_string(),
                serde_json::to_value(&sponsorships).unwrap_or_default(),
            );
            obj.insert("total_pledged".to_string(), serde_json::json!(pledged));
        }
        let j = serde_json::to_string_pretty(&value).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    println!("Ref:     {}", issue.issue_ref);
    println!("Title:   {}", issue.title);
    println!("Status:  {}", format_issue_status(&issue.status));
    println!("Link:    {full_link}");
    if let Some(owner_id) = issue.owner_id {
        if let Some(owner) = db.get_user(owner_id)? {
            println!("Owner:   {}", owner.name);
        }
    }
    println!("Pledged: {pledged}");

    if !sponsorships.is_empty() {
        println!("\nSponsorships:");
        for sp in &sponsorships {
            let sponsor = match sp.user_id {
                Some(user_id) => db
                    .get_user(user_id)?
                    .map(|u| u.name)
                    .unwrap_or_else(|| user_id.to_string()),
                None => String::new(),
            };
            println!(
                "  {} [{}] {} {}",
                sp.sponsorship_id,
                format_sponsorship_status(&sp.status),
                sponsor,
                sp.amount,
            );
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn update(
    settings: &Settings,
    reference: &str,
    issue_ref: &str,
    status: Option<&str>,
    title: Option<&str>,
    link: Option<&str>,
    owner: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    ensure_mutable(&project)?;

    let issue = db
        .get_issue_by_ref(project.project_id, issue_ref)?
        .ok_or_else(|| format!("issue not found: {issue_ref}"))?;
    let owner_id = resolve_owner(&db, project.project_id, owner)?;

    let change = audit_start(
        &db,
        project.project_id,
        "issue",
        "update",
        &serde_json::json!({ "issue_ref": issue_ref, "status": status }),
    )?;
    db.update_issue(issue.issue_id, status, title, link, owner_id)?;

    // Moving to completed notifies every live sponsor so they can validate.
    let completed_now = match status {
        Some(s) => {
            IssueStatus::from_str(s)? == IssueStatus::Completed
                && issue.status != IssueStatus::Completed
        }
        None => false,
    };
    let mut notified = 0;
    if completed_now {
        let updated = db
            .get_issue(issue.issue_id)?
            .ok_or_else(|| format!("issue not found: {issue_ref}"))?;
        for sp in db.list_sponsorships(issue.issue_id)? {
            if matches!(
                sp.status,
                SponsorshipStatus::Rejected | SponsorshipStatus::Refunded
            ) {
                continue;
            }
            let Some(user_id) = sp.user_id else { continue };
            let body = format!(
                "Issue '{}' has been completed. Please validate your sponsorship of {}.",
                updated.title, sp.amount,
            );
            db.insert_email(project.project_id, user_id, issue.issue_id, &body)?;
            notified += 1;
        }
    }

    audit_finish(&db, change, &format!("updated issue {issue_ref}"))?;

    if json {
        let updated = db
            .get_issue(issue.issue_id)?
            .ok_or_else(|| format!("issue not found: {issue_ref}"))?;
        let j = serde_json::to_string_pretty(&updated).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Updated issue {issue_ref}");
        if notified > 0 {
            println!("Queued {notified} sponsor notification(s)");
        }
    }
    Ok(())
}

fn resolve_owner(
    db: &Database,
    project_id: i64,
    owner: Option<&str>,
) -> Result<Option<i64>, String> {
    match owner {
        Some(name) => Ok(Some(
            db.get_user_by_name(project_id, name)?
                .ok_or_else(|| format!("user not found: {name}"))?
                .user_id,
        )),
        None => Ok(None),
    }
}
