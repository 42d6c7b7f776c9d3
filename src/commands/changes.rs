use super::resolve_project;
use crate::config::Settings;
use crate::db::Database;

/// Show the audit log for a project.
pub fn list(settings: &Settings, reference: &str, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    let changes = db.list_changes(project.project_id)?;

    if json {
        let j = serde_json::to_string_pretty(&changes).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if changes.is_empty() {
        println!("No changes recorded.");
        return Ok(());
    }

    println!(
        "{:<6} {:<17} {:<10} {:<8} RESPONSE",
        "ID", "TIME", "METHOD", "PATH"
    );
    println!("{}", "-".repeat(80));
    for change in &changes {
        println!(
            "{:<6} {:<17} {:<10} {:<8} {}",
            change.change_id,
            change.timestamp.format("%Y-%m-%d %H:%M"),
            change.method,
            change.path,
            change.response.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
