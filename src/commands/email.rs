use crate::config::Settings;
use crate::db::Database;

/// List pending notifications, oldest first.
pub fn list(settings: &Settings, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let emails = db.list_emails()?;

    if json {
        let j = serde_json::to_string_pretty(&emails).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if emails.is_empty() {
        println!("No pending emails.");
        return Ok(());
    }

    println!("{:<6} {:<8} {:<6} BODY", "ID", "PROJECT", "USER");
    println!("{}", "-".repeat(80));
    for email in &emails {
        println!(
            "{:<6} {:<8} {:<6} {}",
            email.email_id, email.project_id, email.user_id, email.body,
        );
    }
    Ok(())
}

/// Remove a notification once it has been delivered.
pub fn delete(settings: &Settings, email_id: i64, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    db.delete_email(email_id)?;

    if json {
        let j = serde_json::to_string_pretty(&serde_json::json!({ "deleted": email_id }))
            .map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Deleted email {email_id}");
    }
    Ok(())
}
