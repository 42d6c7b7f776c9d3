use super::{audit_finish, audit_start, resolve_project};
use crate::config::Settings;
use crate::db::Database;

pub fn add(
    settings: &Settings,
    reference: &str,
    name: &str,
    account_email: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;

    let account_id = match account_email {
        Some(email) => Some(
            db.get_account_by_email(email)?
                .ok_or_else(|| format!("account not found: {email}"))?
                .account_id,
        ),
        None => None,
    };

    if db.get_user_by_name(project.project_id, name)?.is_some() {
        return Err(format!("user already exists: {name}"));
    }

    let change = audit_start(
        &db,
        project.project_id,
        "user",
        "add",
        &serde_json::json!({ "name": name }),
    )?;
    let user = db.insert_user(project.project_id, name, account_id)?;
    audit_finish(&db, change, &format!("created user {}", user.user_id))?;

    if json {
        let j = serde_json::to_string_pretty(&user).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Created user {}: {}", user.user_id, user.name);
    }
    Ok(())
}

pub fn list(settings: &Settings, reference: &str, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    let users = db.list_users(project.project_id)?;

    if json {
        let j = serde_json::to_string_pretty(&users).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!("{:<6} {:<16} ACCOUNT", "ID", "NAME");
    println!("{}", "-".repeat(40));
    for user in &users {
        let account = user
            .account_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        println!("{:<6} {:<16} {}", user.user_id, user.name, account);
    }
    Ok(())
}
