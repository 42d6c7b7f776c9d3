use super::{audit_finish, audit_start, resolve_project};
use crate::config::Settings;
use crate::db::Database;

pub fn add(settings: &Settings, reference: &str, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;

    let change = audit_start(
        &db,
        project.project_id,
        "token",
        "add",
        &serde_json::json!({}),
    )?;
    let token = db.create_token(project.project_id)?;
    audit_finish(&db, change, &format!("minted token {}", token.token_id))?;

    if json {
        let j = serde_json::to_string_pretty(&token).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Token for project {}: {}", project.name, token.token);
    }
    Ok(())
}

pub fn list(settings: &Settings, project: Option<&str>, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project_id = match project {
        Some(reference) => Some(resolve_project(&db, reference)?.project_id),
        None => None,
    };
    let tokens = db.list_tokens(project_id)?;

    if json {
        let j = serde_json::to_string_pretty(&tokens).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if tokens.is_empty() {
        println!("No tokens found.");
        return Ok(());
    }

    println!("{:<6} {:<10} TOKEN", "ID", "PROJECT");
    println!("{}", "-".repeat(52));
    for token in &tokens {
        println!("{:<6} {:<10} {}", token.token_id, token.project_id, token.token);
    }
    Ok(())
}
