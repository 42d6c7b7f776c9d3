use super::{audit_finish, audit_start, resolve_project};
use crate::config::{Key, Settings};
use crate::db::Database;
use crate::models::ProjectKind;

pub fn add(
    settings: &Settings,
    name: &str,
    description: &str,
    kind: &str,
    json: bool,
) -> Result<(), String> {
    let kind = ProjectKind::from_str(kind)?;
    if kind == ProjectKind::Test && !settings.bool_value(Key::ProjectTest) {
        return Err("test projects are disabled".to_string());
    }
    if kind == ProjectKind::Root && !settings.bool_value(Key::ProjectRoot) {
        return Err("root projects are disabled".to_string());
    }

    let db = Database::connect(settings)?;
    let project = db.insert_project(name, description, kind)?;

    let change = audit_start(
        &db,
        project.project_id,
        "project",
        "add",
        &serde_json::json!({ "name": name, "kind": kind.as_str() }),
    )?;
    audit_finish(&db, change, &format!("created project {}", project.project_id))?;

    if json {
        let j = serde_json::to_string_pretty(&project).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Created project {}: {}", project.project_id, project.name);
    }
    Ok(())
}

pub fn list(settings: &Settings, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let projects = db.list_projects()?;

    if json {
        let j = serde_json::to_string_pretty(&projects).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    println!("{:<6} {:<8} {:<20} DESCRIPTION", "ID", "KIND", "NAME");
    println!("{}", "-".repeat(70));
    for project in &projects {
        println!(
            "{:<6} {:<8} {:<20} {}",
            project.project_id, project.kind, project.name, project.description,
        );
    }
    Ok(())
}

pub fn show(settings: &Settings, reference: &str, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;

    let issues = db.list_issues(project.project_id, None)?;
    let pledged = db.total_pledged(Some(project.project_id))?;
    let overrides = db.list_project_config(project.project_id)?;

    if json {
        let mut value =
            serde_json::to_value(&project).map_err(|e| format!("json error: {e}"))?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("issues".to_string(), serde_json::json!(issues.len()));
            obj.insert("total_pledged".to_string(), serde_json::json!(pledged));
            obj.insert(
                "config".to_string(),
                serde_json::to_value(&overrides).unwrap_or_default(),
            );
        }
        let j = serde_json::to_string_pretty(&value).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    println!("ID:          {}", project.project_id);
    println!("Name:        {}", project.name);
    println!("Kind:        {}", project.kind);
    println!("Description: {}", project.description);
    println!("Issues:      {}", issues.len());
    println!("Pledged:     {}", pledged);

    if !overrides.is_empty() {
        println!("\nOverrides:");
        for o in &overrides {
            println!("  {} = {}", o.name, o.value);
        }
    }
    Ok(())
}
