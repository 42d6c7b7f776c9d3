use super::{audit_finish, audit_start, ensure_mutable, resolve_project};
use crate::config::{Key, Settings, Value, validate_override};
use crate::db::Database;

/// Show the resolved configuration, globally or through a project's view.
pub fn show(settings: &Settings, project: Option<&str>, json: bool) -> Result<(), String> {
    let entries: Vec<(Key, Value)> = match project {
        None => Key::ALL.iter().map(|k| (*k, settings.get(*k))).collect(),
        Some(reference) => {
            let db = Database::connect(settings)?;
            let project = resolve_project(&db, reference)?;
            let scoped = settings.for_project(&db, project.project_id);
            let mut out = Vec::with_capacity(Key::ALL.len());
            for key in Key::ALL {
                out.push((*key, scoped.get(*key)?));
            }
            out
        }
    };

    if json {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(k, v)| (k.name().to_string(), v.to_json()))
            .collect();
        let j = serde_json::to_string_pretty(&serde_json::Value::Object(map))
            .map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    println!("{:<26} {:<44} DESCRIPTION", "NAME", "VALUE");
    println!("{}", "-".repeat(110));
    for (key, value) in &entries {
        println!(
            "{:<26} {:<44} {}",
            key.name(),
            value.as_display(),
            key.property().description,
        );
    }
    Ok(())
}

/// Write a per-project override after validating name, flag, and value.
pub fn set(
    settings: &Settings,
    reference: &str,
    name: &str,
    value: &str,
    json: bool,
) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    ensure_mutable(&project)?;
    let (key, parsed) = validate_override(name, value)?;

    let change = audit_start(
        &db,
        project.project_id,
        "config",
        "set",
        &serde_json::json!({ "name": key.name(), "value": value }),
    )?;
    db.set_project_config(project.project_id, &key.name().to_lowercase(), value)?;
    audit_finish(&db, change, &format!("set {}", key.name()))?;

    if json {
        let j = serde_json::to_string_pretty(&serde_json::json!({
            "project_id": project.project_id,
            "name": key.name(),
            "value": parsed.to_json(),
        }))
        .map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!(
            "Set {} = {} for project {}",
            key.name(),
            parsed.as_display(),
            project.name
        );
    }
    Ok(())
}

/// Remove a per-project override, falling back to the global value.
pub fn unset(settings: &Settings, reference: &str, name: &str, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    ensure_mutable(&project)?;
    let key = Key::from_name(name)?;

    let change = audit_start(
        &db,
        project.project_id,
        "config",
        "unset",
        &serde_json::json!({ "name": key.name() }),
    )?;
    db.delete_project_config(project.project_id, &key.name().to_lowercase())?;
    audit_finish(&db, change, &format!("unset {}", key.name()))?;

    if json {
        let j = serde_json::to_string_pretty(&serde_json::json!({
            "project_id": project.project_id,
            "name": key.name(),
        }))
        .map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Unset {} for project {}", key.name(), project.name);
    }
    Ok(())
}
