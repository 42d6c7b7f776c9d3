use crate::config::{DatabaseLocation, Key, Settings};
use crate::db::Database;
use crate::models::ProjectKind;

/// Create the schema and seed the default project when enabled.
pub fn run(settings: &Settings) -> Result<(), String> {
    let db = Database::connect(settings)?;
    db.migrate()?;
    db.set_meta("version", env!("CARGO_PKG_VERSION"))?;

    if settings.bool_value(Key::ProjectDefault) && db.get_project_by_name("default")?.is_none() {
        db.insert_project("default", "Default project", ProjectKind::Normal)?;
        println!("Seeded default project");
    }

    match settings.database_location()? {
        DatabaseLocation::InMemory => println!("Initialized in-memory database"),
        DatabaseLocation::File(path) => println!("Initialized database at {}", path.display()),
    }
    Ok(())
}
