use crate::config::Settings;
use crate::db::Database;
use crate::models::Account;

pub fn add(
    settings: &Settings,
    email: &str,
    name: &str,
    password: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let password_hash = Account::hash_password(password)?;
    let account = db.insert_account(email, name, password_hash)?;

    if json {
        let j = serde_json::to_string_pretty(&account).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Created account {}: {}", account.account_id, account.email);
    }
    Ok(())
}

pub fn list(settings: &Settings, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let accounts = db.list_accounts()?;

    if json {
        let j = serde_json::to_string_pretty(&accounts).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if accounts.is_empty() {
        println!("No accounts found.");
        return Ok(());
    }

    println!("{:<6} {:<28} NAME", "ID", "EMAIL");
    println!("{}", "-".repeat(60));
    for account in &accounts {
        println!("{:<6} {:<28} {}", account.account_id, account.email, account.name);
    }
    Ok(())
}
