use super::{
    audit_finish, audit_start, ensure_mutable, print_sponsorships, resolve_project,
};
use crate::config::Settings;
use crate::db::Database;
use crate::models::{PaymentGateway, PaymentStatus, SponsorshipStatus};

/// Pledge an amount toward an issue. The sponsoring user is created on
/// first pledge; the amount is capped by the project's MAX_PLEDGE_AMOUNT.
pub fn pledge(
    settings: &Settings,
    reference: &str,
    issue_ref: &str,
    user_name: &str,
    amount: i64,
    json: bool,
) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    ensure_mutable(&project)?;

    let issue = db
        .get_issue_by_ref(project.project_id, issue_ref)?
        .ok_or_else(|| format!("issue not found: {issue_ref}"))?;

    let scoped = settings.for_project(&db, project.project_id);
    let max_amount = scoped.max_pledge_amount()?;
    if amount <= 0 {
        return Err("pledge amount must be positive".to_string());
    }
    if amount > max_amount {
        return Err(format!(
            "pledge amount {amount} exceeds the maximum of {max_amount}"
        ));
    }

    let user = match db.get_user_by_name(project.project_id, user_name)? {
        Some(user) => user,
        None => db.insert_user(project.project_id, user_name, None)?,
    };

    let change = audit_start(
        &db,
        project.project_id,
        "sponsor",
        "pledge",
        &serde_json::json!({ "issue_ref": issue_ref, "user": user_name, "amount": amount }),
    )?;
    let sponsorship = db.insert_sponsorship(
        project.project_id,
        issue.issue_id,
        Some(user.user_id),
        user.account_id,
        amount,
    )?;
    audit_finish(
        &db,
        change,
        &format!("pledged {amount} toward issue {issue_ref}"),
    )?;

    if json {
        let j =
            serde_json::to_string_pretty(&sponsorship).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!(
            "Pledged {} toward issue {} (sponsorship {})",
            amount, issue_ref, sponsorship.sponsorship_id
        );
    }
    Ok(())
}

/// Mark a pledged sponsorship as paid out-of-band.
pub fn confirm(settings: &Settings, sponsorship_id: i64, json: bool) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let sponsorship = db
        .get_sponsorship(sponsorship_id)?
        .ok_or_else(|| format!("sponsorship not found: {sponsorship_id}"))?;

    if sponsorship.status != SponsorshipStatus::Pledged {
        return Err(format!(
            "only pledged sponsorships can be confirmed, this one is {}",
            sponsorship.status
        ));
    }

    let change = audit_start(
        &db,
        sponsorship.project_id,
        "sponsor",
        "confirm",
        &serde_json::json!({ "sponsorship_id": sponsorship_id }),
    )?;
    db.update_sponsorship_status(sponsorship_id, SponsorshipStatus::Confirmed)?;
    audit_finish(&db, change, &format!("confirmed sponsorship {sponsorship_id}"))?;

    if json {
        let updated = db
            .get_sponsorship(sponsorship_id)?
            .ok_or_else(|| format!("sponsorship not found: {sponsorship_id}"))?;
        let j = serde_json::to_string_pretty(&updated).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Confirmed sponsorship {sponsorship_id}");
    }
    Ok(())
}

/// Pay a pledged sponsorship through one of the project's enabled gateways.
/// The dummy gateway settles immediately; the rest need the hosted checkout
/// flow and are rejected here.
pub fn pay(
    settings: &Settings,
    sponsorship_id: i64,
    gateway: &str,
    json: bool,
) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let sponsorship = db
        .get_sponsorship(sponsorship_id)?
        .ok_or_else(|| format!("sponsorship not found: {sponsorship_id}"))?;

    if sponsorship.status != SponsorshipStatus::Pledged {
        return Err(format!(
            "only pledged sponsorships can be paid, this one is {}",
            sponsorship.status
        ));
    }

    let gateway = PaymentGateway::from_str(gateway)?;
    let scoped = settings.for_project(&db, sponsorship.project_id);
    let enabled = scoped.payment_gateways()?;
    if !enabled.contains(&gateway) {
        return Err(format!("gateway not enabled for this project: {gateway}"));
    }
    if gateway != PaymentGateway::Dummy {
        return Err(format!(
            "{gateway} payments require the hosted checkout flow"
        ));
    }

    let change = audit_start(
        &db,
        sponsorship.project_id,
        "sponsor",
        "pay",
        &serde_json::json!({ "sponsorship_id": sponsorship_id, "gateway": gateway.as_str() }),
    )?;
    let payment = db.insert_payment(sponsorship.project_id, sponsorship_id, gateway)?;
    db.update_payment(
        payment.payment_id,
        Some(&format!("dummy-{}", payment.payment_id)),
        None,
        Some(PaymentStatus::Confirmed),
    )?;
    db.update_sponsorship_status(sponsorship_id, SponsorshipStatus::Confirmed)?;
    audit_finish(
        &db,
        change,
        &format!("payment {} confirmed", payment.payment_id),
    )?;

    if json {
        let updated = db
            .get_payment(payment.payment_id)?
            .ok_or_else(|| format!("payment not found: {}", payment.payment_id))?;
        let j = serde_json::to_string_pretty(&updated).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!(
            "Payment {} confirmed, sponsorship {} is now confirmed",
            payment.payment_id, sponsorship_id
        );
    }
    Ok(())
}

pub fn list(
    settings: &Settings,
    reference: &str,
    issue_ref: &str,
    json: bool,
) -> Result<(), String> {
    let db = Database::connect(settings)?;
    let project = resolve_project(&db, reference)?;
    let issue = db
        .get_issue_by_ref(project.project_id, issue_ref)?
        .ok_or_else(|| format!("issue not found: {issue_ref}"))?;
    let sponsorships = db.list_sponsorships(issue.issue_id)?;
    print_sponsorships(&db, &sponsorships, json)
}
