use cucumber::{given, then, when};

use super::{last_json, run_bfd};
use crate::BountyWorld;

#[given(expr = "user {string} pledges {int} toward issue {string} in project {string}")]
#[when(expr = "user {string} pledges {int} toward issue {string} in project {string}")]
async fn user_pledges(
    world: &mut BountyWorld,
    user: String,
    amount: i64,
    issue_ref: String,
    project: String,
) {
    let amount_str = amount.to_string();
    run_bfd(
        world,
        &[
            "--json",
            "sponsor",
            "pledge",
            &project,
            &issue_ref,
            &user,
            &amount_str,
        ],
    );
    world.last_project = project;
    world.last_issue = issue_ref;

    if world.last_exit_code == 0 {
        let json = last_json(world);
        if let Some(id) = json["sponsorship_id"].as_i64() {
            world.ids.insert("sponsorship".to_string(), id.to_string());
        }
    }
}

#[when(expr = "I pay the last sponsorship with the {word} gateway")]
async fn i_pay_the_last_sponsorship(world: &mut BountyWorld, gateway: String) {
    let id = world
        .ids
        .get("sponsorship")
        .expect("no sponsorship id — pledge first")
        .clone();
    run_bfd(world, &["sponsor", "pay", &id, "--gateway", &gateway]);
}

#[when("I confirm the last sponsorship")]
async fn i_confirm_the_last_sponsorship(world: &mut BountyWorld) {
    let id = world
        .ids
        .get("sponsorship")
        .expect("no sponsorship id — pledge first")
        .clone();
    run_bfd(world, &["sponsor", "confirm", &id]);
}

#[then(expr = "the last sponsorship has status {string}")]
async fn the_last_sponsorship_has_status(world: &mut BountyWorld, status: String) {
    let id = world
        .ids
        .get("sponsorship")
        .expect("no sponsorship id — pledge first")
        .clone();
    let project = world.last_project.clone();
    let issue_ref = world.last_issue.clone();
    run_bfd(world, &["--json", "sponsor", "list", &project, &issue_ref]);
    assert_eq!(world.last_exit_code, 0, "sponsor list failed: {}", world.last_stderr);

    let json = last_json(world);
    let sponsorships = json.as_array().expect("sponsor list is not an array");
    let found = sponsorships
        .iter()
        .find(|s| s["sponsorship_id"].as_i64().map(|v| v.to_string()) == Some(id.clone()))
        .unwrap_or_else(|| panic!("sponsorship {id} not in list: {sponsorships:?}"));
    assert_eq!(
        found["status"].as_str(),
        Some(status.as_str()),
        "unexpected status: {}",
        found["status"]
    );
}

#[then(expr = "the total pledged for project {string} is {int}")]
async fn the_total_pledged_is(world: &mut BountyWorld, project: String, expected: i64) {
    run_bfd(world, &["--json", "stats", "--project", &project]);
    assert_eq!(world.last_exit_code, 0, "stats failed: {}", world.last_stderr);
    let json = last_json(world);
    assert_eq!(
        json["total_pledged"].as_i64(),
        Some(expected),
        "unexpected total: {}",
        json["total_pledged"]
    );
}

#[then(expr = "the audit log for project {string} contains {string}")]
async fn the_audit_log_contains(world: &mut BountyWorld, project: String, expected: String) {
    run_bfd(world, &["--json", "changes", &project]);
    assert_eq!(world.last_exit_code, 0, "changes failed: {}", world.last_stderr);
    assert!(
        world.last_stdout.contains(&expected),
        "expected {expected:?} in audit log:\n{}",
        world.last_stdout
    );
}
