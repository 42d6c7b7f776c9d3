use cucumber::{given, then, when};

use super::{last_json, run_bfd};
use crate::BountyWorld;

#[given(expr = "I register issue {string} titled {string} in project {string}")]
#[when(expr = "I register issue {string} titled {string} in project {string}")]
async fn i_register_issue(
    world: &mut BountyWorld,
    issue_ref: String,
    title: String,
    project: String,
) {
    run_bfd(world, &["issue", "add", &project, &issue_ref, &title]);
    world.last_project = project;
    world.last_issue = issue_ref;
}

#[when(expr = "I set issue {string} in project {string} to status {string}")]
async fn i_set_issue_status(
    world: &mut BountyWorld,
    issue_ref: String,
    project: String,
    status: String,
) {
    run_bfd(
        world,
        &["issue", "update", &project, &issue_ref, "--status", &status],
    );
}

#[when(expr = "I show issue {string} in project {string}")]
async fn i_show_issue(world: &mut BountyWorld, issue_ref: String, project: String) {
    run_bfd(world, &["--json", "issue", "show", &project, &issue_ref]);
}

#[then(expr = "issue {string} in project {string} has status {string}")]
async fn issue_has_status(
    world: &mut BountyWorld,
    issue_ref: String,
    project: String,
    status: String,
) {
    run_bfd(world, &["--json", "issue", "show", &project, &issue_ref]);
    assert_eq!(world.last_exit_code, 0, "issue show failed: {}", world.last_stderr);
    let json = last_json(world);
    assert_eq!(
        json["status"].as_str(),
        Some(status.as_str()),
        "unexpected status: {}",
        json["status"]
    );
}
