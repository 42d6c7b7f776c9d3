use cucumber::{then, when};

use super::{last_json, run_bfd};
use crate::BountyWorld;

#[then(expr = "there are {int} pending email(s)")]
async fn there_are_pending_emails(world: &mut BountyWorld, count: i64) {
    run_bfd(world, &["--json", "email", "list"]);
    assert_eq!(world.last_exit_code, 0, "email list failed: {}", world.last_stderr);
    let json = last_json(world);
    let emails = json.as_array().expect("email list is not an array");
    assert_eq!(
        emails.len() as i64,
        count,
        "unexpected queue: {emails:?}"
    );
}

#[then(expr = "a pending email mentions {string}")]
async fn a_pending_email_mentions(world: &mut BountyWorld, expected: String) {
    run_bfd(world, &["--json", "email", "list"]);
    assert_eq!(world.last_exit_code, 0, "email list failed: {}", world.last_stderr);
    let json = last_json(world);
    let emails = json.as_array().expect("email list is not an array");
    assert!(
        emails
            .iter()
            .any(|e| e["body"].as_str().is_some_and(|b| b.contains(&expected))),
        "no email mentions {expected:?}: {emails:?}"
    );
}

#[when("I delete the first pending email")]
async fn i_delete_the_first_pending_email(world: &mut BountyWorld) {
    run_bfd(world, &["--json", "email", "list"]);
    assert_eq!(world.last_exit_code, 0, "email list failed: {}", world.last_stderr);
    let json = last_json(world);
    let first = json
        .as_array()
        .and_then(|a| a.first())
        .and_then(|e| e["email_id"].as_i64())
        .expect("no pending emails to delete");
    let id = first.to_string();
    run_bfd(world, &["email", "delete", &id]);
}
