use cucumber::{then, when};

use super::{last_json, run_bfd};
use crate::BountyWorld;

#[when(expr = "I create project {string}")]
async fn i_create_project(world: &mut BountyWorld, name: String) {
    run_bfd(world, &["project", "add", &name]);
}

#[when(expr = "I create a {word} project {string}")]
async fn i_create_a_kind_project(world: &mut BountyWorld, kind: String, name: String) {
    run_bfd(world, &["project", "add", &name, "--kind", &kind]);
}

#[then(expr = "the project list contains {string}")]
async fn the_project_list_contains(world: &mut BountyWorld, name: String) {
    run_bfd(world, &["--json", "project", "list"]);
    assert_eq!(world.last_exit_code, 0, "project list failed: {}", world.last_stderr);
    let json = last_json(world);
    let projects = json.as_array().expect("project list is not an array");
    assert!(
        projects.iter().any(|p| p["name"].as_str() == Some(&name)),
        "project {name:?} not in list: {projects:?}"
    );
}

#[when(expr = "I mint a token for project {string}")]
async fn i_mint_a_token_for_project(world: &mut BountyWorld, project: String) {
    run_bfd(world, &["--json", "token", "add", &project]);
    assert_eq!(world.last_exit_code, 0, "token add failed: {}", world.last_stderr);
    let json = last_json(world);
    let token = json["token"]
        .as_str()
        .expect("token add JSON has no 'token' field")
        .to_string();
    world.ids.insert("token".to_string(), token);
}

#[when(expr = "I register issue {string} titled {string} using the minted token")]
async fn i_register_issue_using_the_minted_token(
    world: &mut BountyWorld,
    issue_ref: String,
    title: String,
) {
    let token = world
        .ids
        .get("token")
        .expect("no minted token — mint one first")
        .clone();
    run_bfd(world, &["issue", "add", &token, &issue_ref, &title]);
    world.last_project = token;
    world.last_issue = issue_ref;
}
