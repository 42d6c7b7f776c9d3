use cucumber::{then, when};

use super::{last_json, run_bfd};
use crate::BountyWorld;

#[when("I show the configuration")]
async fn i_show_the_configuration(world: &mut BountyWorld) {
    run_bfd(world, &["--json", "config", "show"]);
}

#[when(expr = "I show the configuration for project {string}")]
async fn i_show_the_configuration_for_project(world: &mut BountyWorld, project: String) {
    run_bfd(world, &["--json", "config", "show", "--project", &project]);
}

#[when(expr = "I set option {string} to {string} for project {string}")]
async fn i_set_option_for_project(
    world: &mut BountyWorld,
    name: String,
    value: String,
    project: String,
) {
    run_bfd(world, &["config", "set", &project, &name, &value]);
}

#[when(expr = "I unset option {string} for project {string}")]
async fn i_unset_option_for_project(world: &mut BountyWorld, name: String, project: String) {
    run_bfd(world, &["config", "unset", &project, &name]);
}

#[then(expr = "the configuration value {word} is {int}")]
async fn the_configuration_value_is_int(world: &mut BountyWorld, name: String, expected: i64) {
    let json = last_json(world);
    assert_eq!(
        json[&name].as_i64(),
        Some(expected),
        "unexpected value for {name}: {}",
        json[&name]
    );
}

#[then(expr = "the configuration value {word} is {string}")]
async fn the_configuration_value_is_str(world: &mut BountyWorld, name: String, expected: String) {
    let json = last_json(world);
    assert_eq!(
        json[&name].as_str(),
        Some(expected.as_str()),
        "unexpected value for {name}: {}",
        json[&name]
    );
}

#[then(expr = "the configuration flag {word} is {word}")]
async fn the_configuration_flag_is(world: &mut BountyWorld, name: String, state: String) {
    let expected = match state.as_str() {
        "on" => true,
        "off" => false,
        other => panic!("unknown flag state: {other}"),
    };
    let json = last_json(world);
    assert_eq!(
        json[&name].as_bool(),
        Some(expected),
        "unexpected flag {name}: {}",
        json[&name]
    );
}
