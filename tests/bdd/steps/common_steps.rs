use cucumber::{given, then, when};
use predicates::Predicate;

use super::{run_bfd, split_args, write_config};
use crate::BountyWorld;

/// Set up a fresh home directory with a test config file and run
/// `bfd init` against it.
#[given("an initialized bountyfund home")]
async fn an_initialized_bountyfund_home(world: &mut BountyWorld) {
    world.home = Some(tempfile::TempDir::new().expect("create temp dir"));
    world.config_overrides.clear();
    world.ids.clear();
    write_config(world);

    run_bfd(world, &["init"]);
    assert_eq!(
        world.last_exit_code, 0,
        "bfd init failed: {}",
        world.last_stderr
    );
}

/// Rewrite the config file with an additional option.
#[given(expr = "the config file sets {word} option {string} to {string}")]
async fn the_config_file_sets(
    world: &mut BountyWorld,
    section: String,
    option: String,
    value: String,
) {
    world.config_overrides.push((section, option, value));
    write_config(world);
}

#[when(expr = "I run bfd {string}")]
async fn i_run_bfd(world: &mut BountyWorld, command: String) {
    let args = split_args(&command);
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    run_bfd(world, &refs);
}

#[then("the command succeeds")]
async fn the_command_succeeds(world: &mut BountyWorld) {
    assert_eq!(
        world.last_exit_code, 0,
        "command failed: {}",
        world.last_stderr
    );
}

#[then("the command fails")]
async fn the_command_fails(world: &mut BountyWorld) {
    assert_ne!(world.last_exit_code, 0, "expected the command to fail");
}

#[then(expr = "the output contains {string}")]
async fn the_output_contains(world: &mut BountyWorld, expected: String) {
    assert!(
        predicates::str::contains(expected.clone()).eval(&world.last_stdout),
        "expected {expected:?} in output:\n{}",
        world.last_stdout
    );
}

#[then(expr = "the error contains {string}")]
async fn the_error_contains(world: &mut BountyWorld, expected: String) {
    assert!(
        predicates::str::contains(expected.clone()).eval(&world.last_stderr),
        "expected {expected:?} in stderr:\n{}",
        world.last_stderr
    );
}
