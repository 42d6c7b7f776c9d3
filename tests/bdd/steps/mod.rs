mod common_steps;
mod config_steps;
mod email_steps;
mod issue_steps;
mod project_steps;
mod sponsor_steps;

use crate::BountyWorld;

/// Run `bfd` with the given args against the world's home directory.
/// Stores stdout, stderr, and exit code on the world.
pub(crate) fn run_bfd(world: &mut BountyWorld, args: &[&str]) {
    let home = world
        .home
        .as_ref()
        .expect("home not set — did you forget 'Given an initialized bountyfund home'?")
        .path()
        .to_path_buf();

    let output = assert_cmd::Command::cargo_bin("bfd")
        .expect("bfd binary not found")
        .env("BOUNTYFUND_HOME", &home)
        .env_remove("BOUNTYFUND_CONFIG")
        .args(args)
        .output()
        .expect("failed to run bfd");

    world.last_stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    world.last_stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    world.last_exit_code = output.status.code().unwrap_or(-1);
}

/// Write the test config file into `<home>/conf/bountyfund.toml`: a file
/// database under the home dir, a fixed secret, plus any scenario
/// overrides. Values are written as strings so they go through the
/// property parsers.
pub(crate) fn write_config(world: &BountyWorld) {
    let home = world.home.as_ref().expect("home not set").path();
    let conf_dir = home.join("conf");
    std::fs::create_dir_all(&conf_dir).expect("create conf dir");

    let mut out = String::from(
        "[general]\ndatabase_url = \"sqlite:///data/bounty.db\"\nsecret = \"test-secret\"\n",
    );
    for (section, option, value) in &world.config_overrides {
        if section == "general" {
            out.push_str(&format!("{option} = \"{value}\"\n"));
        }
    }
    for section in ["project", "log", "paypal", "github"] {
        let entries: Vec<_> = world
            .config_overrides
            .iter()
            .filter(|(s, _, _)| s == section)
            .collect();
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!("\n[{section}]\n"));
        for (_, option, value) in entries {
            out.push_str(&format!("{option} = \"{value}\"\n"));
        }
    }

    std::fs::write(conf_dir.join("bountyfund.toml"), out).expect("write config file");
}

/// Split a command line, honoring single-quoted arguments.
pub(crate) fn split_args(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    for c in input.chars() {
        match c {
            '\'' => in_quote = !in_quote,
            ' ' if !in_quote => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Parse the most recent stdout as JSON.
pub(crate) fn last_json(world: &BountyWorld) -> serde_json::Value {
    serde_json::from_str(&world.last_stdout).unwrap_or_else(|e| {
        panic!(
            "last output is not valid JSON ({e}):\n{}\nstderr:\n{}",
            world.last_stdout, world.last_stderr
        )
    })
}
