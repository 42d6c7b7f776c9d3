mod steps;

use std::collections::HashMap;

use cucumber::World;

/// Shared state carried through each scenario.
#[derive(Debug, Default, World)]
pub struct BountyWorld {
    /// Temporary directory acting as the home directory; owns the config
    /// file and the database.
    pub home: Option<tempfile::TempDir>,
    /// Config-file overrides as (section, option, value) triples, applied
    /// on top of the base test config.
    pub config_overrides: Vec<(String, String, String)>,
    /// The raw stdout of the most recent `bfd` invocation.
    pub last_stdout: String,
    /// The raw stderr of the most recent `bfd` invocation.
    pub last_stderr: String,
    /// Exit code of the most recent `bfd` invocation.
    pub last_exit_code: i32,
    /// Ids captured from earlier steps (sponsorship, token).
    pub ids: HashMap<String, String>,
    /// Project reference used by the most recent pledge or issue step.
    pub last_project: String,
    /// Issue ref used by the most recent pledge or issue step.
    pub last_issue: String,
}

#[tokio::main]
async fn main() {
    BountyWorld::run("tests/features").await;
}
