use clap::{Parser, Subcommand};
use log::{error, warn};

use bountyfund::commands;
use bountyfund::config::{Args, Key, Settings};

#[derive(Parser)]
#[command(
    name = "bfd",
    version,
    about = "Crowdfunding tracker for bug-tracker issues"
)]
struct Cli {
    /// Path to the config file; pass an empty string to skip file loading
    #[arg(long, env = "BOUNTYFUND_CONFIG")]
    config_file: Option<String>,

    /// Host name / IP address on which to serve the webapp
    #[arg(long)]
    host: Option<String>,

    /// Port number
    #[arg(long)]
    port: Option<i64>,

    /// Number of worker threads
    #[arg(long)]
    threads: Option<i64>,

    /// Use an empty in-memory database
    #[arg(long)]
    db_in_memory: bool,

    /// Output as JSON instead of table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema and seed the default project
    Init,
    /// Inspect configuration and manage per-project overrides
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage project access tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Manage project users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Track issues from the bug tracker
    Issue {
        #[command(subcommand)]
        action: IssueAction,
    },
    /// Pledge and manage sponsorships
    Sponsor {
        #[command(subcommand)]
        action: SponsorAction,
    },
    /// Inspect the pending notification queue
    Email {
        #[command(subcommand)]
        action: EmailAction,
    },
    /// Show the audit log for a project
    Changes {
        /// Project id or access token
        project: String,
    },
    /// Show issue and sponsorship counts
    Stats {
        /// Project id or access token
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the resolved configuration
    Show {
        /// Project id or access token for the project-scoped view
        #[arg(long)]
        project: Option<String>,
    },
    /// Set a per-project override
    Set {
        /// Project id or access token
        project: String,
        /// Property name (e.g. MAX_PLEDGE_AMOUNT)
        name: String,
        /// Raw value, parsed with the property's parser
        value: String,
    },
    /// Remove a per-project override
    Unset {
        /// Project id or access token
        project: String,
        /// Property name
        name: String,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Create a project
    Add {
        /// Project name
        name: String,
        /// Project description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Project kind (normal, test, root)
        #[arg(long, default_value = "normal")]
        kind: String,
    },
    /// List projects
    List,
    /// Show a project with its pledge totals and overrides
    Show {
        /// Project id or access token
        project: String,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Mint an access token for a project
    Add {
        /// Project id or access token
        project: String,
    },
    /// List tokens
    List {
        /// Limit to one project
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create an account
    Add {
        /// Account email (unique)
        email: String,
        /// Display name
        name: String,
        /// Password; omit for passwordless accounts
        #[arg(long)]
        password: Option<String>,
    },
    /// List accounts
    List,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a project user
    Add {
        /// Project id or access token
        project: String,
        /// User name (unique within the project)
        name: String,
        /// Link the user to an account by email
        #[arg(long)]
        account: Option<String>,
    },
    /// List a project's users
    List {
        /// Project id or access token
        project: String,
    },
}

#[derive(Subcommand)]
enum IssueAction {
    /// Register an issue from the bug tracker
    Add {
        /// Project id or access token
        project: String,
        /// Issue identifier in the tracker
        issue_ref: String,
        /// Issue title
        title: String,
        /// Relative tracker link (default: /issues/<ref>)
        #[arg(long)]
        link: Option<String>,
        /// Owner user name
        #[arg(long)]
        owner: Option<String>,
    },
    /// List a project's issues
    List {
        /// Project id or access token
        project: String,
        /// Filter by status (ready, started, completed)
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show an issue with its sponsorships
    Show {
        /// Project id or access token
        project: String,
        /// Issue identifier in the tracker
        issue_ref: String,
    },
    /// Update an issue
    Update {
        /// Project id or access token
        project: String,
        /// Issue identifier in the tracker
        issue_ref: String,
        /// New status (ready, started, completed)
        #[arg(short, long)]
        status: Option<String>,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New relative tracker link
        #[arg(long)]
        link: Option<String>,
        /// New owner user name
        #[arg(long)]
        owner: Option<String>,
    },
}

#[derive(Subcommand)]
enum SponsorAction {
    /// Pledge an amount toward an issue
    Pledge {
        /// Project id or access token
        project: String,
        /// Issue identifier in the tracker
        issue_ref: String,
        /// Sponsoring user name (created on first pledge)
        user: String,
        /// Amount to pledge
        amount: i64,
    },
    /// Mark a pledged sponsorship as paid out-of-band
    Confirm {
        /// Sponsorship id
        id: i64,
    },
    /// Pay a pledged sponsorship through a gateway
    Pay {
        /// Sponsorship id
        id: i64,
        /// Payment gateway (dummy, paypal_standard, paypal_adaptive)
        #[arg(long, default_value = "dummy")]
        gateway: String,
    },
    /// List an issue's sponsorships
    List {
        /// Project id or access token
        project: String,
        /// Issue identifier in the tracker
        issue_ref: String,
    },
}

#[derive(Subcommand)]
enum EmailAction {
    /// List pending notifications
    List,
    /// Remove a delivered notification
    Delete {
        /// Email id
        id: i64,
    },
}

fn init_logging(settings: &Settings) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if settings.bool_value(Key::LogSql) {
        builder.filter_module("bountyfund::db", log::LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn main() {
    let cli = Cli::parse();

    let args = Args {
        config_file: cli.config_file.clone(),
        host: cli.host.clone(),
        port: cli.port,
        threads: cli.threads,
        db_in_memory: cli.db_in_memory,
    };

    let settings = match Settings::load(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&settings);
    if settings.secret_generated() {
        warn!("secret not defined, generating a random one; sessions will expire on restart");
    }

    let json = cli.json;
    let result = match cli.command {
        Commands::Init => commands::init::run(&settings),
        Commands::Config { action } => match action {
            ConfigAction::Show { project } => {
                commands::config::show(&settings, project.as_deref(), json)
            }
            ConfigAction::Set {
                project,
                name,
                value,
            } => commands::config::set(&settings, &project, &name, &value, json),
            ConfigAction::Unset { project, name } => {
                commands::config::unset(&settings, &project, &name, json)
            }
        },
        Commands::Project { action } => match action {
            ProjectAction::Add {
                name,
                description,
                kind,
            } => commands::project::add(&settings, &name, &description, &kind, json),
            ProjectAction::List => commands::project::list(&settings, json),
            ProjectAction::Show { project } => {
                commands::project::show(&settings, &project, json)
            }
        },
        Commands::Token { action } => match action {
            TokenAction::Add { project } => commands::token::add(&settings, &project, json),
            TokenAction::List { project } => {
                commands::token::list(&settings, project.as_deref(), json)
            }
        },
        Commands::Account { action } => match action {
            AccountAction::Add {
                email,
                name,
                password,
            } => commands::account::add(&settings, &email, &name, password.as_deref(), json),
            AccountAction::List => commands::account::list(&settings, json),
        },
        Commands::User { action } => match action {
            UserAction::Add {
                project,
                name,
                account,
            } => commands::user::add(&settings, &project, &name, account.as_deref(), json),
            UserAction::List { project } => commands::user::list(&settings, &project, json),
        },
        Commands::Issue { action } => match action {
            IssueAction::Add {
                project,
                issue_ref,
                title,
                link,
                owner,
            } => commands::issue::add(
                &settings,
                &project,
                &issue_ref,
                &title,
                link.as_deref(),
                owner.as_deref(),
                json,
            ),
            IssueAction::List { project, status } => {
                commands::issue::list(&settings, &project, status.as_deref(), json)
            }
            IssueAction::Show { project, issue_ref } => {
                commands::issue::show(&settings, &project, &issue_ref, json)
            }
            IssueAction::Update {
                project,
                issue_ref,
                status,
                title,
                link,
                owner,
            } => commands::issue::update(
                &settings,
                &project,
                &issue_ref,
                status.as_deref(),
                title.as_deref(),
                link.as_deref(),
                owner.as_deref(),
                json,
            ),
        },
        Commands::Sponsor { action } => match action {
            SponsorAction::Pledge {
                project,
                issue_ref,
                user,
                amount,
            } => commands::sponsor::pledge(&settings, &project, &issue_ref, &user, amount, json),
            SponsorAction::Confirm { id } => commands::sponsor::confirm(&settings, id, json),
            SponsorAction::Pay { id, gateway } => {
                commands::sponsor::pay(&settings, id, &gateway, json)
            }
            SponsorAction::List { project, issue_ref } => {
                commands::sponsor::list(&settings, &project, &issue_ref, json)
            }
        },
        Commands::Email { action } => match action {
            EmailAction::List => commands::email::list(&settings, json),
            EmailAction::Delete { id } => commands::email::delete(&settings, id, json),
        },
        Commands::Changes { project } => commands::changes::list(&settings, &project, json),
        Commands::Stats { project } => {
            commands::stats::run(&settings, project.as_deref(), json)
        }
    };

    if let Err(e) = result {
        if settings.bool_value(Key::LogExceptions) {
            error!("{e}");
        }
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
