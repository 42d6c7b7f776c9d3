use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::db::Database;
use crate::models::PaymentGateway;

/// Default config file location, relative to the home directory.
pub const DEFAULT_CONFIG_FILE: &str = "conf/bountyfund.toml";

/// Value kinds a property can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Str,
    Int,
    Bool,
    Gateways,
}

/// A resolved configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Gateways(Vec<PaymentGateway>),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Gateways(gws) => gws
                .iter()
                .map(|g| g.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Gateways(gws) => serde_json::Value::Array(
                gws.iter()
                    .map(|g| serde_json::Value::String(g.as_str().to_string()))
                    .collect(),
            ),
        }
    }
}

/// Property metadata: what it means, how it parses, and which sources may
/// set it.
pub struct Property {
    pub description: &'static str,
    pub kind: Kind,
    pub default: Value,
    pub in_args: bool,
    pub in_file: bool,
    pub in_db: bool,
}

macro_rules! keys {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Key {
            $($variant,)+
        }

        impl Key {
            pub const ALL: &'static [Key] = &[$(Key::$variant,)+];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Key::$variant => $name,)+
                }
            }
        }
    };
}

keys! {
    Version => "VERSION",
    Host => "HOST",
    Port => "PORT",
    Url => "URL",
    Threads => "THREADS",
    DatabaseUrl => "DATABASE_URL",
    DatabaseInMemory => "DATABASE_IN_MEMORY",
    DatabaseCreate => "DATABASE_CREATE",
    Secret => "SECRET",
    TrackerUrl => "TRACKER_URL",
    TrackerProject => "TRACKER_PROJECT",
    Admin => "ADMIN",
    MaxPledgeAmount => "MAX_PLEDGE_AMOUNT",
    PaymentGateways => "PAYMENT_GATEWAYS",
    ProjectDefault => "PROJECT_DEFAULT",
    ProjectTest => "PROJECT_TEST",
    ProjectRoot => "PROJECT_ROOT",
    LogExceptions => "LOG_EXCEPTIONS",
    LogSql => "LOG_SQL",
    LogHttp => "LOG_HTTP",
    PaypalSandbox => "PAYPAL_SANDBOX",
    PaypalReceiverEmail => "PAYPAL_RECEIVER_EMAIL",
    PaypalPdtAccessToken => "PAYPAL_PDT_ACCESS_TOKEN",
    PaypalUserId => "PAYPAL_USER_ID",
    PaypalPassword => "PAYPAL_PASSWORD",
    PaypalSignature => "PAYPAL_SIGNATURE",
    PaypalApplicationId => "PAYPAL_APPLICATION_ID",
    GithubClientId => "GITHUB_CLIENT_ID",
    GithubClientSecret => "GITHUB_CLIENT_SECRET",
    GithubToken => "GITHUB_TOKEN",
}

fn prop(
    description: &'static str,
    kind: Kind,
    default: Value,
    in_args: bool,
    in_file: bool,
    in_db: bool,
) -> Property {
    Property {
        description,
        kind,
        default,
        in_args,
        in_file,
        in_db,
    }
}

fn s(v: &str) -> Value {
    Value::Str(v.to_string())
}

impl Key {
    /// The full property registry.
    #[rustfmt::skip]
    pub fn property(&self) -> Property {
        use Kind::*;
        match self {
            Key::Version => prop("Software version", Str, s("unknown"), false, false, false),
            Key::Host => prop("Host name / IP address on which to serve the webapp", Str, s("127.0.0.1"), true, true, false),
            Key::Port => prop("Port number", Int, Value::Int(8080), true, true, false),
            Key::Url => prop("Externally accessible location of the webapp, needs to be changed when using a proxy", Str, s("http://localhost:8080"), false, true, false),
            Key::Threads => prop("Number of worker threads", Int, Value::Int(4), true, true, false),
            Key::DatabaseUrl => prop("Database url", Str, s(""), false, true, false),
            Key::DatabaseInMemory => prop("Use empty in-memory database", Bool, Value::Bool(false), false, false, false),
            Key::DatabaseCreate => prop("Create database", Bool, Value::Bool(false), false, false, false),
            Key::Secret => prop("Webapp secret key", Str, s(""), false, true, false),
            Key::TrackerUrl => prop("Externally accessible location of bug tracker", Str, s(""), false, true, true),
            Key::TrackerProject => prop("Name of the project in the tracker", Str, s(""), false, true, true),
            Key::Admin => prop("Admin user identifier", Str, s(""), false, true, true),
            Key::MaxPledgeAmount => prop("Maximum pledge amount", Int, Value::Int(100), false, true, true),
            Key::PaymentGateways => prop("List of enabled payment gateways", Gateways, Value::Gateways(vec![PaymentGateway::Dummy]), false, true, true),
            Key::ProjectDefault => prop("Enable default project", Bool, Value::Bool(true), false, true, false),
            Key::ProjectTest => prop("Enable test projects", Bool, Value::Bool(true), false, true, false),
            Key::ProjectRoot => prop("Enable root projects", Bool, Value::Bool(false), false, true, false),
            Key::LogExceptions => prop("Log command failures through the log facade", Bool, Value::Bool(true), false, true, false),
            Key::LogSql => prop("Log SQL statements", Bool, Value::Bool(false), false, true, false),
            Key::LogHttp => prop("Log outgoing HTTP requests", Bool, Value::Bool(false), false, true, false),
            Key::PaypalSandbox => prop("Use Paypal sandbox or live system", Bool, Value::Bool(true), false, true, true),
            Key::PaypalReceiverEmail => prop("Email of the entity receiving payments", Str, s(""), false, true, true),
            Key::PaypalPdtAccessToken => prop("Paypal Payment Data Transfer (PDT) access token", Str, s(""), false, true, true),
            Key::PaypalUserId => prop("Paypal user ID for Adaptive Payments", Str, s(""), false, true, true),
            Key::PaypalPassword => prop("Paypal password for Adaptive Payments", Str, s(""), false, true, true),
            Key::PaypalSignature => prop("Paypal signature for Adaptive Payments", Str, s(""), false, true, true),
            Key::PaypalApplicationId => prop("Paypal application ID for Adaptive Payments", Str, s(""), false, true, true),
            Key::GithubClientId => prop("Github Client ID", Str, s(""), false, true, true),
            Key::GithubClientSecret => prop("Github Client Secret", Str, s(""), false, true, true),
            Key::GithubToken => prop("Github Token for server to server communication", Str, s(""), false, true, true),
        }
    }

    pub fn from_name(name: &str) -> Result<Key, String> {
        Key::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("unknown configuration property: {name}"))
    }

    /// Where the property lives in the config file: `(table, option)`.
    /// Properties named after a known prefix get their own table with the
    /// prefix stripped; everything else goes under `[general]`.
    pub fn file_location(&self) -> (&'static str, String) {
        let option = self.name().to_lowercase();
        for prefix in ["paypal", "project", "log", "github"] {
            if let Some(rest) = option.strip_prefix(&format!("{prefix}_")) {
                return (prefix, rest.to_string());
            }
        }
        ("general", option)
    }

    /// Parse a raw string into this property's value kind.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        match self.property().kind {
            Kind::Str => Ok(Value::Str(raw.to_string())),
            Kind::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("not an integer: {raw}")),
            Kind::Bool => parse_boolean(raw).map(Value::Bool),
            Kind::Gateways => string_list(raw)
                .iter()
                .map(|g| PaymentGateway::from_str(g))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Gateways),
        }
    }
}

/// Strict boolean parser. Accepts the classic ini spellings and nothing else.
pub fn parse_boolean(raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("not a boolean: {raw}")),
    }
}

/// Comma-separated list with blanks filtered out.
pub fn string_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Home directory used to resolve relative config and database paths.
pub fn home_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("BOUNTYFUND_HOME") {
        return PathBuf::from(home);
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Command-line overrides fed into `Settings::load`. Only the properties
/// flagged `in_args` appear here.
#[derive(Debug, Default, Clone)]
pub struct Args {
    /// `Some("")` disables config-file loading entirely.
    pub config_file: Option<String>,
    pub host: Option<String>,
    pub port: Option<i64>,
    pub threads: Option<i64>,
    pub db_in_memory: bool,
}

/// The merged configuration: defaults, then file values, then CLI
/// arguments. Per-project database overrides are layered on top through
/// `for_project`.
pub struct Settings {
    values: HashMap<Key, Value>,
    secret_generated: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let values = Key::ALL
            .iter()
            .map(|k| (*k, k.property().default))
            .collect();
        Settings {
            values,
            secret_generated: false,
        }
    }
}

impl Settings {
    pub fn load(args: &Args) -> Result<Settings, String> {
        Settings::load_from(args, &home_dir())
    }

    /// Load with an explicit home directory. Split out so tests do not
    /// depend on process environment.
    pub fn load_from(args: &Args, home: &Path) -> Result<Settings, String> {
        let mut settings = Settings::default();

        match args.config_file.as_deref() {
            // Empty argument: skip file loading.
            Some("") => {}
            Some(path) => {
                let path = absolute(home, Path::new(path));
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| format!("failed to read config file {}: {e}", path.display()))?;
                settings.apply_file(&raw)?;
            }
            None => {
                // The default config file is optional.
                let path = home.join(DEFAULT_CONFIG_FILE);
                if let Ok(raw) = std::fs::read_to_string(&path) {
                    settings.apply_file(&raw)?;
                }
            }
        }

        if args.db_in_memory {
            settings.set(Key::DatabaseUrl, Value::Str("sqlite://".to_string()));
        }

        if let Some(ref host) = args.host {
            settings.set(Key::Host, Value::Str(host.clone()));
        }
        if let Some(port) = args.port {
            settings.set(Key::Port, Value::Int(port));
        }
        if let Some(threads) = args.threads {
            settings.set(Key::Threads, Value::Int(threads));
        }

        settings.finalize(home)?;
        Ok(settings)
    }

    /// Merge values from TOML config text for every `in_file` property.
    fn apply_file(&mut self, raw: &str) -> Result<(), String> {
        let doc: toml::Value = raw
            .parse()
            .map_err(|e| format!("invalid config file: {e}"))?;

        for key in Key::ALL {
            if !key.property().in_file {
                continue;
            }
            let (section, option) = key.file_location();
            let Some(entry) = doc.get(section).and_then(|t| t.get(&option)) else {
                continue;
            };
            let value = value_from_toml(*key, entry)?;
            self.set(*key, value);
        }
        Ok(())
    }

    /// Post-merge fixups: version stamping, database url normalization, and
    /// secret generation.
    fn finalize(&mut self, home: &Path) -> Result<(), String> {
        self.set(
            Key::Version,
            Value::Str(env!("CARGO_PKG_VERSION").to_string()),
        );

        let url = self.str_value(Key::DatabaseUrl);
        if url == "sqlite://" {
            self.set(Key::DatabaseInMemory, Value::Bool(true));
            self.set(Key::DatabaseCreate, Value::Bool(true));
            // In-memory SQLite lives and dies with a single connection.
            self.set(Key::Threads, Value::Int(1));
        } else if let Some(path) = url.strip_prefix("sqlite:///") {
            let resolved = absolute(home, Path::new(path));
            self.set(
                Key::DatabaseUrl,
                Value::Str(format!("sqlite:///{}", resolved.display())),
            );
            if !resolved.exists() {
                self.set(Key::DatabaseCreate, Value::Bool(true));
            }
        }

        if self.str_value(Key::Secret).is_empty() {
            let bytes: [u8; 24] = rand::random();
            let secret: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            self.set(Key::Secret, Value::Str(secret));
            self.secret_generated = true;
        }

        Ok(())
    }

    /// Whether SECRET was generated rather than configured. The caller
    /// warns about it once logging is up.
    pub fn secret_generated(&self) -> bool {
        self.secret_generated
    }

    pub fn set(&mut self, key: Key, value: Value) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: Key) -> Value {
        self.values
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.property().default)
    }

    pub fn str_value(&self, key: Key) -> String {
        match self.get(key) {
            Value::Str(v) => v,
            other => other.as_display(),
        }
    }

    pub fn int_value(&self, key: Key) -> i64 {
        match self.get(key) {
            Value::Int(v) => v,
            _ => 0,
        }
    }

    pub fn bool_value(&self, key: Key) -> bool {
        matches!(self.get(key), Value::Bool(true))
    }

    pub fn gateways_value(&self, key: Key) -> Vec<PaymentGateway> {
        match self.get(key) {
            Value::Gateways(v) => v,
            _ => Vec::new(),
        }
    }

    /// Where the database lives, derived from DATABASE_URL.
    pub fn database_location(&self) -> Result<DatabaseLocation, String> {
        let url = self.str_value(Key::DatabaseUrl);
        if url.is_empty() {
            return Err(
                "database_url is not configured; set it in the config file or pass --db-in-memory"
                    .to_string(),
            );
        }
        if url == "sqlite://" {
            return Ok(DatabaseLocation::InMemory);
        }
        if let Some(path) = url.strip_prefix("sqlite:///") {
            return Ok(DatabaseLocation::File(PathBuf::from(path)));
        }
        Err(format!("unsupported database url: {url}"))
    }

    /// Project-scoped view layering database overrides over this
    /// configuration.
    pub fn for_project<'a>(&'a self, db: &'a Database, project_id: i64) -> ProjectSettings<'a> {
        ProjectSettings {
            settings: self,
            db,
            project_id,
        }
    }
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    InMemory,
    File(PathBuf),
}

/// Lazy per-project configuration view. Every read of an `in_db` property
/// checks the project's `config` rows first and falls back to the merged
/// global value.
pub struct ProjectSettings<'a> {
    settings: &'a Settings,
    db: &'a Database,
    project_id: i64,
}

impl ProjectSettings<'_> {
    pub fn get(&self, key: Key) -> Result<Value, String> {
        // TODO: cache override lookups for the lifetime of the view
        if key.property().in_db {
            let stored = self
                .db
                .get_project_config(self.project_id, &key.name().to_lowercase())?;
            if let Some(raw) = stored {
                return key.parse(&raw);
            }
        }
        Ok(self.settings.get(key))
    }

    pub fn max_pledge_amount(&self) -> Result<i64, String> {
        match self.get(Key::MaxPledgeAmount)? {
            Value::Int(v) => Ok(v),
            other => Err(format!("unexpected value: {}", other.as_display())),
        }
    }

    pub fn payment_gateways(&self) -> Result<Vec<PaymentGateway>, String> {
        match self.get(Key::PaymentGateways)? {
            Value::Gateways(v) => Ok(v),
            other => Err(format!("unexpected value: {}", other.as_display())),
        }
    }

    pub fn tracker_url(&self) -> Result<String, String> {
        Ok(self.get(Key::TrackerUrl)?.as_display())
    }
}

/// Validate a per-project override before it is written: the property must
/// exist, be flagged `in_db`, and the value must parse.
pub fn validate_override(name: &str, value: &str) -> Result<(Key, Value), String> {
    let key = Key::from_name(name)?;
    if !key.property().in_db {
        return Err(format!(
            "{} cannot be overridden per project",
            key.name()
        ));
    }
    let parsed = key.parse(value)?;
    Ok((key, parsed))
}

/// Convert a TOML entry into a property value. Strings go through the
/// property parser; native integers, booleans, and string arrays are
/// accepted where the kind matches.
fn value_from_toml(key: Key, entry: &toml::Value) -> Result<Value, String> {
    match (key.property().kind, entry) {
        (_, toml::Value::String(raw)) => key.parse(raw),
        (Kind::Int, toml::Value::Integer(i)) => Ok(Value::Int(*i)),
        (Kind::Bool, toml::Value::Boolean(b)) => Ok(Value::Bool(*b)),
        (Kind::Gateways, toml::Value::Array(items)) => {
            let mut gateways = Vec::with_capacity(items.len());
            for item in items {
                let toml::Value::String(name) = item else {
                    return Err(format!(
                        "invalid gateway list for {} in config file",
                        key.name()
                    ));
                };
                gateways.push(PaymentGateway::from_str(name)?);
            }
            Ok(Value::Gateways(gateways))
        }
        _ => Err(format!(
            "invalid value for {} in config file",
            key.name()
        )),
    }
}

fn absolute(home: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        home.join(path)
    }
}
