use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{Connection, params};
use std::path::Path;

use crate::config::{DatabaseLocation, Key, Settings};
use crate::models::{
    Account, Change, ConfigOverride, Email, Issue, IssueStatus, Payment, PaymentGateway,
    PaymentStatus, Project, ProjectKind, Sponsorship, SponsorshipStatus, Token, User,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at the given path.
    pub fn open(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| format!("failed to open database: {e}"))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| format!("failed to set pragmas: {e}"))?;

        Ok(Database { conn })
    }

    /// Open a fresh in-memory database. Lives and dies with this connection.
    pub fn open_in_memory() -> Result<Self, String> {
        let conn =
            Connection::open_in_memory().map_err(|e| format!("failed to open database: {e}"))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| format!("failed to set pragmas: {e}"))?;

        Ok(Database { conn })
    }

    /// Open the database described by the merged configuration, creating
    /// and migrating it when DATABASE_CREATE is on.
    pub fn connect(settings: &Settings) -> Result<Self, String> {
        let create = settings.bool_value(Key::DatabaseCreate);
        let db = match settings.database_location()? {
            DatabaseLocation::InMemory => Database::open_in_memory()?,
            DatabaseLocation::File(path) => {
                if create {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| format!("failed to create directory: {e}"))?;
                    }
                }
                Database::open(&path)?
            }
        };
        if create {
            db.migrate()?;
        }
        Ok(db)
    }

    /// Create the schema if it doesn't exist, then run any pending
    /// version-gated migrations.
    pub fn migrate(&self) -> Result<(), String> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                project_id  INTEGER PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT NOT NULL,
                kind        TEXT NOT NULL DEFAULT 'normal'
            );

            CREATE TABLE IF NOT EXISTS accounts (
                account_id    INTEGER PRIMARY KEY,
                email         TEXT NOT NULL,
                name          TEXT NOT NULL,
                password_hash TEXT
            );

            CREATE TABLE IF NOT EXISTS users (
                user_id      INTEGER PRIMARY KEY,
                project_id   INTEGER NOT NULL,
                name         TEXT NOT NULL,
                account_id   INTEGER REFERENCES accounts(account_id),
                paypal_email TEXT
            );

            CREATE TABLE IF NOT EXISTS issues (
                issue_id   INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                issue_ref  TEXT NOT NULL,
                status     TEXT NOT NULL DEFAULT 'ready',
                title      TEXT NOT NULL,
                link       TEXT NOT NULL,
                owner_id   INTEGER REFERENCES users(user_id)
            );

            CREATE TABLE IF NOT EXISTS sponsorships (
                sponsorship_id INTEGER PRIMARY KEY,
                project_id     INTEGER NOT NULL,
                issue_id       INTEGER NOT NULL REFERENCES issues(issue_id),
                amount         INTEGER NOT NULL,
                status         TEXT NOT NULL DEFAULT 'pledged',
                account_id     INTEGER REFERENCES accounts(account_id),
                user_id        INTEGER REFERENCES users(user_id)
            );

            CREATE TABLE IF NOT EXISTS payments (
                payment_id     INTEGER PRIMARY KEY,
                project_id     INTEGER NOT NULL,
                sponsorship_id INTEGER NOT NULL REFERENCES sponsorships(sponsorship_id),
                gateway_id     TEXT,
                url            TEXT,
                status         TEXT NOT NULL DEFAULT 'initiated',
                gateway        TEXT NOT NULL,
                timestamp      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS emails (
                email_id   INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                user_id    INTEGER NOT NULL REFERENCES users(user_id),
                issue_id   INTEGER NOT NULL REFERENCES issues(issue_id),
                body       TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS config (
                config_id  INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                name       TEXT NOT NULL,
                value      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS changes (
                change_id  INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                timestamp  TEXT NOT NULL,
                method     TEXT NOT NULL,
                path       TEXT NOT NULL,
                arguments  TEXT NOT NULL,
                status     INTEGER,
                response   TEXT
            );

            CREATE TABLE IF NOT EXISTS tokens (
                token_id   INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL REFERENCES projects(project_id),
                token      TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_account_email ON accounts(email);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_user_project_id_account_id ON users(project_id, account_id);
            CREATE INDEX IF NOT EXISTS idx_user_account_id ON users(account_id);
            CREATE INDEX IF NOT EXISTS idx_issue_project ON issues(project_id);
            CREATE INDEX IF NOT EXISTS idx_sponsorship_issue ON sponsorships(issue_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_config_pid_name ON config(project_id, name);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_token_token ON tokens(token);
            ",
            )
            .map_err(|e| format!("migration failed: {e}"))?;

        // Fresh databases get version 0.
        self.conn
            .execute(
                "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', '0')",
                [],
            )
            .map_err(|e| format!("failed to seed schema_version: {e}"))?;

        run_migrations(&self.conn)
    }

    // -- Meta --

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), String> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| format!("failed to set meta: {e}"))?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM meta WHERE key = ?1")
            .map_err(|e| format!("query error: {e}"))?;
        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .map_err(|e| format!("query error: {e}"))?;
        match rows.next() {
            Some(Ok(v)) => Ok(Some(v)),
            Some(Err(e)) => Err(format!("query error: {e}")),
            None => Ok(None),
        }
    }

    // -- Projects --

    pub fn insert_project(
        &self,
        name: &str,
        description: &str,
        kind: ProjectKind,
    ) -> Result<Project, String> {
        if self.get_project_by_name(name)?.is_some() {
            return Err(format!("project already exists: {name}"));
        }
        debug!("INSERT INTO projects name={name} kind={kind}");
        self.conn
            .execute(
                "INSERT INTO projects (name, description, kind) VALUES (?1, ?2, ?3)",
                params![name, description, kind.as_str()],
            )
            .map_err(|e| format!("failed to insert project: {e}"))?;
        Ok(Project {
            project_id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
            kind,
        })
    }

    pub fn get_project(&self, project_id: i64) -> Result<Option<Project>, String> {
        self.query_optional(
            "SELECT project_id, name, description, kind FROM projects WHERE project_id = ?1",
            params![project_id],
            row_to_project,
        )
    }

    pub fn get_project_by_name(&self, name: &str) -> Result<Option<Project>, String> {
        self.query_optional(
            "SELECT project_id, name, description, kind FROM projects WHERE name = ?1",
            params![name],
            row_to_project,
        )
    }

    /// Resolve an access token to its project.
    pub fn get_project_by_token(&self, token: &str) -> Result<Option<Project>, String> {
        self.query_optional(
            "SELECT p.project_id, p.name, p.description, p.kind
             FROM projects p JOIN tokens t ON t.project_id = p.project_id
             WHERE t.token = ?1",
            params![token],
            row_to_project,
        )
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, String> {
        self.query_all(
            "SELECT project_id, name, description, kind FROM projects ORDER BY project_id ASC",
            params![],
            row_to_project,
        )
    }

    // -- Tokens --

    /// Mint a fresh access token for a project.
    pub fn create_token(&self, project_id: i64) -> Result<Token, String> {
        self.get_project(project_id)?
            .ok_or_else(|| format!("project not found: {project_id}"))?;

        let token = uuid::Uuid::new_v4().simple().to_string();
        debug!("INSERT INTO tokens project_id={project_id}");
        self.conn
            .execute(
                "INSERT INTO tokens (project_id, token) VALUES (?1, ?2)",
                params![project_id, token],
            )
            .map_err(|e| format!("failed to insert token: {e}"))?;
        Ok(Token {
            token_id: self.conn.last_insert_rowid(),
            project_id,
            token,
        })
    }

    pub fn list_tokens(&self, project_id: Option<i64>) -> Result<Vec<Token>, String> {
        match project_id {
            Some(id) => self.query_all(
                "SELECT token_id, project_id, token FROM tokens WHERE project_id = ?1 ORDER BY token_id ASC",
                params![id],
                row_to_token,
            ),
            None => self.query_all(
                "SELECT token_id, project_id, token FROM tokens ORDER BY token_id ASC",
                params![],
                row_to_token,
            ),
        }
    }

    // -- Accounts --

    pub fn insert_account(
        &self,
        email: &str,
        name: &str,
        password_hash: Option<String>,
    ) -> Result<Account, String> {
        if self.get_account_by_email(email)?.is_some() {
            return Err(format!("account already exists: {email}"));
        }
        debug!("INSERT INTO accounts email={email}");
        self.conn
            .execute(
                "INSERT INTO accounts (email, name, password_hash) VALUES (?1, ?2, ?3)",
                params![email, name, password_hash],
            )
            .map_err(|e| format!("failed to insert account: {e}"))?;
        Ok(Account {
            account_id: self.conn.last_insert_rowid(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
        })
    }

    pub fn get_account(&self, account_id: i64) -> Result<Option<Account>, String> {
        self.query_optional(
            "SELECT account_id, email, name, password_hash FROM accounts WHERE account_id = ?1",
            params![account_id],
            row_to_account,
        )
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, String> {
        self.query_optional(
            "SELECT account_id, email, name, password_hash FROM accounts WHERE email = ?1",
            params![email],
            row_to_account,
        )
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>, String> {
        self.query_all(
            "SELECT account_id, email, name, password_hash FROM accounts ORDER BY account_id ASC",
            params![],
            row_to_account,
        )
    }

    // -- Users --

    pub fn insert_user(
        &self,
        project_id: i64,
        name: &str,
        account_id: Option<i64>,
    ) -> Result<User, String> {
        debug!("INSERT INTO users project_id={project_id} name={name}");
        self.conn
            .execute(
                "INSERT INTO users (project_id, name, account_id) VALUES (?1, ?2, ?3)",
                params![project_id, name, account_id],
            )
            .map_err(|e| format!("failed to insert user: {e}"))?;
        Ok(User {
            user_id: self.conn.last_insert_rowid(),
            project_id,
            name: name.to_string(),
            account_id,
            paypal_email: None,
        })
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>, String> {
        self.query_optional(
            "SELECT user_id, project_id, name, account_id, paypal_email FROM users WHERE user_id = ?1",
            params![user_id],
            row_to_user,
        )
    }

    pub fn get_user_by_name(&self, project_id: i64, name: &str) -> Result<Option<User>, String> {
        self.query_optional(
            "SELECT user_id, project_id, name, account_id, paypal_email
             FROM users WHERE project_id = ?1 AND name = ?2",
            params![project_id, name],
            row_to_user,
        )
    }

    /// The project-scoped identity of an account, if it has one.
    pub fn get_user_for_account(
        &self,
        account_id: i64,
        project_id: i64,
    ) -> Result<Option<User>, String> {
        self.query_optional(
            "SELECT user_id, project_id, name, account_id, paypal_email
             FROM users WHERE account_id = ?1 AND project_id = ?2",
            params![account_id, project_id],
            row_to_user,
        )
    }

    pub fn list_users(&self, project_id: i64) -> Result<Vec<User>, String> {
        self.query_all(
            "SELECT user_id, project_id, name, account_id, paypal_email
             FROM users WHERE project_id = ?1 ORDER BY user_id ASC",
            params![project_id],
            row_to_user,
        )
    }

    // -- Issues --

    pub fn insert_issue(
        &self,
        project_id: i64,
        issue_ref: &str,
        title: &str,
        link: &str,
        owner_id: Option<i64>,
    ) -> Result<Issue, String> {
        if self.get_issue_by_ref(project_id, issue_ref)?.is_some() {
            return Err(format!("issue already registered: {issue_ref}"));
        }
        debug!("INSERT INTO issues project_id={project_id} issue_ref={issue_ref}");
        self.conn
            .execute(
                "INSERT INTO issues (project_id, issue_ref, status, title, link, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    project_id,
                    issue_ref,
                    IssueStatus::Ready.as_str(),
                    title,
                    link,
                    owner_id
                ],
            )
            .map_err(|e| format!("failed to insert issue: {e}"))?;
        Ok(Issue {
            issue_id: self.conn.last_insert_rowid(),
            project_id,
            issue_ref: issue_ref.to_string(),
            status: IssueStatus::Ready,
            title: title.to_string(),
            link: link.to_string(),
            owner_id,
        })
    }

    pub fn get_issue(&self, issue_id: i64) -> Result<Option<Issue>, String> {
        self.query_optional(
            "SELECT issue_id, project_id, issue_ref, status, title, link, owner_id
             FROM issues WHERE issue_id = ?1",
            params![issue_id],
            row_to_issue,
        )
    }

    pub fn get_issue_by_ref(
        &self,
        project_id: i64,
        issue_ref: &str,
    ) -> Result<Option<Issue>, String> {
        self.query_optional(
            "SELECT issue_id, project_id, issue_ref, status, title, link, owner_id
             FROM issues WHERE project_id = ?1 AND issue_ref = ?2",
            params![project_id, issue_ref],
            row_to_issue,
        )
    }

    pub fn list_issues(
        &self,
        project_id: i64,
        status_filter: Option<&str>,
    ) -> Result<Vec<Issue>, String> {
        let mut sql = String::from(
            "SELECT issue_id, project_id, issue_ref, status, title, link, owner_id
             FROM issues WHERE project_id = ?1",
        );
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(project_id)];

        if let Some(status) = status_filter {
            IssueStatus::from_str(status)?;
            sql.push_str(" AND status = ?2");
            param_values.push(Box::new(status.to_string()));
        }

        sql.push_str(" ORDER BY issue_id ASC");

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| format!("query error: {e}"))?;
        let rows = stmt
            .query_map(params_ref.as_slice(), |row| Ok(row_to_issue(row)))
            .map_err(|e| format!("query error: {e}"))?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(row.map_err(|e| format!("row error: {e}"))?);
        }
        Ok(issues)
    }

    pub fn update_issue(
        &self,
        issue_id: i64,
        status: Option<&str>,
        title: Option<&str>,
        link: Option<&str>,
        owner_id: Option<i64>,
    ) -> Result<(), String> {
        let mut sets = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut idx = 1;

        if let Some(s) = status {
            IssueStatus::from_str(s)?;
            sets.push(format!("status = ?{idx}"));
            param_values.push(Box::new(s.to_string()));
            idx += 1;
        }
        if let Some(t) = title {
            sets.push(format!("title = ?{idx}"));
            param_values.push(Box::new(t.to_string()));
            idx += 1;
        }
        if let Some(l) = link {
            sets.push(format!("link = ?{idx}"));
            param_values.push(Box::new(l.to_string()));
            idx += 1;
        }
        if let Some(o) = owner_id {
            sets.push(format!("owner_id = ?{idx}"));
            param_values.push(Box::new(o));
            idx += 1;
        }

        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!("UPDATE issues SET {} WHERE issue_id = ?{idx}", sets.join(", "));
        param_values.push(Box::new(issue_id));

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        debug!("{sql}");
        let rows_changed = self
            .conn
            .execute(&sql, params_ref.as_slice())
            .map_err(|e| format!("update failed: {e}"))?;

        if rows_changed == 0 {
            return Err(format!("issue not found: {issue_id}"));
        }
        Ok(())
    }

    // -- Sponsorships --

    /// Record a pledge. At least one of `user_id`/`account_id` identifies
    /// the sponsor; the same user cannot pledge twice for one issue.
    pub fn insert_sponsorship(
        &self,
        project_id: i64,
        issue_id: i64,
        user_id: Option<i64>,
        account_id: Option<i64>,
        amount: i64,
    ) -> Result<Sponsorship, String> {
        if user_id.is_none() && account_id.is_none() {
            return Err("account_id or user_id must be provided".to_string());
        }

        if let Some(uid) = user_id {
            let existing: i64 = self
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM sponsorships WHERE issue_id = ?1 AND user_id = ?2",
                    params![issue_id, uid],
                    |row| row.get(0),
                )
                .map_err(|e| format!("query error: {e}"))?;
            if existing > 0 {
                return Err("sponsorship already exists for this user".to_string());
            }
        }

        debug!("INSERT INTO sponsorships issue_id={issue_id} amount={amount}");
        self.conn
            .execute(
                "INSERT INTO sponsorships (project_id, issue_id, amount, status, account_id, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    project_id,
                    issue_id,
                    amount,
                    SponsorshipStatus::Pledged.as_str(),
                    account_id,
                    user_id
                ],
            )
            .map_err(|e| format!("failed to insert sponsorship: {e}"))?;
        Ok(Sponsorship {
            sponsorship_id: self.conn.last_insert_rowid(),
            project_id,
            issue_id,
            amount,
            status: SponsorshipStatus::Pledged,
            account_id,
            user_id,
        })
    }

    pub fn get_sponsorship(&self, sponsorship_id: i64) -> Result<Option<Sponsorship>, String> {
        self.query_optional(
            "SELECT sponsorship_id, project_id, issue_id, amount, status, account_id, user_id
             FROM sponsorships WHERE sponsorship_id = ?1",
            params![sponsorship_id],
            row_to_sponsorship,
        )
    }

    pub fn list_sponsorships(&self, issue_id: i64) -> Result<Vec<Sponsorship>, String> {
        self.query_all(
            "SELECT sponsorship_id, project_id, issue_id, amount, status, account_id, user_id
             FROM sponsorships WHERE issue_id = ?1 ORDER BY sponsorship_id ASC",
            params![issue_id],
            row_to_sponsorship,
        )
    }

    pub fn update_sponsorship_status(
        &self,
        sponsorship_id: i64,
        status: SponsorshipStatus,
    ) -> Result<(), String> {
        debug!("UPDATE sponsorships SET status={status} WHERE sponsorship_id={sponsorship_id}");
        let rows_changed = self
            .conn
            .execute(
                "UPDATE sponsorships SET status = ?1 WHERE sponsorship_id = ?2",
                params![status.as_str(), sponsorship_id],
            )
            .map_err(|e| format!("update failed: {e}"))?;
        if rows_changed == 0 {
            return Err(format!("sponsorship not found: {sponsorship_id}"));
        }
        Ok(())
    }

    pub fn update_sponsorship_amount(
        &self,
        sponsorship_id: i64,
        amount: i64,
    ) -> Result<(), String> {
        debug!("UPDATE sponsorships SET amount={amount} WHERE sponsorship_id={sponsorship_id}");
        let rows_changed = self
            .conn
            .execute(
                "UPDATE sponsorships SET amount = ?1 WHERE sponsorship_id = ?2",
                params![amount, sponsorship_id],
            )
            .map_err(|e| format!("update failed: {e}"))?;
        if rows_changed == 0 {
            return Err(format!("sponsorship not found: {sponsorship_id}"));
        }
        Ok(())
    }

    // -- Payments --

    pub fn insert_payment(
        &self,
        project_id: i64,
        sponsorship_id: i64,
        gateway: PaymentGateway,
    ) -> Result<Payment, String> {
        self.get_sponsorship(sponsorship_id)?
            .ok_or_else(|| format!("sponsorship not found: {sponsorship_id}"))?;

        let now = Utc::now();
        debug!("INSERT INTO payments sponsorship_id={sponsorship_id} gateway={gateway}");
        self.conn
            .execute(
                "INSERT INTO payments (project_id, sponsorship_id, status, gateway, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    project_id,
                    sponsorship_id,
                    PaymentStatus::Initiated.as_str(),
                    gateway.as_str(),
                    now.to_rfc3339()
                ],
            )
            .map_err(|e| format!("failed to insert payment: {e}"))?;
        Ok(Payment {
            payment_id: self.conn.last_insert_rowid(),
            project_id,
            sponsorship_id,
            gateway_id: None,
            url: None,
            status: PaymentStatus::Initiated,
            gateway,
            timestamp: now,
        })
    }

    pub fn get_payment(&self, payment_id: i64) -> Result<Option<Payment>, String> {
        self.query_optional(
            "SELECT payment_id, project_id, sponsorship_id, gateway_id, url, status, gateway, timestamp
             FROM payments WHERE payment_id = ?1",
            params![payment_id],
            row_to_payment,
        )
    }

    /// The most recent payment attempt for a sponsorship.
    pub fn get_latest_payment(&self, sponsorship_id: i64) -> Result<Option<Payment>, String> {
        self.query_optional(
            "SELECT payment_id, project_id, sponsorship_id, gateway_id, url, status, gateway, timestamp
             FROM payments WHERE sponsorship_id = ?1 ORDER BY payment_id DESC LIMIT 1",
            params![sponsorship_id],
            row_to_payment,
        )
    }

    pub fn update_payment(
        &self,
        payment_id: i64,
        gateway_id: Option<&str>,
        url: Option<&str>,
        status: Option<PaymentStatus>,
    ) -> Result<(), String> {
        let mut sets = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut idx = 1;

        if let Some(g) = gateway_id {
            sets.push(format!("gateway_id = ?{idx}"));
            param_values.push(Box::new(g.to_string()));
            idx += 1;
        }
        if let Some(u) = url {
            sets.push(format!("url = ?{idx}"));
            param_values.push(Box::new(u.to_string()));
            idx += 1;
        }
        if let Some(s) = status {
            sets.push(format!("status = ?{idx}"));
            param_values.push(Box::new(s.as_str().to_string()));
            idx += 1;
        }

        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE payments SET {} WHERE payment_id = ?{idx}",
            sets.join(", ")
        );
        param_values.push(Box::new(payment_id));

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        debug!("{sql}");
        let rows_changed = self
            .conn
            .execute(&sql, params_ref.as_slice())
            .map_err(|e| format!("update failed: {e}"))?;
        if rows_changed == 0 {
            return Err(format!("payment not found: {payment_id}"));
        }
        Ok(())
    }

    // -- Emails --

    pub fn insert_email(
        &self,
        project_id: i64,
        user_id: i64,
        issue_id: i64,
        body: &str,
    ) -> Result<Email, String> {
        debug!("INSERT INTO emails user_id={user_id} issue_id={issue_id}");
        self.conn
            .execute(
                "INSERT INTO emails (project_id, user_id, issue_id, body) VALUES (?1, ?2, ?3, ?4)",
                params![project_id, user_id, issue_id, body],
            )
            .map_err(|e| format!("failed to insert email: {e}"))?;
        Ok(Email {
            email_id: self.conn.last_insert_rowid(),
            project_id,
            user_id,
            issue_id,
            body: body.to_string(),
        })
    }

    /// All pending notifications, oldest first.
    pub fn list_emails(&self) -> Result<Vec<Email>, String> {
        self.query_all(
            "SELECT email_id, project_id, user_id, issue_id, body FROM emails ORDER BY email_id ASC",
            params![],
            row_to_email,
        )
    }

    /// Drop a notification once an external sender has delivered it.
    pub fn delete_email(&self, email_id: i64) -> Result<(), String> {
        debug!("DELETE FROM emails WHERE email_id={email_id}");
        let rows_changed = self
            .conn
            .execute("DELETE FROM emails WHERE email_id = ?1", params![email_id])
            .map_err(|e| format!("failed to delete email: {e}"))?;
        if rows_changed == 0 {
            return Err(format!("email not found: {email_id}"));
        }
        Ok(())
    }

    // -- Per-project config overrides --

    pub fn set_project_config(
        &self,
        project_id: i64,
        name: &str,
        value: &str,
    ) -> Result<(), String> {
        debug!("INSERT OR REPLACE INTO config project_id={project_id} name={name}");
        self.conn
            .execute(
                "INSERT OR REPLACE INTO config (project_id, name, value) VALUES (?1, ?2, ?3)",
                params![project_id, name, value],
            )
            .map_err(|e| format!("failed to set config: {e}"))?;
        Ok(())
    }

    pub fn get_project_config(
        &self,
        project_id: i64,
        name: &str,
    ) -> Result<Option<String>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM config WHERE project_id = ?1 AND name = ?2")
            .map_err(|e| format!("query error: {e}"))?;
        let mut rows = stmt
            .query_map(params![project_id, name], |row| row.get::<_, String>(0))
            .map_err(|e| format!("query error: {e}"))?;
        match rows.next() {
            Some(Ok(v)) => Ok(Some(v)),
            Some(Err(e)) => Err(format!("query error: {e}")),
            None => Ok(None),
        }
    }

    pub fn list_project_config(&self, project_id: i64) -> Result<Vec<ConfigOverride>, String> {
        self.query_all(
            "SELECT config_id, project_id, name, value FROM config WHERE project_id = ?1 ORDER BY name ASC",
            params![project_id],
            row_to_config,
        )
    }

    pub fn delete_project_config(&self, project_id: i64, name: &str) -> Result<(), String> {
        debug!("DELETE FROM config project_id={project_id} name={name}");
        let rows_changed = self
            .conn
            .execute(
                "DELETE FROM config WHERE project_id = ?1 AND name = ?2",
                params![project_id, name],
            )
            .map_err(|e| format!("failed to delete config: {e}"))?;
        if rows_changed == 0 {
            return Err(format!("no override for {name}"));
        }
        Ok(())
    }

    // -- Changes --

    /// Open an audit record for a mutating operation; returns its id so the
    /// outcome can be recorded with `finish_change`.
    pub fn insert_change(
        &self,
        project_id: i64,
        method: &str,
        path: &str,
        arguments: &str,
    ) -> Result<i64, String> {
        self.conn
            .execute(
                "INSERT INTO changes (project_id, timestamp, method, path, arguments)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    project_id,
                    Utc::now().to_rfc3339(),
                    method,
                    path,
                    arguments
                ],
            )
            .map_err(|e| format!("failed to insert change: {e}"))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn finish_change(
        &self,
        change_id: i64,
        status: i64,
        response: &str,
    ) -> Result<(), String> {
        self.conn
            .execute(
                "UPDATE changes SET status = ?1, response = ?2 WHERE change_id = ?3",
                params![status, response, change_id],
            )
            .map_err(|e| format!("failed to finish change: {e}"))?;
        Ok(())
    }

    pub fn list_changes(&self, project_id: i64) -> Result<Vec<Change>, String> {
        self.query_all(
            "SELECT change_id, project_id, timestamp, method, path, arguments, status, response
             FROM changes WHERE project_id = ?1 ORDER BY change_id ASC",
            params![project_id],
            row_to_change,
        )
    }

    // -- Stats --

    /// Count issues grouped by status, optionally for a single project.
    pub fn issue_count_by_status(
        &self,
        project_id: Option<i64>,
    ) -> Result<Vec<(String, i64)>, String> {
        match project_id {
            Some(id) => self.query_all(
                "SELECT status, COUNT(*) FROM issues WHERE project_id = ?1 GROUP BY status ORDER BY status",
                params![id],
                row_to_count,
            ),
            None => self.query_all(
                "SELECT status, COUNT(*) FROM issues GROUP BY status ORDER BY status",
                params![],
                row_to_count,
            ),
        }
    }

    /// Count sponsorships grouped by status, optionally for a single project.
    pub fn sponsorship_count_by_status(
        &self,
        project_id: Option<i64>,
    ) -> Result<Vec<(String, i64)>, String> {
        match project_id {
            Some(id) => self.query_all(
                "SELECT status, COUNT(*) FROM sponsorships WHERE project_id = ?1 GROUP BY status ORDER BY status",
                params![id],
                row_to_count,
            ),
            None => self.query_all(
                "SELECT status, COUNT(*) FROM sponsorships GROUP BY status ORDER BY status",
                params![],
                row_to_count,
            ),
        }
    }

    /// Sum of live pledge amounts (rejected and refunded excluded).
    pub fn total_pledged(&self, project_id: Option<i64>) -> Result<i64, String> {
        let (sql, p): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match project_id {
            Some(id) => (
                "SELECT COALESCE(SUM(amount), 0) FROM sponsorships
                 WHERE project_id = ?1 AND status NOT IN ('rejected', 'refunded')",
                vec![Box::new(id)],
            ),
            None => (
                "SELECT COALESCE(SUM(amount), 0) FROM sponsorships
                 WHERE status NOT IN ('rejected', 'refunded')",
                vec![],
            ),
        };
        let params_ref: Vec<&dyn rusqlite::types::ToSql> = p.iter().map(|b| b.as_ref()).collect();
        self.conn
            .query_row(sql, params_ref.as_slice(), |row| row.get(0))
            .map_err(|e| format!("query error: {e}"))
    }

    // -- Query helpers --

    fn query_optional<T>(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::types::ToSql],
        map: fn(&rusqlite::Row) -> T,
    ) -> Result<Option<T>, String> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| format!("query error: {e}"))?;
        let mut rows = stmt
            .query_map(params, |row| Ok(map(row)))
            .map_err(|e| format!("query error: {e}"))?;
        match rows.next() {
            Some(Ok(v)) => Ok(Some(v)),
            Some(Err(e)) => Err(format!("query error: {e}")),
            None => Ok(None),
        }
    }

    fn query_all<T>(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::types::ToSql],
        map: fn(&rusqlite::Row) -> T,
    ) -> Result<Vec<T>, String> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| format!("query error: {e}"))?;
        let rows = stmt
            .query_map(params, |row| Ok(map(row)))
            .map_err(|e| format!("query error: {e}"))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| format!("row error: {e}"))?);
        }
        Ok(out)
    }
}

/// Read the current schema version from the meta table.
fn get_schema_version(conn: &Connection) -> Result<i32, String> {
    let mut stmt = conn
        .prepare("SELECT value FROM meta WHERE key = 'schema_version'")
        .map_err(|e| format!("failed to read schema_version: {e}"))?;
    let mut rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| format!("failed to query schema_version: {e}"))?;
    match rows.next() {
        Some(Ok(v)) => v
            .parse::<i32>()
            .map_err(|e| format!("invalid schema_version value: {e}")),
        Some(Err(e)) => Err(format!("failed to read schema_version row: {e}")),
        None => Ok(0),
    }
}

/// Persist the schema version to the meta table.
#[allow(dead_code)]
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), String> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
        params![version.to_string()],
    )
    .map_err(|e| format!("failed to set schema_version: {e}"))?;
    Ok(())
}

/// Run all pending schema migrations in order.
///
/// Each migration should be wrapped in a transaction so that a partial
/// failure does not leave the schema in an inconsistent state. Version 0 is
/// the baseline created by the `CREATE TABLE IF NOT EXISTS` block in
/// `migrate()`; future migrations (v1, v2, ...) are added as additional
/// `if version < N` blocks here.
fn run_migrations(conn: &Connection) -> Result<(), String> {
    let version = get_schema_version(conn)?;

    // v0 is the baseline -- no ALTER TABLE statements needed yet.
    //
    // if version < 1 {
    //     conn.execute_batch(
    //         "BEGIN;
    //          ALTER TABLE accounts ADD COLUMN paypal_email TEXT;
    //          COMMIT;",
    //     )
    //     .map_err(|e| format!("migration v1 failed: {e}"))?;
    //     set_schema_version(conn, 1)?;
    // }

    let _ = version;

    Ok(())
}

fn row_to_project(row: &rusqlite::Row) -> Project {
    let kind_str: String = row.get(3).unwrap_or_default();
    Project {
        project_id: row.get(0).unwrap_or_default(),
        name: row.get(1).unwrap_or_default(),
        description: row.get(2).unwrap_or_default(),
        kind: ProjectKind::from_str(&kind_str).unwrap_or(ProjectKind::Normal),
    }
}

fn row_to_account(row: &rusqlite::Row) -> Account {
    Account {
        account_id: row.get(0).unwrap_or_default(),
        email: row.get(1).unwrap_or_default(),
        name: row.get(2).unwrap_or_default(),
        password_hash: row.get(3).ok(),
    }
}

fn row_to_user(row: &rusqlite::Row) -> User {
    User {
        user_id: row.get(0).unwrap_or_default(),
        project_id: row.get(1).unwrap_or_default(),
        name: row.get(2).unwrap_or_default(),
        account_id: row.get(3).ok(),
        paypal_email: row.get(4).ok(),
    }
}

fn row_to_issue(row: &rusqlite::Row) -> Issue {
    let status_str: String = row.get(3).unwrap_or_default();
    Issue {
        issue_id: row.get(0).unwrap_or_default(),
        project_id: row.get(1).unwrap_or_default(),
        issue_ref: row.get(2).unwrap_or_default(),
        status: IssueStatus::from_str(&status_str).unwrap_or(IssueStatus::Ready),
        title: row.get(4).unwrap_or_default(),
        link: row.get(5).unwrap_or_default(),
        owner_id: row.get(6).ok(),
    }
}

fn row_to_sponsorship(row: &rusqlite::Row) -> Sponsorship {
    let status_str: String = row.get(4).unwrap_or_default();
    Sponsorship {
        sponsorship_id: row.get(0).unwrap_or_default(),
        project_id: row.get(1).unwrap_or_default(),
        issue_id: row.get(2).unwrap_or_default(),
        amount: row.get(3).unwrap_or_default(),
        status: SponsorshipStatus::from_str(&status_str).unwrap_or(SponsorshipStatus::Pledged),
        account_id: row.get(5).ok(),
        user_id: row.get(6).ok(),
    }
}

fn row_to_payment(row: &rusqlite::Row) -> Payment {
    let status_str: String = row.get(5).unwrap_or_default();
    let gateway_str: String = row.get(6).unwrap_or_default();
    let timestamp_str: String = row.get(7).unwrap_or_default();
    Payment {
        payment_id: row.get(0).unwrap_or_default(),
        project_id: row.get(1).unwrap_or_default(),
        sponsorship_id: row.get(2).unwrap_or_default(),
        gateway_id: row.get(3).ok(),
        url: row.get(4).ok(),
        status: PaymentStatus::from_str(&status_str).unwrap_or(PaymentStatus::Initiated),
        gateway: PaymentGateway::from_str(&gateway_str).unwrap_or(PaymentGateway::Dummy),
        timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    }
}

fn row_to_email(row: &rusqlite::Row) -> Email {
    Email {
        email_id: row.get(0).unwrap_or_default(),
        project_id: row.get(1).unwrap_or_default(),
        user_id: row.get(2).unwrap_or_default(),
        issue_id: row.get(3).unwrap_or_default(),
        body: row.get(4).unwrap_or_default(),
    }
}

fn row_to_config(row: &rusqlite::Row) -> ConfigOverride {
    ConfigOverride {
        config_id: row.get(0).unwrap_or_default(),
        project_id: row.get(1).unwrap_or_default(),
        name: row.get(2).unwrap_or_default(),
        value: row.get(3).unwrap_or_default(),
    }
}

fn row_to_change(row: &rusqlite::Row) -> Change {
    let timestamp_str: String = row.get(2).unwrap_or_default();
    Change {
        change_id: row.get(0).unwrap_or_default(),
        project_id: row.get(1).unwrap_or_default(),
        timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        method: row.get(3).unwrap_or_default(),
        path: row.get(4).unwrap_or_default(),
        arguments: row.get(5).unwrap_or_default(),
        status: row.get(6).ok(),
        response: row.get(7).ok(),
    }
}

fn row_to_token(row: &rusqlite::Row) -> Token {
    Token {
        token_id: row.get(0).unwrap_or_default(),
        project_id: row.get(1).unwrap_or_default(),
        token: row.get(2).unwrap_or_default(),
    }
}

fn row_to_count(row: &rusqlite::Row) -> (String, i64) {
    (row.get(0).unwrap_or_default(), row.get(1).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn migrate_is_idempotent() {
        let db = fresh_db();
        db.migrate().unwrap();
        assert_eq!(db.get_meta("schema_version").unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn project_round_trip() {
        let db = fresh_db();
        let project = db
            .insert_project("alpha", "first project", ProjectKind::Normal)
            .unwrap();
        assert_eq!(project.project_id, 1);

        let fetched = db.get_project(project.project_id).unwrap().unwrap();
        assert_eq!(fetched.name, "alpha");
        assert_eq!(fetched.kind, ProjectKind::Normal);

        assert!(db.get_project_by_name("alpha").unwrap().is_some());
        assert!(db.get_project_by_name("beta").unwrap().is_none());
        assert!(db.insert_project("alpha", "again", ProjectKind::Normal).is_err());
    }

    #[test]
    fn token_resolves_to_project() {
        let db = fresh_db();
        let project = db
            .insert_project("alpha", "first", ProjectKind::Normal)
            .unwrap();
        let token = db.create_token(project.project_id).unwrap();
        assert_eq!(token.token.len(), 32);

        let resolved = db.get_project_by_token(&token.token).unwrap().unwrap();
        assert_eq!(resolved.project_id, project.project_id);
        assert!(db.get_project_by_token("bogus").unwrap().is_none());

        // Tokens require an existing project.
        assert!(db.create_token(999).is_err());
    }

    #[test]
    fn account_email_is_unique() {
        let db = fresh_db();
        db.insert_account("alice@example.com", "Alice", None)
            .unwrap();
        assert!(
            db.insert_account("alice@example.com", "Other Alice", None)
                .is_err()
        );
    }

    #[test]
    fn account_user_lookup_per_project() {
        let db = fresh_db();
        let account = db
            .insert_account("alice@example.com", "Alice", None)
            .unwrap();
        let user = db.insert_user(1, "alice", Some(account.account_id)).unwrap();

        let found = db.get_user_for_account(account.account_id, 1).unwrap();
        assert_eq!(found.unwrap().user_id, user.user_id);
        assert!(db.get_user_for_account(account.account_id, 2).unwrap().is_none());
    }

    #[test]
    fn issue_refs_are_unique_per_project() {
        let db = fresh_db();
        db.insert_issue(1, "42", "Crash on save", "/issues/42", None)
            .unwrap();
        assert!(db.insert_issue(1, "42", "Again", "/issues/42", None).is_err());
        // Same ref in another project is fine.
        db.insert_issue(2, "42", "Other crash", "/issues/42", None)
            .unwrap();
    }

    #[test]
    fn issue_update_and_filter() {
        let db = fresh_db();
        let issue = db
            .insert_issue(1, "42", "Crash on save", "/issues/42", None)
            .unwrap();
        db.update_issue(issue.issue_id, Some("started"), None, None, None)
            .unwrap();

        let started = db.list_issues(1, Some("started")).unwrap();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].status, IssueStatus::Started);
        assert!(db.list_issues(1, Some("completed")).unwrap().is_empty());

        assert!(db.update_issue(issue.issue_id, Some("bogus"), None, None, None).is_err());
        assert!(db.update_issue(999, Some("started"), None, None, None).is_err());
    }

    #[test]
    fn sponsorship_requires_a_sponsor() {
        let db = fresh_db();
        let issue = db
            .insert_issue(1, "42", "Crash on save", "/issues/42", None)
            .unwrap();
        assert!(
            db.insert_sponsorship(1, issue.issue_id, None, None, 10)
                .is_err()
        );
    }

    #[test]
    fn double_pledge_is_rejected() {
        let db = fresh_db();
        let issue = db
            .insert_issue(1, "42", "Crash on save", "/issues/42", None)
            .unwrap();
        let user = db.insert_user(1, "bob", None).unwrap();
        db.insert_sponsorship(1, issue.issue_id, Some(user.user_id), None, 10)
            .unwrap();
        assert!(
            db.insert_sponsorship(1, issue.issue_id, Some(user.user_id), None, 20)
                .is_err()
        );
    }

    #[test]
    fn sponsorship_status_flow() {
        let db = fresh_db();
        let issue = db
            .insert_issue(1, "42", "Crash on save", "/issues/42", None)
            .unwrap();
        let user = db.insert_user(1, "bob", None).unwrap();
        let sp = db
            .insert_sponsorship(1, issue.issue_id, Some(user.user_id), None, 10)
            .unwrap();
        assert_eq!(sp.status, SponsorshipStatus::Pledged);

        db.update_sponsorship_status(sp.sponsorship_id, SponsorshipStatus::Confirmed)
            .unwrap();
        let fetched = db.get_sponsorship(sp.sponsorship_id).unwrap().unwrap();
        assert_eq!(fetched.status, SponsorshipStatus::Confirmed);

        db.update_sponsorship_amount(sp.sponsorship_id, 25).unwrap();
        let fetched = db.get_sponsorship(sp.sponsorship_id).unwrap().unwrap();
        assert_eq!(fetched.amount, 25);
    }

    #[test]
    fn payment_lifecycle() {
        let db = fresh_db();
        let issue = db
            .insert_issue(1, "42", "Crash on save", "/issues/42", None)
            .unwrap();
        let user = db.insert_user(1, "bob", None).unwrap();
        let sp = db
            .insert_sponsorship(1, issue.issue_id, Some(user.user_id), None, 10)
            .unwrap();

        let payment = db
            .insert_payment(1, sp.sponsorship_id, PaymentGateway::Dummy)
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Initiated);
        assert!(payment.gateway_id.is_none());

        db.update_payment(
            payment.payment_id,
            Some("gw-123"),
            Some("https://pay.example.com/123"),
            Some(PaymentStatus::Confirmed),
        )
        .unwrap();

        let fetched = db.get_latest_payment(sp.sponsorship_id).unwrap().unwrap();
        assert_eq!(fetched.payment_id, payment.payment_id);
        assert_eq!(fetched.status, PaymentStatus::Confirmed);
        assert_eq!(fetched.gateway_id.as_deref(), Some("gw-123"));

        // Payments require an existing sponsorship.
        assert!(db.insert_payment(1, 999, PaymentGateway::Dummy).is_err());
    }

    #[test]
    fn email_queue_consumption() {
        let db = fresh_db();
        let issue = db
            .insert_issue(1, "42", "Crash on save", "/issues/42", None)
            .unwrap();
        let user = db.insert_user(1, "bob", None).unwrap();
        let email = db
            .insert_email(1, user.user_id, issue.issue_id, "issue completed")
            .unwrap();

        assert_eq!(db.list_emails().unwrap().len(), 1);
        db.delete_email(email.email_id).unwrap();
        assert!(db.list_emails().unwrap().is_empty());
        assert!(db.delete_email(email.email_id).is_err());
    }

    #[test]
    fn config_overrides_replace_and_delete() {
        let db = fresh_db();
        db.set_project_config(1, "max_pledge_amount", "500").unwrap();
        db.set_project_config(1, "max_pledge_amount", "750").unwrap();

        assert_eq!(
            db.get_project_config(1, "max_pledge_amount").unwrap().as_deref(),
            Some("750")
        );
        // One row per (project, name).
        assert_eq!(db.list_project_config(1).unwrap().len(), 1);
        assert!(db.get_project_config(2, "max_pledge_amount").unwrap().is_none());

        db.delete_project_config(1, "max_pledge_amount").unwrap();
        assert!(db.get_project_config(1, "max_pledge_amount").unwrap().is_none());
        assert!(db.delete_project_config(1, "max_pledge_amount").is_err());
    }

    #[test]
    fn change_audit_round_trip() {
        let db = fresh_db();
        let change_id = db
            .insert_change(1, "issue", "add", r#"{"issue_ref":"42"}"#)
            .unwrap();

        let open = &db.list_changes(1).unwrap()[0];
        assert!(open.status.is_none());

        db.finish_change(change_id, 0, "registered issue 42").unwrap();
        let done = &db.list_changes(1).unwrap()[0];
        assert_eq!(done.status, Some(0));
        assert_eq!(done.response.as_deref(), Some("registered issue 42"));
    }

    #[test]
    fn stats_counts_and_totals() {
        let db = fresh_db();
        let issue = db
            .insert_issue(1, "42", "Crash on save", "/issues/42", None)
            .unwrap();
        db.insert_issue(1, "43", "Slow load", "/issues/43", None)
            .unwrap();
        let bob = db.insert_user(1, "bob", None).unwrap();
        let eve = db.insert_user(1, "eve", None).unwrap();

        let sp = db
            .insert_sponsorship(1, issue.issue_id, Some(bob.user_id), None, 40)
            .unwrap();
        db.insert_sponsorship(1, issue.issue_id, Some(eve.user_id), None, 60)
            .unwrap();

        assert_eq!(db.issue_count_by_status(Some(1)).unwrap(), vec![("ready".to_string(), 2)]);
        assert_eq!(db.total_pledged(Some(1)).unwrap(), 100);
        assert_eq!(db.total_pledged(Some(2)).unwrap(), 0);

        db.update_sponsorship_status(sp.sponsorship_id, SponsorshipStatus::Refunded)
            .unwrap();
        assert_eq!(db.total_pledged(Some(1)).unwrap(), 60);
    }
}
