use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    Normal,
    Test,
    Root,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Normal => "normal",
            ProjectKind::Test => "test",
            ProjectKind::Root => "root",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(ProjectKind::Normal),
            "test" => Ok(ProjectKind::Test),
            "root" => Ok(ProjectKind::Root),
            _ => Err(format!("unknown project kind: {s}")),
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue lifecycle as seen from the tracker: registered and fundable,
/// being worked on, or fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Ready,
    Started,
    Completed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Ready => "ready",
            IssueStatus::Started => "started",
            IssueStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "ready" | "open" => Ok(IssueStatus::Ready),
            "started" | "in_progress" => Ok(IssueStatus::Started),
            "completed" | "done" => Ok(IssueStatus::Completed),
            _ => Err(format!("unknown issue status: {s}")),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sponsorship lifecycle. A pledge becomes confirmed once paid, validated
/// once the sponsor accepts the fix, and transferred once paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SponsorshipStatus {
    Pledged,
    Confirmed,
    Validated,
    Transferred,
    Rejected,
    Refunded,
}

impl SponsorshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SponsorshipStatus::Pledged => "pledged",
            SponsorshipStatus::Confirmed => "confirmed",
            SponsorshipStatus::Validated => "validated",
            SponsorshipStatus::Transferred => "transferred",
            SponsorshipStatus::Rejected => "rejected",
            SponsorshipStatus::Refunded => "refunded",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pledged" => Ok(SponsorshipStatus::Pledged),
            "confirmed" => Ok(SponsorshipStatus::Confirmed),
            "validated" => Ok(SponsorshipStatus::Validated),
            "transferred" => Ok(SponsorshipStatus::Transferred),
            "rejected" => Ok(SponsorshipStatus::Rejected),
            "refunded" => Ok(SponsorshipStatus::Refunded),
            _ => Err(format!("unknown sponsorship status: {s}")),
        }
    }
}

impl fmt::Display for SponsorshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Initiated,
    Confirmed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::Confirmed => "confirmed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "initiated" => Ok(PaymentStatus::Initiated),
            "confirmed" => Ok(PaymentStatus::Confirmed),
            _ => Err(format!("unknown payment status: {s}")),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentGateway {
    Dummy,
    PaypalStandard,
    PaypalAdaptive,
}

impl PaymentGateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentGateway::Dummy => "dummy",
            PaymentGateway::PaypalStandard => "paypal_standard",
            PaymentGateway::PaypalAdaptive => "paypal_adaptive",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "dummy" => Ok(PaymentGateway::Dummy),
            "paypal_standard" | "paypal-standard" => Ok(PaymentGateway::PaypalStandard),
            "paypal_adaptive" | "paypal-adaptive" => Ok(PaymentGateway::PaypalAdaptive),
            _ => Err(format!("unknown payment gateway: {s}")),
        }
    }
}

impl fmt::Display for PaymentGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: i64,
    pub name: String,
    pub description: String,
    pub kind: ProjectKind,
}

impl Project {
    /// Root projects are aggregates managed by the system and cannot be
    /// edited through the normal commands.
    pub fn is_mutable(&self) -> bool {
        self.kind != ProjectKind::Root
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: i64,
    pub email: String,
    pub name: String,
    /// Argon2 hash, never exposed in serialized output.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
}

impl Account {
    /// Hash a password for storage. `None` clears the hash, which makes the
    /// account unable to log in with a password.
    pub fn hash_password(password: Option<&str>) -> Result<Option<String>, String> {
        match password {
            None => Ok(None),
            Some(pw) => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = Argon2::default()
                    .hash_password(pw.as_bytes(), &salt)
                    .map_err(|e| format!("failed to hash password: {e}"))?;
                Ok(Some(hash.to_string()))
            }
        }
    }

    pub fn set_password(&mut self, password: Option<&str>) -> Result<(), String> {
        self.password_hash = Account::hash_password(password)?;
        Ok(())
    }

    /// A missing hash never verifies.
    pub fn verify_password(&self, password: &str) -> bool {
        let Some(ref stored) = self.password_hash else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub project_id: i64,
    pub name: String,
    pub account_id: Option<i64>,
    pub paypal_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub issue_id: i64,
    pub project_id: i64,
    /// Identifier of the issue in the external bug tracker.
    pub issue_ref: String,
    pub status: IssueStatus,
    pub title: String,
    pub link: String,
    pub owner_id: Option<i64>,
}

impl Issue {
    /// Externally reachable issue URL: the project's tracker URL joined
    /// with the issue's relative link.
    pub fn full_link(&self, tracker_url: &str) -> String {
        format!("{}{}", tracker_url, self.link)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsorship {
    pub sponsorship_id: i64,
    pub project_id: i64,
    pub issue_id: i64,
    pub amount: i64,
    pub status: SponsorshipStatus,
    pub account_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: i64,
    pub project_id: i64,
    pub sponsorship_id: i64,
    /// Identifier assigned by the gateway once the payment exists there.
    pub gateway_id: Option<String>,
    /// Gateway-side URL the sponsor is sent to, if any.
    pub url: Option<String>,
    pub status: PaymentStatus,
    pub gateway: PaymentGateway,
    pub timestamp: DateTime<Utc>,
}

/// A queued notification waiting to be delivered by an external sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub email_id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub issue_id: i64,
    pub body: String,
}

/// A per-project configuration override row backing the scoped config view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOverride {
    pub config_id: i64,
    pub project_id: i64,
    pub name: String,
    pub value: String,
}

/// Audit record of a mutating operation. Inserted when the operation
/// starts; status and response are filled in when it finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub change_id: i64,
    pub project_id: i64,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub arguments: String,
    pub status: Option<i64>,
    pub response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub token_id: i64,
    pub project_id: i64,
    pub token: String,
}
