use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered account. The password hash never leaves the storage layer
/// through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Trimmed and lower-cased.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Local sign-up input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A user together with a freshly issued access token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Identity returned by an external provider after a successful code exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalProfile {
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub display_name: Option<String>,
}

impl ExternalProfile {
    /// First name: given name, else the first word of the display name.
    pub fn first_name(&self) -> String {
        non_blank(self.given_name.as_deref())
            .map(str::to_string)
            .or_else(|| {
                non_blank(self.display_name.as_deref())
                    .and_then(|d| d.split_whitespace().next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Last name: family name, else the rest of the display name.
    pub fn last_name(&self) -> String {
        non_blank(self.family_name.as_deref())
            .map(str::to_string)
            .or_else(|| {
                let rest: Vec<&str> = self
                    .display_name
                    .as_deref()
                    .unwrap_or_default()
                    .split_whitespace()
                    .skip(1)
                    .collect();
                (!rest.is_empty()).then(|| rest.join(" "))
            })
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// Canonical stored form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
