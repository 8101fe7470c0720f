use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::contract::model::{AuthSession, Credentials, NewUser, User};

static NON_BLANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S").unwrap());

/// Emails are trimmed before the format check runs.
fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trim().to_string()))
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupReq {
    #[validate(
        required(message = "First name is required"),
        regex(path = *NON_BLANK_RE, message = "First name is required")
    )]
    pub first_name: Option<String>,

    #[validate(
        required(message = "Last name is required"),
        regex(path = *NON_BLANK_RE, message = "Last name is required")
    )]
    pub last_name: Option<String>,

    #[validate(
        required(message = "Please include a valid email"),
        email(message = "Please include a valid email")
    )]
    #[serde(default, deserialize_with = "trimmed")]
    pub email: Option<String>,

    #[validate(
        required(message = "Please enter a password with 6 or more characters"),
        length(min = 6, message = "Please enter a password with 6 or more characters")
    )]
    pub password: Option<String>,
}

impl From<SignupReq> for NewUser {
    fn from(r: SignupReq) -> Self {
        Self {
            first_name: r.first_name.unwrap_or_default(),
            last_name: r.last_name.unwrap_or_default(),
            email: r.email.unwrap_or_default(),
            password: r.password.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginReq {
    #[validate(
        required(message = "Please include a valid email"),
        email(message = "Please include a valid email")
    )]
    #[serde(default, deserialize_with = "trimmed")]
    pub email: Option<String>,

    #[validate(required(message = "Password is required"))]
    pub password: Option<String>,
}

impl From<LoginReq> for Credentials {
    fn from(r: LoginReq) -> Self {
        Self {
            email: r.email.unwrap_or_default(),
            password: r.password.unwrap_or_default(),
        }
    }
}

/// Signup and login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub token: String,
}

impl From<AuthSession> for AuthResponse {
    fn from(s: AuthSession) -> Self {
        Self {
            id: s.user.id,
            first_name: s.user.first_name,
            last_name: s.user.last_name,
            email: s.user.email,
            token: s.token,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Static part of the debug report; request headers are added per call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub environment: String,
    pub backend_urls: Vec<String>,
    pub frontend_urls: Vec<String>,
    pub google_client_id: &'static str,
    pub google_client_secret: &'static str,
    pub google_callback_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    #[serde(flatten)]
    pub info: DebugInfo,
    pub referer: Option<String>,
    pub origin: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_ingress::validation::field_errors;

    fn signup(v: serde_json::Value) -> SignupReq {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn signup_messages() {
        let req = signup(serde_json::json!({
            "firstName": "  ",
            "email": "not-an-email",
            "password": "123"
        }));
        let errs = field_errors(&req.validate().unwrap_err());
        let pairs: Vec<(&str, &str)> = errs
            .iter()
            .map(|e| (e.field.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("email", "Please include a valid email"),
                ("firstName", "First name is required"),
                ("lastName", "Last name is required"),
                ("password", "Please enter a password with 6 or more characters"),
            ]
        );
    }

    #[test]
    fn valid_signup_converts() {
        let req = signup(serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "password": "analytical"
        }));
        req.validate().unwrap();
        let new: NewUser = req.into();
        assert_eq!(new.first_name, "Ada");
        assert_eq!(new.password, "analytical");
    }

    #[test]
    fn padded_email_is_trimmed_before_validation() {
        let req = signup(serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "  ADA@example.COM ",
            "password": "analytical"
        }));
        req.validate().unwrap();
        assert_eq!(req.email.as_deref(), Some("ADA@example.COM"));

        let req: LoginReq = serde_json::from_value(
            serde_json::json!({ "email": " ada@example.com\t", "password": "x" }),
        )
        .unwrap();
        assert!(req.validate().is_ok());

        let req: LoginReq =
            serde_json::from_value(serde_json::json!({ "password": "x" })).unwrap();
        assert_eq!(req.email, None);
    }

    #[test]
    fn login_requires_password_presence_only() {
        let req: LoginReq =
            serde_json::from_value(serde_json::json!({ "email": "a@b.co" })).unwrap();
        let errs = field_errors(&req.validate().unwrap_err());
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].message, "Password is required");

        let req: LoginReq =
            serde_json::from_value(serde_json::json!({ "email": "a@b.co", "password": "" }))
                .unwrap();
        assert!(req.validate().is_ok());
    }
}
