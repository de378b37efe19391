use serde::{Deserialize, Serialize};

use crate::accounts::repo_types::User;
use crate::error::AppError;

/// Request body for login and signup.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `Credentials` with both fields present.
#[derive(Debug)]
pub struct ValidCredentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(self) -> Result<ValidCredentials, AppError> {
        let email = required(self.email, "email")?;
        let password = required(self.password, "password")?;
        Ok(ValidCredentials { email, password })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!("Missing field: {field}"))),
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MsgResponse {
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoggedInResponse {
    pub logged_in_as: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_complete_body() {
        let c: Credentials =
            serde_json::from_str(r#"{"email":"a@example.com","password":"pw"}"#).unwrap();
        let v = c.validate().unwrap();
        assert_eq!(v.email, "a@example.com");
        assert_eq!(v.password, "pw");
    }

    #[test]
    fn validate_names_missing_field() {
        let c: Credentials = serde_json::from_str(r#"{"email":"a@example.com"}"#).unwrap();
        match c.validate() {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("password")),
            other => panic!("expected BadRequest, got {other:?}"),
        }

        let c: Credentials = serde_json::from_str(r#"{"email":"","password":"pw"}"#).unwrap();
        assert!(matches!(c.validate(), Err(AppError::BadRequest(msg)) if msg.contains("email")));
    }

    #[test]
    fn public_user_hides_password() {
        let user = User {
            id: 7,
            email: "a@example.com".into(),
            password: "hunter2".into(),
            is_active: true,
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "a@example.com");
        assert!(json.get("password").is_none());
    }
}
