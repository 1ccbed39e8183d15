//! User types for Etlas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, OrderedParams};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "optional_flag")]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub email_verified: Option<bool>,
    pub image: Option<String>,
}

impl UserCreate {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let email = email.into();
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        validate_email(&email)?;
        Ok(Self {
            name,
            email,
            email_verified: None,
            image: None,
        })
    }
}

impl OrderedParams for UserCreate {
    const ORDERED_PARAMS: &'static [&'static str] = &["name", "email", "email_verified", "image"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub image: Option<String>,
}

impl OrderedParams for UserUpdate {
    const ORDERED_PARAMS: &'static [&'static str] =
        &["id", "name", "email", "email_verified", "image"];
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidField {
            field: "email",
            reason: format!("'{email}' is not an email address"),
        })
    }
}

/// SQLite stores booleans as integers; accept either form.
fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_email_verified_accepts_integer() {
        let user: User = serde_json::from_value(json!({
            "id": Uuid::now_v7(),
            "name": "Ana",
            "email": "ana@example.com",
            "email_verified": 1,
            "image": null,
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.email_verified, Some(true));
    }

    #[test]
    fn test_email_verified_accepts_null_and_bool() {
        let base = json!({
            "id": Uuid::now_v7(),
            "name": "Ana",
            "email": "ana@example.com",
            "created_at": "2026-01-01T00:00:00Z"
        });
        let user: User = serde_json::from_value(base.clone()).unwrap();
        assert_eq!(user.email_verified, None);

        let mut with_bool = base;
        with_bool["email_verified"] = json!(false);
        let user: User = serde_json::from_value(with_bool).unwrap();
        assert_eq!(user.email_verified, Some(false));
    }

    #[test]
    fn test_user_create_validates_email() {
        assert!(UserCreate::new("Ana", "ana@example.com").is_ok());
        assert!(matches!(
            UserCreate::new("Ana", "not-an-email"),
            Err(ValidationError::InvalidField { field: "email", .. })
        ));
        assert_eq!(
            UserCreate::new(" ", "ana@example.com"),
            Err(ValidationError::MissingField("name"))
        );
    }
}
