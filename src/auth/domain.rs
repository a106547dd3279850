use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Access role attached to every profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Farmer,
    Vet,
    Authority,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Vet => "vet",
            Role::Authority => "authority",
        }
    }

    /// Roles permitted to publish disease alerts.
    pub const fn can_publish_alerts(self) -> bool {
        matches!(self, Role::Vet | Role::Authority)
    }
}

/// Kind of livestock operation a farmer runs. `Both` is a profile
/// attribute only; assessments are always taken against a single-species
/// catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarmType {
    Pig,
    Poultry,
    Both,
}

impl FarmType {
    pub const fn label(self) -> &'static str {
        match self {
            FarmType::Pig => "pig",
            FarmType::Poultry => "poultry",
            FarmType::Both => "both",
        }
    }
}

/// Stored profile. Credentials live under a separate key and are never
/// serialized into API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_type: Option<FarmType>,
    pub location: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub farm_type: Option<FarmType>,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub farm_type: Option<FarmType>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Email-index record pairing the owning user with the stored password.
/// Passwords are compared by direct equality; hardening the credential
/// check is explicitly out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub user_id: UserId,
    pub password: String,
}
