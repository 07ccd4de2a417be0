//! User entity type - accounts, roles and the signed-in profile

use serde::{Deserialize, Deserializer, Serialize};

/// Role names known to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum RoleName {
    #[serde(rename = "ROLE_USER")]
    #[value(name = "ROLE_USER", alias = "user")]
    User,
    #[serde(rename = "ROLE_DESIGNER")]
    #[value(name = "ROLE_DESIGNER", alias = "designer")]
    Designer,
    #[serde(rename = "ROLE_PORTOFOLIO_MANAGER")]
    #[value(name = "ROLE_PORTOFOLIO_MANAGER", alias = "portfolio-manager")]
    PortfolioManager,
    #[serde(rename = "ROLE_SELLER")]
    #[value(name = "ROLE_SELLER", alias = "seller")]
    Seller,
    #[serde(rename = "ROLE_ADMIN")]
    #[value(name = "ROLE_ADMIN", alias = "admin")]
    Admin,
}

impl RoleName {
    pub const ALL: [RoleName; 5] = [
        RoleName::User,
        RoleName::Designer,
        RoleName::PortfolioManager,
        RoleName::Seller,
        RoleName::Admin,
    ];

    /// Wire name (the backend spells the portfolio role "PORTOFOLIO")
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::User => "ROLE_USER",
            RoleName::Designer => "ROLE_DESIGNER",
            RoleName::PortfolioManager => "ROLE_PORTOFOLIO_MANAGER",
            RoleName::Seller => "ROLE_SELLER",
            RoleName::Admin => "ROLE_ADMIN",
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// Role assignment as returned by the backend
///
/// The name is kept as a string so that roles unknown to this client still
/// show up in listings and counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "crate::entities::null_as_default")]
    pub roles: Vec<Role>,
}

impl User {
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.iter().any(|r| r.name == role.as_str())
    }
}

/// Profile of the signed-in user, as persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserProfile {
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }
}

/// Response of the sign-in and sign-up endpoints
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub roles: Vec<String>,
    pub access_token: String,
}

impl AuthResponse {
    /// Split into the persisted profile and the bearer token
    pub fn into_parts(self) -> (UserProfile, String) {
        (
            UserProfile {
                username: self.username,
                email: self.email,
                roles: self.roles,
            },
            self.access_token,
        )
    }
}

/// Some backend versions send a single role as a bare string
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(role)) if role.is_empty() => Vec::new(),
        Some(OneOrMany::One(role)) => vec![role],
        Some(OneOrMany::Many(roles)) => roles,
        None => Vec::new(),
    })
}
