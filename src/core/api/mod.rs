//! Backend REST API
//!
//! [`Backend`] is the seam between the client-side state and the server. The
//! production implementation is [`HttpBackend`]; tests substitute in-memory
//! fakes.

#[cfg(test)]
pub(crate) mod fake;
mod http;

pub use http::HttpBackend;

use serde::Serialize;
use thiserror::Error;

use crate::entities::{AuthResponse, Material, Product, StageHistoryRecord, User};

/// Errors returned by backend calls
///
/// Variants follow the failure taxonomy the UI reacts to: no response at all,
/// an authentication failure, a validation/conflict rejection, or any other
/// non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Could not reach server: {0}")]
    Transport(String),

    #[error("Unauthorized: {body}")]
    Unauthorized { body: String },

    #[error("Request rejected: {body}")]
    BadRequest { body: String },

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success HTTP status and its body
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 => ApiError::Unauthorized { body },
            400 => ApiError::BadRequest { body },
            _ => ApiError::Server { status, body },
        }
    }

    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::BadRequest { .. } => Some(400),
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

/// Body of `POST /auth/signin`
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /auth/signup`
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Operations offered by the lifecycle backend
///
/// Implementations must be shareable across threads: per-product requests are
/// fanned out in parallel.
pub trait Backend: Sync {
    /// `POST /auth/signin`
    fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/signup`
    fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ApiError>;

    /// `GET /material`
    fn list_materials(&self) -> Result<Vec<Material>, ApiError>;

    /// `POST /material`
    fn create_material(&self, material: &Material) -> Result<Material, ApiError>;

    /// `PUT /material/{materialNumber}`
    fn update_material(&self, number: &str, material: &Material) -> Result<Material, ApiError>;

    /// `DELETE /material/{materialNumber}`
    fn delete_material(&self, number: &str) -> Result<(), ApiError>;

    /// `GET /products/get-all`
    fn list_products(&self) -> Result<Vec<Product>, ApiError>;

    /// `POST /products/new`
    fn create_product(&self, product: &Product) -> Result<Product, ApiError>;

    /// `PUT /products/{id}`
    fn update_product(&self, id: i64, product: &Product) -> Result<Product, ApiError>;

    /// `DELETE /products/{id}/delete`
    fn delete_product(&self, id: i64) -> Result<(), ApiError>;

    /// `GET /products/{id}/get-current-stage`
    fn current_stage(&self, id: i64) -> Result<String, ApiError>;

    /// `GET /products/{id}/get-stage-history`
    fn stage_history(&self, id: i64) -> Result<Vec<StageHistoryRecord>, ApiError>;

    /// `POST /products/{id}/next-stage`, returning the server's message
    fn next_stage(&self, id: i64) -> Result<String, ApiError>;

    /// `POST /products/{id}/set-stage`, returning the server's message
    fn set_stage(&self, id: i64, stage: &str) -> Result<String, ApiError>;

    /// `GET /users/get-all`
    fn list_users(&self) -> Result<Vec<User>, ApiError>;

    /// `DELETE /users/delete/{id}`
    fn delete_user(&self, id: i64) -> Result<(), ApiError>;

    /// `PUT /users/update-role/{id}`, returning the server's message
    fn update_user_roles(&self, id: i64, roles: &[String]) -> Result<String, ApiError>;
}
