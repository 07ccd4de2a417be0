//! HTTP implementation of the backend API

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{ApiError, Backend, SignInRequest, SignUpRequest};
use crate::core::config::Config;
use crate::entities::{AuthResponse, Material, Product, StageHistoryRecord, User};

/// Blocking JSON-over-HTTP client for the lifecycle backend
///
/// Attaches `Authorization: Bearer <token>` to every request once a token is
/// set. There is no retry and no token refresh: every failure is returned to
/// the caller as-is.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            token: None,
        })
    }

    /// Use the given bearer token for subsequent requests
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_else(|e| {
            debug!("failed to read error body for {}: {}", status, e);
            String::new()
        });
        debug!("backend rejected request with {}: {}", status, body);
        Err(ApiError::from_status(status.as_u16(), body))
    }

    fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(builder)?;
        let text = response
            .text()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn send_text(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        self.send(builder)?
            .text()
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::GET, path))
    }

    fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(method, path).json(body))
    }
}

/// Plain-text responses may arrive JSON-encoded (e.g. `"CONCEPT"`)
fn unquote(text: String) -> String {
    serde_json::from_str::<String>(&text).unwrap_or_else(|_| text.trim().to_string())
}

impl Backend for HttpBackend {
    fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ApiError> {
        self.write(Method::POST, "/auth/signin", request)
    }

    fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ApiError> {
        self.write(Method::POST, "/auth/signup", request)
    }

    fn list_materials(&self) -> Result<Vec<Material>, ApiError> {
        self.get("/material")
    }

    fn create_material(&self, material: &Material) -> Result<Material, ApiError> {
        self.write(Method::POST, "/material", material)
    }

    fn update_material(&self, number: &str, material: &Material) -> Result<Material, ApiError> {
        self.write(Method::PUT, &format!("/material/{}", number), material)
    }

    fn delete_material(&self, number: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("/material/{}", number)))
            .map(|_| ())
    }

    fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get("/products/get-all")
    }

    fn create_product(&self, product: &Product) -> Result<Product, ApiError> {
        self.write(Method::POST, "/products/new", product)
    }

    fn update_product(&self, id: i64, product: &Product) -> Result<Product, ApiError> {
        self.write(Method::PUT, &format!("/products/{}", id), product)
    }

    fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("/products/{}/delete", id)))
            .map(|_| ())
    }

    fn current_stage(&self, id: i64) -> Result<String, ApiError> {
        let path = format!("/products/{}/get-current-stage", id);
        self.send_text(self.request(Method::GET, &path)).map(unquote)
    }

    fn stage_history(&self, id: i64) -> Result<Vec<StageHistoryRecord>, ApiError> {
        self.get(&format!("/products/{}/get-stage-history", id))
    }

    fn next_stage(&self, id: i64) -> Result<String, ApiError> {
        let path = format!("/products/{}/next-stage", id);
        self.send_text(self.request(Method::POST, &path).json(&serde_json::json!({})))
            .map(unquote)
    }

    fn set_stage(&self, id: i64, stage: &str) -> Result<String, ApiError> {
        let path = format!("/products/{}/set-stage", id);
        let body = serde_json::json!({ "stage": stage });
        self.send_text(self.request(Method::POST, &path).json(&body))
            .map(unquote)
    }

    fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/users/get-all")
    }

    fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("/users/delete/{}", id)))
            .map(|_| ())
    }

    fn update_user_roles(&self, id: i64, roles: &[String]) -> Result<String, ApiError> {
        let path = format!("/users/update-role/{}", id);
        self.send_text(self.request(Method::PUT, &path).json(roles))
            .map(unquote)
    }
}
