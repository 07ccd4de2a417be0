//! In-memory backend used by unit tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{ApiError, Backend, SignInRequest, SignUpRequest};
use crate::entities::{
    AuthResponse, Material, Product, Role, StageHistoryRecord, User,
};

#[derive(Debug, Default)]
struct State {
    materials: Vec<Material>,
    products: Vec<Product>,
    stages: HashMap<i64, String>,
    histories: HashMap<i64, Vec<StageHistoryRecord>>,
    users: Vec<User>,
    next_id: i64,
    calls: Vec<String>,
}

/// Backend keeping every resource in memory
///
/// Individual calls can be made to fail with [`FakeBackend::fail`], keyed by
/// `"<operation>"` or `"<operation>:<key>"`.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<State>,
    failures: Mutex<HashSet<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().next_id = 100;
        backend
    }

    pub fn with_material(self, material: Material) -> Self {
        self.state.lock().unwrap().materials.push(material);
        self
    }

    pub fn with_product(self, product: Product, stage: Option<&str>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            if let (Some(id), Some(stage)) = (product.id, stage) {
                state.stages.insert(id, stage.to_string());
            }
            state.products.push(product);
        }
        self
    }

    pub fn with_history(self, id: i64, history: Vec<StageHistoryRecord>) -> Self {
        self.state.lock().unwrap().histories.insert(id, history);
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.state.lock().unwrap().users.push(user);
        self
    }

    /// Make the given operation fail with a 500
    pub fn fail(&self, key: &str) {
        self.failures.lock().unwrap().insert(key.to_string());
    }

    /// Operations performed so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn stored_products(&self) -> Vec<Product> {
        self.state.lock().unwrap().products.clone()
    }

    pub fn stored_users(&self) -> Vec<User> {
        self.state.lock().unwrap().users.clone()
    }

    fn check(&self, op: &str, key: impl std::fmt::Display) -> Result<(), ApiError> {
        let keyed = format!("{}:{}", op, key);
        self.state.lock().unwrap().calls.push(keyed.clone());
        let failures = self.failures.lock().unwrap();
        if failures.contains(op) || failures.contains(&keyed) {
            return Err(ApiError::from_status(500, format!("{} failed", keyed)));
        }
        Ok(())
    }

    fn not_found(what: impl std::fmt::Display) -> ApiError {
        ApiError::from_status(404, format!("{} not found", what))
    }
}

impl Backend for FakeBackend {
    fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ApiError> {
        self.check("sign_in", &request.username)?;
        let state = self.state.lock().unwrap();
        let user = state
            .users
            .iter()
            .find(|u| u.username == request.username)
            .ok_or_else(|| ApiError::from_status(401, "Bad credentials"))?;
        Ok(AuthResponse {
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.role_names(),
            access_token: format!("token-{}", user.id),
        })
    }

    fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, ApiError> {
        self.check("sign_up", &request.username)?;
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.username == request.username) {
            return Err(ApiError::from_status(
                400,
                r#"{"message":"Error: Username is already taken!"}"#,
            ));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.users.push(User {
            id,
            username: request.username.clone(),
            email: request.email.clone(),
            roles: vec![Role::new("ROLE_USER")],
        });
        Ok(AuthResponse {
            username: request.username.clone(),
            email: request.email.clone(),
            roles: vec!["ROLE_USER".to_string()],
            access_token: format!("token-{}", id),
        })
    }

    fn list_materials(&self) -> Result<Vec<Material>, ApiError> {
        self.check("list_materials", "")?;
        Ok(self.state.lock().unwrap().materials.clone())
    }

    fn create_material(&self, material: &Material) -> Result<Material, ApiError> {
        self.check("create_material", &material.material_number)?;
        let mut state = self.state.lock().unwrap();
        state.materials.push(material.clone());
        Ok(material.clone())
    }

    fn update_material(&self, number: &str, material: &Material) -> Result<Material, ApiError> {
        self.check("update_material", number)?;
        let mut state = self.state.lock().unwrap();
        let slot = state
            .materials
            .iter_mut()
            .find(|m| m.material_number == number)
            .ok_or_else(|| Self::not_found(number))?;
        *slot = material.clone();
        Ok(material.clone())
    }

    fn delete_material(&self, number: &str) -> Result<(), ApiError> {
        self.check("delete_material", number)?;
        let mut state = self.state.lock().unwrap();
        let before = state.materials.len();
        state.materials.retain(|m| m.material_number != number);
        if state.materials.len() == before {
            return Err(Self::not_found(number));
        }
        Ok(())
    }

    fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.check("list_products", "")?;
        Ok(self.state.lock().unwrap().products.clone())
    }

    fn create_product(&self, product: &Product) -> Result<Product, ApiError> {
        self.check("create_product", &product.name)?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let mut created = product.clone();
        created.id = Some(id);
        // Descriptions are stored trimmed, so the response differs from the draft
        created.description = created.description.trim().to_string();
        state.stages.insert(id, "CONCEPT".to_string());
        state.products.push(created.clone());
        Ok(created)
    }

    fn update_product(&self, id: i64, product: &Product) -> Result<Product, ApiError> {
        self.check("update_product", id)?;
        let mut state = self.state.lock().unwrap();
        let slot = state
            .products
            .iter_mut()
            .find(|p| p.id == Some(id))
            .ok_or_else(|| Self::not_found(id))?;
        *slot = Product {
            id: Some(id),
            description: product.description.trim().to_string(),
            ..product.clone()
        };
        Ok(slot.clone())
    }

    fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.check("delete_product", id)?;
        let mut state = self.state.lock().unwrap();
        let before = state.products.len();
        state.products.retain(|p| p.id != Some(id));
        if state.products.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    fn current_stage(&self, id: i64) -> Result<String, ApiError> {
        self.check("current_stage", id)?;
        self.state
            .lock()
            .unwrap()
            .stages
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    fn stage_history(&self, id: i64) -> Result<Vec<StageHistoryRecord>, ApiError> {
        self.check("stage_history", id)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .histories
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn next_stage(&self, id: i64) -> Result<String, ApiError> {
        self.check("next_stage", id)?;
        let mut state = self.state.lock().unwrap();
        let current = state.stages.get(&id).cloned().ok_or_else(|| Self::not_found(id))?;
        let next = match current.as_str() {
            "CONCEPT" => "FEASIBILITY",
            "FEASIBILITY" => "PROJECTION",
            "PROJECTION" => "PRODUCTION",
            "PRODUCTION" => "RETREAT",
            _ => return Err(ApiError::from_status(400, "No next stage")),
        };
        state.stages.insert(id, next.to_string());
        Ok(format!("Product moved to {}", next))
    }

    fn set_stage(&self, id: i64, stage: &str) -> Result<String, ApiError> {
        self.check("set_stage", id)?;
        let mut state = self.state.lock().unwrap();
        if !state.stages.contains_key(&id) {
            return Err(Self::not_found(id));
        }
        state.stages.insert(id, stage.to_string());
        Ok(format!("Stage set to {}", stage))
    }

    fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.check("list_users", "")?;
        Ok(self.state.lock().unwrap().users.clone())
    }

    fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.check("delete_user", id)?;
        let mut state = self.state.lock().unwrap();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    fn update_user_roles(&self, id: i64, roles: &[String]) -> Result<String, ApiError> {
        self.check("update_user_roles", id)?;
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        user.roles = roles.iter().map(Role::new).collect();
        Ok("Roles updated".to_string())
    }
}
