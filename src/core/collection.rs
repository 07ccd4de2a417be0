//! Client-side collections of backend resources
//!
//! Each collection is a disposable copy of server state. Writes go to the
//! backend first; the local copy changes only after the backend accepted them.

use tracing::debug;

use crate::core::api::{ApiError, Backend};
use crate::core::fanout::{fan_out, Slot};
use crate::core::filter::{material_options, ProductFilter};
use crate::entities::{Material, Product, User, UNKNOWN_STAGE};

/// Products with their resolved current stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductCollection {
    products: Vec<Product>,
}

impl ProductCollection {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Fetch all products and resolve each one's current stage
    pub fn fetch(backend: &dyn Backend) -> Result<Self, ApiError> {
        let products = backend.list_products()?;
        debug!("fetched {} products", products.len());
        Ok(Self::new(resolve_stages(backend, products)))
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == Some(id))
    }

    /// Adopt the server's representation of a product
    ///
    /// Replaces the entry with the same ID, or appends a newly created one.
    /// Write responses never carry the current stage, so a previously
    /// resolved stage is kept unless the response has its own.
    pub fn upsert(&mut self, mut product: Product) -> &Product {
        match self
            .products
            .iter()
            .position(|p| p.id.is_some() && p.id == product.id)
        {
            Some(index) => {
                if product.current_stage.is_none() {
                    product.current_stage = self.products[index].current_stage.take();
                }
                self.products[index] = product;
                &self.products[index]
            }
            None => {
                self.products.push(product);
                &self.products[self.products.len() - 1]
            }
        }
    }

    pub fn remove(&mut self, id: i64) -> Option<Product> {
        let index = self.products.iter().position(|p| p.id == Some(id))?;
        Some(self.products.remove(index))
    }

    /// Re-resolve the current stage of one product
    pub fn refresh_stage(&mut self, backend: &dyn Backend, id: i64) -> Result<&Product, ApiError> {
        let stage = backend.current_stage(id)?;
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == Some(id))
            .ok_or_else(|| ApiError::from_status(404, format!("Product {} not loaded", id)))?;
        product.current_stage = Some(stage);
        Ok(product)
    }

    /// Products passing `filter`, in collection order
    pub fn filtered(&self, filter: &ProductFilter) -> Vec<Product> {
        filter.apply(&self.products)
    }

    /// Material numbers available as filter options
    pub fn material_options(&self) -> Vec<String> {
        material_options(&self.products)
    }
}

/// Resolve the current stage of every product concurrently
///
/// Products whose lookup fails get [`UNKNOWN_STAGE`], as do unsaved products
/// (no ID, nothing to ask the backend). The list keeps its order.
pub fn resolve_stages(backend: &dyn Backend, products: Vec<Product>) -> Vec<Product> {
    let ids: Vec<i64> = products.iter().filter_map(|p| p.id).collect();
    let mut stages = fan_out(
        "current stage",
        &ids,
        |id| backend.current_stage(*id),
        |_| UNKNOWN_STAGE.to_string(),
    )
    .into_iter()
    .map(Slot::into_value);

    products
        .into_iter()
        .map(|mut product| {
            let stage = match product.id {
                Some(_) => stages.next(),
                None => None,
            };
            product.current_stage = Some(stage.unwrap_or_else(|| UNKNOWN_STAGE.to_string()));
            product
        })
        .collect()
}

/// The material catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialCatalog {
    materials: Vec<Material>,
}

impl MaterialCatalog {
    pub fn new(materials: Vec<Material>) -> Self {
        Self { materials }
    }

    pub fn fetch(backend: &dyn Backend) -> Result<Self, ApiError> {
        Ok(Self::new(backend.list_materials()?))
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn get(&self, number: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.material_number == number)
    }

    pub fn contains(&self, number: &str) -> bool {
        self.get(number).is_some()
    }

    /// Materials whose number or description contains `needle`, ignoring case
    pub fn search(&self, needle: &str) -> Vec<&Material> {
        self.materials
            .iter()
            .filter(|m| m.matches_search(needle))
            .collect()
    }

    pub fn upsert(&mut self, material: Material) -> &Material {
        match self
            .materials
            .iter()
            .position(|m| m.material_number == material.material_number)
        {
            Some(index) => {
                self.materials[index] = material;
                &self.materials[index]
            }
            None => {
                self.materials.push(material);
                &self.materials[self.materials.len() - 1]
            }
        }
    }

    pub fn remove(&mut self, number: &str) -> Option<Material> {
        let index = self
            .materials
            .iter()
            .position(|m| m.material_number == number)?;
        Some(self.materials.remove(index))
    }
}

/// User accounts (administrators only)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    pub fn fetch(backend: &dyn Backend) -> Result<Self, ApiError> {
        Ok(Self::new(backend.list_users()?))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn get(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    /// Look a user up by ID or username
    pub fn find(&self, key: &str) -> Option<&User> {
        match key.parse::<i64>() {
            Ok(id) => self.get(id),
            Err(_) => self.users.iter().find(|u| u.username == key),
        }
    }

    pub fn remove(&mut self, id: i64) -> Option<User> {
        let index = self.users.iter().position(|u| u.id == id)?;
        Some(self.users.remove(index))
    }
}
