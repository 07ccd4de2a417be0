//! Entity editors
//!
//! An editor holds a draft copy of one entity. Fields change through typed
//! updates, the draft is validated as a whole, and a successful submit
//! replaces the local collection entry with what the backend returned.
//! Deletes need a [`Confirmed`] token and only touch the local collection
//! after the backend accepted them.

use std::collections::BTreeSet;
use thiserror::Error;
use tracing::info;

use crate::core::api::{ApiError, Backend};
use crate::core::collection::{MaterialCatalog, ProductCollection, UserDirectory};
use crate::entities::product::{Bom, BomMaterial, DEFAULT_UNIT, NEW_BOM_NAME};
use crate::entities::{is_valid_material_number, Material, Product, Role, RoleName, User};

/// Product name length bounds
pub const NAME_LEN: (usize, usize) = (3, 50);
/// Product description length bounds
pub const DESCRIPTION_LEN: (usize, usize) = (5, 200);
/// Unit-of-measure code length bounds
pub const UNIT_LEN: (usize, usize) = (1, 20);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("Material number must be 'M' followed by exactly 4 digits (e.g. M1234), got '{0}'")]
    MaterialNumber(String),

    #[error("Material {0} already exists")]
    DuplicateMaterial(String),

    #[error("BOM line {line}: quantity must be at least 1")]
    Quantity { line: usize },

    #[error("BOM line {line}: unit of measure must be between 1 and 20 characters")]
    Unit { line: usize },

    #[error("BOM line {line}: invalid material number '{number}'")]
    LineMaterial { line: usize, number: String },

    #[error("No BOM line {0}")]
    NoSuchLine(usize),
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Proof that the user confirmed a destructive action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmed(());

impl Confirmed {
    /// `Some` only when the user answered yes
    pub fn from_answer(yes: bool) -> Option<Self> {
        yes.then_some(Confirmed(()))
    }
}

fn check_len(field: &'static str, value: &str, (min, max): (usize, usize)) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    // NaN is rejected as well
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Negative { field })
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Editable product fields
#[derive(Debug, Clone, PartialEq)]
pub enum ProductField {
    Name(String),
    Description(String),
    Height(f64),
    Width(f64),
    Weight(f64),
    BomName(String),
}

/// Editable fields of one BOM line
#[derive(Debug, Clone, PartialEq)]
pub enum BomLineField {
    Quantity(u32),
    Unit(String),
    Material(Material),
}

/// Draft of a product being created or edited
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    product: Product,
}

impl Default for ProductDraft {
    fn default() -> Self {
        Self::create()
    }
}

impl ProductDraft {
    /// Empty draft for a new product
    pub fn create() -> Self {
        Self {
            product: Product::default(),
        }
    }

    /// Draft seeded from an existing product
    pub fn edit(product: &Product) -> Self {
        Self {
            product: product.clone(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.product.id.is_none()
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn set(&mut self, field: ProductField) -> &mut Self {
        let p = &mut self.product;
        match field {
            ProductField::Name(v) => p.name = v,
            ProductField::Description(v) => p.description = v,
            ProductField::Height(v) => p.estimated_height = v,
            ProductField::Width(v) => p.estimated_width = v,
            ProductField::Weight(v) => p.estimated_weight = v,
            ProductField::BomName(v) => p.bom.get_or_insert_with(|| Bom::new("")).name = v,
        }
        self
    }

    /// Append a BOM line for `material` (quantity 1, default unit)
    ///
    /// A BOM is created on first use.
    pub fn add_material(&mut self, material: Material) -> &mut Self {
        self.product
            .bom
            .get_or_insert_with(|| Bom::new(NEW_BOM_NAME))
            .bom_materials
            .push(BomMaterial::new(material, 1, DEFAULT_UNIT));
        self
    }

    fn line_mut(&mut self, index: usize) -> Result<&mut BomMaterial, ValidationError> {
        self.product
            .bom
            .as_mut()
            .and_then(|b| b.bom_materials.get_mut(index))
            .ok_or(ValidationError::NoSuchLine(index + 1))
    }

    /// Update a line, addressed by zero-based position
    pub fn set_line(&mut self, index: usize, field: BomLineField) -> Result<(), ValidationError> {
        let line = self.line_mut(index)?;
        match field {
            BomLineField::Quantity(q) => line.quantity = q,
            BomLineField::Unit(u) => line.unit_measure_code = u,
            BomLineField::Material(m) => line.material = m,
        }
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> Result<BomMaterial, ValidationError> {
        let bom = self
            .product
            .bom
            .as_mut()
            .filter(|b| index < b.bom_materials.len())
            .ok_or(ValidationError::NoSuchLine(index + 1))?;
        Ok(bom.bom_materials.remove(index))
    }

    /// Check form rules; reports the first violation
    pub fn validate(&self) -> Result<(), ValidationError> {
        let p = &self.product;
        check_len("Name", &p.name, NAME_LEN)?;
        check_len("Description", &p.description, DESCRIPTION_LEN)?;
        check_non_negative("Height", p.estimated_height)?;
        check_non_negative("Width", p.estimated_width)?;
        check_non_negative("Weight", p.estimated_weight)?;

        for (i, line) in p.bom_lines().iter().enumerate() {
            let n = i + 1;
            if !is_valid_material_number(line.material_number()) {
                return Err(ValidationError::LineMaterial {
                    line: n,
                    number: line.material_number().to_string(),
                });
            }
            if line.quantity < 1 {
                return Err(ValidationError::Quantity { line: n });
            }
            let unit_len = line.unit_measure_code.trim().chars().count();
            if unit_len < UNIT_LEN.0 || unit_len > UNIT_LEN.1 {
                return Err(ValidationError::Unit { line: n });
            }
        }
        Ok(())
    }

    /// Validate, write the whole product and adopt the server's response
    pub fn submit(
        self,
        backend: &dyn Backend,
        products: &mut ProductCollection,
    ) -> Result<Product, EditorError> {
        self.validate()?;
        let payload = self.product.to_payload();
        let saved = match self.product.id {
            Some(id) => backend.update_product(id, &payload)?,
            None => backend.create_product(&payload)?,
        };
        info!("saved product {}", saved.id_or_default());
        Ok(products.upsert(saved).clone())
    }
}

/// Delete a product after confirmation
pub fn delete_product(
    backend: &dyn Backend,
    products: &mut ProductCollection,
    id: i64,
    _confirmed: Confirmed,
) -> Result<(), ApiError> {
    backend.delete_product(id)?;
    products.remove(id);
    info!("deleted product {}", id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// Editable material fields; the number is fixed once created
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialField {
    Description(String),
    Width(Option<f64>),
    Height(Option<f64>),
    Weight(Option<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDraft {
    material: Material,
    is_new: bool,
}

impl MaterialDraft {
    pub fn create(number: impl Into<String>) -> Self {
        Self {
            material: Material::new(number, ""),
            is_new: true,
        }
    }

    pub fn edit(material: &Material) -> Self {
        Self {
            material: material.clone(),
            is_new: false,
        }
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set(&mut self, field: MaterialField) -> &mut Self {
        let m = &mut self.material;
        match field {
            MaterialField::Description(v) => m.material_description = v,
            MaterialField::Width(v) => m.width = v,
            MaterialField::Height(v) => m.height = v,
            MaterialField::Weight(v) => m.weight = v,
        }
        self
    }

    /// Field rules plus, for new materials, uniqueness within `catalog`
    pub fn validate(&self, catalog: &MaterialCatalog) -> Result<(), ValidationError> {
        let m = &self.material;
        if m.material_number.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "Material number",
            });
        }
        if !is_valid_material_number(&m.material_number) {
            return Err(ValidationError::MaterialNumber(m.material_number.clone()));
        }
        if m.material_description.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "Description",
            });
        }
        for (field, value) in [("Width", m.width), ("Height", m.height), ("Weight", m.weight)] {
            if let Some(v) = value {
                check_non_negative(field, v)?;
            }
        }
        if self.is_new && catalog.contains(&m.material_number) {
            return Err(ValidationError::DuplicateMaterial(m.material_number.clone()));
        }
        Ok(())
    }

    pub fn submit(
        self,
        backend: &dyn Backend,
        catalog: &mut MaterialCatalog,
    ) -> Result<Material, EditorError> {
        self.validate(catalog)?;
        let saved = if self.is_new {
            backend.create_material(&self.material)?
        } else {
            backend.update_material(&self.material.material_number, &self.material)?
        };
        info!("saved material {}", saved.material_number);
        Ok(catalog.upsert(saved).clone())
    }
}

/// Delete a material after confirmation
pub fn delete_material(
    backend: &dyn Backend,
    catalog: &mut MaterialCatalog,
    number: &str,
    _confirmed: Confirmed,
) -> Result<(), ApiError> {
    backend.delete_material(number)?;
    catalog.remove(number);
    info!("deleted material {}", number);
    Ok(())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Draft of a user's role assignment
#[derive(Debug, Clone, PartialEq)]
pub struct RolesDraft {
    user_id: i64,
    roles: BTreeSet<String>,
}

impl RolesDraft {
    pub fn edit(user: &User) -> Self {
        Self {
            user_id: user.id,
            roles: user.role_names().into_iter().collect(),
        }
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }

    pub fn grant(&mut self, role: RoleName) -> &mut Self {
        self.roles.insert(role.as_str().to_string());
        self
    }

    pub fn revoke(&mut self, role: RoleName) -> &mut Self {
        self.roles.remove(role.as_str());
        self
    }

    /// Replace the whole assignment
    pub fn assign(&mut self, roles: &[RoleName]) -> &mut Self {
        self.roles = roles.iter().map(|r| r.as_str().to_string()).collect();
        self
    }

    /// Send the assignment; returns the server's message
    ///
    /// The backend answers with a message rather than the user, so the local
    /// entry takes the submitted roles.
    pub fn submit(
        self,
        backend: &dyn Backend,
        users: &mut UserDirectory,
    ) -> Result<String, EditorError> {
        let roles: Vec<String> = self.roles.into_iter().collect();
        let message = backend.update_user_roles(self.user_id, &roles)?;
        if let Some(user) = users.get_mut(self.user_id) {
            user.roles = roles.into_iter().map(Role::new).collect();
        }
        info!("updated roles of user {}", self.user_id);
        Ok(message)
    }
}

/// Delete a user after confirmation
pub fn delete_user(
    backend: &dyn Backend,
    users: &mut UserDirectory,
    id: i64,
    _confirmed: Confirmed,
) -> Result<(), ApiError> {
    backend.delete_user(id)?;
    users.remove(id);
    info!("deleted user {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::api::fake::FakeBackend;

    fn valid_draft() -> ProductDraft {
        let mut draft = ProductDraft::create();
        draft
            .set(ProductField::Name("Bracket".into()))
            .set(ProductField::Description("Steel mounting bracket".into()))
            .set(ProductField::Height(5.0));
        draft
    }

    fn existing(id: i64) -> Product {
        let mut p = Product::new("Housing", "Aluminium housing");
        p.id = Some(id);
        p
    }

    #[test]
    fn test_product_validation() {
        assert_eq!(valid_draft().validate(), Ok(()));

        let mut draft = valid_draft();
        draft.set(ProductField::Name("ab".into()));
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::Length { field: "Name", .. })
        ));

        let mut draft = valid_draft();
        draft.set(ProductField::Description("   ".into()));
        assert_eq!(
            draft.validate(),
            Err(ValidationError::Required {
                field: "Description"
            })
        );

        let mut draft = valid_draft();
        draft.set(ProductField::Weight(-0.1));
        assert_eq!(
            draft.validate(),
            Err(ValidationError::Negative { field: "Weight" })
        );

        let mut draft = valid_draft();
        draft.set(ProductField::Width(f64::NAN));
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_bom_line_editing() {
        let mut draft = valid_draft();
        draft.add_material(Material::new("M0001", "Bolt"));
        draft.add_material(Material::new("M0002", "Nut"));

        let bom = draft.product().bom.as_ref().unwrap();
        assert_eq!(bom.name, NEW_BOM_NAME);
        assert_eq!(bom.bom_materials[0].quantity, 1);
        assert_eq!(bom.bom_materials[0].unit_measure_code, DEFAULT_UNIT);

        draft.set_line(1, BomLineField::Quantity(8)).unwrap();
        assert_eq!(draft.product().bom_lines()[1].quantity, 8);

        draft.set_line(0, BomLineField::Quantity(0)).unwrap();
        assert_eq!(draft.validate(), Err(ValidationError::Quantity { line: 1 }));

        let removed = draft.remove_line(0).unwrap();
        assert_eq!(removed.material_number(), "M0001");
        assert_eq!(draft.validate(), Ok(()));

        draft.set_line(0, BomLineField::Unit(String::new())).unwrap();
        assert_eq!(draft.validate(), Err(ValidationError::Unit { line: 1 }));

        assert_eq!(draft.remove_line(5), Err(ValidationError::NoSuchLine(6)));
        assert_eq!(
            ProductDraft::create().set_line(0, BomLineField::Quantity(2)),
            Err(ValidationError::NoSuchLine(1))
        );
    }

    #[test]
    fn test_create_adopts_server_representation() {
        let backend = FakeBackend::new();
        let mut products = ProductCollection::default();

        let mut draft = valid_draft();
        draft.set(ProductField::Description("  Padded description  ".into()));
        let saved = draft.submit(&backend, &mut products).unwrap();

        assert!(saved.id.is_some());
        assert_eq!(saved.description, "Padded description");
        assert_eq!(products.len(), 1);
        assert_eq!(products.products()[0], saved);
    }

    #[test]
    fn test_update_replaces_entry() {
        let backend = FakeBackend::new().with_product(existing(7), Some("CONCEPT"));
        let mut products = ProductCollection::new(vec![existing(7)]);

        let mut draft = ProductDraft::edit(products.get(7).unwrap());
        assert!(!draft.is_new());
        draft.set(ProductField::Name("Housing Mk2".into()));
        draft.submit(&backend, &mut products).unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products.get(7).unwrap().name, "Housing Mk2");
        assert_eq!(backend.stored_products()[0].name, "Housing Mk2");
    }

    #[test]
    fn test_invalid_draft_is_not_sent() {
        let backend = FakeBackend::new();
        let mut products = ProductCollection::default();
        let mut draft = valid_draft();
        draft.set(ProductField::Name(String::new()));

        let err = draft.submit(&backend, &mut products).unwrap_err();
        assert!(matches!(err, EditorError::Invalid(_)));
        assert!(backend.calls().is_empty());
        assert!(products.is_empty());
    }

    #[test]
    fn test_failed_update_leaves_collection_untouched() {
        let backend = FakeBackend::new().with_product(existing(7), None);
        backend.fail("update_product:7");
        let mut products = ProductCollection::new(vec![existing(7)]);

        let mut draft = ProductDraft::edit(&existing(7));
        draft.set(ProductField::Name("Renamed".into()));
        let err = draft.submit(&backend, &mut products).unwrap_err();

        assert!(matches!(err, EditorError::Api(_)));
        assert_eq!(products.get(7).unwrap().name, "Housing");
    }

    #[test]
    fn test_delete_requires_success() {
        assert_eq!(Confirmed::from_answer(false), None);

        let backend = FakeBackend::new().with_product(existing(1), None);
        let mut products = ProductCollection::new(vec![existing(1), existing(2)]);
        let yes = Confirmed::from_answer(true).unwrap();

        // Product 2 exists locally but not on the server
        assert!(delete_product(&backend, &mut products, 2, yes).is_err());
        assert_eq!(products.len(), 2);

        delete_product(&backend, &mut products, 1, yes).unwrap();
        assert_eq!(products.len(), 1);
        assert!(products.get(1).is_none());
    }

    #[test]
    fn test_material_validation() {
        let catalog = MaterialCatalog::new(vec![Material::new("M0001", "Bolt")]);

        let mut draft = MaterialDraft::create("M1234");
        draft.set(MaterialField::Description("Washer".into()));
        assert_eq!(draft.validate(&catalog), Ok(()));

        for bad in ["1234", "M123", "M12345"] {
            let mut draft = MaterialDraft::create(bad);
            draft.set(MaterialField::Description("Washer".into()));
            assert_eq!(
                draft.validate(&catalog),
                Err(ValidationError::MaterialNumber(bad.to_string()))
            );
        }

        let mut draft = MaterialDraft::create("M0001");
        draft.set(MaterialField::Description("Another bolt".into()));
        assert_eq!(
            draft.validate(&catalog),
            Err(ValidationError::DuplicateMaterial("M0001".into()))
        );

        let mut draft = MaterialDraft::edit(&Material::new("M0001", "Bolt"));
        draft.set(MaterialField::Height(Some(-2.0)));
        assert_eq!(
            draft.validate(&catalog),
            Err(ValidationError::Negative { field: "Height" })
        );
    }

    #[test]
    fn test_material_submit_and_delete() {
        let backend = FakeBackend::new().with_material(Material::new("M0001", "Bolt"));
        let mut catalog = MaterialCatalog::fetch(&backend).unwrap();

        let mut draft = MaterialDraft::edit(catalog.get("M0001").unwrap());
        draft.set(MaterialField::Description("Hex bolt".into()));
        draft.submit(&backend, &mut catalog).unwrap();
        assert_eq!(catalog.get("M0001").unwrap().material_description, "Hex bolt");

        let mut draft = MaterialDraft::create("M0002");
        draft.set(MaterialField::Description("Nut".into()));
        draft.submit(&backend, &mut catalog).unwrap();
        assert_eq!(catalog.materials().len(), 2);

        let yes = Confirmed::from_answer(true).unwrap();
        delete_material(&backend, &mut catalog, "M0001", yes).unwrap();
        assert!(!catalog.contains("M0001"));
    }

    #[test]
    fn test_roles_submit() {
        let user = User {
            id: 3,
            username: "carol".into(),
            email: "carol@example.com".into(),
            roles: vec![Role::new("ROLE_USER")],
        };
        let backend = FakeBackend::new().with_user(user.clone());
        let mut users = UserDirectory::new(vec![user.clone()]);

        let mut draft = RolesDraft::edit(&user);
        draft.grant(RoleName::Designer).revoke(RoleName::User);
        assert_eq!(draft.roles().collect::<Vec<_>>(), vec!["ROLE_DESIGNER"]);

        let message = draft.submit(&backend, &mut users).unwrap();
        assert_eq!(message, "Roles updated");
        assert_eq!(users.get(3).unwrap().role_names(), vec!["ROLE_DESIGNER"]);
        assert_eq!(backend.stored_users()[0].role_names(), vec!["ROLE_DESIGNER"]);
    }

    #[test]
    fn test_delete_user() {
        let user = User {
            id: 9,
            username: "erin".into(),
            email: String::new(),
            roles: Vec::new(),
        };
        let backend = FakeBackend::new().with_user(user.clone());
        let mut users = UserDirectory::new(vec![user]);
        let yes = Confirmed::from_answer(true).unwrap();

        delete_user(&backend, &mut users, 9, yes).unwrap();
        assert!(users.users().is_empty());
    }
}
