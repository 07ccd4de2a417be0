//! Entity types - client-side projections of backend resources

pub mod material;
pub mod product;
pub mod stage;
pub mod user;

pub use material::{is_valid_material_number, Material};
pub use product::{Bom, BomMaterial, Product};
pub use stage::{Stage, StageHistoryRecord, UNKNOWN_STAGE};
pub use user::{AuthResponse, Role, RoleName, User, UserProfile};

use serde::{Deserialize, Deserializer};

/// Deserialize a field that the backend may send as `null` into its default value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
