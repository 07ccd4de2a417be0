//! Core module - client state, backend access and domain logic

pub mod analytics;
pub mod api;
pub mod collection;
pub mod config;
pub mod editor;
pub mod fanout;
pub mod filter;
pub mod notice;
pub mod session;

pub use api::{ApiError, Backend, HttpBackend};
pub use collection::{MaterialCatalog, ProductCollection, UserDirectory};
pub use config::{Config, ConfigError};
pub use editor::{Confirmed, EditorError, ValidationError};
pub use filter::{Bounds, ProductFilter};
pub use notice::{Level, Notice};
pub use session::{Session, SessionError, SessionStore, View};
