//! Remote Service Catalog
//!
//! A thin catalog of Billow endpoint definitions. Each method prepares
//! exactly one [`RequestTask`](crate::request::RequestTask) against the
//! configured base address and returns it unsent; no business logic lives
//! here.

pub mod service;
pub mod types;

pub use service::RemoteService;
pub use types::{MediaUpload, Profile, RegistrationForm, Statistics, WallPost};
