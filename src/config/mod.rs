// src/config/mod.rs
pub mod providers;

pub use providers::{load_providers_default, load_providers_from, ProviderConfig, Secret};
