//! Domain utilities

pub mod validation;

pub use validation::{mask_token, normalize_nip, truncate_description, validate_api_token};
