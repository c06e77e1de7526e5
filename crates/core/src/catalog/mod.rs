//! Chart-of-accounts hierarchy and the detail catalogue.
//!
//! This module implements the account classification rules:
//! - Hierarchy kinds (group → general → specific) and their parent rules
//! - The global four-digit detail catalogue
//! - Leaf-only detail linking
//! - Free-code scanning for detail code suggestion and allocation

pub mod codes;
pub mod error;
pub mod rules;
pub mod types;

#[cfg(test)]
mod codes_props;

pub use codes::{MAX_CODE_ALLOCATION_ATTEMPTS, format_code, next_free_code};
pub use error::CatalogError;
pub use rules::{validate_detail_code, validate_link_target, validate_parent};
pub use types::{AccountNature, CodeKind, DetailKind};
