//! Catalogue error types.

use daftar_shared::AppError;
use daftar_shared::types::{CodeNodeId, DetailId};
use thiserror::Error;

use super::types::CodeKind;

/// Errors that can occur during catalogue operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The node's kind does not match its parent (or absence of one).
    #[error("Invalid parent for {kind} node: expected {expected}, got {actual}")]
    InvalidParent {
        /// Kind of the node being created or moved.
        kind: CodeKind,
        /// Required parent kind, or "none" for root kinds.
        expected: String,
        /// What was actually supplied.
        actual: String,
    },

    /// Code already exists in the organization's node namespace.
    #[error("Code '{0}' already exists")]
    DuplicateCode(String),

    /// Detail code already exists in the organization.
    #[error("Detail code '{0}' already exists")]
    DuplicateDetailCode(String),

    /// Detail code must be exactly four digits.
    #[error("Detail code '{0}' must be exactly four digits")]
    InvalidDetailCode(String),

    /// Details attach to leaf nodes only.
    #[error("Node {0} has children; details attach to leaf nodes only")]
    MustBeLeaf(CodeNodeId),

    /// Node has child nodes and cannot be deleted.
    #[error("Node {0} has children and cannot be deleted")]
    HasChildren(CodeNodeId),

    /// Node or detail is referenced by journal items or links.
    #[error("{entity} {id} is referenced and cannot be deleted")]
    InUse {
        /// "node" or "detail".
        entity: &'static str,
        /// The referenced record's id.
        id: String,
    },

    /// System-managed details reject mutation through the generic API.
    #[error("Detail {0} is system-managed and cannot be modified here")]
    SystemManaged(DetailId),

    /// No free four-digit code remains in the scanned range.
    #[error("No free detail code available from offset {offset}")]
    NoCodesAvailable {
        /// First candidate code that was scanned.
        offset: u16,
    },

    /// Node not found.
    #[error("Node not found: {0}")]
    NodeNotFound(CodeNodeId),

    /// Detail not found.
    #[error("Detail not found: {0}")]
    DetailNotFound(DetailId),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match &err {
            CatalogError::InvalidDetailCode(_) => Self::Validation(err.to_string()),
            CatalogError::InvalidParent { .. } | CatalogError::MustBeLeaf(_) => {
                Self::Invariant(err.to_string())
            }
            CatalogError::DuplicateCode(_)
            | CatalogError::DuplicateDetailCode(_)
            | CatalogError::HasChildren(_)
            | CatalogError::InUse { .. } => Self::Conflict(err.to_string()),
            CatalogError::SystemManaged(_) => Self::Forbidden(err.to_string()),
            CatalogError::NoCodesAvailable { .. } => Self::Configuration(err.to_string()),
            CatalogError::NodeNotFound(_) | CatalogError::DetailNotFound(_) => {
                Self::NotFound(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = CatalogError::InvalidDetailCode("12a4".into()).into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err: AppError = CatalogError::DuplicateCode("101".into()).into();
        assert_eq!(err.error_code(), "CONFLICT");

        let err: AppError = CatalogError::SystemManaged(DetailId::new()).into();
        assert_eq!(err.error_code(), "FORBIDDEN");

        let err: AppError = CatalogError::NoCodesAvailable { offset: 6001 }.into();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_must_be_leaf_display() {
        let id = CodeNodeId::new();
        let msg = CatalogError::MustBeLeaf(id).to_string();
        assert!(msg.contains("leaf"));
        assert!(msg.contains(&id.to_string()));
    }
}
