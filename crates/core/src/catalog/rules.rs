//! Business rule validation for catalogue operations.

use daftar_shared::types::CodeNodeId;

use super::error::CatalogError;
use super::types::CodeKind;

/// Validates a node's kind against its (prospective) parent.
///
/// The rule is positional: groups have no parent, generals sit under groups,
/// specifics under generals. Updates re-validate against the *next* state,
/// so this takes the parent kind the node would have after the change.
///
/// # Errors
///
/// Returns `InvalidParent` when the kind/parent combination is not allowed.
pub fn validate_parent(
    kind: CodeKind,
    parent_kind: Option<CodeKind>,
) -> Result<(), CatalogError> {
    if kind.required_parent() == parent_kind {
        return Ok(());
    }

    let describe = |k: Option<CodeKind>| match k {
        Some(k) => k.as_str().to_string(),
        None => "none".to_string(),
    };

    Err(CatalogError::InvalidParent {
        kind,
        expected: describe(kind.required_parent()),
        actual: describe(parent_kind),
    })
}

/// Validates a detail code: exactly four ASCII digits.
///
/// # Errors
///
/// Returns `InvalidDetailCode` otherwise.
pub fn validate_detail_code(code: &str) -> Result<(), CatalogError> {
    if code.len() == 4 && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CatalogError::InvalidDetailCode(code.to_string()))
    }
}

/// Validates that a node is a valid detail-link target: a leaf.
///
/// # Errors
///
/// Returns `MustBeLeaf` when the node has children.
pub fn validate_link_target(node_id: CodeNodeId, child_count: u64) -> Result<(), CatalogError> {
    if child_count == 0 {
        Ok(())
    } else {
        Err(CatalogError::MustBeLeaf(node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CodeKind::Group, None, true)]
    #[case(CodeKind::Group, Some(CodeKind::Group), false)]
    #[case(CodeKind::General, Some(CodeKind::Group), true)]
    #[case(CodeKind::General, None, false)]
    #[case(CodeKind::General, Some(CodeKind::General), false)]
    #[case(CodeKind::Specific, Some(CodeKind::General), true)]
    #[case(CodeKind::Specific, Some(CodeKind::Group), false)]
    #[case(CodeKind::Specific, None, false)]
    fn test_parent_rule(
        #[case] kind: CodeKind,
        #[case] parent: Option<CodeKind>,
        #[case] ok: bool,
    ) {
        assert_eq!(validate_parent(kind, parent).is_ok(), ok);
    }

    #[test]
    fn test_invalid_parent_message_names_both_sides() {
        let err = validate_parent(CodeKind::Specific, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("specific"));
        assert!(msg.contains("general"));
        assert!(msg.contains("none"));
    }

    #[rstest]
    #[case("0001", true)]
    #[case("9999", true)]
    #[case("0000", true)]
    #[case("123", false)]
    #[case("12345", false)]
    #[case("12a4", false)]
    #[case("", false)]
    #[case("۱۲۳۴", false)] // non-ASCII digits
    fn test_detail_code_format(#[case] code: &str, #[case] ok: bool) {
        assert_eq!(validate_detail_code(code).is_ok(), ok);
    }

    #[test]
    fn test_link_target_leaf_rule() {
        let id = CodeNodeId::new();
        assert!(validate_link_target(id, 0).is_ok());
        assert!(matches!(
            validate_link_target(id, 3),
            Err(CatalogError::MustBeLeaf(_))
        ));
    }
}
