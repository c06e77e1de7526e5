//! Chart-code resolution chain.
//!
//! Each [`CodeSlot`] resolves through three tiers:
//!
//! 1. an explicit identifier override from configuration, verified to exist;
//! 2. a named settings record holding a code reference, verified likewise;
//! 3. a literal fallback code looked up by value.
//!
//! A tier that produces a dangling reference is skipped rather than fatal;
//! only when no tier resolves does the chain fail with `MissingCodeMapping`,
//! which signals an operator setup gap.

use daftar_shared::types::CodeNodeId;

use super::error::PostingError;
use super::types::{CodeSlot, VoucherKind};

/// Resolves the chart code for one slot.
///
/// Lookups are injected so this stays database-free:
/// - `verify_exists` - whether a code node id exists (and is active)
/// - `setting_code` - code reference stored under a settings name, if any
/// - `code_by_value` - code node id for a literal account code, if any
///
/// # Errors
///
/// Returns `MissingCodeMapping` when no tier resolves.
pub fn resolve_code<V, S, L>(
    slot: CodeSlot,
    kind: VoucherKind,
    override_id: Option<CodeNodeId>,
    verify_exists: V,
    setting_code: S,
    code_by_value: L,
) -> Result<CodeNodeId, PostingError>
where
    V: Fn(CodeNodeId) -> bool,
    S: Fn(&str) -> Option<CodeNodeId>,
    L: Fn(&str) -> Option<CodeNodeId>,
{
    // Tier 1: explicit override.
    if let Some(id) = override_id
        && verify_exists(id)
    {
        return Ok(id);
    }

    // Tier 2: named settings record.
    if let Some(id) = setting_code(slot.setting_key(kind))
        && verify_exists(id)
    {
        return Ok(id);
    }

    // Tier 3: literal fallback code.
    if let Some(id) = code_by_value(slot.fallback_code(kind)) {
        return Ok(id);
    }

    Err(PostingError::MissingCodeMapping(slot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let override_id = CodeNodeId::new();
        let resolved = resolve_code(
            CodeSlot::Cash,
            VoucherKind::Receipt,
            Some(override_id),
            |_| true,
            |_| Some(CodeNodeId::new()),
            |_| Some(CodeNodeId::new()),
        )
        .unwrap();
        assert_eq!(resolved, override_id);
    }

    #[test]
    fn test_dangling_override_falls_through_to_setting() {
        let setting_id = CodeNodeId::new();
        let resolved = resolve_code(
            CodeSlot::Card,
            VoucherKind::Receipt,
            Some(CodeNodeId::new()),
            move |id| id == setting_id,
            move |_| Some(setting_id),
            |_| None,
        )
        .unwrap();
        assert_eq!(resolved, setting_id);
    }

    #[test]
    fn test_setting_consulted_by_key() {
        let setting_id = CodeNodeId::new();
        let resolved = resolve_code(
            CodeSlot::Check,
            VoucherKind::Payment,
            None,
            |_| true,
            move |key| (key == "treasury.payment.check_code").then_some(setting_id),
            |_| None,
        )
        .unwrap();
        assert_eq!(resolved, setting_id);
    }

    #[test]
    fn test_literal_fallback() {
        let literal_id = CodeNodeId::new();
        let resolved = resolve_code(
            CodeSlot::Counterparty,
            VoucherKind::Receipt,
            None,
            |_| false,
            |_| None,
            move |value| (value == "1105").then_some(literal_id),
        )
        .unwrap();
        assert_eq!(resolved, literal_id);
    }

    #[test]
    fn test_nothing_resolves() {
        let result = resolve_code(
            CodeSlot::Transfer,
            VoucherKind::Payment,
            None,
            |_| false,
            |_| None,
            |_| None,
        );
        assert!(matches!(
            result,
            Err(PostingError::MissingCodeMapping(CodeSlot::Transfer))
        ));
    }
}
