//! Catalogue domain types.

use serde::{Deserialize, Serialize};

/// Level of a chart-of-accounts hierarchy node.
///
/// The hierarchy is strictly three-level: groups at the root, generals under
/// groups, specifics under generals. Postings reference specifics (and the
/// detail catalogue) only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    /// Top-level grouping; never has a parent.
    Group,
    /// Mid-level account; parent must be a group.
    General,
    /// Leaf-level account; parent must be a general.
    Specific,
}

impl CodeKind {
    /// Returns the kind a parent node must have, or `None` for root kinds.
    #[must_use]
    pub const fn required_parent(self) -> Option<Self> {
        match self {
            Self::Group => None,
            Self::General => Some(Self::Group),
            Self::Specific => Some(Self::General),
        }
    }

    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::General => "general",
            Self::Specific => "specific",
        }
    }
}

impl std::fmt::Display for CodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Natural balance side of an account node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountNature {
    /// Debit-normal account.
    Debit,
    /// Credit-normal account.
    Credit,
}

/// Origin of a detail catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    /// Created through the generic detail API.
    UserDefined,
    /// Created and owned by the treasury subsystem (handler details).
    /// Immutable and undeletable through the generic API.
    SystemManaged,
}

impl DetailKind {
    /// Returns true if the generic detail API may mutate this entry.
    #[must_use]
    pub const fn is_user_mutable(self) -> bool {
        matches!(self, Self::UserDefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_parent_chain() {
        assert_eq!(CodeKind::Group.required_parent(), None);
        assert_eq!(CodeKind::General.required_parent(), Some(CodeKind::Group));
        assert_eq!(
            CodeKind::Specific.required_parent(),
            Some(CodeKind::General)
        );
    }

    #[test]
    fn test_detail_kind_mutability() {
        assert!(DetailKind::UserDefined.is_user_mutable());
        assert!(!DetailKind::SystemManaged.is_user_mutable());
    }

    #[test]
    fn test_code_kind_display() {
        assert_eq!(CodeKind::Group.to_string(), "group");
        assert_eq!(CodeKind::Specific.to_string(), "specific");
    }
}
