//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `DetailId` where a
//! `CodeNodeId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(OrganizationId, "Unique identifier for an organization.");
typed_id!(UserId, "Unique identifier for a user (audit fields only).");
typed_id!(
    CodeNodeId,
    "Unique identifier for a chart-of-accounts hierarchy node."
);
typed_id!(DetailId, "Unique identifier for a detail catalogue entry.");
typed_id!(DetailLinkId, "Unique identifier for a detail-to-node link.");
typed_id!(FiscalYearId, "Unique identifier for a fiscal year.");
typed_id!(JournalId, "Unique identifier for a journal.");
typed_id!(JournalItemId, "Unique identifier for a journal line item.");
typed_id!(BankId, "Unique identifier for a bank.");
typed_id!(BankAccountId, "Unique identifier for a bank account.");
typed_id!(CardReaderId, "Unique identifier for a card reader.");
typed_id!(CashboxId, "Unique identifier for a cashbox.");
typed_id!(CheckbookId, "Unique identifier for a checkbook.");
typed_id!(CheckId, "Unique identifier for a check.");
typed_id!(ReceiptId, "Unique identifier for a treasury receipt.");
typed_id!(PaymentId, "Unique identifier for a treasury payment.");
