//! Unique identifier types for trading entities
//!
//! All IDs use UUID v7 for time-sortable ordering, enabling efficient
//! chronological queries and replay.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new id with an embedded current timestamp.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an order.
    OrderId
);

define_id!(
    /// Unique identifier for an executed trade.
    TradeId
);

define_id!(
    /// Unique identifier for a user account.
    UserId
);

define_id!(
    /// Unique identifier for a binary market.
    MarketId
);

define_id!(
    /// Unique identifier for a ledger transaction entry.
    EntryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(OrderId::new(), OrderId::new());
        assert_ne!(TradeId::new(), TradeId::new());
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(MarketId::new(), MarketId::new());
    }

    #[test]
    fn test_id_serialization_roundtrip() {
        let id = OrderId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_v7_ids_sort_by_creation_time() {
        let first = EntryId::new();
        let second = EntryId::new();
        assert!(first <= second, "v7 ids should be time-ordered");
    }
}
