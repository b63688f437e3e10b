//! Interned identifiers for nodes, edges, and groups.
//!
//! All ids share one global interner: comparisons and hashing are O(1)
//! on a 4-byte `Spur`, and the backing strings live for the process
//! lifetime, so ids stay `Copy` across snapshots.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner shared by every id kind.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

macro_rules! interned_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing id if
            /// the string was interned before.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a unique id (e.g. `node_4`). Counter is
            /// process-wide, so freshly minted ids never collide.
            pub fn fresh() -> Self {
                use std::sync::atomic::{AtomicU64, Ordering};
                static COUNTER: AtomicU64 = AtomicU64::new(0);
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                Self::intern(&format!(concat!($prefix, "_{}"), n))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a workflow node.
    NodeId,
    "node"
);

interned_id!(
    /// Identifier of an edge between two node handles.
    EdgeId,
    "edge"
);

interned_id!(
    /// Identifier of a named node group.
    GroupId,
    "group"
);
