//! Identifier newtypes for the QC data model.
//!
//! Every entity exchanged with the storage collaborator is identified by a
//! UUID. Wrapping them keeps the aggregate code honest about which id is
//! which: a mask id is never interchangeable with a channel id.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                $name(Uuid::new_v4())
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

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                $name(id)
            }
        }
    };
}

uuid_newtype! {
    /// Identity of a QcMask aggregate. Stable across all of its versions.
    MaskId
}

uuid_newtype! {
    /// Identity of the processing channel a mask or segment applies to.
    ChannelId
}

uuid_newtype! {
    /// Identity of an acquired channel segment (waveform sample block).
    SegmentId
}

uuid_newtype! {
    /// Opaque provenance stamp supplied by the caller and recorded on every
    /// created or mutated mask version. The engine never generates or
    /// validates these beyond carrying them through.
    CreationInfoId
}
