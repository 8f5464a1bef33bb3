use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(SubcommitteeId);
id_newtype!(ResolutionId);
id_newtype!(ActorId);

/// Opaque handle for an editor row. Independent of the subcommittee the row
/// points at, since a row may not have one yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcommittee {
    pub id: SubcommitteeId,
    pub name: String,
}

impl Subcommittee {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: SubcommitteeId(id),
            name: name.into(),
        }
    }
}

/// The authenticated user an editing session acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: ActorId,
    pub role: Role,
}

impl ActorContext {
    pub fn new(actor_id: ActorId, role: Role) -> Self {
        Self { actor_id, role }
    }
}
