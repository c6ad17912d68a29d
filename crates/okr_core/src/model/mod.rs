//! OKR domain model.
//!
//! # Responsibility
//! - Define objectives, key results and initiatives plus their input drafts.
//! - Normalize and validate client input before it reaches storage.
//!
//! # Invariants
//! - Every entity is identified by a stable v4 UUID that is never reused.
//! - `progress` fields are derived; drafts have no way to set them.
//! - Deletion is a tombstone kept by storage, never visible in this model.

use std::fmt::{Display, Formatter};

pub mod generation;
pub mod initiative;
pub mod key_result;
pub mod objective;
pub mod tree;
pub mod validation;

/// Entity family, used to tag not-found and validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Objective,
    KeyResult,
    Initiative,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Objective => "objective",
            Self::KeyResult => "key_result",
            Self::Initiative => "initiative",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Objective => "objective",
            Self::KeyResult => "key result",
            Self::Initiative => "initiative",
        };
        f.write_str(label)
    }
}
