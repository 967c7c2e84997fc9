//! Element type codes accepted by the typed bit-shuffle API.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ElementSize;

/// The logical element type of a bit-shuffled buffer. Only the byte width
/// matters to the transform; the variants exist so callers can name their data.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BitShuffleType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl BitShuffleType {
    pub fn type_size(&self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Long | Self::Double => 8,
        }
    }

    pub fn element_size(&self) -> ElementSize {
        ElementSize::from_type(*self)
    }
}

impl fmt::Display for BitShuffleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Byte => "BYTE",
            Self::Short => "SHORT",
            Self::Int => "INT",
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
        };
        write!(f, "{}", s)
    }
}
