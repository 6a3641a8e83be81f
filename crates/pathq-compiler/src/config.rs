//! Compiler configuration.

use crate::{CompileError, Result};

/// Knobs for one compilation pass.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Width of the `path_tag` header field.
    pub tag_bits: u8,
    /// Check symbol disjointness and cover soundness before building automata.
    pub verify_partition: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            tag_bits: 12,
            verify_partition: true,
        }
    }
}

impl CompilerConfig {
    pub const MAX_TAG_BITS: u8 = 32;

    pub fn validate(&self) -> Result<()> {
        if self.tag_bits == 0 || self.tag_bits > Self::MAX_TAG_BITS {
            return Err(CompileError::InvalidConfig(format!(
                "tag_bits must be between 1 and {}, got {}",
                Self::MAX_TAG_BITS,
                self.tag_bits
            )));
        }
        Ok(())
    }

    /// Largest tag value the field can carry.
    pub fn max_tag(&self) -> u64 {
        (1u64 << self.tag_bits) - 1
    }
}
