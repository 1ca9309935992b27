use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fabrication progress of a node, layer or element.
///
/// Progress only moves forward through [`mark_planned`](Self::mark_planned)
/// and [`mark_placed`](Self::mark_placed); [`reset`](Self::reset) is the only
/// way back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FabricationState {
    #[default]
    Unplanned,
    Planned,
    Placed,
}

impl FabricationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unplanned => "unplanned",
            Self::Planned => "planned",
            Self::Placed => "placed",
        }
    }

    pub fn is_planned(&self) -> bool {
        matches!(self, Self::Planned | Self::Placed)
    }

    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Placed)
    }

    /// Move to `Planned`. Fails once the item has been placed.
    pub fn mark_planned(&mut self) -> Result<()> {
        self.advance(Self::Planned)
    }

    /// Move to `Placed`, from either earlier state.
    pub fn mark_placed(&mut self) -> Result<()> {
        self.advance(Self::Placed)
    }

    pub fn reset(&mut self) {
        *self = Self::Unplanned;
    }

    fn advance(&mut self, to: Self) -> Result<()> {
        if (to as u8) < (*self as u8) {
            return Err(Error::InvalidTransition {
                from: self.as_str(),
                to: to.as_str(),
            });
        }
        *self = to;
        Ok(())
    }
}

impl std::fmt::Display for FabricationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
