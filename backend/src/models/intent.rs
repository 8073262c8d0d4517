//! Transfer intent
//!
//! Each container-resource pair carries exactly one directive chosen by
//! the intent-selection collaborator (UI or persisted settings). The core
//! only reads it.

use serde::{Deserialize, Serialize};

/// Per container-resource transfer directive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferIntent {
    /// No directive; joins balancing only when the resource has auto-balance on
    #[default]
    None,

    /// Pull from donors (`None`, `Out`, `Dump`) up to the flow budget
    In,

    /// Push to recipients (`None`, `In`) up to the flow budget
    Out,

    /// Jettison up to the flow budget; mass leaves the system
    Dump,

    /// Participate in equalization
    Balance,
}

impl TransferIntent {
    /// Intents executed by the directed transfer engine
    pub fn is_directed(self) -> bool {
        matches!(self, Self::In | Self::Out | Self::Dump)
    }

    /// May give to a `TransferIn` target
    pub fn can_donate(self) -> bool {
        matches!(self, Self::None | Self::Out | Self::Dump)
    }

    /// May receive from a `TransferOut` source
    pub fn can_receive(self) -> bool {
        matches!(self, Self::None | Self::In)
    }

    /// Joins the balance subset given the working set's auto-balance flag
    pub fn joins_balance(self, auto_balance: bool) -> bool {
        match self {
            Self::Balance => true,
            Self::None => auto_balance,
            _ => false,
        }
    }
}
