//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used throughout DcNS. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every rejected operation maps to exactly one [`DcnsError`] variant.
//! - A rejection aborts the whole operation. The ledger restores the state
//!   snapshot taken before the call, so no variant implies partial effects.
//! - Authorization errors carry the caller and the attempted action.
//! - State conflicts carry the operation name and the lifecycle reason.

use thiserror::Error;

use crate::address::Address;

/// Top-level operation error for DcNS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DcnsError {
    /// Caller lacks owner, operator, controller or administrator standing.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        /// The account that attempted the call.
        caller: Address,
        /// The attempted action.
        action: String,
    },

    /// Operation is invalid for the entity's current lifecycle state.
    #[error("{operation} rejected: {reason}")]
    StateConflict {
        /// The attempted operation.
        operation: String,
        /// Why the current state forbids it.
        reason: String,
    },

    /// Attached payment (or available balance) is below the required amount.
    #[error("insufficient payment: required {required}, provided {provided}")]
    InsufficientPayment {
        /// Amount required.
        required: u128,
        /// Amount attached.
        provided: u128,
    },

    /// Malformed input: invalid label, zero-length input, overflowing duration.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An account attempted to approve itself as its own operator.
    #[error("{account}: setting approval status for self")]
    SelfApproval {
        /// The account that tried to approve itself.
        account: Address,
    },
}

impl DcnsError {
    /// Shorthand for [`DcnsError::Unauthorized`].
    pub fn unauthorized(caller: Address, action: impl Into<String>) -> Self {
        Self::Unauthorized {
            caller,
            action: action.into(),
        }
    }

    /// Shorthand for [`DcnsError::StateConflict`].
    pub fn conflict(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StateConflict {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
