//! Error types for tenant lifecycle operations

use crate::lifecycle::TenantOperation;
use crate::model::TenantStatus;
use thiserror::Error;

/// Lifecycle error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TenantError {
    /// The operation is not legal from the tenant's current status
    #[error("cannot {operation} tenant in {current} status")]
    InvalidStateTransition {
        /// Status the tenant was in when the operation was attempted
        current: TenantStatus,
        /// Attempted operation
        operation: TenantOperation,
    },

    /// Archive attempted on an archived tenant
    #[error("tenant is already archived")]
    AlreadyArchived,
}

/// Unrecognised string tag for one of the tenant enums
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Enum the tag was parsed for
    pub kind: &'static str,
    /// Offending input
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_message_names_status_and_operation() {
        let err = TenantError::InvalidStateTransition {
            current: TenantStatus::Active,
            operation: TenantOperation::Activate,
        };
        assert_eq!(err.to_string(), "cannot activate tenant in active status");
        assert_eq!(TenantError::AlreadyArchived.to_string(), "tenant is already archived");
    }
}
