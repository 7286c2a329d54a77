//! Core error type

use focusguard_api::{ErrorCode, ErrorInfo};
use focusguard_host_api::HostError;
use focusguard_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No websites to block")]
    NoWebsitesToBlock,

    #[error("Incorrect verification phrase")]
    IncorrectPhrase,

    #[error("Invalid duration: {minutes} minutes (allowed 1-{max})")]
    InvalidDuration { minutes: u32, max: u32 },

    #[error("A focus session is already active")]
    SessionAlreadyActive,

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("A group named '{0}' already exists")]
    GroupExists(String),

    #[error("Predefined group '{0}' cannot be deleted")]
    GroupProtected(String),

    #[error("Invalid group: {0}")]
    InvalidGroup(String),

    #[error("No verification phrases configured")]
    NoPhrasesConfigured,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Rule table error: {0}")]
    RuleTable(#[source] HostError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[source] HostError),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Caller input was rejected; state is unchanged
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::NoWebsitesToBlock
                | CoreError::IncorrectPhrase
                | CoreError::InvalidDuration { .. }
                | CoreError::SessionAlreadyActive
                | CoreError::GroupNotFound(_)
                | CoreError::GroupExists(_)
                | CoreError::GroupProtected(_)
                | CoreError::InvalidGroup(_)
        )
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::NoWebsitesToBlock => ErrorCode::NoWebsitesToBlock,
            CoreError::IncorrectPhrase => ErrorCode::IncorrectPhrase,
            CoreError::InvalidDuration { .. } => ErrorCode::InvalidDuration,
            CoreError::SessionAlreadyActive => ErrorCode::SessionActive,
            CoreError::GroupNotFound(_) => ErrorCode::GroupNotFound,
            CoreError::GroupExists(_) => ErrorCode::GroupExists,
            CoreError::GroupProtected(_) => ErrorCode::GroupProtected,
            CoreError::InvalidGroup(_) => ErrorCode::InvalidGroup,
            CoreError::NoPhrasesConfigured => ErrorCode::InternalError,
            CoreError::Store(_) => ErrorCode::StoreError,
            CoreError::RuleTable(_) => ErrorCode::RuleTableError,
            CoreError::Scheduler(_) => ErrorCode::SchedulerError,
        }
    }

    /// Protocol form of this error
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_messages() {
        assert_eq!(CoreError::NoWebsitesToBlock.to_string(), "No websites to block");
        assert_eq!(
            CoreError::IncorrectPhrase.to_string(),
            "Incorrect verification phrase"
        );
    }

    #[test]
    fn validation_vs_io() {
        assert!(CoreError::IncorrectPhrase.is_validation());
        assert!(!CoreError::RuleTable(HostError::RuleTable("x".into())).is_validation());

        let info = CoreError::Store(StoreError::LockPoisoned).to_error_info();
        assert_eq!(info.code, ErrorCode::StoreError);
    }
}
