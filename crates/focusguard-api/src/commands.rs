//! Command types for the focusguard protocol

use focusguard_util::ClientId;
use serde::{Deserialize, Serialize};

use crate::{
    BlocklistEntry, BlocklistItem, CustomContent, Group, HealthStatus, Session, Stats,
    API_VERSION,
};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper: `{success: true, payload}` or `{success: false, error}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ResponsePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            success: false,
            payload: None,
            error: Some(error),
        }
    }

    /// Split into the payload or the error the service reported
    pub fn into_result(self) -> Result<ResponsePayload, ErrorInfo> {
        match (self.success, self.payload, self.error) {
            (true, Some(payload), _) => Ok(payload),
            (_, _, Some(error)) => Err(error),
            _ => Err(ErrorInfo::new(
                ErrorCode::InternalError,
                "Malformed response from service",
            )),
        }
    }
}

/// Error information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    NoWebsitesToBlock,
    IncorrectPhrase,
    InvalidDuration,
    SessionActive,
    GroupNotFound,
    GroupExists,
    GroupProtected,
    InvalidGroup,
    StoreError,
    RuleTableError,
    SchedulerError,
    RateLimited,
    InternalError,
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Start a focus session
    StartSession {
        /// Minutes
        duration: u32,
        #[serde(rename = "isHardMode", default)]
        is_hard_mode: bool,
    },

    /// Stop the current session early
    StopSession {
        #[serde(rename = "verificationPhrase", default)]
        verification_phrase: Option<String>,
    },

    /// Replace the flat blocklist
    UpdateBlocklist { blocklist: Vec<BlocklistItem> },

    /// Resynchronize after the group list changed
    UpdateBlockGroups {
        #[serde(default)]
        websites: Vec<String>,
    },

    GetSessionStatus,

    GetVerificationPhrase,

    GetStats,

    GetBlocklist,

    ListGroups,

    CreateGroup {
        name: String,
        websites: Vec<String>,
        /// Minutes; defaults to 60
        #[serde(rename = "timeLimit", default)]
        time_limit: Option<u32>,
    },

    ToggleGroup { name: String },

    DeleteGroup { name: String },

    GetCustomContent,

    SetCustomContent { content: CustomContent },

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    UnsubscribeEvents,

    GetHealth,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    Session { session: Session },
    Phrase { phrase: Option<String> },
    Stopped,
    Updated,
    Stats { stats: Stats },
    Blocklist { blocklist: Vec<BlocklistEntry> },
    Groups { groups: Vec<Group> },
    GroupCreated { group: Group },
    GroupToggled { name: String, active: bool },
    GroupDeleted { name: String },
    CustomContent { content: CustomContent },
    Subscribed { client_id: ClientId },
    Unsubscribed,
    Health(HealthStatus),
    Pong,
}

/// Client connection info (set by IPC layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: ClientId,
    /// Unix UID if available
    pub uid: Option<u32>,
}

impl ClientInfo {
    pub fn new() -> Self {
        Self {
            client_id: ClientId::new(),
            uid: None,
        }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new()
    }
}
