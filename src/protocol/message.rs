use crate::error::{KvError, MSG_SUCCESS, Result};
use serde::{Deserialize, Serialize};

/// Requests understood by coordinators and replicas.
///
/// - `Get/Put/Del`: Single-key client operations. Sent to a replica as part of 2PC,
///   `Put` and `Del` are vote requests.
/// - `Register`: A replica announcing itself to the coordinator.
/// - `Info`: Liveness and membership report.
/// - `Commit/Abort`: Phase-two decision broadcast by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    Get { key: String },
    Put { key: String, value: String },
    Del { key: String },
    Register { host: String, port: u16 },
    Info,
    Commit,
    Abort,
}

impl Request {
    pub fn get(key: impl Into<String>) -> Self {
        Request::Get { key: key.into() }
    }

    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Request::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn del(key: impl Into<String>) -> Self {
        Request::Del { key: key.into() }
    }

    /// Key the request operates on, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Request::Get { key } | Request::Put { key, .. } | Request::Del { key } => Some(key),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Request::Get { .. } => "GET",
            Request::Put { .. } => "PUT",
            Request::Del { .. } => "DEL",
            Request::Register { .. } => "REGISTER",
            Request::Info => "INFO",
            Request::Commit => "COMMIT",
            Request::Abort => "ABORT",
        }
    }
}

/// Replies to a [`Request`]. Every request gets exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Resp { message: String },
    GetResp { key: String, value: String },
    VoteCommit,
    VoteAbort { message: String },
    Ack,
}

impl Response {
    pub fn success() -> Self {
        Response::Resp {
            message: MSG_SUCCESS.to_string(),
        }
    }

    pub fn error(err: &KvError) -> Self {
        Response::Resp {
            message: err.to_string(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Response::Resp { message } | Response::VoteAbort { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.message() == Some(MSG_SUCCESS)
    }
}

impl From<KvError> for Response {
    fn from(err: KvError) -> Self {
        Response::error(&err)
    }
}

impl From<Result<()>> for Response {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Response::success(),
            Err(e) => Response::error(&e),
        }
    }
}

/// First line of an INFO reply, e.g. `TIMESTAMP: Mon Oct 19 14:02:11 2026`.
pub fn info_header() -> String {
    format!(
        "TIMESTAMP: {}",
        chrono::Local::now().format("%a %b %e %H:%M:%S %Y")
    )
}
