//! Wire records and routes for the script session service.
//!
//! The service is addressed with plain HTTP requests below
//! `/{context}/script/`. Session lifecycle calls use JSON or plain-text
//! bodies as described on each route.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Script engine extension addressed by every session route.
pub const ENGINE: &str = "py";

/// Path segment mounted under the context path.
pub const SCRIPT_ROOT: &str = "script";

/// HTTP methods used by the session protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a resource (list sessions, bind a session).
    Get,
    /// Create a session.
    Post,
    /// Evaluate code in a session.
    Put,
}

impl Method {
    /// Returns the method token as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-assigned identifier of an interpreter session.
///
/// Ids are always positive; the client never generates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw id, rejecting zero.
    pub fn new(raw: u64) -> Result<Self> {
        if raw == 0 {
            return Err(ProtocolError::InvalidSessionId("0".to_string()));
        }
        Ok(Self(raw))
    }

    /// Returns the raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for SessionId {
    type Error = ProtocolError;

    fn try_from(raw: u64) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<SessionId> for u64 {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SessionId {
    type Err = ProtocolError;

    /// Parses the plain-text body returned by session creation.
    ///
    /// Surrounding whitespace (including the trailing newline some servers
    /// append) is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let raw = trimmed
            .parse::<u64>()
            .map_err(|_| ProtocolError::InvalidSessionId(trimmed.to_string()))?;
        Self::new(raw)
    }
}

/// One entry of the session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: SessionId,
    /// Name of the script engine backing the session.
    pub engine: String,
}

/// Body of `GET sessions/py`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionList {
    /// Sessions in server order.
    pub sessions: Vec<SessionSummary>,
}

impl SessionList {
    /// Decode a listing body.
    ///
    /// Any shape other than `{"sessions": [{"id": .., "engine": ..}, ..]}`
    /// yields [`ProtocolError::MalformedResponse`].
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(ProtocolError::from)
    }

    /// Encode the listing as indented JSON, in the same shape the server sends.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ProtocolError::from)
    }
}

/// Route to the collection of sessions for [`ENGINE`].
pub fn sessions_path() -> String {
    format!("sessions/{ENGINE}")
}

/// Route to a single session.
pub fn session_path(id: SessionId) -> String {
    format!("sessions/{ENGINE}/{id}")
}

/// Absolute path prefix for a context, e.g. `/geoserver/script/`.
pub fn script_prefix(context: &str) -> String {
    format!("/{}/{}/", context.trim_matches('/'), SCRIPT_ROOT)
}
