//! # Script Session Protocol
//!
//! Wire contract shared by clients of the remote script session service.
//!
//! ## Overview
//!
//! The service exposes server-held interpreter sessions over HTTP:
//!
//! | Operation | Method | Path | Success |
//! |---|---|---|---|
//! | list sessions | `GET` | `sessions/py` | 200 |
//! | create session | `POST` | `sessions/py` | 201 |
//! | bind session | `GET` | `sessions/py/{id}` | 200 |
//! | evaluate | `PUT` | `sessions/py/{id}` | unchecked |
//!
//! Every path is prefixed with `/{context}/script/` and every request carries
//! the same `Authorization` header.
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{session_path, AuthScheme, Credentials, SessionId, SessionList};
//!
//! let header = Credentials::new("admin", "geoserver").authorization(AuthScheme::Standard);
//! assert!(header.starts_with("Basic "));
//!
//! let list = SessionList::from_json(br#"{"sessions":[{"id":1,"engine":"python"}]}"#).unwrap();
//! assert_eq!(session_path(list.sessions[0].id), "sessions/py/1");
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: routes, session ids and listing records
//! - [`auth`]: `Authorization` header encoding
//! - [`process`]: process descriptors
//! - [`error`]: Error types

pub mod auth;
pub mod error;
pub mod messages;
pub mod process;

pub use auth::{AuthScheme, Credentials};
pub use error::{ProtocolError, Result};
pub use messages::{
    script_prefix, session_path, sessions_path, Method, SessionId, SessionList, SessionSummary,
    ENGINE, SCRIPT_ROOT,
};
pub use process::{Parameter, ProcessDescriptor, ProcessRegistry};
