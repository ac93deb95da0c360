//! `Authorization` header construction.
//!
//! The header value is computed once from the configured credentials and
//! attached verbatim to every request.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// How credentials are framed into the header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// RFC 7617 framing: `Basic base64(user:password)`.
    #[default]
    Standard,
    /// Encodes the whole `Basic user:password` string, scheme word included.
    ///
    /// Older script endpoints were written against this format.
    Legacy,
}

/// Username and password used for every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub user: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Create credentials from a user and password.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Returns the `Authorization` header value for `scheme`.
    pub fn authorization(&self, scheme: AuthScheme) -> String {
        match scheme {
            AuthScheme::Standard => {
                let token = STANDARD.encode(format!("{}:{}", self.user, self.password));
                format!("Basic {token}")
            }
            AuthScheme::Legacy => {
                STANDARD.encode(format!("Basic {}:{}", self.user, self.password))
            }
        }
    }
}

// Keep passwords out of debug output and logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_header() {
        let creds = Credentials::new("admin", "geoserver");
        assert_eq!(
            creds.authorization(AuthScheme::Standard),
            "Basic YWRtaW46Z2Vvc2VydmVy"
        );
    }

    #[test]
    fn test_legacy_header_encodes_scheme_word() {
        let creds = Credentials::new("admin", "geoserver");
        let header = creds.authorization(AuthScheme::Legacy);
        assert_eq!(header, "QmFzaWMgYWRtaW46Z2Vvc2VydmVy");

        let decoded = STANDARD.decode(&header).unwrap();
        assert_eq!(decoded, b"Basic admin:geoserver");
    }

    #[test]
    fn test_header_is_deterministic() {
        for (user, password) in [("admin", "geoserver"), ("", ""), ("ünï", "p:w d")] {
            for scheme in [AuthScheme::Standard, AuthScheme::Legacy] {
                let first = Credentials::new(user, password).authorization(scheme);
                let second = Credentials::new(user, password).authorization(scheme);
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_legacy_header_has_no_line_breaks() {
        let creds = Credentials::new(
            "a-rather-long-user-name",
            "and-an-even-longer-password-1234567890",
        );
        let header = creds.authorization(AuthScheme::Legacy);
        assert!(!header.contains('\n'));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("admin", "secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_scheme_names() {
        let legacy: AuthScheme = serde_json::from_str(r#""legacy""#).unwrap();
        assert_eq!(legacy, AuthScheme::Legacy);
        assert_eq!(serde_json::to_string(&AuthScheme::Standard).unwrap(), r#""standard""#);
        assert!(serde_json::from_str::<AuthScheme>(r#""digest""#).is_err());
        assert_eq!(AuthScheme::default(), AuthScheme::Standard);
    }
}
