//! Session lifecycle client.
//!
//! [`SessionClient`] owns the transport and exposes list, create, bind and
//! close. A bound [`Session`] borrows the client exclusively, so only one
//! request is ever in flight.
//!
//! Status mismatches on list, create and bind are not errors: the client
//! reports one warning to its [`WarningSink`] and returns `Ok(None)`.
//! Connection failures and malformed bodies are returned as `Err`.

use protocol::{
    session_path, sessions_path, Method, ProtocolError, SessionId, SessionList, SessionSummary,
};
use thiserror::Error;

use crate::sink::{TracingSink, WarningSink};
use crate::transport::{Response, Transport, TransportError};

/// Errors returned by the session client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be carried out.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a body that does not fit the protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The client was already closed.
    #[error("session client is closed")]
    Closed,
}

/// Client for the remote session service.
pub struct SessionClient<T, S = TracingSink> {
    transport: Option<T>,
    sink: S,
}

impl<T: Transport> SessionClient<T> {
    /// Create a client that logs warnings through `tracing`.
    pub fn new(transport: T) -> Self {
        Self::with_sink(transport, TracingSink)
    }
}

impl<T: Transport, S: WarningSink> SessionClient<T, S> {
    /// Create a client reporting warnings to `sink`.
    pub fn with_sink(transport: T, sink: S) -> Self {
        Self {
            transport: Some(transport),
            sink,
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// List the sessions held by the server, in server order.
    pub async fn list(&mut self) -> Result<Option<Vec<SessionSummary>>, ClientError> {
        let response = self.send(Method::Get, &sessions_path(), None).await?;
        if !self.check(&response, 200, "GET sessions failed") {
            return Ok(None);
        }
        let list = SessionList::from_json(&response.body)?;
        Ok(Some(list.sessions))
    }

    /// Create a new session and bind to it.
    pub async fn create(&mut self) -> Result<Option<Session<'_, T, S>>, ClientError> {
        let response = self.send(Method::Post, &sessions_path(), None).await?;
        if !self.check(&response, 201, "POST new session failed") {
            return Ok(None);
        }
        let id: SessionId = response.text().parse()?;
        tracing::info!("Created session {}", id);
        Ok(Some(Session { id, client: self }))
    }

    /// Bind to an existing session.
    ///
    /// The response body is not inspected.
    pub async fn bind(
        &mut self,
        id: SessionId,
    ) -> Result<Option<Session<'_, T, S>>, ClientError> {
        let response = self.send(Method::Get, &session_path(id), None).await?;
        if !self.check(&response, 200, "GET session failed") {
            return Ok(None);
        }
        tracing::debug!("Bound to session {}", id);
        Ok(Some(Session { id, client: self }))
    }

    /// Release the transport. Closing twice returns [`ClientError::Closed`].
    pub fn close(&mut self) -> Result<(), ClientError> {
        match self.transport.take() {
            Some(transport) => {
                drop(transport);
                tracing::debug!("Session client closed");
                Ok(())
            }
            None => Err(ClientError::Closed),
        }
    }

    async fn send(
        &mut self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Response, ClientError> {
        let transport = self.transport.as_mut().ok_or(ClientError::Closed)?;
        Ok(transport.request(method, path, body).await?)
    }

    fn check(&self, response: &Response, expected: u16, msg: &str) -> bool {
        if response.status != expected {
            self.sink.warn(&format!(
                "{}, expecting status {} but got {}",
                msg, expected, response.status
            ));
            return false;
        }
        true
    }
}

/// Handle on one remote interpreter.
pub struct Session<'c, T, S = TracingSink> {
    id: SessionId,
    client: &'c mut SessionClient<T, S>,
}

impl<T: Transport, S: WarningSink> Session<'_, T, S> {
    /// The server assigned id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Evaluate `code` remotely and return the output text.
    ///
    /// The status code is not checked; whatever body the server sends back
    /// is the result.
    pub async fn eval(&mut self, code: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .send(Method::Put, &session_path(self.id), Some(code.to_string()))
            .await?;
        tracing::debug!(
            "eval on session {} returned status {}",
            self.id,
            response.status
        );
        Ok(response.text())
    }

    /// Close the owning client. Later calls on this handle fail with
    /// [`ClientError::Closed`].
    pub fn close(&mut self) -> Result<(), ClientError> {
        self.client.close()
    }

    /// Whether the owning client has been closed.
    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}
