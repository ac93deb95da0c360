//! # Script Console Library
//!
//! Client side of the remote script session service: it manages
//! server-held interpreter sessions over HTTP and runs an interactive
//! console whose statements execute on the server.
//!
//! ## Architecture
//!
//! ```text
//! user input -> ConsoleLoop -> StatementAccumulator
//!                    |                 |
//!                    |       Incomplete: read another line
//!                    v
//!              Session::eval -> SessionClient -> Transport (HTTP)
//!                    |
//!                    v
//!              printed result
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use console::config::Config;
//! use console::{HttpTransport, SessionClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let transport = HttpTransport::new(&config.connection)?;
//!     let mut client = SessionClient::new(transport);
//!
//!     if let Some(mut session) = client.create().await? {
//!         print!("{}", session.eval("print(1 + 1)").await?);
//!     }
//!     client.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`transport`]: HTTP transport
//! - [`client`]: Session lifecycle and evaluation
//! - [`sink`]: Warning observers
//! - [`statement`]: Statement completeness detection
//! - [`repl`]: The interactive loop

pub mod client;
pub mod config;
pub mod repl;
pub mod sink;
pub mod statement;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export protocol for convenience
pub use protocol;

pub use client::{ClientError, Session, SessionClient};
pub use config::Config;
pub use repl::{ConsoleError, ConsoleLoop, Line, LineSource, LoopExit, State, TerminalInput};
pub use sink::{RecordingSink, TracingSink, WarningSink};
pub use statement::{classify, Mode, StatementAccumulator, SyntaxError, Verdict};
pub use transport::{HttpTransport, Response, Transport, TransportError};
