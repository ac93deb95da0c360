//! The read-evaluate-print loop.
//!
//! [`ConsoleLoop`] reads lines, feeds them to a [`StatementAccumulator`] and
//! sends each complete statement to the bound [`Session`]. It moves through
//! an explicit [`State`]:
//!
//! ```text
//! ReadingFirstLine -> ReadingContinuation -> ... -> Dispatching -> ReadingFirstLine
//!                 \-> Closed (exit command)
//! ```
//!
//! Local syntax errors are printed and the buffer is dropped without being
//! sent. Ctrl-C during an evaluation abandons the request and returns to the
//! first-line prompt. Connection failures during evaluation end the loop.

mod input;

pub use input::{Line, LineSource, TerminalInput};

use std::io::{self, Write};

use thiserror::Error;

use crate::client::{ClientError, Session};
use crate::config::ConsoleConfig;
use crate::sink::WarningSink;
use crate::statement::{Mode, StatementAccumulator, Verdict};
use crate::transport::Transport;

/// Input that closes the client and ends the loop.
pub const EXIT_COMMAND: &str = "exit()";

/// Where the loop is in handling the current statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the first line of a statement.
    ReadingFirstLine,
    /// The buffer is incomplete and needs another line.
    ReadingContinuation,
    /// A complete statement is about to be evaluated.
    Dispatching,
    /// The exit command was entered; the client is closed.
    Closed,
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The exit command closed the client.
    Exited,
    /// Input ran out; the client is still open.
    EndOfInput,
}

/// Errors that end the loop.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Interactive loop over one remote session.
pub struct ConsoleLoop<'c, T, S, I, W> {
    session: Session<'c, T, S>,
    input: I,
    output: W,
    accumulator: StatementAccumulator,
    prompt: String,
    continuation_prompt: String,
    state: State,
}

impl<'c, T, S, I, W> ConsoleLoop<'c, T, S, I, W>
where
    T: Transport,
    S: WarningSink,
    I: LineSource,
    W: Write,
{
    /// Create a loop that evaluates in `session` and prints to `output`.
    pub fn new(session: Session<'c, T, S>, input: I, output: W, config: &ConsoleConfig) -> Self {
        Self {
            session,
            input,
            output,
            accumulator: StatementAccumulator::new(Mode::Interactive),
            prompt: config.prompt.clone(),
            continuation_prompt: config.continuation_prompt.clone(),
            state: State::ReadingFirstLine,
        }
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Run until the exit command, end of input, or a fatal error.
    pub async fn run(&mut self) -> Result<LoopExit, ConsoleError> {
        tracing::debug!("Console attached to session {}", self.session.id());
        loop {
            match self.state {
                State::Closed => return Ok(LoopExit::Exited),
                State::Dispatching => self.dispatch().await?,
                State::ReadingFirstLine | State::ReadingContinuation => {
                    let prompt = if self.state == State::ReadingFirstLine {
                        &self.prompt
                    } else {
                        &self.continuation_prompt
                    };
                    match self.input.read_line(prompt).await? {
                        Line::Text(text) => self.accept(&text)?,
                        Line::Interrupted => {
                            self.accumulator.clear();
                            writeln!(self.output, "KeyboardInterrupt")?;
                            self.state = State::ReadingFirstLine;
                        }
                        Line::Eof => {
                            writeln!(self.output)?;
                            self.output.flush()?;
                            return Ok(LoopExit::EndOfInput);
                        }
                    }
                }
            }
        }
    }

    fn accept(&mut self, text: &str) -> Result<(), ConsoleError> {
        if self.state == State::ReadingFirstLine && text.trim().is_empty() {
            return Ok(());
        }

        match self.accumulator.push(text) {
            Verdict::Incomplete => self.state = State::ReadingContinuation,
            Verdict::Complete if self.accumulator.buffer() == EXIT_COMMAND => {
                self.accumulator.clear();
                self.session.close()?;
                self.state = State::Closed;
            }
            Verdict::Complete => self.state = State::Dispatching,
            Verdict::Invalid(err) => {
                self.accumulator.clear();
                writeln!(self.output, "SyntaxError: {}", err)?;
                self.state = State::ReadingFirstLine;
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self) -> Result<(), ConsoleError> {
        let code = self.accumulator.take();
        let id = self.session.id();
        tracing::debug!("Evaluating {} line(s) in session {}", code.lines().count(), id);
        tokio::select! {
            biased;
            result = self.session.eval(&code) => {
                write_result(&mut self.output, &result?)?;
            }
            interrupt = self.input.interrupted() => {
                interrupt?;
                tracing::debug!("Evaluation in session {} abandoned", id);
                writeln!(self.output, "KeyboardInterrupt")?;
            }
        }
        self.state = State::ReadingFirstLine;
        Ok(())
    }
}

/// Print an evaluation result. Blank results print nothing; a missing final
/// line break is added.
fn write_result<W: Write>(output: &mut W, result: &str) -> io::Result<()> {
    if result.trim().is_empty() {
        return Ok(());
    }
    output.write_all(result.as_bytes())?;
    if !result.ends_with('\n') {
        output.write_all(b"\n")?;
    }
    output.flush()
}
