//! Line input for the console.

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::signal::unix::{signal, Signal, SignalKind};

/// One read from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A line of text without its line break.
    Text(String),
    /// The user pressed Ctrl-C.
    Interrupted,
    /// Input is exhausted (Ctrl-D or a closed pipe).
    Eof,
}

/// Source of console input.
#[allow(async_fn_in_trait)]
pub trait LineSource {
    /// Show `prompt` and wait for the next line.
    async fn read_line(&mut self, prompt: &str) -> io::Result<Line>;

    /// Resolve when the user interrupts a running evaluation.
    async fn interrupted(&mut self) -> io::Result<()>;
}

/// Reads lines from stdin and writes prompts to stdout.
///
/// SIGINT is captured for as long as the input lives. Ctrl-C while waiting
/// for a line yields [`Line::Interrupted`]; Ctrl-C at any other time is
/// kept until the next [`read_line`](LineSource::read_line) or
/// [`interrupted`](LineSource::interrupted) call.
pub struct TerminalInput {
    reader: BufReader<Stdin>,
    interrupts: Signal,
}

impl TerminalInput {
    /// Wrap the process stdin and install the SIGINT listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            reader: BufReader::new(tokio::io::stdin()),
            interrupts: signal(SignalKind::interrupt())?,
        })
    }
}

impl LineSource for TerminalInput {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Line> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut buf = String::new();
        tokio::select! {
            read = self.reader.read_line(&mut buf) => {
                if read? == 0 {
                    return Ok(Line::Eof);
                }
                Ok(Line::Text(buf.trim_end_matches(['\r', '\n']).to_string()))
            }
            Some(()) = self.interrupts.recv() => {
                writeln!(stdout)?;
                Ok(Line::Interrupted)
            }
        }
    }

    async fn interrupted(&mut self) -> io::Result<()> {
        if self.interrupts.recv().await.is_none() {
            return std::future::pending().await;
        }
        writeln!(io::stdout())
    }
}
