//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use protocol::Method;

use crate::repl::{Line, LineSource};
use crate::transport::{Response, Transport, TransportError};

/// A request as seen by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Option<String>,
}

#[derive(Debug)]
enum Scripted {
    Reply(Result<Response, TransportError>),
    Hang,
}

/// Replies from a queue and records every request.
///
/// Clones share the queue and the log. An empty queue answers with a
/// connection error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Scripted>>>,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, status: u16, body: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(Ok(Response::new(status, body))));
        self
    }

    /// The next request never completes.
    pub fn hang(&self) -> &Self {
        self.replies.lock().unwrap().push_back(Scripted::Hang);
        self
    }

    pub fn fail(&self) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(Err(TransportError::Connect {
                url: "http://test".to_string(),
                message: "connection refused".to_string(),
            })));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Response, TransportError> {
        self.log.lock().unwrap().push(Recorded {
            method,
            path: path.to_string(),
            body,
        });
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(reply)) => reply,
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(TransportError::Connect {
                url: "http://test".to_string(),
                message: "no scripted reply".to_string(),
            }),
        }
    }
}

/// Feeds canned lines to the console and records the prompts it shows.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<Line>,
    prompts: Arc<Mutex<Vec<String>>>,
    eval_interrupts: usize,
}

impl ScriptedInput {
    pub fn new<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self::from_lines(lines.into_iter().map(|l| Line::Text(l.to_string())))
    }

    pub fn from_lines(lines: impl IntoIterator<Item = Line>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
            prompts: Arc::default(),
            eval_interrupts: 0,
        }
    }

    /// Interrupt the next `count` evaluations that do not finish on their own.
    pub fn with_eval_interrupts(mut self, count: usize) -> Self {
        self.eval_interrupts = count;
        self
    }

    /// Handle on the prompts shown so far; stays valid after the input moves.
    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl LineSource for ScriptedInput {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Line> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.lines.pop_front().unwrap_or(Line::Eof))
    }

    async fn interrupted(&mut self) -> io::Result<()> {
        if self.eval_interrupts == 0 {
            return std::future::pending().await;
        }
        self.eval_interrupts -= 1;
        Ok(())
    }
}
