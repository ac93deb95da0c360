//! Statement completeness detection for the console.
//!
//! [`StatementAccumulator`] buffers input lines and decides after each one
//! whether the buffer is a complete statement, needs more input, or can
//! never become valid. Only a [`Verdict::Complete`] buffer may be sent for
//! evaluation.
//!
//! The check is lexical: brackets, string literals, line continuations and
//! indentation are tracked, and a few statement shapes that no further line
//! can repair (a trailing operator, a colon ending a plain statement) are
//! rejected. Full grammar checking is left to the remote interpreter.
//!
//! Two modes are supported:
//!
//! - [`Mode::Source`] treats end of input as closing every open block, so
//!   `"if True:\n  pass"` is complete.
//! - [`Mode::Interactive`] follows an interactive prompt: a statement that
//!   opens a block is complete only once a blank line ends it, and a buffer
//!   holds a single top-level statement.

use thiserror::Error;

/// How end of input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// End of input closes every open block.
    Source,
    /// Compound statements end with a blank line.
    #[default]
    Interactive,
}

/// A syntax error found locally, before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line})")]
pub struct SyntaxError {
    /// Description of the problem.
    pub message: String,
    /// 1-based line within the buffer.
    pub line: usize,
}

impl SyntaxError {
    fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// Result of checking a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Ready to be evaluated.
    Complete,
    /// Needs at least one more line.
    Incomplete,
    /// Cannot become valid by appending lines.
    Invalid(SyntaxError),
}

/// Classify `source` as a whole.
pub fn classify(source: &str, mode: Mode) -> Verdict {
    match Scanner::new(mode).run(source) {
        Ok(verdict) => verdict,
        Err(err) => Verdict::Invalid(err),
    }
}

/// Line buffer that reports whether it holds a complete statement.
#[derive(Debug, Clone, Default)]
pub struct StatementAccumulator {
    lines: Vec<String>,
    mode: Mode,
}

impl StatementAccumulator {
    /// Create an empty accumulator.
    pub fn new(mode: Mode) -> Self {
        Self {
            lines: Vec::new(),
            mode,
        }
    }

    /// Append one line (without its line break) and classify the buffer.
    pub fn push(&mut self, line: &str) -> Verdict {
        self.lines
            .push(line.trim_end_matches(['\r', '\n']).to_string());
        classify(&self.buffer(), self.mode)
    }

    /// Buffered lines joined by `\n`.
    pub fn buffer(&self) -> String {
        self.lines.join("\n")
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop every buffered line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Return the buffer and clear it.
    pub fn take(&mut self) -> String {
        let buffer = self.buffer();
        self.clear();
        buffer
    }
}

/// Keywords that can only start a compound statement.
const COMPOUND: &[&str] = &["if", "while", "for", "try", "with", "def", "class", "async"];

/// Statements that must contain a colon outside brackets.
const NEEDS_COLON: &[&str] = &[
    "if", "elif", "else", "while", "for", "try", "except", "finally", "with", "def", "class",
];

/// Clauses continuing the compound statement above them.
const CLAUSES: &[&str] = &["elif", "else", "except", "finally"];

/// Keywords that cannot end a statement.
const KEYWORD_OPERATORS: &[&str] = &[
    "and", "as", "assert", "await", "del", "elif", "else", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "while", "with",
];

const OPERATOR_CHARS: &str = "+-*/%=<>!&|^~@";

/// Lexical class of the most recent token on a logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Value,
    Operator,
    Open,
    Colon,
    Separator,
}

/// One logical line: physical lines joined by brackets, strings or `\`.
#[derive(Debug)]
struct Logical {
    line: usize,
    end_line: usize,
    indent: usize,
    first: Option<String>,
    last: Option<Token>,
    tokens: usize,
    top_colon: bool,
}

impl Logical {
    fn new(line: usize, indent: usize) -> Self {
        Self {
            line,
            end_line: line,
            indent,
            first: None,
            last: None,
            tokens: 0,
            top_colon: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenString {
    quote: char,
    triple: bool,
    line: usize,
}

struct Scanner {
    mode: Mode,
    brackets: Vec<(char, usize)>,
    string: Option<OpenString>,
    continuation: bool,
    logical: Option<Logical>,
    indents: Vec<usize>,
    /// Header line and keyword still waiting for an indented body.
    pending_header: Option<(usize, String)>,
    /// First word of the previous top-level logical line.
    previous_top: Option<String>,
    compound: bool,
}

impl Scanner {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            brackets: Vec::new(),
            string: None,
            continuation: false,
            logical: None,
            indents: vec![0],
            pending_header: None,
            previous_top: None,
            compound: false,
        }
    }

    fn run(mut self, source: &str) -> Result<Verdict, SyntaxError> {
        let mut line_count = 0;
        let mut ends_blank = true;
        for (idx, raw) in source.split('\n').enumerate() {
            let text = raw.strip_suffix('\r').unwrap_or(raw);
            self.scan_line(text, idx + 1)?;
            line_count = idx + 1;
            ends_blank = text.trim().is_empty();
        }

        if self.string.is_some() || self.continuation || !self.brackets.is_empty() {
            return Ok(Verdict::Incomplete);
        }

        let interactive = self.mode == Mode::Interactive;
        let dangling_decorator = self.previous_top.as_deref() == Some("@");
        if let Some((line, keyword)) = &self.pending_header {
            if interactive && ends_blank {
                return Err(SyntaxError::new(
                    format!("expected an indented block after {}", describe(keyword, *line)),
                    line_count,
                ));
            }
            return Ok(Verdict::Incomplete);
        }
        if dangling_decorator {
            if interactive && ends_blank {
                return Err(SyntaxError::new("invalid syntax", line_count));
            }
            return Ok(Verdict::Incomplete);
        }

        if interactive && self.compound && !ends_blank {
            return Ok(Verdict::Incomplete);
        }
        Ok(Verdict::Complete)
    }

    fn scan_line(&mut self, text: &str, line_no: usize) -> Result<(), SyntaxError> {
        let chars: Vec<char> = text.chars().collect();
        let mut pos = 0;

        if self.logical.is_none() {
            let (indent, start) = measure_indent(&chars);
            if start == chars.len() || chars[start] == '#' {
                return Ok(());
            }
            self.logical = Some(Logical::new(line_no, indent));
            pos = start;
        }
        self.continuation = false;

        if let Some(open) = self.string.take() {
            match self.continue_string(&chars, 0, open, line_no)? {
                Some(next) => pos = next,
                None => return Ok(()),
            }
        }

        while pos < chars.len() {
            let c = chars[pos];
            match c {
                ' ' | '\t' | '\x0c' => pos += 1,
                '#' => break,
                '\\' => {
                    if pos + 1 == chars.len() {
                        self.continuation = true;
                        return Ok(());
                    }
                    return Err(SyntaxError::new(
                        "unexpected character after line continuation character",
                        line_no,
                    ));
                }
                '\'' | '"' => {
                    self.push(Token::Value, line_no);
                    match self.open_string(&chars, pos, line_no)? {
                        Some(next) => pos = next,
                        None => return Ok(()),
                    }
                }
                '(' | '[' | '{' => {
                    self.brackets.push((c, line_no));
                    self.push(Token::Open, line_no);
                    pos += 1;
                }
                ')' | ']' | '}' => {
                    self.close_bracket(c, line_no)?;
                    self.push(Token::Value, line_no);
                    pos += 1;
                }
                ':' => {
                    if chars.get(pos + 1) == Some(&'=') {
                        self.push(Token::Operator, line_no);
                        pos += 2;
                    } else {
                        if self.brackets.is_empty() {
                            if let Some(logical) = self.logical.as_mut() {
                                logical.top_colon = true;
                            }
                        }
                        self.push(Token::Colon, line_no);
                        pos += 1;
                    }
                }
                ',' | ';' => {
                    self.push(Token::Separator, line_no);
                    pos += 1;
                }
                '.' => {
                    if chars.get(pos + 1) == Some(&'.') && chars.get(pos + 2) == Some(&'.') {
                        self.push(Token::Value, line_no);
                        pos += 3;
                    } else if chars.get(pos + 1).is_some_and(|d| d.is_ascii_digit()) {
                        pos = scan_number(&chars, pos);
                        self.push(Token::Value, line_no);
                    } else {
                        self.push(Token::Operator, line_no);
                        pos += 1;
                    }
                }
                c if c.is_ascii_digit() => {
                    pos = scan_number(&chars, pos);
                    self.push(Token::Value, line_no);
                }
                c if is_word_start(c) => {
                    let start = pos;
                    while pos < chars.len() && is_word_char(chars[pos]) {
                        pos += 1;
                    }
                    let word: String = chars[start..pos].iter().collect();
                    if matches!(chars.get(pos), Some('\'' | '"')) && is_string_prefix(&word) {
                        self.push(Token::Value, line_no);
                        match self.open_string(&chars, pos, line_no)? {
                            Some(next) => pos = next,
                            None => return Ok(()),
                        }
                    } else {
                        self.push_word(word, line_no);
                    }
                }
                c if OPERATOR_CHARS.contains(c) => {
                    let start = pos;
                    while pos < chars.len() && OPERATOR_CHARS.contains(chars[pos]) {
                        pos += 1;
                    }
                    let decorator = c == '@'
                        && pos == start + 1
                        && self.logical.as_ref().is_some_and(|l| l.tokens == 0);
                    if decorator {
                        if let Some(logical) = self.logical.as_mut() {
                            logical.first = Some("@".to_string());
                        }
                    }
                    self.push(Token::Operator, line_no);
                }
                c if c.is_ascii() => {
                    return Err(SyntaxError::new("invalid syntax", line_no));
                }
                c => {
                    return Err(SyntaxError::new(
                        format!("invalid character '{}' (U+{:04X})", c, c as u32),
                        line_no,
                    ));
                }
            }
        }

        if self.brackets.is_empty() {
            self.finish_logical()?;
        }
        Ok(())
    }

    fn push(&mut self, token: Token, line_no: usize) {
        if let Some(logical) = self.logical.as_mut() {
            logical.last = Some(token);
            logical.tokens += 1;
            logical.end_line = line_no;
        }
    }

    fn push_word(&mut self, word: String, line_no: usize) {
        let token = if KEYWORD_OPERATORS.contains(&word.as_str()) {
            Token::Operator
        } else {
            Token::Value
        };
        if let Some(logical) = self.logical.as_mut() {
            if logical.tokens == 0 {
                logical.first = Some(word);
            }
        }
        self.push(token, line_no);
    }

    fn close_bracket(&mut self, close: char, line_no: usize) -> Result<(), SyntaxError> {
        let Some((open, open_line)) = self.brackets.pop() else {
            return Err(SyntaxError::new(format!("unmatched '{}'", close), line_no));
        };
        if matching(open) == close {
            return Ok(());
        }
        let message = if open_line == line_no {
            format!(
                "closing parenthesis '{}' does not match opening parenthesis '{}'",
                close, open
            )
        } else {
            format!(
                "closing parenthesis '{}' does not match opening parenthesis '{}' on line {}",
                close, open, open_line
            )
        };
        Err(SyntaxError::new(message, line_no))
    }

    /// Scan a string literal whose opening quote is at `pos`.
    ///
    /// Returns the position after the closing quote, or `None` when the
    /// literal continues on the next line.
    fn open_string(
        &mut self,
        chars: &[char],
        pos: usize,
        line_no: usize,
    ) -> Result<Option<usize>, SyntaxError> {
        let quote = chars[pos];
        let triple = chars[pos..].starts_with(&[quote; 3]);
        let open = OpenString {
            quote,
            triple,
            line: line_no,
        };
        let start = if triple { pos + 3 } else { pos + 1 };
        self.continue_string(chars, start, open, line_no)
    }

    fn continue_string(
        &mut self,
        chars: &[char],
        mut pos: usize,
        open: OpenString,
        line_no: usize,
    ) -> Result<Option<usize>, SyntaxError> {
        while pos < chars.len() {
            let c = chars[pos];
            if c == '\\' {
                if pos + 1 == chars.len() {
                    self.string = Some(open);
                    return Ok(None);
                }
                pos += 2;
                continue;
            }
            if c == open.quote {
                if !open.triple {
                    return Ok(Some(pos + 1));
                }
                if chars[pos..].starts_with(&[open.quote; 3]) {
                    return Ok(Some(pos + 3));
                }
            }
            pos += 1;
        }

        if open.triple {
            self.string = Some(open);
            return Ok(None);
        }
        Err(SyntaxError::new(
            format!("unterminated string literal (detected at line {})", line_no),
            open.line,
        ))
    }

    fn finish_logical(&mut self) -> Result<(), SyntaxError> {
        let Some(logical) = self.logical.take() else {
            return Ok(());
        };
        if logical.tokens == 0 {
            return Ok(());
        }

        let first = logical.first.clone().unwrap_or_default();
        let header = logical.last == Some(Token::Colon);

        if logical.last == Some(Token::Operator) {
            return Err(SyntaxError::new("invalid syntax", logical.end_line));
        }
        if header && !is_compound(&first) {
            return Err(SyntaxError::new("invalid syntax", logical.end_line));
        }
        if !logical.top_colon && NEEDS_COLON.contains(&first.as_str()) {
            return Err(SyntaxError::new("expected ':'", logical.end_line));
        }

        self.check_indent(&logical)?;

        if logical.indent == 0 {
            self.check_top_level(&first, header, logical.line)?;
        }
        if header {
            self.pending_header = Some((logical.line, first));
        }
        Ok(())
    }

    fn check_indent(&mut self, logical: &Logical) -> Result<(), SyntaxError> {
        let top = self.indents.last().copied().unwrap_or(0);

        if let Some((line, keyword)) = self.pending_header.take() {
            if logical.indent > top {
                self.indents.push(logical.indent);
                return Ok(());
            }
            return Err(SyntaxError::new(
                format!("expected an indented block after {}", describe(&keyword, line)),
                logical.line,
            ));
        }

        if logical.indent > top {
            return Err(SyntaxError::new("unexpected indent", logical.line));
        }
        while self.indents.last().is_some_and(|&i| i > logical.indent) {
            self.indents.pop();
        }
        if self.indents.last().copied().unwrap_or(0) != logical.indent {
            return Err(SyntaxError::new(
                "unindent does not match any outer indentation level",
                logical.line,
            ));
        }
        Ok(())
    }

    fn check_top_level(
        &mut self,
        first: &str,
        header: bool,
        line: usize,
    ) -> Result<(), SyntaxError> {
        match self.previous_top.as_deref() {
            None => {
                self.compound = header || first == "@" || COMPOUND.contains(&first);
            }
            Some(previous) if self.mode == Mode::Interactive => {
                let clause = self.compound && CLAUSES.contains(&first);
                let decorated =
                    previous == "@" && matches!(first, "@" | "def" | "class" | "async");
                if !clause && !decorated {
                    return Err(SyntaxError::new(
                        "multiple statements found while compiling a single statement",
                        line,
                    ));
                }
            }
            Some(_) => {}
        }
        self.previous_top = Some(first.to_string());
        Ok(())
    }
}

fn is_compound(first: &str) -> bool {
    COMPOUND.contains(&first) || CLAUSES.contains(&first) || matches!(first, "match" | "case")
}

fn describe(keyword: &str, line: usize) -> String {
    match keyword {
        "def" => format!("function definition on line {}", line),
        "class" => format!("class definition on line {}", line),
        other => format!("'{}' statement on line {}", other, line),
    }
}

/// Indentation width of a line and the index of its first non-blank char.
///
/// Tabs advance to the next multiple of eight.
fn measure_indent(chars: &[char]) -> (usize, usize) {
    let mut width = 0;
    for (idx, &c) in chars.iter().enumerate() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            '\x0c' => width = 0,
            _ => return (width, idx),
        }
    }
    (width, chars.len())
}

fn scan_number(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && (chars[pos].is_alphanumeric() || matches!(chars[pos], '_' | '.')) {
        pos += 1;
    }
    pos
}

fn is_word_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_word_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "b" | "u" | "f" | "rb" | "br" | "fr" | "rf"
    )
}

fn matching(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}
