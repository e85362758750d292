//! Console output targets.
//!
//! Command handlers and the calibration sink never write to stdout directly. They
//! receive a [`Console`] by reference, which lets the same rendering logic drive a
//! real terminal or an in-memory transcript.

use crossterm::style::Stylize;
use std::io::{self, Write};

use crate::constants::{BUSY_PROMPT, DEFAULT_IDLE_PROMPT};

/// Prompt states a command may switch the console into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Normal prompt, accepting input
    Idle,
    /// A long-running operation owns the console
    Busy,
}

/// Output target of a console session.
pub trait Console {
    /// Prints one line of normal text followed by a newline.
    fn print(&mut self, text: &str);

    /// Writes text without a trailing newline.
    fn write(&mut self, text: &str);

    /// Prints one informational line.
    fn info(&mut self, text: &str);

    /// Prints one error line.
    fn error(&mut self, text: &str);

    /// Switches the prompt.
    fn set_prompt(&mut self, prompt: Prompt);

    /// Returns the current prompt state.
    fn prompt(&self) -> Prompt;
}

/// Console bound to the process stdout.
pub struct TerminalConsole {
    out: io::Stdout,
    prompt: Prompt,
    idle_prompt: String,
    color: bool,
}

impl TerminalConsole {
    /// Creates a terminal console with the given idle prompt text.
    #[must_use]
    pub fn new(idle_prompt: impl Into<String>) -> Self {
        Self {
            out: io::stdout(),
            prompt: Prompt::Idle,
            idle_prompt: idle_prompt.into(),
            color: true,
        }
    }

    /// Disables ANSI colouring of info and error lines.
    #[must_use]
    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }

    /// Text of the current prompt.
    #[must_use]
    pub fn prompt_text(&self) -> &str {
        match self.prompt {
            Prompt::Idle => &self.idle_prompt,
            Prompt::Busy => BUSY_PROMPT,
        }
    }

    /// Writes the current prompt so the operator can type the next line.
    pub fn show_prompt(&mut self) {
        let text = self.prompt_text().to_string();
        self.write(&text);
    }

    // Console output is best effort: a closed stdout must not abort a calibration run.
    fn emit(&mut self, text: &str, newline: bool) {
        let _ = if newline {
            writeln!(self.out, "{text}")
        } else {
            write!(self.out, "{text}")
        };
        let _ = self.out.flush();
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_PROMPT)
    }
}

impl Console for TerminalConsole {
    fn print(&mut self, text: &str) {
        self.emit(text, true);
    }

    fn write(&mut self, text: &str) {
        self.emit(text, false);
    }

    fn info(&mut self, text: &str) {
        if self.color {
            let styled = text.green().to_string();
            self.emit(&styled, true);
        } else {
            self.emit(text, true);
        }
    }

    fn error(&mut self, text: &str) {
        if self.color {
            let styled = text.red().to_string();
            self.emit(&styled, true);
        } else {
            self.emit(text, true);
        }
    }

    fn set_prompt(&mut self, prompt: Prompt) {
        self.prompt = prompt;
    }

    fn prompt(&self) -> Prompt {
        self.prompt
    }
}

/// One recorded console operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOp {
    /// A line printed with `print`
    Line(String),
    /// Raw text written with `write`
    Raw(String),
    /// An informational line
    Info(String),
    /// An error line
    Error(String),
    /// A prompt change
    Prompt(Prompt),
}

/// Console that records every operation in order.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    ops: Vec<ConsoleOp>,
    prompt: Option<Prompt>,
}

impl RecordingConsole {
    /// Empty transcript with the idle prompt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All operations recorded so far.
    #[must_use]
    pub fn ops(&self) -> &[ConsoleOp] {
        &self.ops
    }

    /// Prompt changes in the order they happened.
    #[must_use]
    pub fn prompt_changes(&self) -> Vec<Prompt> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                ConsoleOp::Prompt(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Everything written, rendered as plain text with newlines after lines.
    #[must_use]
    pub fn output(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            match op {
                ConsoleOp::Line(text) | ConsoleOp::Info(text) | ConsoleOp::Error(text) => {
                    out.push_str(text);
                    out.push('\n');
                }
                ConsoleOp::Raw(text) => out.push_str(text),
                ConsoleOp::Prompt(_) => {}
            }
        }
        out
    }

    /// Error lines only.
    #[must_use]
    pub fn errors(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                ConsoleOp::Error(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Forgets everything recorded so far but keeps the prompt state.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Console for RecordingConsole {
    fn print(&mut self, text: &str) {
        self.ops.push(ConsoleOp::Line(text.to_string()));
    }

    fn write(&mut self, text: &str) {
        self.ops.push(ConsoleOp::Raw(text.to_string()));
    }

    fn info(&mut self, text: &str) {
        self.ops.push(ConsoleOp::Info(text.to_string()));
    }

    fn error(&mut self, text: &str) {
        self.ops.push(ConsoleOp::Error(text.to_string()));
    }

    fn set_prompt(&mut self, prompt: Prompt) {
        self.prompt = Some(prompt);
        self.ops.push(ConsoleOp::Prompt(prompt));
    }

    fn prompt(&self) -> Prompt {
        self.prompt.unwrap_or(Prompt::Idle)
    }
}
