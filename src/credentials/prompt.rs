//! Line-oriented operator channel.

use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

use crate::{AppError, Result};

const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Visual weight of an operator message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Unstyled progress text.
    Plain,
    /// Section heading or prompt label.
    Heading,
    /// Input accepted.
    Success,
    /// Validation failure.
    Error,
    /// Usage example.
    Hint,
}

impl Tone {
    fn color(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Heading => Some(BOLD),
            Self::Success => Some(GREEN),
            Self::Error => Some(RED),
            Self::Hint => Some(YELLOW),
        }
    }
}

/// Blocking prompt/response channel to the operator.
pub trait Prompter {
    /// Show `label` and block until a line is entered.
    ///
    /// The returned line has its trailing line break removed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the channel is closed, input has ended, or
    /// the terminal cannot be read or written.
    fn ask(&mut self, label: &str) -> Result<String>;

    /// Print one message line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the terminal cannot be written.
    fn say(&mut self, tone: Tone, text: &str) -> Result<()>;

    /// Stop reading input. Idempotent.
    fn close(&mut self);

    /// Whether [`Prompter::close`] has been called.
    fn is_closed(&self) -> bool;
}

/// [`Prompter`] over any buffered reader and writer.
#[derive(Debug)]
pub struct LinePrompter<R, W> {
    input: Option<R>,
    output: W,
    color: bool,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    /// Build a prompter; `color` enables ANSI styling.
    #[must_use]
    pub fn new(input: R, output: W, color: bool) -> Self {
        Self {
            input: Some(input),
            output,
            color,
        }
    }

    /// Consume the prompter and return the output sink.
    #[must_use]
    pub fn into_output(self) -> W {
        self.output
    }

    fn styled(&self, tone: Tone, text: &str) -> String {
        match tone.color() {
            Some(code) if self.color => format!("{code}{text}{RESET}"),
            _ => text.to_owned(),
        }
    }
}

impl LinePrompter<StdinLock<'static>, Stdout> {
    /// Prompter bound to the process's stdin and stdout.
    #[must_use]
    pub fn stdio(color: bool) -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout(), color)
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, label: &str) -> Result<String> {
        let styled = self.styled(Tone::Heading, label);
        write!(self.output, "{styled}").map_err(io_error)?;
        self.output.flush().map_err(io_error)?;

        let input = self
            .input
            .as_mut()
            .ok_or_else(|| AppError::Io("input channel is closed".into()))?;

        let mut line = String::new();
        let read = input.read_line(&mut line).map_err(io_error)?;
        if read == 0 {
            return Err(AppError::Io("input ended before a value was entered".into()));
        }

        let trimmed = line.strip_suffix('\n').unwrap_or(line.as_str());
        let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
        Ok(trimmed.to_owned())
    }

    fn say(&mut self, tone: Tone, text: &str) -> Result<()> {
        let styled = self.styled(tone, text);
        writeln!(self.output, "{styled}").map_err(io_error)
    }

    fn close(&mut self) {
        self.input = None;
        let _ = self.output.flush();
    }

    fn is_closed(&self) -> bool {
        self.input.is_none()
    }
}

fn io_error(err: io::Error) -> AppError {
    AppError::Io(format!("terminal: {err}"))
}
