//! Operator-facing I/O.
//!
//! Tables, entry views and outcome lines go to stdout; log events go to
//! stderr through `tracing`. Both end up in the transcript when one is
//! active.

use crate::transcript::Transcript;
use std::io::{BufRead, Write};

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Failed to read operator input: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Operator {
    /// Show one line of output.
    fn say(&mut self, line: &str);

    /// Show `prompt` and read one line of input, without the line ending.
    /// End of input reads as an empty answer.
    fn ask(&mut self, prompt: &str) -> Result<String, ConsoleError>;
}

/// The real terminal, optionally mirrored into a transcript.
pub struct Console<R> {
    input: R,
    transcript: Option<Transcript>,
}

impl Console<std::io::StdinLock<'static>> {
    pub fn stdio(transcript: Option<Transcript>) -> Self {
        Console::new(std::io::stdin().lock(), transcript)
    }
}

impl<R: BufRead> Console<R> {
    pub fn new(input: R, transcript: Option<Transcript>) -> Self {
        Console { input, transcript }
    }
}

impl<R: BufRead> Operator for Console<R> {
    fn say(&mut self, line: &str) {
        println!("{line}");
        if let Some(transcript) = &self.transcript {
            transcript.line(line);
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim_end_matches(['\r', '\n']).to_string();

        if let Some(transcript) = &self.transcript {
            transcript.line(&format!("{prompt}{answer}"));
        }

        Ok(answer)
    }
}
