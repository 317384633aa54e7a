use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use super::{UserPrompt, UserReply};

const QUIT_COMMANDS: &[&str] = &["/quit", "/exit", "/stop"];

/// Line-oriented prompt over any reader/writer pair (stdin/stdout in the CLI).
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
    asked: usize,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            asked: 0,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> UserPrompt for ConsolePrompt<R, W> {
    fn ask(&mut self, question: &str) -> Result<UserReply> {
        self.asked += 1;
        write!(self.output, "\nQ{}: {}\n> ", self.asked, question)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read answer")?;
        if read == 0 {
            return Ok(UserReply::Cancelled);
        }
        let answer = line.trim();
        if QUIT_COMMANDS.contains(&answer.to_lowercase().as_str()) {
            return Ok(UserReply::Cancelled);
        }
        Ok(UserReply::Answer(answer.to_string()))
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "\n({message})")?;
        Ok(())
    }
}
