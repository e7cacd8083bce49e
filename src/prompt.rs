//! Line-based prompting over any reader and writer.
//!
//! The binary wires a [`Console`] to stdin/stdout; tests feed it a
//! `Cursor` with scripted answers and inspect the written bytes.

use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

use crate::error::Result;

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Console::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Writes one line of output.
    pub fn line(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", text.as_ref())?;
        Ok(())
    }

    pub fn blank(&mut self) -> Result<()> {
        writeln!(self.output)?;
        Ok(())
    }

    /// Reads one line, `None` once the input is exhausted.
    fn read_answer(&mut self) -> Result<Option<String>> {
        self.output.flush()?;
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim().to_string()))
    }

    /// Asks a free-text question. Closed input reads as an empty answer.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "  {question}: ")?;
        let answer = self.read_answer()?;
        if answer.is_none() {
            writeln!(self.output)?;
        }
        Ok(answer.unwrap_or_default())
    }

    /// Offers numbered options and returns the chosen index.
    ///
    /// Accepts a 1-based number or an option's name (case-insensitive).
    /// Empty input or closed input selects `default`; anything else re-asks.
    pub fn choice(&mut self, question: &str, options: &[String], default: usize) -> Result<usize> {
        let default = default.min(options.len().saturating_sub(1));
        writeln!(self.output, "  {question}")?;
        for (i, option) in options.iter().enumerate() {
            let marker = if i == default { "*" } else { " " };
            writeln!(self.output, "   {marker}[{}] {}", i + 1, option)?;
        }
        loop {
            write!(self.output, "  > ")?;
            let answer = match self.read_answer()? {
                Some(answer) => answer,
                None => {
                    writeln!(self.output)?;
                    return Ok(default);
                }
            };
            if answer.is_empty() {
                return Ok(default);
            }
            if let Ok(n) = answer.parse::<usize>() {
                if (1..=options.len()).contains(&n) {
                    return Ok(n - 1);
                }
            }
            if let Some(i) = options.iter().position(|o| o.eq_ignore_ascii_case(&answer)) {
                return Ok(i);
            }
            writeln!(self.output, "  Value \"{answer}\" is invalid.")?;
        }
    }

    /// Yes/no question; empty or closed input returns `default`.
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            write!(self.output, "  {question} {hint} ")?;
            let answer = match self.read_answer()? {
                Some(answer) => answer.to_lowercase(),
                None => {
                    writeln!(self.output)?;
                    return Ok(default);
                }
            };
            match answer.as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "  Please answer yes or no.")?,
            }
        }
    }
}
