//! Interactive prompt on a terminal.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use yansi::Paint;

use super::choice::{Choice, ChoiceError};
use super::decider::{DecisionError, DecisionProvider};

/// Decision provider that asks an operator.
///
/// Generic over its streams so tests can drive it with in-memory buffers.
pub struct ConsoleDecider<R, W> {
    input: R,
    output: W,
}

impl ConsoleDecider<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on stdout and read answers from stdin.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleDecider<R, W> {
    /// Create a decider over arbitrary streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Recover the output stream.
    pub fn into_output(self) -> W {
        self.output
    }

    fn print_option(&mut self, key: &str, label: &str) -> io::Result<()> {
        writeln!(self.output, "  ({}) {}", key.yellow().bold(), label.blue().bold())
    }

    fn print_menu(&mut self, files: &[PathBuf]) -> io::Result<()> {
        writeln!(self.output, "{}", "Which file would you like to keep?".green())?;
        self.print_option("a", "All")?;
        self.print_option("n", "None")?;
        for (i, file) in files.iter().enumerate() {
            self.print_option(&(i + 1).to_string(), &file.display().to_string())?;
        }
        writeln!(
            self.output,
            "  {}",
            "(sN) keeps file N and replaces the others with links to it".dim()
        )?;
        write!(self.output, "> ")?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> DecisionProvider for ConsoleDecider<R, W> {
    fn decide(&mut self, _checksum: &str, files: &[PathBuf]) -> Result<Choice, DecisionError> {
        loop {
            self.print_menu(files)?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Err(DecisionError::InputClosed);
            }

            match line.parse::<Choice>() {
                Ok(choice) => return Ok(choice),
                Err(e) => {
                    log::debug!("{}", e);
                    writeln!(self.output, "{}", "Invalid choice".red())?;
                }
            }
        }
    }

    fn reject(&mut self, reason: &ChoiceError) {
        if let Err(e) = writeln!(self.output, "{}", reason.to_string().red()) {
            log::warn!("Unable to write to terminal: {}", e);
        }
    }
}
