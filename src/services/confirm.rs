//! Operator confirmation before destructive operations.

use std::io::{self, BufRead, Write};

/// The only answer that lets a destructive operation proceed.
const CONFIRMATION: &str = "yes";

/// Asks the operator whether to go ahead.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

/// Non-interactive confirmation, used for `--yes`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Writes the prompt to `output` and reads one line from `input`.
///
/// Only the literal answer `yes` confirms; anything else, including end of
/// input, declines.
pub struct LinePrompt<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> LinePrompt<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr so stdout stays clean for scripting.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<I: BufRead, O: Write> Confirm for LinePrompt<I, O> {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim_end_matches(['\n', '\r']);

        Ok(answer == CONFIRMATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let confirmed = LinePrompt::new(Cursor::new(input.to_string()), &mut output)
            .confirm("Are you sure? ")
            .unwrap();
        (confirmed, String::from_utf8(output).unwrap())
    }

    #[test]
    fn literal_yes_confirms() {
        assert_eq!(answer("yes\n"), (true, "Are you sure? ".to_string()));
        assert!(answer("yes\r\n").0);
        assert!(answer("yes").0);
    }

    #[test]
    fn anything_else_declines() {
        for input in ["no\n", "y\n", "YES\n", " yes\n", "yes please\n", "\n", ""] {
            assert!(!answer(input).0, "{input:?}");
        }
    }

    #[test]
    fn assume_yes_always_confirms() {
        assert!(AssumeYes.confirm("anything").unwrap());
    }
}
