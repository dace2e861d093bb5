//! Interactive credential prompt.

use std::io::{self, BufRead, Write};

use super::Prompter;
use crate::error_handling::CredentialError;

/// Prompts on the terminal and reads the answer.
///
/// Secret answers are read without echo through `rpassword`; other answers
/// are read from stdin after a prompt on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&self, prompt: &str, secret: bool) -> Result<String, CredentialError> {
        if secret {
            return Ok(rpassword::prompt_password(prompt)?);
        }

        let mut stderr = io::stderr();
        stderr.write_all(prompt.as_bytes())?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(trim_line_ending(&answer).to_string())
    }
}

fn trim_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending("alice\n"), "alice");
        assert_eq!(trim_line_ending("alice\r\n"), "alice");
        assert_eq!(trim_line_ending("  alice "), "  alice ");
    }
}
