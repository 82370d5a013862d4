//! Interactive choice capability

use async_trait::async_trait;
use std::io::{BufRead, Write};

/// Asks the user to pick one option.
///
/// Returns the index into `options`, or `None` when the user cancels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Chooser: Send + Sync {
    async fn choose(&self, prompt: &str, options: &[String]) -> Option<usize>;
}

/// Outcome of reading one line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Picked(usize),
    Cancelled,
    Invalid,
}

/// Parse a 1-based menu answer. Empty input or `q` cancels.
pub fn parse_selection(input: &str, option_count: usize) -> Selection {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("q") {
        return Selection::Cancelled;
    }
    match input.parse::<usize>() {
        Ok(n) if n >= 1 && n <= option_count => Selection::Picked(n - 1),
        _ => Selection::Invalid,
    }
}

/// Numbered menu on stdout, answers from stdin
#[derive(Debug, Clone, Copy)]
pub struct TerminalChooser {
    pub max_attempts: usize,
}

impl Default for TerminalChooser {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl TerminalChooser {
    fn prompt_blocking(prompt: String, options: Vec<String>, max_attempts: usize) -> Option<usize> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        println!("{}", prompt);
        for (i, option) in options.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, option);
        }

        for _ in 0..max_attempts {
            print!("Select 1-{} (empty to cancel): ", options.len());
            if stdout.flush().is_err() {
                return None;
            }

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Failed to read selection: {}", e);
                    return None;
                }
            }

            match parse_selection(&line, options.len()) {
                Selection::Picked(index) => return Some(index),
                Selection::Cancelled => return None,
                Selection::Invalid => println!("Invalid selection '{}'", line.trim()),
            }
        }

        None
    }
}

#[async_trait]
impl Chooser for TerminalChooser {
    async fn choose(&self, prompt: &str, options: &[String]) -> Option<usize> {
        if options.is_empty() {
            return None;
        }

        let prompt = prompt.to_string();
        let options = options.to_vec();
        let max_attempts = self.max_attempts;

        match tokio::task::spawn_blocking(move || {
            Self::prompt_blocking(prompt, options, max_attempts)
        })
        .await
        {
            Ok(choice) => choice,
            Err(e) => {
                tracing::warn!("Selection prompt aborted: {}", e);
                None
            }
        }
    }
}
