//! Line input from the terminal, shared by the REPL and clarification prompts.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::workflow::Clarifier;

/// Word that ends a session or a clarification exchange.
pub const QUIT: &str = "quit";

#[derive(Clone)]
pub struct Console {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl Default for Console {
    fn default() -> Self {
        Self::stdin()
    }
}

impl Console {
    pub fn stdin() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// Print `prompt` and read one trimmed line. `None` at end of input.
    pub async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        {
            let mut stdout = std::io::stdout();
            write!(stdout, "{prompt}")?;
            stdout.flush()?;
        }
        let line = self.lines.lock().await.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }
}

pub fn is_quit(line: &str) -> bool {
    line.eq_ignore_ascii_case(QUIT)
}

/// Asks the person at the terminal whenever a workflow step needs more input.
#[derive(Clone, Default)]
pub struct ConsoleClarifier {
    console: Console,
}

impl ConsoleClarifier {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

#[async_trait]
impl Clarifier for ConsoleClarifier {
    async fn reply(&self, _prompt: &str) -> Option<String> {
        // The prompt was already shown as a status line.
        loop {
            match self.console.read_line("INPUT: ").await {
                Ok(Some(line)) if is_quit(&line) => return None,
                Ok(Some(line)) if line.is_empty() => continue,
                Ok(Some(line)) => return Some(line),
                Ok(None) => return None,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read clarification reply");
                    return None;
                }
            }
        }
    }
}
