use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line reader over stdin that can be awaited alongside timers
pub struct InputReader {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for InputReader {
    fn default() -> Self {
        Self::new()
    }
}

impl InputReader {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next trimmed line, or `UnexpectedEof` once stdin is closed
    pub async fn next_line(&mut self) -> io::Result<String> {
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
        }
    }

    /// Print a prompt and read the answer
    pub async fn prompt(&mut self, label: &str) -> io::Result<String> {
        print_prompt(label)?;
        self.next_line().await
    }
}

/// Helper function to read a secret without echoing it
pub async fn read_secret(label: &str) -> io::Result<String> {
    let label = label.to_string();
    tokio::task::spawn_blocking(move || rpassword::prompt_password(label))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

pub fn print_prompt(label: &str) -> io::Result<()> {
    print!("{}", label);
    io::stdout().flush()
}
