//! Out-of-band operator input (typed commands and prompt answers)

use crate::error::{Result, SessionError};
use crossbeam::channel::{unbounded, Receiver};
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::thread;

pub trait CommandSource: Send {
    /// A line is buffered and `get_input` will not block
    fn has_input(&self) -> bool;

    /// Next buffered line, blocking until one arrives
    fn get_input(&mut self) -> Result<String>;

    /// Show `text` to the operator and wait for the answer
    fn prompt(&mut self, text: &str) -> Result<String>;
}

/// Reads stdin lines on a background thread
pub struct StdinCommandSource {
    lines: Receiver<String>,
}

impl StdinCommandSource {
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("stdin-commands".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
                log::debug!("stdin closed");
            })?;
        Ok(Self { lines: rx })
    }
}

impl CommandSource for StdinCommandSource {
    fn has_input(&self) -> bool {
        !self.lines.is_empty()
    }

    fn get_input(&mut self) -> Result<String> {
        self.lines
            .recv()
            .map_err(|_| SessionError::disconnected("stdin closed"))
    }

    fn prompt(&mut self, text: &str) -> Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", text)?;
        stdout.flush()?;
        self.get_input()
    }
}

/// Replays a fixed list of lines, for scripted sessions and tests
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommandSource {
    lines: VecDeque<String>,
}

impl ScriptedCommandSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl CommandSource for ScriptedCommandSource {
    fn has_input(&self) -> bool {
        !self.lines.is_empty()
    }

    fn get_input(&mut self) -> Result<String> {
        self.lines
            .pop_front()
            .ok_or_else(|| SessionError::disconnected("script exhausted"))
    }

    fn prompt(&mut self, text: &str) -> Result<String> {
        let answer = self.get_input()?;
        log::info!("{}{}", text, answer);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_source_replays_in_order() {
        let mut source = ScriptedCommandSource::new(["a", "desk"]);
        assert!(source.has_input());
        assert_eq!(source.get_input().unwrap(), "a");
        assert_eq!(source.prompt("Enter name for AOI: ").unwrap(), "desk");
        assert!(!source.has_input());
        assert!(matches!(
            source.get_input(),
            Err(SessionError::ChannelDisconnected(_))
        ));
    }
}
