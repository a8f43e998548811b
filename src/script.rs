//! Scripted input: replays a plain-text list of key and click events upstream.
//!
//! DESIGN
//! ======
//! One command per line, read lazily so a script can be piped in live:
//!
//! ```text
//! # comment
//! d down
//! wait 250
//! d up
//! click 120 40
//! ```
//!
//! Events go through a channel to the connection loop, which applies the same
//! open-transport gate as keyboard input in the browser. The script never
//! sees whether an event was sent or dropped.

use std::time::Duration;

use protocol::{InputEvent, Key};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

/// A parse failure for a single script line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("expected `down` or `up`, got `{0}`")]
    InvalidPhase(String),
    #[error("unexpected trailing `{0}`")]
    Trailing(String),
}

/// One parsed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Send(InputEvent),
    Wait(Duration),
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
///
/// # Errors
///
/// Returns a [`ScriptError`] describing the first problem on the line.
pub fn parse_line(line: &str) -> Result<Option<Step>, ScriptError> {
    let line = line.split('#').next().unwrap_or_default().trim();
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let step = match command.to_ascii_lowercase().as_str() {
        "wait" => Step::Wait(Duration::from_millis(number(words.next(), "milliseconds")?)),
        "click" => {
            let x = number(words.next(), "x")?;
            let y = number(words.next(), "y")?;
            Step::Send(InputEvent::Click { x, y })
        }
        other => {
            let key = Key::from_browser_key(other).ok_or_else(|| ScriptError::UnknownCommand(other.to_owned()))?;
            let pressed = match words.next() {
                Some("down") => true,
                Some("up") => false,
                Some(phase) => return Err(ScriptError::InvalidPhase(phase.to_owned())),
                None => return Err(ScriptError::MissingArgument("key phase")),
            };
            Step::Send(InputEvent::Key { key, pressed })
        }
    };

    if let Some(extra) = words.next() {
        return Err(ScriptError::Trailing(extra.to_owned()));
    }
    Ok(Some(step))
}

fn number<T: std::str::FromStr>(word: Option<&str>, name: &'static str) -> Result<T, ScriptError> {
    let word = word.ok_or(ScriptError::MissingArgument(name))?;
    word.parse().map_err(|_| ScriptError::InvalidNumber(word.to_owned()))
}

/// Feed a script into the connection loop until EOF or until the loop hangs up.
///
/// Returns the number of events handed to the loop.
///
/// # Errors
///
/// Returns [`crate::ClientError::Script`] on the first bad line and
/// [`crate::ClientError::Io`] if the reader fails.
pub async fn play<R>(reader: R, tx: mpsc::Sender<InputEvent>) -> Result<usize, crate::ClientError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0_usize;
    let mut queued = 0_usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let step = parse_line(&line).map_err(|source| crate::ClientError::Script { line: line_no, source })?;
        match step {
            None => {}
            Some(Step::Wait(delay)) => tokio::time::sleep(delay).await,
            Some(Step::Send(event)) => {
                if tx.send(event).await.is_err() {
                    tracing::debug!(line = line_no, "connection loop gone; stopping script");
                    break;
                }
                queued += 1;
            }
        }
    }

    Ok(queued)
}
