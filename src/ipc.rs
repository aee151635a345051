// Copyright 2026 Dana Whitfield

//! Newline-delimited JSON messages exchanged with fork-kind children over
//! their stdin/stdout pipes.
//!
//! `SIGRES` is a protocol token, not a POSIX signal: the supervisor writes
//! the literal string `"SIGRES"` and a forked child is expected to read it
//! off its IPC channel and exit on its own.

use std::io::{BufRead, Write};

use serde::Deserialize;

use crate::Result;

/// A message read from a fork child's IPC channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChildMessage {
    PauseForking { pause_forking: bool },
    ResumeForking { resume_forking: bool },
}

impl ChildMessage {
    /// Parse one line of IPC input. Lines that don't match a known shape are
    /// ignored (the child may emit other JSON for its own purposes).
    pub fn parse(line: &str) -> Option<ChildMessage> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default, rename = "pauseForking")]
            pause_forking: Option<bool>,
            #[serde(default, rename = "resumeForking")]
            resume_forking: Option<bool>,
        }
        let raw: Raw = serde_json::from_str(line.trim()).ok()?;
        if raw.pause_forking == Some(true) {
            Some(ChildMessage::PauseForking { pause_forking: true })
        } else if raw.resume_forking == Some(true) {
            Some(ChildMessage::ResumeForking { resume_forking: true })
        } else {
            None
        }
    }
}

/// Read the next recognized IPC message from `reader`, if a full line is
/// already available. Returns `Ok(None)` if nothing is buffered yet (the
/// underlying pipe is non-blocking) or the line didn't parse as a known
/// message.
pub fn try_read_message(reader: &mut impl BufRead) -> Result<Option<ChildMessage>> {
    let mut line = String::new();
    let bytes_read = match reader.read_line(&mut line) {
        Ok(n) => n,
        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if bytes_read == 0 {
        return Ok(None); // EOF
    }
    Ok(ChildMessage::parse(&line))
}

/// Write the `SIGRES` protocol token to a fork child's IPC channel.
pub fn send_sigres(writer: &mut impl Write) -> Result<()> {
    writeln!(writer, "\"SIGRES\"")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_pause_forking() {
        let msg = ChildMessage::parse(r#"{"pauseForking": true}"#).unwrap();
        assert_eq!(msg, ChildMessage::PauseForking { pause_forking: true });
    }

    #[test]
    fn parses_resume_forking() {
        let msg = ChildMessage::parse(r#"{"resumeForking": true}"#).unwrap();
        assert_eq!(
            msg,
            ChildMessage::ResumeForking {
                resume_forking: true
            }
        );
    }

    #[test]
    fn unrecognized_json_is_ignored() {
        assert!(ChildMessage::parse(r#"{"other": 1}"#).is_none());
    }

    #[test]
    fn non_json_line_is_ignored() {
        assert!(ChildMessage::parse("hello\n").is_none());
    }
}
