/* Copyright (c) Fortanix, Inc.
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fmt;
use std::io::Error as IoError;
use std::result::Result as StdResult;

pub type Result<T> = StdResult<T, Error>;

/// The point of the exchange at which an established connection failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Write,
    Read,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Write => f.write_str("sending command"),
            Stage::Read => f.write_str("reading reply"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to connect to taskbook server at {endpoint}")]
    Connection {
        endpoint: String,
        #[source]
        source: IoError,
    },
    #[error("failed to encode command record")]
    Encoding(#[source] serde_json::Error),
    #[error("error communicating with taskbook server while {stage}")]
    Transport {
        stage: Stage,
        #[source]
        source: IoError,
    },
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Fieldless discriminant of [`Error`], for callers that only need to know
/// which part of the exchange failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Encoding,
    Transport,
    Config,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Connection => 2,
            ErrorKind::Encoding => 3,
            ErrorKind::Transport => 4,
            ErrorKind::Config => 5,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Encoding(err)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connection { .. } => ErrorKind::Connection,
            Error::Encoding(_) => ErrorKind::Encoding,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    pub fn connection<E: Into<String>>(endpoint: E, source: IoError) -> Error {
        Error::Connection {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn transport(stage: Stage, source: IoError) -> Error {
        Error::Transport { stage, source }
    }

    pub fn config<M: Into<String>>(msg: M) -> Error {
        Error::Config(msg.into())
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;
    use std::error::Error as StdError;
    use std::io::{Error as IoError, ErrorKind as IoErrorKind};

    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let errors = vec![
            Error::connection("127.0.0.1:2222", IoError::from(IoErrorKind::ConnectionRefused)),
            Error::from(json_err),
            Error::transport(Stage::Read, IoError::from(IoErrorKind::ConnectionReset)),
            Error::config("reply buffer size must be non-zero"),
        ];

        let kinds: Vec<ErrorKind> = errors.iter().map(Error::kind).collect();
        assert_eq!(kinds, [ErrorKind::Connection, ErrorKind::Encoding, ErrorKind::Transport, ErrorKind::Config]);

        let codes: HashSet<i32> = kinds.iter().map(|k| k.exit_code()).collect();
        assert_eq!(codes.len(), 4);
        assert!(!codes.contains(&0));
    }

    #[test]
    fn messages_name_the_stage() {
        let err = Error::connection("localhost:2222", IoError::from(IoErrorKind::ConnectionRefused));
        assert_eq!(err.to_string(), "failed to connect to taskbook server at localhost:2222");
        assert!(err.source().is_some());

        let err = Error::transport(Stage::Write, IoError::from(IoErrorKind::BrokenPipe));
        assert_eq!(err.to_string(), "error communicating with taskbook server while sending command");

        let err = Error::transport(Stage::Read, IoError::from(IoErrorKind::TimedOut));
        assert_eq!(err.to_string(), "error communicating with taskbook server while reading reply");
    }
}
