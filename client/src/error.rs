//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Client error types

use std::fmt;
use std::io;
use tokio_util::codec::LinesCodecError;

/// Client error type
#[derive(Debug, Clone)]
pub enum ClientError {
    /// The server could not be reached
    Connect(String),

    /// Connecting took longer than the configured timeout
    ConnectionTimeout,

    /// No reply line arrived within the configured timeout
    ReadTimeout,

    /// The server closed the connection without replying
    ///
    /// The server answers malformed requests and failed lookups this way.
    NoResponse,

    /// I/O error after the connection was established
    Io(String),

    /// The reply could not be decoded
    Codec(String),
}

impl ClientError {
    /// Check if the error means the server was never reached
    pub fn is_connect_error(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::ConnectionTimeout)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "Could not connect: {}", e),
            Self::ConnectionTimeout => write!(f, "Connection timeout"),
            Self::ReadTimeout => write!(f, "Read timeout"),
            Self::NoResponse => write!(f, "Server closed the connection without a reply"),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Codec(e) => write!(f, "Codec error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<io::Error> for ClientError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::TimedOut => Self::ReadTimeout,
            io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => Self::NoResponse,
            _ => Self::Io(error.to_string()),
        }
    }
}

impl From<LinesCodecError> for ClientError {
    fn from(error: LinesCodecError) -> Self {
        match error {
            LinesCodecError::Io(e) => e.into(),
            other => Self::Codec(other.to_string()),
        }
    }
}

/// Client result type
pub type Result<T> = std::result::Result<T, ClientError>;
