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

//! Error types for the weather lookup service

use std::net::SocketAddr;
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Service error types
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The listening socket could not be claimed
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: SocketAddr,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// A listener is already active in this controller
    #[error("Server already running on {0}")]
    AlreadyRunning(SocketAddr),

    /// Configuration was rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error from the underlying TCP stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The client request could not be read
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The remote resolver failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

impl ServiceError {
    /// Check if the error is a failure to claim the listening port
    pub fn is_bind_error(&self) -> bool {
        matches!(self, ServiceError::Bind { .. })
    }

    /// Check if the error reports an existing listener
    pub fn is_already_running(&self) -> bool {
        matches!(self, ServiceError::AlreadyRunning(_))
    }

    /// Check if the error is local to a single connection
    ///
    /// Connection-local errors end that connection only; the listener keeps
    /// accepting.
    pub fn is_connection_local(&self) -> bool {
        matches!(
            self,
            ServiceError::Io(_) | ServiceError::Protocol(_) | ServiceError::Fetch(_)
        )
    }
}

/// Malformed or incomplete client request
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Stream ended or sent an empty line where the city was expected
    #[error("Missing city line")]
    MissingCity,

    /// Stream ended or sent an empty line where the selector was expected
    #[error("Missing information type line")]
    MissingSelector,

    /// A request line exceeded the configured limit
    #[error("Request line exceeds {0} bytes")]
    LineTooLong(usize),

    /// No request line arrived within the read timeout
    #[error("Timed out waiting for request line")]
    ReadTimeout,
}

/// Remote resolver failure
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("Provider returned status {0}")]
    Status(u16),

    /// The payload parsed but lacked an expected field
    #[error("Missing field `{0}` in provider response")]
    MissingField(&'static str),

    /// The payload was not valid JSON
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let bind = ServiceError::Bind {
            addr: "127.0.0.1:80".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(bind.is_bind_error());
        assert!(!bind.is_already_running());
        assert!(!bind.is_connection_local());

        let running = ServiceError::AlreadyRunning("127.0.0.1:80".parse().unwrap());
        assert!(running.is_already_running());
        assert!(!running.is_bind_error());

        assert!(ServiceError::from(ProtocolError::MissingCity).is_connection_local());
        assert!(ServiceError::from(FetchError::Status(404)).is_connection_local());
    }

    #[test]
    fn test_error_display() {
        let err = ServiceError::AlreadyRunning("127.0.0.1:2017".parse().unwrap());
        assert_eq!(err.to_string(), "Server already running on 127.0.0.1:2017");

        let err = FetchError::MissingField("main.temp");
        assert_eq!(
            err.to_string(),
            "Missing field `main.temp` in provider response"
        );

        let err = ServiceError::from(ProtocolError::MissingSelector);
        assert_eq!(
            err.to_string(),
            "Protocol error: Missing information type line"
        );
    }
}
