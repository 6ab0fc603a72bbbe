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

//! Per-connection request handling
//!
//! A request is two lines: the city, then the information type. The reply is
//! one line. Requests that are incomplete, or whose lookup fails, are dropped
//! by closing the connection without writing anything; clients see an empty
//! read rather than an error message.

use crate::{
    ConnectionId, FetchError, ProtocolError, QueryKey, RecordStore, RemoteResolver, Result,
    Selector, ServerConfig, ServerMetrics, ServiceError,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, instrument};

/// Limits applied to each request
#[derive(Debug, Clone, Copy)]
pub struct HandlerConfig {
    /// Longest accepted request line in bytes
    pub max_line_length: usize,
    /// Timeout for each request line read
    pub read_timeout: Option<Duration>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        HandlerConfig::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for HandlerConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_line_length: config.max_line_length,
            read_timeout: config.read_timeout,
        }
    }
}

/// Shared request logic for every accepted connection
///
/// One handler is shared by all connections of a listener (and across listener
/// restarts), so they all read and fill the same [`RecordStore`].
pub struct ConnectionHandler {
    store: RecordStore,
    resolver: Arc<dyn RemoteResolver>,
    metrics: Arc<ServerMetrics>,
}

impl ConnectionHandler {
    /// Create a handler with an empty store
    pub fn new(resolver: Arc<dyn RemoteResolver>) -> Self {
        Self {
            store: RecordStore::new(),
            resolver,
            metrics: Arc::new(ServerMetrics::new()),
        }
    }

    /// Use an existing store
    pub fn with_store(mut self, store: RecordStore) -> Self {
        self.store = store;
        self
    }

    /// Use an existing metrics instance
    pub fn with_metrics(mut self, metrics: Arc<ServerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get the record store
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Get the metrics
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }

    /// Serve one request on `stream`
    ///
    /// Returns the reply line that was written. On error nothing has been
    /// written. The stream is closed on every path; a failed close after the
    /// reply was sent is logged and still counts as a reply.
    #[instrument(skip(self, stream, config), fields(connection_id = %id))]
    pub async fn handle<S>(
        &self,
        stream: S,
        id: ConnectionId,
        config: HandlerConfig,
    ) -> Result<String>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framed = Framed::new(
            stream,
            LinesCodec::new_with_max_length(config.max_line_length),
        );

        let request = async {
            let city = read_line(&mut framed, &config, ProtocolError::MissingCity).await?;
            let selector = read_line(&mut framed, &config, ProtocolError::MissingSelector).await?;
            Ok::<_, ServiceError>((city, Selector::parse(&selector)))
        };

        let (city, selector) = match request.await {
            Ok(request) => request,
            Err(e) => {
                if matches!(e, ServiceError::Protocol(_)) {
                    self.metrics.protocol_error();
                }
                debug!(error = %e, "Dropping connection without reply");
                return Err(e);
            }
        };

        let reply = self.answer(&city, &selector).await.inspect_err(|e| {
            debug!(%city, error = %e, "Dropping connection without reply");
        })?;

        framed.send(reply.as_str()).await.map_err(codec_error)?;
        if let Err(e) = SinkExt::<&str>::close(&mut framed).await {
            debug!(error = %e, "Failed to close connection after reply");
        }
        self.metrics.reply_sent();
        info!(%city, %selector, %reply, "Sent reply");

        Ok(reply)
    }

    /// Resolve `city` through the store and render `selector`
    ///
    /// On a miss the resolver is called and its record is cached. Resolver
    /// failures leave the store untouched.
    pub async fn answer(
        &self,
        city: &str,
        selector: &Selector,
    ) -> std::result::Result<String, FetchError> {
        let record = match self.store.get(city) {
            Some(record) => {
                info!(%city, "Serving forecast from cache");
                self.metrics.cache_hit();
                record
            }
            None => {
                info!(%city, "Cache miss, fetching forecast from resolver");
                self.metrics.cache_miss();
                let fetched = self
                    .resolver
                    .fetch(city)
                    .await
                    .inspect_err(|_| self.metrics.fetch_error())?;
                self.store.insert(QueryKey::new(city), fetched)
            }
        };

        Ok(selector.render(&record))
    }
}

impl std::fmt::Debug for ConnectionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("cached_cities", &self.store.len())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

async fn read_line<S>(
    framed: &mut Framed<S, LinesCodec>,
    config: &HandlerConfig,
    missing: ProtocolError,
) -> Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let next = match config.read_timeout {
        Some(limit) => timeout(limit, framed.next())
            .await
            .map_err(|_| ProtocolError::ReadTimeout)?,
        None => framed.next().await,
    };

    match next {
        Some(Ok(line)) if !line.is_empty() => Ok(line),
        Some(Ok(_)) | None => Err(missing.into()),
        Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
            Err(ProtocolError::LineTooLong(config.max_line_length).into())
        }
        Some(Err(LinesCodecError::Io(e))) => Err(e.into()),
    }
}

fn codec_error(error: LinesCodecError) -> ServiceError {
    match error {
        LinesCodecError::Io(e) => ServiceError::Io(e),
        other => ServiceError::Io(std::io::Error::other(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ForecastRecord;
    use async_trait::async_trait;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadBuf, duplex};
    use tracing_test::traced_test;

    struct CountingResolver {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingResolver {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteResolver for CountingResolver {
        async fn fetch(&self, _city: &str) -> std::result::Result<ForecastRecord, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FetchError::Status(404))
            } else {
                Ok(ForecastRecord::new("20.0", "3.5", "1012", "55"))
            }
        }
    }

    async fn exchange(handler: &ConnectionHandler, request: &[u8]) -> (Result<String>, String) {
        let (mut client, server) = duplex(4096);
        client.write_all(request).await.unwrap();
        client.shutdown().await.unwrap();

        let result = handler
            .handle(server, ConnectionId::new(1), HandlerConfig::default())
            .await;

        let mut received = String::new();
        client.read_to_string(&mut received).await.unwrap();
        (result, received)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let resolver = CountingResolver::new(false);
        let handler = ConnectionHandler::new(resolver.clone());

        let (result, received) = exchange(&handler, b"Paris\ntemperature\n").await;
        assert_eq!(result.unwrap(), "20.0");
        assert_eq!(received, "20.0\n");
        assert_eq!(resolver.calls(), 1);
        assert!(handler.store().contains("Paris"));

        let (_, received) = exchange(&handler, b"Paris\nall\n").await;
        assert_eq!(
            received,
            "Temp: 20.0°C, Wind: 3.5 m/s, Pressure: 1012 hPa, Humidity: 55%\n"
        );
        assert_eq!(resolver.calls(), 1);

        let snapshot = handler.metrics().snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.replies_sent, 2);
    }

    /// Duplex stream whose shutdown always fails
    struct FailingShutdown(DuplexStream);

    impl AsyncRead for FailingShutdown {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.0).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for FailingShutdown {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Pin::new(&mut self.0).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.0).poll_flush(cx)
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::other("shutdown failed")))
        }
    }

    #[tokio::test]
    async fn test_reply_is_flushed_and_stream_closed() {
        let handler = ConnectionHandler::new(CountingResolver::new(false));
        let (mut client, server) = duplex(4096);

        // The client keeps its write half open; EOF must come from the handler
        client.write_all(b"Paris\nhumidity\n").await.unwrap();
        let result = handler
            .handle(server, ConnectionId::new(1), HandlerConfig::default())
            .await;
        assert_eq!(result.unwrap(), "55");

        let mut received = String::new();
        tokio::time::timeout(Duration::from_secs(5), client.read_to_string(&mut received))
            .await
            .expect("handler left the stream open")
            .unwrap();
        assert_eq!(received, "55\n");
    }

    #[tokio::test]
    async fn test_close_failure_after_reply_still_counts() {
        let handler = ConnectionHandler::new(CountingResolver::new(false));
        let (mut client, server) = duplex(4096);
        client.write_all(b"Paris\npressure\n").await.unwrap();
        client.shutdown().await.unwrap();

        let result = handler
            .handle(
                FailingShutdown(server),
                ConnectionId::new(1),
                HandlerConfig::default(),
            )
            .await;
        assert_eq!(result.unwrap(), "1012");

        let mut received = String::new();
        client.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "1012\n");
        assert_eq!(handler.metrics().snapshot().replies_sent, 1);
    }

    #[tokio::test]
    async fn test_crlf_line_endings() {
        let handler = ConnectionHandler::new(CountingResolver::new(false));
        let (result, _) = exchange(&handler, b"Paris\r\nhumidity\r\n").await;
        assert_eq!(result.unwrap(), "55");
        assert!(handler.store().contains("Paris"));
    }

    #[tokio::test]
    async fn test_missing_selector_is_dropped_silently() {
        let resolver = CountingResolver::new(false);
        let handler = ConnectionHandler::new(resolver.clone());

        let (result, received) = exchange(&handler, b"Paris\n").await;
        assert!(matches!(
            result,
            Err(ServiceError::Protocol(ProtocolError::MissingSelector))
        ));
        assert!(received.is_empty());
        assert_eq!(resolver.calls(), 0);
        assert_eq!(handler.metrics().snapshot().protocol_errors, 1);
    }

    #[tokio::test]
    async fn test_empty_city_is_dropped_silently() {
        let handler = ConnectionHandler::new(CountingResolver::new(false));
        let (result, received) = exchange(&handler, b"\nall\n").await;
        assert!(matches!(
            result,
            Err(ServiceError::Protocol(ProtocolError::MissingCity))
        ));
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_dropped_and_not_cached() {
        let handler = ConnectionHandler::new(CountingResolver::new(true));
        let (result, received) = exchange(&handler, b"Atlantis\nall\n").await;
        assert!(matches!(
            result,
            Err(ServiceError::Fetch(FetchError::Status(404)))
        ));
        assert!(received.is_empty());
        assert!(handler.store().is_empty());
        assert_eq!(handler.metrics().snapshot().fetch_errors, 1);
    }

    #[tokio::test]
    async fn test_line_too_long() {
        let handler = ConnectionHandler::new(CountingResolver::new(false));
        let (mut client, server) = duplex(4096);
        client.write_all(&[b'x'; 64]).await.unwrap();
        client.write_all(b"\nall\n").await.unwrap();
        client.shutdown().await.unwrap();

        let config = HandlerConfig {
            max_line_length: 16,
            read_timeout: None,
        };
        let result = handler.handle(server, ConnectionId::new(2), config).await;
        assert!(matches!(
            result,
            Err(ServiceError::Protocol(ProtocolError::LineTooLong(16)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let handler = ConnectionHandler::new(CountingResolver::new(false));
        let (_client, server) = duplex(4096);

        let config = HandlerConfig {
            max_line_length: 1024,
            read_timeout: Some(Duration::from_secs(5)),
        };
        let result = handler.handle(server, ConnectionId::new(3), config).await;
        assert!(matches!(
            result,
            Err(ServiceError::Protocol(ProtocolError::ReadTimeout))
        ));
    }

    #[tokio::test]
    async fn test_answer_invalid_selector_still_caches() {
        let resolver = CountingResolver::new(false);
        let handler = ConnectionHandler::new(resolver.clone());

        let reply = handler
            .answer("Berlin", &Selector::parse("bogus"))
            .await
            .unwrap();
        assert_eq!(reply, "Invalid information type");
        assert!(handler.store().contains("Berlin"));
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_logs_cache_usage() {
        let handler = ConnectionHandler::new(CountingResolver::new(false));
        handler.answer("Vienna", &Selector::Pressure).await.unwrap();
        handler.answer("Vienna", &Selector::Pressure).await.unwrap();

        assert!(logs_contain("Cache miss, fetching forecast from resolver"));
        assert!(logs_contain("Serving forecast from cache"));
    }
}
