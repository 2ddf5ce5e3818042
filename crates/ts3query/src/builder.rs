//! Connection setup: [`ClientBuilder`] collects the handful of tunables a
//! caller might want to override before the banner exchange and turn loop
//! start up.

use std::time::Duration;

use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::sync::CancellationToken;

use crate::client::Client;
use crate::error::Error;
use crate::events::EventSource;
use crate::multiplexer;
use crate::transport::LineTransport;

const DEFAULT_BANNER_LINES: usize = 2;
const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_SUBMISSION_QUEUE_CAPACITY: usize = 32;
const DEFAULT_SUBSCRIBER_CAPACITY: usize = 10;

/// Builds a [`Client`] connected over TCP.
///
/// ```no_run
/// # async fn run() -> Result<(), ts3query::Error> {
/// let (client, events) = ts3query::ClientBuilder::new("127.0.0.1:10011")
///     .turn_timeout(std::time::Duration::from_secs(3))
///     .connect()
///     .await?;
/// # let _ = (client, events);
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder<A> {
    addr: A,
    banner_lines: usize,
    turn_timeout: Duration,
    submission_queue_capacity: usize,
    subscriber_capacity: usize,
}

impl<A: ToSocketAddrs> ClientBuilder<A> {
    pub fn new(addr: A) -> Self {
        Self {
            addr,
            banner_lines: DEFAULT_BANNER_LINES,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            submission_queue_capacity: DEFAULT_SUBMISSION_QUEUE_CAPACITY,
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }

    /// Number of banner lines to discard before the connection is
    /// considered ready for its first command. The reference server sends
    /// two: a greeting and a version/build line.
    pub fn banner_lines(mut self, n: usize) -> Self {
        self.banner_lines = n;
        self
    }

    /// How long a single command waits for its status line before the
    /// caller is failed with [`Error::Timeout`].
    pub fn turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Bound on commands queued ahead of the one currently in flight.
    pub fn submission_queue_capacity(mut self, n: usize) -> Self {
        self.submission_queue_capacity = n;
        self
    }

    /// Bound on buffered, undelivered events per subscriber.
    pub fn subscriber_capacity(mut self, n: usize) -> Self {
        self.subscriber_capacity = n;
        self
    }

    /// Connects, consumes the banner, and starts the background Reader and
    /// Driver tasks, returning a [`Client`] handle and its paired
    /// [`EventSource`].
    pub async fn connect(self) -> Result<(Client, EventSource), Error> {
        let stream = TcpStream::connect(self.addr).await.map_err(Error::Transport)?;
        let (read_half, write_half) = stream.into_split();
        let transport = LineTransport::new(read_half, write_half);
        self.connect_with_transport(transport, CancellationToken::new()).await
    }

    /// Same as [`Self::connect`] but over an already-established transport
    /// and with caller-supplied lifetime control. Exercised directly by
    /// integration tests against an in-memory duplex pipe.
    pub async fn connect_with_transport<R, W>(
        self,
        transport: LineTransport<R, W>,
        shutdown: CancellationToken,
    ) -> Result<(Client, EventSource), Error>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let (handle, source) = multiplexer::run(
            transport,
            self.banner_lines,
            self.turn_timeout,
            self.submission_queue_capacity,
            self.subscriber_capacity,
            shutdown.clone(),
        )
        .await?;

        let client = Client::new(handle, shutdown);
        Ok((client, source))
    }
}
