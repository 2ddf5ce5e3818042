//! Async client core for the TeamSpeak 3 ServerQuery protocol.
//!
//! This crate owns the wire codec, the request/response turn-taking over a
//! single persistent connection, and the fan-out of asynchronous
//! notifications to any number of subscribers. It does not implement a
//! command-line shell or any bot-framework conveniences built on top —
//! those belong in a separate crate.
//!
//! ```no_run
//! # async fn run() -> Result<(), ts3query::Error> {
//! use tokio_util::sync::CancellationToken;
//!
//! let (client, mut events) = ts3query::ClientBuilder::new("127.0.0.1:10011")
//!     .connect()
//!     .await?;
//!
//! client.login(CancellationToken::new(), "serveradmin", "secret").await?;
//! client.use_server(CancellationToken::new(), 1).await?;
//!
//! let clients = client.client_list(CancellationToken::new()).await?;
//! for c in clients {
//!     println!("{} ({})", c.nickname, c.id);
//! }
//!
//! tokio::spawn(async move {
//!     while let Some(event) = events.subscribe().recv().await {
//!         tracing::debug!(?event, "notification");
//!     }
//! });
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod catalog;
pub mod client;
pub mod codec;
pub mod error;
pub mod events;
pub mod multiplexer;
pub mod transport;

pub use builder::ClientBuilder;
pub use client::Client;
pub use error::Error;
pub use events::{Event, EventSource};
