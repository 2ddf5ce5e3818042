//! Line-framed transport over any async byte stream (Component A).
//!
//! The reference server pads its banner lines with control bytes; every line
//! read back is scrubbed to the printable-ASCII range before it reaches the
//! rest of the client.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Error;

/// Reads and writes `\n`-terminated ServerQuery control lines.
///
/// Generic over the underlying stream so tests can substitute an in-memory
/// duplex pipe for a real `TcpStream`.
pub struct LineTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R, W> LineTransport<R, W>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Writes one command line, appending the `\n` terminator.
    pub async fn write_line(&mut self, line: &str) -> Result<(), Error> {
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(Error::Transport)?;
        self.writer.write_all(b"\n").await.map_err(Error::Transport)?;
        self.writer.flush().await.map_err(Error::Transport)
    }

    /// Reads one line, stripping `\r` and any byte outside 0x20-0x7E.
    ///
    /// Returns [`Error::Eof`] once the peer closes the connection.
    pub async fn read_line(&mut self) -> Result<String, Error> {
        let mut raw = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut raw)
            .await
            .map_err(Error::Transport)?;
        if n == 0 {
            return Err(Error::Eof);
        }
        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        Ok(scrub(&raw))
    }
}

fn scrub(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| (0x20..=0x7E).contains(*b))
        .map(|b| *b as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let (client, mut server) = duplex(256);
        let (read_half, write_half) = tokio::io::split(client);
        let mut transport = LineTransport::new(read_half, write_half);

        transport.write_line("clientlist -uid").await.unwrap();

        let mut buf = [0u8; 64];
        let n = tokio::io::AsyncReadExt::read(&mut server, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"clientlist -uid\n");
    }

    #[tokio::test]
    async fn read_line_strips_cr_and_scrubs_control_bytes() {
        let (client, mut server) = duplex(256);
        let (read_half, write_half) = tokio::io::split(client);
        let mut transport = LineTransport::new(read_half, write_half);

        tokio::io::AsyncWriteExt::write_all(&mut server, b"\x01\x02banner\x00\r\n")
            .await
            .unwrap();

        let line = transport.read_line().await.unwrap();
        assert_eq!(line, "banner");
    }

    #[tokio::test]
    async fn read_line_on_closed_peer_is_eof() {
        let (client, server) = duplex(256);
        let (read_half, write_half) = tokio::io::split(client);
        let mut transport = LineTransport::new(read_half, write_half);
        drop(server);

        let err = transport.read_line().await.unwrap_err();
        assert!(matches!(err, Error::Eof));
    }
}
