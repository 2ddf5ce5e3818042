//! The request/response multiplexer: one Reader task pulls lines off the
//! wire, one Driver task owns turn-taking and dispatch, and any number of
//! Caller tasks submit commands and await their completion.
//!
//! This mirrors a split seen in every long-lived request/response transport
//! over a single duplex stream: a dedicated reader loop hands parsed frames
//! to a driver over a channel, the driver is the only thing that ever
//! touches "what are we waiting for right now", and callers never see the
//! wire directly — they get a oneshot.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::codec::{decode_arg_map, split_records, ArgMap};
use crate::error::Error;
use crate::events::{Event, EventCatalog, Fanout};
use crate::transport::LineTransport;

/// One decoded reply: the status line's `id`/`msg`, plus every payload line
/// seen before it, already split into per-record argument regions.
#[derive(Debug)]
struct Reply {
    id: u32,
    msg: String,
    records: Vec<ArgMap>,
}

/// A line the Reader task has classified for the Driver.
enum Frame {
    /// `notify<name> ...` — an event, dispatched immediately.
    Event(String),
    /// `error id=... msg=...` — ends the current turn.
    Status { id: u32, msg: String },
    /// Anything else: a payload line belonging to the in-flight turn.
    Payload(String),
}

fn classify(line: &str) -> Frame {
    if let Some(rest) = line.strip_prefix("notify") {
        return Frame::Event(rest.to_string());
    }
    if let Some(rest) = line.strip_prefix("error ") {
        // The reference server's status line is itself prefixed with
        // "error " exactly once; a payload line that happens to start with
        // the same word is never also a status line, so no further
        // stripping is attempted here.
        let map = decode_arg_map(rest).unwrap_or_default();
        return Frame::Status {
            id: map.get_int("id") as u32,
            msg: map.get_string("msg"),
        };
    }
    Frame::Payload(line.to_string())
}

/// A queued command: its wire text and the channel its reply is delivered on.
struct Submission {
    line: String,
    reply: oneshot::Sender<Result<Reply, Error>>,
    cancel: CancellationToken,
}

/// The live half of a connection: callers hand submissions to the Driver
/// task through this handle.
#[derive(Clone)]
pub struct Handle {
    submissions: mpsc::Sender<Submission>,
}

impl Handle {
    /// Sends `line` and awaits the matching status line and any payload
    /// lines collected before it.
    ///
    /// `cancel` lets a caller abandon an in-flight turn without tearing
    /// down the connection: the Driver still drains the turn's output, it
    /// just discards it instead of completing the caller's oneshot.
    ///
    /// Used by every catalog command; the status-only variants simply
    /// discard the (always empty) record vector.
    pub async fn call(&self, line: String, cancel: CancellationToken) -> Result<Vec<ArgMap>, Error> {
        let (tx, rx) = oneshot::channel();
        self.submissions
            .send(Submission {
                line,
                reply: tx,
                cancel: cancel.clone(),
            })
            .await
            .map_err(|_| Error::Closed)?;

        let reply = tokio::select! {
            r = rx => r.map_err(|_| Error::Closed)?,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        }?;

        if reply.id != 0 {
            return Err(Error::Server {
                id: reply.id,
                msg: reply.msg,
            });
        }

        Ok(reply.records)
    }
}

/// Driver state: what, if anything, the in-flight turn is collecting.
enum DriverState {
    Idle,
    AwaitingStatus {
        submission: Submission,
        records: Vec<ArgMap>,
    },
    /// A turn timed out; its caller has already been failed. Lines keep
    /// arriving until the next status line, then the connection returns to
    /// `Idle` rather than being torn down — the reference server has no way
    /// to cancel a command already in flight, so the reply is still coming.
    Draining,
}

/// Runs the Reader + Driver pair until the connection closes or
/// `shutdown` fires. Returns once both tasks have exited.
pub async fn run<R, W>(
    mut transport: LineTransport<R, W>,
    banner_lines: usize,
    turn_timeout: Duration,
    queue_capacity: usize,
    subscriber_capacity: usize,
    shutdown: CancellationToken,
) -> Result<(Handle, crate::events::EventSource), Error>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    for _ in 0..banner_lines {
        transport.read_line().await?;
    }
    tracing::debug!(banner_lines, "banner consumed, connection ready");

    let (submit_tx, submit_rx) = mpsc::channel(queue_capacity.max(1));
    let fanout = Fanout::new(subscriber_capacity.max(1));
    let source = crate::events::EventSource::new(fanout.clone());

    tokio::spawn(drive(transport, submit_rx, fanout, turn_timeout, shutdown));

    Ok((Handle { submissions: submit_tx }, source))
}

async fn drive<R, W>(
    mut transport: LineTransport<R, W>,
    mut submit_rx: mpsc::Receiver<Submission>,
    fanout: Fanout,
    turn_timeout: Duration,
    shutdown: CancellationToken,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let catalog = EventCatalog::global();
    let mut state = DriverState::Idle;
    let mut backlog: VecDeque<Submission> = VecDeque::new();

    loop {
        match &mut state {
            DriverState::Idle => {
                if let Some(next) = backlog.pop_front() {
                    state = start_turn(&mut transport, next).await;
                    continue;
                }
                // Even with no turn in flight, the Reader keeps pulling
                // lines off the wire (spec §5): a server-pushed `notify*`
                // line must still reach the fan-out, so a plain read race
                // against submission sits alongside the submit arm.
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    submission = submit_rx.recv() => {
                        match submission {
                            Some(s) => { state = start_turn(&mut transport, s).await; }
                            None => break,
                        }
                    }
                    line = transport.read_line() => {
                        match line {
                            Ok(line) => match classify(&line) {
                                Frame::Event(rest) => dispatch_event(&fanout, catalog, &rest),
                                Frame::Status { .. } | Frame::Payload(_) => {
                                    tracing::warn!(%line, "dropping unsolicited line with no turn in flight");
                                }
                            },
                            Err(err) => {
                                tracing::warn!(error = %err, "transport failed while idle");
                                break;
                            }
                        }
                    }
                }
            }
            DriverState::AwaitingStatus { .. } => {
                // Drain any newly submitted commands into the backlog so
                // callers never block on a full queue while a turn is live.
                while let Ok(s) = submit_rx.try_recv() {
                    backlog.push_back(s);
                }

                let line = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    line = tokio::time::timeout(turn_timeout, transport.read_line()) => line,
                };

                let line = match line {
                    Ok(Ok(line)) => line,
                    Ok(Err(err)) => {
                        fail_current(&mut state, err);
                        break;
                    }
                    Err(_) => {
                        // Timed out: fail the caller, keep listening for the
                        // reply that may still be on its way.
                        let DriverState::AwaitingStatus { submission, .. } =
                            std::mem::replace(&mut state, DriverState::Draining)
                        else {
                            unreachable!()
                        };
                        let _ = submission.reply.send(Err(Error::Timeout(turn_timeout)));
                        continue;
                    }
                };

                match classify(&line) {
                    Frame::Event(rest) => dispatch_event(&fanout, catalog, &rest),
                    Frame::Status { id, msg } => {
                        let DriverState::AwaitingStatus { submission, records } =
                            std::mem::replace(&mut state, DriverState::Idle)
                        else {
                            unreachable!()
                        };
                        tracing::debug!(line = %submission.line, id, records = records.len(), "turn completed");
                        if !submission.cancel.is_cancelled() {
                            let _ = submission.reply.send(Ok(Reply { id, msg, records }));
                        }
                    }
                    Frame::Payload(payload) => {
                        if let DriverState::AwaitingStatus { records, .. } = &mut state {
                            records.extend(parse_payload(&payload));
                        }
                    }
                }
            }
            DriverState::Draining => {
                let line = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    line = transport.read_line() => line,
                };
                match line {
                    Ok(line) => match classify(&line) {
                        Frame::Event(rest) => dispatch_event(&fanout, catalog, &rest),
                        Frame::Status { .. } => state = DriverState::Idle,
                        Frame::Payload(_) => {}
                    },
                    Err(_) => break,
                }
            }
        }
    }

    drain_all(&mut state, &mut backlog, &mut submit_rx);
}

async fn start_turn<R, W>(transport: &mut LineTransport<R, W>, submission: Submission) -> DriverState
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if submission.cancel.is_cancelled() {
        let _ = submission.reply.send(Err(Error::Cancelled));
        return DriverState::Idle;
    }
    if let Err(err) = transport.write_line(&submission.line).await {
        let _ = submission.reply.send(Err(err));
        return DriverState::Idle;
    }
    DriverState::AwaitingStatus {
        submission,
        records: Vec::new(),
    }
}

fn parse_payload(payload: &str) -> Vec<ArgMap> {
    split_records(payload)
        .into_iter()
        .filter_map(|region| decode_arg_map(region).ok())
        .collect()
}

fn dispatch_event(fanout: &Fanout, catalog: &EventCatalog, rest: &str) {
    let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
    let map = match decode_arg_map(args) {
        Ok(map) => map,
        Err(err) => {
            tracing::warn!(event = name, error = %err, "dropping malformed event line");
            return;
        }
    };
    let event = catalog.build(name, &map);
    fanout.dispatch(event);
}

fn fail_current(state: &mut DriverState, err: Error) {
    if let DriverState::AwaitingStatus { submission, .. } =
        std::mem::replace(state, DriverState::Idle)
    {
        let message = err.to_string();
        let _ = submission.reply.send(Err(err));
        tracing::warn!(error = %message, "turn failed, connection unusable");
    }
}

fn drain_all(
    state: &mut DriverState,
    backlog: &mut VecDeque<Submission>,
    submit_rx: &mut mpsc::Receiver<Submission>,
) {
    if let DriverState::AwaitingStatus { submission, .. } = std::mem::replace(state, DriverState::Idle) {
        let _ = submission.reply.send(Err(Error::Closed));
    }
    while let Some(s) = backlog.pop_front() {
        let _ = s.reply.send(Err(Error::Closed));
    }
    while let Ok(s) = submit_rx.try_recv() {
        let _ = s.reply.send(Err(Error::Closed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{split, AsyncWriteExt};

    async fn setup(
        banner: &str,
    ) -> (Handle, mpsc::Receiver<Event>, tokio::io::DuplexStream, CancellationToken) {
        let (client, mut server) = tokio::io::duplex(4096);
        server.write_all(banner.as_bytes()).await.unwrap();
        let (r, w) = split(client);
        let transport = LineTransport::new(r, w);
        let shutdown = CancellationToken::new();
        let (handle, source) = run(transport, 2, Duration::from_millis(200), 8, 8, shutdown.clone())
            .await
            .unwrap();
        (handle, source.subscribe(), server, shutdown)
    }

    #[tokio::test]
    async fn successful_call_returns_records() {
        let (handle, _events, mut server, _shutdown) = setup("banner1\nbanner2\n").await;

        let call = tokio::spawn({
            let handle = handle.clone();
            async move { handle.call("clientlist -uid".into(), CancellationToken::new()).await }
        });

        let mut buf = [0u8; 128];
        let n = tokio::io::AsyncReadExt::read(&mut server, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"clientlist -uid\n");

        server
            .write_all(b"clid=1 client_nickname=Alice|clid=2 client_nickname=Bob\nerror id=0 msg=ok\n")
            .await
            .unwrap();

        let records = call.await.unwrap().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_string("client_nickname"), "Alice");
    }

    #[tokio::test]
    async fn server_error_surfaces_as_error_variant() {
        let (handle, _events, mut server, _shutdown) = setup("banner1\nbanner2\n").await;

        let call = tokio::spawn({
            let handle = handle.clone();
            async move { handle.call("use 1".into(), CancellationToken::new()).await }
        });

        let mut buf = [0u8; 64];
        tokio::io::AsyncReadExt::read(&mut server, &mut buf).await.unwrap();
        server
            .write_all(b"error id=512 msg=invalid\\sserverID\n")
            .await
            .unwrap();

        let err = call.await.unwrap().unwrap_err();
        match err {
            Error::Server { id, msg } => {
                assert_eq!(id, 512);
                assert_eq!(msg, "invalid serverID");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn event_line_is_dispatched_not_treated_as_payload() {
        let (handle, mut events, mut server, _shutdown) = setup("banner1\nbanner2\n").await;

        let call = tokio::spawn({
            let handle = handle.clone();
            async move { handle.call("clientlist".into(), CancellationToken::new()).await }
        });

        let mut buf = [0u8; 64];
        tokio::io::AsyncReadExt::read(&mut server, &mut buf).await.unwrap();
        server
            .write_all(b"notifyclientleftview cfid=1 ctid=0 reasonid=8 clid=9\nerror id=0 msg=ok\n")
            .await
            .unwrap();

        let records = call.await.unwrap().unwrap();
        assert!(records.is_empty());

        let event = events.recv().await.unwrap();
        match event {
            Event::ClientLeftView(e) => assert_eq!(e.clid, 9),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn event_line_is_dispatched_with_no_call_in_flight() {
        // A pure "subscribe and listen" session: no command is ever
        // submitted, so the driver sits in `Idle` the whole time. The
        // server push must still reach the subscriber.
        let (_handle, mut events, mut server, _shutdown) = setup("banner1\nbanner2\n").await;

        server
            .write_all(b"notifytextmessage targetmode=1 msg=hi target=0 invokerid=3 invokername=Bob invokeruid=xyz\n")
            .await
            .unwrap();

        let event = events.recv().await.unwrap();
        match event {
            Event::TextMessageReceived(e) => assert_eq!(e.invoker_name, "Bob"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
