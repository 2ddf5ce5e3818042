//! End-to-end coverage of a connection over an in-memory duplex pipe: the
//! banner, a typed command round trip, a list response, a server error,
//! and event delivery alongside a slow subscriber.

use std::time::Duration;

use tokio::io::{split, AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use ts3query::builder::ClientBuilder;
use ts3query::transport::LineTransport;
use ts3query::Event;

const BANNER: &[u8] = b"Welcome, reference server\nVersion 3.13.7 build\n";

async fn connected() -> (ts3query::Client, ts3query::EventSource, tokio::io::DuplexStream) {
    let (client_side, mut server_side) = tokio::io::duplex(8192);
    server_side.write_all(BANNER).await.unwrap();
    let (r, w) = split(client_side);
    let transport = LineTransport::new(r, w);

    let builder = ClientBuilder::new("unused")
        .banner_lines(2)
        .turn_timeout(Duration::from_millis(300));
    let (client, events) = builder
        .connect_with_transport(transport, CancellationToken::new())
        .await
        .unwrap();
    (client, events, server_side)
}

#[tokio::test]
async fn client_list_round_trips_through_typed_api() {
    let (client, _events, mut server) = connected().await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.client_list(CancellationToken::new()).await }
    });

    let mut buf = [0u8; 128];
    let n = server.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"clientlist -uid\n");

    server
        .write_all(
            b"clid=1 client_database_id=7 client_nickname=Alice client_type=0 client_unique_identifier=abc==\n\
              error id=0 msg=ok\n",
        )
        .await
        .unwrap();

    let clients = call.await.unwrap().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].nickname, "Alice");
    assert_eq!(clients[0].unique_identifier, "abc==");
}

#[tokio::test]
async fn channel_list_decodes_multiple_records() {
    let (client, _events, mut server) = connected().await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.channel_list(CancellationToken::new()).await }
    });

    let mut buf = [0u8; 128];
    server.read(&mut buf).await.unwrap();
    server
        .write_all(
            b"cid=1 pid=0 channel_name=Lobby total_clients=3|\
              cid=2 pid=0 channel_name=Support total_clients=0\n\
              error id=0 msg=ok\n",
        )
        .await
        .unwrap();

    let channels = call.await.unwrap().unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].basic.name, "Lobby");
    assert_eq!(channels[0].state.total_clients, 3);
    assert_eq!(channels[1].basic.name, "Support");
}

#[tokio::test]
async fn server_error_is_returned_not_panicked() {
    let (client, _events, mut server) = connected().await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.use_server(CancellationToken::new(), 99).await }
    });

    let mut buf = [0u8; 64];
    server.read(&mut buf).await.unwrap();
    server
        .write_all(b"error id=1281 msg=database\\sempty\\sresult\\sset\n")
        .await
        .unwrap();

    let err = call.await.unwrap().unwrap_err();
    match err {
        ts3query::Error::Server { id, msg } => {
            assert_eq!(id, 1281);
            assert_eq!(msg, "database empty result set");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn event_fanout_reaches_every_subscriber_independent_of_a_slow_one() {
    let (client, events, mut server) = connected().await;
    let mut slow = events.subscribe();
    let mut fast = events.subscribe();

    // A command keeps the Driver busy long enough to interleave two event
    // lines before the status line completes the turn.
    let call = tokio::spawn({
        let client = client.clone();
        async move { client.client_list(CancellationToken::new()).await }
    });

    let mut buf = [0u8; 64];
    server.read(&mut buf).await.unwrap();
    server
        .write_all(b"notifytextmessage targetmode=1 msg=hi target=0 invokerid=3 invokername=Bob invokeruid=xyz\n")
        .await
        .unwrap();
    server
        .write_all(b"notifyclientleftview cfid=1 ctid=0 reasonid=8 clid=3\n")
        .await
        .unwrap();
    server.write_all(b"error id=0 msg=ok\n").await.unwrap();

    call.await.unwrap().unwrap();

    // Only drain `fast`; `slow` is left unread to confirm it doesn't block
    // delivery to `fast`.
    let first = fast.recv().await.unwrap();
    let second = fast.recv().await.unwrap();
    match (first, second) {
        (Event::TextMessageReceived(m), Event::ClientLeftView(e)) => {
            assert_eq!(m.invoker_name, "Bob");
            assert_eq!(e.clid, 3);
        }
        other => panic!("unexpected events: {other:?}"),
    }

    assert!(slow.try_recv().is_ok());
}
