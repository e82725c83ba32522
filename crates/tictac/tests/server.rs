//! End-to-end tests: real WebSocket clients against a running server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tictac::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    start_server_with(RoomConfig::default()).await
}

async fn start_server_with(config: RoomConfig) -> String {
    launch(TictacServerBuilder::new().room_config(config)).await
}

async fn launch(builder: TictacServerBuilder) -> String {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, frame: Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send");
}

/// Next frame as raw JSON.
async fn recv_json(ws: &mut ClientWs) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for event")
        .expect("stream ended")
        .expect("recv");
    assert!(msg.is_text(), "expected a text frame, got {msg:?}");
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

async fn recv_event(ws: &mut ClientWs) -> ServerEvent {
    serde_json::from_value(recv_json(ws).await).expect("server event")
}

/// Asserts nothing arrives for a short while.
async fn assert_silent(ws: &mut ClientWs) {
    let next = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(next.is_err(), "expected no event, got {next:?}");
}

async fn join(ws: &mut ClientWs, identity: &str, room: &str) {
    send(
        ws,
        json!({"event": "join-room", "data": {"identity": identity, "roomId": room}}),
    )
    .await;
}

async fn make_move(ws: &mut ClientWs, identity: &str, room: &str, row: usize, col: usize) {
    send(
        ws,
        json!({
            "event": "make-move",
            "data": {"roomId": room, "row": row, "col": col, "identity": identity}
        }),
    )
    .await;
}

async fn chat(ws: &mut ClientWs, identity: &str, room: &str, text: &str) {
    send(
        ws,
        json!({
            "event": "send-message",
            "data": {"roomId": room, "identity": identity, "text": text}
        }),
    )
    .await;
}

/// alice and bob seated in `room`, game-start consumed by both.
async fn seated_pair(addr: &str, room: &str) -> (ClientWs, ClientWs) {
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    join(&mut alice, "alice", room).await;
    recv_event(&mut alice).await;
    join(&mut bob, "bob", room).await;
    recv_event(&mut alice).await;
    recv_event(&mut bob).await;
    (alice, bob)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_first_join_gets_room_created() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;

    join(&mut alice, "alice", "r1").await;

    assert_eq!(
        recv_json(&mut alice).await,
        json!({"event": "room-created", "data": {"roomId": "r1"}})
    );
}

#[tokio::test]
async fn test_second_join_starts_game_for_both() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    join(&mut alice, "alice", "r1").await;
    recv_event(&mut alice).await;
    join(&mut bob, "bob", "r1").await;

    let expected = json!({
        "event": "game-start",
        "data": {
            "board": [["", "", ""], ["", "", ""], ["", "", ""]],
            "players": ["alice", "bob"],
            "currentPlayer": "alice"
        }
    });
    assert_eq!(recv_json(&mut alice).await, expected);
    assert_eq!(recv_json(&mut bob).await, expected);
}

#[tokio::test]
async fn test_third_join_is_told_room_is_full() {
    let addr = start_server().await;
    let (mut alice, mut bob) = seated_pair(&addr, "r1").await;
    let mut carol = connect(&addr).await;

    join(&mut carol, "carol", "r1").await;

    assert_eq!(
        recv_json(&mut carol).await,
        json!({
            "event": "room-full",
            "data": {"message": "Room is full. Please join another room."}
        })
    );
    assert_silent(&mut alice).await;
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_game_played_to_a_win() {
    let addr = start_server().await;
    let (mut alice, mut bob) = seated_pair(&addr, "r1").await;

    let moves = [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)];
    for (n, (row, col)) in moves.into_iter().enumerate() {
        if n % 2 == 0 {
            make_move(&mut alice, "alice", "r1", row, col).await;
        } else {
            make_move(&mut bob, "bob", "r1", row, col).await;
        }
        recv_event(&mut alice).await;
        if n + 1 < moves.len() {
            recv_event(&mut bob).await;
        }
    }

    let last = recv_json(&mut bob).await;
    assert_eq!(last["event"], "move-applied");
    assert_eq!(
        last["data"]["board"],
        json!([["X", "X", "X"], ["O", "O", ""], ["", "", ""]])
    );
    assert_eq!(
        last["data"]["result"],
        json!({"status": "won", "winner": "alice", "mark": "X"})
    );
    assert_eq!(last["data"]["currentPlayer"], "alice");
    assert_eq!(last["data"]["isDraw"], false);

    // The board is frozen until a reset.
    make_move(&mut bob, "bob", "r1", 2, 2).await;
    assert_silent(&mut alice).await;

    send(&mut bob, json!({"event": "reset-game", "data": {"roomId": "r1"}})).await;
    for ws in [&mut alice, &mut bob] {
        match recv_event(ws).await {
            ServerEvent::GameReset {
                board,
                current_player,
                result,
            } => {
                assert_eq!(board, <[[tictac::protocol::Cell; 3]; 3]>::default());
                assert_eq!(current_player, Identity::from("alice"));
                assert_eq!(result, GameResult::InProgress);
            }
            other => panic!("expected game-reset, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_illegal_moves_get_no_reply() {
    let addr = start_server().await;
    let (mut alice, mut bob) = seated_pair(&addr, "r1").await;

    make_move(&mut bob, "bob", "r1", 0, 0).await;
    make_move(&mut alice, "alice", "r1", 3, 3).await;
    make_move(&mut alice, "alice", "nowhere", 0, 0).await;

    assert_silent(&mut alice).await;
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_chat_reaches_room_and_errors_reach_sender() {
    let addr = start_server().await;
    let (mut alice, mut bob) = seated_pair(&addr, "r1").await;

    chat(&mut alice, "alice", "r1", "  good luck  ").await;
    for ws in [&mut alice, &mut bob] {
        let frame = recv_json(ws).await;
        assert_eq!(frame["event"], "new-message");
        assert_eq!(frame["data"]["text"], "good luck");
        assert_eq!(frame["data"]["identity"], "alice");
        assert_eq!(frame["data"]["roomId"], "r1");
        assert!(frame["data"]["timestamp"].is_string());
    }

    chat(&mut bob, "bob", "r1", " ").await;
    assert_eq!(
        recv_json(&mut bob).await,
        json!({"event": "chat-error", "data": {"message": "Message cannot be empty!"}})
    );
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_chat_without_text_is_refused_as_empty() {
    let addr = start_server().await;
    let (mut alice, mut bob) = seated_pair(&addr, "r1").await;

    send(
        &mut bob,
        json!({"event": "send-message", "data": {"roomId": "r1", "identity": "bob"}}),
    )
    .await;
    assert_eq!(
        recv_event(&mut bob).await,
        ServerEvent::ChatError {
            message: "Message cannot be empty!".into()
        }
    );

    send(
        &mut bob,
        json!({
            "event": "send-message",
            "data": {"roomId": "r1", "identity": "bob", "text": null}
        }),
    )
    .await;
    assert_eq!(
        recv_event(&mut bob).await,
        ServerEvent::ChatError {
            message: "Message cannot be empty!".into()
        }
    );
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_chat_to_missing_room() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;

    chat(&mut alice, "alice", "ghost", "anyone?").await;

    assert_eq!(
        recv_event(&mut alice).await,
        ServerEvent::ChatError {
            message: "Room not found!".into()
        }
    );
}

#[tokio::test]
async fn test_chat_limit_comes_from_room_config() {
    let addr = start_server_with(RoomConfig {
        max_chat_chars: 3,
        ..RoomConfig::default()
    })
    .await;
    let mut alice = connect(&addr).await;
    join(&mut alice, "alice", "r1").await;
    recv_event(&mut alice).await;

    chat(&mut alice, "alice", "r1", "four").await;

    assert_eq!(
        recv_event(&mut alice).await,
        ServerEvent::ChatError {
            message: "Message too long! (max 3 characters)".into()
        }
    );
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;

    alice
        .send(Message::Text("not json".into()))
        .await
        .expect("send");
    send(&mut alice, json!({"event": "self-destruct", "data": {}})).await;
    assert_silent(&mut alice).await;

    // The connection is still served.
    join(&mut alice, "alice", "r1").await;
    assert_eq!(
        recv_event(&mut alice).await,
        ServerEvent::RoomCreated {
            room_id: RoomId::from("r1")
        }
    );
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let addr = start_server().await;
    let (mut alice, _bob) = seated_pair(&addr, "r1").await;
    let mut dave = connect(&addr).await;
    join(&mut dave, "dave", "r2").await;
    recv_event(&mut dave).await;

    make_move(&mut alice, "alice", "r1", 1, 1).await;
    chat(&mut alice, "alice", "r1", "hi").await;

    recv_event(&mut alice).await;
    recv_event(&mut alice).await;
    assert_silent(&mut dave).await;
}

#[tokio::test]
async fn test_disconnect_keeps_seat() {
    let addr = start_server().await;
    let (mut alice, bob) = seated_pair(&addr, "r1").await;

    make_move(&mut alice, "alice", "r1", 0, 0).await;
    recv_event(&mut alice).await;
    drop(bob);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // bob comes back on a new connection and still owns seat 1.
    let mut bob_again = connect(&addr).await;
    make_move(&mut bob_again, "bob", "r1", 1, 1).await;

    match recv_event(&mut alice).await {
        ServerEvent::MoveApplied {
            current_player,
            board,
            ..
        } => {
            assert_eq!(current_player, Identity::from("alice"));
            assert_eq!(board[1][1], tictac::protocol::Cell::O);
        }
        other => panic!("expected move-applied, got {other:?}"),
    }
    // Not in the room's audience: never joined on this connection.
    assert_silent(&mut bob_again).await;
}

#[tokio::test]
async fn test_idle_socket_does_not_block_other_clients() {
    let addr = start_server().await;

    // Connects over TCP but never sends the upgrade request.
    let _idle = tokio::net::TcpStream::connect(&addr)
        .await
        .expect("tcp connect");

    let connected =
        tokio::time::timeout(Duration::from_secs(3), connect(&addr)).await;
    let mut alice = connected.expect("accept loop stalled behind an idle socket");

    join(&mut alice, "alice", "r1").await;
    assert_eq!(
        recv_event(&mut alice).await,
        ServerEvent::RoomCreated {
            room_id: RoomId::from("r1")
        }
    );
}

#[tokio::test]
async fn test_idle_socket_is_dropped_after_handshake_timeout() {
    use tokio::io::AsyncReadExt;

    let builder =
        TictacServerBuilder::new().handshake_timeout(Duration::from_millis(100));
    let addr = launch(builder).await;
    let mut idle = tokio::net::TcpStream::connect(&addr)
        .await
        .expect("tcp connect");

    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(2), idle.read(&mut buf))
        .await
        .expect("server should close the idle socket");
    // EOF, or a reset if the kernel saw the drop first.
    assert!(matches!(read, Ok(0) | Err(_)));
}
