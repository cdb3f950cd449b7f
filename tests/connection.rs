use std::time::Duration;

use actix_web::{test as actix_test, App};
use async_tungstenite::tungstenite::Message as WsMessage;
use chaos_paint::{
    enums::{GameView, TEXT_ERROR_BAD_SESSION, TEXT_ERROR_NICK_EMPTY, TEXT_ERROR_SESSION_EMPTY},
    env::ConnectionSettings,
    server::{
        end_point,
        jsons::{Command, Event},
    },
    test::{fast_session_config, spawn_server, spawn_server_with, WebSocketTest},
};

fn is_view(view: GameView) -> impl Fn(&Event) -> bool {
    move |event| matches!(event, Event::ChangeView(v) if v.view == view)
}

async fn create(ws: &mut WebSocketTest, nickname: &str) -> String {
    ws.send(Command::CreateSession {
        nick_name: nickname.into(),
    })
    .await
    .unwrap();
    match ws
        .expect_event(|e| matches!(e, Event::EnterSession { .. }))
        .await
    {
        Event::EnterSession { session_id } => session_id,
        _ => unreachable!(),
    }
}

#[actix_web::test]
async fn connecting_shows_the_title_screen() {
    let (addr, _state, handle) = spawn_server(fast_session_config()).await;
    let mut ws = WebSocketTest::connect(addr).await.unwrap();

    assert_eq!(ws.next_event().await, Some(Event::view(GameView::Title)));
    handle.stop(false).await;
}

#[actix_web::test]
async fn create_session_puts_the_host_in_the_lobby() {
    let (addr, state, handle) = spawn_server(fast_session_config()).await;
    let mut ws = WebSocketTest::connect(addr).await.unwrap();

    let session_id = create(&mut ws, "  alice  ").await;
    assert!(!session_id.is_empty());
    assert_eq!(
        ws.expect_event(|e| matches!(e, Event::PlayersChanged { .. }))
            .await,
        Event::PlayersChanged {
            players: vec!["alice".into()],
            added_player: Some("alice".into()),
            removed_player: None,
        }
    );
    ws.expect_event(is_view(GameView::Lobby)).await;
    assert!(state.registry.find(&session_id).await.is_some());
    handle.stop(false).await;
}

#[actix_web::test]
async fn invalid_admission_keeps_the_connection_open() {
    let (addr, _state, handle) = spawn_server(fast_session_config()).await;
    let mut ws = WebSocketTest::connect(addr).await.unwrap();
    ws.expect_event(is_view(GameView::Title)).await;

    ws.send(Command::CreateSession {
        nick_name: "   ".into(),
    })
    .await
    .unwrap();
    assert_eq!(
        ws.next_event().await,
        Some(Event::JoinFailed {
            reason: TEXT_ERROR_NICK_EMPTY.into()
        })
    );

    ws.send(Command::JoinSession {
        nick_name: "bob".into(),
        session_id: "".into(),
    })
    .await
    .unwrap();
    assert_eq!(
        ws.next_event().await,
        Some(Event::JoinFailed {
            reason: TEXT_ERROR_SESSION_EMPTY.into()
        })
    );

    ws.send(Command::JoinSession {
        nick_name: "bob".into(),
        session_id: "no-such-session".into(),
    })
    .await
    .unwrap();
    assert_eq!(
        ws.next_event().await,
        Some(Event::JoinFailed {
            reason: TEXT_ERROR_BAD_SESSION.into()
        })
    );

    // 실패 후에도 같은 연결로 세션을 만들 수 있음
    create(&mut ws, "bob").await;
    handle.stop(false).await;
}

#[actix_web::test]
async fn second_client_joins_by_session_id() {
    let (addr, _state, handle) = spawn_server(fast_session_config()).await;
    let mut host = WebSocketTest::connect(addr).await.unwrap();
    let session_id = create(&mut host, "alice").await;
    host.expect_event(is_view(GameView::Lobby)).await;

    let mut guest = WebSocketTest::connect(addr).await.unwrap();
    guest
        .send(Command::JoinSession {
            nick_name: "bob".into(),
            session_id: session_id.clone(),
        })
        .await
        .unwrap();
    assert_eq!(
        guest
            .expect_event(|e| matches!(e, Event::EnterSession { .. }))
            .await,
        Event::EnterSession { session_id }
    );
    assert_eq!(
        host.expect_event(|e| matches!(e, Event::PlayersChanged { added_player: Some(_), .. }))
            .await,
        Event::PlayersChanged {
            players: vec!["alice".into(), "bob".into()],
            added_player: Some("bob".into()),
            removed_player: None,
        }
    );
    handle.stop(false).await;
}

#[actix_web::test]
async fn leave_command_returns_to_title_and_frees_the_session() {
    let (addr, state, handle) = spawn_server(fast_session_config()).await;
    let mut ws = WebSocketTest::connect(addr).await.unwrap();
    let session_id = create(&mut ws, "alice").await;
    ws.expect_event(is_view(GameView::Lobby)).await;

    ws.send(Command::LeaveSession).await.unwrap();
    ws.expect_event(is_view(GameView::Title)).await;

    for _ in 0..50 {
        if state.registry.find(&session_id).await.is_none() {
            handle.stop(false).await;
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session {} is still registered", session_id);
}

#[actix_web::test]
async fn disconnect_removes_the_player_from_the_session() {
    let (addr, _state, handle) = spawn_server(fast_session_config()).await;
    let mut host = WebSocketTest::connect(addr).await.unwrap();
    let session_id = create(&mut host, "alice").await;

    let mut guest = WebSocketTest::connect(addr).await.unwrap();
    guest
        .send(Command::JoinSession {
            nick_name: "bob".into(),
            session_id,
        })
        .await
        .unwrap();
    guest.expect_event(is_view(GameView::Lobby)).await;
    drop(guest);

    assert_eq!(
        host.expect_event(|e| matches!(e, Event::PlayersChanged { removed_player: Some(_), .. }))
            .await,
        Event::PlayersChanged {
            players: vec!["alice".into()],
            added_player: None,
            removed_player: Some("bob".into()),
        }
    );
    handle.stop(false).await;
}

#[actix_web::test]
async fn silent_peer_is_dropped_after_pong_wait() {
    let connection = ConnectionSettings {
        pong_wait_seconds: 2,
        ping_period_seconds: 1,
        ..Default::default()
    };
    let (addr, _state, handle) = spawn_server_with(fast_session_config(), connection).await;
    let mut host = WebSocketTest::connect(addr).await.unwrap();
    let session_id = create(&mut host, "alice").await;

    let mut silent = WebSocketTest::connect(addr).await.unwrap();
    silent
        .send(Command::JoinSession {
            nick_name: "bob".into(),
            session_id,
        })
        .await
        .unwrap();
    silent.expect_event(is_view(GameView::Lobby)).await;

    // bob 은 더 이상 읽지 않으므로 ping 에 답하지 않는다. alice 는 읽는 동안 pong 을 보낸다.
    assert_eq!(
        host.expect_event(|e| matches!(e, Event::PlayersChanged { removed_player: Some(_), .. }))
            .await,
        Event::PlayersChanged {
            players: vec!["alice".into()],
            added_player: None,
            removed_player: Some("bob".into()),
        }
    );
    silent.expect_closed().await;

    // 응답하던 쪽은 계속 붙어 있음
    host.send(Command::User {
        action: "set-ready".into(),
    })
    .await
    .unwrap();
    host.expect_event(|e| matches!(e, Event::ReadyStateChanged { .. }))
        .await;
    handle.stop(false).await;
}

#[actix_web::test]
async fn game_command_outside_a_session_closes_the_connection() {
    let (addr, _state, handle) = spawn_server(fast_session_config()).await;
    let mut ws = WebSocketTest::connect(addr).await.unwrap();
    ws.expect_event(is_view(GameView::Title)).await;

    ws.send(Command::Vote {
        option: "star5".into(),
    })
    .await
    .unwrap();
    assert!(ws.expect_closed().await.is_empty());
    handle.stop(false).await;
}

#[actix_web::test]
async fn malformed_frames_close_the_connection() {
    let (addr, _state, handle) = spawn_server(fast_session_config()).await;

    for frame in [
        WsMessage::Text("{ not json".into()),
        WsMessage::Text(r#"{"type":"launch-rocket-command"}"#.into()),
        WsMessage::Text(r#"{"nickName":"no tag"}"#.into()),
        WsMessage::Binary(vec![1, 2, 3]),
    ] {
        let mut ws = WebSocketTest::connect(addr).await.unwrap();
        ws.expect_event(is_view(GameView::Title)).await;
        ws.send_raw(frame).await.unwrap();
        assert!(ws.expect_closed().await.is_empty());
    }
    handle.stop(false).await;
}

#[actix_web::test]
async fn health_check_answers_ok() {
    let app = actix_test::init_service(App::new().configure(end_point::configure)).await;
    let req = actix_test::TestRequest::get().uri("/health").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = actix_test::read_body(resp).await;
    assert_eq!(body, "OK");
}
