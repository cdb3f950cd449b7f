//! 서버를 띄우고 클라이언트처럼 붙어보는 테스트 도우미.
//!
//! 통합 테스트(`tests/`)와 벤치마크에서 같이 쓴다.

use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use actix_web::{
    dev::ServerHandle,
    web::{self, Data},
    App, HttpServer,
};
use async_tungstenite::{
    tokio::{connect_async, TokioAdapter},
    tungstenite::{self, Message as WsMessage},
    WebSocketStream,
};
use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc};

use crate::{
    env::ConnectionSettings,
    game::config::{GameTimings, SessionConfig},
    server::{
        end_point,
        jsons::{Command, Event, Message},
        player::PlayerHandle,
        types::ServerState,
    },
};

/// 소켓 테스트에서 이벤트 하나를 기다리는 최대 시간
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// 멈춘 시계 위에서 이벤트를 기다릴 때의 상한. 시계가 알아서 흐르므로 길게 잡아도 된다.
pub const PAUSED_TIMEOUT: Duration = Duration::from_secs(600);

/// 짧은 타이밍, 디버그 메시지 없음
pub fn fast_session_config() -> SessionConfig {
    SessionConfig {
        timings: GameTimings::debug(),
        debug_messages: false,
        ..SessionConfig::standard()
    }
}

pub fn create_server_state(
    session_config: SessionConfig,
    connection: ConnectionSettings,
) -> Data<ServerState> {
    web::Data::new(ServerState::with_config(session_config, connection))
}

pub async fn spawn_server(
    session_config: SessionConfig,
) -> (SocketAddr, Data<ServerState>, ServerHandle) {
    spawn_server_with(session_config, ConnectionSettings::default()).await
}

/// keep-alive 같은 연결 설정을 바꿔서 띄운다.
pub async fn spawn_server_with(
    session_config: SessionConfig,
    connection: ConnectionSettings,
) -> (SocketAddr, Data<ServerState>, ServerHandle) {
    let server_state = create_server_state(session_config, connection);
    let server_state_clone = server_state.clone();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .configure(end_point::configure)
    })
    .workers(1)
    .listen(listener)
    .unwrap()
    .run();

    let handle = server.handle();
    tokio::spawn(server);

    (addr, server_state_clone, handle)
}

/// 소켓 없이 세션에 넣을 수 있는 플레이어. 우편함은 넉넉하게 잡는다.
pub fn detached_player(nickname: &str) -> (PlayerHandle, mpsc::Receiver<Event>) {
    detached_player_with(nickname, 4096, 2_000)
}

pub fn detached_player_with(
    nickname: &str,
    mailbox_capacity: usize,
    grace_ms: u64,
) -> (PlayerHandle, mpsc::Receiver<Event>) {
    let settings = ConnectionSettings {
        mailbox_capacity,
        slow_consumer_grace_ms: grace_ms,
        ..Default::default()
    };
    PlayerHandle::new(nickname, &settings)
}

/// 조건에 맞는 이벤트가 올 때까지 우편함을 비운다. 중간 이벤트는 버려진다.
pub async fn expect_event_on<F>(rx: &mut mpsc::Receiver<Event>, pred: F) -> Event
where
    F: Fn(&Event) -> bool,
{
    let wait = async {
        loop {
            match rx.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("mailbox closed while waiting for an event"),
            }
        }
    };
    match tokio::time::timeout(PAUSED_TIMEOUT, wait).await {
        Ok(event) => event,
        Err(_) => panic!("no matching event within {:?}", PAUSED_TIMEOUT),
    }
}

/// 지금까지 쌓인 이벤트를 모두 꺼낸다.
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub struct WebSocketTest {
    stream: WebSocketStream<TokioAdapter<TcpStream>>,
}

//-------------------------------
// WebSocketTest 구현
//-------------------------------
impl WebSocketTest {
    /// `/ws` 에 연결하고 래퍼 객체를 반환합니다
    pub async fn connect(addr: SocketAddr) -> Result<Self, tungstenite::Error> {
        let url = format!("ws://{}/ws", addr);
        let (stream, response) = connect_async(url).await?;

        assert_eq!(
            response.status(),
            tungstenite::http::StatusCode::SWITCHING_PROTOCOLS
        );

        Ok(Self { stream })
    }

    pub async fn send(&mut self, command: Command) -> Result<(), tungstenite::Error> {
        let text = Message::from(command)
            .encode()
            .expect("commands always serialize");
        self.send_raw(WsMessage::Text(text)).await
    }

    /// 프로토콜 밖의 프레임을 그대로 보냅니다
    pub async fn send_raw(&mut self, msg: WsMessage) -> Result<(), tungstenite::Error> {
        self.stream.send(msg).await
    }

    /// 다음 이벤트 하나를 받습니다. ping 은 pong 으로 응답하고 넘어갑니다.
    pub async fn next_event(&mut self) -> Option<Event> {
        let callback = async {
            loop {
                match self.stream.next().await {
                    Some(Ok(WsMessage::Text(text))) => match Message::decode(&text) {
                        Ok(Message::Event(event)) => return Some(event),
                        other => panic!("Unexpected frame from server: {:?}", other),
                    },
                    Some(Ok(WsMessage::Ping(data))) => {
                        self.stream.send(WsMessage::Pong(data)).await.ok();
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return None,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => return None,
                }
            }
        };
        match tokio::time::timeout(TIMEOUT, callback).await {
            Ok(result) => result,
            Err(_) => panic!("Expected event timeout after {:?}", TIMEOUT),
        }
    }

    /// 조건에 맞는 이벤트가 올 때까지 기다립니다. 연결이 닫히면 panic! 합니다.
    pub async fn expect_event<F>(&mut self, pred: F) -> Event
    where
        F: Fn(&Event) -> bool,
    {
        loop {
            match self.next_event().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("WebSocket closed unexpectedly"),
            }
        }
    }

    /// 서버가 연결을 끊을 때까지 남은 이벤트를 버립니다.
    pub async fn expect_closed(&mut self) -> Vec<Event> {
        let mut skipped = Vec::new();
        while let Some(event) = self.next_event().await {
            skipped.push(event);
        }
        skipped
    }
}
