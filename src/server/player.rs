use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{Message as WsMessage, MessageStream, Session as WsSession};
use futures_util::StreamExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::enums::{GameView, DEFAULT_NICKNAME, LIMIT_MAX_NICKNAME_LEN, TEXT_KICKED_SLOW};
use crate::env::ConnectionSettings;
use crate::exception::GameError;
use crate::game::session::{JoinOutcome, SessionHandle};
use crate::server::jsons::{Command, Event, Message};
use crate::server::types::ServerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

pub fn validate_nickname(nickname: &str) -> Result<(), GameError> {
    let nickname = nickname.trim();
    if nickname.is_empty() {
        return Err(GameError::NicknameEmpty);
    }
    if nickname.chars().count() > LIMIT_MAX_NICKNAME_LEN {
        return Err(GameError::NicknameTooLong);
    }
    Ok(())
}

struct PlayerInner {
    id: PlayerId,
    nickname: RwLock<String>,
    session: Mutex<Option<SessionHandle>>,
    // None 이 되면 우편함이 닫힌 것. outbound pump 가 이를 보고 연결을 정리한다.
    mailbox: Mutex<Option<mpsc::Sender<Event>>>,
    closing: AtomicBool,
    // 더 이상 이벤트를 받지 않음 (close 진행 중이거나 느려서 쫓겨남)
    dead: AtomicBool,
    kick_reason: Mutex<Option<String>>,
    shutdown: CancellationToken,
    send_grace: Duration,
    last_heard: Mutex<Instant>,
}

/// 클라이언트 연결 하나.
///
/// 세션은 이 핸들을 참조만 하고, 실제 소켓 입출력은 `spawn` 이 띄우는 두 pump 가 담당한다.
/// 동등성과 해시는 플레이어 id 기준.
#[derive(Clone)]
pub struct PlayerHandle {
    inner: Arc<PlayerInner>,
}

impl PartialEq for PlayerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for PlayerHandle {}

impl Hash for PlayerHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("id", &self.inner.id)
            .field("nickname", &*self.inner.nickname.read())
            .finish()
    }
}

impl PlayerHandle {
    /// 소켓 없이 플레이어를 만든다. 돌려받은 수신자가 우편함의 반대편이다.
    pub fn new<T: Into<String>>(
        nickname: T,
        settings: &ConnectionSettings,
    ) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(settings.mailbox_capacity.max(1));
        let player = Self {
            inner: Arc::new(PlayerInner {
                id: PlayerId::new(),
                nickname: RwLock::new(nickname.into()),
                session: Mutex::new(None),
                mailbox: Mutex::new(Some(tx)),
                closing: AtomicBool::new(false),
                dead: AtomicBool::new(false),
                kick_reason: Mutex::new(None),
                shutdown: CancellationToken::new(),
                send_grace: settings.slow_consumer_grace(),
                last_heard: Mutex::new(Instant::now()),
            }),
        };
        (player, rx)
    }

    /// 업그레이드된 소켓으로 플레이어를 만들고 title 화면을 보낸 뒤 두 pump 를 띄운다.
    pub fn spawn(ws: WsSession, stream: MessageStream, state: ServerState) -> Self {
        let (player, rx) = Self::new(DEFAULT_NICKNAME, &state.connection);

        // 방금 만든 우편함이라 자리가 있음
        if let Err(e) = player.try_push(Event::view(GameView::Title)) {
            warn!("title 화면 전송 실패: player={}, error={}", player.id(), e);
        }

        let settings = state.connection.clone();
        actix_web::rt::spawn(outbound_pump(player.clone(), rx, ws.clone(), settings));
        actix_web::rt::spawn(inbound_pump(player.clone(), stream, ws, state));
        player
    }

    pub fn id(&self) -> PlayerId {
        self.inner.id
    }

    pub fn nickname(&self) -> String {
        self.inner.nickname.read().clone()
    }

    pub fn set_nickname<T: Into<String>>(&self, nickname: T) {
        *self.inner.nickname.write() = nickname.into();
    }

    pub fn session(&self) -> Option<SessionHandle> {
        self.inner.session.lock().clone()
    }

    pub(crate) fn attach(&self, session: SessionHandle) {
        *self.inner.session.lock() = Some(session);
    }

    fn detach(&self) -> Option<SessionHandle> {
        self.inner.session.lock().take()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.dead.load(Ordering::Acquire)
    }

    pub fn kick_reason(&self) -> Option<String> {
        self.inner.kick_reason.lock().clone()
    }

    /// 연결이 정리되기 시작하면 완료되는 토큰
    pub fn closed(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.inner.shutdown.cancelled()
    }

    fn touch(&self) {
        *self.inner.last_heard.lock() = Instant::now();
    }

    fn silent_for(&self) -> Duration {
        self.inner.last_heard.lock().elapsed()
    }

    fn try_push(&self, event: Event) -> Result<(), GameError> {
        let tx = self.inner.mailbox.lock().clone();
        let tx = tx.ok_or(GameError::MailboxClosed)?;
        tx.try_send(event).map_err(|_| GameError::MailboxClosed)
    }

    /// 우편함에 이벤트를 넣는다.
    ///
    /// 가득 차 있으면 `send_grace` 만큼 기다리고, 그래도 자리가 없으면 느린 클라이언트로 보고
    /// 연결을 끊은 뒤 `SlowConsumer` 를 돌려준다. 닫힌 플레이어에게 보내는 것은 조용히 실패한다.
    pub async fn send(&self, event: Event) -> Result<(), GameError> {
        if self.is_closed() {
            return Err(GameError::MailboxClosed);
        }
        let tx = self.inner.mailbox.lock().clone();
        let tx = tx.ok_or(GameError::MailboxClosed)?;

        let event = match tx.try_send(event) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Closed(_)) => return Err(GameError::MailboxClosed),
            Err(TrySendError::Full(event)) => event,
        };

        debug!("우편함 가득 참: player={}", self.id());
        let result = tokio::select! {
            result = tx.send_timeout(event, self.inner.send_grace) => result,
            _ = self.inner.shutdown.cancelled() => return Err(GameError::MailboxClosed),
        };

        match result {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendTimeoutError::Closed(_)) => Err(GameError::MailboxClosed),
            Err(mpsc::error::SendTimeoutError::Timeout(_)) => {
                self.kick(TEXT_KICKED_SLOW);
                Err(GameError::SlowConsumer)
            }
        }
    }

    /// 더 이상 배달하지 않고 연결 종료를 요청한다. 세션 안에서 불려도 막히지 않는다.
    pub fn kick<T: Into<String>>(&self, reason: T) {
        if self.inner.dead.swap(true, Ordering::AcqRel) {
            return;
        }
        let reason = reason.into();
        warn!("플레이어 강제 종료: player={}, reason={}", self.id(), reason);
        *self.inner.kick_reason.lock() = Some(reason);
        self.inner.shutdown.cancel();
    }

    /// 새 세션을 만들고 그 호스트가 된다.
    pub async fn create_session(&self, state: &ServerState) -> SessionHandle {
        state
            .registry
            .create(self.clone(), state.session_config.clone())
            .await
    }

    /// 세션 참여를 요청한다. 세션이 받아들인 경우에만 세션 참조가 설정된다.
    pub async fn join_session(&self, handle: SessionHandle) -> Result<JoinOutcome, GameError> {
        let outcome = handle.join(self.clone()).await?;
        if outcome == JoinOutcome::Accepted {
            self.attach(handle);
        }
        Ok(outcome)
    }

    pub async fn leave_session(&self) {
        if let Some(session) = self.detach() {
            info!("세션 퇴장: player={}, session={}", self.id(), session.id());
            // 세션이 이미 끝났으면 알릴 곳이 없음
            let _ = session.leave(self.clone()).await;
        }
    }

    /// 멱등. 세션에서 빠지고, pump 들을 멈추고, 우편함을 닫는다.
    pub async fn close(&self) {
        if self.inner.closing.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("연결 종료 시작: player={}", self.id());
        self.inner.dead.store(true, Ordering::Release);
        self.inner.shutdown.cancel();
        self.leave_session().await;
        self.inner.mailbox.lock().take();
        info!("연결 종료: player={}", self.id());
    }

    /// 받은 프레임 하나를 처리한다. `Err` 는 연결을 끊어야 하는 프로토콜 오류다.
    pub async fn dispatch(&self, message: Message, state: &ServerState) -> Result<(), GameError> {
        let command = match message {
            Message::Command(command) => command,
            Message::Event(event) => {
                if self.session().is_some() {
                    debug!("클라이언트가 보낸 이벤트 무시: tag={}", event.tag());
                    return Ok(());
                }
                return Err(GameError::UnexpectedCommand(event.tag().into()));
            }
        };

        if let Some(session) = self.session() {
            if command == Command::LeaveSession {
                self.leave_session().await;
                return self.send(Event::view(GameView::Title)).await.or(Ok(()));
            }
            if session.submit(self.clone(), command).await.is_err() {
                // 세션이 사라졌으면 참조만 정리
                self.detach();
            }
            return Ok(());
        }

        if !command.is_session_management() {
            return Err(GameError::UnexpectedCommand(command.tag().into()));
        }
        match command {
            Command::CreateSession { nick_name } => {
                if let Err(e) = validate_nickname(&nick_name) {
                    return self.reject(e).await;
                }
                self.set_nickname(nick_name.trim());
                let handle = self.create_session(state).await;
                info!("세션 생성: player={}, session={}", self.id(), handle.id());
                Ok(())
            }
            Command::JoinSession {
                nick_name,
                session_id,
            } => {
                let session_id = session_id.trim();
                if session_id.is_empty() {
                    return self.reject(GameError::SessionIdEmpty).await;
                }
                if let Err(e) = validate_nickname(&nick_name) {
                    return self.reject(e).await;
                }
                let Some(handle) = state.registry.find(session_id).await else {
                    return self.reject(GameError::SessionNotFound).await;
                };
                self.set_nickname(nick_name.trim());
                match self.join_session(handle).await {
                    Ok(JoinOutcome::Accepted) => {
                        info!("세션 참여: player={}, session={}", self.id(), session_id);
                        Ok(())
                    }
                    // 거절 사유는 세션이 직접 보냄
                    Ok(JoinOutcome::Rejected) => Ok(()),
                    Err(_) => self.reject(GameError::SessionNotFound).await,
                }
            }
            // 세션 밖에서 받은 leave
            _ => Ok(()),
        }
    }

    async fn reject(&self, error: GameError) -> Result<(), GameError> {
        let reason = error.failure_reason().unwrap_or_default().to_string();
        debug!("요청 거절: player={}, error={}", self.id(), error);
        // 전달 실패는 연결 종료 경로에서 따로 처리됨
        let _ = self.send(Event::JoinFailed { reason }).await;
        Ok(())
    }
}

async fn inbound_pump(
    player: PlayerHandle,
    mut stream: MessageStream,
    mut ws: WsSession,
    state: ServerState,
) {
    loop {
        let frame = tokio::select! {
            frame = stream.next() => frame,
            _ = player.closed() => break,
        };
        let Some(frame) = frame else {
            debug!("스트림 종료: player={}", player.id());
            break;
        };
        player.touch();

        let result = match frame {
            Ok(WsMessage::Text(text)) => match Message::decode(&text) {
                Ok(message) => player.dispatch(message, &state).await,
                Err(e) => Err(e),
            },
            Ok(WsMessage::Ping(bytes)) => ws
                .pong(&bytes)
                .await
                .map_err(|e| GameError::Transport(format!("{:?}", e))),
            Ok(WsMessage::Pong(_)) | Ok(WsMessage::Nop) => Ok(()),
            Ok(WsMessage::Close(reason)) => {
                debug!("클라이언트가 연결 종료: player={}, reason={:?}", player.id(), reason);
                break;
            }
            Ok(WsMessage::Binary(_)) | Ok(WsMessage::Continuation(_)) => {
                Err(GameError::Decode("binary frames are not supported".into()))
            }
            Err(e) => Err(GameError::Transport(e.to_string())),
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_connection_fatal() => {
                warn!("연결을 끊음: player={}, error={}", player.id(), e);
                break;
            }
            Err(e) => debug!("프레임 처리 실패: player={}, error={}", player.id(), e),
        }
    }
    player.close().await;
}

async fn outbound_pump(
    player: PlayerHandle,
    mut mailbox: mpsc::Receiver<Event>,
    mut ws: WsSession,
    settings: ConnectionSettings,
) {
    let write_wait = settings.write_wait();
    let mut ping = tokio::time::interval_at(
        tokio::time::Instant::now() + settings.ping_period(),
        settings.ping_period(),
    );

    loop {
        tokio::select! {
            biased;

            _ = player.closed() => {
                if let Some(reason) = player.kick_reason() {
                    if let Ok(text) = (Event::Kicked { reason }).encode() {
                        let _ = tokio::time::timeout(write_wait, ws.text(text)).await;
                    }
                }
                break;
            }
            event = mailbox.recv() => {
                let Some(event) = event else {
                    debug!("우편함 닫힘: player={}", player.id());
                    break;
                };
                let text = match event.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        error!("이벤트 직렬화 실패, 전달 생략: player={}, error={}", player.id(), e);
                        continue;
                    }
                };
                match tokio::time::timeout(write_wait, ws.text(text)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        debug!("쓰기 실패: player={}, error={:?}", player.id(), e);
                        break;
                    }
                    Err(_) => {
                        warn!("쓰기 시간 초과: player={}", player.id());
                        break;
                    }
                }
            }
            _ = ping.tick() => {
                if player.silent_for() > settings.pong_wait() {
                    warn!("응답 없음, 연결 종료: player={}", player.id());
                    break;
                }
                match tokio::time::timeout(write_wait, ws.ping(b"")).await {
                    Ok(Ok(())) => {}
                    _ => break,
                }
            }
        }
    }

    let _ = ws.close(None).await;
    player.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(capacity: usize, grace_ms: u64) -> ConnectionSettings {
        ConnectionSettings {
            mailbox_capacity: capacity,
            slow_consumer_grace_ms: grace_ms,
            ..Default::default()
        }
    }

    #[test]
    fn nickname_rules() {
        assert_eq!(validate_nickname(""), Err(GameError::NicknameEmpty));
        assert_eq!(validate_nickname("   "), Err(GameError::NicknameEmpty));
        assert_eq!(
            validate_nickname(&"x".repeat(LIMIT_MAX_NICKNAME_LEN + 1)),
            Err(GameError::NicknameTooLong)
        );
        assert!(validate_nickname(&"x".repeat(LIMIT_MAX_NICKNAME_LEN)).is_ok());
        assert!(validate_nickname("피카소").is_ok());
    }

    #[test]
    fn handles_compare_by_identity() {
        let (a, _rx_a) = PlayerHandle::new("same", &settings(4, 10));
        let (b, _rx_b) = PlayerHandle::new("same", &settings(4, 10));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn send_reaches_the_mailbox_in_order() {
        let (player, mut rx) = PlayerHandle::new("alice", &settings(4, 10));
        player.send(Event::pop_up("one")).await.unwrap();
        player.send(Event::pop_up("two")).await.unwrap();
        assert_eq!(rx.recv().await, Some(Event::pop_up("one")));
        assert_eq!(rx.recv().await, Some(Event::pop_up("two")));
    }

    #[tokio::test(start_paused = true)]
    async fn full_mailbox_past_grace_kicks_the_player() {
        let (player, _rx) = PlayerHandle::new("slow", &settings(1, 50));
        player.send(Event::pop_up("fills")).await.unwrap();

        let result = player.send(Event::pop_up("overflows")).await;
        assert_eq!(result, Err(GameError::SlowConsumer));
        assert!(player.is_closed());
        assert!(player.kick_reason().is_some());

        // 이후 전송은 기다리지 않고 실패
        assert_eq!(
            player.send(Event::pop_up("late")).await,
            Err(GameError::MailboxClosed)
        );
    }

    #[tokio::test]
    async fn close_is_idempotent_and_closes_the_mailbox() {
        let (player, mut rx) = PlayerHandle::new("bye", &settings(4, 10));
        tokio::join!(player.close(), player.close());
        player.close().await;

        assert!(player.is_closed());
        assert_eq!(rx.recv().await, None);
        assert_eq!(
            player.send(Event::pop_up("x")).await,
            Err(GameError::MailboxClosed)
        );
    }
}
