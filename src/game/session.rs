use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Instant;

use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::enums::GameView;
use crate::exception::{GameError, SessionAbandoned};
use crate::game::config::SessionConfig;
use crate::game::readiness::ReadinessSet;
use crate::game::timer::{PhaseTimer, TIMER_HIDDEN};
use crate::server::jsons::{Command, Event, ViewState};
use crate::server::player::{PlayerHandle, PlayerId};
use crate::server::session::SessionRegistry;

pub type PhaseResult<T> = Result<T, SessionAbandoned>;

/// 세션 입력 큐에 들어가는 봉투
#[derive(Debug)]
pub struct Envelope {
    pub player: PlayerHandle,
    pub command: Command,
}

/// 참여/퇴장 요청. 세션이 처리를 마쳐야 `ack` 가 돌아온다.
struct Handoff<R> {
    player: PlayerHandle,
    ack: oneshot::Sender<R>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Accepted,
    Rejected,
}

/// 단계 로직에 전달되는 이벤트. 참여/퇴장도 여기로 합쳐서 올라온다.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Command(PlayerHandle, Command),
    PlayerJoined(PlayerHandle),
    PlayerLeft(PlayerHandle),
    Tick,
}

/// 세션 태스크에 말을 거는 유일한 수단. 레지스트리와 플레이어들이 복제해서 들고 있다.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    inbound: mpsc::Sender<Envelope>,
    joins: mpsc::Sender<Handoff<JoinOutcome>>,
    leaves: mpsc::Sender<Handoff<()>>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle").field("id", &self.id).finish()
    }
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn submit(&self, player: PlayerHandle, command: Command) -> Result<(), GameError> {
        self.inbound
            .send(Envelope { player, command })
            .await
            .map_err(|_| GameError::SessionNotFound)
    }

    /// 세션이 참여를 받아들이거나 거절할 때까지 기다린다.
    pub async fn join(&self, player: PlayerHandle) -> Result<JoinOutcome, GameError> {
        let (ack, answer) = oneshot::channel();
        self.joins
            .send(Handoff { player, ack })
            .await
            .map_err(|_| GameError::SessionNotFound)?;
        answer.await.map_err(|_| GameError::SessionNotFound)
    }

    pub async fn leave(&self, player: PlayerHandle) -> Result<(), GameError> {
        let (ack, answer) = oneshot::channel();
        self.leaves
            .send(Handoff { player, ack })
            .await
            .map_err(|_| GameError::SessionNotFound)?;
        answer.await.map_err(|_| GameError::SessionNotFound)
    }
}

/// 게임 하나의 모든 상태. 세션 태스크 하나만 소유하고 수정하므로 잠금이 없다.
pub struct Session {
    pub(crate) id: String,
    pub(crate) config: SessionConfig,
    pub(crate) joinable: bool,
    host: Option<PlayerHandle>,
    pub(crate) members: Vec<PlayerHandle>,
    inbound: mpsc::Receiver<Envelope>,
    joins: mpsc::Receiver<Handoff<JoinOutcome>>,
    leaves: mpsc::Receiver<Handoff<()>>,
    // 느려서 쫓겨난 플레이어. 다음 pump 에서 퇴장 처리된다.
    evicted: VecDeque<PlayerHandle>,
    registry: SessionRegistry,
    pub(crate) rng: StdRng,
    startup: Instant,
}

impl Session {
    pub fn new(
        id: String,
        config: SessionConfig,
        registry: SessionRegistry,
    ) -> (Self, SessionHandle) {
        let (inbound_tx, inbound) = mpsc::channel(config.inbound_capacity.max(1));
        // 용량 1 + ack 로 랑데부를 흉내냄
        let (joins_tx, joins) = mpsc::channel(1);
        let (leaves_tx, leaves) = mpsc::channel(1);

        let handle = SessionHandle {
            id: id.clone(),
            inbound: inbound_tx,
            joins: joins_tx,
            leaves: leaves_tx,
        };
        let session = Self {
            id,
            config,
            joinable: true,
            host: None,
            members: Vec::new(),
            inbound,
            joins,
            leaves,
            evicted: VecDeque::new(),
            registry,
            rng: StdRng::from_entropy(),
            startup: Instant::now(),
        };
        (session, handle)
    }

    /// 테스트에서 셔플 결과를 고정하기 위함
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// 세션 태스크 본체. 인원이 0 이 되면 (고정 세션이 아니라면) 레지스트리에서 지우고 끝난다.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn run(mut self, host: Option<PlayerHandle>) {
        if let Some(host) = host {
            self.admit(host).await;
        }
        if let Some(host) = self.host() {
            info!("세션 시작: session={}, host={}", self.id, host.nickname());
        }
        self.debug_print("session started").await;

        match self.game_loop().await {
            Ok(never) => match never {},
            Err(SessionAbandoned) => {
                info!("세션 종료: session={}, uptime_ms={}", self.id, self.elapsed_ms())
            }
        }
        self.registry.destroy(&self.id).await;
    }

    pub(crate) fn elapsed_ms(&self) -> u128 {
        self.startup.elapsed().as_millis()
    }

    /// 멤버가 없으면 끝낸다. 고정 세션은 로비에서만 빈 채로 기다린다.
    fn alive(&self) -> bool {
        !self.members.is_empty() || (self.config.pinned && self.joinable)
    }

    pub(crate) fn is_member(&self, player: &PlayerHandle) -> bool {
        self.members.contains(player)
    }

    pub(crate) fn member_ids(&self) -> Vec<PlayerId> {
        self.members.iter().map(|p| p.id()).collect()
    }

    pub fn host(&self) -> Option<&PlayerHandle> {
        self.host.as_ref()
    }

    /// 다음 이벤트 하나를 기다린다. 세션 태스크가 멈추는 곳은 여기뿐이다.
    pub(crate) async fn pump_events(&mut self, timer: &mut PhaseTimer) -> PhaseResult<SessionEvent> {
        loop {
            if let Some(player) = self.evicted.pop_front() {
                if self.remove_member(&player).await {
                    return self.surface_leave(player);
                }
                continue;
            }
            if !self.alive() {
                return Err(SessionAbandoned);
            }

            tokio::select! {
                Some(Envelope { player, command }) = self.inbound.recv() => {
                    // 퇴장 처리 뒤에 도착한 명령
                    if !self.is_member(&player) {
                        debug!("비회원 명령 무시: player={}, tag={}", player.id(), command.tag());
                        continue;
                    }
                    return Ok(SessionEvent::Command(player, command));
                }
                Some(Handoff { player, ack }) = self.joins.recv() => {
                    let outcome = self.admit(player.clone()).await;
                    let _ = ack.send(outcome);
                    if outcome == JoinOutcome::Accepted {
                        return Ok(SessionEvent::PlayerJoined(player));
                    }
                }
                Some(Handoff { player, ack }) = self.leaves.recv() => {
                    let removed = self.remove_member(&player).await;
                    let _ = ack.send(());
                    if removed {
                        return self.surface_leave(player);
                    }
                }
                _ = timer.tick() => {
                    if let Some(left) = timer.on_tick() {
                        self.broadcast(Event::TimerChanged { seconds_left: left }).await;
                    }
                    return Ok(SessionEvent::Tick);
                }
                else => return Err(SessionAbandoned),
            }
        }
    }

    fn surface_leave(&self, player: PlayerHandle) -> PhaseResult<SessionEvent> {
        if !self.alive() {
            return Err(SessionAbandoned);
        }
        Ok(SessionEvent::PlayerLeft(player))
    }

    async fn admit(&mut self, player: PlayerHandle) -> JoinOutcome {
        if !self.joinable {
            let reason = GameError::SessionNotJoinable
                .failure_reason()
                .unwrap_or_default()
                .to_string();
            self.send_to(&player, Event::JoinFailed { reason }).await;
            return JoinOutcome::Rejected;
        }
        if self.is_member(&player) {
            return JoinOutcome::Accepted;
        }

        self.members.push(player.clone());
        if self.host.is_none() {
            self.host = Some(player.clone());
        }
        info!("플레이어 참여: session={}, player={}", self.id, player.id());

        self.send_to(
            &player,
            Event::EnterSession {
                session_id: self.id.clone(),
            },
        )
        .await;
        let players = self.nicknames();
        self.broadcast(Event::PlayersChanged {
            players,
            added_player: Some(player.nickname()),
            removed_player: None,
        })
        .await;
        self.send_to(&player, Event::view(GameView::Lobby)).await;
        JoinOutcome::Accepted
    }

    async fn remove_member(&mut self, player: &PlayerHandle) -> bool {
        let Some(index) = self.members.iter().position(|p| p == player) else {
            return false;
        };
        self.members.remove(index);
        if self.host.as_ref() == Some(player) {
            self.host = self.members.first().cloned();
        }
        info!("플레이어 퇴장: session={}, player={}", self.id, player.id());

        let players = self.nicknames();
        self.broadcast(Event::PlayersChanged {
            players,
            added_player: None,
            removed_player: Some(player.nickname()),
        })
        .await;
        true
    }

    pub(crate) fn nicknames(&self) -> Vec<String> {
        self.members.iter().map(|p| p.nickname()).collect()
    }

    /// 한 명에게 보낸다. 느린 플레이어는 쫓아내고 다음 pump 에서 퇴장으로 처리한다.
    pub(crate) async fn send_to(&mut self, player: &PlayerHandle, event: Event) {
        match player.send(event).await {
            Ok(()) => {}
            Err(GameError::SlowConsumer) => {
                warn!("느린 플레이어 제외: session={}, player={}", self.id, player.id());
                if self.is_member(player) && !self.evicted.contains(player) {
                    self.evicted.push_back(player.clone());
                }
            }
            Err(e) => debug!("전달 실패: player={}, error={}", player.id(), e),
        }
    }

    pub(crate) async fn broadcast(&mut self, event: Event) {
        for player in self.members.clone() {
            self.send_to(&player, event.clone()).await;
        }
    }

    pub(crate) async fn broadcast_except(&mut self, except: &PlayerHandle, event: Event) {
        for player in self.members.clone() {
            if &player != except {
                self.send_to(&player, event.clone()).await;
            }
        }
    }

    pub(crate) async fn pop_up(&mut self, player: &PlayerHandle, message: &str) {
        self.send_to(player, Event::pop_up(message)).await;
    }

    pub(crate) async fn broadcast_ready_state(&mut self, ready: &ReadinessSet<PlayerId>) {
        let players: BTreeMap<String, bool> = self
            .members
            .iter()
            .map(|p| (p.nickname(), ready.is_set(&p.id())))
            .collect();
        self.broadcast(Event::ReadyStateChanged { players }).await;
    }

    /// 화가에게는 화가용, 나머지에게는 트롤용 화면을 보낸다.
    pub(crate) async fn update_views(
        &mut self,
        painter: &PlayerHandle,
        painter_view: &ViewState,
        troll_view: &ViewState,
    ) {
        for player in self.members.clone() {
            let view = if &player == painter {
                painter_view
            } else {
                troll_view
            };
            self.send_to(&player, Event::ChangeView(view.clone())).await;
        }
    }

    /// 남은 초를 모두에게 알리고 타이머를 시작한다.
    pub(crate) async fn start_timer(&mut self, seconds: u32) -> PhaseTimer {
        self.broadcast(Event::TimerChanged {
            seconds_left: seconds.min(i32::MAX as u32) as i32,
        })
        .await;
        PhaseTimer::countdown(seconds, self.config.timings.tick_period())
    }

    pub(crate) async fn hide_timer(&mut self) {
        self.broadcast(Event::TimerChanged {
            seconds_left: TIMER_HIDDEN,
        })
        .await;
    }

    /// 시간을 재는 동안에도 이벤트는 계속 처리한다. 명령은 버려진다.
    pub(crate) async fn wait_hidden(&mut self, seconds: u32) -> PhaseResult<()> {
        let mut timer = PhaseTimer::hidden(seconds, self.config.timings.tick_period());
        while !timer.timed_out() {
            self.pump_events(&mut timer).await?;
        }
        Ok(())
    }

    pub(crate) async fn announce(&mut self, text: &str) -> PhaseResult<()> {
        self.broadcast(Event::ChangeView(ViewState::announcer(text)))
            .await;
        self.wait_hidden(self.config.timings.announce).await
    }

    /// 화가와 트롤에게 다른 안내 문구를 띄운다.
    pub(crate) async fn split_announce(
        &mut self,
        painter: &PlayerHandle,
        painter_text: &str,
        troll_text: &str,
    ) -> PhaseResult<()> {
        self.update_views(
            painter,
            &ViewState::announcer(painter_text),
            &ViewState::announcer(troll_text),
        )
        .await;
        self.wait_hidden(self.config.timings.announce).await
    }

    pub(crate) async fn debug_print(&mut self, message: &str) {
        let elapsed = self.elapsed_ms();
        info!("[{}] {}: {}", self.id, elapsed, message);
        if self.config.debug_messages {
            self.broadcast(Event::DebugMessage {
                message: format!("{}: {}", elapsed, message),
            })
            .await;
        }
    }
}
