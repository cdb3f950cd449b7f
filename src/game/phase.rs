use std::convert::Infallible;

use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::enums::{GamePhase, GameView, UserAction, MIN_PLAYERS};
use crate::exception::SessionAbandoned;
use crate::game::readiness::ReadinessSet;
use crate::game::session::{PhaseResult, Session, SessionEvent};
use crate::game::timer::PhaseTimer;
use crate::game::RoundResult;
use crate::server::jsons::{Command, Event};

impl Session {
    /// 로비 -> 게임 -> 로비 ... 인원이 모두 빠지면 `Err` 로 빠져나온다.
    /// 고정 세션은 게임 도중 비면 그 게임만 버리고 로비로 돌아간다.
    pub(crate) async fn game_loop(&mut self) -> PhaseResult<Infallible> {
        loop {
            self.lobby().await?;
            match self.play_game().await {
                Ok(()) => {}
                Err(SessionAbandoned) if self.config.pinned => {
                    info!("빈 고정 세션, 로비로 돌아감: session={}", self.id);
                }
                Err(abandoned) => return Err(abandoned),
            }
        }
    }

    /// 두 명 이상이 모두 준비될 때까지 기다린다.
    pub(crate) async fn lobby(&mut self) -> PhaseResult<()> {
        debug!("phase={}", GamePhase::Lobby);
        self.joinable = true;
        self.broadcast(Event::view(GameView::Lobby)).await;

        let ids = self.member_ids();
        let mut ready = ReadinessSet::from_members(ids.iter(), None);
        let mut timer = PhaseTimer::never();

        while self.members.len() < MIN_PLAYERS || !ready.all_set() {
            self.broadcast_ready_state(&ready).await;

            match self.pump_events(&mut timer).await? {
                SessionEvent::Command(player, Command::User { action }) => {
                    match action.parse::<UserAction>() {
                        Ok(UserAction::SetReady) => {
                            ready.set_flag(&player.id(), true);
                        }
                        Ok(UserAction::SetNotReady) => {
                            ready.set_flag(&player.id(), false);
                        }
                        _ => debug!("로비에서 처리하지 않는 action: {}", action),
                    }
                }
                SessionEvent::PlayerJoined(player) => ready.insert_new_player(player.id()),
                SessionEvent::PlayerLeft(player) => {
                    ready.remove(&player.id());
                }
                _ => {}
            }
        }

        self.broadcast_ready_state(&ready).await;
        Ok(())
    }

    /// 모든 멤버가 한 번씩 화가가 되고, 평가, 우승자 발표, 갤러리까지 진행한다.
    pub(crate) async fn play_game(&mut self) -> PhaseResult<()> {
        self.joinable = false;
        let mut order = self.members.clone();
        order.shuffle(&mut self.rng);
        self.debug_print(&format!("game started with {} players", order.len()))
            .await;

        let mut results: Vec<RoundResult> = Vec::with_capacity(order.len());
        for painter in order {
            // 차례가 오기 전에 나간 플레이어
            if !self.is_member(&painter) {
                continue;
            }
            let painting = self.play_round(&painter).await?;
            results.push(RoundResult {
                painting,
                score: 0,
            });
        }

        self.rating(&mut results).await?;
        self.reveal_winner(&mut results).await?;
        self.gallery(&results).await?;

        info!("게임 종료: session={}, rounds={}", self.id, results.len());
        Ok(())
    }
}
