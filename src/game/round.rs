use rand::seq::SliceRandom;
use tracing::debug;

use crate::enums::{
    Effect, GamePhase, GameView, Role, ALL_BACKDROP_ITEMS, AVAILABLE_PROMPTS, CONTINUE_OPTION,
    PROMPT_CHOICES, TEXT_ANNOUNCE_YOU_ARE_PAINTER, TEXT_ANNOUNCE_YOU_ARE_TROLL,
    TEXT_POPUP_ALREADY_VOTED, TEXT_POPUP_INVALID_OPTION, TEXT_POPUP_NOT_YOUR_TURN,
    TEXT_VOTE_EFFECT, TEXT_VOTE_PROMPT, TEXT_VOTE_SHOWCASE,
};
use crate::game::readiness::ReadinessSet;
use crate::game::session::{PhaseResult, Session, SessionEvent};
use crate::game::turn_manager::{CastRejected, TrollRotation};
use crate::game::vote::VoteTally;
use crate::server::jsons::{Command, Event, Painting, ViewState};
use crate::server::player::PlayerHandle;

/// 한 라운드 동안 화가와 트롤이 보고 있는 화면. 그림은 양쪽에 똑같이 반영된다.
struct RoundViews {
    painter: ViewState,
    troll: ViewState,
}

impl RoundViews {
    fn update_painting(&mut self, f: impl Fn(&mut Painting)) {
        f(&mut self.painter.painting);
        f(&mut self.troll.painting);
    }
}

impl Session {
    /// `painter` 가 그리는 한 라운드. 완성된 그림을 돌려준다.
    pub(crate) async fn play_round(&mut self, painter: &PlayerHandle) -> PhaseResult<Painting> {
        self.debug_print(&format!("round for {}", painter.nickname()))
            .await;
        self.split_announce(
            painter,
            TEXT_ANNOUNCE_YOU_ARE_PAINTER,
            TEXT_ANNOUNCE_YOU_ARE_TROLL,
        )
        .await?;

        let backdrop = ALL_BACKDROP_ITEMS
            .choose(&mut self.rng)
            .map(|b| b.to_string())
            .unwrap_or_default();
        let prompts: Vec<String> = AVAILABLE_PROMPTS
            .choose_multiple(&mut self.rng, PROMPT_CHOICES)
            .map(|p| p.to_string())
            .collect();

        let mut views = RoundViews {
            painter: ViewState::new(GameView::ArtstudioGeneric),
            troll: ViewState::new(GameView::PromptSelection)
                .with_vote(TEXT_VOTE_PROMPT, prompts.clone()),
        };
        views.update_painting(|p| p.backdrop = backdrop.clone());
        self.update_views(painter, &views.painter, &views.troll)
            .await;

        // 투표한 트롤은 선택지가 사라진 화면을 받음
        views.troll.view = GameView::ArtstudioGeneric;
        views.troll.clear_vote();

        let prompt = self.prompt_vote(painter, &prompts, &views.troll).await?;
        self.debug_print(&format!("prompt: {}", prompt)).await;
        views.update_painting(|p| p.prompt = prompt.clone());

        self.painting(painter, &mut views).await?;

        // 스티커 단계는 아직 자리만 있음
        debug!("phase={}", GamePhase::Stickering);
        self.update_views(painter, &views.painter, &views.troll)
            .await;

        self.showcase(&views.painter.painting).await?;

        Ok(views.painter.painting)
    }

    /// 트롤들이 세 개의 후보 중 하나에 한 표씩 던진다. 가장 먼저 최다 득표에 도달한 후보가 이긴다.
    async fn prompt_vote(
        &mut self,
        painter: &PlayerHandle,
        prompts: &[String],
        voted_view: &ViewState,
    ) -> PhaseResult<String> {
        debug!("phase={}", GamePhase::PromptVote);
        let mut tally = VoteTally::with_jitter(prompts.len(), &mut self.rng);
        let ids = self.member_ids();
        let mut voted = ReadinessSet::from_members(ids.iter(), Some(&painter.id()));
        let mut timer = self.start_timer(self.config.timings.prompt_vote).await;

        while !timer.timed_out() && !voted.all_trolls_set() {
            match self.pump_events(&mut timer).await? {
                SessionEvent::Command(player, Command::Vote { option }) => {
                    let id = player.id();
                    if voted.role(&id) != Some(Role::Troll) {
                        self.pop_up(&player, TEXT_POPUP_NOT_YOUR_TURN).await;
                        continue;
                    }
                    if voted.is_set(&id) {
                        self.pop_up(&player, TEXT_POPUP_ALREADY_VOTED).await;
                        continue;
                    }
                    match prompts.iter().position(|p| *p == option) {
                        Some(index) => {
                            tally.cast(index);
                            voted.mark(&id);
                            self.send_to(&player, Event::ChangeView(voted_view.clone()))
                                .await;
                        }
                        None => self.pop_up(&player, TEXT_POPUP_INVALID_OPTION).await,
                    }
                }
                SessionEvent::PlayerLeft(player) => {
                    voted.remove(&player.id());
                }
                _ => {}
            }
        }
        self.hide_timer().await;

        let winner = tally.winner().unwrap_or(0);
        Ok(prompts.get(winner).cloned().unwrap_or_default())
    }

    /// 화가가 그리는 동안 트롤이 돌아가며 방해 효과를 건다.
    async fn painting(&mut self, painter: &PlayerHandle, views: &mut RoundViews) -> PhaseResult<()> {
        debug!("phase={}", GamePhase::Painting);
        views.painter.view = GameView::ArtstudioActive;
        views.troll.view = GameView::ArtstudioGeneric;
        views.troll.clear_vote();
        self.update_views(painter, &views.painter, &views.troll)
            .await;

        let mut trolls: Vec<PlayerHandle> = self
            .members
            .iter()
            .filter(|p| *p != painter)
            .cloned()
            .collect();
        trolls.shuffle(&mut self.rng);

        let effect_view = views
            .troll
            .clone()
            .with_vote(TEXT_VOTE_EFFECT, Effect::options());
        let mut rotation = TrollRotation::new(trolls, self.config.timings.troll_cooldown);
        if let Some(first) = rotation.active().cloned() {
            self.send_to(&first, Event::ChangeView(effect_view.clone()))
                .await;
        }

        let mut timer = self.start_timer(self.config.timings.painting).await;
        while !timer.timed_out() {
            match self.pump_events(&mut timer).await? {
                SessionEvent::Tick => {
                    if !rotation.on_tick() {
                        continue;
                    }
                    let (previous, next) = rotation.rotate();
                    if let Some(previous) = previous {
                        self.send_to(&previous, Event::ChangeView(views.troll.clone()))
                            .await;
                    }
                    if let Some(next) = next {
                        self.send_to(&next, Event::ChangeView(effect_view.clone()))
                            .await;
                    }
                }
                SessionEvent::Command(player, Command::Vote { option }) => {
                    let Ok(effect) = option.parse::<Effect>() else {
                        self.pop_up(&player, TEXT_POPUP_INVALID_OPTION).await;
                        continue;
                    };
                    match rotation.try_cast(&player) {
                        Ok(()) => {
                            self.debug_print(&format!("{} casts {}", player.nickname(), effect))
                                .await;
                            self.broadcast(Event::ToolModifierChanged {
                                modifier: effect.to_string(),
                                duration: self.config.timings.troll_effect_duration_ms,
                            })
                            .await;
                            self.send_to(&player, Event::ChangeView(views.troll.clone()))
                                .await;
                        }
                        Err(CastRejected::NotYourTurn) => {
                            self.pop_up(&player, TEXT_POPUP_NOT_YOUR_TURN).await
                        }
                        Err(CastRejected::AlreadyCast) => {
                            self.pop_up(&player, TEXT_POPUP_ALREADY_VOTED).await
                        }
                    }
                }
                SessionEvent::Command(player, Command::SetPainting { graphics }) => {
                    if &player != painter {
                        self.pop_up(&player, TEXT_POPUP_NOT_YOUR_TURN).await;
                        continue;
                    }
                    views.update_painting(|p| p.graphics = graphics.clone());
                    self.broadcast_except(&player, Event::PaintingChanged { graphics })
                        .await;
                }
                SessionEvent::PlayerLeft(player) => {
                    if let Some(Some(next)) = rotation.remove(&player) {
                        self.send_to(&next, Event::ChangeView(effect_view.clone()))
                            .await;
                    }
                }
                _ => {}
            }
        }

        self.hide_timer().await;
        views.painter.view = GameView::ArtstudioGeneric;
        self.update_views(painter, &views.painter, &views.troll)
            .await;
        self.broadcast(Event::ToolModifierChanged {
            modifier: String::new(),
            duration: 0,
        })
        .await;
        Ok(())
    }

    /// 완성된 그림을 모두에게 보여주고 각자 "continue" 를 누를 때까지 기다린다.
    async fn showcase(&mut self, painting: &Painting) -> PhaseResult<()> {
        debug!("phase={}", GamePhase::Showcase);
        let mut view = ViewState::new(GameView::ArtstudioGeneric);
        view.painting = painting.clone();
        self.broadcast(Event::ChangeView(
            view.clone()
                .with_vote(TEXT_VOTE_SHOWCASE, vec![CONTINUE_OPTION.to_string()]),
        ))
        .await;

        let ids = self.member_ids();
        let mut acknowledged = ReadinessSet::from_members(ids.iter(), None);
        let mut timer = self.start_timer(self.config.timings.showcase).await;

        while !timer.timed_out() && !acknowledged.all_set() {
            match self.pump_events(&mut timer).await? {
                SessionEvent::Command(player, Command::Vote { option })
                    if option == CONTINUE_OPTION =>
                {
                    // 두 번째 확인은 아무 일도 하지 않음
                    if acknowledged.mark(&player.id()) {
                        self.send_to(&player, Event::ChangeView(view.clone())).await;
                    }
                }
                SessionEvent::PlayerLeft(player) => {
                    acknowledged.remove(&player.id());
                }
                _ => {}
            }
        }
        self.hide_timer().await;
        Ok(())
    }
}
