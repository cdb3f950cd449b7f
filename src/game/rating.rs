use tracing::debug;

use crate::enums::{
    GamePhase, GameView, Rating, UserAction, TEXT_ANNOUNCE_RATING, TEXT_ANNOUNCE_WINNER,
    TEXT_POPUP_ALREADY_VOTED, TEXT_POPUP_INVALID_OPTION, TEXT_VOTE_RATING,
};
use crate::game::readiness::ReadinessSet;
use crate::game::session::{PhaseResult, Session, SessionEvent};
use crate::game::vote::first_max_index;
use crate::game::RoundResult;
use crate::server::jsons::{Command, Event, ViewState};

impl Session {
    /// 모든 그림을 차례로 띄우고 각자 한 번씩 별점을 매긴다.
    pub(crate) async fn rating(&mut self, results: &mut [RoundResult]) -> PhaseResult<()> {
        debug!("phase={}", GamePhase::Rating);
        self.announce(TEXT_ANNOUNCE_RATING).await?;

        for result in results.iter_mut() {
            let mut view = ViewState::new(GameView::ArtstudioGeneric);
            view.painting = result.painting.clone();
            self.broadcast(Event::ChangeView(
                view.clone().with_vote(TEXT_VOTE_RATING, Rating::options()),
            ))
            .await;

            let ids = self.member_ids();
            let mut rated = ReadinessSet::from_members(ids.iter(), None);
            let mut timer = self.start_timer(self.config.timings.rating).await;

            while !timer.timed_out() && !rated.all_set() {
                match self.pump_events(&mut timer).await? {
                    SessionEvent::Command(player, Command::Vote { option }) => {
                        let id = player.id();
                        if rated.is_set(&id) {
                            self.pop_up(&player, TEXT_POPUP_ALREADY_VOTED).await;
                            continue;
                        }
                        match option.parse::<Rating>() {
                            Ok(rating) => {
                                result.score += rating.points();
                                rated.mark(&id);
                                self.send_to(&player, Event::ChangeView(view.clone()))
                                    .await;
                            }
                            Err(()) => self.pop_up(&player, TEXT_POPUP_INVALID_OPTION).await,
                        }
                    }
                    SessionEvent::PlayerLeft(player) => {
                        rated.remove(&player.id());
                    }
                    _ => {}
                }
            }
            self.hide_timer().await;
            debug!("rating done: prompt={}, score={}", result.painting.prompt, result.score);
        }
        Ok(())
    }

    /// 점수가 가장 높은 그림에 우승 표시를 한다. 동점이면 먼저 그린 그림.
    pub(crate) async fn reveal_winner(&mut self, results: &mut [RoundResult]) -> PhaseResult<()> {
        debug!("phase={}", GamePhase::Winner);
        self.announce(TEXT_ANNOUNCE_WINNER).await?;

        let scores: Vec<u32> = results.iter().map(|r| r.score).collect();
        if let Some(index) = first_max_index(&scores) {
            results[index].painting.winner = true;
            self.debug_print(&format!(
                "winner: {} with {} points",
                results[index].painting.prompt, results[index].score
            ))
            .await;
        }
        Ok(())
    }

    /// 모든 그림을 전시하고, 모두 나가거나 시간이 끝나면 로비로 돌아간다.
    pub(crate) async fn gallery(&mut self, results: &[RoundResult]) -> PhaseResult<()> {
        debug!("phase={}", GamePhase::Gallery);
        let view = ViewState {
            view: GameView::Gallery,
            results: results.iter().map(|r| r.painting.clone()).collect(),
            ..Default::default()
        };
        self.broadcast(Event::ChangeView(view)).await;

        let ids = self.member_ids();
        let mut finished = ReadinessSet::from_members(ids.iter(), None);
        let mut timer = self.start_timer(self.config.timings.gallery).await;

        while !timer.timed_out() && !finished.all_set() {
            match self.pump_events(&mut timer).await? {
                SessionEvent::Command(player, Command::User { action }) => {
                    if action.parse::<UserAction>() == Ok(UserAction::LeaveGallery) {
                        finished.mark(&player.id());
                    }
                }
                SessionEvent::PlayerLeft(player) => {
                    finished.remove(&player.id());
                }
                _ => {}
            }
        }
        self.hide_timer().await;
        Ok(())
    }
}
