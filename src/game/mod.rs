pub mod config;
pub mod phase;
pub mod rating;
pub mod readiness;
pub mod round;
pub mod session;
pub mod timer;
pub mod turn_manager;
pub mod vote;

use crate::server::jsons::Painting;

/// 라운드 하나의 결과. 평가 단계에서 점수가 쌓인다.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoundResult {
    pub painting: Painting,
    pub score: u32,
}
