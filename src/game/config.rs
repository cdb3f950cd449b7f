use std::time::Duration;

use serde::Deserialize;

/// 한 게임에서 쓰이는 단계별 시간 (초 단위, 따로 적힌 것 제외).
///
/// 세션 생성 시점에 값으로 넘겨받으며 이후 바뀌지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameTimings {
    pub prompt_vote: u32,
    pub painting: u32,
    pub troll_cooldown: u32,
    pub troll_effect_duration_ms: u64,
    pub showcase: u32,
    pub rating: u32,
    pub gallery: u32,
    pub announce: u32,
    pub tick_period_ms: u64,
}

impl GameTimings {
    pub fn standard() -> Self {
        Self {
            prompt_vote: 20,
            painting: 90,
            troll_cooldown: 10,
            troll_effect_duration_ms: 5_000,
            showcase: 15,
            rating: 20,
            gallery: 90,
            announce: 3,
            tick_period_ms: 1_000,
        }
    }

    /// 혼자 테스트할 때 쓰는 짧은 프로필.
    pub fn debug() -> Self {
        Self {
            prompt_vote: 10,
            painting: 15,
            troll_cooldown: 1,
            troll_effect_duration_ms: 3_000,
            showcase: 5,
            rating: 10,
            gallery: 10,
            announce: 1,
            tick_period_ms: 1_000,
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }
}

impl Default for GameTimings {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub timings: GameTimings,
    /// 인원이 0 이 되어도 종료하지 않음
    pub pinned: bool,
    /// 세션 로그를 debug-message-event 로도 뿌림
    pub debug_messages: bool,
    pub inbound_capacity: usize,
}

impl SessionConfig {
    pub fn standard() -> Self {
        Self {
            timings: GameTimings::standard(),
            pinned: false,
            debug_messages: false,
            inbound_capacity: 256,
        }
    }

    pub fn debug() -> Self {
        Self {
            timings: GameTimings::debug(),
            pinned: false,
            debug_messages: true,
            inbound_capacity: 256,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::standard()
    }
}
