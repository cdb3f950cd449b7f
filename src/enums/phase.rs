use std::fmt::Display;

/// 엔진이 현재 진행중인 단계. 로그와 trace span 에만 쓰임.
#[derive(Clone, PartialEq, Eq, Copy, Debug)]
pub enum GamePhase {
    Lobby,

    // 라운드 단위
    PromptVote,
    Painting,
    Stickering,
    Showcase,

    // 게임 단위
    Rating,
    Winner,
    Gallery,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Lobby => "lobby",
            GamePhase::PromptVote => "prompt-vote",
            GamePhase::Painting => "painting",
            GamePhase::Stickering => "stickering",
            GamePhase::Showcase => "showcase",
            GamePhase::Rating => "rating",
            GamePhase::Winner => "winner",
            GamePhase::Gallery => "gallery",
        }
    }
}

impl Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
