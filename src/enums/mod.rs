pub mod constant;
pub mod phase;

pub use constant::*;
pub use phase::*;

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 클라이언트가 띄워야 하는 화면.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameView {
    #[default]
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "lobby")]
    Lobby,
    #[serde(rename = "announcer")]
    Announcer,
    #[serde(rename = "promptselection")]
    PromptSelection,
    #[serde(rename = "artstudio-generic")]
    ArtstudioGeneric,
    #[serde(rename = "artstudio-active")]
    ArtstudioActive,
    #[serde(rename = "gallery")]
    Gallery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Painter,
    Troll,
}

/// 트롤이 화가에게 걸 수 있는 방해 효과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Flashlight,
    Drunk,
    Flip,
    SwapTool,
    LockPencil,
}

impl Effect {
    pub const ALL: [Effect; 5] = [
        Effect::Flashlight,
        Effect::Drunk,
        Effect::Flip,
        Effect::SwapTool,
        Effect::LockPencil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Flashlight => "flashlight",
            Effect::Drunk => "drunk",
            Effect::Flip => "flip",
            Effect::SwapTool => "swap_tool",
            Effect::LockPencil => "lock_pencil",
        }
    }

    pub fn options() -> Vec<String> {
        Self::ALL.iter().map(|effect| effect.to_string()).collect()
    }
}

impl Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Effect {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|effect| effect.as_str() == s)
            .copied()
            .ok_or(())
    }
}

/// `user-command` 의 action 문자열.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    SetReady,
    SetNotReady,
    LeaveGallery,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::SetReady => "set-ready",
            UserAction::SetNotReady => "set-not-ready",
            UserAction::LeaveGallery => "leave-gallery",
        }
    }
}

impl FromStr for UserAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set-ready" => Ok(UserAction::SetReady),
            "set-not-ready" => Ok(UserAction::SetNotReady),
            "leave-gallery" => Ok(UserAction::LeaveGallery),
            _ => Err(()),
        }
    }
}

/// 평가 단계의 별점. star1 ~ star5 가 1 ~ 5 점에 대응함.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 5;

    pub fn points(&self) -> u32 {
        self.0 as u32
    }

    pub fn options() -> Vec<String> {
        (1..=Self::MAX).map(|star| format!("star{}", star)).collect()
    }
}

impl FromStr for Rating {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let star = s.strip_prefix("star").ok_or(())?;
        match star.parse::<u8>() {
            Ok(n) if (1..=Self::MAX).contains(&n) => Ok(Rating(n)),
            _ => Err(()),
        }
    }
}
