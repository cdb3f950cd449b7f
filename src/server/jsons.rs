//! 클라이언트와 주고받는 모든 프레임의 정의.
//!
//! 모든 프레임은 `"type"` 필드를 가진 JSON 객체이며, 역직렬화는 이 태그로만 분기한다.
//! 태그가 없거나 모르는 태그면 디코딩 오류로 취급한다.
//!
//! ```
//!     use serde_json::json;
//!     json!
//!     ({
//!         "type": "join-session-command",
//!         "nickName": "bob",
//!         "sessionId": "6f1c0e2b0a6d4e53a8b1d6a2e9f1c7d4"
//!     });
//! ```
//!
//! 이벤트의 리스트, 맵 필드는 타입 자체가 `Vec`, `BTreeMap` 이므로 직렬화 시 항상 `[]`, `{}` 로 나간다.
//! 들어오는 쪽에서 빠져 있으면 `#[serde(default)]` 로 비워서 채운다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::GameView;
use crate::exception::GameError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Sticker {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Painting {
    #[serde(default)]
    pub prompt: String,
    // 그림 데이터는 서버가 해석하지 않고 그대로 중계함
    #[serde(default, rename = "path")]
    pub graphics: Value,
    #[serde(default)]
    pub backdrop: String,
    #[serde(default)]
    pub stickers: Vec<Sticker>,
    #[serde(default)]
    pub winner: bool,
}

/// `change-game-view-event` 의 본문. 역할별로 하나씩 들고 있다가 고쳐서 다시 보낸다.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub view: GameView,
    #[serde(default)]
    pub painting: Painting,
    #[serde(default)]
    pub vote_prompt: String,
    #[serde(default)]
    pub vote_options: Vec<String>,
    #[serde(default)]
    pub announcement: String,
    #[serde(default)]
    pub results: Vec<Painting>,
}

impl ViewState {
    pub fn new(view: GameView) -> Self {
        Self {
            view,
            ..Default::default()
        }
    }

    pub fn announcer<T: Into<String>>(text: T) -> Self {
        Self {
            view: GameView::Announcer,
            announcement: text.into(),
            ..Default::default()
        }
    }

    pub fn with_vote<T: Into<String>>(mut self, prompt: T, options: Vec<String>) -> Self {
        self.vote_prompt = prompt.into();
        self.vote_options = options;
        self
    }

    pub fn clear_vote(&mut self) {
        self.vote_prompt.clear();
        self.vote_options.clear();
    }
}

/// 클라이언트 -> 서버
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Command {
    #[serde(rename = "create-session-command")]
    CreateSession { nick_name: String },
    #[serde(rename = "join-session-command")]
    JoinSession { nick_name: String, session_id: String },
    #[serde(rename = "leave-session-command")]
    LeaveSession,
    #[serde(rename = "user-command")]
    User { action: String },
    #[serde(rename = "vote-command")]
    Vote { option: String },
    #[serde(rename = "place-sticker-command")]
    PlaceSticker { sticker: String, x: f64, y: f64 },
    #[serde(rename = "set-painting-command")]
    SetPainting {
        #[serde(default, rename = "path")]
        graphics: Value,
    },
}

impl Command {
    pub fn tag(&self) -> &'static str {
        match self {
            Command::CreateSession { .. } => "create-session-command",
            Command::JoinSession { .. } => "join-session-command",
            Command::LeaveSession => "leave-session-command",
            Command::User { .. } => "user-command",
            Command::Vote { .. } => "vote-command",
            Command::PlaceSticker { .. } => "place-sticker-command",
            Command::SetPainting { .. } => "set-painting-command",
        }
    }

    /// 세션에 붙지 않은 상태에서도 받아들이는 명령인지.
    pub fn is_session_management(&self) -> bool {
        matches!(
            self,
            Command::CreateSession { .. } | Command::JoinSession { .. } | Command::LeaveSession
        )
    }
}

/// 서버 -> 클라이언트
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Event {
    #[serde(rename = "enter-session-event")]
    EnterSession { session_id: String },
    #[serde(rename = "join-session-failed-event")]
    JoinFailed { reason: String },
    #[serde(rename = "kicked-event")]
    Kicked { reason: String },
    #[serde(rename = "change-game-view-event")]
    ChangeView(ViewState),
    #[serde(rename = "timer-changed-event")]
    TimerChanged { seconds_left: i32 },
    #[serde(rename = "change-tool-modifier-event")]
    ToolModifierChanged { modifier: String, duration: u64 },
    #[serde(rename = "painting-changed-event")]
    PaintingChanged {
        #[serde(default, rename = "path")]
        graphics: Value,
    },
    #[serde(rename = "players-changed-event")]
    PlayersChanged {
        #[serde(default)]
        players: Vec<String>,
        #[serde(default)]
        added_player: Option<String>,
        #[serde(default)]
        removed_player: Option<String>,
    },
    #[serde(rename = "player-ready-changed-event")]
    ReadyStateChanged {
        #[serde(default)]
        players: BTreeMap<String, bool>,
    },
    #[serde(rename = "pop-up-event")]
    PopUp { message: String },
    #[serde(rename = "debug-message-event")]
    DebugMessage { message: String },
}

impl Event {
    pub fn tag(&self) -> &'static str {
        match self {
            Event::EnterSession { .. } => "enter-session-event",
            Event::JoinFailed { .. } => "join-session-failed-event",
            Event::Kicked { .. } => "kicked-event",
            Event::ChangeView(_) => "change-game-view-event",
            Event::TimerChanged { .. } => "timer-changed-event",
            Event::ToolModifierChanged { .. } => "change-tool-modifier-event",
            Event::PaintingChanged { .. } => "painting-changed-event",
            Event::PlayersChanged { .. } => "players-changed-event",
            Event::ReadyStateChanged { .. } => "player-ready-changed-event",
            Event::PopUp { .. } => "pop-up-event",
            Event::DebugMessage { .. } => "debug-message-event",
        }
    }

    pub fn view(view: GameView) -> Self {
        Event::ChangeView(ViewState::new(view))
    }

    pub fn pop_up<T: Into<String>>(message: T) -> Self {
        Event::PopUp {
            message: message.into(),
        }
    }

    pub fn encode(&self) -> Result<String, GameError> {
        serde_json::to_string(self).map_err(|e| GameError::Serialize(e.to_string()))
    }
}

/// 명령과 이벤트 전체에 대한 태그 합집합.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl Message {
    pub fn tag(&self) -> &'static str {
        match self {
            Message::Command(command) => command.tag(),
            Message::Event(event) => event.tag(),
        }
    }

    pub fn decode(text: &str) -> Result<Self, GameError> {
        serde_json::from_str(text).map_err(|e| GameError::Decode(e.to_string()))
    }

    pub fn encode(&self) -> Result<String, GameError> {
        serde_json::to_string(self).map_err(|e| GameError::Serialize(e.to_string()))
    }
}

impl From<Command> for Message {
    fn from(value: Command) -> Self {
        Message::Command(value)
    }
}

impl From<Event> for Message {
    fn from(value: Event) -> Self {
        Message::Event(value)
    }
}
