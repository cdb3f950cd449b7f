use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::enums::{
    TEXT_ERROR_BAD_SESSION, TEXT_ERROR_NICK_EMPTY, TEXT_ERROR_NICK_TOO_LONG,
    TEXT_ERROR_SESSION_EMPTY, TEXT_ERROR_SESSION_RUNNING,
};

#[derive(Debug, Error, PartialEq, Clone)]
pub enum GameError {
    // 프로토콜 오류: 연결을 끊음
    #[error("DECODE_ERROR: {0}")]
    Decode(String),
    #[error("UNEXPECTED_COMMAND: {0}")]
    UnexpectedCommand(String),

    // 검증 오류: 실패 이벤트만 돌려주고 연결은 유지
    #[error("NICKNAME_EMPTY")]
    NicknameEmpty,
    #[error("NICKNAME_TOO_LONG")]
    NicknameTooLong,
    #[error("SESSION_ID_EMPTY")]
    SessionIdEmpty,
    #[error("SESSION_NOT_FOUND")]
    SessionNotFound,
    #[error("SESSION_NOT_JOINABLE")]
    SessionNotJoinable,

    // 시스템 오류
    #[error("SERIALIZE_ERROR: {0}")]
    Serialize(String),
    #[error("MAILBOX_CLOSED")]
    MailboxClosed,
    #[error("SLOW_CONSUMER")]
    SlowConsumer,
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),
    #[error("UPGRADE_FAILED: {0}")]
    Upgrade(String),
}

impl GameError {
    /// 플레이어에게 그대로 보여줄 문구. 검증 오류에만 존재한다.
    pub fn failure_reason(&self) -> Option<&'static str> {
        match self {
            Self::NicknameEmpty => Some(TEXT_ERROR_NICK_EMPTY),
            Self::NicknameTooLong => Some(TEXT_ERROR_NICK_TOO_LONG),
            Self::SessionIdEmpty => Some(TEXT_ERROR_SESSION_EMPTY),
            Self::SessionNotFound => Some(TEXT_ERROR_BAD_SESSION),
            Self::SessionNotJoinable => Some(TEXT_ERROR_SESSION_RUNNING),
            _ => None,
        }
    }

    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::UnexpectedCommand(_) | Self::Transport(_)
        )
    }
}

impl ResponseError for GameError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Upgrade(_) | Self::Decode(_) | Self::UnexpectedCommand(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::NicknameEmpty
            | Self::NicknameTooLong
            | Self::SessionIdEmpty
            | Self::SessionNotJoinable => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 세션 인원이 0 이 되어 엔진이 즉시 빠져나와야 함을 나타냄.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("SESSION_ABANDONED")]
pub struct SessionAbandoned;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_player_text() {
        assert_eq!(
            GameError::NicknameEmpty.failure_reason(),
            Some(TEXT_ERROR_NICK_EMPTY)
        );
        assert_eq!(
            GameError::SessionNotJoinable.failure_reason(),
            Some(TEXT_ERROR_SESSION_RUNNING)
        );
        assert_eq!(GameError::MailboxClosed.failure_reason(), None);
    }

    #[test]
    fn protocol_errors_are_fatal() {
        assert!(GameError::Decode("eof".into()).is_connection_fatal());
        assert!(!GameError::SessionNotFound.is_connection_fatal());
        assert_eq!(
            GameError::Upgrade("no header".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
