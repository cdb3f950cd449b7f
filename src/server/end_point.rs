use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_ws::handle;
use tracing::{error, info, instrument};

use crate::exception::GameError;
use crate::server::player::PlayerHandle;

use super::types::ServerState;

/// 게임 소켓 end point 입니다.
///
/// 연결이 수립되면 서버는 먼저 title 화면을 보냅니다.
///
/// ```
///     use serde_json::json;
///     json!
///     ({
///         "type": "change-game-view-event",
///         "view": "title",
///         "painting": { "prompt": "", "path": null, "backdrop": "", "stickers": [], "winner": false },
///         "votePrompt": "",
///         "voteOptions": [],
///         "announcement": "",
///         "results": []
///     });
/// ```
///
/// 세션에 들어가기 전까지 클라이언트는 세션 생성/참여 명령만 보낼 수 있습니다.
///
/// ```
///     use serde_json::json;
///     json!
///     ({
///         "type": "create-session-command",
///         "nickName": "alice"
///     });
/// ```
///
/// 그 외의 명령을 보내거나 해석할 수 없는 프레임을 보내면 연결이 끊깁니다.
#[get("/ws")]
#[instrument(skip_all)]
pub async fn handle_socket(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<ServerState>,
) -> Result<HttpResponse, GameError> {
    let (resp, session, stream) = match handle(&req, payload) {
        Ok(result) => result,
        Err(e) => {
            error!("WebSocket 핸들링 실패: error={:?}", e);
            return Err(GameError::Upgrade(e.to_string()));
        }
    };

    let player = PlayerHandle::spawn(session, stream, state.get_ref().clone());
    info!("WebSocket 연결 성공: player={}", player.id());
    Ok(resp)
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handle_socket).service(health);
}
