use crate::env::{ConnectionSettings, Settings};
use crate::game::config::SessionConfig;
use crate::server::session::SessionRegistry;

/// 모든 연결이 공유하는 서버 상태. `web::Data` 로 주입된다.
#[derive(Clone)]
pub struct ServerState {
    pub registry: SessionRegistry,
    pub session_config: SessionConfig,
    pub connection: ConnectionSettings,
}

impl ServerState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            registry: SessionRegistry::new(),
            session_config: settings.session_config(),
            connection: settings.connection.clone(),
        }
    }

    pub fn with_config(session_config: SessionConfig, connection: ConnectionSettings) -> Self {
        Self {
            registry: SessionRegistry::new(),
            session_config,
            connection,
        }
    }
}
