use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::enums::DEBUG_SESSION_ID;
use crate::game::config::{GameTimings, SessionConfig};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub server: ServerSettings,
    pub connection: ConnectionSettings,
    pub game: GameSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load(&format!("config/{}", run_mode))
    }

    /// `path` 의 toml 파일(없어도 됨) 위에 환경 변수(e.g., APP_SERVER__PORT=8000)를 덮어쓴다.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(
                File::with_name(path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.ping_period_seconds >= self.connection.pong_wait_seconds {
            return Err(ConfigError::Message(format!(
                "connection.ping_period_seconds ({}) must be shorter than connection.pong_wait_seconds ({})",
                self.connection.ping_period_seconds, self.connection.pong_wait_seconds
            )));
        }
        if self.connection.mailbox_capacity == 0 || self.game.inbound_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "queue capacities must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    /// 새 세션에 넘겨줄 설정. 디버그 모드면 짧은 프로필을 쓴다.
    pub fn session_config(&self) -> SessionConfig {
        let mut config = if self.game.debug {
            SessionConfig::debug()
        } else {
            SessionConfig::standard()
        };
        if let Some(timings) = &self.game.timings {
            config.timings = timings.clone();
        }
        config.inbound_capacity = self.game.inbound_queue_capacity;
        config
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 8080,
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub filename: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".into(),
            filename: "chaos_paint.log".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConnectionSettings {
    /// 프레임 하나를 쓰는 데 허용되는 시간
    pub write_wait_seconds: u64,
    /// 이 시간 동안 아무 프레임도 오지 않으면 끊긴 것으로 본다
    pub pong_wait_seconds: u64,
    /// pong_wait 보다 짧아야 함
    pub ping_period_seconds: u64,
    pub mailbox_capacity: usize,
    /// 우편함이 가득 찼을 때 세션이 기다려 주는 시간. 넘기면 연결을 끊는다.
    pub slow_consumer_grace_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            write_wait_seconds: 10,
            pong_wait_seconds: 60,
            ping_period_seconds: 54,
            mailbox_capacity: 256,
            slow_consumer_grace_ms: 2_000,
        }
    }
}

impl ConnectionSettings {
    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_seconds)
    }

    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_seconds)
    }

    pub fn ping_period(&self) -> Duration {
        Duration::from_secs(self.ping_period_seconds)
    }

    pub fn slow_consumer_grace(&self) -> Duration {
        Duration::from_millis(self.slow_consumer_grace_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameSettings {
    pub debug: bool,
    pub inbound_queue_capacity: usize,
    pub debug_session_id: String,
    /// 지정하면 프로필 기본값 대신 사용
    pub timings: Option<GameTimings>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            debug: false,
            inbound_queue_capacity: 256,
            debug_session_id: DEBUG_SESSION_ID.into(),
            timings: None,
        }
    }
}
