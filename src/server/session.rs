use std::{collections::HashMap, sync::Arc};

use tracing::{info, warn};
use uuid::Uuid;

use crate::game::config::SessionConfig;
use crate::game::session::{Session, SessionHandle};
use crate::server::player::PlayerHandle;

// 내부 상태를 Arc로 래핑하여 공유
struct SessionRegistryInner {
    sessions: tokio::sync::RwLock<HashMap<String, SessionHandle>>,
}

/// 프로세스 전체의 세션 id -> 세션 핸들 조회표.
///
/// 여러 연결에서 동시에 접근하므로 모든 연산은 잠금 아래에서 이뤄진다.
/// 세션 내부 상태는 건드리지 않고 핸들만 보관한다.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<SessionRegistryInner>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionRegistryInner {
                sessions: tokio::sync::RwLock::new(HashMap::new()),
            }),
        }
    }

    fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// 새 세션을 등록하고 태스크를 띄운다. `host` 가 첫 멤버가 된다.
    pub async fn create(&self, host: PlayerHandle, config: SessionConfig) -> SessionHandle {
        let mut sessions = self.inner.sessions.write().await;
        let mut id = Self::generate_id();
        while sessions.contains_key(&id) {
            id = Self::generate_id();
        }

        let (session, handle) = Session::new(id.clone(), config, self.clone());
        sessions.insert(id.clone(), handle.clone());
        drop(sessions);

        info!("세션 등록: session={}, host={}", id, host.id());
        // 세션이 뜨기 전에 붙여야 그 사이의 close 가 세션에 전달된다
        host.attach(handle.clone());
        tokio::spawn(session.run(Some(host)));
        handle
    }

    /// 이미 있는 id 면 기존 핸들을 돌려준다.
    pub async fn create_pinned(&self, id: &str, config: SessionConfig) -> SessionHandle {
        let mut sessions = self.inner.sessions.write().await;
        if let Some(handle) = sessions.get(id) {
            warn!("이미 존재하는 고정 세션: session={}", id);
            return handle.clone();
        }

        let (session, handle) = Session::new(id.to_string(), config.pinned(), self.clone());
        sessions.insert(id.to_string(), handle.clone());
        drop(sessions);

        info!("고정 세션 등록: session={}", id);
        tokio::spawn(session.run(None));
        handle
    }

    /// 직접 만든 세션을 등록하고 실행한다. 시드를 고정한 세션을 돌릴 때 쓴다.
    pub async fn launch(&self, session: Session, handle: SessionHandle, host: Option<PlayerHandle>) {
        self.inner
            .sessions
            .write()
            .await
            .insert(handle.id().to_string(), handle.clone());
        if let Some(host) = &host {
            host.attach(handle.clone());
        }
        tokio::spawn(session.run(host));
    }

    pub async fn find(&self, id: &str) -> Option<SessionHandle> {
        self.inner.sessions.read().await.get(id).cloned()
    }

    pub async fn destroy(&self, id: &str) -> bool {
        let removed = self.inner.sessions.write().await.remove(id).is_some();
        if removed {
            info!("세션 삭제: session={}", id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
