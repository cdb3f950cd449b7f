use std::time::Instant;

use once_cell::sync::Lazy;

static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

/// 프로세스 시작 시각을 고정한다. main 에서 가장 먼저 부른다.
pub fn mark_startup() {
    Lazy::force(&PROCESS_START);
}

/// 프로세스가 뜬 뒤 지난 밀리초
pub fn uptime_ms() -> u128 {
    PROCESS_START.elapsed().as_millis()
}
