use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// 클라이언트에 "타이머 없음" 을 알리는 값
pub const TIMER_HIDDEN: i32 = -1;

enum TimerKind {
    Countdown(Interval),
    Never,
}

/// 현재 단계에 남은 시간.
///
/// 세션 루프는 `tick()` 을 다른 이벤트 소스와 함께 기다리고, 틱이 오면 `on_tick()` 을 호출한다.
/// `never()` 는 절대 틱이 오지 않고 시간 초과도 되지 않으므로 플레이어 행동으로만 끝나는 단계에 쓴다.
pub struct PhaseTimer {
    kind: TimerKind,
    seconds_left: i32,
    visible: bool,
}

impl PhaseTimer {
    /// 남은 초를 클라이언트에 보여주는 타이머
    pub fn countdown(seconds: u32, period: Duration) -> Self {
        Self::ticking(seconds, period, true)
    }

    /// 안내 화면처럼 시간은 재지만 남은 초를 보여주지 않는 타이머
    pub fn hidden(seconds: u32, period: Duration) -> Self {
        Self::ticking(seconds, period, false)
    }

    pub fn never() -> Self {
        Self {
            kind: TimerKind::Never,
            seconds_left: 0,
            visible: false,
        }
    }

    fn ticking(seconds: u32, period: Duration, visible: bool) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            kind: TimerKind::Countdown(interval),
            seconds_left: seconds.min(i32::MAX as u32) as i32,
            visible,
        }
    }

    /// 다음 틱까지 대기. cancel safe 하므로 `select!` 분기로 써도 된다.
    pub async fn tick(&mut self) {
        match &mut self.kind {
            TimerKind::Countdown(interval) => {
                interval.tick().await;
            }
            TimerKind::Never => std::future::pending::<()>().await,
        }
    }

    /// 1 틱만큼 줄이고, 클라이언트에 알려야 하면 새 남은 초를 돌려준다.
    pub fn on_tick(&mut self) -> Option<i32> {
        match self.kind {
            TimerKind::Never => None,
            TimerKind::Countdown(_) => {
                if self.seconds_left > 0 {
                    self.seconds_left -= 1;
                }
                self.visible.then_some(self.seconds_left)
            }
        }
    }

    pub fn timed_out(&self) -> bool {
        match self.kind {
            TimerKind::Never => false,
            TimerKind::Countdown(_) => self.seconds_left <= 0,
        }
    }

    pub fn seconds_left(&self) -> Option<i32> {
        match self.kind {
            TimerKind::Never => None,
            TimerKind::Countdown(_) => Some(self.seconds_left),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn countdown_reaches_zero_after_n_ticks() {
        let mut timer = PhaseTimer::countdown(3, Duration::from_secs(1));
        assert_eq!(timer.seconds_left(), Some(3));
        assert!(!timer.timed_out());

        let mut seen = vec![];
        while !timer.timed_out() {
            timer.tick().await;
            seen.push(timer.on_tick());
        }
        assert_eq!(seen, vec![Some(2), Some(1), Some(0)]);

        // 0 아래로 내려가지 않음
        assert_eq!(timer.on_tick(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_timer_counts_without_reporting() {
        let mut timer = PhaseTimer::hidden(1, Duration::from_secs(1));
        timer.tick().await;
        assert_eq!(timer.on_tick(), None);
        assert!(timer.timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn never_timer_never_fires() {
        let mut timer = PhaseTimer::never();
        let fired = tokio::time::timeout(Duration::from_secs(3600), timer.tick()).await;
        assert!(fired.is_err());
        assert!(!timer.timed_out());
        assert_eq!(timer.on_tick(), None);
    }

    #[test]
    fn zero_second_countdown_is_already_over() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let timer = PhaseTimer::countdown(0, Duration::from_secs(1));
            assert!(timer.timed_out());
        });
    }
}
