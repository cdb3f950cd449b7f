use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastRejected {
    NotYourTurn,
    AlreadyCast,
}

/// 그림 단계에서 트롤들이 돌아가며 효과를 거는 순서.
///
/// 큐의 맨 앞이 현재 차례. 쿨다운 틱이 다 되면 맨 앞을 뒤로 보내고(왼쪽 회전) 다음 창이 열린다.
/// 한 창 안에서는 한 번만 효과를 걸 수 있다.
#[derive(Debug, Clone)]
pub struct TrollRotation<K> {
    queue: VecDeque<K>,
    cooldown: u32,
    ticks_left: u32,
    cast: bool,
}

impl<K: PartialEq + Clone> TrollRotation<K> {
    pub fn new(trolls: Vec<K>, cooldown_ticks: u32) -> Self {
        let cooldown = cooldown_ticks.max(1);
        Self {
            queue: trolls.into(),
            cooldown,
            ticks_left: cooldown,
            cast: false,
        }
    }

    pub fn active(&self) -> Option<&K> {
        self.queue.front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn order(&self) -> impl Iterator<Item = &K> {
        self.queue.iter()
    }

    pub fn try_cast(&mut self, troll: &K) -> Result<(), CastRejected> {
        if self.active() != Some(troll) {
            return Err(CastRejected::NotYourTurn);
        }
        if self.cast {
            return Err(CastRejected::AlreadyCast);
        }
        self.cast = true;
        Ok(())
    }

    /// 틱 하나를 소모한다. 현재 창이 끝났으면 true.
    pub fn on_tick(&mut self) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.ticks_left == 0
    }

    /// 다음 트롤에게 창을 넘기고, (이전 차례, 새 차례) 를 돌려준다.
    pub fn rotate(&mut self) -> (Option<K>, Option<K>) {
        let previous = self.queue.pop_front();
        if let Some(p) = previous.clone() {
            self.queue.push_back(p);
        }
        self.open_window();
        (previous, self.queue.front().cloned())
    }

    /// 나간 트롤을 뺀다. 현재 차례였다면 다음 사람의 창이 바로 열리고 그 사람을 돌려준다.
    pub fn remove(&mut self, troll: &K) -> Option<Option<K>> {
        let index = self.queue.iter().position(|t| t == troll)?;
        self.queue.remove(index);
        if index == 0 {
            self.open_window();
            return Some(self.queue.front().cloned());
        }
        None
    }

    fn open_window(&mut self) {
        self.ticks_left = self.cooldown;
        self.cast = false;
    }
}
