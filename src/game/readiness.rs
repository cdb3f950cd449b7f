use std::collections::HashMap;
use std::hash::Hash;

use crate::enums::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    flag: bool,
    role: Role,
}

/// 플레이어별 (플래그, 역할) 기록.
///
/// 로비 준비, 프롬프트 투표 완료, 쇼케이스/갤러리 확인, 평가 중복 방지에 모두 쓰인다.
/// 세션 태스크만 소유하고 수정한다.
#[derive(Debug, Clone)]
pub struct ReadinessSet<K> {
    items: HashMap<K, Entry>,
}

impl<K: Eq + Hash + Clone> ReadinessSet<K> {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }

    /// 모든 멤버를 false 로 채운다. `painter` 가 주어지면 그 사람만 Painter, 나머지는 Troll.
    pub fn from_members<'a, I>(members: I, painter: Option<&K>) -> Self
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let mut set = Self::new();
        for member in members {
            let role = match painter {
                Some(p) if p == member => Role::Painter,
                _ => Role::Troll,
            };
            set.insert(member.clone(), false, role);
        }
        set
    }

    pub fn insert(&mut self, key: K, flag: bool, role: Role) {
        self.items.insert(key, Entry { flag, role });
    }

    /// 새로 들어온 플레이어는 항상 준비 안 됨, Troll 로 들어간다.
    pub fn insert_new_player(&mut self, key: K) {
        self.insert(key, false, Role::Troll);
    }

    pub fn remove(&mut self, key: &K) -> bool {
        self.items.remove(key).is_some()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.items.contains_key(key)
    }

    /// 플래그를 바꾸고, 실제로 값이 바뀌었으면 true.
    /// 없는 키는 건드리지 않는다.
    pub fn set_flag(&mut self, key: &K, flag: bool) -> bool {
        match self.items.get_mut(key) {
            Some(entry) if entry.flag != flag => {
                entry.flag = flag;
                true
            }
            _ => false,
        }
    }

    pub fn mark(&mut self, key: &K) -> bool {
        self.set_flag(key, true)
    }

    pub fn is_set(&self, key: &K) -> bool {
        self.items.get(key).map(|e| e.flag).unwrap_or(false)
    }

    pub fn role(&self, key: &K) -> Option<Role> {
        self.items.get(key).map(|e| e.role)
    }

    pub fn any(&self, flag: bool) -> bool {
        self.items.values().any(|e| e.flag == flag)
    }

    pub fn all_set(&self) -> bool {
        !self.any(false)
    }

    pub fn none_set(&self) -> bool {
        !self.any(true)
    }

    /// Painter 를 제외한 모든 사람이 표시되었는지
    pub fn all_trolls_set(&self) -> bool {
        self.items
            .values()
            .filter(|e| e.role == Role::Troll)
            .all(|e| e.flag)
    }

    pub fn painter_set(&self) -> bool {
        self.items
            .values()
            .filter(|e| e.role == Role::Painter)
            .all(|e| e.flag)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, bool)> {
        self.items.iter().map(|(k, e)| (k, e.flag))
    }
}

impl<K: Eq + Hash + Clone> Default for ReadinessSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lobby_wait_condition_follows_membership() {
        let mut set = ReadinessSet::from_members(["a", "b"].iter(), None);
        assert!(!set.all_set());

        set.mark(&"a");
        assert!(!set.all_set());
        set.mark(&"b");
        assert!(set.all_set());

        // 새 플레이어가 들어오면 다시 기다려야 함
        set.insert_new_player("c");
        assert!(!set.all_set());
        set.remove(&"c");
        assert!(set.all_set());
    }

    #[test]
    fn marking_twice_counts_once() {
        let mut set = ReadinessSet::from_members(["a", "b"].iter(), None);
        assert!(set.mark(&"a"));
        assert!(!set.mark(&"a"));
        assert_eq!(set.iter().filter(|(_, flag)| *flag).count(), 1);
    }

    #[test]
    fn trolls_only_check_ignores_painter() {
        let mut set = ReadinessSet::from_members(["p", "t1", "t2"].iter(), Some(&"p"));
        assert_eq!(set.role(&"p"), Some(Role::Painter));
        assert_eq!(set.role(&"t1"), Some(Role::Troll));

        set.mark(&"t1");
        assert!(!set.all_trolls_set());

        // 투표 도중 나간 트롤은 완료 조건을 막지 않음
        set.remove(&"t2");
        assert!(set.all_trolls_set());
        assert!(!set.painter_set());
        assert!(!set.all_set());
    }

    #[test]
    fn unknown_keys_are_left_alone() {
        let mut set = ReadinessSet::from_members(["a"].iter(), None);
        assert!(!set.mark(&"ghost"));
        assert!(!set.contains(&"ghost"));
        assert!(!set.is_set(&"ghost"));
        assert!(set.none_set());
    }
}
