use std::cmp::Ordering;

use rand::Rng;

// 아무도 투표하지 않았을 때만 쓰는 무작위 초기값의 범위
pub const TIE_BREAK_JITTER: f64 = 0.1;

/// 최댓값을 처음 만난 위치. 같은 값이 뒤에 나와도 앞의 것이 유지된다.
pub fn first_max_index<T: PartialOrd>(values: &[T]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, value) in values.iter().enumerate() {
        match best {
            Some(b) if value.partial_cmp(&values[b]) != Some(Ordering::Greater) => {}
            _ => best = Some(i),
        }
    }
    best
}

/// 프롬프트 투표 집계.
/// 표가 하나라도 있으면 득표수만으로 승자를 고르고, 동점이면 앞의 후보가 이긴다.
/// 표가 하나도 없을 때만 무작위 값으로 고른다.
#[derive(Debug, Clone)]
pub struct VoteTally {
    counts: Vec<u32>,
    jitter: Vec<f64>,
}

impl VoteTally {
    /// 무작위 값 없이 만든 집계. 아무도 투표하지 않으면 첫 후보가 이긴다.
    pub fn new(options: usize) -> Self {
        Self {
            counts: vec![0; options],
            jitter: vec![0.0; options],
        }
    }

    pub fn with_jitter<R: Rng + ?Sized>(options: usize, rng: &mut R) -> Self {
        Self {
            counts: vec![0; options],
            jitter: (0..options)
                .map(|_| rng.gen::<f64>() * TIE_BREAK_JITTER)
                .collect(),
        }
    }

    /// 유효한 선택지면 한 표를 더하고 true
    pub fn cast(&mut self, option: usize) -> bool {
        match self.counts.get_mut(option) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn winner(&self) -> Option<usize> {
        if self.total() == 0 {
            first_max_index(&self.jitter)
        } else {
            first_max_index(&self.counts)
        }
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}
