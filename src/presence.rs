use crate::model::PresenceState;

/// 单次 observe 的结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceEdge {
    /// 无卡 -> 有卡：每次实际刷卡只触发一次
    Arrived,
    Held,
    Removed,
    Idle,
}

/// 将读卡器的在位信号转换为边沿事件。
///
/// 上升沿时无论 UID 是否读取成功都进入 `Present`，
/// 直到卡片移开前不会再次触发。移开没有去抖。
#[derive(Debug)]
pub struct PresenceTracker {
    state: PresenceState,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self {
            state: PresenceState::Absent,
        }
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    pub fn observe(&mut self, signal: bool) -> PresenceEdge {
        let edge = match (self.state, signal) {
            (PresenceState::Absent, true) => PresenceEdge::Arrived,
            (PresenceState::Present, true) => PresenceEdge::Held,
            (PresenceState::Present, false) => PresenceEdge::Removed,
            (PresenceState::Absent, false) => PresenceEdge::Idle,
        };
        self.state = if signal {
            PresenceState::Present
        } else {
            PresenceState::Absent
        };
        edge
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_arrival_per_tap() {
        let mut tracker = PresenceTracker::new();
        let edges: Vec<_> = [false, true, true, true, false]
            .into_iter()
            .map(|signal| tracker.observe(signal))
            .collect();
        assert_eq!(
            edges,
            vec![
                PresenceEdge::Idle,
                PresenceEdge::Arrived,
                PresenceEdge::Held,
                PresenceEdge::Held,
                PresenceEdge::Removed,
            ]
        );
        assert_eq!(tracker.state(), PresenceState::Absent);
    }

    #[test]
    fn retap_fires_again() {
        let mut tracker = PresenceTracker::new();
        assert_eq!(tracker.observe(true), PresenceEdge::Arrived);
        assert_eq!(tracker.observe(false), PresenceEdge::Removed);
        assert_eq!(tracker.observe(true), PresenceEdge::Arrived);
        assert_eq!(tracker.state(), PresenceState::Present);
    }
}
