use crate::model::DisplayWindow;

/// 姓名显示设备边界。
pub trait NameDisplay {
    fn show(&mut self, name: &str);
    fn clear(&mut self);
}

/// 同时驱动两个显示设备（例如 LCD + 灯条）。
impl<A: NameDisplay, B: NameDisplay> NameDisplay for (A, B) {
    fn show(&mut self, name: &str) {
        self.0.show(name);
        self.1.show(name);
    }

    fn clear(&mut self) {
        self.0.clear();
        self.1.clear();
    }
}

/// 显示控制：显示姓名，超过固定时长后清屏一次；与上报结果无关。
pub struct DisplayController<V> {
    display: V,
    window: DisplayWindow,
}

impl<V: NameDisplay> DisplayController<V> {
    pub fn new(display: V, ttl_ms: u64) -> Self {
        Self {
            display,
            window: DisplayWindow::new(ttl_ms),
        }
    }

    pub fn display(&self) -> &V {
        &self.display
    }

    pub fn show(&mut self, name: &str, now_ms: u64) {
        self.display.show(name);
        self.window.shown_at_ms = Some(now_ms);
    }

    /// 检查超时，需要清屏时返回 true。
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if !self.window.is_expired(now_ms) {
            return false;
        }
        self.display.clear();
        self.window.shown_at_ms = None;
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum DisplayCall {
        Show(String),
        Clear,
    }

    #[derive(Default)]
    pub struct RecordingDisplay {
        pub calls: Vec<DisplayCall>,
    }

    impl NameDisplay for RecordingDisplay {
        fn show(&mut self, name: &str) {
            self.calls.push(DisplayCall::Show(name.to_string()));
        }

        fn clear(&mut self) {
            self.calls.push(DisplayCall::Clear);
        }
    }

    #[test]
    fn clears_once_after_ttl() {
        let mut controller = DisplayController::new(RecordingDisplay::default(), 1500);
        controller.show("A.Satou", 0);
        for now in [50, 700, 1450, 1500] {
            assert!(!controller.poll(now));
        }
        assert!(controller.poll(1550));
        assert!(!controller.poll(1600));
        assert!(!controller.poll(5000));
        assert_eq!(
            controller.display().calls,
            vec![DisplayCall::Show("A.Satou".to_string()), DisplayCall::Clear]
        );
    }

    #[test]
    fn new_show_restarts_window() {
        let mut controller = DisplayController::new(RecordingDisplay::default(), 1500);
        controller.show("A.Satou", 0);
        controller.show("Y.Kon", 1000);
        assert!(!controller.poll(2000));
        assert!(controller.poll(2501));
    }

    #[test]
    fn paired_displays_receive_same_calls() {
        let mut controller = DisplayController::new(
            (RecordingDisplay::default(), RecordingDisplay::default()),
            1500,
        );
        controller.show("T.Itou", 0);
        assert!(controller.poll(1501));
        let (lcd, led) = controller.display();
        let expected = vec![DisplayCall::Show("T.Itou".to_string()), DisplayCall::Clear];
        assert_eq!(lcd.calls, expected);
        assert_eq!(led.calls, expected);
    }

    #[test]
    fn nothing_to_clear_before_first_show() {
        let mut controller = DisplayController::new(RecordingDisplay::default(), 1500);
        assert!(!controller.poll(100_000));
        assert!(controller.display().calls.is_empty());
    }
}
