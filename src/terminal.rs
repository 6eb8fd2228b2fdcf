use embedded_hal::delay::DelayNs;

use crate::display::{DisplayController, NameDisplay};
use crate::gate::SendGate;
use crate::model::{PresenceState, ScanEvent, TagId, TerminalSettings};
use crate::presence::{PresenceEdge, PresenceTracker};
use crate::reader::{acquire, TagReader};
use crate::report::{Reporter, ScanTransport};
use crate::roster::Roster;

/// 本次刷卡的上报结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed,
    /// 冷却时间内的重复刷卡
    Suppressed,
}

/// 一次 tick 的处理结果（供日志与测试使用）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Held,
    Removed,
    /// 新卡到达但 UID 读取/校验失败
    Rejected,
    Scanned {
        tag: TagId,
        name: String,
        send: SendOutcome,
    },
}

/// 刷卡终端：持有全部状态与外设，由主循环逐 tick 驱动。
pub struct ScanTerminal<R, D, T, V> {
    settings: TerminalSettings,
    reader: R,
    delay: D,
    roster: Roster,
    presence: PresenceTracker,
    gate: SendGate,
    reporter: Reporter<T>,
    display: DisplayController<V>,
}

impl<R, D, T, V> ScanTerminal<R, D, T, V>
where
    R: TagReader,
    D: DelayNs,
    T: ScanTransport,
    V: NameDisplay,
{
    pub fn new(
        settings: TerminalSettings,
        reader: R,
        delay: D,
        roster: Roster,
        transport: T,
        display: V,
    ) -> Self {
        let reporter = Reporter::new(transport, settings.report_url.clone());
        let display = DisplayController::new(display, settings.display_ms);
        Self {
            settings,
            reader,
            delay,
            roster,
            presence: PresenceTracker::new(),
            gate: SendGate::new(),
            reporter,
            display,
        }
    }

    pub fn settings(&self) -> &TerminalSettings {
        &self.settings
    }

    pub fn presence(&self) -> PresenceState {
        self.presence.state()
    }

    pub fn gate(&self) -> &SendGate {
        &self.gate
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn reporter(&self) -> &Reporter<T> {
        &self.reporter
    }

    pub fn display(&self) -> &DisplayController<V> {
        &self.display
    }

    /// 单次轮询：在位检测 -> (上升沿) 读卡/显示/上报 -> 显示超时检查。
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let signal = self.reader.card_present();
        let outcome = match self.presence.observe(signal) {
            PresenceEdge::Arrived => self.handle_arrival(now_ms),
            PresenceEdge::Held => TickOutcome::Held,
            PresenceEdge::Removed => TickOutcome::Removed,
            PresenceEdge::Idle => TickOutcome::Idle,
        };
        self.display.poll(now_ms);
        outcome
    }

    fn handle_arrival(&mut self, now_ms: u64) -> TickOutcome {
        // 读取失败也保持 Present，直到卡片移开才会重新读取
        let Some(tag) = acquire(
            &mut self.reader,
            &mut self.delay,
            true,
            self.settings.reread_delay_ms,
        ) else {
            log::debug!("Card present but UID rejected");
            return TickOutcome::Rejected;
        };

        let name = self.roster.lookup(&tag).to_string();
        log::info!("Card {} -> {}", tag, name);
        self.display.show(&name, now_ms);

        let send = if self
            .gate
            .should_send(&tag, now_ms, self.settings.send_cooldown_ms)
        {
            let event = ScanEvent::new(tag.clone(), self.settings.device_id.clone(), now_ms);
            if self.reporter.report(&event) {
                self.gate.record_success(&tag, now_ms);
                SendOutcome::Sent
            } else {
                SendOutcome::Failed
            }
        } else {
            log::info!("Duplicate tap {} within cooldown, not reported", tag);
            SendOutcome::Suppressed
        };

        TickOutcome::Scanned { tag, name, send }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::tests::{DisplayCall, RecordingDisplay};
    use crate::reader::tests::{NoopDelay, ScriptedReader};
    use crate::report::tests::RecordingTransport;
    use crate::report::TransportError;
    use crate::roster::UNKNOWN_NAME;

    type TestTerminal = ScanTerminal<ScriptedReader, NoopDelay, RecordingTransport, RecordingDisplay>;

    fn terminal(transport: RecordingTransport) -> TestTerminal {
        ScanTerminal::new(
            TerminalSettings::with_device_id("HR-02"),
            ScriptedReader::default(),
            NoopDelay::default(),
            Roster::builtin(),
            transport,
            RecordingDisplay::default(),
        )
    }

    /// 模拟一次完整刷卡：放卡（两次一致读取）后移开。
    fn tap(terminal: &mut TestTerminal, uid: &str, now_ms: u64) -> TickOutcome {
        let reader = terminal.reader_mut();
        reader.presence.push_back(true);
        reader.reads.push_back(uid.to_string());
        reader.reads.push_back(uid.to_string());
        let outcome = terminal.tick(now_ms);
        terminal.reader_mut().presence.push_back(false);
        assert_eq!(terminal.tick(now_ms + 1), TickOutcome::Removed);
        outcome
    }

    fn send_of(outcome: &TickOutcome) -> SendOutcome {
        match outcome {
            TickOutcome::Scanned { send, .. } => *send,
            other => panic!("expected scan, got {:?}", other),
        }
    }

    #[test]
    fn pipeline_runs_once_while_card_is_held() {
        let mut terminal = terminal(RecordingTransport::always(200));
        let reader = terminal.reader_mut();
        reader.presence.extend([false, true, true, true, false]);
        reader.reads.extend(["3059e1a028".to_string(), "3059e1a028".to_string()]);

        let outcomes: Vec<_> = (0..5).map(|i| terminal.tick(i * 50)).collect();
        assert_eq!(outcomes[0], TickOutcome::Idle);
        assert_eq!(
            outcomes[1],
            TickOutcome::Scanned {
                tag: TagId::parse("3059e1a028").unwrap(),
                name: "T.Miura".to_string(),
                send: SendOutcome::Sent,
            }
        );
        assert_eq!(outcomes[2], TickOutcome::Held);
        assert_eq!(outcomes[3], TickOutcome::Held);
        assert_eq!(outcomes[4], TickOutcome::Removed);
        assert_eq!(terminal.reader_mut().read_calls, 2);
        assert_eq!(terminal.reporter().transport().requests.len(), 1);
        let request = &terminal.reporter().transport().requests[0];
        assert_eq!(request.url, terminal.settings().report_url);
        let json: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(json["dev"], terminal.settings().device_id.as_str());
        assert_eq!(json["dev"], "HR-02");
    }

    #[test]
    fn retap_inside_cooldown_is_suppressed() {
        let mut terminal = terminal(RecordingTransport::always(200));
        assert_eq!(send_of(&tap(&mut terminal, "3059e1a028", 0)), SendOutcome::Sent);
        assert_eq!(send_of(&tap(&mut terminal, "3059e1a028", 500)), SendOutcome::Suppressed);
        assert_eq!(send_of(&tap(&mut terminal, "3059e1a028", 800)), SendOutcome::Sent);
        assert_eq!(terminal.reporter().transport().requests.len(), 2);
    }

    #[test]
    fn uppercase_retap_counts_as_same_tag() {
        let mut terminal = terminal(RecordingTransport::always(200));
        assert_eq!(send_of(&tap(&mut terminal, "3059e1a028", 0)), SendOutcome::Sent);
        let outcome = tap(&mut terminal, "3059E1A028", 300);
        assert_eq!(
            outcome,
            TickOutcome::Scanned {
                tag: TagId::parse("3059e1a028").unwrap(),
                name: "T.Miura".to_string(),
                send: SendOutcome::Suppressed,
            }
        );
        assert_eq!(terminal.reporter().transport().requests.len(), 1);
    }

    #[test]
    fn failed_send_is_retried_on_next_tap() {
        let mut transport = RecordingTransport::default();
        transport.responses.push_back(Ok(503));
        transport.responses.push_back(Ok(200));
        let mut terminal = terminal(transport);
        assert_eq!(send_of(&tap(&mut terminal, "3059e1a028", 0)), SendOutcome::Failed);
        assert_eq!(send_of(&tap(&mut terminal, "3059e1a028", 100)), SendOutcome::Sent);
        assert_eq!(terminal.gate().record().last_sent_at_ms, 100);
    }

    #[test]
    fn transport_fault_does_not_stop_the_loop() {
        let mut transport = RecordingTransport::default();
        transport
            .responses
            .push_back(Err(TransportError::Connect("wifi down".to_string())));
        let mut terminal = terminal(transport);
        assert_eq!(send_of(&tap(&mut terminal, "7015dea01b", 0)), SendOutcome::Failed);
        assert_eq!(terminal.tick(50), TickOutcome::Idle);
        assert!(terminal.gate().record().last_tag.is_none());
    }

    #[test]
    fn unknown_tag_is_shown_and_reported() {
        let mut terminal = terminal(RecordingTransport::always(200));
        let outcome = tap(&mut terminal, "ffffffffff", 0);
        assert_eq!(
            outcome,
            TickOutcome::Scanned {
                tag: TagId::parse("ffffffffff").unwrap(),
                name: UNKNOWN_NAME.to_string(),
                send: SendOutcome::Sent,
            }
        );
        assert_eq!(
            terminal.display().display().calls,
            vec![DisplayCall::Show(UNKNOWN_NAME.to_string())]
        );
    }

    #[test]
    fn noisy_read_produces_no_event_until_card_is_removed() {
        let mut terminal = terminal(RecordingTransport::always(200));
        let reader = terminal.reader_mut();
        reader.presence.extend([true, true, false]);
        reader.reads.extend(["abc1234567".to_string(), "abc1234568".to_string()]);

        assert_eq!(terminal.tick(0), TickOutcome::Rejected);
        assert_eq!(terminal.presence(), PresenceState::Present);
        assert_eq!(terminal.tick(50), TickOutcome::Held);
        assert_eq!(terminal.tick(100), TickOutcome::Removed);
        assert_eq!(terminal.reader_mut().read_calls, 2);
        assert!(terminal.display().display().calls.is_empty());
        assert!(terminal.reporter().transport().requests.is_empty());
    }

    #[test]
    fn display_clears_independently_of_send_result() {
        let mut transport = RecordingTransport::default();
        transport.responses.push_back(Ok(500));
        let mut terminal = terminal(transport);
        tap(&mut terminal, "7015dea01b", 0);
        for now in (50..=1500).step_by(50) {
            terminal.tick(now);
        }
        assert_eq!(
            terminal.display().display().calls,
            vec![DisplayCall::Show("A.Satou".to_string())]
        );
        terminal.tick(1550);
        terminal.tick(1600);
        assert_eq!(
            terminal.display().display().calls,
            vec![DisplayCall::Show("A.Satou".to_string()), DisplayCall::Clear]
        );
    }
}
