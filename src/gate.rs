use crate::model::{SendRecord, TagId};

/// 防重复上报：同一标签在冷却时间内只上报一次。
///
/// 只保留最近一次成功上报的标签与时间；上报失败不更新记录，
/// 下一次刷同一张卡即使仍在冷却时间内也可以重试。
#[derive(Debug, Default)]
pub struct SendGate {
    record: SendRecord,
}

impl SendGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &SendRecord {
        &self.record
    }

    pub fn should_send(&self, tag: &TagId, now_ms: u64, cooldown_ms: u64) -> bool {
        let same_tag = self.record.last_tag.as_ref() == Some(tag);
        let within_cooldown = now_ms.saturating_sub(self.record.last_sent_at_ms) < cooldown_ms;
        !(same_tag && within_cooldown)
    }

    /// 上报成功后更新记录。
    pub fn record_success(&mut self, tag: &TagId, now_ms: u64) {
        self.record.last_tag = Some(tag.clone());
        self.record.last_sent_at_ms = now_ms;
    }
}
