use std::fmt;

use serde::Serialize;

/// 标签 UID 的固定长度（4 字节 UID + BCC，十六进制）。
pub const TAG_ID_LEN: usize = 10;

/// 已通过校验的标签 ID（10 位十六进制字符串）。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagId(String);

impl TagId {
    /// 校验并构造；去除首尾空白并统一为小写，同一张卡的不同写法视为同一标签。
    pub fn parse(raw: &str) -> Option<Self> {
        if is_valid_uid(raw) {
            Some(Self(raw.trim().to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// UID 格式校验：去空白后恰好 10 位，且全部为十六进制字符。
pub fn is_valid_uid(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.len() == TAG_ID_LEN && trimmed.bytes().all(|b| b.is_ascii_hexdigit())
}

/// 读卡器在位状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceState {
    Absent,
    Present,
}

/// 一次有效刷卡事件（仅在校验通过后创建）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanEvent {
    pub tag: TagId,
    pub device_id: String,
    pub observed_at_ms: u64,
}

impl ScanEvent {
    pub fn new(tag: TagId, device_id: impl Into<String>, observed_at_ms: u64) -> Self {
        Self {
            tag,
            device_id: device_id.into(),
            observed_at_ms,
        }
    }
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dev={} t={}ms", self.tag, self.device_id, self.observed_at_ms)
    }
}

/// 最近一次成功上报的记录（单标签防抖）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendRecord {
    pub last_tag: Option<TagId>,
    pub last_sent_at_ms: u64,
}

/// 姓名显示窗口。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayWindow {
    pub shown_at_ms: Option<u64>,
    pub ttl_ms: u64,
}

impl DisplayWindow {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            shown_at_ms: None,
            ttl_ms,
        }
    }

    /// 是否已超过显示时长（严格大于 ttl）。
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.shown_at_ms {
            Some(shown) => now_ms.saturating_sub(shown) > self.ttl_ms,
            None => false,
        }
    }
}

/// 服务器时间戳占位（Firebase `{".sv": "timestamp"}`）。
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ServerTimestamp {
    #[serde(rename = ".sv")]
    sv: &'static str,
}

impl ServerTimestamp {
    pub const fn new() -> Self {
        Self { sv: "timestamp" }
    }
}

impl Default for ServerTimestamp {
    fn default() -> Self {
        Self::new()
    }
}

/// 上报到日志端点的 JSON 结构。
#[derive(Clone, Debug, Serialize)]
pub struct ScanPayload<'a> {
    pub uid: &'a str,
    pub ts: ServerTimestamp,
    pub dev: &'a str,
}

impl<'a> ScanPayload<'a> {
    pub fn from_event(event: &'a ScanEvent) -> Self {
        Self {
            uid: event.tag.as_str(),
            ts: ServerTimestamp::new(),
            dev: &event.device_id,
        }
    }
}

/// 编译期可覆盖的默认设备号与上报地址。
pub const DEFAULT_DEVICE_ID: &str = match option_env!("DEVICE_ID") {
    Some(id) => id,
    None => "HR-01",
};
pub const DEFAULT_REPORT_URL: &str = match option_env!("REPORT_URL") {
    Some(url) => url,
    None => "https://rfid-cd77f-default-rtdb.asia-southeast1.firebasedatabase.app/logs.json",
};

/// 终端运行参数。
#[derive(Clone, Debug)]
pub struct TerminalSettings {
    pub device_id: String,
    pub report_url: String,
    pub poll_interval_ms: u32,
    pub display_ms: u64,
    pub send_cooldown_ms: u64,
    pub reread_delay_ms: u32,
}

impl TerminalSettings {
    /// 使用指定设备号构建默认参数。
    pub fn with_device_id(id: impl Into<String>) -> Self {
        Self {
            device_id: id.into(),
            report_url: DEFAULT_REPORT_URL.to_string(),
            poll_interval_ms: 50,
            display_ms: 1500,
            send_cooldown_ms: 700,
            reread_delay_ms: 15,
        }
    }
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self::with_device_id(DEFAULT_DEVICE_ID)
    }
}
