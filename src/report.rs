use std::fmt;

use crate::model::{ScanEvent, ScanPayload};

/// HTTP 传输层错误（连接、写入、提交等阶段）。
#[derive(Debug)]
pub enum TransportError {
    Connect(String),
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(msg) => write!(f, "connect failed: {}", msg),
            TransportError::Io(msg) => write!(f, "io failed: {}", msg),
        }
    }
}

/// 单次上报失败原因。
#[derive(Debug)]
pub enum ReportError {
    Json(serde_json::Error),
    Transport(TransportError),
    HttpStatus(u16),
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Json(err)
    }
}

impl From<TransportError> for ReportError {
    fn from(err: TransportError) -> Self {
        ReportError::Transport(err)
    }
}

/// 同步 POST 一次请求，返回 HTTP 状态码；请求头由调用方给出。
pub trait ScanTransport {
    fn post_json(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<u16, TransportError>;
}

/// 刷卡上报器：每次调用只发起一次请求，不重试、不排队。
pub struct Reporter<T> {
    transport: T,
    url: String,
}

impl<T: ScanTransport> Reporter<T> {
    pub fn new(transport: T, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 上报刷卡事件，2xx 视为成功；所有错误在此处吞掉并记录日志。
    pub fn report(&mut self, event: &ScanEvent) -> bool {
        match self.try_report(event) {
            Ok(status) => {
                log::info!("Scan {} reported (status {})", event, status);
                true
            }
            Err(ReportError::HttpStatus(status)) => {
                log::warn!("POST failed: status {} uid={}", status, event.tag);
                false
            }
            Err(err) => {
                log::warn!("POST error: {:?} uid={}", err, event.tag);
                false
            }
        }
    }

    fn try_report(&mut self, event: &ScanEvent) -> Result<u16, ReportError> {
        let body = serde_json::to_vec(&ScanPayload::from_event(event))?;
        let content_length = body.len().to_string();
        let headers = [
            ("content-type", "application/json"),
            ("content-length", content_length.as_str()),
        ];
        let status = self.transport.post_json(&self.url, &headers, &body)?;
        if !(200..300).contains(&status) {
            return Err(ReportError::HttpStatus(status));
        }
        Ok(status)
    }
}
