use chrono::{DateTime, Local, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    Success,
    Warning,
    Error,
}

impl LogKind {
    pub const ALL: [LogKind; 4] = [
        LogKind::Info,
        LogKind::Success,
        LogKind::Warning,
        LogKind::Error,
    ];

    pub fn as_upper(self) -> &'static str {
        match self {
            LogKind::Info => "INFO",
            LogKind::Success => "SUCCESS",
            LogKind::Warning => "WARNING",
            LogKind::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusLog {
    pub id: String,
    pub message: String,
    pub kind: LogKind,
    pub timestamp: DateTime<Utc>,
}

impl StatusLog {
    /// `[local timestamp] [TYPE] message`
    pub fn to_line(&self) -> String {
        let local = self.timestamp.with_timezone(&Local);
        format!(
            "[{}] [{}] {}",
            local.format("%Y-%m-%d %H:%M:%S"),
            self.kind.as_upper(),
            self.message
        )
    }
}
