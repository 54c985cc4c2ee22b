use std::fmt::Display;

/// 状态消息的级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    /// 某一步已经完成，属于 info 级别，面板上高亮显示
    Success,
    Warning,
    Error,
}

impl Severity {
    /// 悬浮面板上的文字颜色
    pub fn color(self) -> &'static str {
        match self {
            Severity::Info => "white",
            Severity::Success => "#4cc9f0",
            Severity::Warning => "#fca311",
            Severity::Error => "#ff006e",
        }
    }
}

/// 进度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Indeterminate,
    /// 0..=100
    Percent(u8),
}

impl Progress {
    pub fn percent(value: u32) -> Self {
        Progress::Percent(value.min(100) as u8)
    }
}

/// 状态机发给展示端的一条状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub message: String,
    pub severity: Severity,
    pub progress: Progress,
}

impl StatusEvent {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            progress: Progress::Indeterminate,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }
}

impl Display for StatusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.progress {
            Progress::Percent(p) => write!(f, "{} ({}%)", self.message, p),
            Progress::Indeterminate => write!(f, "{}", self.message),
        }
    }
}
