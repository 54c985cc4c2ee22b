//! 进度展示
//!
//! 状态机只管发出 [`StatusEvent`]，展示端不回传任何信息，也不做背压：
//! 来不及渲染时只保留最新的一条。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::infrastructure::{scripts, JsExecutor};
use crate::models::{Severity, StatusEvent};

#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn report(&self, event: &StatusEvent);
}

#[async_trait]
impl<T: StatusSink + ?Sized> StatusSink for Arc<T> {
    async fn report(&self, event: &StatusEvent) {
        (**self).report(event).await
    }
}

/// 写进日志，相同消息连续出现时降为 debug
#[derive(Debug, Default)]
pub struct TracingReporter {
    last: Mutex<Option<String>>,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusSink for TracingReporter {
    async fn report(&self, event: &StatusEvent) {
        let repeated = {
            let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
            let repeated = last.as_deref() == Some(event.message.as_str());
            *last = Some(event.message.clone());
            repeated
        };
        if repeated {
            debug!("📣 {}", event);
            return;
        }
        match event.severity {
            Severity::Info => info!("📣 {}", event),
            Severity::Success => info!("✓ {}", event),
            Severity::Warning => warn!("⚠️ {}", event),
            Severity::Error => error!("❌ {}", event),
        }
    }
}

/// 只保留最新一条
#[derive(Debug, Default)]
pub struct LatestStatus {
    latest: Mutex<Option<StatusEvent>>,
}

impl LatestStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<StatusEvent> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl StatusSink for LatestStatus {
    async fn report(&self, event: &StatusEvent) {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(event.clone());
    }
}

/// 按顺序记录全部状态，供嵌入方回放
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(needle))
    }
}

#[async_trait]
impl StatusSink for RecordingReporter {
    async fn report(&self, event: &StatusEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

/// 页面上的悬浮面板
pub struct OverlayReporter {
    executor: JsExecutor,
}

impl OverlayReporter {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl StatusSink for OverlayReporter {
    async fn report(&self, event: &StatusEvent) {
        // 页面跳转中渲染失败很常见，下一轮会重画
        if let Err(e) = self.executor.eval(scripts::render_overlay(event)).await {
            debug!("悬浮面板渲染失败: {}", e);
        }
    }
}

/// 同时发给多个展示端
#[derive(Default)]
pub struct FanoutReporter {
    sinks: Vec<Box<dyn StatusSink>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl StatusSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

#[async_trait]
impl StatusSink for FanoutReporter {
    async fn report(&self, event: &StatusEvent) {
        for sink in &self.sinks {
            sink.report(event).await;
        }
    }
}
