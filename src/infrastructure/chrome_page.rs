//! chromiumoxide 页面上的 [`PageDriver`] 实现

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::dom::{NodeRef, PageSnapshot, RawCapture};
use crate::error::{AppError, InjectError};
use crate::infrastructure::{scripts, JsExecutor, PageDriver};
use crate::models::MaterializedFile;

/// 元素操作脚本的返回值
#[derive(Debug, Deserialize)]
struct ScriptOutcome {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// 真实浏览器页面
pub struct ChromePage {
    executor: JsExecutor,
}

impl ChromePage {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    async fn run_element_script(
        &self,
        action: &str,
        target: NodeRef,
        script: String,
    ) -> Result<()> {
        let outcome: ScriptOutcome = self.executor.eval_as(script).await?;
        if outcome.ok {
            debug!("{} #{} 完成", action, target);
            return Ok(());
        }
        let reason = outcome.error.unwrap_or_default();
        if reason == "stale" {
            Err(AppError::Inject(InjectError::StaleHandle { node_ref: target.0 }).into())
        } else {
            Err(AppError::inject_rejected(action, reason).into())
        }
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn snapshot(&self) -> Result<PageSnapshot> {
        let capture: RawCapture = self.executor.eval_as(scripts::CAPTURE_SCRIPT).await?;
        let snapshot = PageSnapshot::from_capture(capture)?;
        debug!("抓取快照: {} 个节点, URL: {}", snapshot.len(), snapshot.url());
        Ok(snapshot)
    }

    async fn click(&self, target: NodeRef) -> Result<()> {
        self.run_element_script("click", target, scripts::click(target))
            .await
    }

    async fn set_native_value(&self, target: NodeRef, value: &str) -> Result<()> {
        self.run_element_script(
            "set_native_value",
            target,
            scripts::set_native_value(target, value),
        )
        .await
    }

    async fn set_editable_text(&self, target: NodeRef, text: &str) -> Result<()> {
        self.run_element_script(
            "set_editable_text",
            target,
            scripts::set_editable_text(target, text),
        )
        .await
    }

    async fn assign_files(&self, target: NodeRef, files: &[MaterializedFile]) -> Result<()> {
        self.run_element_script("assign_files", target, scripts::assign_files(target, files))
            .await
    }

    async fn drop_files(&self, target: NodeRef, files: &[MaterializedFile]) -> Result<()> {
        self.run_element_script("drop_files", target, scripts::drop_files(target, files))
            .await
    }
}
