//! 内存页面
//!
//! 不启动浏览器就能驱动状态机：返回预先搭好的快照，记录每一次注入。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::dom::{NodeRef, PageSnapshot};
use crate::error::{AppError, InjectError};
use crate::infrastructure::PageDriver;
use crate::models::MaterializedFile;

/// 页面上发生过的一次操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Click(NodeRef),
    SetValue(NodeRef, String),
    SetEditableText(NodeRef, String),
    /// 文件名列表
    AssignFiles(NodeRef, Vec<String>),
    DropFiles(NodeRef, Vec<String>),
}

impl PageAction {
    pub fn is_file_delivery(&self) -> bool {
        matches!(self, PageAction::AssignFiles(..) | PageAction::DropFiles(..))
    }
}

#[derive(Debug)]
struct FixtureState {
    snapshot: PageSnapshot,
    actions: Vec<PageAction>,
    events: Vec<(NodeRef, &'static str)>,
    values: HashMap<NodeRef, String>,
    texts: HashMap<NodeRef, String>,
    snapshots_taken: usize,
    fail_assign: bool,
    fail_snapshot: bool,
}

/// 测试用页面
#[derive(Debug)]
pub struct FixturePage {
    state: Mutex<FixtureState>,
}

impl FixturePage {
    pub fn new(snapshot: PageSnapshot) -> Self {
        Self {
            state: Mutex::new(FixtureState {
                snapshot,
                actions: Vec::new(),
                events: Vec::new(),
                values: HashMap::new(),
                texts: HashMap::new(),
                snapshots_taken: 0,
                fail_assign: false,
                fail_snapshot: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FixtureState> {
        // 测试中某个断言 panic 后锁会中毒，状态本身仍然可读
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 模拟页面重新渲染
    pub fn replace_snapshot(&self, snapshot: PageSnapshot) {
        self.lock().snapshot = snapshot;
    }

    pub fn set_url(&self, url: &str) {
        self.lock().snapshot.set_url(url);
    }

    /// 让 `assign_files` 抛错，用于验证拖拽兜底
    pub fn fail_file_assignment(&self, fail: bool) {
        self.lock().fail_assign = fail;
    }

    /// 让 `snapshot` 抛错
    pub fn fail_snapshots(&self, fail: bool) {
        self.lock().fail_snapshot = fail;
    }

    pub fn actions(&self) -> Vec<PageAction> {
        self.lock().actions.clone()
    }

    /// 按派发顺序记录的 (元素, 事件名)
    pub fn dispatched_events(&self) -> Vec<(NodeRef, &'static str)> {
        self.lock().events.clone()
    }

    pub fn value_of(&self, target: NodeRef) -> Option<String> {
        self.lock().values.get(&target).cloned()
    }

    pub fn text_of(&self, target: NodeRef) -> Option<String> {
        self.lock().texts.get(&target).cloned()
    }

    pub fn snapshots_taken(&self) -> usize {
        self.lock().snapshots_taken
    }
}

impl FixtureState {
    fn ensure_present(&self, target: NodeRef) -> Result<()> {
        let present = self
            .snapshot
            .elements()
            .any(|(_, el)| el.node_ref == target);
        if present {
            Ok(())
        } else {
            Err(AppError::Inject(InjectError::StaleHandle {
                node_ref: target.0,
            })
            .into())
        }
    }

    fn dispatch(&mut self, target: NodeRef, events: &[&'static str]) {
        self.events
            .extend(events.iter().map(|event| (target, *event)));
    }
}

fn file_names(files: &[MaterializedFile]) -> Vec<String> {
    files.iter().map(|f| f.name.clone()).collect()
}

#[async_trait]
impl PageDriver for FixturePage {
    async fn snapshot(&self) -> Result<PageSnapshot> {
        let mut state = self.lock();
        if state.fail_snapshot {
            return Err(anyhow!("页面尚未就绪"));
        }
        state.snapshots_taken += 1;
        Ok(state.snapshot.clone())
    }

    async fn click(&self, target: NodeRef) -> Result<()> {
        let mut state = self.lock();
        state.ensure_present(target)?;
        state.actions.push(PageAction::Click(target));
        state.dispatch(target, &["click"]);
        Ok(())
    }

    async fn set_native_value(&self, target: NodeRef, value: &str) -> Result<()> {
        let mut state = self.lock();
        state.ensure_present(target)?;
        state.values.insert(target, value.to_string());
        state
            .actions
            .push(PageAction::SetValue(target, value.to_string()));
        state.dispatch(target, &["input"]);
        Ok(())
    }

    async fn set_editable_text(&self, target: NodeRef, text: &str) -> Result<()> {
        let mut state = self.lock();
        state.ensure_present(target)?;
        state.dispatch(target, &["click"]);
        state.texts.insert(target, text.to_string());
        state
            .actions
            .push(PageAction::SetEditableText(target, text.to_string()));
        state.dispatch(target, &["input"]);
        Ok(())
    }

    async fn assign_files(&self, target: NodeRef, files: &[MaterializedFile]) -> Result<()> {
        let mut state = self.lock();
        state.ensure_present(target)?;
        if state.fail_assign {
            return Err(AppError::inject_rejected("assign_files", "files 属性只读").into());
        }
        state
            .actions
            .push(PageAction::AssignFiles(target, file_names(files)));
        state.dispatch(target, &["change", "input"]);
        Ok(())
    }

    async fn drop_files(&self, target: NodeRef, files: &[MaterializedFile]) -> Result<()> {
        let mut state = self.lock();
        state.ensure_present(target)?;
        state
            .actions
            .push(PageAction::DropFiles(target, file_names(files)));
        state.dispatch(target, &["dragenter", "dragover", "drop"]);
        Ok(())
    }
}
