//! 发布流程 - 流程层
//!
//! 核心职责：按固定间隔推进状态机，每轮只做一步
//!
//! 流程顺序：
//! 1. Init → NavigateTab：进入发布页并点击 "发布图文"
//! 2. Upload：file input 注入，失败时模拟拖拽
//! 3. WaitEditor：等标题框出现
//! 4. FillForm：写入标题和正文
//! 5. Done / Error
//!
//! 等待用户的环节（登录、手动切换、手动上传）只提示不失败；
//! 自动化自己的动作有重试上限，用完后退到人工兜底。

use std::time::Instant;

use tokio::time::{sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{FlowLimits, FlowTimings};
use crate::dom::PageSnapshot;
use crate::infrastructure::PageDriver;
use crate::models::{Progress, PublishPayload, StatusEvent};
use crate::services::injector::{self, Delivery};
use crate::services::locator::{HeuristicLocators, Locators};
use crate::services::reporter::StatusSink;
use crate::workflow::state::{AutomationState, Phase};

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub phase: Phase,
    pub ticks: u64,
    pub elapsed: std::time::Duration,
    /// 走了人工兜底的环节
    pub manual_followups: Vec<String>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.phase == Phase::Done
    }
}

/// 发布状态机
pub struct PublishFlow<P, R> {
    page: P,
    reporter: R,
    locators: Box<dyn Locators>,
    payload: PublishPayload,
    limits: FlowLimits,
    timings: FlowTimings,
    state: AutomationState,
    ticks: u64,
    manual_followups: Vec<String>,
}

impl<P, R> PublishFlow<P, R>
where
    P: PageDriver,
    R: StatusSink,
{
    pub fn new(page: P, reporter: R, payload: PublishPayload) -> Self {
        Self {
            page,
            reporter,
            locators: Box::new(HeuristicLocators::default()),
            payload,
            limits: FlowLimits::default(),
            timings: FlowTimings::default(),
            state: AutomationState::new(),
            ticks: 0,
            manual_followups: Vec::new(),
        }
    }

    pub fn with_locators(mut self, locators: impl Locators + 'static) -> Self {
        self.locators = Box::new(locators);
        self
    }

    pub fn with_limits(mut self, limits: FlowLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_timings(mut self, timings: FlowTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn state(&self) -> &AutomationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// 按轮询间隔推进，直到 Done 或 Error
    ///
    /// 停在等待类阶段时不会自行退出，由调用方决定何时放弃。
    pub async fn run(&mut self) -> RunOutcome {
        let started = Instant::now();
        let mut interval = tokio::time::interval(self.timings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if self.tick().await.is_terminal() {
                break;
            }
        }

        self.outcome(started.elapsed())
    }

    /// 当前进度的快照，供 run 之外的调用方使用
    pub fn outcome(&self, elapsed: std::time::Duration) -> RunOutcome {
        RunOutcome {
            phase: self.state.phase(),
            ticks: self.ticks,
            elapsed,
            manual_followups: self.manual_followups.clone(),
        }
    }

    /// 执行一步，返回执行后的阶段
    ///
    /// 任何错误都在这里消化，调用后状态总是明确的。
    pub async fn tick(&mut self) -> Phase {
        let phase = self.state.phase();
        if phase.is_terminal() {
            return phase;
        }
        self.ticks += 1;
        debug!(
            "第 {} 轮: 阶段 {}, 重试 {}, 等待 {}",
            self.ticks,
            phase,
            self.state.retry_count(),
            self.state.wait_ticks()
        );

        match phase {
            Phase::Init => self.init().await,
            Phase::NavigateTab => self.navigate_tab().await,
            Phase::Upload => self.upload().await,
            Phase::WaitEditor => self.wait_editor().await,
            Phase::FillForm => self.fill_form().await,
            Phase::Done | Phase::Error => {}
        }

        self.state.phase()
    }

    // ========== 各阶段 ==========

    async fn init(&mut self) {
        self.report(StatusEvent::info("初始化中...")).await;
        self.transition(Phase::NavigateTab);
    }

    async fn navigate_tab(&mut self) {
        let snapshot = self.capture().await;
        let ready = snapshot.as_ref().is_some_and(|s| {
            self.locators.is_upload_route(s) && !self.locators.is_login_page(s)
        });
        if !ready {
            self.state.record_wait();
            self.report(StatusEvent::warning("等待进入发布页面(请先登录)..."))
                .await;
            return;
        }
        let Some(snapshot) = snapshot else { return };

        self.report(StatusEvent::info("正在寻找“发布图文”标签...")).await;

        let target = self
            .locators
            .find_tab(&snapshot)
            .and_then(|id| snapshot.node_ref(id));
        if let Some(target) = target {
            match self.page.click(target).await {
                Ok(()) => {
                    self.report(StatusEvent::success("已点击“发布图文”标签")).await;
                    sleep(self.timings.tab_settle).await;
                    self.transition(Phase::Upload);
                    return;
                }
                Err(e) => warn!("点击“发布图文”标签失败: {}", e),
            }
        }

        if self.state.record_failure(self.limits.max_tab_retries) {
            let message = "找不到“发布图文”标签，请手动切换";
            self.report(StatusEvent::warning(message)).await;
            self.manual_followups.push(message.to_string());
            self.transition(Phase::Upload);
        }
    }

    async fn upload(&mut self) {
        if !self.payload.has_files() {
            self.report(StatusEvent::warning("无文件可上传，跳过上传步骤"))
                .await;
            self.transition(Phase::WaitEditor);
            return;
        }

        self.report(StatusEvent::info(format!(
            "准备上传 {} 个文件...",
            self.payload.files.len()
        )))
        .await;

        let delivery = match self.capture().await {
            Some(snapshot) => {
                injector::deliver_files(
                    &self.page,
                    &snapshot,
                    self.locators.as_ref(),
                    &self.payload.files,
                )
                .await
            }
            None => Delivery::NoTarget,
        };

        match delivery {
            Delivery::FileInput | Delivery::DragAndDrop => {
                let message = if delivery == Delivery::FileInput {
                    "已触发文件选择事件"
                } else {
                    "已触发上传事件"
                };
                self.report(StatusEvent::success(message)).await;
                sleep(self.timings.upload_settle).await;
                self.transition(Phase::WaitEditor);
            }
            Delivery::NoTarget => {
                if self.state.record_failure(self.limits.max_upload_retries) {
                    let message = "找不到上传区域，请手动上传";
                    self.report(StatusEvent::warning(message)).await;
                    self.manual_followups.push(message.to_string());
                    self.transition(Phase::WaitEditor);
                }
            }
        }
    }

    async fn wait_editor(&mut self) {
        let progress = Progress::percent((self.state.wait_ticks() % 10) * 10);
        self.report(StatusEvent::info("等待进入编辑界面...").with_progress(progress))
            .await;

        let editor_ready = self
            .capture()
            .await
            .is_some_and(|s| self.locators.find_title(&s).is_some());
        if editor_ready {
            self.transition(Phase::FillForm);
            return;
        }

        if self.state.record_wait() > self.limits.editor_timeout_ticks {
            self.report(StatusEvent::warning("等待超时，请检查是否上传成功"))
                .await;
        }
    }

    async fn fill_form(&mut self) {
        self.report(StatusEvent::info("正在填充内容...")).await;

        let filled = match self.capture().await {
            Some(snapshot) => self.fill_fields(&snapshot).await,
            None => false,
        };

        if filled {
            self.report(StatusEvent::success("发布信息已填充完成！")).await;
            self.transition(Phase::Done);
        } else if self.state.record_failure(self.limits.max_fill_retries) {
            self.report(StatusEvent::error("填充失败，请手动完成标题和正文"))
                .await;
            self.transition(Phase::Error);
        }
    }

    /// 标题或正文任一写入成功即返回 true
    async fn fill_fields(&self, snapshot: &PageSnapshot) -> bool {
        let mut filled = false;

        if !self.payload.title.is_empty() {
            if let Some(title) = self.locators.find_title(snapshot) {
                match injector::fill_text(&self.page, snapshot, title, &self.payload.title).await
                {
                    Ok(()) => filled = true,
                    Err(e) => warn!("写入标题失败: {}", e),
                }
            }
        }

        if !self.payload.description.is_empty() {
            if let Some(description) = self.locators.find_description(snapshot) {
                let cleaned = injector::sanitize_description(&self.payload.description);
                match injector::fill_text(&self.page, snapshot, description, &cleaned).await {
                    Ok(()) => filled = true,
                    Err(e) => warn!("写入正文失败: {}", e),
                }
            }
        }

        filled
    }

    // ========== 辅助方法 ==========

    /// 抓取失败视为本轮什么都没找到
    async fn capture(&self) -> Option<PageSnapshot> {
        match self.page.snapshot().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!("抓取页面失败，本轮跳过: {}", e);
                None
            }
        }
    }

    fn transition(&mut self, to: Phase) {
        let from = self.state.transition(to);
        info!("状态切换: {} → {}", from, to);
    }

    async fn report(&self, event: StatusEvent) {
        self.reporter.report(&event).await;
    }
}
