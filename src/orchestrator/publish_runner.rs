//! 发布运行器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：连接浏览器、打开发布页、创建 JsExecutor
//! 2. **准备数据**：读取任务文件，打包并解码图片
//! 3. **驱动流程**：组装页面驱动、定位规则和展示端，运行状态机
//! 4. **收尾统计**：输出结果和需要人工处理的环节

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{ChromePage, JsExecutor};
use crate::models::{load_publish_job, PublishBundle};
use crate::services::{
    build_bundle, into_payload, FanoutReporter, HeuristicLocators, OverlayReporter,
    TracingReporter,
};
use crate::utils::logging::{log_payload, log_startup, print_run_summary};
use crate::workflow::{PublishFlow, RunOutcome};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    executor: JsExecutor,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        // 连接浏览器
        let (browser, page) = browser::connect_to_browser_and_page(
            config.browser_debug_port,
            &config.upload_url,
            &config.locators.upload_route,
            config.apply_stealth,
        )
        .await?;

        // 创建 JsExecutor（持有 page）
        let executor = JsExecutor::new(page);

        Ok(Self {
            config,
            _browser: browser,
            executor,
        })
    }

    /// 读取任务文件并发布
    pub async fn run(&self) -> Result<RunOutcome> {
        info!("\n📁 正在读取发布任务: {}", self.config.job_file);
        let job = load_publish_job(Path::new(&self.config.job_file)).await?;

        let bundle = build_bundle(job.title, job.description, &job.files);
        if bundle.file_count() < job.files.len() {
            warn!(
                "⚠️ {} 个文件中只有 {} 个可用",
                job.files.len(),
                bundle.file_count()
            );
        }

        self.run_bundle(&bundle).await
    }

    /// 发布一个现成的数据包
    pub async fn run_bundle(&self, bundle: &PublishBundle) -> Result<RunOutcome> {
        let payload = into_payload(bundle);
        log_payload(&payload);

        let page = ChromePage::new(self.executor.clone());
        let mut reporter = FanoutReporter::new().with(TracingReporter::new());
        if self.config.show_overlay {
            reporter = reporter.with(OverlayReporter::new(self.executor.clone()));
        }

        let mut flow = PublishFlow::new(page, reporter, payload)
            .with_locators(HeuristicLocators::new(self.config.locators.clone()))
            .with_limits(self.config.limits)
            .with_timings(self.config.timings());

        let started = Instant::now();
        let finished = tokio::select! {
            outcome = flow.run() => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        };
        let outcome = match finished {
            Some(outcome) => outcome,
            None => {
                warn!("⚠️ 收到中断信号，停止自动化（停在: {}）", flow.phase());
                flow.outcome(started.elapsed())
            }
        };

        print_run_summary(&outcome);
        Ok(outcome)
    }
}
