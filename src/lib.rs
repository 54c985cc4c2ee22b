//! # Auto Publisher
//!
//! 把标题、正文和图片自动填进创作者平台的 "发布图文" 表单
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 抓快照、点击、写值、投递文件
//! - `ChromePage` / `JsExecutor` - chromiumoxide 上的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 每个能力都是无状态的
//! - `Locators` - 在快照中启发式定位控件
//! - `injector` - 走真人操作的事件路径写入页面
//! - `materializer` / `bundle_builder` - 数据包编解码
//! - `StatusSink` - 状态展示
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 唯一有状态的部分
//! - `PublishFlow` - 轮询驱动的状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/publish_runner` - 连接浏览器、准备数据、运行并汇总
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use dom::{FixturePage, PageSnapshot};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromePage, JsExecutor, PageDriver};
pub use models::{PublishBundle, PublishPayload, StatusEvent};
pub use orchestrator::App;
pub use workflow::{Phase, PublishFlow, RunOutcome};
