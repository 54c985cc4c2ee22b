//! 编排层（Orchestration Layer）
//!
//! ```text
//! publish_runner (持有 Browser，组装并运行一次发布)
//!     ↓
//! workflow::PublishFlow (状态机，每轮一步)
//!     ↓
//! services (能力层：定位 / 注入 / 解码 / 展示)
//!     ↓
//! infrastructure (基础设施：PageDriver / JsExecutor)
//! ```

pub mod publish_runner;

pub use publish_runner::App;
