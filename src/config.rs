use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 发布页地址
    pub upload_url: String,
    /// 发布任务 TOML 文件
    pub job_file: String,
    /// 状态机轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 点击标签后等待页面切换（毫秒）
    pub tab_settle_ms: u64,
    /// 触发上传后等待页面响应（毫秒）
    pub upload_settle_ms: u64,
    /// 是否在页面上显示悬浮状态面板
    pub show_overlay: bool,
    /// 是否注入反检测脚本
    pub apply_stealth: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 定位器关键词
    pub locators: LocatorConfig,
    /// 各阶段重试上限
    pub limits: FlowLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            upload_url: "https://creator.douyin.com/creator-micro/content/upload".to_string(),
            job_file: "publish.toml".to_string(),
            poll_interval_ms: 1000,
            tab_settle_ms: 1000,
            upload_settle_ms: 2000,
            show_overlay: true,
            apply_stealth: true,
            verbose_logging: false,
            locators: LocatorConfig::default(),
            limits: FlowLimits::default(),
        }
    }
}

impl Config {
    /// 从环境变量读取配置，缺失或无法解析的字段使用默认值
    pub fn from_env() -> Self {
        let default = Self::default();
        let mut locators = default.locators.clone();
        if let Ok(route) = std::env::var("UPLOAD_ROUTE") {
            locators.upload_route = route;
        }
        Self {
            browser_debug_port: env_or("BROWSER_DEBUG_PORT", default.browser_debug_port),
            upload_url: std::env::var("UPLOAD_URL").unwrap_or(default.upload_url),
            job_file: std::env::var("JOB_FILE").unwrap_or(default.job_file),
            poll_interval_ms: env_or("POLL_INTERVAL_MS", default.poll_interval_ms),
            tab_settle_ms: env_or("TAB_SETTLE_MS", default.tab_settle_ms),
            upload_settle_ms: env_or("UPLOAD_SETTLE_MS", default.upload_settle_ms),
            show_overlay: env_or("SHOW_OVERLAY", default.show_overlay),
            apply_stealth: env_or("APPLY_STEALTH", default.apply_stealth),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
            locators,
            limits: default.limits,
        }
    }

    /// 状态机使用的时间参数
    pub fn timings(&self) -> FlowTimings {
        FlowTimings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            tab_settle: Duration::from_millis(self.tab_settle_ms),
            upload_settle: Duration::from_millis(self.upload_settle_ms),
        }
    }
}

/// 读取并解析环境变量，失败时记录警告并回退到默认值
fn env_or<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(var_name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                let err = ConfigError::EnvVarParseFailed {
                    var_name: var_name.to_string(),
                    value,
                    expected_type: std::any::type_name::<T>().to_string(),
                };
                tracing::warn!("{}，使用默认值", err);
                default
            }
        },
        Err(_) => default,
    }
}

/// 定位器使用的关键词与阈值
#[derive(Clone, Debug)]
pub struct LocatorConfig {
    /// "发布图文" 标签文字（精确匹配）
    pub tab_label: String,
    /// 上传区域提示文字
    pub upload_keywords: Vec<String>,
    /// 上传区域向上查找的最大层数
    pub upload_zone_depth: usize,
    /// 标题输入框 placeholder 关键词
    pub title_keywords: Vec<String>,
    /// 正文 textarea 的最小高度（像素）
    pub min_description_height: f64,
    /// 登录页特征文字
    pub login_phrases: Vec<String>,
    /// 发布页路由片段，URL 包含它才认为进入了发布页
    pub upload_route: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            tab_label: "发布图文".to_string(),
            upload_keywords: owned(&["点击上传", "拖入此区域", "上传图文"]),
            upload_zone_depth: 5,
            title_keywords: owned(&["标题", "title", "填写", "添加"]),
            min_description_height: 50.0,
            login_phrases: owned(&["扫码登录", "验证码登录", "手机号登录"]),
            upload_route: "/creator-micro/content/upload".to_string(),
        }
    }
}

/// 各阶段的重试上限
#[derive(Clone, Copy, Debug)]
pub struct FlowLimits {
    /// 找不到 "发布图文" 标签时的重试次数
    pub max_tab_retries: u32,
    /// 找不到上传入口时的重试次数
    pub max_upload_retries: u32,
    /// 等待编辑器多少轮后提示超时（仅提示，不终止）
    pub editor_timeout_ticks: u32,
    /// 填充表单的重试次数，超过后进入 Error
    pub max_fill_retries: u32,
}

impl Default for FlowLimits {
    fn default() -> Self {
        Self {
            max_tab_retries: 20,
            max_upload_retries: 20,
            editor_timeout_ticks: 60,
            max_fill_retries: 10,
        }
    }
}

/// 状态机的时间参数
#[derive(Clone, Copy, Debug)]
pub struct FlowTimings {
    pub poll_interval: Duration,
    pub tab_settle: Duration,
    pub upload_settle: Duration,
}

impl FlowTimings {
    /// 不等待，测试用
    pub fn immediate() -> Self {
        Self {
            poll_interval: Duration::from_millis(1),
            tab_settle: Duration::ZERO,
            upload_settle: Duration::ZERO,
        }
    }
}

impl Default for FlowTimings {
    fn default() -> Self {
        Config::default().timings()
    }
}
