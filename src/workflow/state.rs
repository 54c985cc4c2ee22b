//! 自动化状态
//!
//! 每个 [`crate::workflow::PublishFlow`] 独占一份，不保存任何页面句柄。

use std::fmt::Display;

/// 发布流程的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    /// 切换到 "发布图文" 标签
    NavigateTab,
    /// 投递文件
    Upload,
    /// 等待编辑器出现
    WaitEditor,
    /// 填写标题和正文
    FillForm,
    Done,
    Error,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Error)
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Init => "初始化",
            Phase::NavigateTab => "切换标签",
            Phase::Upload => "上传文件",
            Phase::WaitEditor => "等待编辑器",
            Phase::FillForm => "填充表单",
            Phase::Done => "完成",
            Phase::Error => "失败",
        };
        write!(f, "{}", name)
    }
}

/// 阶段 + 两类计数器
///
/// - `retry_count`：自动化自身动作（找标签、投递文件、填表）的失败次数，有上限
/// - `wait_ticks`：等待用户或页面（登录、编辑器加载）的轮数，不会导致失败
///
/// 两者在每次切换阶段时清零。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationState {
    phase: Phase,
    retry_count: u32,
    wait_ticks: u32,
    transitions: u32,
}

impl Default for AutomationState {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Init,
            retry_count: 0,
            wait_ticks: 0,
            transitions: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn wait_ticks(&self) -> u32 {
        self.wait_ticks
    }

    /// 累计切换次数
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// 切换阶段并清零计数器，返回原阶段
    pub fn transition(&mut self, to: Phase) -> Phase {
        let from = self.phase;
        self.phase = to;
        self.retry_count = 0;
        self.wait_ticks = 0;
        self.transitions += 1;
        from
    }

    /// 记一次动作失败；超过 `max` 时返回 true
    pub fn record_failure(&mut self, max: u32) -> bool {
        self.retry_count += 1;
        self.retry_count > max
    }

    /// 记一轮环境等待，返回已等待的轮数
    pub fn record_wait(&mut self) -> u32 {
        self.wait_ticks += 1;
        self.wait_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_resets_both_counters() {
        let mut state = AutomationState::new();
        state.transition(Phase::NavigateTab);
        state.record_failure(20);
        state.record_wait();
        state.record_wait();

        let from = state.transition(Phase::Upload);
        assert_eq!(from, Phase::NavigateTab);
        assert_eq!(state.retry_count(), 0);
        assert_eq!(state.wait_ticks(), 0);
        assert_eq!(state.transitions(), 2);
    }

    #[test]
    fn test_failure_budget_exhausts_after_max_plus_one() {
        let mut state = AutomationState::new();
        let exhausted: Vec<bool> = (0..4).map(|_| state.record_failure(3)).collect();
        assert_eq!(exhausted, vec![false, false, false, true]);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(Phase::Done.is_terminal());
        assert!(Phase::Error.is_terminal());
        assert!(!Phase::WaitEditor.is_terminal());
    }
}
