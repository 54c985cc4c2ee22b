//! 页面驱动能力
//!
//! 状态机只通过这个 trait 接触页面：抓快照、点击、写值、投递文件。
//! 所有 [`NodeRef`] 都来自同一轮的 [`PageSnapshot`]，调用方不得跨轮保存。

use anyhow::Result;
use async_trait::async_trait;

use crate::dom::{NodeRef, PageSnapshot};
use crate::models::MaterializedFile;

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 抓取当前页面，同时刷新页面侧的元素登记表
    async fn snapshot(&self) -> Result<PageSnapshot>;

    /// 触发元素的 `click()`
    async fn click(&self, target: NodeRef) -> Result<()>;

    /// 调用 input/textarea 原型上的 value setter（绕过页面安装的拦截），
    /// 再派发冒泡的 `input` 事件
    async fn set_native_value(&self, target: NodeRef, value: &str) -> Result<()>;

    /// contenteditable 元素：点击获取焦点，写入 innerText，派发 `input`
    async fn set_editable_text(&self, target: NodeRef, text: &str) -> Result<()>;

    /// 用 DataTransfer 构造文件列表赋给 file input，依次派发 `change`、`input`
    async fn assign_files(&self, target: NodeRef, files: &[MaterializedFile]) -> Result<()>;

    /// 在上传区域上依次派发 `dragenter`、`dragover`、`drop`，携带同一份文件列表
    async fn drop_files(&self, target: NodeRef, files: &[MaterializedFile]) -> Result<()>;
}
