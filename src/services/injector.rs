//! 输入注入 - 业务能力层
//!
//! 把文件和文字写进已定位的元素，走与真人操作相同的事件路径。
//! 本模块不持有任何状态。

use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use regex::Regex;
use tracing::{debug, warn};

use crate::dom::{NodeId, PageSnapshot};
use crate::infrastructure::PageDriver;
use crate::models::MaterializedFile;
use crate::services::locator::Locators;

/// 小红书风格的话题残留，如 `#露营[话题]#`
static TOPIC_ARTIFACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[话题\]#").expect("静态正则")
});

/// 去掉正文中所有 `[话题]#`，其余内容不变
pub fn sanitize_description(description: &str) -> String {
    TOPIC_ARTIFACT.replace_all(description, "").into_owned()
}

/// 文件投递方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// 赋值给 file input
    FileInput,
    /// 在上传区域模拟拖拽
    DragAndDrop,
    /// 两种入口都找不到或都失败了
    NoTarget,
}

/// 投递文件：优先 file input，失败或找不到时退回拖拽
pub async fn deliver_files<P>(
    page: &P,
    snapshot: &PageSnapshot,
    locators: &dyn Locators,
    files: &[MaterializedFile],
) -> Delivery
where
    P: PageDriver + ?Sized,
{
    if let Some(input) = locators.find_file_input(snapshot) {
        match node_ref_of(snapshot, input) {
            Ok(target) => match page.assign_files(target, files).await {
                Ok(()) => {
                    debug!("已通过 file input #{} 投递 {} 个文件", target, files.len());
                    return Delivery::FileInput;
                }
                Err(e) => warn!("file input 上传失败，改用拖拽: {}", e),
            },
            Err(e) => warn!("{}", e),
        }
    }

    if let Some(zone) = locators.find_upload_zone(snapshot) {
        match node_ref_of(snapshot, zone) {
            Ok(target) => match page.drop_files(target, files).await {
                Ok(()) => {
                    debug!("已在上传区域 #{} 模拟拖拽 {} 个文件", target, files.len());
                    return Delivery::DragAndDrop;
                }
                Err(e) => warn!("模拟拖拽上传失败: {}", e),
            },
            Err(e) => warn!("{}", e),
        }
    }

    Delivery::NoTarget
}

/// 写入文字
///
/// contenteditable 元素直接写 innerText；input/textarea 走原型 setter。
pub async fn fill_text<P>(
    page: &P,
    snapshot: &PageSnapshot,
    target: NodeId,
    value: &str,
) -> Result<()>
where
    P: PageDriver + ?Sized,
{
    let element = snapshot
        .element(target)
        .ok_or_else(|| anyhow!("节点 {} 不是元素", target))?;

    if element.is_content_editable() {
        page.set_editable_text(element.node_ref, value).await
    } else {
        page.set_native_value(element.node_ref, value).await
    }
}

fn node_ref_of(snapshot: &PageSnapshot, id: NodeId) -> Result<crate::dom::NodeRef> {
    snapshot
        .node_ref(id)
        .ok_or_else(|| anyhow!("节点 {} 不是元素", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementData, FixturePage, PageAction};
    use crate::services::locator::HeuristicLocators;

    #[test]
    fn test_sanitize_removes_only_topic_artifacts() {
        assert_eq!(sanitize_description("#话题 text[话题]#more"), "#话题 textmore");
        assert_eq!(
            sanitize_description("#露营[话题]# #周末[话题]#"),
            "#露营 #周末"
        );
        assert_eq!(sanitize_description("[话题] 与 话题]#"), "[话题] 与 话题]#");
    }

    fn files() -> Vec<MaterializedFile> {
        vec![MaterializedFile::new("1.jpg", "image/jpeg", vec![1, 2, 3])]
    }

    #[tokio::test]
    async fn test_deliver_prefers_file_input() {
        let mut snap = PageSnapshot::new("u");
        let zone = snap.append_element(snap.root(), ElementData::new("label"));
        snap.append_text(zone, "点击上传");
        let input = snap.append_element(
            zone,
            ElementData::new("input").attr("type", "file").attr("accept", "image/*"),
        );
        let input_ref = snap.node_ref(input).unwrap();
        let page = FixturePage::new(snap.clone());

        let delivery = deliver_files(&page, &snap, &HeuristicLocators::default(), &files()).await;
        assert_eq!(delivery, Delivery::FileInput);
        assert_eq!(
            page.actions(),
            vec![PageAction::AssignFiles(input_ref, vec!["1.jpg".to_string()])]
        );
        assert_eq!(
            page.dispatched_events(),
            vec![(input_ref, "change"), (input_ref, "input")]
        );
    }

    #[tokio::test]
    async fn test_deliver_falls_back_to_drag_and_drop() {
        let mut snap = PageSnapshot::new("u");
        let zone = snap.append_element(snap.root(), ElementData::new("div").attr("class", "upload-zone"));
        let span = snap.append_element(zone, ElementData::new("span"));
        snap.append_text(span, "拖入此区域");
        snap.append_element(zone, ElementData::new("input").attr("type", "file"));
        let zone_ref = snap.node_ref(zone).unwrap();
        let page = FixturePage::new(snap.clone());
        page.fail_file_assignment(true);

        let delivery = deliver_files(&page, &snap, &HeuristicLocators::default(), &files()).await;
        assert_eq!(delivery, Delivery::DragAndDrop);
        assert_eq!(
            page.dispatched_events(),
            vec![(zone_ref, "dragenter"), (zone_ref, "dragover"), (zone_ref, "drop")]
        );
    }

    #[tokio::test]
    async fn test_deliver_without_targets() {
        let snap = PageSnapshot::new("u");
        let page = FixturePage::new(snap.clone());

        let delivery = deliver_files(&page, &snap, &HeuristicLocators::default(), &files()).await;
        assert_eq!(delivery, Delivery::NoTarget);
        assert!(page.actions().is_empty());
    }

    #[tokio::test]
    async fn test_fill_text_picks_setter_by_element_kind() {
        let mut snap = PageSnapshot::new("u");
        let input = snap.append_element(snap.root(), ElementData::new("input"));
        let editor = snap.append_element(
            snap.root(),
            ElementData::new("div").attr("contenteditable", "true"),
        );
        let page = FixturePage::new(snap.clone());

        fill_text(&page, &snap, input, "标题").await.unwrap();
        fill_text(&page, &snap, editor, "正文").await.unwrap();

        let input_ref = snap.node_ref(input).unwrap();
        let editor_ref = snap.node_ref(editor).unwrap();
        assert_eq!(page.value_of(input_ref).as_deref(), Some("标题"));
        assert_eq!(page.text_of(editor_ref).as_deref(), Some("正文"));
        assert_eq!(
            page.dispatched_events(),
            vec![(input_ref, "input"), (editor_ref, "click"), (editor_ref, "input")]
        );
    }
}
