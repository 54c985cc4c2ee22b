//! 启发式定位 - 业务能力层
//!
//! 每个查询都只读一份 [`PageSnapshot`]，没有缓存也没有计数器，
//! 同一份快照反复调用结果不变。找不到时返回 `None`，由调用方决定是否重试。

use crate::config::LocatorConfig;
use crate::dom::{NodeId, PageSnapshot};

/// 定位结果，只在产生它的那份快照内有效
pub type LocatorResult = Option<NodeId>;

/// 发布页控件的定位规则
///
/// 页面改版时可以替换整套规则，状态机只依赖这个 trait。
pub trait Locators: Send + Sync {
    /// "发布图文" 标签
    fn find_tab(&self, snapshot: &PageSnapshot) -> LocatorResult;
    /// 文件选择框
    fn find_file_input(&self, snapshot: &PageSnapshot) -> LocatorResult;
    /// 拖拽上传区域
    fn find_upload_zone(&self, snapshot: &PageSnapshot) -> LocatorResult;
    /// 标题输入框
    fn find_title(&self, snapshot: &PageSnapshot) -> LocatorResult;
    /// 正文编辑区
    fn find_description(&self, snapshot: &PageSnapshot) -> LocatorResult;
    /// 是否停留在登录页
    fn is_login_page(&self, snapshot: &PageSnapshot) -> bool;
    /// 是否已进入发布页路由
    fn is_upload_route(&self, snapshot: &PageSnapshot) -> bool;
}

/// 基于文字和属性的默认规则
#[derive(Debug, Clone, Default)]
pub struct HeuristicLocators {
    config: LocatorConfig,
}

impl HeuristicLocators {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// 向上找父元素，不越过 `BODY`
    fn parent_below_body(snapshot: &PageSnapshot, id: NodeId) -> Option<NodeId> {
        snapshot
            .parent(id)
            .filter(|&p| p != snapshot.root())
    }
}

impl Locators for HeuristicLocators {
    fn find_tab(&self, snapshot: &PageSnapshot) -> LocatorResult {
        let label = self.config.tab_label.as_str();
        let (text_id, _) = snapshot
            .text_nodes()
            .find(|(_, text)| text.trim() == label)?;

        let text_parent = snapshot.parent(text_id)?;
        let mut current = Some(text_parent).filter(|&p| p != snapshot.root());
        while let Some(id) = current {
            if let Some(el) = snapshot.element(id) {
                if el.is_tag("DIV") || el.is_tag("LI") || el.get_attr("role") == Some("tab") {
                    return Some(id);
                }
            }
            current = Self::parent_below_body(snapshot, id);
        }
        Some(text_parent)
    }

    fn find_file_input(&self, snapshot: &PageSnapshot) -> LocatorResult {
        let inputs: Vec<NodeId> = snapshot
            .elements()
            .filter(|(_, el)| el.is_file_input())
            .map(|(id, _)| id)
            .collect();

        inputs
            .iter()
            .copied()
            .find(|&id| {
                snapshot
                    .element(id)
                    .and_then(|el| el.get_attr("accept"))
                    .is_some_and(|accept| accept.contains("image"))
            })
            .or_else(|| inputs.first().copied())
    }

    fn find_upload_zone(&self, snapshot: &PageSnapshot) -> LocatorResult {
        let matched = snapshot.text_nodes().find(|(_, text)| {
            self.config
                .upload_keywords
                .iter()
                .any(|keyword| text.contains(keyword.as_str()))
        });

        if let Some((text_id, _)) = matched {
            let text_parent = snapshot.parent(text_id)?;
            let mut current = Some(text_parent).filter(|&p| p != snapshot.root());
            let mut depth = 0;
            while let Some(id) = current {
                if depth >= self.config.upload_zone_depth {
                    break;
                }
                if let Some(el) = snapshot.element(id) {
                    if el.is_tag("LABEL") || el.class_name().contains("upload") {
                        return Some(id);
                    }
                }
                current = Self::parent_below_body(snapshot, id);
                depth += 1;
            }
            return snapshot.parent(text_parent).or(Some(text_parent));
        }

        let (input_id, _) = snapshot.elements().find(|(_, el)| el.is_file_input())?;
        snapshot.parent(input_id)
    }

    fn find_title(&self, snapshot: &PageSnapshot) -> LocatorResult {
        let candidates: Vec<NodeId> = snapshot
            .elements()
            .filter(|(_, el)| el.is_text_control())
            .map(|(id, _)| id)
            .collect();

        let by_placeholder = candidates.iter().copied().find(|&id| {
            snapshot
                .element(id)
                .and_then(|el| el.get_attr("placeholder"))
                .filter(|placeholder| !placeholder.is_empty())
                .is_some_and(|placeholder| {
                    self.config
                        .title_keywords
                        .iter()
                        .any(|keyword| placeholder.contains(keyword.as_str()))
                })
        });

        by_placeholder.or_else(|| {
            candidates.iter().copied().find(|&id| {
                snapshot
                    .element(id)
                    .is_some_and(|el| el.class_name().to_lowercase().contains("title"))
            })
        })
    }

    fn find_description(&self, snapshot: &PageSnapshot) -> LocatorResult {
        // 面积相同时保留文档顺序靠前的
        let mut best: Option<(NodeId, f64)> = None;
        for (id, el) in snapshot.elements().filter(|(_, el)| el.is_content_editable()) {
            let area = el.area();
            if best.map_or(true, |(_, best_area)| area > best_area) {
                best = Some((id, area));
            }
        }
        if let Some((id, _)) = best {
            return Some(id);
        }

        let title = self.find_title(snapshot);
        snapshot
            .elements()
            .find(|(id, el)| {
                el.is_tag("TEXTAREA")
                    && Some(*id) != title
                    && el.height > self.config.min_description_height
            })
            .map(|(id, _)| id)
    }

    fn is_login_page(&self, snapshot: &PageSnapshot) -> bool {
        let text = snapshot.visible_text();
        self.config
            .login_phrases
            .iter()
            .any(|phrase| text.contains(phrase.as_str()))
    }

    fn is_upload_route(&self, snapshot: &PageSnapshot) -> bool {
        snapshot.url().contains(self.config.upload_route.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementData;

    const UPLOAD_URL: &str = "https://creator.douyin.com/creator-micro/content/upload";

    fn locators() -> HeuristicLocators {
        HeuristicLocators::default()
    }

    #[test]
    fn test_tab_walks_up_to_interactive_container() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        let li = snap.append_element(snap.root(), ElementData::new("li"));
        let span = snap.append_element(li, ElementData::new("span"));
        let inner = snap.append_element(span, ElementData::new("span"));
        snap.append_text(inner, "  发布图文 ");

        assert_eq!(locators().find_tab(&snap), Some(li));
    }

    #[test]
    fn test_tab_role_attribute_counts() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        let tab = snap.append_element(snap.root(), ElementData::new("span").attr("role", "tab"));
        snap.append_text(tab, "发布图文");

        assert_eq!(locators().find_tab(&snap), Some(tab));
    }

    #[test]
    fn test_tab_falls_back_to_text_parent() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        let button = snap.append_element(snap.root(), ElementData::new("button"));
        let span = snap.append_element(button, ElementData::new("span"));
        snap.append_text(span, "发布图文");

        assert_eq!(locators().find_tab(&snap), Some(span));
    }

    #[test]
    fn test_tab_requires_exact_label() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        let div = snap.append_element(snap.root(), ElementData::new("div"));
        snap.append_text(div, "发布图文教程");

        assert_eq!(locators().find_tab(&snap), None);
    }

    #[test]
    fn test_file_input_prefers_image_accept() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        let video = snap.append_element(
            snap.root(),
            ElementData::new("input").attr("type", "file").attr("accept", "video/*"),
        );
        let image = snap.append_element(
            snap.root(),
            ElementData::new("input").attr("type", "file").attr("accept", "image/png,image/jpeg"),
        );

        assert_eq!(locators().find_file_input(&snap), Some(image));

        let mut only_video = PageSnapshot::new(UPLOAD_URL);
        let first = only_video.append_element(
            only_video.root(),
            ElementData::new("input").attr("type", "file").attr("accept", "video/*"),
        );
        assert_eq!(locators().find_file_input(&only_video), Some(first));
        assert_ne!(video, image);
    }

    #[test]
    fn test_upload_zone_finds_upload_class_within_depth() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        let zone = snap.append_element(snap.root(), ElementData::new("div").attr("class", "upload-btn"));
        let inner = snap.append_element(zone, ElementData::new("div"));
        let span = snap.append_element(inner, ElementData::new("span"));
        snap.append_text(span, "点击上传 或直接将图片文件拖入此区域");

        assert_eq!(locators().find_upload_zone(&snap), Some(zone));
    }

    #[test]
    fn test_upload_zone_depth_bound_falls_back_to_grandparent() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        let label = snap.append_element(snap.root(), ElementData::new("label"));
        let mut parent = label;
        for _ in 0..6 {
            parent = snap.append_element(parent, ElementData::new("div"));
        }
        snap.append_text(parent, "拖入此区域");
        let grandparent = snap.parent(parent).unwrap();

        assert_eq!(locators().find_upload_zone(&snap), Some(grandparent));
    }

    #[test]
    fn test_upload_zone_without_keyword_uses_file_input_container() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        let wrapper = snap.append_element(snap.root(), ElementData::new("div"));
        snap.append_element(wrapper, ElementData::new("input").attr("type", "file"));

        assert_eq!(locators().find_upload_zone(&snap), Some(wrapper));
        assert_eq!(locators().find_upload_zone(&PageSnapshot::new(UPLOAD_URL)), None);
    }

    #[test]
    fn test_title_by_placeholder_then_class() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        snap.append_element(snap.root(), ElementData::new("input").attr("placeholder", "搜索"));
        let by_class = snap.append_element(
            snap.root(),
            ElementData::new("input").attr("class", "Note-Title-Input"),
        );
        assert_eq!(locators().find_title(&snap), Some(by_class));

        let by_placeholder = snap.append_element(
            snap.root(),
            ElementData::new("textarea").attr("placeholder", "填写标题会有更多赞哦～"),
        );
        assert_eq!(locators().find_title(&snap), Some(by_placeholder));
    }

    #[test]
    fn test_description_prefers_largest_editable() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        snap.append_element(
            snap.root(),
            ElementData::new("div").attr("contenteditable", "true").size(100.0, 20.0),
        );
        let big = snap.append_element(
            snap.root(),
            ElementData::new("div").attr("contenteditable", "true").size(600.0, 300.0),
        );
        snap.append_element(
            snap.root(),
            ElementData::new("div").attr("contenteditable", "false").size(1000.0, 1000.0),
        );

        assert_eq!(locators().find_description(&snap), Some(big));
    }

    #[test]
    fn test_description_textarea_fallback_skips_title_and_short() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        snap.append_element(
            snap.root(),
            ElementData::new("textarea").attr("placeholder", "填写标题").size(400.0, 80.0),
        );
        snap.append_element(snap.root(), ElementData::new("textarea").size(400.0, 30.0));
        let body = snap.append_element(snap.root(), ElementData::new("textarea").size(400.0, 200.0));

        assert_eq!(locators().find_description(&snap), Some(body));
    }

    #[test]
    fn test_login_and_route_detection() {
        let mut snap = PageSnapshot::new("https://creator.douyin.com/login");
        snap.append_text(snap.root(), "请使用抖音扫码登录");
        assert!(locators().is_login_page(&snap));
        assert!(!locators().is_upload_route(&snap));

        let snap = PageSnapshot::new(UPLOAD_URL);
        assert!(!locators().is_login_page(&snap));
        assert!(locators().is_upload_route(&snap));
    }

    #[test]
    fn test_locators_are_idempotent() {
        let mut snap = PageSnapshot::new(UPLOAD_URL);
        let tab = snap.append_element(snap.root(), ElementData::new("div"));
        snap.append_text(tab, "发布图文");
        snap.append_element(snap.root(), ElementData::new("input").attr("type", "file"));
        snap.append_element(snap.root(), ElementData::new("input").attr("placeholder", "标题"));

        let l = locators();
        let first = (l.find_tab(&snap), l.find_file_input(&snap), l.find_title(&snap));
        for _ in 0..5 {
            assert_eq!(
                (l.find_tab(&snap), l.find_file_input(&snap), l.find_title(&snap)),
                first
            );
        }
    }
}
