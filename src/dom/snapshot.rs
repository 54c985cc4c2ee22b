//! 页面快照
//!
//! 每一轮轮询都从页面抓取一份 `document.body` 的拷贝，定位器只读这份拷贝。
//! 元素上的 [`NodeRef`] 指向页面侧的临时登记表，下一次抓取会覆盖它，
//! 所以任何句柄都只在本轮内有效。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, BrowserError};

/// 快照内的节点下标
pub type NodeId = usize;

/// 页面侧登记表中的元素编号，仅在抓取它的那一轮有效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(pub u32);

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 元素节点
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// 大写标签名，如 `DIV`
    pub tag: String,
    pub node_ref: NodeRef,
    pub attrs: HashMap<String, String>,
    /// offsetWidth
    pub width: f64,
    /// offsetHeight
    pub height: f64,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            node_ref: NodeRef(0),
            attrs: HashMap::new(),
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn class_name(&self) -> &str {
        self.get_attr("class").unwrap_or("")
    }

    pub fn is_file_input(&self) -> bool {
        self.is_tag("INPUT")
            && self
                .get_attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("file"))
    }

    pub fn is_text_control(&self) -> bool {
        self.is_tag("INPUT") || self.is_tag("TEXTAREA")
    }

    /// 对应 `[contenteditable="true"]`
    pub fn is_content_editable(&self) -> bool {
        self.get_attr("contenteditable") == Some("true")
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

/// 一轮轮询看到的页面
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    url: String,
    /// `document.body.innerText`；手工构造的快照为 None，此时由文本节点拼出
    body_text: Option<String>,
    nodes: Vec<Node>,
}

impl PageSnapshot {
    /// 只有一个空 `BODY` 的快照
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body_text: None,
            nodes: vec![Node {
                parent: None,
                kind: NodeKind::Element(ElementData::new("BODY")),
                children: Vec::new(),
            }],
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn with_body_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = Some(text.into());
        self
    }

    /// `BODY`
    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// 追加元素，按追加顺序分配 [`NodeRef`]
    pub fn append_element(&mut self, parent: NodeId, mut element: ElementData) -> NodeId {
        let id = self.nodes.len();
        element.node_ref = NodeRef(id as u32);
        self.push(parent, NodeKind::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeKind::Text(text.to_string()))
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            kind,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn node_ref(&self, id: NodeId) -> Option<NodeRef> {
        self.element(id).map(|el| el.node_ref)
    }

    /// 按文档顺序（深度优先先序）遍历全部节点
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        order
    }

    /// 文档顺序的元素节点（不含 `BODY`）
    pub fn elements(&self) -> impl Iterator<Item = (NodeId, &ElementData)> + '_ {
        self.document_order()
            .into_iter()
            .skip(1)
            .filter_map(move |id| self.element(id).map(|el| (id, el)))
    }

    /// 文档顺序的文本节点
    pub fn text_nodes(&self) -> impl Iterator<Item = (NodeId, &str)> + '_ {
        self.document_order()
            .into_iter()
            .filter_map(move |id| self.text(id).map(|t| (id, t)))
    }

    /// 页面可见文字
    pub fn visible_text(&self) -> String {
        match &self.body_text {
            Some(text) => text.clone(),
            None => self
                .text_nodes()
                .map(|(_, t)| t)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// 从页面抓取脚本返回的 JSON 构建快照
    pub fn from_capture(capture: RawCapture) -> AppResult<Self> {
        let mut nodes: Vec<Node> = Vec::with_capacity(capture.nodes.len());

        for (id, raw) in capture.nodes.into_iter().enumerate() {
            let (parent, kind) = match raw {
                RawNode::Element {
                    parent,
                    node_ref,
                    tag,
                    attrs,
                    width,
                    height,
                } => (
                    parent,
                    NodeKind::Element(ElementData {
                        tag: tag.to_ascii_uppercase(),
                        node_ref,
                        attrs,
                        width,
                        height,
                    }),
                ),
                RawNode::Text { parent, text } => (parent, NodeKind::Text(text)),
            };

            match parent {
                None if id == 0 => {}
                Some(p) if p < id => nodes[p].children.push(id),
                _ => {
                    return Err(AppError::Browser(BrowserError::SnapshotMalformed {
                        reason: format!("节点 {} 的父节点 {:?} 不合法", id, parent),
                    }))
                }
            }

            nodes.push(Node {
                parent,
                kind,
                children: Vec::new(),
            });
        }

        if !matches!(nodes.first().map(|n| &n.kind), Some(NodeKind::Element(_))) {
            return Err(AppError::Browser(BrowserError::SnapshotMalformed {
                reason: "快照缺少 BODY 节点".to_string(),
            }));
        }

        Ok(Self {
            url: capture.url,
            body_text: Some(capture.text),
            nodes,
        })
    }
}

/// 抓取脚本的返回值：按文档顺序排列的扁平节点表
#[derive(Debug, Clone, Deserialize)]
pub struct RawCapture {
    pub url: String,
    #[serde(default)]
    pub text: String,
    pub nodes: Vec<RawNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawNode {
    Element {
        parent: Option<NodeId>,
        #[serde(rename = "ref")]
        node_ref: NodeRef,
        tag: String,
        #[serde(default)]
        attrs: HashMap<String, String>,
        #[serde(default)]
        width: f64,
        #[serde(default)]
        height: f64,
    },
    Text {
        parent: Option<NodeId>,
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_order_follows_tree_not_insertion() {
        let mut snap = PageSnapshot::new("https://example.com");
        let a = snap.append_element(snap.root(), ElementData::new("div"));
        let b = snap.append_element(snap.root(), ElementData::new("div"));
        // 后追加到前面的父节点上
        let a_child = snap.append_element(a, ElementData::new("span"));

        let order: Vec<NodeId> = snap.elements().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, a_child, b]);
    }

    #[test]
    fn test_visible_text_prefers_captured_body_text() {
        let mut snap = PageSnapshot::new("u");
        snap.append_text(snap.root(), "hello");
        assert_eq!(snap.visible_text(), "hello");

        let snap = snap.with_body_text("扫码登录");
        assert_eq!(snap.visible_text(), "扫码登录");
    }

    #[test]
    fn test_from_capture() {
        let raw: RawCapture = serde_json::from_value(json!({
            "url": "https://creator.douyin.com/creator-micro/content/upload",
            "text": "发布图文",
            "nodes": [
                { "kind": "element", "parent": null, "ref": 0, "tag": "body" },
                { "kind": "element", "parent": 0, "ref": 1, "tag": "DIV",
                  "attrs": { "role": "tab" }, "width": 80.0, "height": 20.0 },
                { "kind": "text", "parent": 1, "text": "发布图文" }
            ]
        }))
        .unwrap();

        let snap = PageSnapshot::from_capture(raw).unwrap();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.element(1).unwrap().get_attr("role"), Some("tab"));
        assert_eq!(snap.node_ref(1), Some(NodeRef(1)));
        assert_eq!(snap.parent(2), Some(1));
        assert_eq!(snap.element(0).unwrap().tag, "BODY");
    }

    #[test]
    fn test_from_capture_rejects_forward_parent() {
        let raw: RawCapture = serde_json::from_value(json!({
            "url": "u",
            "nodes": [
                { "kind": "element", "parent": null, "ref": 0, "tag": "BODY" },
                { "kind": "text", "parent": 5, "text": "x" }
            ]
        }))
        .unwrap();

        assert!(PageSnapshot::from_capture(raw).is_err());
    }
}
