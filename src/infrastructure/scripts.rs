//! 注入页面的 JS 片段
//!
//! 元素操作脚本统一返回 `{ ok: true }` 或 `{ ok: false, error }`，
//! 元素句柄从抓取脚本写入的 `window.__autoPublishRefs` 中取。

use serde::Serialize;
use serde_json::json;

use crate::dom::NodeRef;
use crate::models::{MaterializedFile, Progress, StatusEvent};

/// 反检测脚本，需在页面脚本之前执行
pub const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['zh-CN', 'zh', 'en'] });
"#;

/// 抓取 `document.body`，返回扁平节点表并刷新元素登记表
pub const CAPTURE_SCRIPT: &str = r#"
(() => {
    const SKIP = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']);
    const ATTRS = ['type', 'accept', 'placeholder', 'class', 'role', 'contenteditable'];
    const refs = [];
    const nodes = [];
    const visit = (node, parent) => {
        if (node.nodeType === Node.TEXT_NODE) {
            if (node.textContent.trim()) {
                nodes.push({ kind: 'text', parent, text: node.textContent });
            }
            return;
        }
        if (node.nodeType !== Node.ELEMENT_NODE || SKIP.has(node.tagName)) return;
        if (node.id === 'auto-publish-helper') return;
        const id = nodes.length;
        const attrs = {};
        for (const name of ATTRS) {
            const value = node.getAttribute(name);
            if (value !== null) attrs[name] = value;
        }
        nodes.push({
            kind: 'element',
            parent,
            ref: refs.length,
            tag: node.tagName,
            attrs,
            width: node.offsetWidth || 0,
            height: node.offsetHeight || 0,
        });
        refs.push(node);
        for (const child of node.childNodes) visit(child, id);
    };
    if (document.body) {
        visit(document.body, null);
    } else {
        refs.push(null);
        nodes.push({ kind: 'element', parent: null, ref: 0, tag: 'BODY' });
    }
    window.__autoPublishRefs = refs;
    const helper = document.getElementById('auto-publish-helper');
    const text = document.body ? document.body.innerText || '' : '';
    return {
        url: window.location.href,
        text: helper ? text.replace(helper.innerText || '', '') : text,
        nodes,
    };
})()
"#;

/// 页面侧的文件描述，data 为 base64
#[derive(Serialize)]
struct FileSpec<'a> {
    name: &'a str,
    mime: &'a str,
    data: String,
}

fn file_specs(files: &[MaterializedFile]) -> String {
    use base64::Engine as _;
    let specs: Vec<FileSpec<'_>> = files
        .iter()
        .map(|f| FileSpec {
            name: &f.name,
            mime: &f.mime_type,
            data: base64::engine::general_purpose::STANDARD.encode(&f.bytes),
        })
        .collect();
    serde_json::to_string(&specs).unwrap_or_else(|_| "[]".to_string())
}

/// 包一层：取元素、捕获异常、统一返回格式
fn with_element(target: NodeRef, body: &str) -> String {
    format!(
        r#"
        (() => {{
            const el = (window.__autoPublishRefs || [])[{node_ref}];
            if (!el || !el.isConnected) {{
                return {{ ok: false, error: 'stale' }};
            }}
            try {{
                {body}
                return {{ ok: true }};
            }} catch (e) {{
                return {{ ok: false, error: String(e && e.message || e) }};
            }}
        }})()
        "#,
        node_ref = target.0,
        body = body
    )
}

/// 分片 atob 后拼成 File，放进 DataTransfer
const DATA_TRANSFER_PRELUDE: &str = r#"
const toFile = (spec) => {
    const chars = atob(spec.data);
    const chunks = [];
    for (let offset = 0; offset < chars.length; offset += 512) {
        const slice = chars.slice(offset, offset + 512);
        const bytes = new Uint8Array(slice.length);
        for (let i = 0; i < slice.length; i++) bytes[i] = slice.charCodeAt(i);
        chunks.push(bytes);
    }
    return new File(chunks, spec.name, { type: spec.mime });
};
const dataTransfer = new DataTransfer();
specs.forEach(spec => dataTransfer.items.add(toFile(spec)));
"#;

pub fn click(target: NodeRef) -> String {
    with_element(target, "el.click();")
}

pub fn set_native_value(target: NodeRef, value: &str) -> String {
    let body = format!(
        r#"
        const value = {value};
        const proto = el instanceof HTMLTextAreaElement
            ? HTMLTextAreaElement.prototype
            : HTMLInputElement.prototype;
        const descriptor = Object.getOwnPropertyDescriptor(proto, 'value');
        el.focus();
        if (descriptor && descriptor.set) {{
            descriptor.set.call(el, value);
        }} else {{
            el.value = value;
        }}
        el.dispatchEvent(new Event('input', {{ bubbles: true }}));
        "#,
        value = json!(value)
    );
    with_element(target, &body)
}

pub fn set_editable_text(target: NodeRef, text: &str) -> String {
    let body = format!(
        r#"
        el.click();
        el.focus();
        el.innerText = {text};
        el.dispatchEvent(new Event('input', {{ bubbles: true }}));
        "#,
        text = json!(text)
    );
    with_element(target, &body)
}

pub fn assign_files(target: NodeRef, files: &[MaterializedFile]) -> String {
    let body = format!(
        r#"
        const specs = {specs};
        {prelude}
        el.files = dataTransfer.files;
        el.dispatchEvent(new Event('change', {{ bubbles: true }}));
        el.dispatchEvent(new Event('input', {{ bubbles: true }}));
        "#,
        specs = file_specs(files),
        prelude = DATA_TRANSFER_PRELUDE
    );
    with_element(target, &body)
}

pub fn drop_files(target: NodeRef, files: &[MaterializedFile]) -> String {
    let body = format!(
        r#"
        const specs = {specs};
        {prelude}
        ['dragenter', 'dragover', 'drop'].forEach(type => {{
            el.dispatchEvent(new DragEvent(type, {{
                bubbles: true,
                cancelable: true,
                dataTransfer,
            }}));
        }});
        "#,
        specs = file_specs(files),
        prelude = DATA_TRANSFER_PRELUDE
    );
    with_element(target, &body)
}

/// 创建或更新悬浮状态面板
pub fn render_overlay(event: &StatusEvent) -> String {
    let progress = match event.progress {
        Progress::Percent(p) => i32::from(p),
        Progress::Indeterminate => -1,
    };
    format!(
        r#"
        (() => {{
            if (!document.body) return false;
            let helper = document.getElementById('auto-publish-helper');
            if (!helper) {{
                helper = document.createElement('div');
                helper.id = 'auto-publish-helper';
                Object.assign(helper.style, {{
                    position: 'fixed', top: '10px', left: '50%',
                    transform: 'translateX(-50%)', background: 'rgba(0,0,0,0.85)',
                    color: 'white', padding: '12px 20px', borderRadius: '8px',
                    zIndex: '999999', boxShadow: '0 4px 12px rgba(0,0,0,0.3)',
                    fontFamily: 'sans-serif', minWidth: '300px',
                }});
                helper.innerHTML = `
                    <div style="font-weight:bold; margin-bottom:8px; border-bottom:1px solid #555; padding-bottom:4px;">自动发布助手</div>
                    <div data-role="msg" style="font-size:12px; margin-bottom:8px; line-height:1.4;"></div>
                    <div data-role="bar" style="height:4px; background:#333; width:100%; border-radius:2px; margin-bottom:8px; display:none;">
                        <div data-role="val" style="height:100%; background:#fe2c55; width:0%; border-radius:2px; transition:width 0.3s;"></div>
                    </div>`;
                document.body.appendChild(helper);
            }}
            const msg = helper.querySelector('[data-role="msg"]');
            msg.innerText = {message};
            msg.style.color = {color};
            const bar = helper.querySelector('[data-role="bar"]');
            const val = helper.querySelector('[data-role="val"]');
            const progress = {progress};
            if (progress >= 0) {{
                bar.style.display = 'block';
                val.style.width = progress + '%';
            }} else {{
                bar.style.display = 'none';
            }}
            return true;
        }})()
        "#,
        message = json!(event.message),
        color = json!(event.severity.color()),
        progress = progress
    )
}
