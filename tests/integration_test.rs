use auto_publisher::config::{Config, FlowTimings};
use auto_publisher::dom::{ElementData, FixturePage, PageAction, PageSnapshot};
use auto_publisher::models::{MaterializedFile, PublishPayload, Severity};
use auto_publisher::services::RecordingReporter;
use auto_publisher::{connect_to_browser_and_page, logger, Phase, PublishFlow};

const UPLOAD_URL: &str = "https://creator.douyin.com/creator-micro/content/upload";

/// 已登录的发布页：标签、隐藏的图片 input、标题框、正文编辑器都在
fn publish_page() -> PageSnapshot {
    let mut snap = PageSnapshot::new(UPLOAD_URL);
    let root = snap.root();

    let tabs = snap.append_element(root, ElementData::new("div").attr("class", "tabs"));
    let tab = snap.append_element(tabs, ElementData::new("div").attr("class", "tab-item"));
    snap.append_text(tab, "发布图文");

    let zone = snap.append_element(root, ElementData::new("div").attr("class", "upload-btn"));
    snap.append_text(zone, "点击上传");
    snap.append_element(
        zone,
        ElementData::new("input")
            .attr("type", "file")
            .attr("accept", "image/*")
            .attr("style", "display:none"),
    );

    snap.append_element(
        root,
        ElementData::new("input")
            .attr("placeholder", "填写标题，可能会有更多赞哦")
            .size(400.0, 32.0),
    );
    snap.append_element(
        root,
        ElementData::new("div")
            .attr("contenteditable", "true")
            .size(600.0, 300.0),
    );
    snap
}

fn payload(files: usize) -> PublishPayload {
    PublishPayload {
        title: "A".to_string(),
        description: "B".to_string(),
        files: (0..files)
            .map(|i| MaterializedFile::new(format!("image_{}.jpg", i), "image/jpeg", vec![0xFF, 0xD8, 0xFF]))
            .collect(),
    }
}

fn element_ref(snap: &PageSnapshot, pred: impl Fn(&ElementData) -> bool) -> auto_publisher::dom::NodeRef {
    snap.elements()
        .find(|(_, el)| pred(el))
        .map(|(_, el)| el.node_ref)
        .expect("元素不存在")
}

#[tokio::test]
async fn test_publish_end_to_end() {
    let snap = publish_page();
    let title_ref = element_ref(&snap, |el| el.get_attr("placeholder").is_some());
    let editor_ref = element_ref(&snap, |el| el.is_content_editable());

    let mut flow = PublishFlow::new(FixturePage::new(snap), RecordingReporter::new(), payload(1))
        .with_timings(FlowTimings::immediate());

    let mut ticks = 0;
    while !flow.phase().is_terminal() && ticks < 10 {
        flow.tick().await;
        ticks += 1;
    }

    assert_eq!(flow.phase(), Phase::Done);
    assert!(ticks <= 5, "用了 {} 轮", ticks);
    assert_eq!(flow.page().value_of(title_ref).as_deref(), Some("A"));
    assert_eq!(flow.page().text_of(editor_ref).as_deref(), Some("B"));
    assert!(flow
        .page()
        .actions()
        .iter()
        .any(|a| matches!(a, PageAction::AssignFiles(_, names) if names == &vec!["image_0.jpg".to_string()])));
    assert!(flow.reporter().contains(Severity::Success, "填充完成"));
}

#[tokio::test]
async fn test_zero_files_skip_upload() {
    let mut flow = PublishFlow::new(FixturePage::new(publish_page()), RecordingReporter::new(), payload(0))
        .with_timings(FlowTimings::immediate());

    let outcome = flow.run().await;

    assert!(outcome.is_success());
    assert!(outcome.manual_followups.is_empty());
    assert!(!flow.page().actions().iter().any(PageAction::is_file_delivery));
    assert!(flow.reporter().contains(Severity::Warning, "无文件可上传"));
}

#[tokio::test]
async fn test_rejected_file_input_falls_back_to_drop() {
    let page = FixturePage::new(publish_page());
    page.fail_file_assignment(true);

    let mut flow = PublishFlow::new(page, RecordingReporter::new(), payload(2))
        .with_timings(FlowTimings::immediate());
    let outcome = flow.run().await;

    assert!(outcome.is_success());
    let drops: Vec<_> = flow
        .page()
        .actions()
        .into_iter()
        .filter(|a| matches!(a, PageAction::DropFiles(..)))
        .collect();
    assert_eq!(drops.len(), 1);
    assert!(flow.reporter().contains(Severity::Success, "已触发上传事件"));
}

#[tokio::test]
#[ignore] // 需要本地 Chrome 以 --remote-debugging-port 启动：cargo test -- --ignored
async fn test_browser_connection() {
    let config = Config::from_env();
    logger::init(config.verbose_logging);

    let result = connect_to_browser_and_page(
        config.browser_debug_port,
        &config.upload_url,
        &config.locators.upload_route,
        config.apply_stealth,
    )
    .await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}
