use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use carousel_pdf::error::{AssemblyError, CaptureError, ConfigError, FetchError, SessionError};
use carousel_pdf::utils::logging;
use carousel_pdf::{App, AppError, BrowserSession, Config, ImageFetcher, ImageReference};
use image::{DynamicImage, ImageFormat, RgbImage};

/// 模拟轮播页面：图片列表第 0 个是 logo，第 1 个是当前幻灯片
struct ScriptedCarousel {
    slides: Vec<String>,
    show_images: bool,
    current: Mutex<usize>,
    closed: Arc<Mutex<bool>>,
}

#[derive(Clone, Copy)]
enum Node {
    Image(usize),
    Button(usize),
}

#[async_trait]
impl BrowserSession for ScriptedCarousel {
    type Element = Node;

    async fn open(&self, _url: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Node>, SessionError> {
        match selector {
            "img" if self.show_images => Ok(vec![Node::Image(0), Node::Image(1)]),
            "img" => Err(SessionError::transient("no such element")),
            "button" => Ok(vec![Node::Button(0), Node::Button(1)]),
            _ => Ok(Vec::new()),
        }
    }

    async fn attribute(&self, element: &Node, name: &str) -> Result<Option<String>, SessionError> {
        let current = *self.current.lock().unwrap();
        let last = self.slides.len() - 1;
        Ok(match (*element, name) {
            (Node::Image(0), "src") => Some("/logo.png".to_string()),
            (Node::Image(_), "src") => Some(self.slides[current].clone()),
            (Node::Button(0), "disabled") => (current == 0).then(String::new),
            (Node::Button(_), "disabled") => (current == last).then(String::new),
            _ => None,
        })
    }

    async fn click(&self, element: &Node) -> Result<(), SessionError> {
        if let Node::Button(1) = element {
            let mut current = self.current.lock().unwrap();
            if *current + 1 < self.slides.len() {
                *current += 1;
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// 从内存中"下载"图片，同时记录槽位路径
struct MemoryFetcher {
    images: HashMap<String, Vec<u8>>,
    slots: Arc<Mutex<Vec<PathBuf>>>,
    /// 遇到该地址时返回下载错误
    broken: Option<String>,
}

#[async_trait]
impl ImageFetcher for MemoryFetcher {
    async fn fetch(&self, reference: &ImageReference, slot: &Path) -> Result<(), FetchError> {
        self.slots.lock().unwrap().push(slot.to_path_buf());
        if self.broken.as_deref() == Some(reference.as_str()) {
            return Err(FetchError::BadStatus {
                url: reference.to_string(),
                status: 404,
            });
        }
        let Some(bytes) = self.images.get(reference.as_str()) else {
            // 模拟什么都没保存下来的下载器
            return Ok(());
        };
        std::fs::write(slot, bytes).map_err(|source| FetchError::Write {
            path: slot.display().to_string(),
            source,
        })
    }
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .unwrap();
    buffer
}

fn test_config(output_dir: &Path) -> Config {
    Config {
        wait_timeout_ms: 200,
        poll_interval_ms: 10,
        first_image_attempts: 2,
        first_image_retry_delay_ms: 10,
        change_delay_ms: 5,
        pre_click_delay_ms: 5,
        settle_delay_ms: 5,
        output_dir: output_dir.to_path_buf(),
        ..Config::default()
    }
}

struct Harness {
    carousel: ScriptedCarousel,
    fetcher: MemoryFetcher,
    closed: Arc<Mutex<bool>>,
    slots: Arc<Mutex<Vec<PathBuf>>>,
}

fn harness(slides: &[(&str, Option<(u32, u32)>)], show_images: bool) -> Harness {
    let closed = Arc::new(Mutex::new(false));
    let slots = Arc::new(Mutex::new(Vec::new()));
    let images = slides
        .iter()
        .filter_map(|(src, size)| size.map(|(w, h)| (src.to_string(), jpeg(w, h))))
        .collect();

    Harness {
        carousel: ScriptedCarousel {
            slides: slides.iter().map(|(src, _)| src.to_string()).collect(),
            show_images,
            current: Mutex::new(0),
            closed: closed.clone(),
        },
        fetcher: MemoryFetcher {
            images,
            slots: slots.clone(),
            broken: None,
        },
        closed,
        slots,
    }
}

#[tokio::test]
async fn test_carousel_to_pdf_pipeline() {
    logging::init(false);
    let output_dir = tempfile::tempdir().unwrap();
    let h = harness(
        &[
            ("/s/1.jpg", Some((100, 200))),
            ("/s/2.jpg", Some((50, 50))),
            ("/s/3.jpg", Some((320, 240))),
        ],
        true,
    );

    let outcome = App::with_session(
        test_config(output_dir.path()),
        "https://example.com/deck/my-pitch",
        h.carousel,
        Box::new(h.fetcher),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(outcome.summary.slides, 3);
    assert_eq!(outcome.summary.duplicates, 0);
    assert!(!outcome.summary.reached_ceiling);

    let output = outcome.output.expect("应该生成文档");
    assert_eq!(output, output_dir.path().join("my-pitch.pdf"));
    assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));

    // 浏览器已关闭，工作区已删除
    assert!(*h.closed.lock().unwrap());
    let slots = h.slots.lock().unwrap();
    let names: Vec<_> = slots
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["1.jpg", "2.jpg", "3.jpg"]);
    assert!(!slots[0].parent().unwrap().exists());
}

#[tokio::test]
async fn test_nothing_saved_means_no_document_and_no_error() {
    let output_dir = tempfile::tempdir().unwrap();
    let h = harness(&[("/s/1.jpg", None), ("/s/2.jpg", None)], true);

    let outcome = App::with_session(
        test_config(output_dir.path()),
        "https://example.com/deck/my-pitch",
        h.carousel,
        Box::new(h.fetcher),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(outcome.summary.slides, 2);
    assert!(outcome.output.is_none());
    assert!(!output_dir.path().join("my-pitch.pdf").exists());
    assert!(*h.closed.lock().unwrap());
}

#[tokio::test]
async fn test_missing_carousel_fails_and_releases_browser() {
    let output_dir = tempfile::tempdir().unwrap();
    let h = harness(&[("/s/1.jpg", Some((10, 10)))], false);

    let result = App::with_session(
        test_config(output_dir.path()),
        "https://example.com/deck/my-pitch",
        h.carousel,
        Box::new(h.fetcher),
    )
    .run()
    .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("未找到轮播图片"));
    assert!(*h.closed.lock().unwrap());
    assert!(h.slots.lock().unwrap().is_empty());
    assert!(!output_dir.path().join("my-pitch.pdf").exists());
}

#[tokio::test]
async fn test_fetch_failure_releases_browser_and_workspace() {
    let output_dir = tempfile::tempdir().unwrap();
    let mut h = harness(
        &[
            ("/s/1.jpg", Some((40, 30))),
            ("/s/2.jpg", Some((40, 30))),
            ("/s/3.jpg", Some((40, 30))),
        ],
        true,
    );
    h.fetcher.broken = Some("/s/2.jpg".to_string());

    let result = App::with_session(
        test_config(output_dir.path()),
        "https://example.com/deck/my-pitch",
        h.carousel,
        Box::new(h.fetcher),
    )
    .run()
    .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        AppError::Capture(CaptureError::Fetch {
            source: FetchError::BadStatus { status: 404, .. },
            ..
        })
    ));
    assert!(*h.closed.lock().unwrap());

    // 第 1 张已写入工作区，失败后工作区仍被删除
    let slots = h.slots.lock().unwrap();
    assert_eq!(slots.len(), 2);
    let workspace_dir = slots[0].parent().unwrap();
    assert!(!workspace_dir.exists());
    assert!(!output_dir.path().join("my-pitch.pdf").exists());
}

#[tokio::test]
async fn test_initialize_rejects_invalid_config_before_launching_browser() {
    let config = Config {
        max_slides: 0,
        ..Config::default()
    };

    let result = App::initialize(config, "https://example.com/deck/my-pitch").await;

    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::Invalid { .. }))
    ));
}

#[tokio::test]
async fn test_initialize_rejects_unparseable_url() {
    let result = App::initialize(Config::default(), "not a url").await;

    assert!(matches!(
        result,
        Err(AppError::Assembly(AssemblyError::InvalidUrl { .. }))
    ));
}

#[tokio::test]
#[ignore] // 需要本机安装 Chrome/Chromium，手动运行：cargo test -- --ignored
async fn test_launch_headless_browser() {
    logging::init(true);

    let config = Config::default();
    let mut session = carousel_pdf::browser::launch_headless_browser(&config)
        .await
        .expect("启动浏览器失败");

    session
        .open("https://example.com/")
        .await
        .expect("打开页面失败");
    let links = session.find_all("a").await.expect("查找元素失败");
    assert!(!links.is_empty());

    session.close().await.expect("关闭浏览器失败");
}
