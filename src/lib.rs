//! # Carousel PDF
//!
//! 把网页中 JavaScript 渲染的图片轮播逐张翻完，按顺序把全部图片合成一个 PDF
//!
//! ## 架构设计
//!
//! ### ① 基础设施层
//! - `browser/` - `BrowserSession` 抽象及基于 chromiumoxide 的实现
//! - `fetch/` - `ImageFetcher` 抽象及 HTTP 下载实现
//! - `workspace` - 临时工作区，每张幻灯片一个槽位
//!
//! ### ② 抓取层
//! - `capture/wait` - 轮询等待（就绪 / 未就绪 / 致命）
//! - `capture/controller` - 翻页状态机，逐张产出图片地址
//!
//! ### ③ 文档层
//! - `document/assembler` - 按编号数值排序，每张图片一页
//!
//! ### ④ 编排层
//! - `orchestrator/app` - 一次运行，持有浏览器和工作区，保证两者都被释放
//!
//! ## 顺序保证
//!
//! 抓取顺序 = 幻灯片编号顺序 = 文档页序，整个流程是严格串行的

pub mod browser;
pub mod capture;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod models;
pub mod orchestrator;
pub mod utils;
pub mod workspace;

// 重新导出常用类型
pub use browser::{BrowserSession, ChromeSession};
pub use capture::{CaptureSettings, CaptureSummary, PaginationController, PollingWait};
pub use config::Config;
pub use document::DocumentAssembler;
pub use error::{AppError, AppResult};
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use models::{ImageReference, SlideIndex};
pub use orchestrator::{App, RunOutcome};
pub use workspace::Workspace;
