//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (一次运行：浏览器 + 工作区的生命周期)
//!     ↓
//! capture::PaginationController (逐张抓取)  →  fetch::ImageFetcher (保存到槽位)
//!     ↓
//! document::DocumentAssembler (按编号组装文档)
//! ```
//!
//! 只有编排层持有浏览器会话和工作区

pub mod app;

pub use app::{App, RunOutcome};
