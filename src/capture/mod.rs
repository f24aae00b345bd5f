//! 抓取层
//!
//! - `wait` - 通用的轮询等待
//! - `controller` - 翻页控制器，逐张产出幻灯片图片

pub mod controller;
pub mod wait;

pub use controller::{CaptureSettings, CaptureSummary, PaginationController};
pub use wait::{PollingWait, Probe};
