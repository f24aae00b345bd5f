//! 浏览器层
//!
//! - `BrowserSession` - 抓取流程唯一依赖的浏览器能力（打开、查找、读属性、点击、等待、关闭）
//! - `ChromeSession` - 基于 chromiumoxide 的实现
//! - `headless` / `connection` - 启动无头浏览器或连接已有浏览器

pub mod connection;
pub mod headless;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::SessionError;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;
pub use session::ChromeSession;

/// 浏览器会话
///
/// 所有操作都可能暂时失败，调用方通过 `SessionError::is_transient` 判断是否值得重试
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 元素句柄
    type Element: Send + Sync;

    /// 打开目标页面，失败视为致命错误
    async fn open(&self, url: &str) -> Result<(), SessionError>;

    /// 查找所有匹配选择器的元素（按文档顺序）
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, SessionError>;

    /// 读取元素属性，属性不存在时返回 None
    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, SessionError>;

    async fn click(&self, element: &Self::Element) -> Result<(), SessionError>;

    async fn suspend(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// 关闭会话，释放浏览器资源
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// 根据配置获取浏览器会话：设置了调试端口则连接已有浏览器，否则启动无头浏览器
pub async fn open_session(config: &Config) -> Result<ChromeSession, SessionError> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser(port).await,
        None => launch_headless_browser(config).await,
    }
}
