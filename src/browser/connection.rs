use chromiumoxide::Browser;
use tracing::{debug, error, info};

use super::ChromeSession;
use crate::error::SessionError;

/// 连接到已启动的浏览器（需以 `--remote-debugging-port` 启动）并创建新页面
pub async fn connect_to_browser(port: u16) -> Result<ChromeSession, SessionError> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        SessionError::fatal(format!("无法连接到浏览器 (端口: {}): {}", port, e))
    })?;
    debug!("浏览器连接成功");

    // 外部浏览器只借用，关闭会话时保留
    ChromeSession::attach(browser, handler, false).await
}
