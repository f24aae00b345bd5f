use chromiumoxide::{Browser, BrowserConfig};
use tracing::{debug, error, info};

use super::ChromeSession;
use crate::config::Config;
use crate::error::SessionError;

/// 启动无头浏览器并创建空白页面
pub async fn launch_headless_browser(config: &Config) -> Result<ChromeSession, SessionError> {
    info!("🚀 启动浏览器 (无头模式: {})...", config.headless);

    let mut builder = BrowserConfig::builder();
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &config.chrome_executable {
        debug!("浏览器路径: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let browser_config = builder
        .args(vec![
            "--disable-gpu",             // 无头模式下禁用 GPU
            "--no-sandbox",              // 容器环境中沙盒常常不可用
            "--disable-dev-shm-usage",   // 防止共享内存不足
            "--remote-debugging-port=0", // 让浏览器自动选择端口
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            SessionError::fatal(format!("配置浏览器失败: {}", e))
        })?;

    let (browser, handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        SessionError::fatal(format!("启动浏览器失败: {}", e))
    })?;
    debug!("浏览器启动成功");

    let session = ChromeSession::attach(browser, handler, true).await?;
    info!("✅ 浏览器已就绪");
    Ok(session)
}
