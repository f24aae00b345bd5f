use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::BrowserSession;
use crate::error::SessionError;

/// 基于 chromiumoxide 的浏览器会话
///
/// 持有 Browser、Page 以及后台事件处理任务
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// 浏览器是否由本程序启动（连接已有浏览器时只关闭页面）
    owns_browser: bool,
}

impl ChromeSession {
    /// 接管已启动或已连接的浏览器：后台驱动 CDP 事件，并打开一个空白页面
    ///
    /// # 参数
    /// - `browser` / `events`: `Browser::launch` 或 `Browser::connect` 的返回值
    /// - `owns_browser`: 关闭会话时是否一并关闭浏览器
    pub(crate) async fn attach(
        browser: Browser,
        mut events: Handler,
        owns_browser: bool,
    ) -> Result<Self, SessionError> {
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        // 事件循环启动后浏览器需要片刻才能接受新建页面
        tokio::time::sleep(Duration::from_millis(300)).await;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                error!("创建页面失败: {}", e);
                handler.abort();
                return Err(SessionError::fatal(format!("创建页面失败: {}", e)));
            }
        };
        debug!("已创建空白页面");

        Ok(Self {
            browser,
            page,
            handler,
            owns_browser,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn open(&self, url: &str) -> Result<(), SessionError> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::fatal(format!("导航到 {} 失败: {}", url, e)))?;
        info!("已导航到: {}", url);
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SessionError> {
        Ok(self.page.find_elements(selector).await?)
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>, SessionError> {
        Ok(element.attribute(name).await?)
    }

    async fn click(&self, element: &Element) -> Result<(), SessionError> {
        element.click().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        let result = if self.owns_browser {
            debug!("关闭浏览器");
            match self.browser.close().await {
                Ok(_) => {
                    let _ = self.browser.wait().await;
                    Ok(())
                }
                Err(e) => Err(SessionError::fatal(format!("关闭浏览器失败: {}", e))),
            }
        } else {
            debug!("关闭页面（保留外部浏览器）");
            self.page
                .clone()
                .close()
                .await
                .map_err(|e| SessionError::fatal(format!("关闭页面失败: {}", e)))
        };

        self.handler.abort();
        if let Err(e) = &result {
            warn!("{}", e);
        }
        result
    }
}
