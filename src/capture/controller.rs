//! 翻页控制器
//!
//! 状态流转：
//!
//! ```text
//! 打开页面 → 等待第一张图片 → 记录图片
//!            → { 点击下一页 → 等待图片变化 → 记录图片 }*
//!            → 结束（"下一页"被禁用，或达到最大幻灯片数）
//! ```
//!
//! 每张图片在翻到下一页之前交给下载器保存，抓取顺序即编号顺序。

use std::time::Duration;

use tracing::{info, warn};

use super::wait::{PollingWait, Probe};
use crate::browser::BrowserSession;
use crate::config::Config;
use crate::error::{CaptureError, SessionError};
use crate::fetch::ImageFetcher;
use crate::models::{ImageReference, SlideIndex};
use crate::utils::logging::truncate_text;
use crate::workspace::Workspace;

/// 抓取参数
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// 最多抓取的幻灯片数量
    pub max_slides: u32,
    /// 查找元素时的轮询参数
    pub wait: PollingWait,
    /// 等待第一张图片的最大尝试次数
    pub first_image_attempts: u32,
    pub first_image_retry_delay: Duration,
    /// 检测图片变化的最大尝试次数
    pub change_attempts: u32,
    pub change_delay: Duration,
    pub pre_click_delay: Duration,
    pub settle_delay: Duration,
    pub image_selector: String,
    /// 幻灯片图片在图片列表中的位置
    pub image_position: usize,
    pub button_selector: String,
    pub prev_button_index: usize,
    pub next_button_index: usize,
}

impl From<&Config> for CaptureSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_slides: config.max_slides,
            wait: PollingWait::new(config.wait_timeout(), config.poll_interval()),
            first_image_attempts: config.first_image_attempts,
            first_image_retry_delay: Duration::from_millis(config.first_image_retry_delay_ms),
            change_attempts: config.change_attempts,
            change_delay: Duration::from_millis(config.change_delay_ms),
            pre_click_delay: Duration::from_millis(config.pre_click_delay_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            image_selector: config.image_selector.clone(),
            image_position: config.image_position,
            button_selector: config.button_selector.clone(),
            prev_button_index: config.prev_button_index,
            next_button_index: config.next_button_index,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// 抓取统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    /// 已保存的幻灯片数量
    pub slides: u32,
    /// 图片未变化、按重复图片保存的次数
    pub duplicates: u32,
    /// 是否因达到最大幻灯片数而停止
    pub reached_ceiling: bool,
}

/// 翻页控制器
///
/// 借用浏览器会话，不负责关闭它
pub struct PaginationController<'a, S: BrowserSession> {
    session: &'a S,
    settings: CaptureSettings,
}

impl<'a, S: BrowserSession> PaginationController<'a, S> {
    pub fn new(session: &'a S, settings: CaptureSettings) -> Self {
        Self { session, settings }
    }

    /// 遍历轮播，把每张幻灯片的图片保存到工作区对应槽位
    ///
    /// 每次翻页先点击"下一页"再读取它是否被禁用，所以最后一张之后还会多点击一次。
    /// 只有一张幻灯片的轮播因此会保存 2 张图片，第 2 张按重复图片计入 `duplicates`；
    /// 调用方可用 `slides - duplicates` 得到不重复的张数。
    ///
    /// # 参数
    /// - `url`: 目标页面
    /// - `fetcher`: 图片下载器
    /// - `workspace`: 工作区
    ///
    /// # 返回
    /// 返回抓取统计
    pub async fn run<F>(
        &self,
        url: &str,
        fetcher: &F,
        workspace: &Workspace,
    ) -> Result<CaptureSummary, CaptureError>
    where
        F: ImageFetcher + ?Sized,
    {
        info!("🌐 打开页面: {}", url);
        self.session.open(url).await?;

        let mut summary = CaptureSummary::default();
        let mut index = SlideIndex::FIRST;

        let mut reference = self.await_first_image().await?;
        self.capture(index, &reference, fetcher, workspace).await?;
        summary.slides += 1;

        let mut is_last = false;
        while !is_last && index.get() < self.settings.max_slides {
            index = index.next();

            is_last = self.advance().await?;
            self.session.suspend(self.settings.settle_delay).await;

            let (next, changed) = self.await_image_change(&reference, index).await?;
            if !changed {
                summary.duplicates += 1;
            }
            reference = next;

            self.capture(index, &reference, fetcher, workspace).await?;
            summary.slides += 1;
        }

        summary.reached_ceiling = !is_last;
        if summary.reached_ceiling {
            warn!(
                "⚠️ 已达到最大幻灯片数 {}，停止翻页",
                self.settings.max_slides
            );
        } else {
            info!("✓ 已到达最后一张幻灯片 (共 {} 张)", summary.slides);
        }

        Ok(summary)
    }

    /// 等待第一张幻灯片的图片出现
    ///
    /// 每次尝试都是一次完整的轮询等待；全部尝试失败后返回 `CarouselNotFound`
    async fn await_first_image(&self) -> Result<ImageReference, CaptureError> {
        let attempts = self.settings.first_image_attempts;

        for attempt in 1..=attempts {
            info!("🔍 查找第一张图片 (尝试 {}/{})", attempt, attempts);

            if let Some(src) = self.wait_for_slide_source().await? {
                return Ok(ImageReference::new(src));
            }

            if attempt < attempts {
                warn!("未找到图片，{:?} 后重试", self.settings.first_image_retry_delay);
                self.session
                    .suspend(self.settings.first_image_retry_delay)
                    .await;
            }
        }

        Err(CaptureError::CarouselNotFound { attempts })
    }

    /// 点击"下一页"，返回"下一页"是否已被禁用（即当前是最后一张）
    async fn advance(&self) -> Result<bool, CaptureError> {
        self.session.suspend(self.settings.pre_click_delay).await;

        let prev_index = self.settings.prev_button_index;
        let next_index = self.settings.next_button_index;
        let required = prev_index.max(next_index) + 1;

        let session = self.session;
        let selector = self.settings.button_selector.as_str();
        let buttons = self
            .settings
            .wait
            .until(|| async move {
                Probe::from(
                    session
                        .find_all(selector)
                        .await
                        .map(|buttons| Some(buttons).filter(|b| b.len() >= required)),
                )
            })
            .await?;

        let Some(buttons) = buttons else {
            let found = session.find_all(selector).await.map(|b| b.len()).unwrap_or(0);
            return Err(CaptureError::ControlsNotFound {
                expected: required,
                found,
            });
        };

        self.session.click(&buttons[next_index]).await?;

        let prev_disabled = self.is_disabled(&buttons[prev_index]).await?;
        let next_disabled = self.is_disabled(&buttons[next_index]).await?;
        info!(
            "按钮状态: 上一页禁用={} 下一页禁用={}",
            prev_disabled, next_disabled
        );

        Ok(next_disabled)
    }

    /// 等待图片地址与上一张不同；多次尝试仍相同时接受重复图片
    ///
    /// # 返回
    /// 返回 (图片地址, 是否发生变化)
    async fn await_image_change(
        &self,
        previous: &ImageReference,
        index: SlideIndex,
    ) -> Result<(ImageReference, bool), CaptureError> {
        let attempts = self.settings.change_attempts;

        for attempt in 1..=attempts {
            if let Some(src) = self.wait_for_slide_source().await? {
                if src != previous.as_str() {
                    return Ok((ImageReference::new(src), true));
                }
            }

            info!(
                "[幻灯片 {}] 图片未变化，尝试 {}/{}",
                index, attempt, attempts
            );
            if attempt < attempts {
                self.session.suspend(self.settings.change_delay).await;
            }
        }

        warn!("[幻灯片 {}] ⚠️ 图片始终未变化，保存重复图片", index);
        Ok((previous.clone(), false))
    }

    /// 把图片交给下载器保存到槽位
    async fn capture<F>(
        &self,
        index: SlideIndex,
        reference: &ImageReference,
        fetcher: &F,
        workspace: &Workspace,
    ) -> Result<(), CaptureError>
    where
        F: ImageFetcher + ?Sized,
    {
        info!(
            "[幻灯片 {}] 🖼️ 图片: {}",
            index,
            truncate_text(reference.as_str(), 120)
        );

        fetcher
            .fetch(reference, &workspace.slot_path(index))
            .await
            .map_err(|source| CaptureError::Fetch { index, source })
    }

    /// 轮询等待幻灯片图片出现并带有非空 `src`
    async fn wait_for_slide_source(&self) -> Result<Option<String>, SessionError> {
        let session = self.session;
        let selector = self.settings.image_selector.as_str();
        let position = self.settings.image_position;

        self.settings
            .wait
            .until(|| async move { Probe::from(slide_source(session, selector, position).await) })
            .await
    }

    async fn is_disabled(&self, button: &S::Element) -> Result<bool, SessionError> {
        Ok(self.session.attribute(button, "disabled").await?.is_some())
    }
}

/// 读取指定位置图片的 `src`，图片不存在或 `src` 为空时返回 None
async fn slide_source<S: BrowserSession>(
    session: &S,
    selector: &str,
    position: usize,
) -> Result<Option<String>, SessionError> {
    let images = session.find_all(selector).await?;
    let Some(image) = images.get(position) else {
        return Ok(None);
    };
    let src = session.attribute(image, "src").await?;
    Ok(src.filter(|s| !s.trim().is_empty()))
}
