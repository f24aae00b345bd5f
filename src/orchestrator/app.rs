//! 应用主流程 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：计算输出路径、启动或连接浏览器
//! 2. **抓取**：创建工作区，交给 `PaginationController` 逐张保存图片
//! 3. **组装**：交给 `DocumentAssembler` 生成文档
//! 4. **资源管理**：无论成功与否，都关闭浏览器会话并删除工作区
//! 5. **统计输出**

use std::path::PathBuf;

use tracing::{info, warn};

use crate::browser::{self, BrowserSession, ChromeSession};
use crate::capture::{CaptureSettings, CaptureSummary, PaginationController};
use crate::config::Config;
use crate::document::DocumentAssembler;
use crate::error::{AppError, AppResult};
use crate::fetch::{HttpImageFetcher, ImageFetcher};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::workspace::Workspace;

/// 一次运行的结果
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: CaptureSummary,
    /// 生成的文档；为 None 表示没有生成（工作区为空或图片无法读取）
    pub output: Option<PathBuf>,
}

/// 应用主结构
pub struct App<S: BrowserSession> {
    config: Config,
    url: String,
    session: S,
    fetcher: Box<dyn ImageFetcher>,
    assembler: DocumentAssembler,
}

impl App<ChromeSession> {
    /// 初始化应用：校验配置和 URL、打开浏览器
    ///
    /// 浏览器最后打开，前面任一步失败都不会留下浏览器进程
    pub async fn initialize(config: Config, url: impl Into<String>) -> AppResult<Self> {
        config.validate()?;

        let url = url.into();
        let assembler = DocumentAssembler::from_config(&config);
        let output = assembler.output_path(&url)?;

        log_startup(&url, &output, config.max_slides);

        let fetcher = HttpImageFetcher::new(Some(&url))?;
        let session = browser::open_session(&config).await?;

        Ok(Self::with_session(config, url, session, Box::new(fetcher)))
    }
}

impl<S: BrowserSession> App<S> {
    /// 使用已有的浏览器会话和下载器创建应用
    pub fn with_session(
        config: Config,
        url: impl Into<String>,
        session: S,
        fetcher: Box<dyn ImageFetcher>,
    ) -> Self {
        let assembler = DocumentAssembler::from_config(&config);
        Self {
            config,
            url: url.into(),
            session,
            fetcher,
            assembler,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> AppResult<RunOutcome> {
        let workspace = match Workspace::create() {
            Ok(workspace) => workspace,
            Err(e) => {
                if let Err(close_err) = self.session.close().await {
                    warn!("关闭浏览器失败: {}", close_err);
                }
                return Err(AppError::Workspace(e));
            }
        };
        info!("📁 工作区: {}", workspace.path().display());

        let captured = self.capture(&workspace).await;

        // 抓取结束（无论成功与否）即关闭浏览器
        let closed = self.session.close().await;

        let outcome: AppResult<RunOutcome> = match captured {
            Ok(summary) => self
                .assembler
                .assemble(workspace.path(), &self.url)
                .await
                .map(|output| RunOutcome { summary, output })
                .map_err(Into::into),
            Err(e) => Err(e),
        };

        if let Err(e) = workspace.remove() {
            warn!("删除工作区失败: {}", e);
        }
        if let Err(e) = closed {
            warn!("关闭浏览器失败: {}", e);
        }

        let outcome = outcome?;
        print_final_stats(&outcome.summary, outcome.output.as_deref());

        Ok(outcome)
    }

    /// 遍历轮播，图片保存到工作区
    async fn capture(&self, workspace: &Workspace) -> AppResult<CaptureSummary> {
        let settings = CaptureSettings::from(&self.config);
        let controller = PaginationController::new(&self.session, settings);
        let summary = controller
            .run(&self.url, self.fetcher.as_ref(), workspace)
            .await?;
        Ok(summary)
    }
}
