//! 文档组装
//!
//! 读取工作区，按幻灯片编号排序，每张图片生成一页（页面尺寸 = 图片像素尺寸），写出 PDF

use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use oxidize_pdf::{Document, Image, Page};
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AssemblyError;
use crate::models::SlideIndex;
use crate::workspace::{load_artifacts, Artifacts};

/// 单页排版信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub index: SlideIndex,
    /// 图片宽度（像素），即页面宽度
    pub width: u32,
    /// 图片高度（像素），即页面高度
    pub height: u32,
    pub format: ImageFormat,
}

/// 文档组装器
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    output_dir: PathBuf,
    extension: String,
}

impl DocumentAssembler {
    pub fn new(output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.output_dir, &config.output_extension)
    }

    /// 根据页面 URL 计算输出文件路径
    pub fn output_path(&self, page_url: &str) -> Result<PathBuf, AssemblyError> {
        Ok(self
            .output_dir
            .join(output_file_name(page_url, &self.extension)?))
    }

    /// 组装文档
    ///
    /// # 参数
    /// - `workspace_dir`: 工作区目录
    /// - `page_url`: 原始页面 URL（决定输出文件名）
    ///
    /// # 返回
    /// 返回生成的文件路径；工作区为空、不存在或有槽位无法读取时返回 `Ok(None)`，不生成任何文件
    pub async fn assemble(
        &self,
        workspace_dir: &Path,
        page_url: &str,
    ) -> Result<Option<PathBuf>, AssemblyError> {
        let output = self.output_path(page_url)?;

        let artifacts = load_artifacts(workspace_dir)
            .await
            .map_err(|source| AssemblyError::Io {
                path: workspace_dir.display().to_string(),
                source,
            })?;
        let Some(artifacts) = artifacts.filter(|a| !a.is_empty()) else {
            warn!("⚠️ 工作区没有可用的图片，跳过生成文档");
            return Ok(None);
        };

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| AssemblyError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
        }

        let pages = plan_pages(&artifacts)?;
        info!("📄 正在生成文档，共 {} 页", pages.len());

        let mut document = build_document(&artifacts, &pages)?;
        if let Some(title) = output.file_stem().and_then(|s| s.to_str()) {
            document.set_title(title);
        }

        document.save(&output)?;
        info!("💾 文档已保存: {}", output.display());

        Ok(Some(output))
    }
}

/// 计算每一页的尺寸，顺序与编号顺序一致
pub fn plan_pages(artifacts: &Artifacts) -> Result<Vec<PagePlan>, AssemblyError> {
    artifacts
        .iter()
        .map(|(index, bytes)| {
            let decode = |source: image::ImageError| AssemblyError::Decode { index, source };

            let reader = ImageReader::new(Cursor::new(bytes))
                .with_guessed_format()
                .map_err(|e| decode(e.into()))?;
            let format = reader
                .format()
                .ok_or_else(|| decode(unsupported_format()))?;
            let (width, height) = reader.into_dimensions().map_err(decode)?;

            debug!(
                "[幻灯片 {}] {:?} {}x{}",
                index, format, width, height
            );
            Ok(PagePlan {
                index,
                width,
                height,
                format,
            })
        })
        .collect()
}

/// 生成 PDF 文档：每页尺寸等于图片尺寸，图片铺满整页
pub fn build_document(artifacts: &Artifacts, pages: &[PagePlan]) -> Result<Document, AssemblyError> {
    let mut document = Document::new();

    for (plan, (_, bytes)) in pages.iter().zip(artifacts.iter()) {
        let width = f64::from(plan.width);
        let height = f64::from(plan.height);

        let jpeg = jpeg_payload(plan, bytes)?;
        let image = Image::from_jpeg_data(jpeg.into_owned())?;

        let name = format!("slide{}", plan.index);
        let mut page = Page::new(width, height);
        page.add_image(name.as_str(), image);
        page.draw_image(&name, 0.0, 0.0, width, height)?;
        document.add_page(page);
    }

    Ok(document)
}

/// PDF 中嵌入 JPEG：JPEG 原样使用，其他格式转换为 JPEG
pub fn jpeg_payload<'a>(plan: &PagePlan, bytes: &'a [u8]) -> Result<Cow<'a, [u8]>, AssemblyError> {
    if plan.format == ImageFormat::Jpeg {
        return Ok(Cow::Borrowed(bytes));
    }

    debug!("[幻灯片 {}] {:?} 转换为 JPEG", plan.index, plan.format);
    let decoded = image::load_from_memory_with_format(bytes, plan.format).map_err(|source| {
        AssemblyError::Decode {
            index: plan.index,
            source,
        }
    })?;

    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgb8(decoded.to_rgb8())
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .map_err(|source| AssemblyError::Encode {
            index: plan.index,
            source,
        })?;

    Ok(Cow::Owned(buffer))
}

/// 输出文件名：URL 路径中最后一个非空片段 + 扩展名；没有路径时使用主机名
pub fn output_file_name(page_url: &str, extension: &str) -> Result<String, AssemblyError> {
    let url = Url::parse(page_url).map_err(|e| AssemblyError::InvalidUrl {
        url: page_url.to_string(),
        reason: e.to_string(),
    })?;

    let stem = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .or_else(|| url.host_str())
        .ok_or_else(|| AssemblyError::InvalidUrl {
            url: page_url.to_string(),
            reason: "无法从 URL 得到文件名".to_string(),
        })?;

    Ok(format!("{}.{}", stem, extension.trim_start_matches('.')))
}

fn unsupported_format() -> image::ImageError {
    image::ImageError::Unsupported(image::error::UnsupportedError::from_format_and_kind(
        image::error::ImageFormatHint::Unknown,
        image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
    ))
}
