use std::fmt::Display;

use thiserror::Error;

use crate::models::SlideIndex;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] SessionError),
    /// 轮播抓取错误
    #[error("抓取错误: {0}")]
    Capture(#[from] CaptureError),
    /// 图片下载错误
    #[error("下载错误: {0}")]
    Fetch(#[from] FetchError),
    /// 文档生成错误
    #[error("文档错误: {0}")]
    Assembly(#[from] AssemblyError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 工作区创建失败
    #[error("工作区错误: {0}")]
    Workspace(#[source] std::io::Error),
}

/// 浏览器会话错误
///
/// 区分"还没渲染出来"（可重试）和"会话已经不可用"（致命）
#[derive(Debug, Error)]
pub enum SessionError {
    /// 暂时性失败：元素未找到、超时等，轮询时视为"尚未就绪"
    #[error("浏览器操作暂时失败: {message}")]
    Transient { message: String },
    /// 致命失败：连接断开、页面无法打开等
    #[error("浏览器会话不可用: {message}")]
    Fatal { message: String },
}

impl SessionError {
    pub fn transient(message: impl Display) -> Self {
        SessionError::Transient {
            message: message.to_string(),
        }
    }

    pub fn fatal(message: impl Display) -> Self {
        SessionError::Fatal {
            message: message.to_string(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Transient { .. })
    }
}

/// 轮播抓取错误
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Session(#[from] SessionError),
    /// 多次等待后第一张图片仍未出现
    #[error("未找到轮播图片 (已尝试 {attempts} 次)")]
    CarouselNotFound { attempts: u32 },
    /// 翻页按钮数量不足
    #[error("未找到翻页按钮: 需要至少 {expected} 个, 实际 {found} 个")]
    ControlsNotFound { expected: usize, found: usize },
    /// 保存图片失败
    #[error("保存第 {index} 张幻灯片失败: {source}")]
    Fetch {
        index: SlideIndex,
        #[source]
        source: FetchError,
    },
}

/// 图片下载错误
#[derive(Debug, Error)]
pub enum FetchError {
    /// 无法解析图片地址
    #[error("无效的图片地址 '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },
    /// 网络请求失败
    #[error("图片请求失败: {0}")]
    Request(#[from] reqwest::Error),
    /// 服务器返回非成功状态码
    #[error("图片请求返回错误状态 ({url}): {status}")]
    BadStatus { url: String, status: u16 },
    /// data: URL 解码失败
    #[error("内联图片解码失败: {0}")]
    InlineDecode(#[from] base64::DecodeError),
    /// 写入槽位文件失败
    #[error("写入文件失败 ({path}): {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 文档生成错误
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// 页面 URL 无法解析
    #[error("无效的页面 URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// 槽位内容不是可识别的图片
    #[error("第 {index} 张图片解码失败: {source}")]
    Decode {
        index: SlideIndex,
        #[source]
        source: image::ImageError,
    },
    /// 转换为 JPEG 失败
    #[error("第 {index} 张图片转换为 JPEG 失败: {source}")]
    Encode {
        index: SlideIndex,
        #[source]
        source: image::ImageError,
    },
    /// PDF 编码失败
    #[error("PDF 生成失败: {0}")]
    Pdf(#[from] oxidize_pdf::PdfError),
    /// 读取工作区或写入输出文件失败
    #[error("文件操作失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;

        match err {
            // 与浏览器的连接已断开，重试没有意义
            CdpError::Ws(_) | CdpError::ChannelSendError(_) => SessionError::fatal(err),
            _ => SessionError::transient(err),
        }
    }
}

// ========== 便捷构造函数 ==========

impl ConfigError {
    /// 创建配置值不合法错误
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl FetchError {
    /// 创建无效图片地址错误
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Display) -> Self {
        FetchError::InvalidReference {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
