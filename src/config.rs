use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认配置文件名（位于当前工作目录）
pub const DEFAULT_CONFIG_FILE: &str = "carousel.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 最多抓取的幻灯片数量（安全上限，防止"下一页"永不禁用时死循环）
    pub max_slides: u32,
    /// 单次轮询等待的超时时间（毫秒）
    pub wait_timeout_ms: u64,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 等待第一张图片的最大尝试次数
    pub first_image_attempts: u32,
    /// 两次等待第一张图片之间的间隔（毫秒）
    pub first_image_retry_delay_ms: u64,
    /// 检测图片变化的最大尝试次数
    pub change_attempts: u32,
    /// 两次检测图片变化之间的间隔（毫秒）
    pub change_delay_ms: u64,
    /// 点击"下一页"前的等待（毫秒）
    pub pre_click_delay_ms: u64,
    /// 点击"下一页"后等待页面稳定（毫秒）
    pub settle_delay_ms: u64,
    /// 图片元素选择器
    pub image_selector: String,
    /// 幻灯片图片在图片列表中的位置
    pub image_position: usize,
    /// 按钮元素选择器
    pub button_selector: String,
    /// "上一页"按钮在按钮列表中的位置
    pub prev_button_index: usize,
    /// "下一页"按钮在按钮列表中的位置
    pub next_button_index: usize,
    /// 浏览器调试端口（设置后连接已有浏览器，不再启动无头浏览器）
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<PathBuf>,
    /// 是否使用无头模式
    pub headless: bool,
    /// 输出目录
    pub output_dir: PathBuf,
    /// 输出文档扩展名
    pub output_extension: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_slides: 10_000,
            wait_timeout_ms: 30_000,
            poll_interval_ms: 1_000,
            first_image_attempts: 10,
            first_image_retry_delay_ms: 5_000,
            change_attempts: 5,
            change_delay_ms: 1_000,
            pre_click_delay_ms: 1_000,
            settle_delay_ms: 2_000,
            image_selector: "img".to_string(),
            image_position: 1,
            button_selector: "button".to_string(),
            prev_button_index: 0,
            next_button_index: 1,
            browser_debug_port: None,
            chrome_executable: None,
            headless: true,
            output_dir: PathBuf::from("."),
            output_extension: "pdf".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → 配置文件 → 环境变量
    ///
    /// 配置文件路径取自 `CAROUSEL_CONFIG`，未设置时使用当前目录下的
    /// `carousel.toml`（不存在则跳过）
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var("CAROUSEL_CONFIG").ok().map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let base = if explicit.is_some() || path.exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };

        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            max_slides: env_parse("CAROUSEL_MAX_SLIDES", "u32")?.unwrap_or(self.max_slides),
            wait_timeout_ms: env_parse("CAROUSEL_WAIT_TIMEOUT_MS", "u64")?
                .unwrap_or(self.wait_timeout_ms),
            poll_interval_ms: env_parse("CAROUSEL_POLL_INTERVAL_MS", "u64")?
                .unwrap_or(self.poll_interval_ms),
            first_image_attempts: env_parse("CAROUSEL_FIRST_IMAGE_ATTEMPTS", "u32")?
                .unwrap_or(self.first_image_attempts),
            change_attempts: env_parse("CAROUSEL_CHANGE_ATTEMPTS", "u32")?
                .unwrap_or(self.change_attempts),
            image_selector: std::env::var("CAROUSEL_IMAGE_SELECTOR")
                .unwrap_or(self.image_selector),
            button_selector: std::env::var("CAROUSEL_BUTTON_SELECTOR")
                .unwrap_or(self.button_selector),
            browser_debug_port: env_parse("CAROUSEL_BROWSER_DEBUG_PORT", "u16")?
                .or(self.browser_debug_port),
            chrome_executable: std::env::var("CAROUSEL_CHROME_EXECUTABLE")
                .ok()
                .map(PathBuf::from)
                .or(self.chrome_executable),
            headless: env_parse("CAROUSEL_HEADLESS", "bool")?.unwrap_or(self.headless),
            output_dir: std::env::var("CAROUSEL_OUTPUT_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(self.output_dir),
            output_extension: std::env::var("CAROUSEL_OUTPUT_EXTENSION")
                .unwrap_or(self.output_extension),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
            ..self
        })
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_slides == 0 {
            return Err(ConfigError::invalid("max_slides", "必须大于 0"));
        }
        if self.first_image_attempts == 0 {
            return Err(ConfigError::invalid("first_image_attempts", "必须大于 0"));
        }
        if self.change_attempts == 0 {
            return Err(ConfigError::invalid("change_attempts", "必须大于 0"));
        }
        if self.prev_button_index == self.next_button_index {
            return Err(ConfigError::invalid(
                "next_button_index",
                "不能与 prev_button_index 相同",
            ));
        }
        if self.output_extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::invalid("output_extension", "不能为空"));
        }
        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// 读取并解析环境变量，未设置时返回 None
fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
