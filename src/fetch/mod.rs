//! 图片下载
//!
//! 抓取流程每得到一张图片的地址，就立即交给 `ImageFetcher` 写入工作区槽位

pub mod http;

use std::path::Path;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::ImageReference;

pub use http::HttpImageFetcher;

/// 图片下载器
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// 把图片保存到槽位文件，已存在时覆盖
    async fn fetch(&self, reference: &ImageReference, slot: &Path) -> Result<(), FetchError>;
}
