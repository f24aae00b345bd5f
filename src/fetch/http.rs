use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, Url};
use tracing::{debug, info};

use super::ImageFetcher;
use crate::error::FetchError;
use crate::models::ImageReference;
use crate::utils::logging::truncate_text;

/// 通过 HTTP 下载图片，同时支持内联的 base64 data: URL
pub struct HttpImageFetcher {
    client: Client,
    /// 用于解析相对地址的页面 URL
    base_url: Option<Url>,
}

impl HttpImageFetcher {
    /// 创建下载器
    ///
    /// # 参数
    /// - `base_url`: 页面地址，用于解析 `src` 中的相对路径
    pub fn new(base_url: Option<&str>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let base_url = base_url.and_then(|url| Url::parse(url).ok());

        Ok(Self { client, base_url })
    }

    /// 把图片地址解析为绝对 URL
    pub fn resolve(&self, reference: &ImageReference) -> Result<Url, FetchError> {
        match Url::parse(reference.as_str()) {
            Ok(url) => Ok(url),
            Err(e) => match &self.base_url {
                Some(base) => base
                    .join(reference.as_str())
                    .map_err(|e| FetchError::invalid_reference(reference.as_str(), e)),
                None => Err(FetchError::invalid_reference(reference.as_str(), e)),
            },
        }
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        debug!("下载图片: {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, reference: &ImageReference, slot: &Path) -> Result<(), FetchError> {
        info!(
            "💾 保存图片 {} → {}",
            truncate_text(reference.as_str(), 120),
            slot.display()
        );

        let bytes = if reference.is_inline() {
            decode_data_url(reference.as_str())?
        } else {
            let url = self.resolve(reference)?;
            self.download(url).await?
        };

        tokio::fs::write(slot, &bytes)
            .await
            .map_err(|source| FetchError::Write {
                path: slot.display().to_string(),
                source,
            })?;
        debug!("已写入 {} 字节", bytes.len());

        Ok(())
    }
}

/// 解码 `data:[<mediatype>];base64,<data>` 形式的内联图片
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, FetchError> {
    let invalid = |reason: &str| FetchError::invalid_reference(truncate_text(data_url, 60), reason);

    let rest = data_url
        .get(5..)
        .filter(|_| data_url[..5].eq_ignore_ascii_case("data:"))
        .ok_or_else(|| invalid("不是 data: URL"))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| invalid("缺少 ','"))?;

    if !header.to_ascii_lowercase().ends_with(";base64") {
        return Err(invalid("仅支持 base64 编码的 data: URL"));
    }

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_decode_base64_data_url() {
        let bytes = assert_ok!(decode_data_url("data:image/jpeg;base64,/9j/4A=="));
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn test_decode_rejects_non_base64_data_url() {
        let err = assert_err!(decode_data_url("data:image/svg+xml,<svg/>"));
        assert!(matches!(err, FetchError::InvalidReference { .. }));
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        let err = assert_err!(decode_data_url("data:image/png;base64,***"));
        assert!(matches!(err, FetchError::InlineDecode(_)));
    }

    #[test]
    fn test_resolve_relative_reference_against_page() {
        let fetcher = HttpImageFetcher::new(Some("https://example.com/deck/my-pitch")).unwrap();
        let url = fetcher
            .resolve(&ImageReference::new("/static/slide-1.jpg"))
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/static/slide-1.jpg");
    }

    #[test]
    fn test_resolve_relative_reference_without_base_fails() {
        let fetcher = HttpImageFetcher::new(None).unwrap();
        let result = fetcher.resolve(&ImageReference::new("slide-1.jpg"));
        assert!(matches!(result, Err(FetchError::InvalidReference { .. })));
    }

    #[tokio::test]
    async fn test_fetch_inline_reference_writes_slot() {
        let dir = tempfile::tempdir().unwrap();
        let slot = dir.path().join("1.jpg");
        let fetcher = HttpImageFetcher::new(None).unwrap();

        fetcher
            .fetch(&ImageReference::new("data:image/jpeg;base64,/9j/4A=="), &slot)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&slot).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }
}
