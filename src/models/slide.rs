//! 幻灯片数据模型
//!
//! `SlideIndex` 是整条流水线的排序键：抓取顺序 = 编号顺序 = 文档页序

use std::fmt;
use std::num::NonZeroU32;

/// 幻灯片编号（从 1 开始，严格递增）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlideIndex(NonZeroU32);

impl SlideIndex {
    /// 第一张幻灯片
    pub const FIRST: SlideIndex = SlideIndex(NonZeroU32::MIN);

    /// 从正整数创建，0 返回 None
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// 下一张幻灯片的编号
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SlideIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 图片来源定位符（通常是 URL，也可能是相对路径或 data: URL）
///
/// 只用于相等比较，用来判断"图片是否变化"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 是否为内联的 data: URL
    pub fn is_inline(&self) -> bool {
        self.0
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_index_starts_at_one_and_increments() {
        let first = SlideIndex::FIRST;
        assert_eq!(first.get(), 1);
        assert_eq!(first.next().get(), 2);
        assert_eq!(first.next().next().to_string(), "3");
        assert!(SlideIndex::new(0).is_none());
    }

    #[test]
    fn test_slide_index_orders_numerically() {
        let two = SlideIndex::new(2).unwrap();
        let ten = SlideIndex::new(10).unwrap();
        assert!(two < ten);
    }

    #[test]
    fn test_image_reference_inline_detection() {
        assert!(ImageReference::new("data:image/png;base64,AAAA").is_inline());
        assert!(ImageReference::new("DATA:image/png;base64,AAAA").is_inline());
        assert!(!ImageReference::new("https://cdn.example.com/1.jpg").is_inline());
        assert!(!ImageReference::new("abc").is_inline());
    }
}
