//! 工作区
//!
//! 临时目录，每张幻灯片一个槽位文件 `{编号}.jpg`。
//! 组装文档时按编号的数值排序（`10` 排在 `2` 之后），而不是按文件名字符串排序。

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::models::SlideIndex;

/// 槽位文件扩展名
pub const SLOT_EXTENSION: &str = "jpg";

/// 已加载的槽位内容：编号 → 原始字节，按编号升序
#[derive(Debug, Default, Clone)]
pub struct Artifacts {
    slots: BTreeMap<SlideIndex, Vec<u8>>,
}

impl Artifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// 放入一个槽位，同一编号重复放入时覆盖
    pub fn insert(&mut self, index: SlideIndex, bytes: Vec<u8>) {
        self.slots.insert(index, bytes);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 按编号升序遍历
    pub fn iter(&self) -> impl Iterator<Item = (SlideIndex, &[u8])> {
        self.slots
            .iter()
            .map(|(index, bytes)| (*index, bytes.as_slice()))
    }
}

/// 临时工作区，Drop 时整个目录被删除
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// 在系统临时目录下创建工作区
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("carousel-").tempdir()?;
        debug!("创建工作区: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// 指定编号的槽位文件路径
    pub fn slot_path(&self, index: SlideIndex) -> PathBuf {
        self.dir.path().join(slot_name(index))
    }

    /// 加载全部槽位，见 [`load_artifacts`]
    pub async fn load(&self) -> io::Result<Option<Artifacts>> {
        load_artifacts(self.path()).await
    }

    /// 删除工作区目录
    pub fn remove(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("已删除工作区: {}", path.display());
        Ok(())
    }
}

/// 槽位文件名
pub fn slot_name(index: SlideIndex) -> String {
    format!("{}.{}", index, SLOT_EXTENSION)
}

/// 从槽位文件名中解析编号：取第一个 `.` 之前的部分，必须是正整数
pub fn slot_index(name: &str) -> Option<SlideIndex> {
    let stem = name.split('.').next()?;
    stem.parse::<u32>().ok().and_then(SlideIndex::new)
}

/// 按编号的数值升序排列槽位文件名，无法解析编号的文件名被丢弃
pub fn order_slot_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut indexed: Vec<(SlideIndex, String)> = names
        .into_iter()
        .map(Into::into)
        .filter_map(|name| slot_index(&name).map(|index| (index, name)))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, name)| name).collect()
}

/// 列出目录中的槽位
///
/// 目录不存在或没有任何槽位时返回 `Ok(None)`
pub async fn scan_slots(dir: &Path) -> io::Result<Option<BTreeMap<SlideIndex, PathBuf>>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("工作区不存在: {}", dir.display());
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if slot_index(&name).is_none() {
            warn!("忽略无法识别的文件: {}", name);
            continue;
        }
        names.push(name);
    }
    // read_dir 的顺序与文件系统有关，排序后重复编号时保留的文件是确定的
    names.sort();

    let mut slots = BTreeMap::new();
    for name in order_slot_names(names) {
        let Some(index) = slot_index(&name) else {
            continue;
        };
        if slots.contains_key(&index) {
            warn!("槽位 {} 重复，忽略文件: {}", index, name);
            continue;
        }
        slots.insert(index, dir.join(&name));
    }

    if slots.is_empty() {
        info!("工作区为空: {}", dir.display());
        return Ok(None);
    }
    Ok(Some(slots))
}

/// 按编号顺序读取目录中全部槽位的字节
///
/// 返回 `Ok(None)` 的情况（不生成文档，也不算错误）：
/// - 目录不存在或为空
/// - 任一槽位读取失败
pub async fn load_artifacts(dir: &Path) -> io::Result<Option<Artifacts>> {
    let Some(slots) = scan_slots(dir).await? else {
        return Ok(None);
    };

    let mut artifacts = Artifacts::new();
    for (index, path) in slots {
        match fs::read(&path).await {
            Ok(bytes) => artifacts.insert(index, bytes),
            Err(e) => {
                warn!("无法读取图片 {}: {}", path.display(), e);
                return Ok(None);
            }
        }
    }

    debug!("已加载 {} 个槽位", artifacts.len());
    Ok(Some(artifacts))
}
