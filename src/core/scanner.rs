use crate::error::SyncError;
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// 声明文件后缀
pub const DEFAULT_DECLARATION_SUFFIX: &str = ".json";
/// 集合文件名模式，第一个捕获组为集合名
pub const DEFAULT_SET_PATTERN: &str = r"set\.(.*?)\.txt";

/// 文件分类配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 以此后缀结尾的文件视为声明
    pub declaration_suffix: String,
    /// 匹配此模式的文件视为集合文件
    pub set_pattern: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            declaration_suffix: DEFAULT_DECLARATION_SUFFIX.to_string(),
            set_pattern: DEFAULT_SET_PATTERN.to_string(),
        }
    }
}

/// 文件类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Declaration,
    Set { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationFile {
    pub path: PathBuf,
    pub relative: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetFile {
    pub path: PathBuf,
    pub relative: String,
    pub set_name: String,
}

/// 扫描结果：声明文件和集合文件分开存放
#[derive(Debug, Default)]
pub struct ScanResult {
    pub declarations: Vec<DeclarationFile>,
    pub sets: Vec<SetFile>,
    pub ignored: usize,
}

impl ScanResult {
    pub fn scanned(&self) -> usize {
        self.declarations.len() + self.sets.len() + self.ignored
    }
}

/// 目录扫描器
pub struct FileScanner {
    root: PathBuf,
    declaration_suffix: String,
    set_pattern: Regex,
}

impl FileScanner {
    /// 根目录不存在或不是目录时直接失败
    pub fn new(root: impl Into<PathBuf>, config: &ScanConfig) -> Result<Self, SyncError> {
        let root = root.into();

        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(SyncError::RootNotDirectory(root)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncError::RootNotFound(root))
            }
            Err(e) => return Err(SyncError::Io { path: root, source: e }),
        }

        let set_pattern = Regex::new(&config.set_pattern)?;
        if set_pattern.captures_len() < 2 {
            return Err(SyncError::PatternGroup(config.set_pattern.clone()));
        }

        Ok(Self {
            root,
            declaration_suffix: config.declaration_suffix.clone(),
            set_pattern,
        })
    }

    /// 按文件名分类，返回 None 表示忽略
    pub fn classify(&self, file_name: &str) -> Option<FileKind> {
        if file_name.ends_with(&self.declaration_suffix) {
            return Some(FileKind::Declaration);
        }

        let name = self.set_pattern.captures(file_name)?.get(1)?.as_str();
        if name.is_empty() {
            warn!("集合文件名缺少集合名，忽略: {}", file_name);
            return None;
        }

        Some(FileKind::Set {
            name: name.to_string(),
        })
    }

    /// 惰性遍历根目录下所有文件（含被忽略的文件，kind 为 None）
    fn walk(&self) -> impl Iterator<Item = (PathBuf, String, Option<FileKind>)> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!("遍历目录出错，跳过: {}", e);
                    None
                }
            })
            // 符号链接指向普通文件时也视为文件
            .filter(|e| {
                e.file_type().is_file() || (e.path_is_symlink() && e.path().is_file())
            })
            .map(move |e| {
                let file_name = e.file_name().to_string_lossy();
                let kind = self.classify(&file_name);
                let relative = e
                    .path()
                    .strip_prefix(&self.root)
                    .unwrap_or(e.path())
                    .to_string_lossy()
                    .replace('\\', "/");
                (e.path().to_path_buf(), relative, kind)
            })
    }

    /// 扫描并分类
    pub fn scan(&self) -> ScanResult {
        info!("开始扫描目录: {:?}", self.root);

        let mut result = ScanResult::default();
        for (path, relative, kind) in self.walk() {
            match kind {
                Some(FileKind::Declaration) => {
                    result.declarations.push(DeclarationFile { path, relative })
                }
                Some(FileKind::Set { name }) => result.sets.push(SetFile {
                    path,
                    relative,
                    set_name: name,
                }),
                None => {
                    debug!("忽略文件: {}", relative);
                    result.ignored += 1;
                }
            }
        }

        info!(
            "扫描完成: {} 个声明, {} 个集合文件, {} 个被忽略",
            result.declarations.len(),
            result.sets.len(),
            result.ignored
        );

        result
    }
}
