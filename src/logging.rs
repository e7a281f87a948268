//! 日志模块 - 诊断日志配置与按大小轮转的日志文件

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// 是否启用诊断日志
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 日志级别: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_level")]
    pub level: String,
    /// 额外写入的日志文件
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// 日志文件最大大小（MB）
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

fn default_max_size_mb() -> u32 {
    5
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            level: default_level(),
            file: None,
            max_size_mb: default_max_size_mb(),
        }
    }
}

impl LogConfig {
    /// 将配置的日志级别转换为 tracing Level
    pub fn tracing_level(&self) -> tracing::Level {
        match self.level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}

struct WriterState {
    writer: Option<BufWriter<File>>,
    file_path: PathBuf,
    max_size: u64,
}

impl WriterState {
    /// 超过大小限制时轮转为 <file>.old 并重新打开
    fn rotate_if_needed(&mut self) -> io::Result<()> {
        let size = fs::metadata(&self.file_path).map(|m| m.len()).unwrap_or(0);
        if size <= self.max_size {
            return Ok(());
        }

        if let Some(mut w) = self.writer.take() {
            let _ = w.flush();
        }
        rotate_log(&self.file_path)?;
        self.writer = Some(open_file(&self.file_path)?);
        Ok(())
    }
}

fn open_file(file_path: &Path) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;
    Ok(BufWriter::new(file))
}

fn backup_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.as_os_str().to_os_string();
    name.push(".old");
    PathBuf::from(name)
}

fn rotate_log(file_path: &Path) -> io::Result<()> {
    let backup = backup_path(file_path);
    if backup.exists() {
        fs::remove_file(&backup)?;
    }
    fs::rename(file_path, &backup)
}

/// 带大小限制的日志写入器
#[derive(Clone)]
pub struct SizeRotatingWriter {
    state: Arc<Mutex<WriterState>>,
}

impl SizeRotatingWriter {
    pub fn new(file_path: &Path, max_size_mb: u32) -> io::Result<Self> {
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut state = WriterState {
            writer: None,
            file_path: file_path.to_path_buf(),
            max_size: u64::from(max_size_mb) * 1024 * 1024,
        };
        if file_path.exists() {
            state.rotate_if_needed()?;
        }
        if state.writer.is_none() {
            state.writer = Some(open_file(file_path)?);
        }

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }
}

fn lock(state: &Mutex<WriterState>) -> MutexGuard<'_, WriterState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// 日志写入器包装
pub struct LogWriter {
    state: Arc<Mutex<WriterState>>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = lock(&self.state);
        let written = match state.writer.as_mut() {
            Some(w) => {
                let n = w.write(buf)?;
                w.flush()?;
                n
            }
            None => return Err(io::Error::new(io::ErrorKind::Other, "log writer not available")),
        };
        let _ = state.rotate_if_needed();
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match lock(&self.state).writer.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SizeRotatingWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            state: self.state.clone(),
        }
    }
}
