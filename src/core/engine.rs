use crate::core::notifier::{Notifier, NotifyStatus};
use crate::core::report::{ReportLine, Reporter};
use crate::core::scanner::{FileScanner, ScanConfig};
use crate::core::sets::SetEditor;
use crate::core::state::RunState;
use crate::core::uploader::{record_upload, DeclarationUploader};
use crate::error::SyncError;
use crate::remote::ManagementApi;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// 同步配置
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 文件分类规则
    pub scan_config: ScanConfig,
    /// 声明并发上传数，1 表示顺序上传
    pub max_concurrent_uploads: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            scan_config: ScanConfig::default(),
            max_concurrent_uploads: 1,
        }
    }
}

/// 同步阶段，单次运行线性推进，不会回到之前的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Scanning,
    UploadingDeclarations,
    EditingSets,
    Aggregating,
    Notifying,
    Done,
}

/// 同步报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub start_time: i64,
    pub end_time: i64,
    /// 耗时（毫秒）
    pub duration: u64,
    pub files_scanned: usize,
    pub files_ignored: usize,
    pub declaration_files: usize,
    pub set_files: usize,
    pub changed_declarations: Vec<String>,
    pub unchanged_declarations: Vec<String>,
    pub changed_sets: Vec<String>,
    pub unchanged_sets: Vec<String>,
    pub failures: usize,
    pub notify: NotifyStatus,
    pub lines: Vec<ReportLine>,
}

/// 同步引擎
pub struct SyncEngine {
    api: Arc<dyn ManagementApi>,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(api: Arc<dyn ManagementApi>) -> Self {
        Self {
            api,
            config: SyncConfig::default(),
        }
    }

    pub fn with_config(api: Arc<dyn ManagementApi>, config: SyncConfig) -> Self {
        Self { api, config }
    }

    fn enter(&self, phase: SyncPhase) {
        debug!("进入阶段: {:?}", phase);
    }

    /// 同步目录
    ///
    /// 仅在根目录不可用时返回错误，且此时不会发出任何网络请求。
    /// 其余失败都只影响对应的文件或指令，运行总会走到通知判定。
    pub async fn run_sync(&self, root: &Path, mut reporter: Reporter) -> Result<SyncReport, SyncError> {
        let start_time = chrono::Utc::now().timestamp();
        let started = Instant::now();

        info!("开始同步目录: {:?} -> {}", root, self.api.endpoint());

        self.enter(SyncPhase::Scanning);
        let scanner = FileScanner::new(root, &self.config.scan_config)?;
        let scan = tokio::task::spawn_blocking(move || scanner.scan())
            .await
            .map_err(|e| SyncError::ScanTask(e.to_string()))?;

        let mut state = RunState::new();

        // 所有声明都处理完之后才处理集合文件
        self.enter(SyncPhase::UploadingDeclarations);
        let uploader = DeclarationUploader::new(self.api.as_ref());
        let uploader = &uploader;
        let concurrency = self.config.max_concurrent_uploads.max(1);
        let mut uploads = stream::iter(scan.declarations.iter())
            .map(move |file| uploader.upload(file))
            .buffer_unordered(concurrency);
        while let Some(result) = uploads.next().await {
            record_upload(result, &mut state, &mut reporter);
        }
        drop(uploads);

        self.enter(SyncPhase::EditingSets);
        let editor = SetEditor::new(self.api.as_ref());
        for file in &scan.sets {
            editor.apply(file, &mut state, &mut reporter).await;
        }

        self.enter(SyncPhase::Aggregating);
        debug!(
            "变更汇总: 声明 {} 变更 / {} 未变, 集合 {} 变更 / {} 未变, {} 个失败",
            state.changed_declarations().len(),
            state.unchanged_declarations().len(),
            state.changed_sets().len(),
            state.unchanged_sets().len(),
            state.failures()
        );

        self.enter(SyncPhase::Notifying);
        let notify = Notifier::new(self.api.as_ref())
            .finish(&state, &mut reporter)
            .await;

        self.enter(SyncPhase::Done);
        let end_time = chrono::Utc::now().timestamp();
        info!(
            "同步完成: {} 个声明变更, {} 个集合变更, {} 个失败",
            state.changed_declarations().len(),
            state.changed_sets().len(),
            state.failures()
        );

        Ok(SyncReport {
            start_time,
            end_time,
            duration: started.elapsed().as_millis() as u64,
            files_scanned: scan.scanned(),
            files_ignored: scan.ignored,
            declaration_files: scan.declarations.len(),
            set_files: scan.sets.len(),
            changed_declarations: state.changed_declarations().to_vec(),
            unchanged_declarations: state.unchanged_declarations().to_vec(),
            changed_sets: state.changed_sets().to_vec(),
            unchanged_sets: state.unchanged_sets().to_vec(),
            failures: state.failures(),
            notify,
            lines: reporter.into_lines(),
        })
    }
}
