pub mod auth;
pub mod engine;
pub mod notifier;
pub mod outcome;
pub mod report;
pub mod scanner;
pub mod sets;
pub mod state;
pub mod uploader;

pub use auth::Credentials;
pub use engine::{SyncConfig, SyncEngine, SyncPhase, SyncReport};
pub use notifier::{Notifier, NotifyStatus};
pub use outcome::{Failure, Outcome};
pub use report::{LineLevel, ReportLine, Reporter};
pub use scanner::{DeclarationFile, FileKind, FileScanner, ScanConfig, ScanResult, SetFile};
pub use sets::{parse_set_file, SetDirective, SetEditor};
pub use state::RunState;
pub use uploader::{parse_identifier, DeclarationUploader, UploadResult};
