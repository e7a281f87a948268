pub mod config;
pub mod core;
pub mod declare;
pub mod error;
pub mod logging;
pub mod remote;

pub use config::{ApiConfig, ApiOverrides, AppConfig};
pub use core::{Credentials, NotifyStatus, Reporter, SyncConfig, SyncEngine, SyncReport};
pub use error::{ConfigError, DeclarationError, RemoteError, SyncError};
pub use remote::{HttpApi, ManagementApi, MemoryApi, TransportConfig};
