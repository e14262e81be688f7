mod logs;
mod packager;

pub use logs::{list_log_files, server_log_name, LogFile, SERVER_LOG_PREFIX};
pub use packager::{slugify, Artifact, DownloadPackager, MediaFile, PackagerError};
