//! Log files offered to paired clients.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// Prefix of the files the server writes its own log to.
pub const SERVER_LOG_PREFIX: &str = "remote-access_";
const CRASH_LOG_PREFIX: &str = "crash";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogFile {
    pub path: String,
    /// `web` for the server's own logs, `crash` for crash reports, `device` otherwise.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Last modification, in milliseconds since the epoch.
    pub date: i64,
}

pub fn server_log_name(now: DateTime<Local>) -> String {
    format!("{}{}.log", SERVER_LOG_PREFIX, now.format("%Y%m%d_%H%M%S"))
}

fn kind_of(file_name: &str) -> &'static str {
    if file_name.starts_with(SERVER_LOG_PREFIX) {
        "web"
    } else if file_name.starts_with(CRASH_LOG_PREFIX) {
        "crash"
    } else {
        "device"
    }
}

/// Regular files of the log directory, newest first. An unreadable
/// directory lists nothing.
pub async fn list_log_files(dir: &Path) -> Vec<LogFile> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list log directory {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut logs = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Error reading log directory {:?}: {}", dir, e);
                break;
            }
        };
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let file_name = entry.file_name().to_string_lossy().to_string();
        if !metadata.is_file() || file_name.starts_with('.') {
            continue;
        }
        let date = metadata
            .modified()
            .map(|modified| DateTime::<Utc>::from(modified).timestamp_millis())
            .unwrap_or_default();
        logs.push(LogFile {
            path: entry.path().to_string_lossy().to_string(),
            kind: kind_of(&file_name),
            date,
        });
    }
    logs.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path)));
    logs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn write_aged(dir: &Path, name: &str, age_secs: u64) {
        let path = dir.join(name);
        std::fs::write(&path, name).unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn server_log_name_is_timestamped() {
        let name = server_log_name(Local::now());
        assert!(name.starts_with(SERVER_LOG_PREFIX));
        assert!(name.ends_with(".log"));
        assert_eq!(kind_of(&name), "web");
    }

    #[tokio::test]
    async fn lists_regular_files_newest_first() {
        let dir = TempDir::new().unwrap();
        write_aged(dir.path(), "remote-access_20260101_000000.log", 300);
        write_aged(dir.path(), "crash_1.txt", 10);
        write_aged(dir.path(), "player.log", 100);
        write_aged(dir.path(), ".hidden", 0);
        std::fs::create_dir(dir.path().join("archive")).unwrap();

        let logs = list_log_files(dir.path()).await;
        let kinds: Vec<_> = logs.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec!["crash", "device", "web"]);
        assert!(logs[0].path.ends_with("crash_1.txt"));
        assert!(logs[0].date > logs[1].date);
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        assert!(list_log_files(Path::new("/does/not/exist")).await.is_empty());
    }
}
