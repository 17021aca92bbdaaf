use std::path::PathBuf;

use tokio::sync::Mutex;

use crate::{error::AppResult, models::FeedbackEntry};

/// Timestamp layout of the feedback log
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator between names inside a single log cell
const NAME_SEPARATOR: &str = "|";

/// Destination for completed satisfaction surveys
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Appends one entry; never rewrites earlier ones
    async fn append(&self, entry: FeedbackEntry) -> AppResult<()>;
}

/// Append-only CSV file, one row per submitted survey
pub struct CsvFeedbackLog {
    path: PathBuf,
    // Serializes appends from concurrent sessions
    lock: Mutex<()>,
}

impl CsvFeedbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn row(entry: &FeedbackEntry) -> [String; 4] {
        [
            entry.submitted_at.format(TIMESTAMP_FORMAT).to_string(),
            entry.selected.join(NAME_SEPARATOR),
            entry.recommended.join(NAME_SEPARATOR),
            entry.satisfaction.to_string(),
        ]
    }
}

#[async_trait::async_trait]
impl FeedbackSink for CsvFeedbackLog {
    async fn append(&self, entry: FeedbackEntry) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let row = Self::row(&entry);

        tokio::task::spawn_blocking(move || -> AppResult<()> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.write_record(&row)?;
            writer.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| crate::error::AppError::Internal(e.to_string()))??;

        tracing::info!(
            path = %self.path.display(),
            satisfaction = entry.satisfaction,
            "Feedback logged"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn entry(satisfaction: u8) -> FeedbackEntry {
        FeedbackEntry {
            submitted_at: Local.with_ymd_and_hms(2025, 6, 17, 14, 3, 9).unwrap(),
            selected: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            recommended: vec!["D".to_string(), "E".to_string()],
            satisfaction,
        }
    }

    #[test]
    fn test_row_layout() {
        let row = CsvFeedbackLog::row(&entry(7));
        assert_eq!(row, ["2025-06-17 14:03:09", "A|B|C", "D|E", "7"]);
    }

    #[tokio::test]
    async fn test_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("feedback.csv");
        let log = CsvFeedbackLog::new(&path);

        log.append(entry(7)).await.unwrap();
        log.append(entry(2)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2025-06-17 14:03:09,A|B|C,D|E,7",
                "2025-06-17 14:03:09,A|B|C,D|E,2",
            ]
        );
    }
}
