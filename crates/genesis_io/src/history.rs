use crate::error::{IoError, Result};
use crate::serialization::{from_json_line, to_json_line};
use chrono::{DateTime, Utc};
use genesis_data::SimEvent;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const LIVE_FILE: &str = "events.jsonl";

/// One line of the event history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLine {
    pub logged_at: DateTime<Utc>,
    pub event: SimEvent,
}

/// Appends simulation events to `<dir>/events.jsonl`, one JSON object per
/// line. A dummy logger accepts events and writes nothing.
pub struct HistoryLogger {
    live_file: Option<BufWriter<File>>,
    log_dir: PathBuf,
}

impl HistoryLogger {
    pub fn new_at<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let log_dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&log_dir).map_err(|e| {
            IoError::from(e).with_context(format!("creating {}", log_dir.display()))
        })?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(LIVE_FILE))?;
        Ok(Self {
            live_file: Some(BufWriter::new(file)),
            log_dir,
        })
    }

    #[must_use]
    pub fn new_dummy() -> Self {
        Self {
            live_file: None,
            log_dir: PathBuf::new(),
        }
    }

    #[must_use]
    pub fn is_dummy(&self) -> bool {
        self.live_file.is_none()
    }

    pub fn log_event(&mut self, event: &SimEvent) -> Result<()> {
        if let Some(ref mut file) = self.live_file {
            let line = HistoryLine {
                logged_at: Utc::now(),
                event: event.clone(),
            };
            writeln!(file, "{}", to_json_line(&line)?)?;
        }
        Ok(())
    }

    pub fn log_events(&mut self, events: &[SimEvent]) -> Result<()> {
        for event in events {
            self.log_event(event)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(ref mut file) = self.live_file {
            file.flush()?;
        }
        Ok(())
    }

    /// Every readable line logged so far. Garbled lines are skipped.
    pub fn read_events(&self) -> Result<Vec<HistoryLine>> {
        if self.is_dummy() {
            return Ok(Vec::new());
        }
        let file = match File::open(self.log_dir.join(LIVE_FILE)) {
            Ok(f) => f,
            Err(_) => return Ok(Vec::new()),
        };
        let reader = BufReader::new(file);
        let mut lines = Vec::new();
        for l in reader.lines().map_while(std::io::Result::ok) {
            if let Ok(line) = from_json_line::<HistoryLine>(&l) {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// SHA-256 over the events alone, ignoring wall-clock stamps. Two runs
    /// with the same seed and collaborators produce the same digest.
    pub fn digest(events: &[SimEvent]) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(events)?);
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_data::EventTag;

    fn event(tick: u64) -> SimEvent {
        SimEvent::new(tick, EventTag::Death, vec![1], "#1 starved".to_string())
    }

    #[test]
    fn test_logged_events_read_back() {
        let dir = std::env::temp_dir().join(format!("genesis-history-{}", uuid::Uuid::new_v4()));
        let mut logger = HistoryLogger::new_at(&dir).unwrap();
        logger.log_events(&[event(1), event(2)]).unwrap();
        let lines = logger.read_events().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].event.tick, 2);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_dummy_writes_nothing() {
        let mut logger = HistoryLogger::new_dummy();
        logger.log_event(&event(1)).unwrap();
        assert!(logger.read_events().unwrap().is_empty());
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        let a = HistoryLogger::digest(&[event(1), event(2)]).unwrap();
        let b = HistoryLogger::digest(&[event(1), event(2)]).unwrap();
        let c = HistoryLogger::digest(&[event(2), event(1)]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
