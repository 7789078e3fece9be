use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::session::Screen;

pub type EventDetails = Map<String, Value>;

/// `events.jsonl` for one session: one line per accepted event, recording the
/// screen it left and the screen it led to.
///
/// Each line carries `type`, `session_id`, `seq` (from 1), `ts`, `from` and
/// `to`. Details are merged in first, so they can never overwrite those keys.
/// The file is only created by the first line.
#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    session_id: String,
    seq: u64,
    file: Option<File>,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: session_id.into(),
            seq: 0,
            file: None,
        }
    }

    pub fn transition(
        &mut self,
        event: &str,
        from: Screen,
        to: Screen,
        details: EventDetails,
    ) -> anyhow::Result<Value> {
        let mut line = details;
        self.seq += 1;
        line.insert("type".to_string(), Value::String(event.to_string()));
        line.insert(
            "session_id".to_string(),
            Value::String(self.session_id.clone()),
        );
        line.insert("seq".to_string(), Value::from(self.seq));
        line.insert("ts".to_string(), Value::String(timestamp_utc()));
        line.insert("from".to_string(), Value::String(from.to_string()));
        line.insert("to".to_string(), Value::String(to.to_string()));

        let mut encoded = serde_json::to_string(&line)?;
        encoded.push('\n');
        self.file()?.write_all(encoded.as_bytes())?;
        Ok(Value::Object(line))
    }

    /// Something that happened without a screen change, such as an export.
    pub fn note(
        &mut self,
        event: &str,
        screen: Screen,
        details: EventDetails,
    ) -> anyhow::Result<Value> {
        self.transition(event, screen, screen, details)
    }

    fn file(&mut self) -> anyhow::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("session log is not open"))
    }
}

pub fn timestamp_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
