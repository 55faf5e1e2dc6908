use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Appends one JSON object per replay event when a log path is configured.
pub struct JsonLog {
    file: Option<File>,
}

impl JsonLog {
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                Some(file)
            }
            None => None,
        };
        Ok(Self { file })
    }

    pub fn record(&mut self, kind: &str, fields: Value) {
        let Some(file) = &mut self.file else {
            return;
        };

        let ts_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let entry = json!({
            "ts_ms": ts_ms,
            "kind": kind,
            "fields": fields,
        });

        if let Err(err) = writeln!(file, "{entry}").and_then(|()| file.flush()) {
            log::warn!("json log write failed: {err}");
        }
    }
}
