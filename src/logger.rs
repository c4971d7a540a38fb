use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::command::{CommandParams, Outcome};
use crate::diff::diff_snapshots;
use crate::finder::DeviceRegistry;
use crate::status::StatusSnapshot;

pub enum MessageLogMode {
    Full,
    Diffed,
}

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_status: Option<StatusSnapshot>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous_status: None,
        })
    }

    pub fn log_scan(&mut self, registry: &DeviceRegistry) {
        let devices: Vec<Value> = registry
            .iter()
            .map(|d| json!({ "mac": d.mac(), "name": d.name(), "addr": d.addr().to_string() }))
            .collect();
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "scan",
            "devices": devices,
        });
        self.write_line(&entry);
    }

    pub fn log_bind(&mut self, mac: &str, bound: bool) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "bind",
            "mac": mac,
            "bound": bound,
        });
        self.write_line(&entry);
    }

    pub fn log_command(&mut self, action: &str, mac: &str, params: &CommandParams, outcome: &Outcome) {
        let body: Map<String, Value> = params
            .iter()
            .map(|(field, value)| (field.to_string(), json!(value)))
            .collect();
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "action": action,
            "mac": mac,
            "sent": outcome.is_sent(),
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_status(&mut self, mac: &str, status: &StatusSnapshot) {
        match self.mode {
            MessageLogMode::Full => {
                let entry = json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "status",
                    "mac": mac,
                    "body": status_body(status),
                });
                self.write_line(&entry);
            }
            MessageLogMode::Diffed => {
                let entry = match self.previous_status.as_ref() {
                    None => json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "status",
                        "mac": mac,
                        "full": true,
                        "body": status_body(status),
                    }),
                    Some(prev) => {
                        let changes: Vec<Value> = diff_snapshots(Some(prev), status)
                            .into_iter()
                            .map(|c| json!({ "field": c.field, "old": c.old, "new": c.new }))
                            .collect();
                        json!({
                            "ts": Utc::now().to_rfc3339(),
                            "dir": "status",
                            "mac": mac,
                            "changes": changes,
                        })
                    }
                };
                self.write_line(&entry);
                self.previous_status = Some(status.clone());
            }
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}

fn status_body(status: &StatusSnapshot) -> Map<String, Value> {
    status
        .iter()
        .map(|(field, value)| (field.to_string(), json!(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command;
    use tempfile::NamedTempFile;

    fn read_lines(path: &str) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn snapshot(pairs: &[(&str, i32)]) -> StatusSnapshot {
        StatusSnapshot::new(
            pairs.iter().map(|(c, _)| c.to_string()).collect(),
            pairs.iter().map(|(_, v)| *v).collect(),
        )
        .unwrap()
    }

    #[test]
    fn log_bind_writes_ndjson() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_bind("f4911e7aca59", true);

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "bind");
        assert_eq!(lines[0]["mac"], "f4911e7aca59");
        assert_eq!(lines[0]["bound"], true);
        assert!(lines[0]["ts"].as_str().is_some());
    }

    #[test]
    fn log_command_captures_params() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        let params = command::fan_speed(2).unwrap();
        logger.log_command("set_fan_speed", "ab", &params, &Outcome::Sent);

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "cmd");
        assert_eq!(lines[0]["action"], "set_fan_speed");
        assert_eq!(lines[0]["sent"], true);
        assert_eq!(lines[0]["body"]["WdSpd"], 2);
        assert_eq!(lines[0]["body"]["NoiseSet"], 0);
    }

    #[test]
    fn full_mode_logs_every_status() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_status("ab", &snapshot(&[("Pow", 1)]));
        logger.log_status("ab", &snapshot(&[("Pow", 1)]));

        let lines = read_lines(path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["body"]["Pow"], 1);
    }

    #[test]
    fn diffed_mode_logs_full_first_then_changes() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();
        logger.log_status("ab", &snapshot(&[("Pow", 1), ("SetTem", 24)]));
        logger.log_status("ab", &snapshot(&[("Pow", 1), ("SetTem", 25)]));
        logger.log_status("ab", &snapshot(&[("Pow", 1), ("SetTem", 25)]));

        let lines = read_lines(path);
        assert_eq!(lines[0]["full"], true);
        assert_eq!(lines[0]["body"]["SetTem"], 24);
        let changes = lines[1]["changes"].as_array().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["field"], "SetTem");
        assert_eq!(changes[0]["old"], 24);
        assert_eq!(changes[0]["new"], 25);
        assert_eq!(lines[2]["changes"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn log_scan_lists_devices() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_scan(&DeviceRegistry::default());

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "scan");
        assert_eq!(lines[0]["devices"].as_array().unwrap().len(), 0);
    }
}
