//! JSONL audit trail logging.
//!
//! Every tick appends events to an audit.jsonl file, one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use pvdot::{Order, Plan};
use pvdot_exchange::OrderId;
use serde::Serialize;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

pub fn log_tick_started(audit: &mut AuditLog, tick: u64, dry_run: bool) -> Result<()> {
    audit.log(
        "tick_started",
        serde_json::json!({ "tick": tick, "dry_run": dry_run }),
    )
}

/// Target and current weights with the portfolio value they were computed from.
pub fn log_weights(audit: &mut AuditLog, plan: &Plan) -> Result<()> {
    audit.log(
        "weights",
        serde_json::json!({
            "target": plan.target_weights,
            "current": plan.current_weights,
            "prices": plan.prices,
            "total_value": plan.total_value,
        }),
    )
}

pub fn log_orders_generated(audit: &mut AuditLog, orders: &[Order]) -> Result<()> {
    audit.log("orders_generated", serde_json::json!({ "orders": orders }))
}

pub fn log_order_submitted(audit: &mut AuditLog, order: &Order, id: OrderId) -> Result<()> {
    audit.log(
        "order_submitted",
        serde_json::json!({ "order": order, "order_id": id.0 }),
    )
}

pub fn log_order_failed(audit: &mut AuditLog, order: &Order, reason: &str) -> Result<()> {
    audit.log(
        "order_failed",
        serde_json::json!({ "order": order, "reason": reason }),
    )
}

pub fn log_tick_aborted(audit: &mut AuditLog, tick: u64, reason: &str) -> Result<()> {
    audit.log(
        "tick_aborted",
        serde_json::json!({ "tick": tick, "reason": reason }),
    )
}

pub fn log_tick_completed(
    audit: &mut AuditLog,
    tick: u64,
    generated: usize,
    submitted: usize,
    failed: usize,
) -> Result<()> {
    audit.log(
        "tick_completed",
        serde_json::json!({
            "tick": tick,
            "generated": generated,
            "submitted": submitted,
            "failed": failed,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvdot::Side;
    use rust_decimal_macros::dec;

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            log.log_simple("test_event").unwrap();
            log.log("test_data", serde_json::json!({"key": "value"}))
                .unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }

        assert!(lines[0].contains("\"event\":\"test_event\""));
    }

    #[test]
    fn audit_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        let mut log = AuditLog::open(&path).unwrap();
        log.log_simple("test").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn audit_log_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        AuditLog::open(&path).unwrap().log_simple("first").unwrap();
        AuditLog::open(&path).unwrap().log_simple("second").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn order_events_carry_order_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let order = Order::market("BTCUSDT", Side::Buy, dec!(0.1));

        {
            let mut log = AuditLog::open(&path).unwrap();
            log_order_submitted(&mut log, &order, OrderId(7)).unwrap();
            log_order_failed(&mut log, &order, "rejected").unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let events: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events[0]["event"], "order_submitted");
        assert_eq!(events[0]["order"]["symbol"], "BTCUSDT");
        assert_eq!(events[0]["order"]["side"], "BUY");
        assert_eq!(events[0]["order_id"], 7);
        assert_eq!(events[1]["event"], "order_failed");
        assert_eq!(events[1]["reason"], "rejected");
    }
}
