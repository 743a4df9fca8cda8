//! Append-only JSON Lines trade journal.
//!
//! One line per order attempt. Append mode keeps earlier sessions intact
//! and an interrupted write corrupts at most one line. Files rotate daily.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use fxgate_core::OrderRequest;

use crate::chain::PlacementDecision;
use crate::error::EngineResult;

/// One journaled order attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub instrument: String,
    pub side: String,
    pub amount: String,
    /// Guard-chain decision: "placed", "rejected:<guard>", "quote_unavailable"
    /// or "precheck_refused".
    pub decision: String,
    #[serde(default)]
    pub order_id: Option<String>,
    /// Terminal classification once known.
    #[serde(default)]
    pub outcome: Option<String>,
}

impl TradeRecord {
    /// Build a record from an order attempt and its chain decision.
    pub fn new(order: &OrderRequest, decision: &PlacementDecision) -> Self {
        let (decision_label, order_id) = match decision {
            PlacementDecision::Placed { order_id } => {
                ("placed".to_string(), Some(order_id.clone()))
            }
            PlacementDecision::GuardRejected { guard, .. } => {
                (format!("rejected:{guard}"), None)
            }
            PlacementDecision::QuoteUnavailable => ("quote_unavailable".to_string(), None),
            PlacementDecision::PrecheckRefused { .. } => ("precheck_refused".to_string(), None),
        };

        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            instrument: order.instrument.symbol.clone(),
            side: order.side.as_str().to_string(),
            amount: order.amount.to_string(),
            decision: decision_label,
            order_id,
            outcome: None,
        }
    }

    /// Attach the terminal outcome label.
    pub fn with_outcome(mut self, outcome: &str) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }
}

struct ActiveFile {
    writer: BufWriter<File>,
    date: String,
}

/// Daily-rotated JSON Lines journal, flushed after every record.
pub struct TradeJournal {
    base_dir: PathBuf,
    active: Option<ActiveFile>,
}

impl TradeJournal {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        if let Err(e) = std::fs::create_dir_all(&base_dir) {
            warn!(?e, dir = %base_dir.display(), "Failed to create journal directory");
        }

        Self {
            base_dir,
            active: None,
        }
    }

    fn open_for_date(&self, date: &str) -> EngineResult<ActiveFile> {
        let path = self.base_dir.join(format!("trades_{date}.jsonl"));
        info!(path = %path.display(), "Opening trade journal (append mode)");

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(ActiveFile {
            writer: BufWriter::new(file),
            date: date.to_string(),
        })
    }

    /// Append a record and flush it to disk. A failed open surfaces as an
    /// error; it never drops the record silently.
    pub fn append(&mut self, record: &TradeRecord) -> EngineResult<()> {
        let today = Utc::now().format("%Y-%m-%d").to_string();

        let active = match self.active.take().filter(|a| a.date == today) {
            Some(active) => self.active.insert(active),
            None => {
                let opened = self.open_for_date(&today)?;
                self.active.insert(opened)
            }
        };
        let json = serde_json::to_string(record)?;
        writeln!(active.writer, "{}", json)?;
        active.writer.flush()?;

        debug!(
            record_id = %record.id,
            decision = %record.decision,
            "Journaled order attempt"
        );
        Ok(())
    }
}

impl Drop for TradeJournal {
    fn drop(&mut self) {
        if let Some(active) = self.active.as_mut() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush trade journal on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxgate_core::{GuardKind, Instrument, OrderSide};
    use rust_decimal_macros::dec;
    use std::io::{BufRead, BufReader};
    use tempfile::TempDir;

    fn sample_order() -> OrderRequest {
        OrderRequest::market(Instrument::new("USDJPY", 42), OrderSide::Buy, dec!(0.01))
    }

    fn read_lines(dir: &TempDir) -> Vec<String> {
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
        let file = File::open(entries[0].path()).unwrap();
        BufReader::new(file).lines().filter_map(|l| l.ok()).collect()
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let mut journal = TradeJournal::new(dir.path());

        let placed = TradeRecord::new(
            &sample_order(),
            &PlacementDecision::Placed {
                order_id: "order-1".to_string(),
            },
        )
        .with_outcome("filled");
        let rejected = TradeRecord::new(
            &sample_order(),
            &PlacementDecision::GuardRejected {
                guard: GuardKind::Slippage,
                reason: "over threshold".to_string(),
            },
        );

        journal.append(&placed).unwrap();
        journal.append(&rejected).unwrap();

        let lines = read_lines(&dir);
        assert_eq!(lines.len(), 2);

        let first: TradeRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first.decision, "placed");
        assert_eq!(first.order_id.as_deref(), Some("order-1"));
        assert_eq!(first.outcome.as_deref(), Some("filled"));

        let second: TradeRecord = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second.decision, "rejected:slippage");
        assert!(second.order_id.is_none());
    }

    #[test]
    fn test_failed_open_surfaces_as_error() {
        let dir = TempDir::new().unwrap();
        // A file where the journal directory should be makes every open fail.
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let mut journal = TradeJournal::new(&blocker);
        let record = TradeRecord::new(&sample_order(), &PlacementDecision::QuoteUnavailable);
        assert!(journal.append(&record).is_err());
    }

    #[test]
    fn test_append_mode_preserves_earlier_sessions() {
        let dir = TempDir::new().unwrap();

        {
            let mut journal = TradeJournal::new(dir.path());
            let record = TradeRecord::new(&sample_order(), &PlacementDecision::QuoteUnavailable);
            journal.append(&record).unwrap();
        }
        {
            let mut journal = TradeJournal::new(dir.path());
            let record = TradeRecord::new(&sample_order(), &PlacementDecision::QuoteUnavailable);
            journal.append(&record).unwrap();
        }

        assert_eq!(read_lines(&dir).len(), 2);
    }
}
