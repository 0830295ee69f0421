//! Append-only trade ledger with a durable journal
//!
//! Records are immutable once appended and ordered by a strictly monotonic
//! commit timestamp. The journal frames each record as
//! `[len u32 LE][crc32 u32 LE][bincode payload]`; on open, surviving frames
//! are replayed into memory and a torn or corrupt tail frame truncates the
//! journal back to its last valid boundary.

use crate::error::{EngineError, EngineResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use services_common::{Px, Qty, Side, Token, Ts, UserId};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{info, warn};

/// One executed swap, as committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// User that executed the trade
    pub user: UserId,
    /// Trade direction
    pub side: Side,
    /// Token debited from the user
    pub token_in: Token,
    /// Amount debited
    pub amount_in: Qty,
    /// Token credited to the user
    pub token_out: Token,
    /// Amount credited
    pub amount_out: Qty,
    /// Effective exchange rate (`amount_out / amount_in`)
    pub rate: Px,
    /// Fee rate applied, in basis points
    pub fee_bps: u16,
    /// Commit timestamp, strictly monotonic across the ledger
    pub ts: Ts,
}

struct Journal {
    file: File,
}

const FRAME_HEADER_LEN: usize = 8;

impl Journal {
    /// Open (or create) a journal file, replaying all intact frames
    fn open(path: &Path) -> io::Result<(Self, Vec<TradeRecord>)> {
        let mut buf = Vec::new();
        if path.exists() {
            File::open(path)?.read_to_end(&mut buf)?;
        }

        let mut records = Vec::new();
        let mut valid_end = 0usize;
        while buf.len() - valid_end >= FRAME_HEADER_LEN {
            let len = u32::from_le_bytes(
                buf[valid_end..valid_end + 4].try_into().expect("4 bytes"),
            ) as usize;
            let crc = u32::from_le_bytes(
                buf[valid_end + 4..valid_end + 8].try_into().expect("4 bytes"),
            );
            let start = valid_end + FRAME_HEADER_LEN;
            let Some(end) = start.checked_add(len).filter(|&e| e <= buf.len()) else {
                break; // torn tail frame
            };
            let payload = &buf[start..end];
            if crc32fast::hash(payload) != crc {
                break;
            }
            match bincode::deserialize::<TradeRecord>(payload) {
                Ok(record) => records.push(record),
                Err(_) => break,
            }
            valid_end = end;
        }

        if valid_end < buf.len() {
            warn!(
                "journal at {} has {} trailing bytes past the last valid frame; truncating",
                path.display(),
                buf.len() - valid_end
            );
        }

        let mut file = OpenOptions::new().create(true).write(true).open(path)?;
        file.set_len(valid_end as u64)?;
        file.seek(SeekFrom::End(0))?;

        Ok((Self { file }, records))
    }

    fn append(&mut self, record: &TradeRecord) -> io::Result<()> {
        let payload = bincode::serialize(record).map_err(io::Error::other)?;
        let len =
            u32::try_from(payload.len()).map_err(|_| io::Error::other("record too large"))?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);
        self.file.write_all(&frame)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_data()
    }
}

struct Inner {
    records: Vec<TradeRecord>,
    journal: Option<Journal>,
    last_ts: Ts,
}

/// Immutable log of executed swaps; source of truth for audit and charting
pub struct TradeLedger {
    inner: RwLock<Inner>,
}

impl TradeLedger {
    /// In-memory ledger without a journal
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: Vec::new(),
                journal: None,
                last_ts: Ts::from_nanos(0),
            }),
        }
    }

    /// Ledger backed by a journal file; existing records are replayed
    pub fn with_journal(path: &Path) -> EngineResult<Self> {
        let (journal, records) = Journal::open(path).map_err(EngineError::Persistence)?;
        let last_ts = records.last().map_or(Ts::from_nanos(0), |r| r.ts);
        info!(
            "trade ledger replayed {} record(s) from {}",
            records.len(),
            path.display()
        );
        Ok(Self {
            inner: RwLock::new(Inner {
                records,
                journal: Some(journal),
                last_ts,
            }),
        })
    }

    /// Append one record, assigning its commit timestamp
    ///
    /// The journal frame is written before the in-memory append; a journal
    /// failure therefore leaves the visible ledger unchanged.
    pub fn append(&self, mut record: TradeRecord) -> EngineResult<TradeRecord> {
        let mut inner = self.inner.write();

        let now = Ts::now();
        let ts = if now.as_nanos() > inner.last_ts.as_nanos() {
            now
        } else {
            Ts::from_nanos(inner.last_ts.as_nanos() + 1)
        };
        record.ts = ts;

        if let Some(journal) = inner.journal.as_mut() {
            journal.append(&record).map_err(EngineError::Persistence)?;
        }
        inner.records.push(record.clone());
        inner.last_ts = ts;
        Ok(record)
    }

    /// Number of recorded trades
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Whether the ledger is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Last `n` records in commit order
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<TradeRecord> {
        let inner = self.inner.read();
        let start = inner.records.len().saturating_sub(n);
        inner.records[start..].to_vec()
    }

    /// Full copy of the ledger, for audit
    #[must_use]
    pub fn all(&self) -> Vec<TradeRecord> {
        self.inner.read().records.clone()
    }

    /// Flush the journal to disk
    pub fn sync(&self) -> EngineResult<()> {
        let mut inner = self.inner.write();
        if let Some(journal) = inner.journal.as_mut() {
            journal.sync().map_err(EngineError::Persistence)?;
        }
        Ok(())
    }
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new()
    }
}
