//! Events module - outbound notifications for audio, analytics and logs
//!
//! Events are emitted after a transition has been committed. Sinks are
//! fire-and-forget: a sink that fails must not roll back or block the engine,
//! so `EventSink::emit` has no error channel at all.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::snapshot::{power_up_name, status_name};
use crate::types::{GameStatus, PowerUpKind};

/// Something that happened in a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    BlockPlace {
        block_id: u32,
        shape_id: u16,
        row: i16,
        col: i16,
        points: u64,
    },
    /// One or more lines cleared by a single placement
    LinesCleared {
        lines: u32,
        rows: u32,
        cols: u32,
        points: u64,
    },
    PerfectClear {
        bonus: u64,
    },
    ComboAchieved {
        combo: u32,
        bonus: u64,
    },
    StreakBonus {
        streak: u32,
        bonus: u64,
    },
    PowerUpUsed {
        kind: PowerUpKind,
        remaining: u32,
    },
    AchievementUnlocked {
        id: String,
    },
    GameOver {
        score: u64,
        lines: u32,
        level: u32,
    },
    StatusChanged {
        from: GameStatus,
        to: GameStatus,
    },
}

impl GameEvent {
    /// Stable tag used by collaborators to pick a sound or metric
    pub fn tag(&self) -> &'static str {
        match self {
            GameEvent::BlockPlace { .. } => "blockPlace",
            GameEvent::LinesCleared { lines, .. } => match lines {
                0 | 1 => "singleLine",
                2 => "doubleLine",
                3 => "tripleLine",
                _ => "quadLine",
            },
            GameEvent::PerfectClear { .. } => "perfectClear",
            GameEvent::ComboAchieved { .. } => "comboAchieved",
            GameEvent::StreakBonus { .. } => "streakBonus",
            GameEvent::PowerUpUsed { .. } => "powerUpUsed",
            GameEvent::AchievementUnlocked { .. } => "achievementUnlocked",
            GameEvent::GameOver { .. } => "gameOver",
            GameEvent::StatusChanged { .. } => "statusChanged",
        }
    }

    /// JSON object with the tag and the numeric payload
    pub fn to_json(&self) -> Value {
        let payload = match self {
            GameEvent::BlockPlace {
                block_id,
                shape_id,
                row,
                col,
                points,
            } => json!({
                "blockId": block_id,
                "shapeId": shape_id,
                "row": row,
                "col": col,
                "points": points,
            }),
            GameEvent::LinesCleared {
                lines,
                rows,
                cols,
                points,
            } => json!({ "lines": lines, "rows": rows, "cols": cols, "points": points }),
            GameEvent::PerfectClear { bonus } => json!({ "bonus": bonus }),
            GameEvent::ComboAchieved { combo, bonus } => json!({ "combo": combo, "bonus": bonus }),
            GameEvent::StreakBonus { streak, bonus } => {
                json!({ "streak": streak, "bonus": bonus })
            }
            GameEvent::PowerUpUsed { kind, remaining } => {
                json!({ "kind": power_up_name(*kind), "remaining": remaining })
            }
            GameEvent::AchievementUnlocked { id } => json!({ "id": id }),
            GameEvent::GameOver {
                score,
                lines,
                level,
            } => json!({ "score": score, "lines": lines, "level": level }),
            GameEvent::StatusChanged { from, to } => {
                json!({ "from": status_name(*from), "to": status_name(*to) })
            }
        };
        json!({ "event": self.tag(), "data": payload })
    }
}

/// Receiver of outbound events
pub trait EventSink {
    fn emit(&mut self, event: &GameEvent);
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: &GameEvent) {
        (**self).emit(event)
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &GameEvent) {}
}

/// Keeps events in memory, in emission order
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<GameEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.events.iter().map(GameEvent::tag).collect()
    }

    pub fn take(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}

/// Forwards events to an async consumer
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<GameEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<GameEvent>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving half
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: &GameEvent) {
        // A dropped receiver is not the engine's problem.
        let _ = self.tx.send(event.clone());
    }
}

/// Appends one JSON line per event to a file
///
/// The first write failure is reported on stderr and the log goes quiet.
pub struct JsonlEventLog {
    out: Option<BufWriter<File>>,
    seq: u64,
    buf: Vec<u8>,
}

impl JsonlEventLog {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: Some(BufWriter::new(file)),
            seq: 0,
            buf: Vec::with_capacity(256),
        })
    }

    pub fn is_active(&self) -> bool {
        self.out.is_some()
    }

    fn write_line(&mut self, event: &GameEvent) -> io::Result<()> {
        let Some(out) = self.out.as_mut() else {
            return Ok(());
        };
        self.seq += 1;
        let mut record = event.to_json();
        record["seq"] = json!(self.seq);

        self.buf.clear();
        serde_json::to_writer(&mut self.buf, &record)?;
        self.buf.push(b'\n');
        out.write_all(&self.buf)?;
        out.flush()
    }
}

impl EventSink for JsonlEventLog {
    fn emit(&mut self, event: &GameEvent) {
        if let Err(e) = self.write_line(event) {
            eprintln!("[EventLog] write failed, disabling event log: {}", e);
            self.out = None;
        }
    }
}

impl std::fmt::Debug for JsonlEventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlEventLog")
            .field("active", &self.is_active())
            .field("seq", &self.seq)
            .finish()
    }
}
