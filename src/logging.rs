//! Request log and transform decision hooks.
//!
//! [`SharedLogger`] keeps a bounded in-memory window of entries and appends
//! every entry to a JSONL file. The transformation engine never logs
//! directly; it reports [`Decision`]s to a [`DecisionHook`], which may be the
//! shared logger, plain `tracing` ([`TracingHook`]) or nothing (`()`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::translate::reasoning::ReasoningOutcome;
use crate::translate::sanitize::SanitizeStage;

const MAX_LOG_ENTRIES: usize = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.into(),
            request_id: None,
            message: message.into(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, ctx: Value) -> Self {
        self.context = Some(ctx);
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Ring buffer of recent entries, persisted to JSONL.
pub struct Logger {
    entries: VecDeque<LogEntry>,
    file_path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl Logger {
    /// Open (or create) the log file and preload its most recent entries.
    pub fn new(file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut entries = VecDeque::with_capacity(MAX_LOG_ENTRIES);

        if file_path.exists() {
            let reader = BufReader::new(File::open(&file_path)?);
            for line in reader.lines().map_while(std::result::Result::ok) {
                if let Ok(entry) = serde_json::from_str::<LogEntry>(&line) {
                    if entries.len() >= MAX_LOG_ENTRIES {
                        entries.pop_front();
                    }
                    entries.push_back(entry);
                }
            }
        }

        let writer = BufWriter::new(open_append(&file_path)?);

        Ok(Self {
            entries,
            file_path,
            writer: Some(writer),
        })
    }

    pub fn log(&mut self, entry: LogEntry) {
        if let Some(ref mut writer) = self.writer {
            if let Ok(json) = serde_json::to_string(&entry) {
                let _ = writeln!(writer, "{json}");
                let _ = writer.flush();
            }
        }
        if self.entries.len() >= MAX_LOG_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// Rewrite the file so it only holds the in-memory window.
    pub fn compact(&mut self) -> std::io::Result<()> {
        self.writer = None;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        for entry in &self.entries {
            if let Ok(json) = serde_json::to_string(entry) {
                writeln!(writer, "{json}")?;
            }
        }
        writer.flush()?;
        self.writer = Some(BufWriter::new(open_append(&self.file_path)?));
        Ok(())
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[derive(Clone)]
pub struct SharedLogger(Arc<Mutex<Logger>>);

impl SharedLogger {
    pub fn new(file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self(Arc::new(Mutex::new(Logger::new(file_path)?))))
    }

    pub fn log(&self, entry: LogEntry) {
        if let Ok(mut logger) = self.0.lock() {
            logger.log(entry);
        }
    }

    pub fn info(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Info, component, message));
    }

    pub fn warn(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Warn, component, message));
    }

    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.0.lock().map(|l| l.recent(limit)).unwrap_or_default()
    }

    pub fn compact(&self) -> std::io::Result<()> {
        match self.0.lock() {
            Ok(mut logger) => logger.compact(),
            Err(_) => Ok(()),
        }
    }

    /// A hook that tags every recorded decision with `request_id`.
    #[must_use]
    pub fn for_request(&self, request_id: impl Into<String>) -> RequestLog {
        RequestLog {
            logger: self.clone(),
            request_id: request_id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transform decisions
// ---------------------------------------------------------------------------

/// A choice the transformation engine made about a request or response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Classified {
        structured: bool,
        messages: usize,
    },
    ToolChoiceDropped {
        stage: SanitizeStage,
        tool_choice: Value,
    },
    ReasoningBlocksStripped {
        messages: usize,
        blocks: usize,
    },
    ParamsDropped {
        params: Vec<String>,
    },
    CodeExecutionToolAdded,
    BetaDropped {
        token: String,
    },
    BetasSelected {
        betas: Vec<String>,
    },
    Reasoning {
        outcome: ReasoningOutcome,
    },
    ReasoningContentPromoted {
        choice: u64,
    },
}

impl Decision {
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Classified {
                structured,
                messages,
            } => {
                let format = if *structured { "anthropic" } else { "openai" };
                format!("{messages} messages classified as {format} format")
            }
            Self::ToolChoiceDropped { stage, tool_choice } => {
                format!("Dropped invalid tool_choice {tool_choice} ({stage:?})")
            }
            Self::ReasoningBlocksStripped { messages, blocks } => {
                format!("Stripped {blocks} thinking blocks from {messages} assistant messages")
            }
            Self::ParamsDropped { params } => format!("Dropped params: {}", params.join(", ")),
            Self::CodeExecutionToolAdded => "Added code execution tool".to_string(),
            Self::BetaDropped { token } => format!("Beta {token} not supported on Vertex"),
            Self::BetasSelected { betas } => format!("anthropic_beta={}", betas.join(",")),
            Self::Reasoning { outcome } => format!("Thinking: {outcome}"),
            Self::ReasoningContentPromoted { choice } => {
                format!("Copied reasoning_content into content for choice {choice}")
            }
        }
    }
}

/// Observer for transform decisions. Must not influence the transform.
pub trait DecisionHook {
    fn record(&self, decision: Decision);
}

impl DecisionHook for () {
    fn record(&self, _decision: Decision) {}
}

/// Collects decisions in memory; handy for inspection in tests.
impl DecisionHook for Mutex<Vec<Decision>> {
    fn record(&self, decision: Decision) {
        if let Ok(mut decisions) = self.lock() {
            decisions.push(decision);
        }
    }
}

/// Emits each decision as a `tracing` debug event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl DecisionHook for TracingHook {
    fn record(&self, decision: Decision) {
        tracing::debug!(decision = ?decision, "{}", decision.summary());
    }
}

/// [`SharedLogger`] bound to one request id.
#[derive(Clone)]
pub struct RequestLog {
    logger: SharedLogger,
    request_id: String,
}

impl RequestLog {
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn info(&self, component: &str, message: impl Into<String>) {
        self.logger.log(
            LogEntry::new(LogLevel::Info, component, message).with_request_id(&self.request_id),
        );
    }

    pub fn warn(&self, component: &str, message: impl Into<String>) {
        self.logger.log(
            LogEntry::new(LogLevel::Warn, component, message).with_request_id(&self.request_id),
        );
    }
}

impl DecisionHook for RequestLog {
    fn record(&self, decision: Decision) {
        TracingHook.record(decision.clone());
        let context = serde_json::to_value(&decision).unwrap_or(Value::Null);
        self.logger.log(
            LogEntry::new(LogLevel::Debug, "transform", decision.summary())
                .with_request_id(&self.request_id)
                .with_context(context),
        );
    }
}
