//! Line-oriented session commands driving an inspector over a loaded document.

use crate::config::EngineConfig;
use crate::dom::{Document, DocumentError, DomTree, SelectorError};
use crate::inspector::{InspectorCommand, InspectorHost};
use crate::tracker::{Clock, ManualClock, SystemClock};
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use serde_json::json;
use sightline_common::formatter::format_record;
use sightline_common::protocol::{ElementSnapshot, SelectionRecord};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "session.pest"]
struct SessionParser;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Pest error: {0}")]
    Pest(#[from] pest::error::Error<Rule>),
    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No document loaded")]
    NoDocument,
    #[error("No element matches {0:?}")]
    NoMatch(String),
    #[error("Time can only be advanced on a manual clock")]
    ClockNotManual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Stop,
    Reset,
    Status,
    Records,
    Load(PathBuf),
    Select(String),
    Insert { parent: String, snapshot: String },
    Remove(String),
    Advance(u64),
}

/// Parse one line. Blank lines and comments yield `None`.
pub fn parse_command(input: &str) -> Result<Option<SessionCommand>, SessionError> {
    let mut pairs = SessionParser::parse(Rule::line, input)?;
    let Some(line) = pairs.next() else {
        return Ok(None);
    };

    for inner in line.into_inner() {
        let command = match inner.as_rule() {
            Rule::start_cmd => SessionCommand::Start,
            Rule::stop_cmd => SessionCommand::Stop,
            Rule::reset_cmd => SessionCommand::Reset,
            Rule::status_cmd => SessionCommand::Status,
            Rule::records_cmd => SessionCommand::Records,
            Rule::load_cmd => SessionCommand::Load(PathBuf::from(strings(inner).remove(0))),
            Rule::select_cmd => SessionCommand::Select(strings(inner).remove(0)),
            Rule::remove_cmd => SessionCommand::Remove(strings(inner).remove(0)),
            Rule::insert_cmd => {
                let mut args = strings(inner).into_iter();
                let parent = args.next().unwrap_or_default();
                let snapshot = args.next().unwrap_or_default();
                SessionCommand::Insert { parent, snapshot }
            }
            Rule::advance_cmd => {
                let digits = inner
                    .into_inner()
                    .next()
                    .map(|p| p.as_str())
                    .unwrap_or_default();
                SessionCommand::Advance(digits.parse()?)
            }
            _ => continue,
        };
        return Ok(Some(command));
    }
    Ok(None)
}

// The grammar guarantees each command carries its declared string arguments.
fn strings(pair: Pair<Rule>) -> Vec<String> {
    let mut out: Vec<String> = pair
        .into_inner()
        .filter_map(|arg| {
            let rule = arg.as_rule();
            let inner = arg.into_inner().next()?;
            Some(match rule {
                Rule::dq_string => unescape(inner.as_str(), '"'),
                _ => unescape(inner.as_str(), '\''),
            })
        })
        .collect();
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Only the delimiter and backslash are escapes; anything else stays verbatim
/// so embedded JSON keeps its own escapes.
fn unescape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && (next == quote || next == '\\')
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub enum SessionClock {
    System(SystemClock),
    Manual(ManualClock),
}

impl Clock for SessionClock {
    fn now_ms(&self) -> u64 {
        match self {
            Self::System(clock) => clock.now_ms(),
            Self::Manual(clock) => clock.now_ms(),
        }
    }
}

const PAGE: &str = "main";

/// Executes session commands against one document and its inspector.
pub struct SessionExecutor {
    document: Option<Document>,
    host: InspectorHost,
    clock: SessionClock,
    format: OutputFormat,
}

impl SessionExecutor {
    pub fn new(config: EngineConfig, clock: SessionClock, format: OutputFormat) -> Self {
        let mut host = InspectorHost::new(config);
        host.attach(PAGE);
        Self {
            document: None,
            host,
            clock,
            format,
        }
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn host(&self) -> &InspectorHost {
        &self.host
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Run one line. Returns `None` for blank lines and comments.
    pub fn execute_line(&mut self, line: &str) -> Result<Option<String>, SessionError> {
        match parse_command(line)? {
            Some(command) => self.execute(command).map(Some),
            None => Ok(None),
        }
    }

    pub fn execute(&mut self, command: SessionCommand) -> Result<String, SessionError> {
        match command {
            SessionCommand::Start | SessionCommand::Stop | SessionCommand::Reset => {
                let inspector_command = match command {
                    SessionCommand::Start => InspectorCommand::Start,
                    SessionCommand::Stop => InspectorCommand::Stop,
                    _ => InspectorCommand::Reset,
                };
                let state = self.host.attach(PAGE).apply(inspector_command);
                Ok(self.message(&format!("Inspector {}", state), json!({ "state": state.to_string() })))
            }
            SessionCommand::Status => Ok(self.status()),
            SessionCommand::Records => Ok(self.records()),
            SessionCommand::Load(path) => {
                let document = Document::load(&path)?;
                let count = document.elements().len();
                self.document = Some(document);
                Ok(self.message(
                    &format!("Loaded {} elements from {}", count, path.display()),
                    json!({ "loaded": path.display().to_string(), "elements": count }),
                ))
            }
            SessionCommand::Select(selector) => self.select(&selector),
            SessionCommand::Insert { parent, snapshot } => self.insert(&parent, &snapshot),
            SessionCommand::Remove(selector) => self.remove(&selector),
            SessionCommand::Advance(ms) => match &self.clock {
                SessionClock::Manual(clock) => {
                    let now = clock.advance(ms);
                    Ok(self.message(&format!("Clock at {} ms", now), json!({ "now_ms": now })))
                }
                SessionClock::System(_) => Err(SessionError::ClockNotManual),
            },
        }
    }

    fn select(&mut self, selector: &str) -> Result<String, SessionError> {
        let document = self.document.as_ref().ok_or(SessionError::NoDocument)?;
        let node = document
            .query(selector)?
            .ok_or_else(|| SessionError::NoMatch(selector.to_string()))?;
        let now = self.clock.now_ms();

        match self.host.attach(PAGE).select(document, node, now) {
            Some(record) => self.render_record(&record),
            None => Ok(self.message(
                "Inspector is idle; run 'start' first",
                json!({ "error": "idle" }),
            )),
        }
    }

    fn insert(&mut self, parent: &str, snapshot: &str) -> Result<String, SessionError> {
        let snapshot: ElementSnapshot = serde_json::from_str(snapshot)?;
        let now = self.clock.now_ms();
        let document = self.document.as_mut().ok_or(SessionError::NoDocument)?;
        let parent_node = document
            .query(parent)?
            .ok_or_else(|| SessionError::NoMatch(parent.to_string()))?;
        let inserted = document.append(parent_node, &snapshot)?;
        self.host.attach(PAGE).notify_insertion(inserted, now);
        Ok(self.message(
            &format!("Inserted <{}> at {} ms", snapshot.tag, now),
            json!({ "inserted": snapshot.tag, "at_ms": now }),
        ))
    }

    fn remove(&mut self, selector: &str) -> Result<String, SessionError> {
        let document = self.document.as_mut().ok_or(SessionError::NoDocument)?;
        let node = document
            .query(selector)?
            .ok_or_else(|| SessionError::NoMatch(selector.to_string()))?;
        let removed = document.remove(node)?;
        self.host.attach(PAGE).notify_removal(&removed);
        Ok(self.message(
            &format!("Removed {} elements", removed.len()),
            json!({ "removed": removed.len() }),
        ))
    }

    fn status(&mut self) -> String {
        let loaded = self.document.is_some();
        let inspector = self.host.attach(PAGE);
        let state = inspector.state();
        let records = inspector.records().len();
        let tracked = inspector.tracker().len();
        self.message(
            &format!(
                "State: {}\nDocument: {}\nRecords: {}\nTracked insertions: {}",
                state,
                if loaded { "loaded" } else { "none" },
                records,
                tracked
            ),
            json!({
                "state": state.to_string(),
                "document": loaded,
                "records": records,
                "tracked": tracked,
            }),
        )
    }

    fn records(&mut self) -> String {
        let records = self.host.attach(PAGE).records();
        match self.format {
            OutputFormat::Json => json!(records).to_string(),
            OutputFormat::Text if records.is_empty() => "No records".to_string(),
            OutputFormat::Text => records
                .iter()
                .enumerate()
                .map(|(i, r)| format!("{}. {}  {}", i + 1, r.display_name, r.structural_selector))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn render_record(&self, record: &SelectionRecord) -> Result<String, SessionError> {
        match self.format {
            OutputFormat::Text => Ok(format_record(record)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        }
    }

    fn message(&self, text: &str, value: serde_json::Value) -> String {
        match self.format {
            OutputFormat::Text => text.to_string(),
            OutputFormat::Json => value.to_string(),
        }
    }
}
