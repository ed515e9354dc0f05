use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Value;

use crate::store::Store;

const LOG_EXTENSION: &str = "jsonl";
const SHORT_EXCERPT: usize = 120;
const LONG_EXCERPT: usize = 800;

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub id: String,
    pub project_raw: String,
    pub project_display: String,
    pub cwd: String,
    pub summary: String,
    pub first_msg: String,
    pub first_msg_long: String,
    pub tag: Option<String>,
    pub pinned: bool,
    pub modified: DateTime<Local>,
    pub topics: Vec<String>,
    pub path: PathBuf,
    pub msg_count: usize,
}

impl Session {
    pub fn label(&self) -> &str {
        if !self.summary.is_empty() {
            &self.summary
        } else if !self.first_msg.is_empty() {
            &self.first_msg
        } else {
            "(empty session)"
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_msg.is_empty() && self.summary.is_empty()
    }

    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or("")
    }

    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }

    /// Tag when present, otherwise the abbreviated id.
    pub fn handle(&self) -> &str {
        match self.tag.as_deref() {
            Some(tag) => tag,
            None => self.short_id(),
        }
    }

    pub fn timestamp(&self) -> String {
        self.modified.format("%Y-%m-%d %H:%M").to_string()
    }

    pub fn age_at(&self, now: DateTime<Local>) -> String {
        let delta = now.signed_duration_since(self.modified);
        let days = delta.num_days();
        if days > 365 {
            return format!("{}y ago", days / 365);
        }
        if days > 30 {
            return format!("{}mo ago", days / 30);
        }
        if days > 0 {
            return format!("{days}d ago");
        }
        let hours = delta.num_hours();
        if hours > 0 {
            return format!("{hours}h ago");
        }
        let mins = delta.num_minutes();
        if mins > 0 {
            format!("{mins}m ago")
        } else {
            String::from("just now")
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Date,
    Name,
    Project,
    Tag,
    Messages,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            SortMode::Date => SortMode::Name,
            SortMode::Name => SortMode::Project,
            SortMode::Project => SortMode::Tag,
            SortMode::Tag => SortMode::Messages,
            SortMode::Messages => SortMode::Date,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Date => "Date",
            SortMode::Name => "Name",
            SortMode::Project => "Project",
            SortMode::Tag => "Tag",
            SortMode::Messages => "Messages",
        }
    }
}

/// Orders sessions pinned-first, then by `mode`, then newest first.
pub fn sort_sessions(sessions: &mut [Session], mode: SortMode) {
    match mode {
        SortMode::Date => sessions.sort_by_key(|s| (!s.pinned, Reverse(s.modified))),
        SortMode::Name => {
            sessions.sort_by_cached_key(|s| (!s.pinned, s.label().to_lowercase(), Reverse(s.modified)))
        }
        SortMode::Project => sessions.sort_by_cached_key(|s| {
            (!s.pinned, s.project_display.to_lowercase(), Reverse(s.modified))
        }),
        SortMode::Tag => sessions.sort_by_cached_key(|s| {
            (
                !s.pinned,
                s.tag.is_none(),
                s.tag().to_lowercase(),
                Reverse(s.modified),
            )
        }),
        SortMode::Messages => {
            sessions.sort_by_key(|s| (!s.pinned, Reverse(s.msg_count), Reverse(s.modified)))
        }
    }
}

pub struct SessionIndex {
    root: PathBuf,
    home_marker: Option<String>,
}

impl SessionIndex {
    pub fn new(root: impl Into<PathBuf>, home: Option<&Path>) -> Self {
        let home_marker = home
            .map(|h| h.to_string_lossy().replace(['/', '\\'], "-"))
            .filter(|m| m.len() > 1);
        Self {
            root: root.into(),
            home_marker,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuilds every session from the log tree and the store. Never fails:
    /// unreadable directories and files degrade to fewer or emptier entries.
    pub fn scan(&self, store: &Store, sort: SortMode) -> Vec<Session> {
        let tags = store.tags();
        let pins = store.pins();

        let mut sessions: Vec<Session> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for path in collect_log_files(&self.root) {
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let project_raw = path
                .parent()
                .and_then(Path::file_name)
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let parsed = match fs::read(&path) {
                Ok(bytes) => parse_log(&String::from_utf8_lossy(&bytes)),
                Err(err) => {
                    tracing::warn!("failed to read {}: {err}", path.display());
                    ParsedLog::default()
                }
            };

            let tag = tags.get(&id).filter(|t| !t.is_empty()).cloned();
            let pinned = pins.contains(&id);
            let session = Session {
                id,
                project_display: decode_project(&project_raw, self.home_marker.as_deref()),
                project_raw,
                cwd: parsed.cwd,
                summary: parsed.summary,
                first_msg: parsed.first_msg,
                first_msg_long: parsed.first_msg_long,
                tag,
                pinned,
                modified: DateTime::<Local>::from(modified),
                topics: parsed.topics,
                path,
                msg_count: parsed.msg_count,
            };

            // The same stem under two projects: keep the newest file.
            match seen.get(&session.id) {
                Some(&idx) if sessions[idx].modified >= session.modified => {
                    tracing::warn!(
                        "duplicate session id {}, skipping {}",
                        session.id,
                        session.path.display()
                    );
                }
                Some(&idx) => {
                    tracing::warn!(
                        "duplicate session id {}, skipping {}",
                        session.id,
                        sessions[idx].path.display()
                    );
                    sessions[idx] = session;
                }
                None => {
                    seen.insert(session.id.clone(), sessions.len());
                    sessions.push(session);
                }
            }
        }

        sort_sessions(&mut sessions, sort);
        tracing::debug!(
            "scanned {} sessions under {}",
            sessions.len(),
            self.root.display()
        );
        sessions
    }
}

fn collect_log_files(root: &Path) -> Vec<PathBuf> {
    let Ok(projects) = fs::read_dir(root) else {
        return Vec::new();
    };

    let mut files = Vec::new();
    for project in projects.flatten() {
        let project_path = project.path();
        if !project_path.is_dir() {
            continue;
        }
        let Ok(entries) = fs::read_dir(&project_path) else {
            tracing::warn!("failed to read {}", project_path.display());
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION) {
                files.push(path);
            }
        }
    }
    files
}

/// Turns the encoded project directory name back into a readable path.
pub fn decode_project(raw: &str, home_marker: Option<&str>) -> String {
    let mut p = raw.to_string();
    if let Some(marker) = home_marker
        && let Some(rest) = raw.strip_prefix(marker)
    {
        p = format!("~{rest}");
    }
    if p == "~" || p == "-workdir" {
        return p;
    }
    if let Some(rest) = p.strip_prefix("~-") {
        return format!("~/{}", rest.replace('-', "/"));
    }
    p.replace('-', "/")
}

pub fn extract_text(message: &Value) -> String {
    match message {
        Value::String(text) => text.clone(),
        Value::Object(obj) => match obj.get("content") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .find(|item| item.get("type").and_then(Value::as_str) == Some("text"))
                .and_then(|item| item.get("text"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

#[derive(Debug, Default, PartialEq)]
struct ParsedLog {
    summary: String,
    topics: Vec<String>,
    cwd: String,
    first_msg: String,
    first_msg_long: String,
    msg_count: usize,
}

fn parse_log(content: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };

        match value.get("type").and_then(Value::as_str) {
            Some("summary") => {
                if let Some(text) = value.get("summary").and_then(Value::as_str)
                    && !text.is_empty()
                {
                    parsed.topics.push(text.to_string());
                    parsed.summary = text.to_string();
                }
            }
            Some(kind @ ("user" | "assistant")) => {
                parsed.msg_count += 1;
                if kind != "user" || !parsed.first_msg.is_empty() {
                    continue;
                }
                parsed.cwd = value
                    .get("cwd")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                let text = value.get("message").map(extract_text).unwrap_or_default();
                if !text.is_empty() {
                    let short: String = text.chars().take(SHORT_EXCERPT).collect();
                    parsed.first_msg = short.split_whitespace().collect::<Vec<_>>().join(" ");
                    parsed.first_msg_long = text.chars().take(LONG_EXCERPT).collect();
                }
            }
            _ => {}
        }
    }

    parsed
}

#[cfg(test)]
pub(crate) fn sample(id: &str) -> Session {
    Session {
        id: id.to_string(),
        project_raw: String::from("-srv-app"),
        project_display: String::from("/srv/app"),
        cwd: String::new(),
        summary: String::new(),
        first_msg: format!("first message of {id}"),
        first_msg_long: format!("first message of {id}"),
        tag: None,
        pinned: false,
        modified: Local::now(),
        topics: Vec::new(),
        path: PathBuf::from(format!("/srv/logs/{id}.jsonl")),
        msg_count: 2,
    }
}
