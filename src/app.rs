use std::collections::BTreeSet;
use std::fs;
use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::action::ExitAction;
use crate::filter::filter;
use crate::launch::{LaunchOptions, ROW_CUSTOM, ROW_LAUNCH};
use crate::layout;
use crate::nav::Cursor;
use crate::session::{Session, SessionIndex, SortMode};
use crate::store::Store;

const JUMP_ROWS: usize = 10;
const WHEEL_ROWS: usize = 3;

/// Interaction mode together with the input state only that mode owns.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Mode {
    #[default]
    Normal,
    Search,
    TagEdit {
        input: String,
    },
    DeleteConfirm {
        label: String,
        targets: Vec<Session>,
    },
    DeleteEmptyConfirm {
        targets: Vec<Session>,
    },
    NewSession {
        input: String,
    },
    LaunchOptions(LaunchOptions),
    Help,
}

impl Mode {
    /// Footer badge, shown only for the text-entry modes.
    pub fn badge(&self) -> Option<&'static str> {
        match self {
            Mode::Search => Some("SEARCH"),
            Mode::TagEdit { .. } => Some("TAG"),
            Mode::NewSession { .. } => Some("NEW"),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    Quit,
    Launch(ExitAction),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    frames_left: u16,
}

type Outcome = (Mode, Option<Exit>);

pub struct App {
    index: SessionIndex,
    store: Store,
    sessions: Vec<Session>,
    filtered: Vec<Session>,
    query: String,
    cursor: Cursor,
    marked: BTreeSet<String>,
    mode: Mode,
    sort: SortMode,
    status: Option<Status>,
    status_frames: u16,
    area: Rect,
}

impl App {
    pub fn new(index: SessionIndex, store: Store, sort: SortMode, status_frames: u16) -> Self {
        let mut app = Self {
            index,
            store,
            sessions: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            cursor: Cursor::default(),
            marked: BTreeSet::new(),
            mode: Mode::Normal,
            sort,
            status: None,
            status_frames: status_frames.max(1),
            area: Rect::default(),
        };
        app.rebuild();
        app
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn filtered(&self) -> &[Session] {
        &self.filtered
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Ids of the sessions marked for a bulk pin or delete.
    pub fn marked(&self) -> &BTreeSet<String> {
        &self.marked
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    pub fn selected(&self) -> Option<&Session> {
        self.filtered.get(self.cursor.selected())
    }

    /// Rows the list can show for the last known terminal size.
    pub fn page_size(&self) -> usize {
        layout::compute(self.area)
            .map(|l| l.list.height as usize)
            .unwrap_or(1)
            .max(1)
    }

    pub fn fit_to(&mut self, area: Rect) {
        self.area = area;
        self.follow();
    }

    /// Advances the status countdown by one frame.
    pub fn tick(&mut self) {
        if let Some(status) = self.status.as_mut() {
            status.frames_left = status.frames_left.saturating_sub(1);
            if status.frames_left == 0 {
                self.status = None;
            }
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            frames_left: self.status_frames,
        });
    }

    pub fn rebuild(&mut self) {
        self.sessions = self.index.scan(&self.store, self.sort);
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = filter(&self.sessions, &self.query);
        let visible: BTreeSet<&str> = self.filtered.iter().map(|s| s.id.as_str()).collect();
        self.marked.retain(|id| visible.contains(id.as_str()));
        self.cursor.clamp(self.filtered.len());
        self.follow();
    }

    fn follow(&mut self) {
        let visible = self.page_size();
        self.cursor.follow(visible);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Exit> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Exit::Quit);
        }

        let (next, exit) = match std::mem::take(&mut self.mode) {
            Mode::Normal => self.on_normal(key),
            Mode::Search => self.on_search(key),
            Mode::TagEdit { input } => self.on_tag_edit(input, key),
            Mode::DeleteConfirm { label, targets } => self.on_delete_confirm(label, targets, key),
            Mode::DeleteEmptyConfirm { targets } => self.on_delete_empty_confirm(targets, key),
            Mode::NewSession { input } => self.on_new_session(input, key),
            Mode::LaunchOptions(opts) => self.on_launch_options(opts, key),
            Mode::Help => (Mode::Normal, None),
        };
        self.mode = next;
        exit
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.mode != Mode::Normal {
            return;
        }
        let len = self.filtered.len();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(list) = layout::compute(self.area).map(|l| l.list) else {
                    return;
                };
                if mouse.row >= list.y && mouse.row < list.bottom() {
                    let idx = self.cursor.scroll() + (mouse.row - list.y) as usize;
                    if idx < len {
                        self.cursor.select(idx, len);
                    }
                }
            }
            MouseEventKind::ScrollUp => self.cursor.up(WHEEL_ROWS),
            MouseEventKind::ScrollDown => self.cursor.down(WHEEL_ROWS, len),
            _ => return,
        }
        self.follow();
    }

    fn navigate(&mut self, key: KeyEvent) -> bool {
        let len = self.filtered.len();
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Up if shift => self.cursor.up(JUMP_ROWS),
            KeyCode::Down if shift => self.cursor.down(JUMP_ROWS, len),
            KeyCode::Up | KeyCode::Char('k') => self.cursor.up(1),
            KeyCode::Down | KeyCode::Char('j') => self.cursor.down(1, len),
            KeyCode::PageUp => self.cursor.up(self.page_size()),
            KeyCode::PageDown => self.cursor.down(self.page_size(), len),
            KeyCode::Home | KeyCode::Char('g') => self.cursor.first(),
            KeyCode::End | KeyCode::Char('G') => self.cursor.last(len),
            _ => return false,
        }
        self.follow();
        true
    }

    fn on_normal(&mut self, key: KeyEvent) -> Outcome {
        if self.navigate(key) {
            return (Mode::Normal, None);
        }

        match key.code {
            KeyCode::Char('q') => return (Mode::Normal, Some(Exit::Quit)),
            KeyCode::Esc => {
                if self.query.is_empty() {
                    return (Mode::Normal, Some(Exit::Quit));
                }
                self.query.clear();
                self.refilter();
            }
            KeyCode::Enter => {
                if let Some(s) = self.selected() {
                    return (Mode::Normal, Some(resume(s, Vec::new())));
                }
            }
            KeyCode::Char('R') => {
                if let Some(s) = self.sessions.iter().max_by_key(|s| s.modified) {
                    return (Mode::Normal, Some(resume(s, Vec::new())));
                }
                self.set_status("No sessions to resume");
            }
            KeyCode::Char('o') => {
                if self.selected().is_some() {
                    return (Mode::LaunchOptions(LaunchOptions::default()), None);
                }
                self.set_status("No session selected");
            }
            KeyCode::Char(' ') => self.toggle_mark(),
            KeyCode::Char('u') => {
                if !self.marked.is_empty() {
                    self.marked.clear();
                    self.set_status("Cleared all marks");
                }
            }
            KeyCode::Char('p') => self.toggle_pin(),
            KeyCode::Char('t') => {
                if self.selected().is_some() {
                    return (Mode::TagEdit { input: String::new() }, None);
                }
            }
            KeyCode::Char('T') => self.untag(),
            KeyCode::Char('d') => {
                if !self.marked.is_empty() {
                    let targets: Vec<Session> = self
                        .filtered
                        .iter()
                        .filter(|s| self.marked.contains(&s.id))
                        .cloned()
                        .collect();
                    let label = format!("{} marked sessions", targets.len());
                    return (Mode::DeleteConfirm { label, targets }, None);
                }
                if let Some(s) = self.selected() {
                    let label = match s.tag.as_deref() {
                        Some(tag) => tag.to_string(),
                        None => s.label().chars().take(40).collect(),
                    };
                    let targets = vec![s.clone()];
                    return (Mode::DeleteConfirm { label, targets }, None);
                }
            }
            KeyCode::Char('D') => {
                let targets: Vec<Session> =
                    self.sessions.iter().filter(|s| s.is_empty()).cloned().collect();
                if !targets.is_empty() {
                    return (Mode::DeleteEmptyConfirm { targets }, None);
                }
                self.set_status("No empty sessions to delete");
            }
            KeyCode::Char('n') => return (Mode::NewSession { input: String::new() }, None),
            KeyCode::Char('e') => return (Mode::Normal, Some(Exit::Launch(ExitAction::Ephemeral))),
            KeyCode::Char('/') => return (Mode::Search, None),
            KeyCode::Char('?') => return (Mode::Help, None),
            KeyCode::Char('r') | KeyCode::F(5) => {
                self.rebuild();
                self.set_status("Refreshed session list");
            }
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.rebuild();
                self.set_status(format!("Sort: {}", self.sort.label()));
            }
            _ => {}
        }
        (Mode::Normal, None)
    }

    fn on_search(&mut self, key: KeyEvent) -> Outcome {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => return (Mode::Normal, None),
            KeyCode::Up | KeyCode::Down => {
                self.navigate(key);
            }
            KeyCode::Backspace => {
                if self.query.pop().is_some() {
                    self.refilter();
                }
            }
            _ if typed(key).is_some() => {
                self.query.extend(typed(key));
                self.refilter();
            }
            _ => {}
        }
        (Mode::Search, None)
    }

    fn on_tag_edit(&mut self, mut input: String, key: KeyEvent) -> Outcome {
        match key.code {
            KeyCode::Esc => return (Mode::Normal, None),
            KeyCode::Enter => {
                let tag = input.trim();
                if !tag.is_empty()
                    && let Some(id) = self.selected().map(|s| s.id.clone())
                {
                    match self.store.set_tag(&id, tag) {
                        Ok(()) => {
                            tracing::info!("tagged {id} as {tag}");
                            self.set_status(format!("Tagged: [{tag}]"));
                        }
                        Err(err) => self.store_failed(err),
                    }
                    self.rebuild();
                }
                return (Mode::Normal, None);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            _ => input.extend(typed(key)),
        }
        (Mode::TagEdit { input }, None)
    }

    fn on_delete_confirm(&mut self, label: String, targets: Vec<Session>, key: KeyEvent) -> Outcome {
        if !is_yes(key) {
            return (Mode::Normal, None);
        }
        let bulk = !self.marked.is_empty();
        let removed = delete_all(&self.store, &targets);
        match targets.as_slice() {
            [single] if !bulk && removed == 1 => {
                self.set_status(format!("Deleted: {}", single.handle()))
            }
            _ if removed == 0 => self.set_status(format!("Delete failed: {label}")),
            _ => {
                let plural = if removed == 1 { "" } else { "s" };
                self.set_status(format!("Deleted {removed} session{plural}"));
            }
        }
        self.marked.clear();
        self.rebuild();
        (Mode::Normal, None)
    }

    fn on_delete_empty_confirm(&mut self, targets: Vec<Session>, key: KeyEvent) -> Outcome {
        if is_yes(key) {
            let removed = delete_all(&self.store, &targets);
            let plural = if removed == 1 { "" } else { "s" };
            self.set_status(format!("Deleted {removed} empty session{plural}"));
            self.rebuild();
        }
        (Mode::Normal, None)
    }

    fn on_new_session(&mut self, mut input: String, key: KeyEvent) -> Outcome {
        match key.code {
            KeyCode::Esc => return (Mode::Normal, None),
            KeyCode::Enter => {
                let name = input.trim();
                if name.is_empty() {
                    return (Mode::Normal, None);
                }
                let action = ExitAction::NewSession {
                    name: name.to_string(),
                };
                return (Mode::Normal, Some(Exit::Launch(action)));
            }
            KeyCode::Backspace => {
                input.pop();
            }
            _ => input.extend(typed(key)),
        }
        (Mode::NewSession { input }, None)
    }

    fn on_launch_options(&mut self, mut opts: LaunchOptions, key: KeyEvent) -> Outcome {
        if opts.editing {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => opts.editing = false,
                KeyCode::Backspace => {
                    opts.custom.pop();
                }
                _ => opts.custom.extend(typed(key)),
            }
            return (Mode::LaunchOptions(opts), None);
        }

        match key.code {
            KeyCode::Esc => return (Mode::Normal, None),
            KeyCode::Up | KeyCode::Char('k') => opts.row_up(),
            KeyCode::Down | KeyCode::Char('j') => opts.row_down(),
            KeyCode::Char(' ') | KeyCode::Enter => match opts.row {
                ROW_CUSTOM => opts.editing = true,
                ROW_LAUNCH => {
                    return match self.selected() {
                        Some(s) => (Mode::Normal, Some(resume(s, opts.args()))),
                        None => (Mode::Normal, None),
                    };
                }
                _ => opts.toggle(),
            },
            _ => {}
        }
        (Mode::LaunchOptions(opts), None)
    }

    fn toggle_mark(&mut self) {
        let Some(id) = self.selected().map(|s| s.id.clone()) else {
            return;
        };
        if !self.marked.remove(&id) {
            self.marked.insert(id);
        }
        self.cursor.down(1, self.filtered.len());
        self.follow();
    }

    fn toggle_pin(&mut self) {
        if !self.marked.is_empty() {
            let marked = std::mem::take(&mut self.marked);
            for id in &marked {
                if let Err(err) = self.store.toggle_pin(id) {
                    self.store_failed(err);
                    self.rebuild();
                    return;
                }
            }
            let plural = if marked.len() == 1 { "" } else { "s" };
            self.set_status(format!("Toggled pin for {} session{plural}", marked.len()));
            self.rebuild();
            return;
        }

        let Some((id, handle)) = self.selected().map(|s| (s.id.clone(), s.handle().to_string()))
        else {
            return;
        };
        match self.store.toggle_pin(&id) {
            Ok(true) => self.set_status(format!("★ Pinned: {handle}")),
            Ok(false) => self.set_status(format!("Unpinned: {handle}")),
            Err(err) => self.store_failed(err),
        }
        self.rebuild();
    }

    fn untag(&mut self) {
        let Some(s) = self.selected() else {
            return;
        };
        if s.tag.is_none() {
            self.set_status("No tag to remove");
            return;
        }
        let (id, short) = (s.id.clone(), s.short_id().to_string());
        match self.store.remove_tag(&id) {
            Ok(()) => self.set_status(format!("Removed tag from: {short}")),
            Err(err) => self.store_failed(err),
        }
        self.rebuild();
    }

    fn store_failed(&mut self, err: anyhow::Error) {
        tracing::warn!("store write failed: {err:#}");
        self.set_status(format!("Could not save: {err}"));
    }
}

fn resume(session: &Session, extra_args: Vec<String>) -> Exit {
    Exit::Launch(ExitAction::Resume {
        session_id: session.id.clone(),
        working_dir: session.cwd.clone(),
        extra_args,
    })
}

/// The character a key types into a text buffer, if any.
fn typed(key: KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(ch)
        }
        _ => None,
    }
}

fn is_yes(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'))
}

fn delete_session(store: &Store, session: &Session) -> anyhow::Result<()> {
    match fs::remove_file(&session.path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    store.forget(&session.id)?;
    tracing::info!("deleted session {}", session.id);
    Ok(())
}

/// Deletes every target, logging failures, and returns how many went.
fn delete_all(store: &Store, targets: &[Session]) -> usize {
    let mut removed = 0;
    for target in targets {
        match delete_session(store, target) {
            Ok(()) => removed += 1,
            Err(err) => tracing::warn!("failed to delete {}: {err:#}", target.id),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use super::*;

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        app: App,
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ch(c: char) -> KeyEvent {
        key(KeyCode::Char(c))
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(app.handle_key(ch(c)).is_none());
        }
    }

    fn write_log(root: &Path, project: &str, id: &str, body: &str) {
        let dir = root.join(project);
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join(format!("{id}.jsonl")), body).expect("write");
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path().join("projects");
        write_log(
            &root,
            "-srv-api",
            "s-api",
            r#"{"type":"user","cwd":"/srv/api","message":"fix the login bug"}"#,
        );
        write_log(
            &root,
            "-srv-web",
            "s-web",
            r#"{"type":"summary","summary":"Landing page"}"#,
        );
        write_log(&root, "-srv-web", "s-empty-1", "");
        write_log(&root, "-srv-web", "s-empty-2", "{broken");
        let store = Store::new(dir.path().join("state"));
        let index = SessionIndex::new(&root, None);
        let mut app = App::new(index, store, SortMode::Date, 3);
        app.fit_to(Rect::new(0, 0, 100, 30));
        Fixture {
            _dir: dir,
            root,
            app,
        }
    }

    fn select_id(app: &mut App, id: &str) {
        let idx = app
            .filtered()
            .iter()
            .position(|s| s.id == id)
            .expect("session present");
        app.cursor.select(idx, app.filtered.len());
    }

    #[test]
    fn search_filters_live_and_cancel_keeps_query() {
        let mut f = fixture();
        let app = &mut f.app;
        assert!(app.handle_key(ch('/')).is_none());
        assert_eq!(app.mode(), &Mode::Search);
        type_str(app, "LOGIN");
        assert_eq!(app.filtered().len(), 1);
        assert_eq!(app.filtered()[0].id, "s-api");

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.query(), "LOGI");

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.mode(), &Mode::Normal);
        assert_eq!(app.query(), "LOGI");
        assert_eq!(app.filtered().len(), 1);

        assert!(app.handle_key(key(KeyCode::Esc)).is_none());
        assert_eq!(app.query(), "");
        assert_eq!(app.filtered().len(), 4);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Some(Exit::Quit));
    }

    #[test]
    fn search_matches_working_directory() {
        let mut f = fixture();
        let app = &mut f.app;
        app.handle_key(ch('/'));
        type_str(app, "srv/api");
        assert_eq!(app.filtered().len(), 1);
        assert_eq!(app.selected().map(|s| s.id.as_str()), Some("s-api"));
    }

    #[test]
    fn enter_resumes_selected_session() {
        let mut f = fixture();
        select_id(&mut f.app, "s-api");
        let exit = f.app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            exit,
            Some(Exit::Launch(ExitAction::Resume {
                session_id: String::from("s-api"),
                working_dir: String::from("/srv/api"),
                extra_args: Vec::new(),
            }))
        );
    }

    #[test]
    fn tag_edit_sets_tag_and_empty_confirm_keeps_existing() {
        let mut f = fixture();
        let app = &mut f.app;
        select_id(app, "s-web");
        app.handle_key(ch('t'));
        assert_eq!(app.mode(), &Mode::TagEdit { input: String::new() });
        type_str(app, "  launch  ");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode(), &Mode::Normal);
        assert_eq!(app.store().tags().get("s-web").map(String::as_str), Some("launch"));

        select_id(app, "s-web");
        app.handle_key(ch('t'));
        type_str(app, "   ");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode(), &Mode::Normal);
        assert_eq!(app.store().tags().get("s-web").map(String::as_str), Some("launch"));

        select_id(app, "s-web");
        app.handle_key(ch('t'));
        type_str(app, "other");
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.store().tags().get("s-web").map(String::as_str), Some("launch"));
    }

    #[test]
    fn untag_without_tag_reports_status() {
        let mut f = fixture();
        let app = &mut f.app;
        select_id(app, "s-api");
        app.handle_key(ch('T'));
        assert_eq!(app.status(), Some("No tag to remove"));

        app.store().set_tag("s-api", "x").expect("tag");
        app.rebuild();
        select_id(app, "s-api");
        app.handle_key(ch('T'));
        assert!(app.store().tags().is_empty());
        assert_eq!(app.mode(), &Mode::Normal);
    }

    #[test]
    fn pin_moves_session_to_top() {
        let mut f = fixture();
        let app = &mut f.app;
        let last = app.filtered().last().map(|s| s.id.clone()).expect("sessions");
        select_id(app, &last);
        app.handle_key(ch('p'));
        assert_eq!(app.filtered()[0].id, last);
        assert!(app.filtered()[0].pinned);
    }

    #[test]
    fn delete_requires_explicit_yes() {
        let mut f = fixture();
        let app = &mut f.app;
        select_id(app, "s-api");
        app.handle_key(ch('d'));
        assert!(matches!(app.mode(), Mode::DeleteConfirm { label, .. } if label == "fix the login bug"));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode(), &Mode::Normal);
        assert_eq!(app.sessions().len(), 4);

        select_id(app, "s-api");
        app.handle_key(ch('d'));
        app.handle_key(ch('y'));
        assert_eq!(app.sessions().len(), 3);
        assert!(!f.root.join("-srv-api").join("s-api.jsonl").exists());
    }

    #[test]
    fn delete_empty_removes_exactly_the_counted_sessions() {
        let mut f = fixture();
        let app = &mut f.app;
        app.handle_key(ch('D'));
        let Mode::DeleteEmptyConfirm { targets } = app.mode() else {
            panic!("expected confirmation, got {:?}", app.mode());
        };
        let mut ids: Vec<&str> = targets.iter().map(|s| s.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["s-empty-1", "s-empty-2"]);

        app.handle_key(ch('y'));
        assert_eq!(app.status(), Some("Deleted 2 empty sessions"));
        assert_eq!(app.sessions().len(), 2);
        assert!(app.sessions().iter().all(|s| !s.is_empty()));

        app.handle_key(ch('D'));
        assert_eq!(app.mode(), &Mode::Normal);
        assert_eq!(app.status(), Some("No empty sessions to delete"));
    }

    #[test]
    fn new_session_emits_trimmed_name_and_ignores_blank() {
        let mut f = fixture();
        let app = &mut f.app;
        app.handle_key(ch('n'));
        type_str(app, "  ");
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert_eq!(app.mode(), &Mode::Normal);

        app.handle_key(ch('n'));
        type_str(app, " spike ");
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Some(Exit::Launch(ExitAction::NewSession {
                name: String::from("spike")
            }))
        );
    }

    #[test]
    fn ephemeral_exits_immediately() {
        let mut f = fixture();
        assert_eq!(
            f.app.handle_key(ch('e')),
            Some(Exit::Launch(ExitAction::Ephemeral))
        );
    }

    #[test]
    fn launch_options_build_resume_arguments() {
        let mut f = fixture();
        let app = &mut f.app;
        select_id(app, "s-api");
        app.handle_key(ch('o'));
        assert_eq!(app.mode(), &Mode::LaunchOptions(LaunchOptions::default()));

        app.handle_key(ch(' '));
        app.handle_key(ch(' '));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(ch(' '));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        type_str(app, "--foo bar");
        app.handle_key(key(KeyCode::Esc));
        let Mode::LaunchOptions(opts) = app.mode() else {
            panic!("left launch options early");
        };
        assert!(!opts.editing);
        assert_eq!(opts.custom, "--foo bar");

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        let exit = app.handle_key(ch(' '));
        assert_eq!(
            exit,
            Some(Exit::Launch(ExitAction::Resume {
                session_id: String::from("s-api"),
                working_dir: String::from("/srv/api"),
                extra_args: vec![
                    String::from("--model"),
                    String::from("claude-sonnet-4-5-20250929"),
                    String::from("--verbose"),
                    String::from("--foo"),
                    String::from("bar"),
                ],
            }))
        );
    }

    #[test]
    fn launch_options_cancel_has_no_side_effect() {
        let mut f = fixture();
        let app = &mut f.app;
        app.handle_key(ch('o'));
        app.handle_key(ch(' '));
        assert!(app.handle_key(key(KeyCode::Esc)).is_none());
        assert_eq!(app.mode(), &Mode::Normal);
        app.handle_key(ch('o'));
        assert_eq!(app.mode(), &Mode::LaunchOptions(LaunchOptions::default()));
    }

    #[test]
    fn help_closes_on_any_key() {
        let mut f = fixture();
        f.app.handle_key(ch('?'));
        assert_eq!(f.app.mode(), &Mode::Help);
        assert!(f.app.handle_key(ch('q')).is_none());
        assert_eq!(f.app.mode(), &Mode::Normal);
    }

    #[test]
    fn ctrl_c_quits_from_any_mode() {
        let mut f = fixture();
        f.app.handle_key(ch('n'));
        let exit = f
            .app
            .handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(exit, Some(Exit::Quit));
    }

    #[test]
    fn status_expires_after_configured_frames() {
        let mut f = fixture();
        f.app.set_status("hello");
        f.app.tick();
        f.app.tick();
        assert_eq!(f.app.status(), Some("hello"));
        f.app.tick();
        assert_eq!(f.app.status(), None);
    }

    #[test]
    fn sort_cycles_and_reports_mode() {
        let mut f = fixture();
        f.app.handle_key(ch('s'));
        assert_eq!(f.app.sort(), SortMode::Name);
        assert_eq!(f.app.status(), Some("Sort: Name"));
        assert_eq!(f.app.filtered()[0].label(), "(empty session)");
    }

    #[test]
    fn resume_most_recent_ignores_filter() {
        let mut f = fixture();
        let newest = f
            .app
            .sessions()
            .iter()
            .max_by_key(|s| s.modified)
            .map(|s| s.id.clone())
            .expect("sessions");
        f.app.handle_key(ch('/'));
        type_str(&mut f.app, "no such session");
        f.app.handle_key(key(KeyCode::Enter));
        assert!(f.app.filtered().is_empty());
        let Some(Exit::Launch(ExitAction::Resume { session_id, .. })) = f.app.handle_key(ch('R'))
        else {
            panic!("expected resume");
        };
        assert_eq!(session_id, newest);
    }

    #[test]
    fn mouse_selects_rows_and_wheel_moves_cursor() {
        let mut f = fixture();
        let app = &mut f.app;
        let list = layout::compute(app.area).expect("layout").list;
        let click = |row: u16, kind: MouseEventKind| MouseEvent {
            kind,
            column: 10,
            row,
            modifiers: KeyModifiers::NONE,
        };

        app.handle_mouse(click(list.y + 2, MouseEventKind::Down(MouseButton::Left)));
        assert_eq!(app.cursor().selected(), 2);
        app.handle_mouse(click(list.y + 40, MouseEventKind::Down(MouseButton::Left)));
        assert_eq!(app.cursor().selected(), 2);
        app.handle_mouse(click(0, MouseEventKind::ScrollUp));
        assert_eq!(app.cursor().selected(), 0);
        app.handle_mouse(click(0, MouseEventKind::ScrollDown));
        assert_eq!(app.cursor().selected(), 3);

        app.handle_key(ch('?'));
        app.handle_mouse(click(0, MouseEventKind::ScrollUp));
        assert_eq!(app.cursor().selected(), 3);
    }

    #[test]
    fn space_marks_and_advances() {
        let mut f = fixture();
        let app = &mut f.app;
        let first = app.filtered()[0].id.clone();
        app.handle_key(ch(' '));
        assert!(app.marked().contains(&first));
        assert_eq!(app.cursor().selected(), 1);

        app.handle_key(key(KeyCode::Up));
        app.handle_key(ch(' '));
        assert!(app.marked().is_empty());

        app.handle_key(ch(' '));
        app.handle_key(ch('u'));
        assert!(app.marked().is_empty());
        assert_eq!(app.status(), Some("Cleared all marks"));
    }

    #[test]
    fn marks_outside_the_filter_are_dropped() {
        let mut f = fixture();
        let app = &mut f.app;
        select_id(app, "s-api");
        app.handle_key(ch(' '));
        select_id(app, "s-web");
        app.handle_key(ch(' '));
        assert_eq!(app.marked().len(), 2);

        app.handle_key(ch('/'));
        type_str(app, "login");
        assert_eq!(app.marked().iter().collect::<Vec<_>>(), vec!["s-api"]);
    }

    #[test]
    fn pin_applies_to_every_marked_session() {
        let mut f = fixture();
        let app = &mut f.app;
        for id in ["s-api", "s-empty-1"] {
            select_id(app, id);
            app.handle_key(ch(' '));
        }
        app.handle_key(ch('p'));
        assert_eq!(app.status(), Some("Toggled pin for 2 sessions"));
        assert!(app.marked().is_empty());

        let mut pins = app.store().pins();
        pins.sort();
        assert_eq!(pins, vec!["s-api", "s-empty-1"]);
        let pinned: Vec<&str> = app
            .filtered()
            .iter()
            .take(2)
            .filter(|s| s.pinned)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(pinned.len(), 2);
    }

    #[test]
    fn delete_removes_every_marked_session() {
        let mut f = fixture();
        let app = &mut f.app;
        for id in ["s-api", "s-web"] {
            select_id(app, id);
            app.handle_key(ch(' '));
        }
        app.handle_key(ch('d'));
        let Mode::DeleteConfirm { label, targets } = app.mode() else {
            panic!("expected confirmation, got {:?}", app.mode());
        };
        assert_eq!(label, "2 marked sessions");
        assert_eq!(targets.len(), 2);

        app.handle_key(ch('Y'));
        assert_eq!(app.status(), Some("Deleted 2 sessions"));
        assert!(app.marked().is_empty());
        let left: Vec<&str> = app.sessions().iter().map(|s| s.id.as_str()).collect();
        assert!(!left.contains(&"s-api") && !left.contains(&"s-web"));
        assert!(!f.root.join("-srv-api").join("s-api.jsonl").exists());
        assert!(!f.root.join("-srv-web").join("s-web.jsonl").exists());
    }

    #[test]
    fn delete_empty_defaults_to_cancel() {
        let mut f = fixture();
        for cancel in [key(KeyCode::Enter), ch('n'), key(KeyCode::Esc)] {
            f.app.handle_key(ch('D'));
            assert!(matches!(f.app.mode(), Mode::DeleteEmptyConfirm { .. }));
            f.app.handle_key(cancel);
            assert_eq!(f.app.mode(), &Mode::Normal);
        }
        assert_eq!(f.app.sessions().len(), 4);
        assert!(f.root.join("-srv-web").join("s-empty-1.jsonl").exists());
        assert!(f.root.join("-srv-web").join("s-empty-2.jsonl").exists());
    }

    #[test]
    fn page_keys_keep_selection_in_view() {
        let mut f = fixture();
        let app = &mut f.app;
        app.fit_to(Rect::new(0, 0, 80, 14));
        let visible = app.page_size();
        assert_eq!(visible, 2);

        let in_view = |app: &App| {
            let c = app.cursor();
            c.selected() >= c.scroll() && c.selected() < c.scroll() + visible
        };
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.cursor().selected(), 2);
        assert!(in_view(app));
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.cursor().selected(), 3);
        assert!(in_view(app));
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.cursor().selected(), 1);
        assert!(in_view(app));
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.cursor().selected(), 0);
        assert_eq!(app.cursor().scroll(), 0);
    }

    #[test]
    fn modified_keys_do_not_type_into_buffers() {
        let mut f = fixture();
        let app = &mut f.app;
        let alt = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::ALT);
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);

        app.handle_key(ch('t'));
        app.handle_key(alt('x'));
        app.handle_key(ctrl('w'));
        type_str(app, "ok");
        assert_eq!(app.mode(), &Mode::TagEdit { input: String::from("ok") });
        app.handle_key(key(KeyCode::Esc));

        app.handle_key(ch('n'));
        app.handle_key(ctrl('u'));
        type_str(app, "Ab");
        app.handle_key(KeyEvent::new(KeyCode::Char('C'), KeyModifiers::SHIFT));
        assert_eq!(app.mode(), &Mode::NewSession { input: String::from("AbC") });
        app.handle_key(key(KeyCode::Esc));

        app.handle_key(ch('o'));
        for _ in 0..4 {
            app.handle_key(key(KeyCode::Down));
        }
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(alt('b'));
        type_str(app, "-x");
        let Mode::LaunchOptions(opts) = app.mode() else {
            panic!("left launch options");
        };
        assert_eq!(opts.custom, "-x");

        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Esc));
        app.handle_key(ch('/'));
        app.handle_key(alt('z'));
        assert_eq!(app.query(), "");
    }

    #[test]
    fn viewport_follows_selection() {
        let mut f = fixture();
        let app = &mut f.app;
        app.fit_to(Rect::new(0, 0, 80, 14));
        let visible = app.page_size();
        assert!(visible < app.filtered().len());
        app.handle_key(key(KeyCode::End));
        let c = app.cursor();
        assert_eq!(c.selected(), app.filtered().len() - 1);
        assert!(c.selected() >= c.scroll() && c.selected() < c.scroll() + visible);
        app.handle_key(ch('g'));
        assert_eq!(app.cursor().scroll(), 0);
    }
}
