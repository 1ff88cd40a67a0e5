mod field_editor;
mod pager;

pub use field_editor::FieldEditor;
pub use pager::{BATCH_SIZE, FetchOutcome, FetchRequest, SessionPager};

use crate::domain::{
    COLUMNS, QueryCriteria, SessionType, format_timestamp, parse_timestamp,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ResolveEndpoint(#[from] crate::infra::ResolveEndpointError),
}

pub const ROWS_PER_PAGE_CHOICES: [usize; 3] = [5, 10, 25];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormField {
    SessionType,
    User,
    AppName,
    Since,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            Self::SessionType => Self::User,
            Self::User => Self::AppName,
            Self::AppName => Self::Since,
            Self::Since => Self::SessionType,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::SessionType => Self::Since,
            Self::User => Self::SessionType,
            Self::AppName => Self::User,
            Self::Since => Self::AppName,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SessionType => "Session Type",
            Self::User => "User",
            Self::AppName => "App Name",
            Self::Since => "Since (UTC)",
        }
    }
}

#[derive(Clone, Debug)]
pub struct QueryForm {
    pub session_type: SessionType,
    pub user: FieldEditor,
    pub app_name: FieldEditor,
    pub since: FieldEditor,
    pub focus: FormField,
}

impl QueryForm {
    pub fn new() -> Self {
        let default_since = OffsetDateTime::now_utc() - TimeDuration::days(1);
        Self {
            session_type: SessionType::Enter,
            user: FieldEditor::new(),
            app_name: FieldEditor::new(),
            since: FieldEditor::with_text(format_timestamp(default_since)),
            focus: FormField::SessionType,
        }
    }

    pub fn criteria(&self) -> Result<QueryCriteria, String> {
        let Some(since) = parse_timestamp(&self.since.text) else {
            return Err(format!(
                "Invalid since value '{}' (expected YYYY-MM-DD HH:mm:ss).",
                self.since.text.trim()
            ));
        };

        Ok(QueryCriteria {
            session_type: self.session_type,
            user: self.user.text.trim().to_string(),
            app_name: self.app_name.text.trim().to_string(),
            since,
        })
    }

    fn focused_editor(&mut self) -> Option<&mut FieldEditor> {
        match self.focus {
            FormField::SessionType => None,
            FormField::User => Some(&mut self.user),
            FormField::AppName => Some(&mut self.app_name),
            FormField::Since => Some(&mut self.since),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum View {
    Query,
    Results,
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub form: QueryForm,
    pub pager: SessionPager,
    pub view: View,
    pub selected_column: usize,
    pub notice: Option<String>,
    pub help_open: bool,
}

impl AppModel {
    pub fn new() -> Self {
        Self {
            form: QueryForm::new(),
            pager: SessionPager::new(),
            view: View::Query,
            selected_column: 0,
            notice: None,
            help_open: false,
        }
    }
}

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Paste(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    Fetch(FetchRequest),
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Paste(text) => update_on_paste(model, text),
    }
}

fn update_on_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    model.notice = None;

    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return (model, AppCommand::Quit);
    }

    if model.help_open {
        if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?')) {
            model.help_open = false;
        }
        return (model, AppCommand::None);
    }

    if key.code == KeyCode::F(1) {
        model.help_open = true;
        return (model, AppCommand::None);
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
        return submit(model);
    }

    match model.view {
        View::Query => update_query_view(model, key),
        View::Results => update_results_view(model, key),
    }
}

fn update_query_view(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => return (model, AppCommand::Quit),
        KeyCode::Enter => return submit(model),
        KeyCode::Down | KeyCode::Tab => {
            model.form.focus = model.form.focus.next();
            return (model, AppCommand::None);
        }
        KeyCode::Up | KeyCode::BackTab => {
            model.form.focus = model.form.focus.prev();
            return (model, AppCommand::None);
        }
        _ => {}
    }

    if model.form.focus == FormField::SessionType {
        if matches!(
            key.code,
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
        ) {
            model.form.session_type = model.form.session_type.toggle();
        }
        return (model, AppCommand::None);
    }

    let has_control = key.modifiers.contains(KeyModifiers::CONTROL);
    if let Some(editor) = model.form.focused_editor() {
        match key.code {
            KeyCode::Char(ch) if !has_control => editor.insert_char(ch),
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Left => editor.move_left(),
            KeyCode::Right => editor.move_right(),
            KeyCode::Home => editor.move_home(),
            KeyCode::End => editor.move_end(),
            _ => {}
        }
    }

    (model, AppCommand::None)
}

fn update_results_view(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('e') => {
            model.view = View::Query;
            (model, AppCommand::None)
        }
        KeyCode::Char('q') => (model, AppCommand::Quit),
        KeyCode::Char('?') => {
            model.help_open = true;
            (model, AppCommand::None)
        }
        KeyCode::Left | KeyCode::Char('h') => {
            let page = model.pager.page();
            if page == 0 {
                return (model, AppCommand::None);
            }
            page_command(model, page - 1)
        }
        KeyCode::Right | KeyCode::Char('l') => {
            let next = model.pager.page() + 1;
            let next_start = next.saturating_mul(model.pager.rows_per_page());
            if model.pager.exhausted() && next_start >= model.pager.known_count() {
                model.notice = Some("No more pages.".to_string());
                return (model, AppCommand::None);
            }
            page_command(model, next)
        }
        KeyCode::Tab => {
            model.selected_column = (model.selected_column + 1) % COLUMNS.len();
            (model, AppCommand::None)
        }
        KeyCode::BackTab => {
            model.selected_column = (model.selected_column + COLUMNS.len() - 1) % COLUMNS.len();
            (model, AppCommand::None)
        }
        KeyCode::Enter | KeyCode::Char('s') => {
            model.pager.change_sort(COLUMNS[model.selected_column]);
            (model, AppCommand::None)
        }
        KeyCode::Char('r') => {
            let current = model.pager.rows_per_page();
            let position = ROWS_PER_PAGE_CHOICES
                .iter()
                .position(|&choice| choice == current)
                .unwrap_or(0);
            let next = ROWS_PER_PAGE_CHOICES[(position + 1) % ROWS_PER_PAGE_CHOICES.len()];
            model.pager.change_rows_per_page(next);
            (model, AppCommand::None)
        }
        _ => (model, AppCommand::None),
    }
}

fn page_command(mut model: AppModel, page: usize) -> (AppModel, AppCommand) {
    match model.pager.request_page(page) {
        Some(request) => (model, AppCommand::Fetch(request)),
        None => (model, AppCommand::None),
    }
}

fn submit(mut model: AppModel) -> (AppModel, AppCommand) {
    match model.form.criteria() {
        Ok(criteria) => {
            let request = model.pager.submit_query(criteria);
            model.view = View::Results;
            (model, AppCommand::Fetch(request))
        }
        Err(message) => {
            model.notice = Some(message);
            (model, AppCommand::None)
        }
    }
}

fn update_on_paste(mut model: AppModel, text: String) -> (AppModel, AppCommand) {
    if model.view == View::Query {
        if let Some(editor) = model.form.focused_editor() {
            editor.insert_text(&text);
        }
    }
    (model, AppCommand::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionRecord, SortKey};

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn model_with_since(since: &str) -> AppModel {
        let mut model = AppModel::new();
        model.form.since = FieldEditor::with_text(since.to_string());
        model
    }

    fn record(session_id: i64) -> SessionRecord {
        SessionRecord {
            session_id,
            session_type: SessionType::Enter,
            user: "alice".to_string(),
            source_ip: "10.0.0.1".to_string(),
            app_name: "console".to_string(),
            proc_name: "web".to_string(),
            instance_no: 0,
            node_ip: "192.168.1.2".to_string(),
            status: "running".to_string(),
            created_at: session_id,
            ended_at: 0,
        }
    }

    #[test]
    fn enter_submits_and_switches_to_results() {
        let model = model_with_since("2026-08-01 00:00:00");
        let (model, command) = update(model, key(KeyCode::Enter));
        assert_eq!(model.view, View::Results);
        let AppCommand::Fetch(request) = command else {
            panic!("expected a fetch command");
        };
        assert_eq!(request.offset, 0);
        assert_eq!(request.limit, BATCH_SIZE);
        assert!(model.pager.loading());
    }

    #[test]
    fn invalid_since_blocks_submission_with_a_notice() {
        let model = model_with_since("tomorrow-ish");
        let (model, command) = update(model, key(KeyCode::Enter));
        assert_eq!(model.view, View::Query);
        assert_eq!(command, AppCommand::None);
        assert!(model.notice.is_some());
        assert!(!model.pager.loading());
    }

    #[test]
    fn typed_characters_land_in_the_focused_field() {
        let mut model = model_with_since("2026-08-01 00:00:00");
        model.form.focus = FormField::User;
        let (model, _) = update(model, key(KeyCode::Char('a')));
        let (model, _) = update(model, key(KeyCode::Char('l')));
        assert_eq!(model.form.user.text, "al");
        assert_eq!(model.form.app_name.text, "");
    }

    #[test]
    fn session_type_field_toggles_with_space() {
        let mut model = AppModel::new();
        model.form.focus = FormField::SessionType;
        let (model, _) = update(model, key(KeyCode::Char(' ')));
        assert_eq!(model.form.session_type, SessionType::Attach);
    }

    #[test]
    fn sort_key_follows_the_selected_column() {
        let model = model_with_since("2026-08-01 00:00:00");
        let (mut model, _) = update(model, key(KeyCode::Enter));
        model
            .pager
            .apply_fetch(1, FetchOutcome::Batch(vec![record(1)]));

        let (model, _) = update(model, key(KeyCode::Tab));
        let (model, _) = update(model, key(KeyCode::Tab));
        let (model, _) = update(model, key(KeyCode::Char('s')));
        assert_eq!(model.pager.sort_key(), SortKey::User);
    }

    #[test]
    fn next_page_is_blocked_after_exhaustion() {
        let model = model_with_since("2026-08-01 00:00:00");
        let (mut model, _) = update(model, key(KeyCode::Enter));
        model
            .pager
            .apply_fetch(1, FetchOutcome::Batch(vec![record(1), record(2)]));
        assert!(model.pager.exhausted());

        let (model, command) = update(model, key(KeyCode::Right));
        assert_eq!(command, AppCommand::None);
        assert_eq!(model.pager.page(), 0);
        assert!(model.notice.is_some());
    }

    #[test]
    fn rows_per_page_cycles_through_choices() {
        let model = model_with_since("2026-08-01 00:00:00");
        let (model, _) = update(model, key(KeyCode::Enter));
        let (model, _) = update(model, key(KeyCode::Char('r')));
        assert_eq!(model.pager.rows_per_page(), 10);
        let (model, _) = update(model, key(KeyCode::Char('r')));
        assert_eq!(model.pager.rows_per_page(), 25);
        let (model, _) = update(model, key(KeyCode::Char('r')));
        assert_eq!(model.pager.rows_per_page(), 5);
    }

    #[test]
    fn paste_goes_into_the_focused_editor() {
        let mut model = AppModel::new();
        model.form.focus = FormField::AppName;
        let (model, _) = update(model, AppEvent::Paste("con\tsole".to_string()));
        assert_eq!(model.form.app_name.text, "con sole");
    }

    #[test]
    fn escape_leaves_results_but_keeps_the_cache() {
        let model = model_with_since("2026-08-01 00:00:00");
        let (mut model, _) = update(model, key(KeyCode::Enter));
        model
            .pager
            .apply_fetch(1, FetchOutcome::Batch(vec![record(1)]));

        let (model, command) = update(model, key(KeyCode::Esc));
        assert_eq!(model.view, View::Query);
        assert_eq!(command, AppCommand::None);
        assert_eq!(model.pager.known_count(), 1);
    }
}
