use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use saha_shared::api::{CreateTaskRequest, TaskBoard};
use saha_shared::content::{BlockId, BlockType};
use saha_shared::editor::{MoveDirection, SlideMeta, TrainingEditor};
use saha_shared::models::{Role, SlideKind, Task, Training, User, Viewer};
use saha_shared::policy;
use saha_shared::reader::{ContentSource, TrainingReader};
use tokio::sync::mpsc;
use tui_textarea::TextArea;
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, SessionStatus};
use crate::block_form::BlockForm;
use crate::editor::{create_textarea, launch_external_editor, textarea_content, EditorContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    VerifyingAuth,
    Dashboard,
    TaskDetail,
    CreateTask,
    Reader,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VimMode {
    Normal,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Tasks,
    Trainings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskList {
    Inbox,
    Sent,
    Personal,
}

impl TaskList {
    pub const ALL: [TaskList; 3] = [Self::Inbox, Self::Sent, Self::Personal];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Sent => "Sent",
            Self::Personal => "Personal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewTaskField {
    Title,
    Description,
    Assignee,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignee {
    Myself,
    User(User),
    Unit(String),
}

impl Assignee {
    pub fn label(&self) -> String {
        match self {
            Self::Myself => "Myself (personal note)".to_string(),
            Self::User(user) => format!("{} ({})", user.display_name, user.role.as_str()),
            Self::Unit(unit) => format!("Unit: {}", unit),
        }
    }
}

/// Who `me` may address: always themselves, every user the policy allows,
/// and the known units when the role may address units.
pub fn assignee_choices(me: &User, users: &[User]) -> Vec<Assignee> {
    let mut choices = vec![Assignee::Myself];
    let mut units: Vec<String> = me.unit.iter().cloned().collect();

    for user in users.iter().filter(|u| u.uid != me.uid) {
        if policy::can_address(me.role, user.role) {
            choices.push(Assignee::User(user.clone()));
        }
        if let Some(unit) = &user.unit {
            if !units.contains(unit) {
                units.push(unit.clone());
            }
        }
    }

    if policy::can_address_unit(me.role) {
        units.sort();
        choices.extend(units.into_iter().map(Assignee::Unit));
    }
    choices
}

pub struct NewTaskForm {
    pub title: String,
    pub description: TextArea<'static>,
    pub field: NewTaskField,
    pub choices: Vec<Assignee>,
    pub choice: usize,
}

impl NewTaskForm {
    pub fn new(choices: Vec<Assignee>) -> Self {
        Self {
            title: String::new(),
            description: create_textarea("", EditorContext::TaskDescription),
            field: NewTaskField::Title,
            choices,
            choice: 0,
        }
    }

    pub fn assignee(&self) -> Option<&Assignee> {
        self.choices.get(self.choice)
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            NewTaskField::Title => NewTaskField::Description,
            NewTaskField::Description => NewTaskField::Assignee,
            NewTaskField::Assignee => NewTaskField::Title,
        };
    }

    fn previous_field(&mut self) {
        self.field = match self.field {
            NewTaskField::Title => NewTaskField::Assignee,
            NewTaskField::Description => NewTaskField::Title,
            NewTaskField::Assignee => NewTaskField::Description,
        };
    }

    fn cycle_choice(&mut self, forward: bool) {
        let len = self.choices.len();
        if len == 0 {
            return;
        }
        self.choice = if forward {
            (self.choice + 1) % len
        } else {
            (self.choice + len - 1) % len
        };
    }

    pub fn request(&self, me: &User) -> CreateTaskRequest {
        let (assigned_to_user_id, assigned_to_unit) = match self.assignee() {
            Some(Assignee::User(user)) => (Some(user.uid), None),
            Some(Assignee::Unit(unit)) => (None, Some(unit.clone())),
            Some(Assignee::Myself) | None => (Some(me.uid), None),
        };
        CreateTaskRequest {
            title: self.title.trim().to_string(),
            description: textarea_content(&self.description).trim().to_string(),
            assigned_to_user_id,
            assigned_to_unit,
        }
    }
}

pub struct ReaderState {
    pub title: String,
    pub source: ContentSource,
    pub reader: TrainingReader,
    pub scroll: u16,
    /// Highlighted entry while the syllabus popup is open.
    pub syllabus: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPane {
    Slides,
    Blocks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideMetaField {
    Title,
    Duration,
    Kind,
}

pub struct SlideMetaForm {
    pub title: String,
    pub duration: String,
    pub kind: SlideKind,
    pub field: SlideMetaField,
}

impl SlideMetaForm {
    fn to_meta(&self) -> SlideMeta {
        SlideMeta {
            title: self.title.clone(),
            kind: self.kind,
            duration: self.duration.clone(),
        }
    }
}

pub fn next_slide_kind(kind: SlideKind) -> SlideKind {
    match kind {
        SlideKind::Text => SlideKind::Video,
        SlideKind::Video => SlideKind::Quiz,
        SlideKind::Quiz => SlideKind::Text,
    }
}

pub struct EditorState {
    pub training: Training,
    pub editor: TrainingEditor,
    pub pane: EditorPane,
    pub selected_block: usize,
    pub block_form: Option<BlockForm>,
    /// Highlighted type while the "add block" picker is open.
    pub type_picker: Option<usize>,
    pub slide_meta: Option<SlideMetaForm>,
}

impl EditorState {
    fn clamp_selection(&mut self) {
        self.selected_block = self
            .selected_block
            .min(self.editor.blocks().len().saturating_sub(1));
    }

    fn selected_block_id(&self) -> Option<BlockId> {
        self.editor.blocks().get(self.selected_block).map(|b| b.id)
    }
}

/// Destructive actions waiting for a y/n answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    DeleteTask { id: Uuid, title: String },
    DeleteTraining { id: Uuid, title: String },
    DeleteSlide(usize),
    RemoveBlock(BlockId),
    DiscardEdits,
}

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    VerifyAuth,
    AuthSuccess,
    AuthFailed(String),
}

pub struct App {
    pub api: ApiClient,
    pub view: View,
    pub vim_mode: VimMode,

    // Loading state
    pub loading: bool,
    pub loading_message: String,
    pub error_message: Option<String>,

    /// Set after an external editor ran so the main loop repaints fully.
    pub needs_terminal_clear: bool,

    pub user: Option<User>,

    // Login form
    pub login_username: String,
    pub login_password: String,
    pub login_field: InputField,

    // Dashboard
    pub tab: Tab,
    pub board: TaskBoard,
    pub task_list: TaskList,
    pub selected_task: usize,
    pub trainings: Vec<Training>,
    pub selected_training: usize,
    pub new_training_title: Option<String>,

    // Task screens
    pub task_detail: Option<Task>,
    pub completion_note: Option<TextArea<'static>>,
    pub new_task: Option<NewTaskForm>,

    // Training screens
    pub reader: Option<ReaderState>,
    pub editor: Option<EditorState>,

    pub confirm: Option<Confirm>,
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

impl App {
    pub fn new(api: ApiClient, session: SessionStatus) -> Self {
        let (view, remembered) = match session {
            SessionStatus::Active => (View::VerifyingAuth, None),
            SessionStatus::Expired { username } => (View::Login, Some(username)),
            SessionStatus::Missing => (View::Login, None),
        };
        let login_field = if remembered.is_some() {
            InputField::Password
        } else {
            InputField::Username
        };

        Self {
            api,
            view,
            vim_mode: VimMode::Normal,
            loading: false,
            loading_message: String::new(),
            error_message: None,
            needs_terminal_clear: false,
            user: None,
            login_username: remembered.unwrap_or_default(),
            login_password: String::new(),
            login_field,
            tab: Tab::Tasks,
            board: TaskBoard::default(),
            task_list: TaskList::Inbox,
            selected_task: 0,
            trainings: Vec::new(),
            selected_training: 0,
            new_training_title: None,
            task_detail: None,
            completion_note: None,
            new_task: None,
            reader: None,
            editor: None,
            confirm: None,
        }
    }

    pub fn set_loading(&mut self, loading: bool, message: &str) {
        self.loading = loading;
        self.loading_message = message.to_string();
    }

    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    pub fn viewer(&self) -> Option<Viewer> {
        self.user.as_ref().map(Viewer::from)
    }

    pub fn can_manage_trainings(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.role.can_manage_trainings())
    }

    pub fn current_tasks(&self) -> &[Task] {
        match self.task_list {
            TaskList::Inbox => &self.board.inbox,
            TaskList::Sent => &self.board.sent,
            TaskList::Personal => &self.board.personal,
        }
    }

    pub fn get_selected_task(&self) -> Option<&Task> {
        self.current_tasks().get(self.selected_task)
    }

    pub fn get_selected_training(&self) -> Option<&Training> {
        self.trainings.get(self.selected_training)
    }

    /// Addressees (the user, or a member of the unit) complete pending tasks.
    pub fn can_complete(&self, task: &Task) -> bool {
        self.viewer().is_some_and(|v| {
            task.is_pending() && (task.is_assigned_to(&v) || task.is_for_unit_of(&v))
        })
    }

    pub fn can_delete(&self, task: &Task) -> bool {
        self.viewer()
            .is_some_and(|v| task.assigned_by == v.uid || v.role == Role::Admin)
    }

    fn report(&mut self, context: &str, err: ApiError) {
        if matches!(err, ApiError::Unauthorized) {
            tracing::warn!("session rejected by server");
            self.reset_session();
            self.set_error("Session expired, please log in again".to_string());
            return;
        }
        tracing::warn!(error = %err, "{}", context);
        self.set_error(format!("{}: {}", context, err));
    }

    /// Handle key events, returns true if app should quit
    pub async fn handle_key(
        &mut self,
        key: KeyEvent,
        tx: mpsc::Sender<AppEvent>,
    ) -> Result<bool> {
        // Any key dismisses the error popup
        if self.error_message.is_some() {
            self.clear_error();
            return Ok(false);
        }

        if is_ctrl(&key, 'c') {
            return Ok(true);
        }

        if let Some(confirm) = self.confirm.take() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.run_confirmed(confirm).await,
                KeyCode::Char('n') | KeyCode::Esc => {}
                _ => self.confirm = Some(confirm),
            }
            return Ok(false);
        }

        if self.loading {
            return Ok(false);
        }

        match self.view {
            View::Login => self.handle_login_key(key, tx).await,
            View::VerifyingAuth => Ok(false),
            View::Dashboard => self.handle_dashboard_key(key).await,
            View::TaskDetail => {
                self.handle_task_detail_key(key).await;
                Ok(false)
            }
            View::CreateTask => {
                self.handle_create_task_key(key).await;
                Ok(false)
            }
            View::Reader => {
                self.handle_reader_key(key);
                Ok(false)
            }
            View::Editor => {
                self.handle_editor_key(key).await;
                Ok(false)
            }
        }
    }

    // ============ Login ============

    async fn handle_login_key(
        &mut self,
        key: KeyEvent,
        tx: mpsc::Sender<AppEvent>,
    ) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') if self.vim_mode == VimMode::Normal => return Ok(true),
            KeyCode::Esc => {
                self.vim_mode = VimMode::Normal;
            }
            KeyCode::Char('i') if self.vim_mode == VimMode::Normal => {
                self.vim_mode = VimMode::Insert;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.login_field = match self.login_field {
                    InputField::Username => InputField::Password,
                    InputField::Password => InputField::Username,
                };
            }
            KeyCode::Char('j') | KeyCode::Down if self.vim_mode == VimMode::Normal => {
                self.login_field = InputField::Password;
            }
            KeyCode::Char('k') | KeyCode::Up if self.vim_mode == VimMode::Normal => {
                self.login_field = InputField::Username;
            }
            KeyCode::Enter => {
                if !self.login_username.is_empty() && !self.login_password.is_empty() {
                    self.do_login(tx).await;
                }
            }
            KeyCode::Char(c) if self.vim_mode == VimMode::Insert => match self.login_field {
                InputField::Username => self.login_username.push(c),
                InputField::Password => self.login_password.push(c),
            },
            KeyCode::Backspace if self.vim_mode == VimMode::Insert => {
                match self.login_field {
                    InputField::Username => self.login_username.pop(),
                    InputField::Password => self.login_password.pop(),
                };
            }
            _ => {}
        }

        Ok(false)
    }

    async fn do_login(&mut self, tx: mpsc::Sender<AppEvent>) {
        self.set_loading(true, "Logging in...");

        let username = self.login_username.clone();
        let password = self.login_password.clone();

        match self.api.login(&username, &password).await {
            Ok(user) => {
                self.user = Some(user);
                let _ = tx.send(AppEvent::AuthSuccess).await;
            }
            Err(e) => {
                let _ = tx.send(AppEvent::AuthFailed(e.to_string())).await;
            }
        }

        self.set_loading(false, "");
    }

    pub async fn verify_auth(&mut self) {
        self.set_loading(true, "Verifying authentication...");
        if let Some(session) = self.api.session() {
            tracing::debug!(
                user_id = %session.user_id,
                username = %session.username,
                "verifying stored session"
            );
        }

        match self.api.me().await {
            Ok(user) => {
                self.user = Some(user);
                self.view = View::Dashboard;
                self.refresh_dashboard().await;
            }
            Err(e) => {
                tracing::info!(error = %e, "stored session not accepted");
                self.reset_session();
            }
        }

        self.set_loading(false, "");
    }

    pub async fn on_auth_success(&mut self) {
        self.view = View::Dashboard;
        self.vim_mode = VimMode::Normal;
        self.login_password.clear();
        self.refresh_dashboard().await;
    }

    pub fn on_auth_failed(&mut self, msg: String) {
        self.set_error(format!("Login failed: {}", msg));
        self.login_password.clear();
    }

    fn reset_session(&mut self) {
        if let Err(e) = self.api.logout() {
            tracing::warn!(error = %e, "could not remove stored tokens");
        }
        self.user = None;
        self.board = TaskBoard::default();
        self.trainings.clear();
        self.task_detail = None;
        self.completion_note = None;
        self.new_task = None;
        self.reader = None;
        self.editor = None;
        self.vim_mode = VimMode::Normal;
        self.view = View::Login;
    }

    // ============ Dashboard ============

    async fn refresh_dashboard(&mut self) {
        self.load_board().await;
        self.load_trainings().await;
    }

    async fn load_board(&mut self) {
        self.set_loading(true, "Loading tasks...");
        match self.api.task_board().await {
            Ok(board) => {
                self.board = board;
                self.selected_task = self
                    .selected_task
                    .min(self.current_tasks().len().saturating_sub(1));
            }
            Err(e) => self.report("Failed to load tasks", e),
        }
        self.set_loading(false, "");
    }

    async fn load_trainings(&mut self) {
        self.set_loading(true, "Loading trainings...");
        match self.api.list_trainings().await {
            Ok(trainings) => {
                self.trainings = trainings;
                self.selected_training = self
                    .selected_training
                    .min(self.trainings.len().saturating_sub(1));
            }
            Err(e) => self.report("Failed to load trainings", e),
        }
        self.set_loading(false, "");
    }

    async fn handle_dashboard_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.new_training_title.is_some() {
            self.handle_new_training_key(key).await;
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('L') => self.reset_session(),
            KeyCode::Char('r') => self.refresh_dashboard().await,
            KeyCode::Tab => {
                self.tab = match self.tab {
                    Tab::Tasks => Tab::Trainings,
                    Tab::Trainings => Tab::Tasks,
                };
            }
            _ => match self.tab {
                Tab::Tasks => self.handle_tasks_tab_key(key).await,
                Tab::Trainings => self.handle_trainings_tab_key(key).await,
            },
        }

        Ok(false)
    }

    fn select_task_list(&mut self, list: TaskList) {
        self.task_list = list;
        self.selected_task = 0;
    }

    async fn handle_tasks_tab_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('1') => self.select_task_list(TaskList::Inbox),
            KeyCode::Char('2') => self.select_task_list(TaskList::Sent),
            KeyCode::Char('3') => self.select_task_list(TaskList::Personal),
            KeyCode::Char('h') | KeyCode::Left => {
                let idx = TaskList::ALL.iter().position(|l| *l == self.task_list).unwrap_or(0);
                self.select_task_list(TaskList::ALL[(idx + 2) % 3]);
            }
            KeyCode::Char('l') | KeyCode::Right => {
                let idx = TaskList::ALL.iter().position(|l| *l == self.task_list).unwrap_or(0);
                self.select_task_list(TaskList::ALL[(idx + 1) % 3]);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_task < self.current_tasks().len().saturating_sub(1) {
                    self.selected_task += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_task = self.selected_task.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(id) = self.get_selected_task().map(|t| t.id) {
                    self.open_task(id).await;
                }
            }
            KeyCode::Char('n') => self.start_new_task().await,
            KeyCode::Char('d') => {
                if let Some(task) = self.get_selected_task() {
                    if self.can_delete(task) {
                        self.confirm = Some(Confirm::DeleteTask {
                            id: task.id,
                            title: task.title.clone(),
                        });
                    } else {
                        self.set_error("Only the sender can delete this task".to_string());
                    }
                }
            }
            _ => {}
        }
    }

    async fn handle_trainings_tab_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_training < self.trainings.len().saturating_sub(1) {
                    self.selected_training += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_training = self.selected_training.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(training) = self.get_selected_training().cloned() {
                    self.open_reader(&training).await;
                }
            }
            KeyCode::Char('e') if self.can_manage_trainings() => {
                if let Some(id) = self.get_selected_training().map(|t| t.id) {
                    self.open_editor(id).await;
                }
            }
            KeyCode::Char('n') if self.can_manage_trainings() => {
                self.new_training_title = Some(String::new());
            }
            KeyCode::Char('d') if self.can_manage_trainings() => {
                if let Some(training) = self.get_selected_training() {
                    self.confirm = Some(Confirm::DeleteTraining {
                        id: training.id,
                        title: training.title.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    async fn handle_new_training_key(&mut self, key: KeyEvent) {
        let Some(title) = self.new_training_title.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.new_training_title = None,
            KeyCode::Char(c) => title.push(c),
            KeyCode::Backspace => {
                title.pop();
            }
            KeyCode::Enter => {
                let title = title.trim().to_string();
                if title.is_empty() {
                    return;
                }
                self.set_loading(true, "Creating training...");
                let created = self.api.create_training(&title).await;
                self.set_loading(false, "");
                match created {
                    Ok(training) => {
                        self.new_training_title = None;
                        self.load_trainings().await;
                        self.open_editor(training.id).await;
                    }
                    Err(e) => self.report("Failed to create training", e),
                }
            }
            _ => {}
        }
    }

    // ============ Tasks ============

    async fn open_task(&mut self, task_id: Uuid) {
        self.set_loading(true, "Opening task...");
        match self.api.open_task(task_id).await {
            Ok(task) => {
                self.task_detail = Some(task);
                self.view = View::TaskDetail;
            }
            Err(e) => self.report("Failed to open task", e),
        }
        self.set_loading(false, "");
    }

    async fn back_to_dashboard(&mut self) {
        self.view = View::Dashboard;
        self.vim_mode = VimMode::Normal;
        self.task_detail = None;
        self.completion_note = None;
        self.new_task = None;
        self.reader = None;
        self.editor = None;
        self.refresh_dashboard().await;
    }

    async fn handle_task_detail_key(&mut self, key: KeyEvent) {
        if self.completion_note.is_some() {
            self.handle_completion_note_key(key).await;
            return;
        }
        let Some(task) = self.task_detail.as_ref() else {
            self.back_to_dashboard().await;
            return;
        };

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Backspace => {
                self.back_to_dashboard().await;
            }
            KeyCode::Char('c') => {
                if self.can_complete(task) {
                    self.completion_note = Some(create_textarea("", EditorContext::CompletionNote));
                    self.vim_mode = VimMode::Insert;
                } else {
                    self.set_error("This task cannot be completed by you".to_string());
                }
            }
            KeyCode::Char('d') => {
                if self.can_delete(task) {
                    self.confirm = Some(Confirm::DeleteTask {
                        id: task.id,
                        title: task.title.clone(),
                    });
                } else {
                    self.set_error("Only the sender can delete this task".to_string());
                }
            }
            _ => {}
        }
    }

    async fn handle_completion_note_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.completion_note = None;
            self.vim_mode = VimMode::Normal;
            return;
        }
        if is_ctrl(&key, 'e') {
            let current = self
                .completion_note
                .as_ref()
                .map(textarea_content)
                .unwrap_or_default();
            match launch_external_editor(&current, EditorContext::CompletionNote) {
                Ok(edited) => {
                    self.completion_note = Some(create_textarea(
                        edited.trim_end(),
                        EditorContext::CompletionNote,
                    ));
                }
                Err(e) => self.set_error(format!("Editor failed: {}", e)),
            }
            self.needs_terminal_clear = true;
            return;
        }
        if key.code != KeyCode::Enter {
            if let Some(note) = self.completion_note.as_mut() {
                note.input(key);
            }
            return;
        }

        let note = self
            .completion_note
            .as_ref()
            .map(textarea_content)
            .unwrap_or_default();
        if note.trim().is_empty() {
            self.set_error("A completion note is required".to_string());
            return;
        }
        let Some(task_id) = self.task_detail.as_ref().map(|t| t.id) else {
            return;
        };

        self.set_loading(true, "Completing task...");
        match self.api.complete_task(task_id, &note).await {
            Ok(task) => {
                self.task_detail = Some(task);
                self.completion_note = None;
                self.vim_mode = VimMode::Normal;
            }
            Err(e) => self.report("Failed to complete task", e),
        }
        self.set_loading(false, "");
    }

    async fn start_new_task(&mut self) {
        let Some(me) = self.user.clone() else {
            return;
        };
        self.set_loading(true, "Loading recipients...");
        let users = self.api.addressable_users().await;
        self.set_loading(false, "");

        match users {
            Ok(users) => {
                self.new_task = Some(NewTaskForm::new(assignee_choices(&me, &users)));
                self.view = View::CreateTask;
                self.vim_mode = VimMode::Insert;
            }
            Err(e) => self.report("Failed to load recipients", e),
        }
    }

    async fn handle_create_task_key(&mut self, key: KeyEvent) {
        if is_ctrl(&key, 's') {
            self.submit_new_task().await;
            return;
        }
        if is_ctrl(&key, 'e') {
            self.edit_new_task_description();
            return;
        }
        let Some(form) = self.new_task.as_mut() else {
            self.back_to_dashboard().await;
            return;
        };

        match key.code {
            KeyCode::Esc => {
                self.new_task = None;
                self.view = View::Dashboard;
                self.vim_mode = VimMode::Normal;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.previous_field(),
            KeyCode::Enter if form.field != NewTaskField::Description => {
                self.submit_new_task().await;
            }
            _ => match form.field {
                NewTaskField::Title => match key.code {
                    KeyCode::Char(c) => form.title.push(c),
                    KeyCode::Backspace => {
                        form.title.pop();
                    }
                    _ => {}
                },
                NewTaskField::Description => {
                    form.description.input(key);
                }
                NewTaskField::Assignee => match key.code {
                    KeyCode::Char('h') | KeyCode::Left => form.cycle_choice(false),
                    KeyCode::Char('l') | KeyCode::Right | KeyCode::Char(' ') => {
                        form.cycle_choice(true)
                    }
                    _ => {}
                },
            },
        }
    }

    fn edit_new_task_description(&mut self) {
        let Some(form) = self.new_task.as_mut() else {
            return;
        };
        let current = textarea_content(&form.description);
        match launch_external_editor(&current, EditorContext::TaskDescription) {
            Ok(edited) => {
                form.description =
                    create_textarea(edited.trim_end(), EditorContext::TaskDescription);
            }
            Err(e) => self.set_error(format!("Editor failed: {}", e)),
        }
        self.needs_terminal_clear = true;
    }

    async fn submit_new_task(&mut self) {
        let (Some(form), Some(me)) = (self.new_task.as_ref(), self.user.as_ref()) else {
            return;
        };
        let req = form.request(me);
        if req.title.is_empty() || req.description.is_empty() {
            self.set_error("Title and description are required".to_string());
            return;
        }
        let personal = req.assigned_to_user_id == Some(me.uid);

        self.set_loading(true, "Sending task...");
        let created = self.api.create_task(&req).await;
        self.set_loading(false, "");

        match created {
            Ok(task) => {
                tracing::info!(task_id = %task.id, "task created");
                self.task_list = if personal {
                    TaskList::Personal
                } else {
                    TaskList::Sent
                };
                self.selected_task = 0;
                self.back_to_dashboard().await;
            }
            Err(e) => self.report("Failed to create task", e),
        }
    }

    // ============ Training reader ============

    async fn open_reader(&mut self, training: &Training) {
        self.set_loading(true, "Loading training...");
        match self.api.training_content(training.id).await {
            Ok(content) => {
                self.reader = Some(ReaderState {
                    title: training.title.clone(),
                    source: content.source,
                    reader: TrainingReader::new(content.slides),
                    scroll: 0,
                    syllabus: None,
                });
                self.view = View::Reader;
            }
            Err(e) => self.report("Failed to load training", e),
        }
        self.set_loading(false, "");
    }

    fn handle_reader_key(&mut self, key: KeyEvent) {
        let Some(state) = self.reader.as_mut() else {
            self.view = View::Dashboard;
            return;
        };

        if let Some(highlighted) = state.syllabus {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    if highlighted + 1 < state.reader.len() {
                        state.syllabus = Some(highlighted + 1);
                    }
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    state.syllabus = Some(highlighted.saturating_sub(1));
                }
                KeyCode::Enter => {
                    state.reader.jump_to(highlighted);
                    state.scroll = 0;
                    state.syllabus = None;
                }
                KeyCode::Esc | KeyCode::Char('s') => state.syllabus = None,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Backspace => {
                self.reader = None;
                self.view = View::Dashboard;
            }
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('n') => {
                state.reader.next();
                state.scroll = 0;
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('p') => {
                state.reader.previous();
                state.scroll = 0;
            }
            KeyCode::Char('g') => {
                state.reader.jump_to(0);
                state.scroll = 0;
            }
            KeyCode::Char('G') => {
                state.reader.jump_to(state.reader.len().saturating_sub(1));
                state.scroll = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => state.scroll = state.scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => state.scroll = state.scroll.saturating_sub(1),
            KeyCode::Char('s') if !state.reader.is_empty() => {
                state.syllabus = Some(state.reader.current_index());
            }
            _ => {}
        }
    }

    // ============ Training editor ============

    async fn open_editor(&mut self, training_id: Uuid) {
        self.set_loading(true, "Opening editor...");
        let fetched = self.api.get_training(training_id).await;
        self.set_loading(false, "");

        let training = match fetched {
            Ok(training) => training,
            Err(e) => return self.report("Failed to load training", e),
        };
        match TrainingEditor::open(&training) {
            Ok(editor) => {
                self.editor = Some(EditorState {
                    training,
                    editor,
                    pane: EditorPane::Blocks,
                    selected_block: 0,
                    block_form: None,
                    type_picker: None,
                    slide_meta: None,
                });
                self.view = View::Editor;
            }
            Err(e) => self.set_error(format!("Cannot edit training: {}", e)),
        }
    }

    async fn save_editor(&mut self) {
        let Some(state) = self.editor.as_ref() else {
            return;
        };
        let training_id = state.editor.training_id();
        let slides = state.editor.slides().to_vec();

        self.set_loading(true, "Saving...");
        let saved = self.api.save_slides(training_id, &slides).await;
        self.set_loading(false, "");

        match saved {
            Ok(training) => {
                if let Some(state) = self.editor.as_mut() {
                    state.editor.mark_saved();
                    state.training = training;
                }
                tracing::info!(training_id = %training_id, slides = slides.len(), "slides saved");
            }
            // Edits stay in the editor so saving can be retried.
            Err(e) => self.report("Failed to save training", e),
        }
    }

    async fn handle_editor_key(&mut self, key: KeyEvent) {
        let Some(state) = self.editor.as_ref() else {
            self.view = View::Dashboard;
            return;
        };

        if state.block_form.is_some() {
            self.handle_block_form_key(key);
            return;
        }
        if state.type_picker.is_some() {
            self.handle_type_picker_key(key);
            return;
        }
        if state.slide_meta.is_some() {
            self.handle_slide_meta_key(key);
            return;
        }

        if is_ctrl(&key, 's') || key.code == KeyCode::Char('w') {
            self.save_editor().await;
            return;
        }
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            if state.editor.is_dirty() {
                self.confirm = Some(Confirm::DiscardEdits);
            } else {
                self.back_to_dashboard().await;
            }
            return;
        }

        let Some(state) = self.editor.as_mut() else {
            return;
        };
        if key.code == KeyCode::Tab {
            state.pane = match state.pane {
                EditorPane::Slides => EditorPane::Blocks,
                EditorPane::Blocks => EditorPane::Slides,
            };
            return;
        }

        let pane = state.pane;
        match pane {
            EditorPane::Slides => self.handle_slides_pane_key(key),
            EditorPane::Blocks => self.handle_blocks_pane_key(key),
        }
    }

    fn handle_slides_pane_key(&mut self, key: KeyEvent) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };
        let active = state.editor.active_index();

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if state.editor.select_slide(active + 1).is_ok() {
                    state.selected_block = 0;
                }
            }
            KeyCode::Char('k') | KeyCode::Up if active > 0 => {
                if state.editor.select_slide(active - 1).is_ok() {
                    state.selected_block = 0;
                }
            }
            KeyCode::Char('a') => {
                state.editor.add_slide();
                state.selected_block = 0;
            }
            KeyCode::Char('r') | KeyCode::Enter => {
                let slide = state.editor.active_slide();
                state.slide_meta = Some(SlideMetaForm {
                    title: slide.title.clone(),
                    duration: slide.duration.clone(),
                    kind: slide.kind,
                    field: SlideMetaField::Title,
                });
                self.vim_mode = VimMode::Insert;
            }
            KeyCode::Char('d') => {
                if state.editor.slides().len() == 1 {
                    self.set_error("The last slide cannot be deleted".to_string());
                } else {
                    self.confirm = Some(Confirm::DeleteSlide(active));
                }
            }
            _ => {}
        }
    }

    fn handle_blocks_pane_key(&mut self, key: KeyEvent) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if state.selected_block + 1 < state.editor.blocks().len() {
                    state.selected_block += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                state.selected_block = state.selected_block.saturating_sub(1);
            }
            KeyCode::Char('a') => state.type_picker = Some(0),
            KeyCode::Char('e') | KeyCode::Enter => {
                let Some(block) = state.editor.blocks().get(state.selected_block) else {
                    return;
                };
                match BlockForm::from_block(block) {
                    Some(form) => {
                        state.block_form = Some(form);
                        self.vim_mode = VimMode::Insert;
                    }
                    None => {
                        self.set_error("Markup blocks cannot be edited, only removed".to_string())
                    }
                }
            }
            KeyCode::Char('K') => {
                if state.editor.move_block(state.selected_block, MoveDirection::Up) {
                    state.selected_block -= 1;
                }
            }
            KeyCode::Char('J') => {
                if state.editor.move_block(state.selected_block, MoveDirection::Down) {
                    state.selected_block += 1;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = state.selected_block_id() {
                    self.confirm = Some(Confirm::RemoveBlock(id));
                }
            }
            _ => {}
        }
    }

    fn handle_type_picker_key(&mut self, key: KeyEvent) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };
        let Some(highlighted) = state.type_picker else {
            return;
        };

        match key.code {
            KeyCode::Esc => state.type_picker = None,
            KeyCode::Char('j') | KeyCode::Down => {
                if highlighted + 1 < BlockType::AUTHORABLE.len() {
                    state.type_picker = Some(highlighted + 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                state.type_picker = Some(highlighted.saturating_sub(1));
            }
            KeyCode::Enter => {
                state.type_picker = None;
                let block_type = BlockType::AUTHORABLE[highlighted];
                let added = state.editor.add_block(block_type);
                match added {
                    Ok(id) => {
                        state.selected_block = state.editor.blocks().len().saturating_sub(1);
                        state.block_form = state.editor.block(id).and_then(BlockForm::from_block);
                        self.vim_mode = VimMode::Insert;
                    }
                    Err(e) => self.set_error(e.to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_block_form_key(&mut self, key: KeyEvent) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };
        let Some(form) = state.block_form.as_mut() else {
            return;
        };

        if key.code == KeyCode::Esc {
            state.block_form = None;
            self.vim_mode = VimMode::Normal;
            return;
        }
        if is_ctrl(&key, 's') {
            let (id, kind) = (form.block_id, form.to_kind());
            match state.editor.update_block(id, kind) {
                Ok(()) => {
                    state.block_form = None;
                    self.vim_mode = VimMode::Normal;
                }
                Err(e) => self.set_error(e.to_string()),
            }
            return;
        }
        if is_ctrl(&key, 'e') {
            let (Some(current), Some(context)) = (form.focused_text(), form.focused_context())
            else {
                return;
            };
            match launch_external_editor(&current, context) {
                Ok(edited) => form.set_focused_text(&edited),
                Err(e) => self.set_error(format!("Editor failed: {}", e)),
            }
            self.needs_terminal_clear = true;
            return;
        }

        match key.code {
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.previous_field(),
            _ => form.input(key),
        }
    }

    fn handle_slide_meta_key(&mut self, key: KeyEvent) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };
        let Some(meta) = state.slide_meta.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc => {
                state.slide_meta = None;
                self.vim_mode = VimMode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                meta.field = match (meta.field, key.code == KeyCode::Tab) {
                    (SlideMetaField::Title, true) => SlideMetaField::Duration,
                    (SlideMetaField::Duration, true) => SlideMetaField::Kind,
                    (SlideMetaField::Kind, true) => SlideMetaField::Title,
                    (SlideMetaField::Title, false) => SlideMetaField::Kind,
                    (SlideMetaField::Duration, false) => SlideMetaField::Title,
                    (SlideMetaField::Kind, false) => SlideMetaField::Duration,
                };
            }
            KeyCode::Enter => {
                let index = state.editor.active_index();
                match state.editor.update_slide_meta(index, meta.to_meta()) {
                    Ok(()) => {
                        state.slide_meta = None;
                        self.vim_mode = VimMode::Normal;
                    }
                    Err(e) => self.set_error(e.to_string()),
                }
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if meta.field == SlideMetaField::Kind =>
            {
                meta.kind = next_slide_kind(meta.kind);
            }
            KeyCode::Char(c) => match meta.field {
                SlideMetaField::Title => meta.title.push(c),
                SlideMetaField::Duration => meta.duration.push(c),
                SlideMetaField::Kind => {}
            },
            KeyCode::Backspace => {
                match meta.field {
                    SlideMetaField::Title => meta.title.pop(),
                    SlideMetaField::Duration => meta.duration.pop(),
                    SlideMetaField::Kind => None,
                };
            }
            _ => {}
        }
    }

    // ============ Confirmations ============

    async fn run_confirmed(&mut self, confirm: Confirm) {
        match confirm {
            Confirm::DeleteTask { id, .. } => {
                self.set_loading(true, "Deleting task...");
                let deleted = self.api.delete_task(id).await;
                self.set_loading(false, "");
                match deleted {
                    Ok(()) => self.back_to_dashboard().await,
                    Err(e) => self.report("Failed to delete task", e),
                }
            }
            Confirm::DeleteTraining { id, .. } => {
                self.set_loading(true, "Deleting training...");
                let deleted = self.api.delete_training(id).await;
                self.set_loading(false, "");
                match deleted {
                    Ok(()) => self.load_trainings().await,
                    Err(e) => self.report("Failed to delete training", e),
                }
            }
            Confirm::DeleteSlide(index) => {
                if let Some(state) = self.editor.as_mut() {
                    match state.editor.delete_slide(index) {
                        Ok(()) => state.selected_block = 0,
                        Err(e) => self.set_error(e.to_string()),
                    }
                }
            }
            Confirm::RemoveBlock(id) => {
                if let Some(state) = self.editor.as_mut() {
                    match state.editor.remove_block(id) {
                        Ok(()) => state.clamp_selection(),
                        Err(e) => self.set_error(e.to_string()),
                    }
                }
            }
            Confirm::DiscardEdits => self.back_to_dashboard().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, role: Role, unit: Option<&str>) -> User {
        User {
            uid: Uuid::new_v4(),
            display_name: name.to_string(),
            username: name.to_lowercase(),
            role,
            unit: unit.map(str::to_string),
        }
    }

    #[test]
    fn koordinator_can_only_write_personal_notes() {
        let me = user("Ayşe", Role::Koordinator, Some("Ankara"));
        let others = vec![
            user("Mehmet", Role::Sorumlu, Some("İzmir")),
            user("Ali", Role::Koordinator, Some("Ankara")),
        ];
        assert_eq!(assignee_choices(&me, &others), vec![Assignee::Myself]);
    }

    #[test]
    fn sorumlu_addresses_koordinators_and_units() {
        let me = user("Mehmet", Role::Sorumlu, Some("İzmir"));
        let ayse = user("Ayşe", Role::Koordinator, Some("Ankara"));
        let other_sorumlu = user("Can", Role::Sorumlu, Some("Bursa"));
        let choices = assignee_choices(&me, &[ayse.clone(), other_sorumlu, me.clone()]);

        assert_eq!(
            choices,
            vec![
                Assignee::Myself,
                Assignee::User(ayse),
                Assignee::Unit("Ankara".into()),
                Assignee::Unit("Bursa".into()),
                Assignee::Unit("İzmir".into()),
            ]
        );
    }

    #[test]
    fn new_task_request_follows_assignee() {
        let me = user("Mehmet", Role::Sorumlu, None);
        let ayse = user("Ayşe", Role::Koordinator, Some("Ankara"));
        let mut form = NewTaskForm::new(assignee_choices(&me, &[ayse.clone()]));
        form.title = "  Rapor  ".into();
        form.description.insert_str("Haftalık rapor");

        let req = form.request(&me);
        assert_eq!(req.title, "Rapor");
        assert_eq!(req.description, "Haftalık rapor");
        assert_eq!(req.assigned_to_user_id, Some(me.uid));

        form.cycle_choice(true);
        assert_eq!(form.request(&me).assigned_to_user_id, Some(ayse.uid));

        form.cycle_choice(true);
        let req = form.request(&me);
        assert_eq!(req.assigned_to_user_id, None);
        assert_eq!(req.assigned_to_unit.as_deref(), Some("Ankara"));

        form.cycle_choice(true);
        assert_eq!(form.assignee(), Some(&Assignee::Myself));
    }

    #[test]
    fn slide_kinds_cycle() {
        let mut kind = SlideKind::Text;
        for _ in 0..3 {
            kind = next_slide_kind(kind);
        }
        assert_eq!(kind, SlideKind::Text);
    }

    #[test]
    fn startup_view_follows_stored_session() {
        let api = || ApiClient::new("http://localhost:3000").unwrap();

        let app = App::new(api(), SessionStatus::Active);
        assert_eq!(app.view, View::VerifyingAuth);

        let app = App::new(
            api(),
            SessionStatus::Expired {
                username: "ayse".into(),
            },
        );
        assert_eq!(app.view, View::Login);
        assert_eq!(app.login_username, "ayse");
        assert_eq!(app.login_field, InputField::Password);

        let app = App::new(api(), SessionStatus::Missing);
        assert_eq!(app.view, View::Login);
        assert!(app.login_username.is_empty());
        assert_eq!(app.login_field, InputField::Username);
    }
}
