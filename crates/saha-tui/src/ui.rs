use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};
use saha_shared::content::{BlockKind, BlockType};
use saha_shared::models::{Task, TaskStatus};
use saha_shared::reader::ContentSource;
use tui_textarea::TextArea;

use crate::app::{
    App, Confirm, EditorPane, EditorState, InputField, NewTaskField, ReaderState, SlideMetaField,
    Tab, TaskList, View, VimMode,
};
use crate::block_form::{BlockForm, FieldInput};
use crate::markup::{render_markup, severity_color};

/// Returns (symbol, color) for a task's state indicator
fn task_indicator(task: &Task) -> (&'static str, Color) {
    match task.status {
        TaskStatus::Completed => ("✓", Color::Green),
        TaskStatus::Pending if task.read_at.is_none() => ("●", Color::Yellow),
        TaskStatus::Pending => ("○", Color::Gray),
    }
}

fn recipient_label(task: &Task) -> String {
    match (&task.assigned_to_unit, task.is_personal_note()) {
        (Some(unit), _) => format!("unit {}", unit),
        (None, true) => "personal note".to_string(),
        (None, false) => "direct".to_string(),
    }
}

fn block_summary(kind: &BlockKind) -> String {
    fn clip(text: &str) -> String {
        let first = text.lines().next().unwrap_or_default();
        if first.chars().count() > 40 {
            format!("{}…", first.chars().take(40).collect::<String>())
        } else {
            first.to_string()
        }
    }

    match kind {
        BlockKind::Paragraph { text } => clip(text),
        BlockKind::Heading { text, level } => format!("{} {}", level.tag(), clip(text)),
        BlockKind::Image { url, .. } => clip(url),
        BlockKind::Video { url } => clip(url),
        BlockKind::Alert {
            severity,
            title,
            text,
        } => format!(
            "[{}] {}",
            severity.as_str(),
            clip(title.as_deref().unwrap_or(text))
        ),
        BlockKind::List { items } => format!(
            "{} item(s): {}",
            items.len(),
            clip(items.first().map(String::as_str).unwrap_or_default())
        ),
        BlockKind::RawMarkup { markup } => format!("{} chars of markup", markup.len()),
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    match app.view {
        View::Login => draw_login(f, app),
        View::VerifyingAuth => draw_loading(f, "Verifying authentication..."),
        View::Dashboard => draw_dashboard(f, app),
        View::TaskDetail => draw_task_detail(f, app),
        View::CreateTask => draw_create_task(f, app),
        View::Reader => draw_reader(f, app),
        View::Editor => draw_editor(f, app),
    }

    if let Some(ref confirm) = app.confirm {
        draw_confirm_popup(f, app, confirm);
    }

    if let Some(ref error) = app.error_message {
        draw_error_popup(f, error);
    }

    if app.loading {
        draw_loading_overlay(f, &app.loading_message);
    }
}

fn field_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    }
}

/// Render a TextArea's lines inside a bordered box; tracks the cursor when
/// `focused`.
fn draw_textarea(f: &mut Frame, area: Rect, textarea: &TextArea, title: &str, focused: bool) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(field_style(focused));
    let inner = block.inner(area);

    let (row, col) = textarea.cursor();
    let scroll = (row as u16 + 1).saturating_sub(inner.height);
    let lines: Vec<Line> = textarea
        .lines()
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    let text = Paragraph::new(lines).block(block).scroll((scroll, 0));
    f.render_widget(text, area);

    if focused && inner.width > 0 && inner.height > 0 {
        let x = inner.x + (col as u16).min(inner.width - 1);
        let y = inner.y + row as u16 - scroll;
        f.set_cursor_position((x, y));
    }
}

fn draw_login(f: &mut Frame, app: &App) {
    let area = f.area();

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(12),
            Constraint::Percentage(25),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(vertical[1]);

    let form_area = horizontal[1];

    let form_block = Block::default()
        .title(" Saha Panel ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = form_block.inner(form_area);
    f.render_widget(form_block, form_area);

    let form_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(2), // Submit hint
            Constraint::Min(0),
        ])
        .split(inner);

    let username_block = Block::default()
        .title(" Username ")
        .borders(Borders::ALL)
        .border_style(field_style(app.login_field == InputField::Username));
    let username_text = Paragraph::new(app.login_username.as_str()).block(username_block);
    f.render_widget(username_text, form_chunks[0]);

    let password_block = Block::default()
        .title(" Password ")
        .borders(Borders::ALL)
        .border_style(field_style(app.login_field == InputField::Password));
    let password_display = "*".repeat(app.login_password.chars().count());
    let password_text = Paragraph::new(password_display.as_str()).block(password_block);
    f.render_widget(password_text, form_chunks[1]);

    let mode_text = match app.vim_mode {
        VimMode::Normal => "'i' edit | Tab switch field | Enter log in | 'q' quit",
        VimMode::Insert => "Type to enter | Esc normal | Enter log in",
    };
    let hint = Paragraph::new(mode_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint, form_chunks[2]);

    if app.vim_mode == VimMode::Insert {
        let (chunk, len) = match app.login_field {
            InputField::Username => (form_chunks[0], app.login_username.chars().count()),
            InputField::Password => (form_chunks[1], app.login_password.chars().count()),
        };
        f.set_cursor_position((chunk.x + 1 + len as u16, chunk.y + 1));
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App, context: &str) {
    let mut spans = vec![Span::styled(
        "SAHA",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if let Some(user) = &app.user {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            user.display_name.as_str(),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(
            format!(" ({})", user.role.as_str()),
            Style::default().fg(Color::DarkGray),
        ));
        if let Some(unit) = &user.unit {
            spans.push(Span::styled(
                format!(" · {}", unit),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    if !context.is_empty() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(context.to_string(), Style::default().fg(Color::White)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, area);
}

fn draw_status_line(f: &mut Frame, area: Rect, mode: (&str, Color), hints: &str) {
    let (label, color) = mode;
    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().bg(color).fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(hints.to_string(), Style::default().fg(Color::DarkGray)),
    ]));
    f.render_widget(status, area);
}

fn mode_badge(app: &App) -> (&'static str, Color) {
    match app.vim_mode {
        VimMode::Normal => ("NORMAL", Color::Blue),
        VimMode::Insert => ("INSERT", Color::Green),
    }
}

fn screen_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(area)
}

// ============ Dashboard ============

fn draw_dashboard(f: &mut Frame, app: &App) {
    let chunks = screen_layout(f.area());
    draw_header(f, chunks[0], app, "");

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(chunks[1]);

    let unread = app.board.unread_count;
    let tasks_title = if unread > 0 {
        format!(" Tasks ({} unread) ", unread)
    } else {
        " Tasks ".to_string()
    };
    let tabs = Tabs::new(vec![tasks_title, " Trainings ".to_string()])
        .select(match app.tab {
            Tab::Tasks => 0,
            Tab::Trainings => 1,
        })
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(tabs, body[0]);

    match app.tab {
        Tab::Tasks => draw_task_lists(f, body[1], app),
        Tab::Trainings => draw_trainings(f, body[1], app),
    }

    let hints = match app.tab {
        _ if app.new_training_title.is_some() => "Enter: create | Esc: cancel",
        Tab::Tasks => {
            "1/2/3 h/l: list | j/k: select | Enter: open | n: new | d: delete | Tab: trainings | r: refresh | L: logout | q: quit"
        }
        Tab::Trainings if app.can_manage_trainings() => {
            "j/k: select | Enter: read | e: edit | n: new | d: delete | Tab: tasks | q: quit"
        }
        Tab::Trainings => "j/k: select | Enter: read | Tab: tasks | r: refresh | q: quit",
    };
    draw_status_line(f, chunks[2], mode_badge(app), hints);

    if let Some(title) = &app.new_training_title {
        draw_text_popup(f, " New Training ", " Title ", title);
    }
}

fn draw_task_lists(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let titles: Vec<String> = TaskList::ALL
        .iter()
        .map(|list| match list {
            TaskList::Inbox if app.board.unread_count > 0 => {
                format!("{} [{}]", list.title(), app.board.unread_count)
            }
            _ => list.title().to_string(),
        })
        .collect();
    let selected_list = TaskList::ALL
        .iter()
        .position(|l| *l == app.task_list)
        .unwrap_or(0);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(columns[0]);

    let tabs = Tabs::new(titles)
        .select(selected_list)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, left[0]);

    let tasks = app.current_tasks();
    let items: Vec<ListItem> = if tasks.is_empty() {
        vec![ListItem::new(Span::styled(
            "  Nothing here",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        tasks
            .iter()
            .enumerate()
            .map(|(i, task)| {
                let (symbol, color) = task_indicator(task);
                let title_style = if i == app.selected_task {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else if task.is_unread() {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let meta = match app.task_list {
                    TaskList::Inbox => format!("from {}", task.sender_name),
                    TaskList::Sent => format!("to {}", recipient_label(task)),
                    TaskList::Personal => task.created_at.format("%d.%m.%Y").to_string(),
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
                    Span::styled(task.title.as_str(), title_style),
                    Span::raw("  "),
                    Span::styled(meta, Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(list, left[1]);

    let preview = match app.get_selected_task() {
        Some(task) => task_info_lines(task),
        None => vec![],
    };
    let preview = Paragraph::new(preview)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Preview ").borders(Borders::ALL));
    f.render_widget(preview, columns[1]);
}

fn task_info_lines(task: &Task) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::DarkGray);
    let (symbol, color) = task_indicator(task);
    let status = match task.status {
        TaskStatus::Pending => "pending",
        TaskStatus::Completed => "completed",
    };

    let mut lines = vec![
        Line::from(Span::styled(
            task.title.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("From:    ", label),
            Span::raw(format!("{} ({})", task.sender_name, task.sender_role.as_str())),
        ]),
        Line::from(vec![
            Span::styled("To:      ", label),
            Span::raw(recipient_label(task)),
        ]),
        Line::from(vec![
            Span::styled("Status:  ", label),
            Span::styled(format!("{} {}", symbol, status), Style::default().fg(color)),
        ]),
        Line::from(vec![
            Span::styled("Created: ", label),
            Span::raw(task.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]),
    ];
    if let Some(read_at) = task.read_at {
        lines.push(Line::from(vec![
            Span::styled("Read:    ", label),
            Span::raw(read_at.format("%Y-%m-%d %H:%M").to_string()),
        ]));
    }
    lines.push(Line::default());
    lines.extend(task.description.lines().map(|l| Line::from(l.to_string())));

    if let Some(note) = &task.completion_note {
        lines.push(Line::default());
        let done = task
            .completed_at
            .map(|t| t.format(" (%Y-%m-%d %H:%M)").to_string())
            .unwrap_or_default();
        lines.push(Line::from(Span::styled(
            format!("Completion note{}:", done),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        lines.extend(note.lines().map(|l| Line::from(l.to_string())));
    }
    lines
}

fn draw_trainings(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let items: Vec<ListItem> = app
        .trainings
        .iter()
        .enumerate()
        .map(|(i, training)| {
            let style = if i == app.selected_training {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };
            let category = if training.category.is_empty() {
                String::new()
            } else {
                format!("  [{}]", training.category)
            };
            ListItem::new(Line::from(vec![
                Span::raw("  "),
                Span::styled(training.title.as_str(), style),
                Span::styled(category, Style::default().fg(Color::Magenta)),
                Span::styled(
                    format!("  {} slide(s)", training.slides.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Trainings ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(list, columns[0]);

    let details = match app.get_selected_training() {
        Some(training) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    training.title.clone(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    training.page_url.clone(),
                    Style::default().fg(Color::DarkGray),
                )),
                Line::default(),
            ];
            lines.extend(training.description.lines().map(|l| Line::from(l.to_string())));
            lines.push(Line::default());
            lines.extend(
                training
                    .slides
                    .iter()
                    .enumerate()
                    .map(|(i, s)| Line::from(format!("{:>2}. {}", i + 1, s.title))),
            );
            lines
        }
        None => vec![Line::from(Span::styled(
            "No trainings yet",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    let details = Paragraph::new(details)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Details ").borders(Borders::ALL));
    f.render_widget(details, columns[1]);
}

// ============ Task screens ============

fn draw_task_detail(f: &mut Frame, app: &App) {
    let Some(task) = &app.task_detail else {
        return;
    };
    let chunks = screen_layout(f.area());
    draw_header(f, chunks[0], app, "Task");

    let body = Paragraph::new(task_info_lines(task))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(body, chunks[1]);

    let hints = if app.completion_note.is_some() {
        "Type note | Enter: complete | Ctrl+E: $EDITOR | Esc: cancel"
    } else {
        match (app.can_complete(task), app.can_delete(task)) {
            (true, true) => "c: complete | d: delete | q/Esc: back",
            (true, false) => "c: complete | q/Esc: back",
            (false, true) => "d: delete | q/Esc: back",
            (false, false) => "q/Esc: back",
        }
    };
    draw_status_line(f, chunks[2], mode_badge(app), hints);

    if let Some(note) = &app.completion_note {
        let area = centered_rect(60, 30, f.area());
        f.render_widget(Clear, area);
        draw_textarea(f, area, note, "Completion note", true);
    }
}

fn draw_create_task(f: &mut Frame, app: &App) {
    let Some(form) = &app.new_task else {
        return;
    };
    let chunks = screen_layout(f.area());
    draw_header(f, chunks[0], app, "New task");

    let fields = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(5),    // Description
            Constraint::Length(3), // Assignee
        ])
        .split(chunks[1]);

    let title_block = Block::default()
        .title(" Title ")
        .borders(Borders::ALL)
        .border_style(field_style(form.field == NewTaskField::Title));
    f.render_widget(Paragraph::new(form.title.as_str()).block(title_block), fields[0]);

    draw_textarea(
        f,
        fields[1],
        &form.description,
        "Description",
        form.field == NewTaskField::Description,
    );

    let assignee = form
        .assignee()
        .map(|a| a.label())
        .unwrap_or_else(|| "(nobody)".to_string());
    let assignee_block = Block::default()
        .title(" Assign to (h/l to change) ")
        .borders(Borders::ALL)
        .border_style(field_style(form.field == NewTaskField::Assignee));
    let assignee_text = Paragraph::new(Line::from(vec![
        Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
        Span::raw(assignee),
        Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
    ]))
    .block(assignee_block);
    f.render_widget(assignee_text, fields[2]);

    if form.field == NewTaskField::Title {
        f.set_cursor_position((
            fields[0].x + 1 + form.title.chars().count() as u16,
            fields[0].y + 1,
        ));
    }

    draw_status_line(
        f,
        chunks[2],
        ("CREATE", Color::Green),
        "Tab: next field | Enter: send | Ctrl+S: send | Ctrl+E: $EDITOR | Esc: cancel",
    );
}

// ============ Training reader ============

fn source_label(source: &ContentSource) -> Option<&'static str> {
    match source {
        ContentSource::Structured => None,
        ContentSource::Fallback(_) => Some("built-in content"),
        ContentSource::Pending => Some("content pending"),
    }
}

fn draw_reader(f: &mut Frame, app: &App) {
    let Some(state) = &app.reader else {
        return;
    };
    let chunks = screen_layout(f.area());
    let context = match source_label(&state.source) {
        Some(label) => format!("{} ({})", state.title, label),
        None => state.title.clone(),
    };
    draw_header(f, chunks[0], app, &context);

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress
            Constraint::Length(1), // Slide title
            Constraint::Min(0),    // Slide content
        ])
        .split(chunks[1]);

    let reader = &state.reader;
    let progress = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(u16::from(reader.progress_percent()))
        .label(format!("{}%", reader.progress_percent()));
    f.render_widget(progress, body[0]);

    match reader.current() {
        Some(slide) => {
            let mut title = vec![
                Span::styled(
                    format!(" {}/{} ", reader.current_index() + 1, reader.len()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    slide.title.as_str(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
            ];
            if !slide.duration.is_empty() {
                title.push(Span::styled(
                    format!("  ⏱ {}", slide.duration),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            f.render_widget(Paragraph::new(Line::from(title)), body[1]);

            let content = Paragraph::new(render_markup(&slide.content))
                .wrap(Wrap { trim: false })
                .scroll((state.scroll, 0))
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(content, body[2]);
        }
        None => {
            let empty = Paragraph::new("Content for this training is being prepared.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(empty, body[2]);
        }
    }

    let hints = if reader.is_last() && !reader.is_empty() {
        "h/←: previous | s: syllabus | j/k: scroll | g/G: first/last | q: done"
    } else {
        "l/→/Space: next | h/←: previous | s: syllabus | j/k: scroll | q: back"
    };
    draw_status_line(f, chunks[2], ("READ", Color::Magenta), hints);

    if state.syllabus.is_some() {
        draw_syllabus_popup(f, state);
    }
}

fn draw_syllabus_popup(f: &mut Frame, state: &ReaderState) {
    let area = centered_rect(50, 60, f.area());
    f.render_widget(Clear, area);

    let highlighted = state.syllabus.unwrap_or(0);
    let current = state.reader.current_index();
    let items: Vec<ListItem> = state
        .reader
        .syllabus()
        .into_iter()
        .enumerate()
        .map(|(i, title)| {
            let style = if i == highlighted {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else if i < current {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            let marker = if i == current { "▸" } else { " " };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} {:>2}. ", marker, i + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(title.to_string(), style),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Syllabus (Enter: jump, Esc: close) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(list, area);
}

// ============ Training editor ============

fn draw_editor(f: &mut Frame, app: &App) {
    let Some(state) = &app.editor else {
        return;
    };
    let chunks = screen_layout(f.area());
    let context = if state.editor.is_dirty() {
        format!("Editing {} [modified]", state.training.title)
    } else {
        format!("Editing {}", state.training.title)
    };
    draw_header(f, chunks[0], app, &context);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25), // Slides
            Constraint::Percentage(35), // Blocks
            Constraint::Percentage(40), // Preview
        ])
        .split(chunks[1]);

    let pane_style = |pane: EditorPane| {
        if state.pane == pane {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let active = state.editor.active_index();
    let slides: Vec<ListItem> = state
        .editor
        .slides()
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            let style = if i == active {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(slide.title.as_str(), style),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(slides).block(
            Block::default()
                .title(" Slides ")
                .borders(Borders::ALL)
                .border_style(pane_style(EditorPane::Slides)),
        ),
        columns[0],
    );

    let blocks: Vec<ListItem> = state
        .editor
        .blocks()
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let style = if i == state.selected_block && state.pane == EditorPane::Blocks {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };
            let type_color = match &block.kind {
                BlockKind::Alert { severity, .. } => severity_color(*severity),
                BlockKind::RawMarkup { .. } => Color::DarkGray,
                _ => Color::Yellow,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<9} ", block.block_type().label()),
                    Style::default().fg(type_color),
                ),
                Span::styled(block_summary(&block.kind), style),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(blocks).block(
            Block::default()
                .title(format!(" Blocks · {} ", state.editor.active_slide().title))
                .borders(Borders::ALL)
                .border_style(pane_style(EditorPane::Blocks)),
        ),
        columns[1],
    );

    let preview = Paragraph::new(render_markup(&state.editor.active_slide().content))
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Preview ").borders(Borders::ALL));
    f.render_widget(preview, columns[2]);

    let (mode, hints) = if state.block_form.is_some() {
        (
            ("BLOCK", Color::Yellow),
            "Tab: next field | ←/→: change choice | Ctrl+S: apply | Ctrl+E: $EDITOR | Esc: cancel",
        )
    } else if state.type_picker.is_some() {
        (("ADD", Color::Green), "j/k: type | Enter: add | Esc: cancel")
    } else if state.slide_meta.is_some() {
        (("SLIDE", Color::Yellow), "Tab: next field | Enter: apply | Esc: cancel")
    } else {
        let hints = match state.pane {
            EditorPane::Slides => {
                "j/k: slide | a: add | r: rename | d: delete | Tab: blocks | w: save | q: close"
            }
            EditorPane::Blocks => {
                "j/k: block | a: add | e: edit | J/K: move | d: remove | Tab: slides | w: save | q: close"
            }
        };
        (mode_badge(app), hints)
    };
    draw_status_line(f, chunks[2], mode, hints);

    if let Some(highlighted) = state.type_picker {
        draw_type_picker(f, highlighted);
    }
    if let Some(form) = &state.block_form {
        draw_block_form(f, form);
    }
    if state.slide_meta.is_some() {
        draw_slide_meta(f, state);
    }
}

fn draw_type_picker(f: &mut Frame, highlighted: usize) {
    let area = centered_rect(30, 40, f.area());
    f.render_widget(Clear, area);

    let items: Vec<ListItem> = BlockType::AUTHORABLE
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let style = if i == highlighted {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(format!("  {}", t.label()), style))
        })
        .collect();

    f.render_widget(
        List::new(items).block(
            Block::default()
                .title(" Add Block ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        ),
        area,
    );
}

fn draw_block_form(f: &mut Frame, form: &BlockForm) {
    let area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" Edit {} ", form.block_type.label()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let constraints: Vec<Constraint> = form
        .fields
        .iter()
        .map(|field| match &field.input {
            FieldInput::Text {
                multiline: true, ..
            } => Constraint::Min(5),
            _ => Constraint::Length(3),
        })
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(inner);

    for (i, (field, row)) in form.fields.iter().zip(rows.iter()).enumerate() {
        let focused = i == form.focus;
        match &field.input {
            FieldInput::Text { area, .. } => draw_textarea(f, *row, area, field.label, focused),
            FieldInput::Level(level) => {
                draw_choice(f, *row, field.label, level.tag(), Color::Cyan, focused)
            }
            FieldInput::Severity(severity) => draw_choice(
                f,
                *row,
                field.label,
                severity.as_str(),
                severity_color(*severity),
                focused,
            ),
        }
    }
}

fn draw_choice(f: &mut Frame, area: Rect, label: &str, value: &str, color: Color, focused: bool) {
    let block = Block::default()
        .title(format!(" {} ", label))
        .borders(Borders::ALL)
        .border_style(field_style(focused));
    let text = Paragraph::new(Line::from(vec![
        Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
        Span::styled(value.to_string(), Style::default().fg(color)),
        Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
    ]))
    .block(block);
    f.render_widget(text, area);
}

fn draw_slide_meta(f: &mut Frame, state: &EditorState) {
    let Some(meta) = &state.slide_meta else {
        return;
    };
    let area = centered_rect(50, 50, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Slide ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let title_block = Block::default()
        .title(" Title ")
        .borders(Borders::ALL)
        .border_style(field_style(meta.field == SlideMetaField::Title));
    f.render_widget(Paragraph::new(meta.title.as_str()).block(title_block), rows[0]);

    let duration_block = Block::default()
        .title(" Duration (e.g. 5 dk) ")
        .borders(Borders::ALL)
        .border_style(field_style(meta.field == SlideMetaField::Duration));
    f.render_widget(
        Paragraph::new(meta.duration.as_str()).block(duration_block),
        rows[1],
    );

    let kind = format!("{:?}", meta.kind).to_lowercase();
    draw_choice(
        f,
        rows[2],
        "Kind",
        &kind,
        Color::Cyan,
        meta.field == SlideMetaField::Kind,
    );

    let cursor = match meta.field {
        SlideMetaField::Title => Some((rows[0], meta.title.chars().count())),
        SlideMetaField::Duration => Some((rows[1], meta.duration.chars().count())),
        SlideMetaField::Kind => None,
    };
    if let Some((row, len)) = cursor {
        f.set_cursor_position((row.x + 1 + len as u16, row.y + 1));
    }
}

// ============ Popups ============

fn draw_text_popup(f: &mut Frame, title: &str, field: &str, value: &str) {
    let area = centered_rect(50, 20, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Length(2), // Hint
            Constraint::Min(0),
        ])
        .split(inner);

    let input_block = Block::default()
        .title(field)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    f.render_widget(Paragraph::new(value).block(input_block), chunks[0]);

    let hint = Paragraph::new("Enter: create | Esc: cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint, chunks[1]);

    f.set_cursor_position((
        chunks[0].x + 1 + value.chars().count() as u16,
        chunks[0].y + 1,
    ));
}

fn draw_confirm_popup(f: &mut Frame, app: &App, confirm: &Confirm) {
    let area = centered_rect(50, 20, f.area());

    f.render_widget(Clear, area);

    let slide_title = |index: usize| {
        app.editor
            .as_ref()
            .and_then(|s| s.editor.slides().get(index))
            .map(|s| s.title.clone())
            .unwrap_or_default()
    };
    let (title, question, subject) = match confirm {
        Confirm::DeleteTask { title, .. } => (" Confirm Delete ", "Delete task:", title.clone()),
        Confirm::DeleteTraining { title, .. } => {
            (" Confirm Delete ", "Delete training:", title.clone())
        }
        Confirm::DeleteSlide(index) => (" Confirm Delete ", "Delete slide:", slide_title(*index)),
        Confirm::RemoveBlock(id) => {
            let summary = app
                .editor
                .as_ref()
                .and_then(|s| s.editor.block(*id))
                .map(|b| format!("{}: {}", b.block_type().label(), block_summary(&b.kind)))
                .unwrap_or_default();
            (" Confirm Remove ", "Remove block:", summary)
        }
        Confirm::DiscardEdits => (
            " Unsaved Changes ",
            "Discard unsaved changes to:",
            app.editor
                .as_ref()
                .map(|s| s.training.title.clone())
                .unwrap_or_default(),
        ),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Message
            Constraint::Length(2), // Hint
            Constraint::Min(0),
        ])
        .split(inner);

    let message = Paragraph::new(vec![
        Line::from(Span::raw(question)),
        Line::from(Span::styled(
            format!("\"{}\"", subject),
            Style::default().fg(Color::Yellow),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(message, chunks[0]);

    let hint = Paragraph::new("y: yes | n: no, cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(hint, chunks[1]);
}

fn draw_loading(f: &mut Frame, message: &str) {
    let area = f.area();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    f.render_widget(block, area);

    let text = Paragraph::new(message)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);

    let center = centered_rect(50, 20, area);
    f.render_widget(text, center);
}

fn draw_loading_overlay(f: &mut Frame, message: &str) {
    let area = centered_rect(40, 10, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Loading ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let text = Paragraph::new(message)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(block);

    f.render_widget(text, area);
}

fn draw_error_popup(f: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Error (any key to dismiss) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = Paragraph::new(error)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);

    f.render_widget(text, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use saha_shared::content::{HeadingLevel, Severity};

    #[test]
    fn summaries_are_short_single_lines() {
        let long = "a".repeat(60);
        let summary = block_summary(&BlockKind::Paragraph {
            text: format!("{}\nsecond", long),
        });
        assert_eq!(summary.chars().count(), 41);
        assert!(!summary.contains('\n'));

        assert_eq!(
            block_summary(&BlockKind::Heading {
                text: "Giriş".into(),
                level: HeadingLevel::H3
            }),
            "h3 Giriş"
        );
        assert_eq!(
            block_summary(&BlockKind::Alert {
                severity: Severity::Warning,
                title: None,
                text: "Kask".into()
            }),
            "[warning] Kask"
        );
    }

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(50, 20, outer);
        assert_eq!(inner.width, 50);
        assert_eq!(inner.height, 10);
        assert!(inner.x >= outer.x && inner.right() <= outer.right());
    }
}
