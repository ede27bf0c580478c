use std::cell::Cell;
use std::io::{self, Stdout};
use std::ops::Range;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tracing::{debug, info, warn};
use unicode_width::UnicodeWidthStr;

use crate::data::{CommentService, FeedService, UploadService};
use crate::error;
use crate::forms::{CommentField, CommentForm, UploadField, UploadForm};
use crate::keymap::{Action, Keymap, Section};
use crate::notify::{Notifier, Phase, Severity, Timing};
use crate::player;
use crate::render::{
    self, GridContext, COLOR_ACCENT, COLOR_BG, COLOR_BORDER_IDLE, COLOR_ERROR, COLOR_PANEL_BG,
    COLOR_PANEL_FOCUSED_BG, COLOR_SUCCESS, COLOR_TEXT_PRIMARY, COLOR_TEXT_SECONDARY,
};
use crate::state::{FeedState, Msg};
use crate::vlogs::{self, MediaType, Post};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK_RATE: Duration = Duration::from_millis(50);
const DEFAULT_PAGE_WIDTH: u16 = 80;
const MOUSE_SCROLL_LINES: i32 = 3;
const TOAST_HEIGHT: u16 = 3;
const TOAST_MAX_WIDTH: u16 = 48;

const MSG_LOAD_FAILED: &str = "Failed to load vlogs. Please try again later.";
const MSG_COMMENTS_FAILED: &str = "Failed to load comments";
const MSG_COMMENT_ADDED: &str = "Comment added successfully!";
const MSG_COMMENT_FAILED: &str = "Failed to add comment";
const MSG_UPLOADED: &str = "Vlog uploaded successfully!";
const MSG_UPLOAD_FAILED: &str = "Failed to upload vlog";

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        if self.last_tick.elapsed() >= Duration::from_millis(100) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = Instant::now();
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// The comment dialog shows either a post's comments or the add-comment form.
#[derive(Debug, Clone, PartialEq)]
enum CommentDialog {
    Closed,
    Viewing { post: Post, scroll: u16 },
    Composing(CommentForm),
}

enum AsyncResponse {
    Posts {
        request_id: u64,
        result: error::Result<Vec<Post>>,
    },
    Comments {
        request_id: u64,
        post_id: String,
        result: error::Result<Post>,
    },
    CommentSubmitted {
        post_id: String,
        result: error::Result<()>,
    },
    Uploaded {
        title: String,
        result: error::Result<()>,
    },
}

struct Page {
    lines: Vec<Line<'static>>,
    sections: Vec<(Section, usize)>,
    cards: Vec<Range<usize>>,
}

#[derive(Clone)]
pub struct Options {
    pub base_url: String,
    pub feed_service: Arc<dyn FeedService + Send + Sync>,
    pub comment_service: Arc<dyn CommentService + Send + Sync>,
    pub upload_service: Arc<dyn UploadService + Send + Sync>,
    pub upload_password_set: bool,
    pub video_command: Vec<String>,
    pub timing: Timing,
}

pub struct Model {
    state: FeedState,
    base_url: String,
    feed_service: Arc<dyn FeedService + Send + Sync>,
    comment_service: Arc<dyn CommentService + Send + Sync>,
    upload_service: Arc<dyn UploadService + Send + Sync>,
    upload_password_set: bool,
    video_command: Vec<String>,
    page_keys: Keymap,
    comment_view_keys: Keymap,
    notifier: Notifier,
    status_message: String,
    selected_card: usize,
    follow_selection: bool,
    scroll: u16,
    scroll_target: u16,
    page_width: Cell<u16>,
    comment_dialog: CommentDialog,
    upload_open: bool,
    upload_form: UploadForm,
    popup_area: Cell<Option<Rect>>,
    needs_redraw: bool,
    spinner: Spinner,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
    next_request_id: u64,
    pending_posts: Option<u64>,
    pending_comments: Option<u64>,
    submitting_comment: bool,
    uploading: bool,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let (response_tx, response_rx) = unbounded();
        let mut model = Self {
            state: FeedState::default(),
            base_url: opts.base_url,
            feed_service: opts.feed_service,
            comment_service: opts.comment_service,
            upload_service: opts.upload_service,
            upload_password_set: opts.upload_password_set,
            video_command: opts.video_command,
            page_keys: Keymap::page(),
            comment_view_keys: Keymap::comment_view(),
            notifier: Notifier::new(opts.timing),
            status_message: String::new(),
            selected_card: 0,
            follow_selection: false,
            scroll: 0,
            scroll_target: 0,
            page_width: Cell::new(DEFAULT_PAGE_WIDTH),
            comment_dialog: CommentDialog::Closed,
            upload_open: false,
            upload_form: UploadForm::default(),
            popup_area: Cell::new(None),
            needs_redraw: true,
            spinner: Spinner::new(),
            response_tx,
            response_rx,
            next_request_id: 1,
            pending_posts: None,
            pending_comments: None,
            submitting_comment: false,
            uploading: false,
        };
        model.reload_posts();
        model
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(DisableMouseCapture)?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = TICK_RATE
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(10));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                warn!(error = %err, "key handler failed");
                                self.notifier.error(format!("Error: {err}"));
                            }
                        }
                        self.mark_dirty();
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= TICK_RATE {
                last_tick = Instant::now();
                if self.tick(last_tick) {
                    self.mark_dirty();
                }
            }
        }

        Ok(())
    }

    /// Advances time-driven state. Returns true when a redraw is needed.
    fn tick(&mut self, now: Instant) -> bool {
        let mut ticked = false;
        if !self.notifier.is_empty() {
            self.notifier.prune(now);
            ticked = true;
        }
        if self.advance_scroll() {
            ticked = true;
        }
        if self.is_loading() {
            if self.spinner.advance() {
                ticked = true;
            }
        } else {
            self.spinner.reset();
        }
        ticked
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn is_loading(&self) -> bool {
        self.pending_posts.is_some()
            || self.pending_comments.is_some()
            || self.submitting_comment
            || self.uploading
    }

    fn next_request(&mut self) -> u64 {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        request_id
    }

    fn selected_post(&self) -> Option<&Post> {
        self.state.page().get(self.selected_card).copied()
    }

    fn clamp_selection(&mut self) {
        let len = self.state.page().len();
        if self.selected_card >= len {
            self.selected_card = len.saturating_sub(1);
        }
    }

    fn refresh_status(&mut self) {
        let shown = self.state.page().len();
        self.status_message = format!(
            "Showing {} of {} vlogs · {}",
            shown,
            self.state.visible_len(),
            self.state.filter().label()
        );
    }

    fn apply(&mut self, msg: Msg) {
        self.state = self.state.update(msg);
        self.clamp_selection();
        self.refresh_status();
        self.mark_dirty();
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if self.upload_open {
            self.handle_upload_key(code);
            return Ok(false);
        }
        match self.comment_dialog {
            CommentDialog::Composing(_) => {
                self.handle_comment_form_key(code);
                Ok(false)
            }
            CommentDialog::Viewing { .. } => match self.comment_view_keys.resolve(code) {
                Some(action) => self.dispatch(action),
                None => Ok(false),
            },
            CommentDialog::Closed => match self.page_keys.resolve(code) {
                Some(action) => self.dispatch(action),
                None => Ok(false),
            },
        }
    }

    fn dispatch(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::Quit => return Ok(true),
            Action::Filter(filter) => {
                self.selected_card = 0;
                self.apply(Msg::FilterSelected(filter));
                self.follow_selection = true;
            }
            Action::LoadMore => {
                if self.state.has_more() {
                    self.apply(Msg::PageExpanded);
                }
            }
            Action::NextCard => {
                let len = self.state.page().len();
                if len > 0 && self.selected_card + 1 < len {
                    self.selected_card += 1;
                }
                self.follow_selection = true;
            }
            Action::PreviousCard => {
                self.selected_card = self.selected_card.saturating_sub(1);
                self.follow_selection = true;
            }
            Action::ViewComments => self.open_comments(),
            Action::AddComment => self.open_comment_form(),
            Action::OpenUpload => {
                self.upload_open = true;
            }
            Action::OpenMedia => self.open_selected_media(),
            Action::Refresh => self.reload_posts(),
            Action::ScrollTo(section) => {
                self.scroll_target = to_u16(self.section_line(section));
            }
            Action::ScrollBy(delta) => {
                if let CommentDialog::Viewing { scroll, .. } = &mut self.comment_dialog {
                    *scroll = scroll.saturating_add_signed(delta as i16);
                } else {
                    self.scroll = self.scroll.saturating_add_signed(delta as i16);
                    self.scroll_target = self.scroll;
                }
            }
            Action::CloseDialog => self.close_comment_dialog(),
        }
        self.mark_dirty();
        Ok(false)
    }

    fn handle_comment_form_key(&mut self, code: KeyCode) {
        let CommentDialog::Composing(form) = &mut self.comment_dialog else {
            return;
        };
        match code {
            KeyCode::Esc => self.close_comment_dialog(),
            KeyCode::Tab | KeyCode::Down => form.next(),
            KeyCode::BackTab | KeyCode::Up => form.previous(),
            KeyCode::Enter => match form.active {
                CommentField::Name => form.next(),
                CommentField::Text => form.newline(),
                CommentField::Submit => self.submit_comment(),
                CommentField::Cancel => self.close_comment_dialog(),
            },
            KeyCode::Backspace => form.backspace(),
            KeyCode::Delete => form.clear_active(),
            KeyCode::Char(ch) if !ch.is_control() => form.insert_char(ch),
            _ => {}
        }
        self.mark_dirty();
    }

    fn handle_upload_key(&mut self, code: KeyCode) {
        let form = &mut self.upload_form;
        match code {
            KeyCode::Esc => self.close_upload_dialog(),
            KeyCode::Tab | KeyCode::Down => form.next(),
            KeyCode::BackTab | KeyCode::Up => form.previous(),
            KeyCode::Enter => match form.active {
                UploadField::Title | UploadField::MediaFile => form.next(),
                UploadField::Submit => self.submit_upload(),
                UploadField::Cancel => self.close_upload_dialog(),
            },
            KeyCode::Backspace => form.backspace(),
            KeyCode::Delete => form.clear_active(),
            KeyCode::Char(ch) if !ch.is_control() => form.insert_char(ch),
            _ => {}
        }
        self.mark_dirty();
    }

    /// Wheel events scroll the comment list when it is open, the page when no
    /// dialog is open, and nothing behind a form.
    fn wheel_scrolls(&self) -> bool {
        !self.upload_open && !matches!(self.comment_dialog, CommentDialog::Composing(_))
    }

    fn handle_mouse(&mut self, event: MouseEvent) {
        match event.kind {
            MouseEventKind::ScrollDown if self.wheel_scrolls() => {
                let _ = self.dispatch(Action::ScrollBy(MOUSE_SCROLL_LINES));
            }
            MouseEventKind::ScrollUp if self.wheel_scrolls() => {
                let _ = self.dispatch(Action::ScrollBy(-MOUSE_SCROLL_LINES));
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(popup) = self.popup_area.get() else {
                    return;
                };
                if contains(popup, event.column, event.row) {
                    return;
                }
                if self.upload_open {
                    self.close_upload_dialog();
                } else {
                    self.close_comment_dialog();
                }
            }
            _ => {}
        }
    }

    fn close_comment_dialog(&mut self) {
        if self.comment_dialog == CommentDialog::Closed {
            return;
        }
        self.comment_dialog = CommentDialog::Closed;
        self.popup_area.set(None);
        self.apply(Msg::DialogClosed);
    }

    fn close_upload_dialog(&mut self) {
        self.upload_open = false;
        self.popup_area.set(None);
        self.mark_dirty();
    }

    pub fn reload_posts(&mut self) {
        let request_id = self.next_request();
        self.pending_posts = Some(request_id);
        self.status_message = "Loading vlogs…".to_string();
        self.spinner.reset();
        debug!(request_id, "fetching vlog list");

        let tx = self.response_tx.clone();
        let service = self.feed_service.clone();
        thread::spawn(move || {
            let result = service.list_posts();
            let _ = tx.send(AsyncResponse::Posts { request_id, result });
        });
    }

    fn open_comments(&mut self) {
        let Some(post_id) = self.selected_post().map(|post| post.id.clone()) else {
            return;
        };
        let request_id = self.next_request();
        self.pending_comments = Some(request_id);
        self.status_message = "Loading comments…".to_string();

        let tx = self.response_tx.clone();
        let service = self.feed_service.clone();
        thread::spawn(move || {
            let result = service.get_post(&post_id);
            let _ = tx.send(AsyncResponse::Comments {
                request_id,
                post_id,
                result,
            });
        });
    }

    fn open_comment_form(&mut self) {
        let Some(post_id) = self.selected_post().map(|post| post.id.clone()) else {
            return;
        };
        self.comment_dialog = CommentDialog::Composing(CommentForm::new(post_id.clone()));
        self.apply(Msg::DialogOpened(post_id));
    }

    fn submit_comment(&mut self) {
        if self.submitting_comment {
            return;
        }
        let CommentDialog::Composing(form) = &mut self.comment_dialog else {
            return;
        };
        let comment = match form.submission() {
            Ok(comment) => comment,
            Err((field, missing)) => {
                form.active = field;
                self.notifier.info(missing.to_string());
                return;
            }
        };
        let post_id = form.post_id().to_string();
        self.submitting_comment = true;
        self.status_message = "Submitting comment…".to_string();

        let tx = self.response_tx.clone();
        let service = self.comment_service.clone();
        thread::spawn(move || {
            let result = service.add_comment(&post_id, &comment);
            let _ = tx.send(AsyncResponse::CommentSubmitted { post_id, result });
        });
    }

    fn submit_upload(&mut self) {
        if self.uploading {
            return;
        }
        let upload = match self.upload_form.submission() {
            Ok(upload) => upload,
            Err((field, missing)) => {
                self.upload_form.active = field;
                self.notifier.info(missing.to_string());
                return;
            }
        };
        self.uploading = true;
        self.status_message = format!("Uploading \"{}\"…", upload.title);

        let tx = self.response_tx.clone();
        let service = self.upload_service.clone();
        thread::spawn(move || {
            let result = service.upload_post(&upload);
            let _ = tx.send(AsyncResponse::Uploaded {
                title: upload.title,
                result,
            });
        });
    }

    fn open_selected_media(&mut self) {
        let Some(post) = self.selected_post() else {
            return;
        };
        let url = vlogs::media_url(&self.base_url, &post.media_path);
        let outcome = if post.media_type == MediaType::Video {
            player::spawn_video_player(&self.video_command, &url)
        } else {
            player::open_in_browser(&url)
        };
        match outcome {
            Ok(()) => self.status_message = format!("Opened {url}"),
            Err(err) => {
                warn!(error = %err, url = %url, "open media failed");
                self.notifier.error(format!("Failed to open media: {err}"));
            }
        }
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Posts { request_id, result } => {
                if self.pending_posts != Some(request_id) {
                    debug!(request_id, "discarding stale vlog list");
                    return;
                }
                self.pending_posts = None;
                match result {
                    Ok(posts) => {
                        debug!(count = posts.len(), "vlog list loaded");
                        self.apply(Msg::PostsLoaded(posts));
                    }
                    Err(err) => {
                        warn!(error = %err, "vlog list failed");
                        self.notifier.error(MSG_LOAD_FAILED);
                        self.refresh_status();
                    }
                }
            }
            AsyncResponse::Comments {
                request_id,
                post_id,
                result,
            } => {
                if self.pending_comments != Some(request_id) {
                    debug!(request_id, "discarding stale comments");
                    return;
                }
                self.pending_comments = None;
                match result {
                    Ok(post) => {
                        self.comment_dialog = CommentDialog::Viewing { post, scroll: 0 };
                        self.apply(Msg::DialogOpened(post_id));
                    }
                    Err(err) => {
                        warn!(error = %err, post = %post_id, "comments failed");
                        self.notifier.error(MSG_COMMENTS_FAILED);
                        self.refresh_status();
                    }
                }
            }
            AsyncResponse::CommentSubmitted { post_id, result } => {
                self.submitting_comment = false;
                match result {
                    Ok(()) => {
                        info!(post = %post_id, "comment added");
                        self.notifier.success(MSG_COMMENT_ADDED);
                        if let CommentDialog::Composing(form) = &mut self.comment_dialog {
                            if form.post_id() == post_id {
                                form.reset();
                                self.close_comment_dialog();
                            }
                        }
                        self.reload_posts();
                    }
                    Err(err) => {
                        warn!(error = %err, post = %post_id, "comment failed");
                        self.notifier.error(MSG_COMMENT_FAILED);
                        self.refresh_status();
                    }
                }
            }
            AsyncResponse::Uploaded { title, result } => {
                self.uploading = false;
                match result {
                    Ok(()) => {
                        info!(title = %title, "vlog uploaded");
                        self.notifier.success(MSG_UPLOADED);
                        self.upload_form.reset();
                        self.close_upload_dialog();
                        self.reload_posts();
                    }
                    Err(err) => {
                        warn!(error = %err, title = %title, "upload failed");
                        let message = err
                            .backend_message()
                            .map(str::to_string)
                            .unwrap_or_else(|| MSG_UPLOAD_FAILED.to_string());
                        self.notifier.error(message);
                        self.refresh_status();
                    }
                }
            }
        }
        self.mark_dirty();
    }

    fn advance_scroll(&mut self) -> bool {
        if self.scroll == self.scroll_target {
            return false;
        }
        let diff = i32::from(self.scroll_target) - i32::from(self.scroll);
        let step = (diff.abs() / 3).max(1) * diff.signum();
        self.scroll = to_u16((i32::from(self.scroll) + step).max(0) as usize);
        true
    }

    fn section_line(&self, section: Section) -> usize {
        self.compose_page(self.page_width.get())
            .sections
            .iter()
            .find(|(candidate, _)| *candidate == section)
            .map(|(_, line)| *line)
            .unwrap_or(0)
    }

    fn current_section(&self, sections: &[(Section, usize)]) -> Section {
        sections
            .iter()
            .rev()
            .find(|(_, line)| *line <= usize::from(self.scroll_target))
            .map(|(section, _)| *section)
            .unwrap_or(Section::Home)
    }

    fn compose_page(&self, width: u16) -> Page {
        let width = usize::from(width.max(20));
        let heading = Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD);
        let secondary = Style::default().fg(COLOR_TEXT_SECONDARY);
        let mut lines: Vec<Line<'static>> = Vec::new();
        let mut sections = Vec::new();

        sections.push((Section::Home, lines.len()));
        lines.push(Line::from(Span::styled("Vlog-TUI", heading)));
        lines.push(Line::from(Span::styled(
            "Videos and photos from the road, straight to your terminal.",
            secondary,
        )));
        let all = self.state.all_posts();
        let videos = all.iter().filter(|p| p.media_type == MediaType::Video).count();
        let images = all.iter().filter(|p| p.media_type == MediaType::Image).count();
        lines.push(Line::from(Span::styled(
            format!("{} vlogs · {} videos · {} images", all.len(), videos, images),
            secondary,
        )));
        lines.push(Line::default());

        sections.push((Section::Vlogs, lines.len()));
        lines.push(Line::from(Span::styled("Latest Vlogs", heading)));
        let grid = render::render_grid(
            &self.state,
            &GridContext {
                base_url: &self.base_url,
                width,
                selected: Some(self.selected_card),
            },
        );
        let offset = lines.len();
        lines.extend(grid.lines);
        let cards = grid
            .cards
            .into_iter()
            .map(|range| range.start + offset..range.end + offset)
            .collect();
        lines.push(Line::default());

        sections.push((Section::Upload, lines.len()));
        lines.push(Line::from(Span::styled("Share a Vlog", heading)));
        lines.push(Line::from(Span::styled(
            "Press u to upload a video or image with a title.",
            secondary,
        )));
        if !self.upload_password_set {
            lines.push(Line::from(Span::styled(
                "No upload password configured; the server will reject uploads.",
                Style::default().fg(COLOR_ERROR),
            )));
        }

        Page {
            lines,
            sections,
            cards,
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_text = if self.is_loading() {
            format!("{} {}", self.spinner.frame(), self.status_message)
        } else {
            self.status_message.clone()
        };
        frame.render_widget(
            Paragraph::new(status_text).style(
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .bg(COLOR_PANEL_FOCUSED_BG)
                    .add_modifier(Modifier::BOLD),
            ),
            layout[0],
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER_IDLE))
            .style(Style::default().bg(COLOR_PANEL_BG));
        let inner = block.inner(layout[2]);
        self.page_width.set(inner.width);
        let page = self.compose_page(inner.width);
        let height = usize::from(inner.height);

        if self.follow_selection {
            if let Some(range) = page.cards.get(self.selected_card) {
                let top = usize::from(self.scroll_target);
                if range.start < top {
                    self.scroll_target = to_u16(range.start);
                } else if height > 0 && range.end > top + height {
                    self.scroll_target = to_u16(range.end - height);
                }
            }
            self.follow_selection = false;
        }
        let max_scroll = to_u16(page.lines.len().saturating_sub(height));
        self.scroll_target = self.scroll_target.min(max_scroll);
        self.scroll = self.scroll.min(max_scroll);

        let current = self.current_section(&page.sections);
        let mut nav = Vec::new();
        for (idx, section) in Section::ALL.iter().enumerate() {
            let style = if *section == current {
                Style::default()
                    .fg(COLOR_BG)
                    .bg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(COLOR_TEXT_SECONDARY)
            };
            nav.push(Span::styled(format!(" {} {} ", idx + 1, section.title()), style));
            nav.push(Span::raw(" "));
        }
        frame.render_widget(
            Paragraph::new(Line::from(nav)).style(Style::default().bg(COLOR_PANEL_BG)),
            layout[1],
        );

        frame.render_widget(
            Paragraph::new(Text::from(page.lines))
                .block(block)
                .scroll((self.scroll, 0)),
            layout[2],
        );

        frame.render_widget(
            Paragraph::new(self.footer_text())
                .style(
                    Style::default()
                        .fg(COLOR_TEXT_SECONDARY)
                        .bg(COLOR_PANEL_BG)
                        .add_modifier(Modifier::ITALIC),
                )
                .alignment(Alignment::Center),
            layout[3],
        );

        self.popup_area.set(None);
        if self.comment_dialog != CommentDialog::Closed {
            self.draw_comment_dialog(frame, layout[2]);
        }
        if self.upload_open {
            self.draw_upload_dialog(frame, layout[2]);
        }
        self.draw_toasts(frame, layout[2]);
    }

    fn dialog_block(title: &'static str) -> Block<'static> {
        Block::default()
            .title(Span::styled(
                title,
                Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_ACCENT))
            .style(Style::default().bg(COLOR_PANEL_BG))
    }

    fn draw_comment_dialog(&self, frame: &mut Frame<'_>, area: Rect) {
        let popup = centered_rect(70, 70, area);
        let width = usize::from(popup.width.saturating_sub(3));
        let (text, scroll, title) = match &self.comment_dialog {
            CommentDialog::Viewing { post, scroll } => {
                (render::render_comment_dialog(post, width), *scroll, "Comments")
            }
            CommentDialog::Composing(form) => {
                (render::render_comment_form(form, width), 0, "Comment")
            }
            CommentDialog::Closed => return,
        };
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(text)
                .block(Self::dialog_block(title))
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            popup,
        );
        self.popup_area.set(Some(popup));
    }

    fn draw_upload_dialog(&self, frame: &mut Frame<'_>, area: Rect) {
        let popup = centered_rect(60, 60, area);
        let width = usize::from(popup.width.saturating_sub(3));
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(render::render_upload_form(&self.upload_form, width))
                .block(Self::dialog_block("Upload"))
                .wrap(Wrap { trim: false }),
            popup,
        );
        self.popup_area.set(Some(popup));
    }

    fn draw_toasts(&self, frame: &mut Frame<'_>, area: Rect) {
        let max_width = area.width.saturating_sub(2).min(TOAST_MAX_WIDTH);
        if max_width < 10 {
            return;
        }
        let mut bottom = area.bottom();
        for (toast, phase) in self.notifier.on_screen(Instant::now()).iter().rev() {
            if bottom < area.y + TOAST_HEIGHT {
                break;
            }
            let width = to_u16(UnicodeWidthStr::width(toast.message.as_str()) + 4).min(max_width);
            let rect = Rect::new(
                area.right().saturating_sub(width + 1),
                bottom - TOAST_HEIGHT,
                width,
                TOAST_HEIGHT,
            );
            let color = match toast.severity {
                Severity::Info => COLOR_ACCENT,
                Severity::Success => COLOR_SUCCESS,
                Severity::Error => COLOR_ERROR,
            };
            let mut style = Style::default().fg(color).bg(COLOR_PANEL_FOCUSED_BG);
            if *phase == Phase::Leaving {
                style = style.add_modifier(Modifier::DIM);
            }
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(toast.message.clone()).style(style).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                ),
                rect,
            );
            bottom -= TOAST_HEIGHT;
        }
    }

    fn footer_text(&self) -> String {
        if self.upload_open || matches!(self.comment_dialog, CommentDialog::Composing(_)) {
            return "Tab/Shift-Tab change field · Enter next/submit · Esc close".to_string();
        }
        if matches!(self.comment_dialog, CommentDialog::Viewing { .. }) {
            return self.comment_view_keys.footer();
        }
        self.page_keys.footer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mock::{MockBackend, RejectingUploads};
    use crate::error::GatewayError;
    use crate::render::EMPTY_COMMENTS;
    use crate::state::MediaFilter;
    use crate::vlogs::Comment;
    use crossterm::event::KeyModifiers;

    fn post(id: &str, media_type: MediaType, comments: Vec<Comment>) -> Post {
        Post {
            id: id.into(),
            title: format!("Vlog {id}"),
            media_type,
            media_path: format!("uploads/{id}"),
            upload_date: "2024-03-15T12:00:00Z".into(),
            comments,
        }
    }

    fn feed() -> Vec<Post> {
        let mut posts: Vec<Post> = (0..5)
            .map(|n| post(&format!("v{n}"), MediaType::Video, Vec::new()))
            .collect();
        posts.extend((0..3).map(|n| post(&format!("i{n}"), MediaType::Image, Vec::new())));
        posts
    }

    fn model_with(backend: Arc<MockBackend>, uploads: Arc<dyn UploadService + Send + Sync>) -> Model {
        let mut model = Model::new(Options {
            base_url: "http://vlogs.test".into(),
            feed_service: backend.clone(),
            comment_service: backend,
            upload_service: uploads,
            upload_password_set: true,
            video_command: vec!["true".into()],
            timing: Timing::default(),
        });
        model.settle();
        model
    }

    fn model() -> (Model, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new(feed()));
        (model_with(backend.clone(), backend.clone()), backend)
    }

    impl Model {
        fn settle(&mut self) {
            while self.is_loading() {
                let message = self
                    .response_rx
                    .recv_timeout(Duration::from_secs(5))
                    .expect("async response");
                self.handle_async_response(message);
            }
        }

        fn press(&mut self, code: KeyCode) {
            self.handle_key(code).unwrap();
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn toasts(&self) -> Vec<(String, Severity)> {
            self.notifier
                .messages()
                .map(|(msg, severity)| (msg.to_string(), severity))
                .collect()
        }
    }

    #[test]
    fn startup_loads_first_page() {
        let (model, _) = model();
        assert_eq!(model.state.all_posts().len(), 8);
        assert_eq!(model.state.page().len(), 4);
        assert!(model.state.has_more());
        assert_eq!(model.status_message, "Showing 4 of 8 vlogs · All");
    }

    #[test]
    fn filter_and_load_more_keys() {
        let (mut model, _) = model();
        model.press(KeyCode::Char('m'));
        assert_eq!(model.state.visible_count(), 8);
        model.press(KeyCode::Char('i'));
        assert_eq!(model.state.filter(), MediaFilter::Image);
        assert_eq!(model.state.visible_count(), 4);
        assert_eq!(model.state.page().len(), 3);
        assert!(!model.state.has_more());
        model.press(KeyCode::Char('m'));
        assert_eq!(model.state.visible_count(), 4);
    }

    #[test]
    fn list_failure_is_reported_and_app_stays_usable() {
        let backend = Arc::new(MockBackend::new(feed()));
        backend.set_list_failure(true);
        let mut model = model_with(backend.clone(), backend.clone());
        assert!(model.state.all_posts().is_empty());
        assert_eq!(
            model.toasts(),
            [(MSG_LOAD_FAILED.to_string(), Severity::Error)]
        );
        backend.set_list_failure(false);
        model.press(KeyCode::Char('r'));
        model.settle();
        assert_eq!(model.state.all_posts().len(), 8);
    }

    #[test]
    fn stale_list_response_is_discarded() {
        let (mut model, _) = model();
        model.reload_posts();
        let stale = model.pending_posts.unwrap() - 1;
        model.handle_async_response(AsyncResponse::Posts {
            request_id: stale,
            result: Ok(Vec::new()),
        });
        assert_eq!(model.state.all_posts().len(), 8);
        model.settle();
        assert_eq!(model.state.all_posts().len(), 8);
    }

    #[test]
    fn viewing_post_without_comments_shows_placeholder() {
        let (mut model, _) = model();
        model.press(KeyCode::Enter);
        model.settle();
        let CommentDialog::Viewing { post, .. } = &model.comment_dialog else {
            panic!("comment dialog not open");
        };
        assert_eq!(post.id, "v0");
        assert_eq!(model.state.active_dialog_post(), Some("v0"));
        let text = render::render_comment_dialog(post, 60);
        assert!(text
            .lines
            .iter()
            .any(|line| line.spans.iter().any(|s| s.content == EMPTY_COMMENTS)));

        model.press(KeyCode::Esc);
        assert_eq!(model.comment_dialog, CommentDialog::Closed);
        assert_eq!(model.state.active_dialog_post(), None);
    }

    #[test]
    fn submitted_comment_round_trips() {
        let (mut model, _) = model();
        model.press(KeyCode::Char('j'));
        model.press(KeyCode::Char('c'));
        model.type_text("Ana María");
        model.press(KeyCode::Tab);
        model.type_text("What a view");
        model.press(KeyCode::Enter);
        model.type_text("  wow");
        model.press(KeyCode::Tab);
        model.press(KeyCode::Enter);
        model.settle();

        assert_eq!(model.comment_dialog, CommentDialog::Closed);
        assert_eq!(
            model.toasts(),
            [(MSG_COMMENT_ADDED.to_string(), Severity::Success)]
        );
        let refreshed = model.state.all_posts().iter().find(|p| p.id == "v1").unwrap();
        assert_eq!(refreshed.comments.len(), 1);

        model.press(KeyCode::Enter);
        model.settle();
        let CommentDialog::Viewing { post, .. } = &model.comment_dialog else {
            panic!("comment dialog not open");
        };
        let last = post.comments.last().unwrap();
        assert_eq!(last.author_name, "Ana María");
        assert_eq!(last.text, "What a view\n  wow");
    }

    #[test]
    fn empty_required_field_blocks_submission() {
        let (mut model, backend) = model();
        model.press(KeyCode::Char('c'));
        model.press(KeyCode::Tab);
        model.press(KeyCode::Tab);
        model.press(KeyCode::Enter);
        assert!(!model.submitting_comment);
        let CommentDialog::Composing(form) = &model.comment_dialog else {
            panic!("form closed");
        };
        assert_eq!(form.active, CommentField::Name);
        assert_eq!(model.toasts()[0].1, Severity::Info);
        assert!(backend.posts().iter().all(|p| p.comments.is_empty()));
    }

    #[test]
    fn rejected_upload_keeps_dialog_and_values() {
        let backend = Arc::new(MockBackend::new(feed()));
        let uploads = RejectingUploads(GatewayError::Auth("Invalid password".into()));
        let mut model = model_with(backend, Arc::new(uploads));
        model.press(KeyCode::Char('u'));
        model.type_text("Sunset");
        model.press(KeyCode::Tab);
        model.type_text("/tmp/sunset.jpg");
        model.press(KeyCode::Tab);
        model.press(KeyCode::Enter);
        model.settle();

        assert!(model.upload_open);
        assert_eq!(model.upload_form.title, "Sunset");
        assert_eq!(model.upload_form.media_file, "/tmp/sunset.jpg");
        assert_eq!(
            model.toasts(),
            [("Invalid password".to_string(), Severity::Error)]
        );
    }

    fn rejected_upload_toast(err: GatewayError) -> Vec<(String, Severity)> {
        let backend = Arc::new(MockBackend::new(feed()));
        let mut model = model_with(backend, Arc::new(RejectingUploads(err)));
        model.press(KeyCode::Char('u'));
        model.type_text("Harbor");
        model.press(KeyCode::Tab);
        model.type_text("/tmp/harbor.mp4");
        model.press(KeyCode::Tab);
        model.press(KeyCode::Enter);
        model.settle();
        assert!(model.upload_open);
        model.toasts()
    }

    #[test]
    fn server_error_on_upload_shows_backend_text() {
        assert_eq!(
            rejected_upload_toast(GatewayError::Status {
                status: 500,
                message: Some("Storage quota exceeded".into()),
            }),
            [("Storage quota exceeded".to_string(), Severity::Error)]
        );
        assert_eq!(
            rejected_upload_toast(GatewayError::Status {
                status: 502,
                message: None,
            }),
            [(MSG_UPLOAD_FAILED.to_string(), Severity::Error)]
        );
        assert_eq!(
            rejected_upload_toast(GatewayError::Network("connection refused".into())),
            [(MSG_UPLOAD_FAILED.to_string(), Severity::Error)]
        );
    }

    #[test]
    fn repeated_submit_while_uploading_sends_once() {
        let (mut model, backend) = model();
        model.press(KeyCode::Char('u'));
        model.type_text("Harbor");
        model.press(KeyCode::Tab);
        model.type_text("/tmp/harbor.mp4");
        model.press(KeyCode::Tab);
        model.press(KeyCode::Enter);
        model.press(KeyCode::Enter);
        model.settle();
        assert_eq!(backend.posts().len(), 9);
    }

    #[test]
    fn repeated_submit_while_commenting_sends_once() {
        let (mut model, backend) = model();
        model.press(KeyCode::Char('c'));
        model.type_text("Ana");
        model.press(KeyCode::Tab);
        model.type_text("hello");
        model.press(KeyCode::Tab);
        model.press(KeyCode::Enter);
        model.press(KeyCode::Enter);
        model.settle();
        assert_eq!(backend.posts()[0].comments.len(), 1);
    }

    #[test]
    fn failed_comment_keeps_form_and_values() {
        let (mut model, backend) = model();
        backend.reject_comments(Some(GatewayError::Validation("Text is required".into())));
        model.press(KeyCode::Char('c'));
        model.type_text("Ana");
        model.press(KeyCode::Tab);
        model.type_text("Lovely light");
        model.press(KeyCode::Tab);
        model.press(KeyCode::Enter);
        model.settle();

        let CommentDialog::Composing(form) = &model.comment_dialog else {
            panic!("comment form closed after failure");
        };
        assert_eq!(form.post_id(), "v0");
        assert_eq!(form.name, "Ana");
        assert_eq!(form.text, "Lovely light");
        assert_eq!(model.state.active_dialog_post(), Some("v0"));
        assert_eq!(
            model.toasts(),
            [(MSG_COMMENT_FAILED.to_string(), Severity::Error)]
        );
        assert!(backend.posts()[0].comments.is_empty());
    }

    #[test]
    fn failed_comment_fetch_leaves_dialog_closed() {
        let (mut model, backend) = model();
        backend.set_get_failure(true);
        model.press(KeyCode::Enter);
        model.settle();

        assert_eq!(model.comment_dialog, CommentDialog::Closed);
        assert_eq!(model.state.active_dialog_post(), None);
        assert_eq!(
            model.toasts(),
            [(MSG_COMMENTS_FAILED.to_string(), Severity::Error)]
        );
    }

    fn wheel(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 5,
            row: 5,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn wheel_does_not_scroll_page_behind_forms() {
        let (mut model, _) = model();
        model.press(KeyCode::Char('u'));
        model.handle_mouse(wheel(MouseEventKind::ScrollDown));
        assert_eq!((model.scroll, model.scroll_target), (0, 0));
        model.press(KeyCode::Esc);

        model.press(KeyCode::Char('c'));
        model.handle_mouse(wheel(MouseEventKind::ScrollDown));
        assert_eq!((model.scroll, model.scroll_target), (0, 0));
        model.press(KeyCode::Esc);

        model.handle_mouse(wheel(MouseEventKind::ScrollDown));
        assert_eq!(model.scroll, MOUSE_SCROLL_LINES as u16);
    }

    #[test]
    fn wheel_scrolls_comment_list_not_page() {
        let (mut model, _) = model();
        model.press(KeyCode::Enter);
        model.settle();
        model.handle_mouse(wheel(MouseEventKind::ScrollDown));
        let CommentDialog::Viewing { scroll, .. } = &model.comment_dialog else {
            panic!("comment dialog not open");
        };
        assert_eq!(*scroll, MOUSE_SCROLL_LINES as u16);
        assert_eq!(model.scroll, 0);
    }

    #[test]
    fn successful_upload_resets_form_and_refreshes() {
        let (mut model, _) = model();
        model.press(KeyCode::Char('u'));
        model.type_text("Harbor");
        model.press(KeyCode::Tab);
        model.type_text("/tmp/harbor.mp4");
        model.press(KeyCode::Tab);
        model.press(KeyCode::Enter);
        model.settle();

        assert!(!model.upload_open);
        assert_eq!(model.upload_form, UploadForm::default());
        assert_eq!(model.state.all_posts().len(), 9);
        assert_eq!(model.state.all_posts()[0].title, "Harbor");
        assert_eq!(model.state.all_posts()[0].media_type, MediaType::Video);
    }

    #[test]
    fn backdrop_click_closes_dialog() {
        let (mut model, _) = model();
        model.press(KeyCode::Char('u'));
        model.popup_area.set(Some(Rect::new(10, 5, 30, 10)));
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        model.handle_mouse(click(15, 8));
        assert!(model.upload_open);
        model.handle_mouse(click(1, 1));
        assert!(!model.upload_open);
    }

    #[test]
    fn section_jump_scrolls_smoothly() {
        let (mut model, _) = model();
        model.press(KeyCode::Char('3'));
        let target = model.scroll_target;
        assert!(target > 0);
        let mut steps = 0;
        while model.advance_scroll() {
            steps += 1;
        }
        assert!(steps > 1);
        assert_eq!(model.scroll, target);
        assert_eq!(model.state.filter(), MediaFilter::All);
    }

    #[test]
    fn selection_stays_within_page() {
        let (mut model, _) = model();
        for _ in 0..10 {
            model.press(KeyCode::Char('j'));
        }
        assert_eq!(model.selected_card, 3);
        model.press(KeyCode::Char('i'));
        assert_eq!(model.selected_card, 0);
    }
}
