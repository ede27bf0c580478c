use std::ops::Range;

use chrono::Local;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use textwrap::wrap;

use crate::forms::{CommentField, CommentForm, UploadField, UploadForm};
use crate::state::{FeedState, MediaFilter};
use crate::vlogs::{self, Post};

pub const COLOR_BG: Color = Color::Rgb(30, 30, 46);
pub const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
pub const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
pub const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
pub const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
pub const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
pub const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
pub const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
pub const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);
pub const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

pub const EMPTY_GRID: &str = "No vlogs found matching your criteria.";
pub const EMPTY_COMMENTS: &str = "No comments yet. Be the first to comment!";
const ICON_VIDEO: &str = "▶";
const ICON_IMAGE: &str = "▣";
const ICON_COMMENTS: &str = "💬";
const SELECTED_GUTTER: &str = "┃ ";
const IDLE_GUTTER: &str = "  ";

pub struct GridContext<'a> {
    pub base_url: &'a str,
    pub width: usize,
    pub selected: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    pub lines: Vec<Line<'static>>,
    /// Line range of each rendered card within `lines`.
    pub cards: Vec<Range<usize>>,
    pub load_more_visible: bool,
}

/// Browser-style short date in local time, without the time of day.
pub fn format_date(raw: &str) -> String {
    match vlogs::parse_timestamp(raw) {
        Some(ts) => ts.with_timezone(&Local).format("%-m/%-d/%Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

pub fn comment_count_label(count: usize) -> String {
    if count == 1 {
        "1 Comment".to_string()
    } else {
        format!("{count} Comments")
    }
}

fn primary() -> Style {
    Style::default().fg(COLOR_TEXT_PRIMARY)
}

fn secondary() -> Style {
    Style::default().fg(COLOR_TEXT_SECONDARY)
}

fn button(label: String, active: bool) -> Span<'static> {
    let style = if active {
        Style::default()
            .fg(COLOR_BG)
            .bg(COLOR_ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(COLOR_ACCENT).bg(COLOR_PANEL_FOCUSED_BG)
    };
    Span::styled(format!("[ {label} ]"), style)
}

fn wrap_plain(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    let width = width.max(8);
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        if raw.is_empty() {
            lines.push(Line::from(Span::styled(String::new(), style)));
            continue;
        }
        for piece in wrap(raw, width) {
            lines.push(Line::from(Span::styled(piece.into_owned(), style)));
        }
    }
    lines
}

fn with_gutter(mut line: Line<'static>, selected: bool) -> Line<'static> {
    let gutter = if selected {
        Span::styled(SELECTED_GUTTER, Style::default().fg(COLOR_ACCENT))
    } else {
        Span::raw(IDLE_GUTTER)
    };
    line.spans.insert(0, gutter);
    line
}

pub fn render_filter_bar(active: MediaFilter) -> Line<'static> {
    let mut spans = vec![Span::styled("Show: ", secondary())];
    for (idx, filter) in MediaFilter::ALL.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(button(filter.label().to_string(), *filter == active));
    }
    Line::from(spans)
}

pub fn render_card(post: &Post, selected: bool, base_url: &str, width: usize) -> Vec<Line<'static>> {
    let inner = width.saturating_sub(IDLE_GUTTER.len()).max(8);
    let url = vlogs::media_url(base_url, &post.media_path);
    let mut lines = Vec::new();

    let media = if post.media_type.is_video() {
        Line::from(vec![
            Span::styled(
                format!("{ICON_VIDEO} VIDEO "),
                Style::default().fg(COLOR_SUCCESS).add_modifier(Modifier::BOLD),
            ),
            Span::styled(url, secondary().add_modifier(Modifier::UNDERLINED)),
        ])
    } else {
        Line::from(vec![
            Span::styled(
                format!("{ICON_IMAGE} IMAGE "),
                Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(url, secondary().add_modifier(Modifier::UNDERLINED)),
        ])
    };
    lines.push(media);

    let title_style = if selected {
        primary().add_modifier(Modifier::BOLD)
    } else {
        primary()
    };
    lines.extend(wrap_plain(&post.title, inner, title_style));
    lines.push(Line::from(Span::styled(format_date(&post.upload_date), secondary())));
    lines.push(Line::from(vec![
        button(
            format!("{ICON_COMMENTS} {}", comment_count_label(post.comments.len())),
            false,
        ),
        Span::raw(" "),
        button("+ Add Comment".to_string(), false),
    ]));

    let mut lines: Vec<Line<'static>> = lines
        .into_iter()
        .map(|line| with_gutter(line, selected))
        .collect();
    lines.push(Line::default());
    lines
}

/// Projects the visible page of the feed into lines. Pure: equal inputs
/// produce equal output.
pub fn render_grid(state: &FeedState, ctx: &GridContext<'_>) -> GridView {
    let mut lines = vec![render_filter_bar(state.filter()), Line::default()];
    let mut cards = Vec::new();

    let page = state.page();
    if page.is_empty() {
        lines.push(Line::from(Span::styled(
            EMPTY_GRID,
            secondary().add_modifier(Modifier::ITALIC),
        )));
    }
    for (idx, post) in page.iter().enumerate() {
        let start = lines.len();
        lines.extend(render_card(
            post,
            ctx.selected == Some(idx),
            ctx.base_url,
            ctx.width,
        ));
        cards.push(start..lines.len());
    }

    let load_more_visible = state.has_more();
    if load_more_visible {
        lines.push(Line::from(vec![
            button("Load More".to_string(), false),
            Span::styled(
                format!("  {} of {}", page.len(), state.visible_len()),
                secondary(),
            ),
        ]));
    }

    GridView {
        lines,
        cards,
        load_more_visible,
    }
}

pub fn render_comment_dialog(post: &Post, width: usize) -> Text<'static> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("Comments for \"{}\"", post.title),
            Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];

    if post.comments.is_empty() {
        lines.push(Line::from(Span::styled(
            EMPTY_COMMENTS,
            secondary().add_modifier(Modifier::ITALIC),
        )));
    }
    for comment in &post.comments {
        lines.push(Line::from(Span::styled(
            comment.author_name.clone(),
            primary().add_modifier(Modifier::BOLD),
        )));
        lines.extend(wrap_plain(&comment.text, width, primary()));
        lines.push(Line::from(Span::styled(format_date(&comment.date), secondary())));
        lines.push(Line::default());
    }

    lines.push(Line::from(button("Close".to_string(), true)));
    Text::from(lines)
}

fn input_lines(label: &str, value: &str, active: bool, width: usize) -> Vec<Line<'static>> {
    let label_style = if active {
        Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD)
    } else {
        secondary()
    };
    let value_style = Style::default().fg(COLOR_TEXT_PRIMARY).bg(if active {
        COLOR_PANEL_SELECTED_BG
    } else {
        COLOR_PANEL_FOCUSED_BG
    });
    let mut lines = vec![Line::from(Span::styled(format!("{label} *"), label_style))];
    let shown = if active { format!("{value}▏") } else { value.to_string() };
    let mut body = wrap_plain(&shown, width, value_style);
    if body.is_empty() {
        body.push(Line::from(Span::styled(String::new(), value_style)));
    }
    lines.extend(body);
    lines.push(Line::default());
    lines
}

pub fn render_comment_form(form: &CommentForm, width: usize) -> Text<'static> {
    let mut lines = vec![
        Line::from(Span::styled(
            "Add Comment",
            Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    lines.extend(input_lines(
        CommentField::Name.label(),
        &form.name,
        form.active == CommentField::Name,
        width,
    ));
    lines.extend(input_lines(
        CommentField::Text.label(),
        &form.text,
        form.active == CommentField::Text,
        width,
    ));
    lines.push(Line::from(vec![
        button(
            CommentField::Submit.label().to_string(),
            form.active == CommentField::Submit,
        ),
        Span::raw(" "),
        button(
            CommentField::Cancel.label().to_string(),
            form.active == CommentField::Cancel,
        ),
    ]));
    Text::from(lines)
}

pub fn render_upload_form(form: &UploadForm, width: usize) -> Text<'static> {
    let mut lines = vec![
        Line::from(Span::styled(
            "Upload Vlog",
            Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    lines.extend(input_lines(
        UploadField::Title.label(),
        &form.title,
        form.active == UploadField::Title,
        width,
    ));
    lines.extend(input_lines(
        UploadField::MediaFile.label(),
        &form.media_file,
        form.active == UploadField::MediaFile,
        width,
    ));
    lines.push(Line::from(vec![
        button(
            UploadField::Submit.label().to_string(),
            form.active == UploadField::Submit,
        ),
        Span::raw(" "),
        button(
            UploadField::Cancel.label().to_string(),
            form.active == UploadField::Cancel,
        ),
    ]));
    Text::from(lines)
}
