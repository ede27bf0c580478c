use std::collections::HashMap;

use crossterm::event::KeyCode;

use crate::state::MediaFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Home,
    Vlogs,
    Upload,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Home, Section::Vlogs, Section::Upload];

    pub fn title(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Vlogs => "Vlogs",
            Section::Upload => "Upload",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Filter(MediaFilter),
    LoadMore,
    NextCard,
    PreviousCard,
    ViewComments,
    AddComment,
    OpenUpload,
    OpenMedia,
    Refresh,
    ScrollTo(Section),
    ScrollBy(i32),
    CloseDialog,
    Quit,
}

/// Key-to-action table for one interaction context, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeyCode, Action>,
    hints: Vec<(&'static str, &'static str)>,
}

impl Keymap {
    pub fn page() -> Self {
        let mut map = Keymap::default();
        map.bind(&[KeyCode::Char('a')], Action::Filter(MediaFilter::All), "a/v/i", "filter");
        map.bind(&[KeyCode::Char('v')], Action::Filter(MediaFilter::Video), "", "");
        map.bind(&[KeyCode::Char('i')], Action::Filter(MediaFilter::Image), "", "");
        map.bind(&[KeyCode::Char('j'), KeyCode::Down], Action::NextCard, "j/k", "move");
        map.bind(&[KeyCode::Char('k'), KeyCode::Up], Action::PreviousCard, "", "");
        map.bind(&[KeyCode::Enter], Action::ViewComments, "Enter", "comments");
        map.bind(&[KeyCode::Char('c')], Action::AddComment, "c", "add comment");
        map.bind(&[KeyCode::Char('m'), KeyCode::Char(' ')], Action::LoadMore, "m", "load more");
        map.bind(&[KeyCode::Char('o')], Action::OpenMedia, "o", "open media");
        map.bind(&[KeyCode::Char('u')], Action::OpenUpload, "u", "upload");
        map.bind(&[KeyCode::Char('r')], Action::Refresh, "r", "refresh");
        map.bind(&[KeyCode::Char('1')], Action::ScrollTo(Section::Home), "1-3", "sections");
        map.bind(&[KeyCode::Char('2')], Action::ScrollTo(Section::Vlogs), "", "");
        map.bind(&[KeyCode::Char('3')], Action::ScrollTo(Section::Upload), "", "");
        map.bind(&[KeyCode::PageDown], Action::ScrollBy(10), "", "");
        map.bind(&[KeyCode::PageUp], Action::ScrollBy(-10), "", "");
        map.bind(&[KeyCode::Char('q')], Action::Quit, "q", "quit");
        map
    }

    pub fn comment_view() -> Self {
        let mut map = Keymap::default();
        map.bind(
            &[KeyCode::Esc, KeyCode::Enter, KeyCode::Char('q')],
            Action::CloseDialog,
            "Esc",
            "close",
        );
        map.bind(&[KeyCode::Char('j'), KeyCode::Down], Action::ScrollBy(1), "j/k", "scroll");
        map.bind(&[KeyCode::Char('k'), KeyCode::Up], Action::ScrollBy(-1), "", "");
        map
    }

    fn bind(&mut self, keys: &[KeyCode], action: Action, key_hint: &'static str, hint: &'static str) {
        for key in keys {
            self.bindings.insert(*key, action);
        }
        if !key_hint.is_empty() {
            self.hints.push((key_hint, hint));
        }
    }

    pub fn resolve(&self, code: KeyCode) -> Option<Action> {
        self.bindings.get(&code).copied()
    }

    pub fn footer(&self) -> String {
        self.hints
            .iter()
            .map(|(keys, hint)| format!("{keys} {hint}"))
            .collect::<Vec<_>>()
            .join(" · ")
    }
}
