use std::sync::Arc;

use crate::vlogs::{MediaType, Post};

pub const PAGE_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaFilter {
    #[default]
    All,
    Video,
    Image,
}

impl MediaFilter {
    pub const ALL: [MediaFilter; 3] = [MediaFilter::All, MediaFilter::Video, MediaFilter::Image];

    pub fn matches(&self, post: &Post) -> bool {
        match self {
            MediaFilter::All => true,
            MediaFilter::Video => post.media_type == MediaType::Video,
            MediaFilter::Image => post.media_type == MediaType::Image,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaFilter::All => "All",
            MediaFilter::Video => "Videos",
            MediaFilter::Image => "Images",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    PostsLoaded(Vec<Post>),
    FilterSelected(MediaFilter),
    PageExpanded,
    DialogOpened(String),
    DialogClosed,
}

/// Snapshot of everything the feed view is derived from.
///
/// Transitions never mutate in place; each returns the next snapshot.
/// `visible` always holds the indices of `all_posts` that pass `filter`,
/// in their original order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    all_posts: Arc<Vec<Post>>,
    visible: Vec<usize>,
    filter: MediaFilter,
    visible_count: usize,
    active_dialog_post: Option<String>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            all_posts: Arc::new(Vec::new()),
            visible: Vec::new(),
            filter: MediaFilter::All,
            visible_count: PAGE_SIZE,
            active_dialog_post: None,
        }
    }
}

impl FeedState {
    pub fn new(posts: Vec<Post>) -> Self {
        Self::default().replace_posts(posts)
    }

    pub fn update(&self, msg: Msg) -> Self {
        match msg {
            Msg::PostsLoaded(posts) => self.replace_posts(posts),
            Msg::FilterSelected(filter) => self.apply_filter(filter),
            Msg::PageExpanded => self.expand_page(),
            Msg::DialogOpened(id) => self.open_dialog(id),
            Msg::DialogClosed => self.close_dialog(),
        }
    }

    pub fn apply_filter(&self, filter: MediaFilter) -> Self {
        Self {
            all_posts: Arc::clone(&self.all_posts),
            visible: filter_indices(&self.all_posts, filter),
            filter,
            visible_count: PAGE_SIZE,
            active_dialog_post: self.active_dialog_post.clone(),
        }
    }

    pub fn expand_page(&self) -> Self {
        Self {
            visible_count: self.visible_count.saturating_add(PAGE_SIZE),
            ..self.clone()
        }
    }

    /// Swaps in a freshly fetched list. The active filter is re-applied but
    /// the page size is kept.
    pub fn replace_posts(&self, posts: Vec<Post>) -> Self {
        let visible = filter_indices(&posts, self.filter);
        Self {
            all_posts: Arc::new(posts),
            visible,
            filter: self.filter,
            visible_count: self.visible_count,
            active_dialog_post: self.active_dialog_post.clone(),
        }
    }

    pub fn open_dialog(&self, post_id: String) -> Self {
        Self {
            active_dialog_post: Some(post_id),
            ..self.clone()
        }
    }

    pub fn close_dialog(&self) -> Self {
        Self {
            active_dialog_post: None,
            ..self.clone()
        }
    }

    pub fn all_posts(&self) -> &[Post] {
        &self.all_posts
    }

    pub fn visible_posts(&self) -> impl Iterator<Item = &Post> + '_ {
        self.visible.iter().filter_map(|&idx| self.all_posts.get(idx))
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn filter(&self) -> MediaFilter {
        self.filter
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn active_dialog_post(&self) -> Option<&str> {
        self.active_dialog_post.as_deref()
    }

    /// Posts the grid shows: the first `min(visible_count, visible_len)`.
    pub fn page(&self) -> Vec<&Post> {
        self.visible_posts().take(self.visible_count).collect()
    }

    pub fn has_more(&self) -> bool {
        self.visible_count < self.visible.len()
    }
}

fn filter_indices(posts: &[Post], filter: MediaFilter) -> Vec<usize> {
    posts
        .iter()
        .enumerate()
        .filter(|(_, post)| filter.matches(post))
        .map(|(idx, _)| idx)
        .collect()
}
