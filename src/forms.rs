use std::fmt;
use std::path::PathBuf;

use crate::vlogs::{NewComment, Upload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField {
    pub label: &'static str,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Please fill out the \"{}\" field.", self.label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentField {
    #[default]
    Name,
    Text,
    Submit,
    Cancel,
}

impl CommentField {
    const ORDER: [CommentField; 4] = [
        CommentField::Name,
        CommentField::Text,
        CommentField::Submit,
        CommentField::Cancel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CommentField::Name => "Your Name",
            CommentField::Text => "Your Comment",
            CommentField::Submit => "Submit Comment",
            CommentField::Cancel => "Cancel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadField {
    #[default]
    Title,
    MediaFile,
    Submit,
    Cancel,
}

impl UploadField {
    const ORDER: [UploadField; 4] = [
        UploadField::Title,
        UploadField::MediaFile,
        UploadField::Submit,
        UploadField::Cancel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UploadField::Title => "Title",
            UploadField::MediaFile => "Media file",
            UploadField::Submit => "Upload Vlog",
            UploadField::Cancel => "Cancel",
        }
    }
}

fn cycle<T: Copy + PartialEq>(order: &[T], current: T, delta: isize) -> T {
    let len = order.len() as isize;
    let idx = order.iter().position(|f| *f == current).unwrap_or(0) as isize;
    order[(idx + delta).rem_euclid(len) as usize]
}

/// The "add comment" form, bound to one post id for its whole life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentForm {
    post_id: String,
    pub name: String,
    pub text: String,
    pub active: CommentField,
}

impl CommentForm {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            name: String::new(),
            text: String::new(),
            active: CommentField::Name,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn next(&mut self) {
        self.active = cycle(&CommentField::ORDER, self.active, 1);
    }

    pub fn previous(&mut self) {
        self.active = cycle(&CommentField::ORDER, self.active, -1);
    }

    fn active_value_mut(&mut self) -> Option<&mut String> {
        match self.active {
            CommentField::Name => Some(&mut self.name),
            CommentField::Text => Some(&mut self.text),
            _ => None,
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        if let Some(value) = self.active_value_mut() {
            value.push(ch);
        }
    }

    pub fn newline(&mut self) {
        if self.active == CommentField::Text {
            self.text.push('\n');
        }
    }

    pub fn backspace(&mut self) {
        if let Some(value) = self.active_value_mut() {
            value.pop();
        }
    }

    pub fn clear_active(&mut self) {
        if let Some(value) = self.active_value_mut() {
            value.clear();
        }
    }

    /// Collects the fields, refusing empty required ones.
    pub fn submission(&self) -> Result<NewComment, (CommentField, MissingField)> {
        if self.name.is_empty() {
            return Err((CommentField::Name, MissingField { label: CommentField::Name.label() }));
        }
        if self.text.is_empty() {
            return Err((CommentField::Text, MissingField { label: CommentField::Text.label() }));
        }
        Ok(NewComment {
            author_name: self.name.clone(),
            text: self.text.clone(),
        })
    }

    pub fn reset(&mut self) {
        self.name.clear();
        self.text.clear();
        self.active = CommentField::Name;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadForm {
    pub title: String,
    pub media_file: String,
    pub active: UploadField,
}

impl UploadForm {
    pub fn next(&mut self) {
        self.active = cycle(&UploadField::ORDER, self.active, 1);
    }

    pub fn previous(&mut self) {
        self.active = cycle(&UploadField::ORDER, self.active, -1);
    }

    fn active_value_mut(&mut self) -> Option<&mut String> {
        match self.active {
            UploadField::Title => Some(&mut self.title),
            UploadField::MediaFile => Some(&mut self.media_file),
            _ => None,
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        if let Some(value) = self.active_value_mut() {
            value.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(value) = self.active_value_mut() {
            value.pop();
        }
    }

    pub fn clear_active(&mut self) {
        if let Some(value) = self.active_value_mut() {
            value.clear();
        }
    }

    pub fn submission(&self) -> Result<Upload, (UploadField, MissingField)> {
        if self.title.is_empty() {
            return Err((UploadField::Title, MissingField { label: UploadField::Title.label() }));
        }
        if self.media_file.trim().is_empty() {
            return Err((
                UploadField::MediaFile,
                MissingField { label: UploadField::MediaFile.label() },
            ));
        }
        Ok(Upload {
            title: self.title.clone(),
            media_file: expand_home(self.media_file.trim()),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
