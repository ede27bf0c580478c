use std::sync::Arc;

use crate::error::Result;
use crate::vlogs::{self, NewComment, Post, Upload};

pub trait FeedService: Send + Sync {
    fn list_posts(&self) -> Result<Vec<Post>>;
    fn get_post(&self, id: &str) -> Result<Post>;
}

pub trait CommentService: Send + Sync {
    fn add_comment(&self, id: &str, comment: &NewComment) -> Result<()>;
}

pub trait UploadService: Send + Sync {
    fn upload_post(&self, upload: &Upload) -> Result<()>;
}

pub struct VlogFeedService {
    client: Arc<vlogs::Client>,
}

impl VlogFeedService {
    pub fn new(client: Arc<vlogs::Client>) -> Self {
        Self { client }
    }
}

impl FeedService for VlogFeedService {
    fn list_posts(&self) -> Result<Vec<Post>> {
        self.client.list_posts()
    }

    fn get_post(&self, id: &str) -> Result<Post> {
        self.client.get_post(id)
    }
}

pub struct VlogCommentService {
    client: Arc<vlogs::Client>,
}

impl VlogCommentService {
    pub fn new(client: Arc<vlogs::Client>) -> Self {
        Self { client }
    }
}

impl CommentService for VlogCommentService {
    fn add_comment(&self, id: &str, comment: &NewComment) -> Result<()> {
        self.client.add_comment(id, comment)
    }
}

pub struct VlogUploadService {
    client: Arc<vlogs::Client>,
}

impl VlogUploadService {
    pub fn new(client: Arc<vlogs::Client>) -> Self {
        Self { client }
    }
}

impl UploadService for VlogUploadService {
    fn upload_post(&self, upload: &Upload) -> Result<()> {
        self.client.upload_post(upload)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockBackend;
    use super::*;
    use crate::error::GatewayError;
    use crate::vlogs::MediaType;

    fn post(id: &str) -> Post {
        Post {
            id: id.into(),
            title: format!("post {id}"),
            media_type: MediaType::Image,
            media_path: format!("uploads/{id}.png"),
            upload_date: "2024-01-01T00:00:00Z".into(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn mock_backend_appends_comments_in_order() {
        let backend = MockBackend::new(vec![post("a")]);
        for text in ["first", "second"] {
            backend
                .add_comment(
                    "a",
                    &NewComment {
                        author_name: "ana".into(),
                        text: text.into(),
                    },
                )
                .unwrap();
        }
        let fetched = backend.get_post("a").unwrap();
        let texts: Vec<_> = fetched.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn mock_backend_reports_missing_posts() {
        let backend = MockBackend::new(vec![]);
        assert_eq!(
            backend.get_post("nope"),
            Err(GatewayError::NotFound("nope".into()))
        );
    }

    #[test]
    fn rejected_comments_leave_posts_untouched() {
        let backend = MockBackend::new(vec![post("a")]);
        backend.reject_comments(Some(GatewayError::Validation("bad".into())));
        let comment = NewComment {
            author_name: "ana".into(),
            text: "hi".into(),
        };
        assert_eq!(
            backend.add_comment("a", &comment),
            Err(GatewayError::Validation("bad".into()))
        );
        assert!(backend.posts()[0].comments.is_empty());
    }
}
