use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::blocking::{multipart, Client as HttpClient, RequestBuilder, Response};
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{GatewayError, Result};

pub const DEFAULT_BASE_URL: &str = match option_env!("VLOG_TUI_API_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:5000",
};

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub upload_password: String,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaType {
    Video,
    Image,
    #[default]
    Other,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Image => "image",
            MediaType::Other => "other",
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaType::Video)
    }
}

impl From<String> for MediaType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "video" => MediaType::Video,
            "image" => MediaType::Image,
            _ => MediaType::Other,
        }
    }
}

impl From<MediaType> for String {
    fn from(kind: MediaType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "mediaType", default)]
    pub media_type: MediaType,
    #[serde(rename = "mediaPath", default)]
    pub media_path: String,
    #[serde(rename = "uploadDate", default)]
    pub upload_date: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "name", default)]
    pub author_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    #[serde(rename = "name")]
    pub author_name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub title: String,
    pub media_file: PathBuf,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: String,
    upload_password: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        if config.user_agent.trim().is_empty() {
            anyhow::bail!("vlog client user agent required");
        }
        let base = if config.base_url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            config.base_url.trim().to_string()
        };
        Url::parse(&base).map_err(|err| anyhow::anyhow!("invalid base url {base:?}: {err}"))?;

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder().build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url: base.trim_end_matches('/').to_string(),
            upload_password: config.upload_password,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn list_posts(&self) -> Result<Vec<Post>> {
        let url = format!("{}/vlogs", self.base_url);
        let resp = self.send(self.http.get(&url), "GET /vlogs")?;
        if !resp.status().is_success() {
            return Err(status_error(resp));
        }
        decode(resp)
    }

    pub fn get_post(&self, id: &str) -> Result<Post> {
        let url = format!("{}/vlogs/{}", self.base_url, id);
        let resp = self.send(self.http.get(&url), "GET /vlogs/{id}")?;
        match resp.status() {
            status if status.is_success() => decode(resp),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound(id.to_string())),
            _ => Err(status_error(resp)),
        }
    }

    pub fn add_comment(&self, id: &str, comment: &NewComment) -> Result<()> {
        let url = format!("{}/vlogs/{}/comments", self.base_url, id);
        let resp = self.send(self.http.post(&url).json(comment), "POST /vlogs/{id}/comments")?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(GatewayError::Validation(error_message(resp)))
            }
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound(id.to_string())),
            _ => Err(status_error(resp)),
        }
    }

    pub fn upload_post(&self, upload: &Upload) -> Result<()> {
        let bytes = fs::read(&upload.media_file).map_err(|err| {
            GatewayError::Validation(format!(
                "cannot read media file {}: {err}",
                upload.media_file.display()
            ))
        })?;
        let file_name = upload
            .media_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());
        let mime = tree_magic_mini::from_u8(&bytes);
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|err| GatewayError::Validation(format!("media type {mime}: {err}")))?;
        let form = multipart::Form::new()
            .text("title", upload.title.clone())
            .part("media", part)
            .text("password", self.upload_password.clone());

        let url = format!("{}/vlogs", self.base_url);
        let resp = self.send(self.http.post(&url).multipart(form), "POST /vlogs")?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(GatewayError::Auth(error_message(resp)))
            }
            StatusCode::BAD_REQUEST
            | StatusCode::PAYLOAD_TOO_LARGE
            | StatusCode::UNSUPPORTED_MEDIA_TYPE
            | StatusCode::UNPROCESSABLE_ENTITY => Err(GatewayError::Validation(error_message(resp))),
            _ => Err(status_error(resp)),
        }
    }

    fn send(&self, req: RequestBuilder, label: &str) -> Result<Response> {
        let resp = req
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|err| {
                warn!(request = label, error = %err, "vlog request failed");
                GatewayError::from(err)
            })?;
        debug!(request = label, status = resp.status().as_u16(), "vlog response");
        Ok(resp)
    }
}

fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
    resp.json::<T>()
        .map_err(|err| GatewayError::Network(format!("decode response: {err}")))
}

/// Text the backend put in the body of a failed response: the JSON `error` or
/// `message` field, else a non-HTML plain body.
fn backend_text(resp: Response) -> Option<String> {
    let body = resp.text().unwrap_or_default();
    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    parsed
        .error
        .or(parsed.message)
        .filter(|msg| !msg.trim().is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && !trimmed.starts_with('<')).then(|| trimmed.to_string())
        })
}

fn error_message(resp: Response) -> String {
    let status = resp.status();
    backend_text(resp).unwrap_or_else(|| format!("request failed with status {status}"))
}

fn status_error(resp: Response) -> GatewayError {
    let status = resp.status().as_u16();
    GatewayError::Status {
        status,
        message: backend_text(resp),
    }
}

/// Resolves a post's `mediaPath` against the backend base url.
pub fn media_url(base_url: &str, media_path: &str) -> String {
    let path = media_path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let normalized = path.replace('\\', "/");
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        normalized.trim_start_matches('/')
    )
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_post() {
        let raw = r#"{
            "_id": "65f0c0ffee",
            "title": "Morning ride",
            "mediaType": "video",
            "mediaPath": "uploads/ride.mp4",
            "uploadDate": "2024-03-15T12:00:00.000Z",
            "comments": [{"name": "ana", "text": "nice", "date": "2024-03-16T08:30:00.000Z"}],
            "__v": 0
        }"#;
        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post.id, "65f0c0ffee");
        assert_eq!(post.media_type, MediaType::Video);
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].author_name, "ana");
        assert!(parse_timestamp(&post.upload_date).is_some());
    }

    #[test]
    fn unknown_media_type_is_other_and_comments_default() {
        let raw = r#"{"_id": "x", "title": "t", "mediaType": "audio", "mediaPath": "a.mp3", "uploadDate": ""}"#;
        let post: Post = serde_json::from_str(raw).unwrap();
        assert_eq!(post.media_type, MediaType::Other);
        assert!(post.comments.is_empty());
        assert!(parse_timestamp(&post.upload_date).is_none());
    }

    #[test]
    fn new_comment_uses_backend_field_names() {
        let body = serde_json::to_value(NewComment {
            author_name: "bo".into(),
            text: "hi".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"name": "bo", "text": "hi"}));
    }

    #[test]
    fn media_url_joins_relative_paths() {
        assert_eq!(
            media_url("http://host:5000/", "/uploads/a.png"),
            "http://host:5000/uploads/a.png"
        );
        assert_eq!(
            media_url("http://host:5000", "uploads\\b.mp4"),
            "http://host:5000/uploads/b.mp4"
        );
        assert_eq!(
            media_url("http://host:5000", "https://cdn.example/c.jpg"),
            "https://cdn.example/c.jpg"
        );
    }

    #[test]
    fn client_requires_user_agent() {
        let err = Client::new(ClientConfig::default());
        assert!(err.is_err());
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = Client::new(ClientConfig {
            base_url: "http://127.0.0.1:9/".into(),
            user_agent: "vlog-tui/test".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
    }
}
