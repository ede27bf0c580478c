use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::data::{
    self, CommentService, FeedService, UploadService, VlogCommentService, VlogFeedService,
    VlogUploadService,
};
use crate::logging;
use crate::render;
use crate::ui;
use crate::vlogs;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    init_logging(&cfg);

    let client = build_client(&cfg)?;
    info!(
        base_url = client.base_url(),
        config = %friendly_path(config::default_path().as_ref()),
        "starting vlog-tui"
    );

    let feed_service: Arc<dyn FeedService + Send + Sync> =
        Arc::new(VlogFeedService::new(client.clone()));
    let comment_service: Arc<dyn CommentService + Send + Sync> =
        Arc::new(VlogCommentService::new(client.clone()));
    let upload_service: Arc<dyn UploadService + Send + Sync> =
        Arc::new(VlogUploadService::new(client.clone()));

    let options = ui::Options {
        base_url: client.base_url().to_string(),
        feed_service,
        comment_service,
        upload_service,
        upload_password_set: !cfg.api.upload_password.is_empty(),
        video_command: cfg.player.video_command.clone(),
        timing: cfg.notify.timing(),
    };

    let mut model = ui::Model::new(options);
    model.run()?;
    info!("vlog-tui exited");

    Ok(())
}

/// Prints the feed as plain text, one vlog per line.
pub fn print_feed(out: &mut impl Write) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    init_logging(&cfg);
    let client = build_client(&cfg)?;
    let service = VlogFeedService::new(client);
    let posts = data::FeedService::list_posts(&service).context("fetch vlogs")?;
    for post in &posts {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            post.id,
            post.media_type,
            render::format_date(&post.upload_date),
            render::comment_count_label(post.comments.len()),
            post.title
        )?;
    }
    Ok(())
}

fn build_client(cfg: &Config) -> Result<Arc<vlogs::Client>> {
    let client = vlogs::Client::new(vlogs::ClientConfig {
        base_url: cfg.api.base_url.clone(),
        user_agent: cfg.api.user_agent.clone(),
        upload_password: cfg.api.upload_password.clone(),
        http_client: None,
    })
    .context("create vlog client")?;
    Ok(Arc::new(client))
}

fn init_logging(cfg: &Config) {
    if let Err(err) = logging::init(&cfg.log) {
        eprintln!("warning: logging disabled: {err:#}");
    } else if cfg.api.upload_password.is_empty() {
        warn!("no upload password configured");
    }
}

fn friendly_path(path: Option<&std::path::PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/vlog-tui/config.yaml".to_string()
    }
}
