use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};

const URL_PLACEHOLDER: &str = "%URL%";

/// Expands the configured argv template for one media url.
pub fn player_args(template: &[String], url: &str) -> Vec<String> {
    let mut args: Vec<String> = template
        .iter()
        .map(|arg| arg.replace(URL_PLACEHOLDER, url))
        .collect();
    if !template.iter().any(|arg| arg.contains(URL_PLACEHOLDER)) {
        args.push(url.to_string());
    }
    args
}

pub fn spawn_video_player(template: &[String], url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(anyhow!("video playback url missing"));
    }
    if template.is_empty() {
        return Err(anyhow!("player.video_command is empty"));
    }
    let args = player_args(template, url);
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("player.video_command is empty"))?;

    let mut command = Command::new(program);
    command.args(rest);
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());
    command
        .spawn()
        .with_context(|| format!("launch {program} for {url}"))?;
    Ok(())
}

pub fn open_in_browser(url: &str) -> Result<()> {
    webbrowser::open(url).with_context(|| format!("open {url} in browser"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_substituted() {
        let template = vec!["mpv".to_string(), "--fs".to_string(), "%URL%".to_string()];
        assert_eq!(
            player_args(&template, "http://h/v.mp4"),
            ["mpv", "--fs", "http://h/v.mp4"]
        );
    }

    #[test]
    fn url_is_appended_without_placeholder() {
        let template = vec!["vlc".to_string()];
        assert_eq!(player_args(&template, "u"), ["vlc", "u"]);
    }

    #[test]
    fn empty_template_is_an_error() {
        assert!(spawn_video_player(&[], "http://h/v.mp4").is_err());
    }
}
