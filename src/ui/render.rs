//! Terminal rendering of status, results and formats

use colored::{ColoredString, Colorize};

use crate::core::thumbnail::{PLACEHOLDER_GLYPH, Thumbnail};
use crate::types::{AnalysisResult, ConnectivityStatus, FormatOption, MenuItem, PlatformTag};

/// Colored connectivity badge
pub fn connectivity_badge(status: ConnectivityStatus) -> ColoredString {
    let text = format!("● {}", status.label());
    match status {
        ConnectivityStatus::Connected => text.green(),
        ConnectivityStatus::Disconnected => text.red(),
        ConnectivityStatus::Checking => text.yellow(),
    }
}

/// Colored platform label; empty for no URL
pub fn platform_label(tag: PlatformTag) -> ColoredString {
    let label = tag.label();
    match tag {
        PlatformTag::YouTube => label.red(),
        PlatformTag::Instagram => label.magenta(),
        PlatformTag::Twitter => label.bright_blue(),
        PlatformTag::Facebook => label.blue(),
        PlatformTag::TikTok => label.cyan(),
        PlatformTag::Unknown | PlatformTag::None => label.dimmed(),
    }
}

/// Format a format option for the selector
pub fn format_label(format: &FormatOption, downloading: Option<&str>) -> String {
    let marker = if downloading == Some(format.id.as_str()) {
        " ⏳".to_string()
    } else {
        String::new()
    };
    format!(
        "{} {} {}{}",
        format.glyph(),
        format.quality.bold(),
        format.ext.to_uppercase().dimmed(),
        marker
    )
}

/// Menu of formats for the selector, in backend order
pub fn format_menu(result: &AnalysisResult, downloading: Option<&str>) -> Vec<MenuItem<String>> {
    result
        .formats
        .iter()
        .map(|f| MenuItem {
            label: format_label(f, downloading),
            value: f.id.clone(),
        })
        .collect()
}

/// Print the analysis card
pub fn print_result(result: &AnalysisResult, thumbnail: &Thumbnail) {
    println!();
    match thumbnail {
        Thumbnail::Image { src, bytes } => {
            println!("{} {}", "🖼".dimmed(), format!("{} ({} KB)", src, bytes.len() / 1024).dimmed());
        }
        Thumbnail::Placeholder => println!("{}", PLACEHOLDER_GLYPH.dimmed()),
    }
    println!("{}", result.title.bold());
    match &result.duration {
        Some(duration) => println!("{} {}", result.author.cyan(), format!("[{}]", duration).dimmed()),
        None => println!("{}", result.author.cyan()),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(id: &str) -> FormatOption {
        FormatOption {
            id: id.into(),
            quality: "Video".into(),
            ext: "mp4".into(),
            kind: None,
        }
    }

    #[test]
    fn test_format_label_marks_downloading() {
        colored::control::set_override(false);
        assert_eq!(format_label(&format("mp4"), None), "🎬 Video MP4");
        assert_eq!(format_label(&format("mp4"), Some("mp4")), "🎬 Video MP4 ⏳");
        assert_eq!(format_label(&format("ringtone"), Some("mp4")), "🔔 Video MP4");
    }
}
