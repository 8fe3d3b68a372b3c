//! Platform detection from raw URL text

use crate::types::PlatformTag;

/// Checked in order; the first platform with a matching keyword wins.
const PLATFORM_KEYWORDS: &[(PlatformTag, &[&str])] = &[
    (PlatformTag::YouTube, &["youtube", "youtu.be"]),
    (PlatformTag::Instagram, &["instagram"]),
    (PlatformTag::Twitter, &["twitter", "x.com"]),
    (PlatformTag::TikTok, &["tiktok"]),
    (PlatformTag::Facebook, &["facebook", "fb.watch"]),
];

/// Guess the platform of `url_text` by case-insensitive substring match
pub fn classify(url_text: &str) -> PlatformTag {
    if url_text.is_empty() {
        return PlatformTag::None;
    }

    let lower = url_text.to_lowercase();
    PLATFORM_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(tag, _)| *tag)
        .unwrap_or(PlatformTag::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_variants() {
        assert_eq!(classify("https://youtu.be/abc"), PlatformTag::YouTube);
        assert_eq!(
            classify("https://www.YouTube.com/watch?v=abc"),
            PlatformTag::YouTube
        );
        assert_eq!(classify("YOUTU.BE/x"), PlatformTag::YouTube);
    }

    #[test]
    fn test_each_platform() {
        assert_eq!(
            classify("https://instagram.com/reel/1"),
            PlatformTag::Instagram
        );
        assert_eq!(classify("https://x.com/u/status/1"), PlatformTag::Twitter);
        assert_eq!(classify("https://twitter.com/u"), PlatformTag::Twitter);
        assert_eq!(classify("https://www.tiktok.com/@u/video/1"), PlatformTag::TikTok);
        assert_eq!(classify("https://fb.watch/abc"), PlatformTag::Facebook);
        assert_eq!(classify("https://facebook.com/watch"), PlatformTag::Facebook);
    }

    #[test]
    fn test_empty_and_unknown() {
        assert_eq!(classify(""), PlatformTag::None);
        assert_eq!(classify("https://vimeo.com/1"), PlatformTag::Unknown);
        assert_eq!(classify(" "), PlatformTag::Unknown);
    }

    #[test]
    fn test_first_match_wins() {
        // Contains both an Instagram and a YouTube keyword
        assert_eq!(
            classify("https://instagram.com/?next=youtube"),
            PlatformTag::YouTube
        );
        assert_eq!(
            classify("https://tiktok.com/share?to=facebook"),
            PlatformTag::TikTok
        );
    }
}
