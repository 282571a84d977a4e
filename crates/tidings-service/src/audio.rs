//! Episode audio URL normalization.

use crate::dto::{AudioFormat, Episode};
use url::Url;

/// Ensures `raw` points at a file with a supported audio extension.
///
/// URLs whose file name already ends in a supported extension are returned
/// unchanged. Otherwise any existing extension is replaced by `format`
/// (default mp3). Query strings and fragments are preserved; URLs without a
/// file name are returned unchanged.
#[must_use]
pub fn normalize_audio_url(raw: &str, format: Option<AudioFormat>) -> String {
    let format = format.unwrap_or_default();

    let Ok(mut url) = Url::parse(raw) else {
        return format!("{}.{}", strip_extension(raw), format.extension());
    };

    let Some(file) = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|file| !file.is_empty())
        .map(ToString::to_string)
    else {
        return raw.to_string();
    };

    if has_audio_extension(&file) {
        return raw.to_string();
    }

    let path = url.path();
    let new_path = format!(
        "{}{}.{}",
        &path[..path.len() - file.len()],
        strip_extension(&file),
        format.extension()
    );
    url.set_path(&new_path);
    url.to_string()
}

/// Normalizes every episode's audio URL in place.
pub fn normalize_episodes(episodes: &mut [Episode]) {
    for episode in episodes {
        episode.audio_url = normalize_audio_url(&episode.audio_url, episode.format);
    }
}

fn has_audio_extension(file: &str) -> bool {
    file.rsplit_once('.')
        .and_then(|(_, ext)| AudioFormat::from_extension(ext))
        .is_some()
}

fn strip_extension(s: &str) -> &str {
    let start = s.rfind('/').map_or(0, |i| i + 1);
    match s[start..].rfind('.') {
        Some(dot) if dot > 0 && start + dot + 1 < s.len() => &s[..start + dot],
        _ => s,
    }
}
