// components/media_downloader/src/utils.rs

/// Name used when nothing legal is left of a title
pub const UNTITLED: &str = "untitled";

/// Longest file name most filesystems accept, in bytes
pub const MAX_NAME_BYTES: usize = 255;

/// Room left after a file stem for what yt-dlp appends to it, such as
/// `.info.json`, `.en.vtt` or `.f137.mp4.part`
pub const SUFFIX_RESERVE: usize = 32;

const STRIPPED: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|'];

/// Turn a content title into a single legal path component.
///
/// Characters illegal in file names are stripped, `:` becomes ` -`, and
/// leading/trailing dots and spaces are trimmed. Whatever survives is passed
/// through `sanitize_filename` for control characters, reserved device names
/// and length. An empty result becomes [`UNTITLED`].
pub fn sanitize_title(title: &str) -> String {
    let stripped: String = title.chars().filter(|c| !STRIPPED.contains(c)).collect();
    let replaced = stripped.replace(':', " -").replace('/', "_");
    let trimmed = trim_dots_and_spaces(&replaced);

    let options = sanitize_filename::Options {
        windows: true,
        truncate: true,
        replacement: "",
    };
    let legal = sanitize_filename::sanitize_with_options(trimmed, options);
    let legal = trim_dots_and_spaces(&legal);

    if legal.is_empty() {
        UNTITLED.to_string()
    } else {
        legal.to_string()
    }
}

pub(crate) fn trim_dots_and_spaces(s: &str) -> &str {
    s.trim_matches(|c| c == '.' || c == ' ')
}

/// Cut `s` to at most `max_bytes`, never splitting a character
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Escape a literal so yt-dlp does not read it as an output template field
pub fn escape_template(literal: &str) -> String {
    literal.replace('%', "%%")
}

/// Format a duration in seconds as `H:MM:SS`, or `M:SS` below an hour
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (minutes, secs) = (total / 60, total % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
