//! Upload validation and naming utilities
//!
//! Uploaded filenames arrive from browsers in every shape: path
//! prefixes, unsafe characters, non-ASCII scripts, duplicates within a
//! group. Everything here is a pure function so the rules are easy to
//! test in isolation.

use std::collections::HashSet;

/// File extensions accepted for upload
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "txt", "rtf", "md"];

/// Default upload size cap (50 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Sanitize a client-supplied filename: drop any directory prefix and
/// replace unsafe characters with `_`. Returns `None` when nothing
/// usable remains.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    // Keep only the last path segment
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '*' | '?' | ':' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.' || c == '_') {
        None
    } else {
        Some(cleaned)
    }
}

/// Lowercased extension of a filename, without the dot
pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Whether the filename's extension is in the upload allow-list
pub fn is_allowed_type(filename: &str) -> bool {
    match extension(filename) {
        Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Human-readable allow-list for rejection messages
pub fn allowed_types_hint() -> String {
    ALLOWED_EXTENSIONS.join(", ")
}

/// Resolve a filename collision within a group by suffixing a counter:
/// `paper.pdf` becomes `paper_1.pdf`, `paper_2.pdf`, ...
pub fn unique_filename(filename: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(filename) {
        return filename.to_string();
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (filename, None),
    };

    let mut counter = 1;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Content-Disposition header value carrying a UTF-8 filename safely
/// (RFC 5987 `filename*` form)
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename*=UTF-8''{}", percent_encode(filename))
}

fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(*byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(
            sanitize_filename("../../etc/passwd.txt").unwrap(),
            "passwd.txt"
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\paper.pdf").unwrap(),
            "paper.pdf"
        );
    }

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(
            sanitize_filename("what?is:this<file>.pdf").unwrap(),
            "what_is_this_file_.pdf"
        );
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_filename("文献综述.pdf").unwrap(), "文献综述.pdf");
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert!(sanitize_filename("").is_none());
        assert!(sanitize_filename("   ").is_none());
        assert!(sanitize_filename("..").is_none());
        assert!(sanitize_filename("???").is_none());
    }

    #[test]
    fn test_allowed_types() {
        assert!(is_allowed_type("paper.pdf"));
        assert!(is_allowed_type("notes.DOCX"));
        assert!(is_allowed_type("readme.md"));
        assert!(!is_allowed_type("archive.zip"));
        assert!(!is_allowed_type("binary"));
    }

    #[test]
    fn test_unique_filename_no_collision() {
        let taken = HashSet::new();
        assert_eq!(unique_filename("paper.pdf", &taken), "paper.pdf");
    }

    #[test]
    fn test_unique_filename_counts_up() {
        let taken: HashSet<String> = ["paper.pdf", "paper_1.pdf"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(unique_filename("paper.pdf", &taken), "paper_2.pdf");
    }

    #[test]
    fn test_unique_filename_without_extension() {
        let taken: HashSet<String> = ["notes"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_filename("notes", &taken), "notes_1");
    }

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("paper.pdf"),
            "attachment; filename*=UTF-8''paper.pdf"
        );
    }

    #[test]
    fn test_content_disposition_encodes_utf8() {
        let header = content_disposition("文献.pdf");
        assert!(header.starts_with("attachment; filename*=UTF-8''%"));
        assert!(header.ends_with(".pdf"));
        // Every non-ASCII byte is percent-escaped
        assert!(header.is_ascii());
    }
}
