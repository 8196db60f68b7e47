//! File system utility helpers (BOM-aware readers, etc.)
use std::fs;
use std::path::Path;

/// Read a JSON payload as UTF-8 text, stripping UTF-8 BOM if present.
pub fn read_payload_file(path: &Path) -> std::io::Result<String> {
    let mut content = fs::read_to_string(path)?;
    if content.starts_with('\u{FEFF}') {
        content = content.trim_start_matches('\u{FEFF}').to_string();
    }
    Ok(content)
}

/// Whether a path looks like a front end payload (`*.json`).
pub fn is_payload_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn strips_utf8_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("\u{FEFF}{\"success\":true}".as_bytes()).unwrap();
        let text = read_payload_file(file.path()).unwrap();
        assert_eq!(text, "{\"success\":true}");
    }

    #[test]
    fn payload_extension() {
        assert!(is_payload_file(Path::new("a/b.json")));
        assert!(is_payload_file(Path::new("B.JSON")));
        assert!(!is_payload_file(Path::new("a.bgn")));
    }
}
