/// Map a declared content type to a file extension, `.html` when unknown
pub fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "text/html" => ".html",
        "application/xhtml+xml" => ".xhtml",
        "text/plain" => ".txt",
        "application/pdf" => ".pdf",
        "application/json" => ".json",
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        _ => ".html",
    }
}

/// Convert a path segment to a sanitized filename component
pub fn sanitize_segment(segment: &str) -> String {
    let name: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Limit filename length
    if name.len() > 100 {
        name[..100].to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("text/html"), ".html");
        assert_eq!(extension_for("text/html; charset=utf-8"), ".html");
        assert_eq!(extension_for("TEXT/PLAIN"), ".txt");
        assert_eq!(extension_for("application/pdf"), ".pdf");
        assert_eq!(extension_for(""), ".html");
        assert_eq!(extension_for("application/x-unknown"), ".html");
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("hello-world.html"), "hello-world.html");
        assert_eq!(sanitize_segment("a b?c=d&e"), "a_b_c_d_e");
        assert_eq!(sanitize_segment("caf\u{e9}"), "caf_");
        assert_eq!(sanitize_segment(&"x".repeat(150)).len(), 100);
    }
}
