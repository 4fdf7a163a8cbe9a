use crate::JsonPointerError;

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// Per RFC 6901, `~` is replaced with `~0` and `/` is replaced with `~1`.
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse an absolute JSON Pointer into unescaped path components.
///
/// - `"" -> []`
/// - `"/" -> [""]`
/// - `"/a~1b/~0k/0" -> ["a/b", "~k", "0"]`
///
/// # Errors
///
/// Returns [`JsonPointerError::NotAbsolute`] when a non-empty pointer does
/// not start with `/`.
pub fn parse_json_pointer(pointer: &str) -> Result<Vec<String>, JsonPointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(JsonPointerError::NotAbsolute);
    }
    Ok(pointer.split('/').skip(1).map(unescape_component).collect())
}

/// Parse a pointer that may be missing its leading `/`.
pub fn parse_json_pointer_relaxed(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .strip_prefix('/')
        .unwrap_or(pointer)
        .split('/')
        .map(unescape_component)
        .collect()
}

/// Format path components into a JSON Pointer string.
///
/// Returns an empty string for the root path.
pub fn format_json_pointer<S: AsRef<str>>(path: &[S]) -> String {
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component.as_ref()));
    }
    out
}

/// Check if a string represents a valid non-negative integer array index.
///
/// Leading zeros are rejected, as in RFC 6901.
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Check if a string consists only of ASCII digits.
///
/// This is the looser test used to classify path steps as array positions
/// when a path carries no schema information.
pub fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Count the steps of a path that address array positions.
pub fn count_numeric_steps<S: AsRef<str>>(path: &[S]) -> usize {
    path.iter().filter(|step| is_integer(step.as_ref())).count()
}

/// Drop every array-position step, keeping only object keys.
pub fn strip_numeric_steps<S: AsRef<str>>(path: &[S]) -> Vec<String> {
    path.iter()
        .map(AsRef::as_ref)
        .filter(|step| !is_integer(step))
        .map(str::to_string)
        .collect()
}

/// Drop the first `count` array-position steps, keeping everything else in
/// order.
pub fn strip_leading_numeric_steps<S: AsRef<str>>(path: &[S], count: usize) -> Vec<String> {
    let mut remaining = count;
    path.iter()
        .map(AsRef::as_ref)
        .filter(|step| {
            if remaining > 0 && is_integer(step) {
                remaining -= 1;
                false
            } else {
                true
            }
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_roundtrip() {
        assert_eq!(escape_component("a~b/c"), "a~0b~1c");
        assert_eq!(unescape_component("a~0b~1c"), "a~b/c");
        assert_eq!(unescape_component("~01"), "~1");
    }

    #[test]
    fn test_parse_relaxed() {
        assert_eq!(parse_json_pointer_relaxed("a/b"), vec!["a", "b"]);
        assert_eq!(parse_json_pointer_relaxed("/a/b"), vec!["a", "b"]);
        assert!(parse_json_pointer_relaxed("").is_empty());
    }

    #[test]
    fn test_strip_leading_numeric_steps() {
        let path = ["gatherings", "0", "units", "2", "taxon"];
        assert_eq!(
            strip_leading_numeric_steps(&path, 1),
            vec!["gatherings", "units", "2", "taxon"]
        );
        assert_eq!(
            strip_leading_numeric_steps(&path, 5),
            vec!["gatherings", "units", "taxon"]
        );
        assert_eq!(count_numeric_steps(&path), 2);
    }

    #[test]
    fn test_is_integer_vs_index() {
        assert!(is_integer("01"));
        assert!(!is_valid_index("01"));
        assert!(!is_integer("-1"));
    }
}
