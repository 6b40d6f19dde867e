//! Column name sanitizing for generated SQL.
//!
//! Only names coming from an entity's field table are spliced into SQL text;
//! values are always bound. [`sanitize`] strips `*` runs, escapes the acute
//! accent `´` with a backslash and trims surrounding whitespace.

const WILDCARD: char = '*';
const ACCENT: char = '\u{00B4}';
const ESCAPE: char = '\\';

/// Normalize a column name before it is interpolated into SQL.
///
/// Idempotent: an accent that is already escaped is left untouched.
///
/// ```
/// assert_eq!(conform::sanitize("*col*"), "col");
/// assert_eq!(conform::sanitize(" na´me "), "na\\´me");
/// ```
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev: Option<char> = None;
    for c in name.chars() {
        match c {
            WILDCARD => continue,
            ACCENT if prev != Some(ESCAPE) => {
                out.push(ESCAPE);
                out.push(ACCENT);
            }
            _ => out.push(c),
        }
        prev = Some(c);
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn strips_wildcard_runs() {
        assert_eq!(sanitize("*col*"), "col");
        assert_eq!(sanitize("***na**me*"), "name");
        assert_eq!(sanitize("*"), "");
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(sanitize("  name\t"), "name");
        assert_eq!(sanitize(" * name * "), "name");
    }

    #[test]
    fn escapes_accent_once() {
        assert_eq!(sanitize("o´neil"), "o\\´neil");
        assert_eq!(sanitize("o\\´neil"), "o\\´neil");
        assert_eq!(sanitize("´´"), "\\´\\´");
    }

    #[test]
    fn wildcard_between_escape_and_accent() {
        // After removing `*` the escape is adjacent to the accent.
        let once = sanitize("\\*´");
        assert_eq!(once, "\\´");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn is_idempotent() {
        for input in ["*col*", " a´b ", "´", "\\´", "x * y", "  ", "plain", "a**´**b"] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input:?}");
        }
    }
}
