//! XML 1.0 `Char` production helpers.

use std::borrow::Cow;

/// `#x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]`
pub fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

pub fn is_valid_xml_text(s: &str) -> bool {
    s.chars().all(is_xml_char)
}

/// Replace characters that may not appear in XML with U+FFFD.
pub fn sanitize(s: &str) -> Cow<'_, str> {
    if is_valid_xml_text(s) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.chars()
            .map(|c| if is_xml_char(c) { c } else { '\u{FFFD}' })
            .collect(),
    )
}

/// Make text safe for an XML comment: no `--`, no trailing `-`, no invalid
/// characters.
pub fn sanitize_comment(s: &str) -> String {
    let mut out = sanitize(s).replace("--", "- -");
    while out.contains("--") {
        out = out.replace("--", "- -");
    }
    if out.ends_with('-') {
        out.push(' ');
    }
    out
}

/// Split text into pieces that can each go in one CDATA section.
pub fn cdata_chunks(s: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = s;
    while let Some(pos) = rest.find("]]>") {
        // "]]" closes this section, ">" starts the next one.
        chunks.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    chunks.push(rest);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_chars_are_invalid() {
        assert!(is_xml_char('\t'));
        assert!(is_xml_char('é'));
        assert!(!is_xml_char('\u{0}'));
        assert!(!is_xml_char('\u{1B}'));
        assert!(!is_xml_char('\u{FFFE}'));
    }

    #[test]
    fn test_sanitize_replaces_invalid() {
        assert!(matches!(sanitize("plain"), Cow::Borrowed(_)));
        assert_eq!(sanitize("a\u{1}b"), "a\u{FFFD}b");
    }

    #[test]
    fn test_sanitize_comment() {
        assert_eq!(sanitize_comment("a--b"), "a- -b");
        assert_eq!(sanitize_comment("a---b"), "a- - -b");
        assert_eq!(sanitize_comment("ends-"), "ends- ");
    }

    #[test]
    fn test_cdata_chunks_split_terminator() {
        assert_eq!(cdata_chunks("no terminator"), vec!["no terminator"]);
        let chunks = cdata_chunks("a]]>b");
        assert_eq!(chunks, vec!["a]]", ">b"]);
        assert_eq!(chunks.concat(), "a]]>b");
    }
}
