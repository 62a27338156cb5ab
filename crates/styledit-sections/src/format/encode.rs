//! Serialization of sections into Mozilla-format text.

use crate::section::Section;

/// Serialize sections into a single Mozilla-format document.
///
/// Global sections are emitted as bare CSS; sections with conditions are
/// wrapped in a `@-moz-document` scope construct whose argument list walks
/// the condition kinds in fixed order (url, url-prefix, domain, regexp).
/// Per-section outputs are joined with a blank line.
///
/// Encoding is total and deterministic: it never fails, and identical
/// input always yields identical text. An empty slice yields an empty
/// string.
pub fn to_mozilla_format(sections: &[Section]) -> String {
    sections
        .iter()
        .map(section_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn section_text(section: &Section) -> String {
    let calls: Vec<String> = section
        .conditions()
        .map(|(kind, value)| format!("{}(\"{}\")", kind.css_function(), escape_value(value)))
        .collect();
    if calls.is_empty() {
        section.code.clone()
    } else {
        format!("@-moz-document {} {{\n{}\n}}", calls.join(", "), section.code)
    }
}

/// Double every backslash so the value survives CSS string unescaping.
/// No other character needs escaping in this dialect.
fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\")
}
