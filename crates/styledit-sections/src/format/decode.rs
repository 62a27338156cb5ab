//! Recovery of sections from Mozilla-format text.

use std::sync::LazyLock;

use regex::Regex;

use crate::format::diagnostic::Diagnostic;
use crate::format::events::{ParseEvent, parse_events};
use crate::section::Section;

/// Marker comment body that identifies an auto-inserted agent-sheet
/// comment. A gap comment matching it is discarded rather than carried
/// into the following section.
pub const AGENT_SHEET_MARKER: &str = "AGENT_SHEET";

/// Auto-generated namespace declaration that alone does not make a leading
/// section worth keeping.
pub const NAMESPACE_BOILERPLATE: &str = "@namespace url(http://www.w3.org/1999/xhtml);";

/// A block comment at the very end of a text span, trailed only by
/// whitespace.
static GAP_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(/\*[^*]*\*+(?:[^/*][^*]*\*+)*/)\s*\z").expect("gap comment pattern is valid")
});

/// Everything recovered from one decode pass.
#[derive(Debug, Clone, Default)]
pub struct DecodeResult {
    /// Recovered sections, in source order.
    pub sections: Vec<Section>,
    /// Parse problems, in source order. Never fatal: sections are recovered
    /// around them.
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse Mozilla-format text into sections, with default boilerplate
/// markers.
///
/// Decoding is best-effort and never fails: malformed input degrades to a
/// partial section list plus positioned diagnostics. Bare CSS outside any
/// scope construct becomes global sections, preserving interleaving order
/// with scoped blocks.
pub fn from_mozilla_format(text: &str) -> DecodeResult {
    Decoder::default().decode(text)
}

/// A decoder with configurable boilerplate markers.
///
/// The markers default to [`AGENT_SHEET_MARKER`] and
/// [`NAMESPACE_BOILERPLATE`]; [`from_mozilla_format`] is the common entry
/// point. A decoder owns no per-call state, so one instance may serve any
/// number of concurrent decodes.
#[derive(Debug, Clone)]
pub struct Decoder {
    boilerplate_comment: Regex,
    namespace_boilerplate: String,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(AGENT_SHEET_MARKER, NAMESPACE_BOILERPLATE)
    }
}

/// One open section while walking the event list: the comment carried from
/// the gap before the construct, the conditions parsed from its prelude,
/// and the byte offset its unconsumed text starts at.
struct Frame {
    leading: String,
    section: Section,
    start: usize,
}

impl Decoder {
    /// Create a decoder recognizing the given marker-comment body and
    /// namespace boilerplate line.
    pub fn new(marker: &str, namespace_boilerplate: &str) -> Self {
        let pattern = format!(r"^/\*\s*{}\s*\*/$", regex::escape(marker));
        Self {
            boilerplate_comment: Regex::new(&pattern).expect("marker is escaped"),
            namespace_boilerplate: namespace_boilerplate.to_owned(),
        }
    }

    /// Parse Mozilla-format text into sections. See [`from_mozilla_format`].
    pub fn decode(&self, text: &str) -> DecodeResult {
        let mut out = DecodeResult::default();
        let mut accepted_any = false;
        // The implicit root frame holds CSS outside any scope construct.
        let mut stack = vec![Frame {
            leading: String::new(),
            section: Section::new(),
            start: 0,
        }];

        for event in parse_events(text) {
            match event {
                ParseEvent::Error(diag) => {
                    tracing::warn!("{diag}");
                    out.diagnostics.push(diag);
                }
                ParseEvent::ScopeStart {
                    at,
                    conditions,
                    body_start,
                } => {
                    let Some(top) = stack.last_mut() else { break };
                    // Text between the previous construct (or document
                    // start) and this one.
                    let outer = &text[top.start..at];
                    let (leading, outer) = self.split_gap_comment(outer);
                    if !outer.trim().is_empty() {
                        let mut section = top.section.clone();
                        section.code = outer.to_owned();
                        self.finalize(section, &mut out.sections, &mut accepted_any);
                        top.leading.clear();
                    }
                    let mut section = Section::new();
                    for (kind, value) in conditions {
                        section.push_condition(kind, value);
                    }
                    stack.push(Frame {
                        leading,
                        section,
                        start: body_start,
                    });
                }
                ParseEvent::ScopeEnd { body_end, after } => {
                    let Some(frame) = stack.pop() else { break };
                    let mut section = frame.section;
                    section.code = frame.leading;
                    section.code.push_str(&text[frame.start..body_end]);
                    self.finalize(section, &mut out.sections, &mut accepted_any);
                    if let Some(top) = stack.last_mut() {
                        top.start = after;
                    }
                }
            }
        }

        // End of document: the open frames take the rest of the text,
        // innermost first, so an unterminated block loses nothing.
        while let Some(frame) = stack.pop() {
            let mut section = frame.section;
            section.code = frame.leading;
            section.code.push_str(&text[frame.start..]);
            self.finalize(section, &mut out.sections, &mut accepted_any);
            if let Some(top) = stack.last_mut() {
                top.start = text.len();
            }
        }

        out
    }

    /// Detach a trailing block comment from the gap text so it can ride
    /// along as the next section's leading comment. A comment matching the
    /// agent-sheet marker is discarded instead of carried.
    fn split_gap_comment<'t>(&self, outer: &'t str) -> (String, &'t str) {
        let Some(capture) = GAP_COMMENT.captures(outer).and_then(|c| c.get(1)) else {
            return (String::new(), outer);
        };
        let rest = &outer[..capture.start()];
        if self.boilerplate_comment.is_match(capture.as_str()) {
            tracing::debug!("discarding boilerplate gap comment");
            (String::new(), rest)
        } else {
            (format!("{}\n", capture.as_str()), rest)
        }
    }

    /// Trim a candidate section and either emit or drop it. Until the first
    /// section has been accepted, a candidate whose code is nothing but the
    /// namespace boilerplate and whitespace is dropped as well.
    fn finalize(&self, mut section: Section, sections: &mut Vec<Section>, accepted_any: &mut bool) {
        section.code = section.code.trim().to_owned();
        if section.is_empty() {
            return;
        }
        if !*accepted_any {
            let stripped = section
                .code
                .replacen(self.namespace_boilerplate.as_str(), "", 1);
            if section.is_global() && stripped.chars().all(char::is_whitespace) {
                tracing::debug!("dropping boilerplate-only leading section");
                return;
            }
            *accepted_any = true;
        }
        sections.push(section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::encode::to_mozilla_format;
    use crate::section::ConditionKind;

    #[test]
    fn empty_input_yields_nothing() {
        let result = from_mozilla_format("");
        assert!(result.sections.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn whitespace_only_input_yields_nothing() {
        let result = from_mozilla_format("  \n\n\t\n");
        assert!(result.sections.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn single_scoped_block_round_trips_exactly() {
        let text = "@-moz-document domain(\"example.com\") {\nbody{color:red}\n}";
        let result = from_mozilla_format(text);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.sections.len(), 1);
        let section = &result.sections[0];
        assert_eq!(section.domains, vec!["example.com"]);
        assert_eq!(section.code, "body{color:red}");
        assert!(section.urls.is_empty());
        assert_eq!(to_mozilla_format(&result.sections), text);
    }

    #[test]
    fn interleaved_global_and_scoped_blocks_preserve_order() {
        let text = "a{}\n\n@-moz-document domain(\"x.com\") { b{} }\n\nc{}";
        let result = from_mozilla_format(text);
        assert!(result.diagnostics.is_empty());
        let codes: Vec<_> = result.sections.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["a{}", "b{}", "c{}"]);
        assert!(result.sections[0].is_global());
        assert_eq!(result.sections[1].domains, vec!["x.com"]);
        assert!(result.sections[2].is_global());
    }

    #[test]
    fn global_sections_round_trip() {
        let sections = vec![Section::global("a { color: red }"), Section::global("b{}")];
        let result = from_mozilla_format(&to_mozilla_format(&sections));
        assert_eq!(result.sections, sections);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn backslashes_survive_repeated_round_trips() {
        let mut section = Section::global("a{}");
        section.push_condition(ConditionKind::UrlPrefix, r"C:\path");
        section.push_condition(ConditionKind::Regexp, r"https?://(\w+\.)?example\.com/.*");
        let mut sections = vec![section.clone()];
        for _ in 0..3 {
            let result = from_mozilla_format(&to_mozilla_format(&sections));
            assert!(result.diagnostics.is_empty());
            sections = result.sections;
        }
        assert_eq!(sections, vec![section]);
    }

    #[test]
    fn invalid_function_is_reported_not_fatal() {
        let result = from_mozilla_format("@-moz-document bogus(\"x\") { a{} }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "invalid function \"bogus\"");
        assert_eq!(result.diagnostics[0].line, 1);
        // The body is still recovered; with no valid conditions the section
        // comes back global.
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].code, "a{}");
        assert!(result.sections[0].is_global());
    }

    #[test]
    fn unterminated_string_in_a_rule_block_is_diagnosed() {
        let text = "a { content: \"oops\n}\nb{}";
        let result = from_mozilla_format(text);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "unterminated string");
        assert_eq!((result.diagnostics[0].line, result.diagnostics[0].column), (1, 14));
        // The text survives as a global section.
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].code, text);
    }

    #[test]
    fn unterminated_string_in_a_scoped_body_is_diagnosed() {
        let result =
            from_mozilla_format("@-moz-document domain(\"x\") {\na { content: \"oops\n}\n}");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "unterminated string");
        assert_eq!(result.diagnostics[0].line, 2);
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].domains, vec!["x"]);
        assert!(result.sections[0].code.contains("content"));
    }

    #[test]
    fn unparseable_prelude_argument_is_reported_with_an_empty_name() {
        let result = from_mozilla_format("@-moz-document \"x\" {a{}}");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "invalid function \"\"");
        assert_eq!((result.diagnostics[0].line, result.diagnostics[0].column), (1, 1));
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].code, "a{}");
        assert!(result.sections[0].is_global());
    }

    #[test]
    fn valid_conditions_survive_an_invalid_sibling() {
        let result =
            from_mozilla_format("@-moz-document bogus(\"x\"), domain(\"d.com\") { a{} }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].domains, vec!["d.com"]);
    }

    #[test]
    fn unterminated_block_is_closed_implicitly() {
        let result = from_mozilla_format("@-moz-document domain(\"x\") {\na{}");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].code, "a{}");
        assert_eq!(result.sections[0].domains, vec!["x"]);
    }

    #[test]
    fn gap_comment_is_carried_into_the_section() {
        let text = "/* per-site tweaks */\n@-moz-document domain(\"x\") {\na{}\n}";
        let result = from_mozilla_format(text);
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].code, "/* per-site tweaks */\n\na{}");
        assert_eq!(result.sections[0].domains, vec!["x"]);
    }

    #[test]
    fn gap_comment_after_css_still_leaves_a_global_section() {
        let text = "a{}\n/* doc */\n@-moz-document domain(\"x\") {b{}}";
        let result = from_mozilla_format(text);
        let codes: Vec<_> = result.sections.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["a{}", "/* doc */\nb{}"]);
    }

    #[test]
    fn agent_sheet_marker_is_discarded() {
        let text = "/* AGENT_SHEET */\n@-moz-document domain(\"x\") {a{}}";
        let result = from_mozilla_format(text);
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].code, "a{}");
    }

    #[test]
    fn namespace_boilerplate_alone_makes_no_leading_section() {
        let text = "@namespace url(http://www.w3.org/1999/xhtml);\n\n\
                    @-moz-document domain(\"x\") {\na{}\n}";
        let result = from_mozilla_format(text);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].domains, vec!["x"]);
    }

    #[test]
    fn namespace_boilerplate_with_real_code_is_kept() {
        let text = "@namespace url(http://www.w3.org/1999/xhtml);\nbody{margin:0}\n\n\
                    @-moz-document domain(\"x\") {a{}}";
        let result = from_mozilla_format(text);
        assert_eq!(result.sections.len(), 2);
        assert!(result.sections[0].code.contains("@namespace"));
        assert!(result.sections[0].code.contains("body{margin:0}"));
    }

    #[test]
    fn unquoted_arguments_are_accepted() {
        let result =
            from_mozilla_format("@-moz-document url(https://x.com/a), domain(example.com) {a{}}");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.sections[0].urls, vec!["https://x.com/a"]);
        assert_eq!(result.sections[0].domains, vec!["example.com"]);
    }

    #[test]
    fn nested_constructs_split_the_host_section() {
        let text = "@-moz-document domain(\"a\") {\nx{}\n\
                    @-moz-document domain(\"b\") {\ny{}\n}\nz{}\n}";
        let result = from_mozilla_format(text);
        assert!(result.diagnostics.is_empty());
        let recovered: Vec<_> = result
            .sections
            .iter()
            .map(|s| (s.domains.clone(), s.code.clone()))
            .collect();
        assert_eq!(
            recovered,
            vec![
                (vec!["a".to_owned()], "x{}".to_owned()),
                (vec!["b".to_owned()], "y{}".to_owned()),
                (vec!["a".to_owned()], "z{}".to_owned()),
            ]
        );
    }

    #[test]
    fn stray_closing_brace_is_diagnosed_and_text_recovered() {
        let result = from_mozilla_format("}\na{}");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "unexpected '}'");
        assert_eq!((result.diagnostics[0].line, result.diagnostics[0].column), (1, 1));
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].code, "}\na{}");
    }

    #[test]
    fn construct_without_a_body_is_diagnosed() {
        let text = "@-moz-document domain(\"x\")";
        let result = from_mozilla_format(text);
        assert_eq!(result.diagnostics.len(), 1);
        // The prelude's conditions are lost, but the text itself is not:
        // it comes back as a global section.
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].code, text);
        assert!(result.sections[0].is_global());
    }

    #[test]
    fn custom_markers_are_honored() {
        let decoder = Decoder::new("VENDOR_SHEET", "@namespace svg url(http://www.w3.org/2000/svg);");
        let text = "/* VENDOR_SHEET */\n@-moz-document domain(\"x\") {a{}}";
        let result = decoder.decode(text);
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].code, "a{}");
        // The default marker is no longer special.
        let text = "/* AGENT_SHEET */\n@-moz-document domain(\"x\") {a{}}";
        let result = decoder.decode(text);
        assert_eq!(result.sections[0].code, "/* AGENT_SHEET */\na{}");
    }

    #[test]
    fn scoped_section_with_empty_body_round_trips_its_conditions() {
        let mut section = Section::new();
        section.push_condition(ConditionKind::Domain, "example.com");
        let text = to_mozilla_format(std::slice::from_ref(&section));
        let result = from_mozilla_format(&text);
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0], section);
    }
}
