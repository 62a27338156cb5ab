//! Single forward pass over the CSS token stream.
//!
//! The tokenizer walk lives here; section assembly lives in `decode`. One
//! pass over the input produces a flat, ordered list of structural events:
//! scope-construct start/end pairs (always balanced, an unterminated block
//! is closed implicitly at end of input) and non-fatal parse errors. All
//! positions are byte offsets taken straight from the tokenizer, so range
//! extraction later is plain slicing.

use cssparser::{ParseError, Parser, ParserInput, Token};

use crate::format::diagnostic::{Diagnostic, Position};
use crate::section::ConditionKind;

const SCOPE_AT_KEYWORD: &str = "-moz-document";

/// A structural event observed while walking the token stream.
#[derive(Debug, Clone)]
pub(crate) enum ParseEvent {
    /// A `@-moz-document <args> {` construct opened.
    ScopeStart {
        /// Byte offset of the `@`.
        at: usize,
        /// Recognized condition arguments, in source order.
        conditions: Vec<(ConditionKind, String)>,
        /// Byte offset just after the opening brace.
        body_start: usize,
    },
    /// The matching closing brace (or end of input) of a scope construct.
    ScopeEnd {
        /// Byte offset just before the closing brace.
        body_end: usize,
        /// Byte offset just after the closing brace.
        after: usize,
    },
    /// A non-fatal parse problem; the walk continues past it.
    Error(Diagnostic),
}

/// Tokenize `text` and collect the structural events in source order.
pub(crate) fn parse_events(text: &str) -> Vec<ParseEvent> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut events = Vec::new();
    scan(&mut parser, &mut events);
    events
}

/// Walk one nesting level. At the top level this runs to end of input; inside
/// a scope construct it runs to the construct's closing brace.
fn scan<'i>(parser: &mut Parser<'i, '_>, events: &mut Vec<ParseEvent>) {
    loop {
        let at = parser.position().byte_index();
        let location = Position::from_location(parser.current_source_location());
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::AtKeyword(name) if name.eq_ignore_ascii_case(SCOPE_AT_KEYWORD) => {
                scope_construct(parser, events, at, location);
            }
            Token::BadString(_) => {
                events.push(ParseEvent::Error(Diagnostic::new(location, "unterminated string")));
            }
            Token::BadUrl(_) => {
                events.push(ParseEvent::Error(Diagnostic::new(location, "malformed URL")));
            }
            // Only reachable at the top level; inside a construct the
            // closing brace ends the nested parser instead.
            Token::CloseCurlyBracket => {
                events.push(ParseEvent::Error(Diagnostic::new(location, "unexpected '}'")));
            }
            // A block we are not descending into. Drain it eagerly so the
            // positions read at the top of the loop land after it.
            Token::CurlyBracketBlock
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::Function(_) => {
                let _ = parser.parse_nested_block(|block| skip_block(block, events));
            }
            // Unrelated at-rule preludes and rule contents are opaque here.
            _ => {}
        }
    }
}

/// Drain a block we are not assembling sections from, still surfacing the
/// tokenizer-level problems found inside it.
fn skip_block<'i>(
    block: &mut Parser<'i, '_>,
    events: &mut Vec<ParseEvent>,
) -> Result<(), ParseError<'i, ()>> {
    loop {
        let location = Position::from_location(block.current_source_location());
        let token = match block.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };
        match token {
            Token::BadString(_) => {
                events.push(ParseEvent::Error(Diagnostic::new(location, "unterminated string")));
            }
            Token::BadUrl(_) => {
                events.push(ParseEvent::Error(Diagnostic::new(location, "malformed URL")));
            }
            Token::CurlyBracketBlock
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::Function(_) => {
                let _ = block.parse_nested_block(|inner| skip_block(inner, events));
            }
            _ => {}
        }
    }
}

/// Parse a scope construct from just after its at-keyword: the argument
/// prelude, then the brace-delimited body (recursively).
fn scope_construct<'i>(
    parser: &mut Parser<'i, '_>,
    events: &mut Vec<ParseEvent>,
    at: usize,
    location: Position,
) {
    let mut conditions = Vec::new();
    let mut opened = false;
    loop {
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(err) => {
                // Document ended (or the enclosing block closed) before the
                // construct's body opened.
                events.push(ParseEvent::Error(Diagnostic::new(
                    Position::from_location(err.location),
                    err.kind.to_string(),
                )));
                break;
            }
        };
        match token {
            Token::CurlyBracketBlock => {
                opened = true;
                break;
            }
            Token::WhiteSpace(_) | Token::Comment(_) | Token::Comma => {}
            Token::Function(name) => {
                let function = name.as_ref().to_owned();
                match ConditionKind::from_css_function(&function) {
                    Some(kind) => match parser.parse_nested_block(call_argument) {
                        Ok(value) if !value.is_empty() => conditions.push((kind, value)),
                        _ => events.push(invalid_function(location, &function)),
                    },
                    // Unknown scoping function; its argument block is
                    // consumed as part of the next token fetch.
                    None => events.push(invalid_function(location, &function)),
                }
            }
            // `url(...)` with an unquoted argument tokenizes as a URL token.
            Token::UnquotedUrl(value) => {
                conditions.push((ConditionKind::Url, value.as_ref().to_owned()));
            }
            Token::Ident(name) => {
                let name = name.as_ref().to_owned();
                events.push(invalid_function(location, &name));
            }
            Token::Semicolon => {
                events.push(ParseEvent::Error(Diagnostic::new(location, "unexpected ';'")));
                break;
            }
            _ => events.push(invalid_function(location, "")),
        }
    }
    if !opened {
        return;
    }

    let body_start = parser.position().byte_index();
    events.push(ParseEvent::ScopeStart {
        at,
        conditions,
        body_start,
    });
    let body_end = parser
        .parse_nested_block(|block| -> Result<usize, ParseError<'i, ()>> {
            scan(block, events);
            Ok(block.position().byte_index())
        })
        .unwrap_or(body_start);
    events.push(ParseEvent::ScopeEnd {
        body_end,
        after: parser.position().byte_index(),
    });
}

fn invalid_function(location: Position, name: &str) -> ParseEvent {
    ParseEvent::Error(Diagnostic::new(
        location,
        format!("invalid function \"{name}\""),
    ))
}

/// Read one scoping-function argument: a quoted string (already unescaped
/// by the tokenizer) or the raw argument text, trimmed.
fn call_argument<'i>(args: &mut Parser<'i, '_>) -> Result<String, ParseError<'i, ()>> {
    if let Ok(value) = args.try_parse(|p| p.expect_string().map(|s| s.as_ref().to_owned())) {
        // Anything trailing the quoted value is ignored.
        while args.next().is_ok() {}
        return Ok(value);
    }
    let start = args.position();
    while args.next_including_whitespace_and_comments().is_ok() {}
    Ok(args.slice_from(start).trim().to_owned())
}
