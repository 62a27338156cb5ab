//! The section model: one block of CSS plus its match conditions.

/// The kinds of match condition a section can carry, in the fixed order
/// they are emitted in exported text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// Exact URL match (`url(...)`).
    Url,
    /// URL prefix match (`url-prefix(...)`).
    UrlPrefix,
    /// Domain match (`domain(...)`).
    Domain,
    /// Regular expression match (`regexp(...)`).
    Regexp,
}

impl ConditionKind {
    /// All kinds in emission order.
    pub const ALL: [ConditionKind; 4] = [
        ConditionKind::Url,
        ConditionKind::UrlPrefix,
        ConditionKind::Domain,
        ConditionKind::Regexp,
    ];

    /// The `@-moz-document` function name for this kind.
    pub fn css_function(self) -> &'static str {
        match self {
            ConditionKind::Url => "url",
            ConditionKind::UrlPrefix => "url-prefix",
            ConditionKind::Domain => "domain",
            ConditionKind::Regexp => "regexp",
        }
    }

    /// Reverse mapping from a `@-moz-document` function name.
    ///
    /// Returns `None` for anything that is not one of the four scoping
    /// functions; matching is case-sensitive, as in the original dialect.
    pub fn from_css_function(name: &str) -> Option<ConditionKind> {
        match name {
            "url" => Some(ConditionKind::Url),
            "url-prefix" => Some(ConditionKind::UrlPrefix),
            "domain" => Some(ConditionKind::Domain),
            "regexp" => Some(ConditionKind::Regexp),
            _ => None,
        }
    }
}

/// One scoped block of CSS.
///
/// A section couples a body of raw CSS text with zero or more match
/// conditions. A section with no conditions is *global* (applies
/// everywhere) and is emitted as bare CSS; a section with at least one
/// condition is wrapped in a `@-moz-document` scope construct.
///
/// The transcoder never mutates sections it is given: encoding only reads,
/// decoding only constructs fresh instances. Condition insertion order is
/// preserved and observable in the exported text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Raw CSS text of the section body. May be empty, and may itself
    /// contain nested braces, comments, and strings.
    pub code: String,
    /// Exact-URL conditions.
    pub urls: Vec<String>,
    /// URL-prefix conditions.
    pub url_prefixes: Vec<String>,
    /// Domain conditions.
    pub domains: Vec<String>,
    /// Regular-expression conditions. Stored unescaped; validity of the
    /// pattern is not this crate's concern.
    pub regexps: Vec<String>,
}

impl Section {
    /// Create an empty section with no code and no conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a global section holding the given code.
    pub fn global(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Whether this section has no match conditions at all.
    pub fn is_global(&self) -> bool {
        self.urls.is_empty()
            && self.url_prefixes.is_empty()
            && self.domains.is_empty()
            && self.regexps.is_empty()
    }

    /// Whether this section carries nothing: empty code and no conditions.
    ///
    /// Such sections are dropped during decoding rather than surfaced.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.is_global()
    }

    /// The condition values of one kind, in insertion order.
    pub fn conditions_of(&self, kind: ConditionKind) -> &[String] {
        match kind {
            ConditionKind::Url => &self.urls,
            ConditionKind::UrlPrefix => &self.url_prefixes,
            ConditionKind::Domain => &self.domains,
            ConditionKind::Regexp => &self.regexps,
        }
    }

    /// Append a condition value of the given kind.
    pub fn push_condition(&mut self, kind: ConditionKind, value: impl Into<String>) {
        let list = match kind {
            ConditionKind::Url => &mut self.urls,
            ConditionKind::UrlPrefix => &mut self.url_prefixes,
            ConditionKind::Domain => &mut self.domains,
            ConditionKind::Regexp => &mut self.regexps,
        };
        list.push(value.into());
    }

    /// Iterate all conditions in fixed kind order (url, url-prefix, domain,
    /// regexp), preserving insertion order within each kind.
    pub fn conditions(&self) -> impl Iterator<Item = (ConditionKind, &str)> {
        ConditionKind::ALL.into_iter().flat_map(move |kind| {
            self.conditions_of(kind)
                .iter()
                .map(move |value| (kind, value.as_str()))
        })
    }
}
