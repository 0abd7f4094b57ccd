//! Query filter language.
//!
//! A query is a path of up to four segments matched against the assembly,
//! namespace, class simple name and method name, optionally followed by a
//! bracketed trait expression:
//!
//! ```text
//! /assembly/namespace/class/method
//! /*/MyNs/(Foo)|(Bar)/!Slow*
//! /*/*/*/*/[Category=Unit]
//! /[(Category=Unit)|(Category=Fast)]
//! ```
//!
//! `*` alone matches anything. Otherwise a segment may start and/or end with
//! `*` for suffix, prefix or substring matching. Matching ignores case.

use trial_ir::Traits;

/// Borrowed view of the unit properties queries and simple filters read.
#[derive(Clone, Copy, Debug)]
pub struct FilterSubject<'a> {
    pub assembly_name: &'a str,
    pub namespace: Option<&'a str>,
    /// Fully qualified class name.
    pub class_name: &'a str,
    pub class_simple_name: &'a str,
    pub method_name: &'a str,
    pub traits: &'a Traits,
}

impl<'a> From<&'a trial_ir::TestUnit> for FilterSubject<'a> {
    fn from(unit: &'a trial_ir::TestUnit) -> Self {
        let class = unit.class();
        FilterSubject {
            assembly_name: &unit.assembly().name,
            namespace: class.namespace.as_deref(),
            class_name: &class.name,
            class_simple_name: class.simple_name(),
            method_name: &unit.method.name,
            traits: &unit.traits,
        }
    }
}

/// Why a query failed to parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueryErrorKind {
    #[error("query must begin with '/'")]
    MissingLeadingSlash,
    #[error("too many segments (max 4)")]
    TooManySegments,
    #[error("saw opening '[' without ending ']'")]
    UnterminatedTrait,
    #[error("negate a trait expression with 'name!=value'")]
    NegatedTrait,
    #[error("negating operator '!' must be inside parenthesis, not outside")]
    NegatedGroup,
    #[error("open '(' does not have matching closing ')'")]
    UnmatchedParen,
    #[error("unexpected character '{0}' after closing parenthesis")]
    UnexpectedCharacter(char),
    #[error("logical operator '{0}' cannot end a query")]
    OperatorAtEnd(char),
    #[error("logical operator '{0}' must be followed by an open parenthesis")]
    OperatorWithoutParen(char),
    #[error("logical expressions cannot mix '|' and '&' without grouping parentheses")]
    MixedOperators,
    #[error("'!' is missing the segment query to negate")]
    MissingNegatedSegment,
    #[error("'!*' would exclude all tests")]
    ExcludesAll,
    #[error("trait expression '{0}' must be 'name=value' or 'name!=value'")]
    InvalidTrait(String),
    #[error("'{0}': wildcards must include text in the middle")]
    WildcardWithoutText(String),
    #[error("'{0}': wildcards may only be at the beginning and/or end")]
    WildcardInMiddle(String),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Query filter '{query}' is not valid: {kind}")]
pub struct QueryParseError {
    pub query: String,
    pub kind: QueryErrorKind,
}

const MAX_SEGMENTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment {
    Assembly,
    Namespace,
    Class,
    Method,
    Trait,
}

const PATH_SEGMENTS: [Segment; MAX_SEGMENTS] = [
    Segment::Assembly,
    Segment::Namespace,
    Segment::Class,
    Segment::Method,
];

/// Case-insensitive text matcher with optional leading/trailing wildcard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextMatcher {
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl TextMatcher {
    fn parse(text: &str) -> Result<Self, QueryErrorKind> {
        if text.is_empty() || text == "*" {
            return Ok(TextMatcher::Any);
        }
        let (leading, rest) = match text.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (trailing, core) = match rest.strip_suffix('*') {
            Some(core) => (true, core),
            None => (false, rest),
        };
        if core.is_empty() {
            return Err(QueryErrorKind::WildcardWithoutText(text.to_string()));
        }
        if core.contains('*') {
            return Err(QueryErrorKind::WildcardInMiddle(text.to_string()));
        }
        let core = core.to_lowercase();
        Ok(match (leading, trailing) {
            (true, true) => TextMatcher::Contains(core),
            (false, true) => TextMatcher::Prefix(core),
            (true, false) => TextMatcher::Suffix(core),
            (false, false) => TextMatcher::Exact(core),
        })
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return matches!(self, TextMatcher::Any);
        };
        let value = value.to_lowercase();
        match self {
            TextMatcher::Any => true,
            TextMatcher::Exact(s) => value == *s,
            TextMatcher::Prefix(s) => value.starts_with(s.as_str()),
            TextMatcher::Suffix(s) => value.ends_with(s.as_str()),
            TextMatcher::Contains(s) => value.contains(s.as_str()),
        }
    }
}

/// Parsed query expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryFilter {
    Pass,
    Fail,
    Assembly(TextMatcher),
    Namespace(TextMatcher),
    Class(TextMatcher),
    Method(TextMatcher),
    Trait { name: TextMatcher, value: TextMatcher },
    Not(Box<QueryFilter>),
    And(Vec<QueryFilter>),
    Or(Vec<QueryFilter>),
}

impl QueryFilter {
    pub fn parse(query: &str) -> Result<Self, QueryParseError> {
        parse_query(query).map_err(|kind| QueryParseError {
            query: query.to_string(),
            kind,
        })
    }

    pub fn matches(&self, subject: &FilterSubject<'_>) -> bool {
        match self {
            QueryFilter::Pass => true,
            QueryFilter::Fail => false,
            QueryFilter::Assembly(m) => m.matches(Some(subject.assembly_name)),
            QueryFilter::Namespace(m) => m.matches(subject.namespace),
            QueryFilter::Class(m) => m.matches(Some(subject.class_simple_name)),
            QueryFilter::Method(m) => m.matches(Some(subject.method_name)),
            QueryFilter::Trait { name, value } => subject
                .traits
                .pairs()
                .any(|(k, v)| name.matches(Some(k)) && value.matches(Some(v))),
            QueryFilter::Not(inner) => !inner.matches(subject),
            QueryFilter::And(filters) => filters.iter().all(|f| f.matches(subject)),
            QueryFilter::Or(filters) => filters.iter().any(|f| f.matches(subject)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Logical {
    And,
    Or,
}

fn parse_query(query: &str) -> Result<QueryFilter, QueryErrorKind> {
    let mut rest = query
        .strip_prefix('/')
        .ok_or(QueryErrorKind::MissingLeadingSlash)?;
    let mut filters = Vec::new();
    let mut index = 0;

    while !rest.is_empty() {
        if rest.starts_with("![") {
            return Err(QueryErrorKind::NegatedTrait);
        }

        let (parsed, remainder) = if let Some(bracketed) = rest.strip_prefix('[') {
            let inner = bracketed
                .strip_suffix(']')
                .ok_or(QueryErrorKind::UnterminatedTrait)?;
            parse_logical(inner, Segment::Trait, false)?
        } else {
            let segment = PATH_SEGMENTS
                .get(index)
                .copied()
                .ok_or(QueryErrorKind::TooManySegments)?;
            parse_logical(rest, segment, false)?
        };

        filters.extend(parsed);
        rest = remainder;
        index += 1;
    }

    Ok(match filters.len() {
        0 => QueryFilter::Pass,
        1 => filters.swap_remove(0),
        _ => QueryFilter::And(filters),
    })
}

fn finish_group(
    group: Option<(Logical, Vec<QueryFilter>)>,
    last: Option<QueryFilter>,
) -> Option<QueryFilter> {
    match group {
        None => last,
        Some((op, mut filters)) => {
            filters.push(last.unwrap_or(QueryFilter::Pass));
            Some(match op {
                Logical::And => QueryFilter::And(filters),
                Logical::Or => QueryFilter::Or(filters),
            })
        }
    }
}

/// Parse one segment, grouped or bare. Returns the filter (`None` for a
/// match-anything segment) and the unparsed remainder.
fn parse_logical(
    partial: &str,
    segment: Segment,
    inside_paren: bool,
) -> Result<(Option<QueryFilter>, &str), QueryErrorKind> {
    let (negated, partial) = match partial.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, partial),
    };

    if let Some(mut residual) = partial.strip_prefix('(') {
        if negated {
            return Err(if segment == Segment::Trait {
                QueryErrorKind::NegatedTrait
            } else {
                QueryErrorKind::NegatedGroup
            });
        }

        let mut group: Option<(Logical, Vec<QueryFilter>)> = None;
        loop {
            let (inner, rest) = parse_logical(residual, segment, true)?;
            residual = rest;

            let Some(op) = residual.chars().next() else {
                return Ok((finish_group(group, inner), ""));
            };
            if (op == '/' && !inside_paren) || (op == ')' && inside_paren) {
                return Ok((finish_group(group, inner), &residual[1..]));
            }

            let logical = match op {
                '|' => Logical::Or,
                '&' => Logical::And,
                other => return Err(QueryErrorKind::UnexpectedCharacter(other)),
            };
            match &mut group {
                None => group = Some((logical, vec![inner.unwrap_or(QueryFilter::Pass)])),
                Some((existing, _)) if *existing != logical => {
                    return Err(QueryErrorKind::MixedOperators)
                }
                Some((_, filters)) => filters.push(inner.unwrap_or(QueryFilter::Pass)),
            }

            let after = &residual[1..];
            if after.is_empty() {
                return Err(QueryErrorKind::OperatorAtEnd(op));
            }
            residual = after
                .strip_prefix('(')
                .ok_or(QueryErrorKind::OperatorWithoutParen(op))?;
        }
    }

    let end = if inside_paren {
        Some(partial.find(')').ok_or(QueryErrorKind::UnmatchedParen)?)
    } else if segment == Segment::Trait {
        None
    } else {
        partial.find('/')
    };
    let text = end.map_or(partial, |i| &partial[..i]);
    let remainder = end.map_or("", |i| &partial[i + 1..]);

    if negated {
        if segment == Segment::Trait {
            return Err(QueryErrorKind::NegatedTrait);
        }
        if text.is_empty() {
            return Err(QueryErrorKind::MissingNegatedSegment);
        }
        if text == "*" {
            return Err(QueryErrorKind::ExcludesAll);
        }
    }

    let filter = match segment {
        Segment::Trait => Some(parse_trait(text)?),
        _ => parse_path_segment(text, segment, negated)?,
    };
    Ok((filter, remainder))
}

fn parse_path_segment(
    text: &str,
    segment: Segment,
    negated: bool,
) -> Result<Option<QueryFilter>, QueryErrorKind> {
    if text == "*" {
        return Ok(negated.then_some(QueryFilter::Fail));
    }
    let matcher = TextMatcher::parse(text)?;
    let filter = match segment {
        Segment::Assembly => QueryFilter::Assembly(matcher),
        Segment::Namespace => QueryFilter::Namespace(matcher),
        Segment::Class => QueryFilter::Class(matcher),
        Segment::Method | Segment::Trait => QueryFilter::Method(matcher),
    };
    Ok(Some(if negated {
        QueryFilter::Not(Box::new(filter))
    } else {
        filter
    }))
}

fn parse_trait(text: &str) -> Result<QueryFilter, QueryErrorKind> {
    let invalid = || QueryErrorKind::InvalidTrait(text.to_string());
    let eq = text.find('=').filter(|&i| i > 0).ok_or_else(invalid)?;
    let (name, negated) = match text[..eq].strip_suffix('!') {
        Some(name) => (name, true),
        None => (&text[..eq], false),
    };
    let value = &text[eq + 1..];
    if name.is_empty() || value.is_empty() {
        return Err(invalid());
    }
    let filter = QueryFilter::Trait {
        name: TextMatcher::parse(name)?,
        value: TextMatcher::parse(value)?,
    };
    Ok(if negated {
        QueryFilter::Not(Box::new(filter))
    } else {
        filter
    })
}
