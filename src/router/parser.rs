//! Route pattern tokenizer.
//!
//! Turns a raw pattern string into an ordered list of [`Segment`]s. Two
//! placeholder syntaxes are understood:
//!
//! - `:name` and `:name(regex)` for named parameters, optionally constrained by
//!   an inline regular expression
//! - `[tag:name]` for type-tagged parameters, where the tag is one of
//!   `!` (any), `#` (integer), `+` (unsigned), `%` (decimal), `$` (word) or
//!   `*` (rest of the path, slashes included)
//!
//! Everything else is literal text. Parsing is pure and happens once per route
//! at boot; any error here is fatal for the registration that triggered it.

use std::fmt;

/// Type tag attached to a `[tag:name]` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// `!` - any non-slash text (same as an unconstrained `:name`)
    Any,
    /// `#` - optionally signed integer
    Integer,
    /// `+` - unsigned integer
    Unsigned,
    /// `%` - decimal number
    Decimal,
    /// `$` - alphanumeric words joined by the configured word separator
    Word,
    /// `*` - the remainder of the path, slashes included
    Rest,
}

impl ParamType {
    /// Map a tag character to its type, if known.
    #[must_use]
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            '!' => Some(ParamType::Any),
            '#' => Some(ParamType::Integer),
            '+' => Some(ParamType::Unsigned),
            '%' => Some(ParamType::Decimal),
            '$' => Some(ParamType::Word),
            '*' => Some(ParamType::Rest),
            _ => None,
        }
    }

    /// The tag character used to write this type in a pattern.
    #[must_use]
    pub fn tag(self) -> char {
        match self {
            ParamType::Any => '!',
            ParamType::Integer => '#',
            ParamType::Unsigned => '+',
            ParamType::Decimal => '%',
            ParamType::Word => '$',
            ParamType::Rest => '*',
        }
    }
}

/// Constraint restricting what a parameter may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Inline regular expression from `:name(regex)`
    Pattern(String),
    /// Type tag from `[tag:name]`
    Type(ParamType),
}

/// A named placeholder inside a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub constraint: Option<Constraint>,
}

/// One piece of a parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(Param),
}

impl Segment {
    fn param(name: String, constraint: Option<Constraint>) -> Self {
        Segment::Param(Param { name, constraint })
    }
}

/// Error raised when a route pattern cannot be tokenized.
///
/// Every variant carries the offending pattern and the byte offset at which
/// the problem was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `[` placeholder was never closed with `]`
    UnclosedBracket { pattern: String, position: usize },
    /// A `(` constraint was never closed with a matching `)`
    UnclosedParen { pattern: String, position: usize },
    /// A placeholder has no name
    EmptyName { pattern: String, position: usize },
    /// A placeholder name is not a valid identifier
    InvalidName {
        pattern: String,
        position: usize,
        name: String,
    },
    /// The same parameter name appears twice in one pattern
    DuplicateParam {
        pattern: String,
        position: usize,
        name: String,
    },
    /// A `[tag:name]` placeholder uses an unknown tag
    UnknownTypeTag {
        pattern: String,
        position: usize,
        tag: String,
    },
    /// A `:name()` placeholder has an empty constraint
    EmptyConstraint {
        pattern: String,
        position: usize,
        name: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnclosedBracket { pattern, position } => {
                write!(f, "unclosed '[' at byte {position} in route '{pattern}'")
            }
            ParseError::UnclosedParen { pattern, position } => {
                write!(f, "unclosed '(' at byte {position} in route '{pattern}'")
            }
            ParseError::EmptyName { pattern, position } => {
                write!(
                    f,
                    "parameter without a name at byte {position} in route '{pattern}'"
                )
            }
            ParseError::InvalidName {
                pattern,
                position,
                name,
            } => write!(
                f,
                "invalid parameter name '{name}' at byte {position} in route '{pattern}'"
            ),
            ParseError::DuplicateParam {
                pattern,
                position,
                name,
            } => write!(
                f,
                "parameter '{name}' declared twice (again at byte {position}) in route '{pattern}'"
            ),
            ParseError::UnknownTypeTag {
                pattern,
                position,
                tag,
            } => write!(
                f,
                "unknown type tag '{tag}' at byte {position} in route '{pattern}'"
            ),
            ParseError::EmptyConstraint {
                pattern,
                position,
                name,
            } => write!(
                f,
                "empty constraint for parameter '{name}' at byte {position} in route '{pattern}'"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => chars.all(is_name_char),
        _ => false,
    }
}

/// Tokenize a route pattern into literal and parameter segments.
///
/// Adjacent literal characters are merged into a single
/// [`Segment::Literal`]. Parameter names must be unique within the pattern.
///
/// ```rust
/// use inkwell_routing::router::{parse, Segment};
///
/// let segments = parse("/users/:id(\\d+)").unwrap();
/// assert_eq!(segments.len(), 2);
/// assert!(matches!(&segments[0], Segment::Literal(l) if l == "/users/"));
/// ```
pub fn parse(pattern: &str) -> Result<Vec<Segment>, ParseError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut seen: Vec<String> = Vec::new();
    let bytes = pattern.as_bytes();
    let mut pos = 0;

    while pos < pattern.len() {
        let c = bytes[pos];
        match c {
            b':' => {
                let start = pos;
                let name_start = pos + 1;
                let name_end = pattern[name_start..]
                    .find(|ch: char| !is_name_char(ch))
                    .map_or(pattern.len(), |off| name_start + off);
                let name = &pattern[name_start..name_end];
                if name.is_empty() {
                    return Err(ParseError::EmptyName {
                        pattern: pattern.to_string(),
                        position: start,
                    });
                }
                if !valid_name(name) {
                    return Err(ParseError::InvalidName {
                        pattern: pattern.to_string(),
                        position: start,
                        name: name.to_string(),
                    });
                }
                pos = name_end;

                let mut constraint = None;
                if bytes.get(pos) == Some(&b'(') {
                    let (body, next) = read_group(pattern, pos)?;
                    if body.is_empty() {
                        return Err(ParseError::EmptyConstraint {
                            pattern: pattern.to_string(),
                            position: pos,
                            name: name.to_string(),
                        });
                    }
                    constraint = Some(Constraint::Pattern(body.to_string()));
                    pos = next;
                }

                push_param(
                    pattern,
                    start,
                    name,
                    constraint,
                    &mut seen,
                    &mut literal,
                    &mut segments,
                )?;
            }
            b'[' => {
                let start = pos;
                let close = pattern[start..]
                    .find(']')
                    .map(|off| start + off)
                    .ok_or_else(|| ParseError::UnclosedBracket {
                        pattern: pattern.to_string(),
                        position: start,
                    })?;
                let inner = &pattern[start + 1..close];
                let (tag, name) = match inner.split_once(':') {
                    Some((tag, name)) => (tag, name),
                    None => ("", inner),
                };
                let kind = match tag {
                    "" => ParamType::Any,
                    _ => {
                        let mut tag_chars = tag.chars();
                        match (tag_chars.next().and_then(ParamType::from_tag), tag_chars.next()) {
                            (Some(kind), None) => kind,
                            _ => {
                                return Err(ParseError::UnknownTypeTag {
                                    pattern: pattern.to_string(),
                                    position: start,
                                    tag: tag.to_string(),
                                })
                            }
                        }
                    }
                };
                if name.is_empty() {
                    return Err(ParseError::EmptyName {
                        pattern: pattern.to_string(),
                        position: start,
                    });
                }
                if !valid_name(name) {
                    return Err(ParseError::InvalidName {
                        pattern: pattern.to_string(),
                        position: start,
                        name: name.to_string(),
                    });
                }
                push_param(
                    pattern,
                    start,
                    name,
                    Some(Constraint::Type(kind)),
                    &mut seen,
                    &mut literal,
                    &mut segments,
                )?;
                pos = close + 1;
            }
            _ => {
                // Multi-byte characters are copied whole
                let ch_len = pattern[pos..].chars().next().map_or(1, char::len_utf8);
                literal.push_str(&pattern[pos..pos + ch_len]);
                pos += ch_len;
            }
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

fn push_param(
    pattern: &str,
    position: usize,
    name: &str,
    constraint: Option<Constraint>,
    seen: &mut Vec<String>,
    literal: &mut String,
    segments: &mut Vec<Segment>,
) -> Result<(), ParseError> {
    if seen.iter().any(|s| s == name) {
        return Err(ParseError::DuplicateParam {
            pattern: pattern.to_string(),
            position,
            name: name.to_string(),
        });
    }
    seen.push(name.to_string());
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
    segments.push(Segment::param(name.to_string(), constraint));
    Ok(())
}

/// Read a balanced `( ... )` group starting at `open`, honoring `\` escapes.
/// Returns the inner text and the byte offset just past the closing paren.
fn read_group(pattern: &str, open: usize) -> Result<(&str, usize), ParseError> {
    let bytes = pattern.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&pattern[open + 1..i], i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(ParseError::UnclosedParen {
        pattern: pattern.to_string(),
        position: open,
    })
}

/// Count the parameters a pattern declares.
#[must_use]
pub fn param_count(segments: &[Segment]) -> usize {
    segments
        .iter()
        .filter(|s| matches!(s, Segment::Param(_)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Segment {
        Segment::Literal(s.to_string())
    }

    fn param(name: &str, constraint: Option<Constraint>) -> Segment {
        Segment::param(name.to_string(), constraint)
    }

    #[test]
    fn test_literal_only() {
        assert_eq!(parse("/about/team").unwrap(), vec![lit("/about/team")]);
    }

    #[test]
    fn test_colon_params_keep_order() {
        let segments = parse("/users/:user_id/posts/:post").unwrap();
        assert_eq!(
            segments,
            vec![
                lit("/users/"),
                param("user_id", None),
                lit("/posts/"),
                param("post", None),
            ]
        );
        assert_eq!(param_count(&segments), 2);
    }

    #[test]
    fn test_regex_constraint_with_nested_groups() {
        let segments = parse(r"/files/:name((?:a|b)\)x)/raw").unwrap();
        assert_eq!(
            segments,
            vec![
                lit("/files/"),
                param("name", Some(Constraint::Pattern(r"(?:a|b)\)x".to_string()))),
                lit("/raw"),
            ]
        );
    }

    #[test]
    fn test_type_tags() {
        let segments = parse("/[#:id]/[$:slug]/[*:rest]/[:plain]").unwrap();
        assert_eq!(
            segments,
            vec![
                lit("/"),
                param("id", Some(Constraint::Type(ParamType::Integer))),
                lit("/"),
                param("slug", Some(Constraint::Type(ParamType::Word))),
                lit("/"),
                param("rest", Some(Constraint::Type(ParamType::Rest))),
                lit("/"),
                param("plain", Some(Constraint::Type(ParamType::Any))),
            ]
        );
    }

    #[test]
    fn test_unclosed_bracket() {
        assert!(matches!(
            parse("/users/[#:id"),
            Err(ParseError::UnclosedBracket { position: 7, .. })
        ));
    }

    #[test]
    fn test_unclosed_paren() {
        assert!(matches!(
            parse(r"/users/:id(\d+"),
            Err(ParseError::UnclosedParen { .. })
        ));
    }

    #[test]
    fn test_empty_name() {
        assert!(matches!(parse("/users/:"), Err(ParseError::EmptyName { .. })));
        assert!(matches!(parse("/users/[#:]"), Err(ParseError::EmptyName { .. })));
    }

    #[test]
    fn test_invalid_name() {
        assert!(matches!(
            parse("/users/:1abc"),
            Err(ParseError::InvalidName { .. })
        ));
        assert!(matches!(
            parse("/users/[#:bad-name]"),
            Err(ParseError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_duplicate_param() {
        let err = parse("/a/:id/b/[#:id]").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateParam { ref name, .. } if name == "id"));
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            parse("/[?:id]"),
            Err(ParseError::UnknownTypeTag { ref tag, .. }) if tag == "?"
        ));
        assert!(matches!(
            parse("/[##:id]"),
            Err(ParseError::UnknownTypeTag { .. })
        ));
    }

    #[test]
    fn test_empty_constraint() {
        assert!(matches!(
            parse("/users/:id()"),
            Err(ParseError::EmptyConstraint { .. })
        ));
    }
}
