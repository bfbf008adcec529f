//! Route compiler: parsed segments → anchored regex matcher.
//!
//! Literal text is escaped and matched verbatim, with one policy applied at
//! compile time: underscores and the configured word separator inside a
//! literal both accept either form. With the default separator `-`, the
//! pattern `/user_profile` matches `/user_profile` and `/user-profile`.
//!
//! Parameters become capture groups in declaration order. Unconstrained
//! parameters match any non-slash run.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::parser::{param_count, Constraint, ParamType, Segment};
use super::ParamVec;

/// Default word separator used when none is configured.
pub const DEFAULT_WORD_SEPARATOR: &str = "-";

/// Error raised when parsed segments cannot be turned into a matcher.
#[derive(Debug, Clone)]
pub enum CompileError {
    /// A `:name(regex)` constraint is not a valid regular expression
    InvalidConstraint {
        pattern: String,
        param: String,
        source: regex::Error,
    },
    /// A constraint declares its own capture groups, which would shift
    /// parameter positions. Use `(?:...)` instead.
    CapturingConstraint { pattern: String, param: String },
    /// The assembled regex failed to compile
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::InvalidConstraint {
                pattern,
                param,
                source,
            } => write!(
                f,
                "invalid constraint for parameter '{param}' in route '{pattern}': {source}"
            ),
            CompileError::CapturingConstraint { pattern, param } => write!(
                f,
                "constraint for parameter '{param}' in route '{pattern}' contains a capture group; use (?:...) instead"
            ),
            CompileError::InvalidPattern { pattern, source } => {
                write!(f, "route '{pattern}' does not compile: {source}")
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::InvalidConstraint { source, .. }
            | CompileError::InvalidPattern { source, .. } => Some(source),
            CompileError::CapturingConstraint { .. } => None,
        }
    }
}

/// Error raised when composing a URL from a compiled route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No value supplied for a declared parameter
    MissingParam { pattern: String, name: String },
    /// The supplied value does not satisfy the parameter's constraint
    InvalidValue {
        pattern: String,
        name: String,
        value: String,
    },
    /// No link is bound to the requested action
    UnknownAction { action: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MissingParam { pattern, name } => {
                write!(f, "missing value for '{name}' in route '{pattern}'")
            }
            BuildError::InvalidValue {
                pattern,
                name,
                value,
            } => write!(
                f,
                "value '{value}' does not satisfy parameter '{name}' in route '{pattern}'"
            ),
            BuildError::UnknownAction { action } => {
                write!(f, "no link is bound to action '{action}'")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// A route pattern compiled into a matcher.
///
/// Immutable once built. Holds the original segments so the route can be
/// reversed into a URL, plus a per-parameter validator used for that.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pattern: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    validators: Vec<Regex>,
    segments: Vec<Segment>,
    literal_prefix: String,
}

impl CompiledRoute {
    /// The source pattern this matcher was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The anchored regular expression used for matching.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Parameter names in declaration order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    /// Leading literal text every matching path must start with.
    #[must_use]
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    /// Cheap pre-check run before the regex.
    #[inline]
    #[must_use]
    pub fn may_match(&self, path: &str) -> bool {
        path.starts_with(self.literal_prefix.as_str())
    }

    /// Whether `path` matches, without extracting parameters.
    #[inline]
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.may_match(path) && self.regex.is_match(path)
    }

    /// Match `path` and extract parameter values in declaration order.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<ParamVec> {
        if !self.may_match(path) {
            return None;
        }
        let caps = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (i, name) in self.param_names.iter().enumerate() {
            let value = caps.get(i + 1).map_or("", |m| m.as_str());
            params.push((Arc::clone(name), value.to_string()));
        }
        Some(params)
    }

    /// Compose a path from this route by substituting parameter values.
    ///
    /// Literal text is emitted as written in the pattern. Each value must
    /// satisfy its parameter's constraint.
    pub fn build<'a, I>(&self, params: I) -> Result<String, BuildError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let params: Vec<(&str, &str)> = params.into_iter().collect();
        let mut out = String::with_capacity(self.pattern.len());
        let mut index = 0;
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(param) => {
                    let value = params
                        .iter()
                        .rfind(|(k, _)| *k == param.name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| BuildError::MissingParam {
                            pattern: self.pattern.clone(),
                            name: param.name.clone(),
                        })?;
                    if !self.validators[index].is_match(value) {
                        return Err(BuildError::InvalidValue {
                            pattern: self.pattern.clone(),
                            name: param.name.clone(),
                            value: value.to_string(),
                        });
                    }
                    out.push_str(value);
                    index += 1;
                }
            }
        }
        Ok(out)
    }
}

/// Compiles parsed segments into [`CompiledRoute`]s.
///
/// Carries the word-separator policy so it is decided once, at compile time,
/// rather than on every match.
#[derive(Debug, Clone)]
pub struct Compiler {
    word_separator: String,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(DEFAULT_WORD_SEPARATOR)
    }
}

impl Compiler {
    #[must_use]
    pub fn new(word_separator: impl Into<String>) -> Self {
        Self {
            word_separator: word_separator.into(),
        }
    }

    #[must_use]
    pub fn word_separator(&self) -> &str {
        &self.word_separator
    }

    /// Regex fragment matching either an underscore or the word separator.
    fn separator_class(&self) -> String {
        if self.word_separator.is_empty() || self.word_separator == "_" {
            "_".to_string()
        } else {
            format!("(?:_|{})", regex::escape(&self.word_separator))
        }
    }

    fn type_fragment(&self, kind: ParamType) -> String {
        match kind {
            ParamType::Any => "[^/]+".to_string(),
            ParamType::Integer => "-?[0-9]+".to_string(),
            ParamType::Unsigned => "[0-9]+".to_string(),
            ParamType::Decimal => r"-?[0-9]+(?:\.[0-9]+)?".to_string(),
            ParamType::Word => format!(
                "[A-Za-z0-9]+(?:{}[A-Za-z0-9]+)*",
                self.separator_class()
            ),
            ParamType::Rest => ".+".to_string(),
        }
    }

    /// Append `text` to `out` as a literal, making underscores and the word
    /// separator interchangeable. Returns the byte length of the verbatim
    /// prefix (up to the first separator-tolerant position).
    fn push_literal(&self, text: &str, out: &mut String) -> Option<usize> {
        let sep = self.word_separator.as_str();
        let class = self.separator_class();
        let mut first_tolerant = None;
        let mut rest = text;
        while let Some(ch) = rest.chars().next() {
            let consumed = if !sep.is_empty() && rest.starts_with(sep) {
                sep.len()
            } else if ch == '_' {
                1
            } else {
                0
            };
            if consumed > 0 {
                first_tolerant.get_or_insert(text.len() - rest.len());
                out.push_str(&class);
                rest = &rest[consumed..];
            } else {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
                rest = &rest[ch.len_utf8()..];
            }
        }
        first_tolerant
    }

    /// Compile `segments` (parsed from `pattern`) into a matcher.
    pub fn compile(&self, pattern: &str, segments: &[Segment]) -> Result<CompiledRoute, CompileError> {
        let mut source = String::with_capacity(pattern.len() * 2 + 2);
        source.push('^');

        let mut param_names = Vec::with_capacity(param_count(segments));
        let mut validators = Vec::with_capacity(param_count(segments));
        let mut literal_prefix = String::new();
        let mut prefix_open = true;

        for segment in segments {
            match segment {
                Segment::Literal(text) => {
                    let tolerant_at = self.push_literal(text, &mut source);
                    if prefix_open {
                        match tolerant_at {
                            Some(end) => {
                                literal_prefix.push_str(&text[..end]);
                                prefix_open = false;
                            }
                            None => literal_prefix.push_str(text),
                        }
                    }
                }
                Segment::Param(param) => {
                    prefix_open = false;
                    let fragment = match &param.constraint {
                        None => self.type_fragment(ParamType::Any),
                        Some(Constraint::Type(kind)) => self.type_fragment(*kind),
                        Some(Constraint::Pattern(expr)) => {
                            let probe = Regex::new(expr).map_err(|source| {
                                CompileError::InvalidConstraint {
                                    pattern: pattern.to_string(),
                                    param: param.name.clone(),
                                    source,
                                }
                            })?;
                            if probe.captures_len() > 1 {
                                return Err(CompileError::CapturingConstraint {
                                    pattern: pattern.to_string(),
                                    param: param.name.clone(),
                                });
                            }
                            format!("(?:{expr})")
                        }
                    };
                    let validator =
                        Regex::new(&format!("^{fragment}$")).map_err(|source| {
                            CompileError::InvalidConstraint {
                                pattern: pattern.to_string(),
                                param: param.name.clone(),
                                source,
                            }
                        })?;
                    source.push('(');
                    source.push_str(&fragment);
                    source.push(')');
                    param_names.push(Arc::from(param.name.as_str()));
                    validators.push(validator);
                }
            }
        }

        source.push('$');
        let regex = Regex::new(&source).map_err(|source| CompileError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        debug_assert_eq!(param_names.len(), param_count(segments));

        Ok(CompiledRoute {
            pattern: pattern.to_string(),
            regex,
            param_names,
            validators,
            segments: segments.to_vec(),
            literal_prefix,
        })
    }
}
