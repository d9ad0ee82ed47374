//! Path templates compiled into matchers.
//!
//! A template is a `/`-separated path whose segments are either literals,
//! matched verbatim, or parameters:
//! ```ignore
//!  Syntax          Matches
//!  :name           exactly one segment
//!  :name?          an optional segment
//!  :name+          one or more segments
//!  :name*          zero or more segments
//!  :name(regex)    one segment matching `regex`, combinable with ? + *
//!  *name           the rest of the path, possibly empty (final segment only)
//! ```
//!
//! Named parameters match anything until the next '/' or the path end:
//! ```ignore
//!  Path: /blog/:category/:post
//!
//!   /blog/rust/request-routers            match: category="rust", post="request-routers"
//!   /blog/rust/request-routers/           no match
//!   /blog/rust/                           no match
//!   /blog/rust/request-routers/comments   no match
//! ```
//!
//! Catch-all parameters match anything after the directory index:
//! ```ignore
//!  Path: /files/*filepath
//!
//!   /files/                             match: filepath=""
//!   /files/LICENSE                      match: filepath="LICENSE"
//!   /files/templates/article.html       match: filepath="templates/article.html"
//!   /files                              no match
//! ```
//!
//! A custom regex may contain '/', so `:path([a-z/]+)` spans segments. A
//! template made only of optional parameters, such as `/:page?`, matches `/`
//! when all of them are absent.
//!
//! Matching is strict: the whole path has to be consumed and a trailing slash
//! is significant. Captured values are the raw substrings, undecoded.
use regex::Regex;

use crate::context::Params;
use crate::error::{Error, Result};

/// A parameter declared by a template, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
    name: String,
    optional: bool,
    repeat: bool,
    group: String,
}

impl ParamKey {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the parameter may be absent from a matching path.
    pub fn optional(&self) -> bool {
        self.optional
    }

    /// Whether the parameter may span several segments.
    pub fn repeat(&self) -> bool {
        self.repeat
    }
}

/// A compiled path template.
/// ```rust
/// use chainrouter::pattern::Pattern;
///
/// let pattern = Pattern::compile("/assets/*file").unwrap();
///
/// assert!(pattern.is_match("/assets/css/site.css"));
/// assert!(!pattern.is_match("/other/site.css"));
/// assert_eq!(pattern.extract("/assets/css/site.css").get("file"), Some("css/site.css"));
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    template: String,
    regex: Regex,
    keys: Vec<ParamKey>,
}

#[derive(Clone, Copy)]
enum Modifier {
    One,
    Optional,
    OneOrMore,
    ZeroOrMore,
}

impl Pattern {
    /// Compiles `template`, failing if it is malformed.
    pub fn compile(template: &str) -> Result<Self> {
        let body = template
            .strip_prefix('/')
            .ok_or_else(|| Error::MissingLeadingSlash(template.to_owned()))?;

        let segments = split_segments(body);
        let mut optional_only = true;
        let mut source = String::with_capacity(template.len() * 2 + 2);
        let mut keys: Vec<ParamKey> = Vec::new();

        source.push('^');

        for (i, segment) in segments.iter().enumerate() {
            if let Some(name) = segment.strip_prefix('*') {
                check_name(name, segment, template)?;
                if i + 1 != segments.len() {
                    return Err(Error::CatchAllNotLast {
                        name: name.to_owned(),
                        template: template.to_owned(),
                    });
                }
                let key = new_key(&keys, name, false, true, template)?;
                source.push_str(&format!("/(?P<{}>.*)", key.group));
                keys.push(key);
                optional_only = false;
            } else if let Some(param) = segment.strip_prefix(':') {
                let (name, custom, modifier) = parse_param(param, segment, template)?;
                let unit = custom.map_or_else(|| "[^/]+".to_owned(), |re| format!("(?:{})", re));
                let key = new_key(
                    &keys,
                    name,
                    matches!(modifier, Modifier::Optional | Modifier::ZeroOrMore),
                    matches!(modifier, Modifier::OneOrMore | Modifier::ZeroOrMore),
                    template,
                )?;
                let group = &key.group;
                let fragment = match modifier {
                    Modifier::One => format!("/(?P<{}>{})", group, unit),
                    Modifier::Optional => format!("(?:/(?P<{}>{}))?", group, unit),
                    Modifier::OneOrMore => format!("/(?P<{}>{}(?:/{})*)", group, unit, unit),
                    Modifier::ZeroOrMore => {
                        format!("(?:/(?P<{}>{}(?:/{})*))?", group, unit, unit)
                    }
                };
                source.push_str(&fragment);
                optional_only &= matches!(modifier, Modifier::Optional | Modifier::ZeroOrMore);
                keys.push(key);
            } else {
                optional_only = false;
                source.push('/');
                source.push_str(&regex::escape(segment));
            }
        }

        // With every segment absent the path is the bare root.
        if optional_only {
            source.insert_str(1, "(?:/|");
            source.push(')');
        }

        source.push('$');

        let regex = Regex::new(&source).map_err(|source| Error::Regex {
            template: template.to_owned(),
            source,
        })?;

        Ok(Self {
            template: template.to_owned(),
            regex,
            keys,
        })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    /// Whether `path` has the template's shape.
    pub fn is_match(&self, path: &str) -> bool {
        !path.is_empty() && self.regex.is_match(path)
    }

    /// Captures the template's parameters from `path`.
    ///
    /// Returns empty `Params` if `path` does not match. Optional parameters
    /// absent from `path` are left out.
    pub fn extract(&self, path: &str) -> Params {
        let mut params = Params::default();

        if path.is_empty() {
            return params;
        }

        if let Some(captures) = self.regex.captures(path) {
            for key in &self.keys {
                if let Some(value) = captures.name(&key.group) {
                    params.push(key.name.as_str(), value.as_str());
                }
            }
        }

        params
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn check_name(name: &str, segment: &str, template: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::EmptyParamName {
            template: template.to_owned(),
        });
    }

    if !name.chars().all(is_name_char) {
        return Err(Error::InvalidSegment {
            segment: segment.to_owned(),
            template: template.to_owned(),
        });
    }

    Ok(())
}

fn new_key(
    keys: &[ParamKey],
    name: &str,
    optional: bool,
    repeat: bool,
    template: &str,
) -> Result<ParamKey> {
    if keys.iter().any(|key| key.name == name) {
        return Err(Error::DuplicateParam {
            name: name.to_owned(),
            template: template.to_owned(),
        });
    }

    Ok(ParamKey {
        name: name.to_owned(),
        optional,
        repeat,
        group: format!("p{}", keys.len()),
    })
}

// Splits a template body on '/', except inside the parentheses of a
// parameter's custom regex.
fn split_segments(body: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        let in_param = body[start..].starts_with(':');
        match c {
            _ if escaped => escaped = false,
            '\\' if in_param => escaped = true,
            '(' if in_param => depth += 1,
            ')' if in_param && depth > 0 => depth -= 1,
            '/' if depth == 0 => {
                segments.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    segments.push(&body[start..]);
    segments
}

// Splits `name(regex)modifier` into its parts.
fn parse_param<'a>(
    param: &'a str,
    segment: &str,
    template: &str,
) -> Result<(&'a str, Option<&'a str>, Modifier)> {
    let invalid = || Error::InvalidSegment {
        segment: segment.to_owned(),
        template: template.to_owned(),
    };

    let name_end = param.find(|c| !is_name_char(c)).unwrap_or(param.len());
    let name = &param[..name_end];
    check_name(name, segment, template)?;

    let mut rest = &param[name_end..];
    let mut custom = None;

    if rest.starts_with('(') {
        let mut depth = 0usize;
        let mut escaped = false;
        let mut close = None;

        for (i, c) in rest.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        let close = close.ok_or_else(invalid)?;
        let inner = &rest[1..close];
        if inner.is_empty() {
            return Err(invalid());
        }

        custom = Some(inner);
        rest = &rest[close + 1..];
    }

    let modifier = match rest {
        "" => Modifier::One,
        "?" => Modifier::Optional,
        "+" => Modifier::OneOrMore,
        "*" => Modifier::ZeroOrMore,
        _ => return Err(invalid()),
    };

    Ok((name, custom, modifier))
}
