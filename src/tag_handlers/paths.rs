//! File inclusion handlers: `!import`, `!try-import` and `!glob`.
//!
//! Both resolve relative paths against the directory of the file being loaded
//! (when `allow_relative` is set) and then against each configured root, in order.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::context::{LoadResult, LoadingContext};
use crate::error::{Error, ErrorCode};
use crate::fields::Field;
use crate::node::{Node, NodeValue};
use crate::tag_handlers::TagHandler;

/// Search directories shared by [`ImportHandler`] and [`GlobHandler`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    pub roots: Vec<PathBuf>,
    /// Look next to the file being loaded before looking in `roots`.
    pub allow_relative: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            allow_relative: true,
        }
    }
}

impl PathConfig {
    pub fn with_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn allow_relative(mut self, allow: bool) -> Self {
        self.allow_relative = allow;
        self
    }

    /// Directories to search, in priority order.
    fn search_dirs(&self, location: Option<&Path>) -> Vec<PathBuf> {
        let relative = location
            .filter(|_| self.allow_relative)
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        relative.into_iter().chain(self.roots.iter().cloned()).collect()
    }
}

/// Read and compose one file, reporting failures as value errors on the current node.
fn compose_file(ctx: &mut LoadingContext<'_>, path: &Path) -> Result<Option<Rc<Node>>, Error> {
    let name = path.display().to_string();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            ctx.error(ErrorCode::ValueError, format!("Unable to read {name}: {err}."))?;
            return Ok(None);
        }
    };
    match ctx.compose(&text, &name) {
        Ok(node) => Ok(Some(node)),
        Err(err) => {
            ctx.error(ErrorCode::ValueError, format!("Unable to parse {name}: {err}"))?;
            Ok(None)
        }
    }
}

fn scalar_argument(ctx: &mut LoadingContext<'_>) -> Result<Option<(String, Rc<Node>)>, Error> {
    if !ctx.expect_scalar()? {
        return Ok(None);
    }
    Ok(ctx.current_node().cloned().and_then(|node| {
        let text = node.as_scalar()?.to_owned();
        Some((text, node))
    }))
}

/// `!import PATH` loads another YAML file in place of the node.
///
/// `!try-import PATH` does the same but loads nothing, without error, when the
/// file can't be found.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImportHandler;

impl TagHandler for ImportHandler {
    fn matches(&self, tag: &str) -> bool {
        matches!(tag, "import" | "try-import")
    }

    fn load(&self, ctx: &mut LoadingContext<'_>, field: &dyn Field) -> LoadResult {
        let Some((target, node)) = scalar_argument(ctx)? else {
            return Ok(None);
        };
        let optional = node.tag().ends_with("try-import");

        let target = PathBuf::from(target);
        let candidates = if target.is_absolute() {
            vec![target.clone()]
        } else {
            let config = ctx.get_config::<PathConfig>();
            config
                .search_dirs(ctx.current_location())
                .into_iter()
                .map(|dir| dir.join(&target))
                .collect()
        };

        let Some(path) = candidates.into_iter().find(|path| path.is_file()) else {
            if optional {
                debug!("optional import {} not found", target.display());
                return Ok(None);
            }
            ctx.error(
                ErrorCode::ImportNotFound,
                format!(
                    "Unable to find {} in any of the configured directories.",
                    target.display()
                ),
            )?;
            return Ok(None);
        };

        debug!("importing {}", path.display());
        let Some(root) = compose_file(ctx, &path)? else {
            return Ok(None);
        };
        ctx.load(field, root, Some(path))
    }
}

/// `!glob PATTERN` loads every file matching the pattern as a list.
///
/// `*` and `?` don't cross directory separators, `**/` matches any number of
/// directories. Matching directories are skipped. Files that fail to parse are
/// reported and left out of the list.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobHandler;

impl TagHandler for GlobHandler {
    fn matches(&self, tag: &str) -> bool {
        tag == "glob"
    }

    fn load(&self, ctx: &mut LoadingContext<'_>, field: &dyn Field) -> LoadResult {
        let Some((pattern, node)) = scalar_argument(ctx)? else {
            return Ok(None);
        };

        let (prefix, rest) = split_pattern(&pattern);
        let bases = if prefix.is_absolute() {
            vec![prefix]
        } else {
            let config = ctx.get_config::<PathConfig>();
            config
                .search_dirs(ctx.current_location())
                .into_iter()
                .map(|dir| dir.join(&prefix))
                .collect()
        };

        let matcher = match glob_regex(&rest) {
            Ok(matcher) => matcher,
            Err(err) => {
                ctx.error(ErrorCode::ValueError, format!("Invalid glob pattern {pattern}: {err}."))?;
                return Ok(None);
            }
        };

        let mut files = Vec::new();
        for base in bases {
            files.extend(matching_files(&base, &matcher));
        }
        debug!("glob {pattern} matched {} file(s)", files.len());

        let mut items = Vec::with_capacity(files.len());
        for path in files {
            if let Some(root) = compose_file(ctx, &path)? {
                items.push(root);
            }
        }

        let list = Node::new("", NodeValue::Sequence(items), node.mark().clone());
        ctx.load(field, Rc::new(list), None)
    }
}

/// Split a pattern into its leading wildcard-free directories and the remainder.
fn split_pattern(pattern: &str) -> (PathBuf, String) {
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components
        .iter()
        .take(components.len().saturating_sub(1))
        .take_while(|part| !part.contains(['*', '?', '[']))
        .count();

    let mut prefix = components[..literal].join("/");
    if prefix.is_empty() && pattern.starts_with('/') {
        prefix.push('/');
    }
    (PathBuf::from(prefix), components[literal..].join("/"))
}

fn glob_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::from("^");
    let mut rest = pattern;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("**/") {
            out.push_str("(?:.*/)?");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("**") {
            out.push_str(".*");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('*') {
            out.push_str("[^/]*");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('?') {
            out.push_str("[^/]");
            rest = tail;
        } else if let Some((class, tail)) = rest.strip_prefix('[').and_then(glob_class) {
            out.push_str(&class);
            rest = tail;
        } else {
            // An unclosed `[` is taken literally.
            let first = rest.chars().next().map_or(0, char::len_utf8);
            let end = rest[first..]
                .find(['*', '?', '['])
                .map_or(rest.len(), |i| first + i);
            out.push_str(&regex::escape(&rest[..end]));
            rest = &rest[end..];
        }
    }
    out.push('$');
    Regex::new(&out)
}

/// Translate the body of a `[...]` or `[!...]` class (opening bracket already
/// consumed). Returns the regex class and the text after `]`.
fn glob_class(body: &str) -> Option<(String, &str)> {
    let (negated, inner) = match body.strip_prefix('!') {
        Some(inner) => (true, inner),
        None => (false, body),
    };
    // A `]` right after the opening is a member.
    let skip = usize::from(inner.starts_with(']'));
    let close = skip + inner[skip..].find(']')?;
    let members: Vec<char> = inner[..close].chars().collect();

    let mut class = String::from(if negated { "[^/" } else { "[" });
    for (i, c) in members.iter().enumerate() {
        if *c == '-' && i > 0 && i + 1 < members.len() {
            class.push('-');
        } else {
            class.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
        }
    }
    class.push(']');
    Some((class, &inner[close + 1..]))
}

/// Regular files under `base` whose `/`-separated relative path matches, sorted.
fn matching_files(base: &Path, matcher: &Regex) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(base)
        .min_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .strip_prefix(base)
                .ok()
                .and_then(|relative| {
                    let parts: Option<Vec<&str>> =
                        relative.components().map(|c| c.as_os_str().to_str()).collect();
                    parts.map(|parts| parts.join("/"))
                })
                .is_some_and(|relative| matcher.is_match(&relative))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}
