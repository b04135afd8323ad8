//! Tag vocabulary shared by the loading engine and the object field.

/// Prefix of the tags that tag handlers are matched against.
pub(crate) const TAG_SIGIL: &str = "!";

/// Default name of the type override tag (`!type:module.Type`).
pub(crate) const DEFAULT_TYPE_TAG: &str = "type";

/// Render a parser tag as written in the document (`!import`, `!!str`).
pub(crate) fn render_tag(handle: &str, suffix: &str) -> String {
    match handle {
        "tag:yaml.org,2002:" => format!("!!{suffix}"),
        _ => format!("{handle}{suffix}"),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TypeTagError {
    /// Not exactly one `:` separator.
    Separator,
    /// The type name has fewer than two dotted segments, or an empty one.
    Unqualified,
}

/// Extract the type name of a `!type:module.Type` tag.
///
/// `None` if the tag isn't a type tag at all.
pub(crate) fn parse_type_tag<'t>(
    tag: &'t str,
    type_tag: &str,
) -> Option<Result<&'t str, TypeTagError>> {
    let body = tag.strip_prefix(TAG_SIGIL)?;
    let mut parts = body.split(':');
    if parts.next() != Some(type_tag) {
        return None;
    }
    let (Some(name), None) = (parts.next(), parts.next()) else {
        return Some(Err(TypeTagError::Separator));
    };
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 2 || segments.iter().any(|segment| segment.is_empty()) {
        return Some(Err(TypeTagError::Unqualified));
    }
    Some(Ok(name))
}
