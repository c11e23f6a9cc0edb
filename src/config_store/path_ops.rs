use crate::{
    error::LookupFailure,
    field::{Field, Section},
};

/// Resolves a dot-separated key against a section
///
/// Splits on the first `.`: the head must name a section and the remainder is
/// resolved inside it. A key without `.` is a direct lookup. Empty keys and
/// empty segments fail like any other missing key.
///
/// # Arguments
/// * `section` - The section to resolve from
/// * `key` - Dot-separated key (e.g., "servers.alpha.ip")
///
/// # Errors
/// * `LookupFailure::Missing` - If a segment has no field
/// * `LookupFailure::NotASection` - If a non-final segment is not a section
pub(super) fn resolve<'a>(section: &'a Section, key: &str) -> Result<&'a Field, LookupFailure> {
    let Some((head, rest)) = key.split_once('.') else {
        return section.get(key).ok_or_else(|| LookupFailure::Missing {
            segment: key.to_string(),
        });
    };

    let field = section.get(head).ok_or_else(|| LookupFailure::Missing {
        segment: head.to_string(),
    })?;

    let nested = field
        .as_section()
        .ok_or_else(|| LookupFailure::NotASection {
            segment: head.to_string(),
            kind: field.kind(),
        })?;

    resolve(nested, rest)
}

/// Checks whether a dot-separated key resolves, following the same traversal
/// as [`resolve`]
pub(super) fn contains_key(section: &Section, key: &str) -> bool {
    resolve(section, key).is_ok()
}

/// Follows a path of already-split keys down from the root
///
/// Returns `None` if any segment is missing or not a section.
pub(super) fn section_at<'a>(root: &'a Section, path: &[String]) -> Option<&'a Section> {
    path.iter()
        .try_fold(root, |section, key| section.get(key)?.as_section())
}

/// Mutable counterpart of [`section_at`]
pub(super) fn section_at_mut<'a>(
    root: &'a mut Section,
    path: &[String],
) -> Option<&'a mut Section> {
    path.iter()
        .try_fold(root, |section, key| section.get_mut(key)?.as_section_mut())
}
