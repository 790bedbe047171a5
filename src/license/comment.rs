/// Separator placed between a dependency and its license comment.
pub const COMMENT_MARKER: &str = "  # ";

/// Decide what to append to an already right-stripped `line` for `license`.
///
/// Returns an empty string when there is nothing to add: no license, or the
/// line already ends with it. Never touches the existing line content.
pub fn compose(line: &str, license: Option<&str>) -> String {
    let Some(license) = license else {
        return String::new();
    };

    if license.is_empty() || line.ends_with(license) {
        return String::new();
    }

    if license.starts_with(COMMENT_MARKER) {
        return license.to_string();
    }

    format!("{COMMENT_MARKER}{license}")
}
