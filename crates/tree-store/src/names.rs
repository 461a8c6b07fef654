//! Name checks for folders and notes.
//!
//! The store trusts the names it is given; front ends run
//! [`validate_name`] before calling a mutating operation.

use thiserror::Error;

use crate::scan::MARKDOWN_EXT;

/// Characters that can't appear in a folder or note name.
pub const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Name cannot be empty")]
    Empty,

    #[error("Name cannot contain '{0}'")]
    ForbiddenCharacter(char),

    #[error("'{0}' is a reserved name")]
    Reserved(String),

    #[error("'{0}' already exists")]
    AlreadyExists(String),
}

/// Check a user-entered name against its future siblings.
///
/// `siblings` are the names already in the target directory, as returned by
/// the listing operations. Compare note names with [`note_file_name`]
/// applied to both sides.
pub fn validate_name<S: AsRef<str>>(name: &str, siblings: &[S]) -> Result<(), NameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(NameError::ForbiddenCharacter(c));
    }
    if trimmed.starts_with('.') {
        return Err(NameError::Reserved(name.to_string()));
    }
    if siblings.iter().any(|s| s.as_ref() == name) {
        return Err(NameError::AlreadyExists(name.to_string()));
    }
    Ok(())
}

/// Append the markdown extension unless it's already there.
pub fn note_file_name(name: &str) -> String {
    if name.ends_with(MARKDOWN_EXT) {
        name.to_string()
    } else {
        format!("{}{}", name, MARKDOWN_EXT)
    }
}

/// Note name as shown to the user, without the extension.
pub fn display_name(file_name: &str) -> &str {
    file_name.strip_suffix(MARKDOWN_EXT).unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_accepts_plain_names() {
        assert_eq!(validate_name("Meeting notes", NONE), Ok(()));
        assert_eq!(validate_name("v1.2 plan", NONE), Ok(()));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(validate_name("", NONE), Err(NameError::Empty));
        assert_eq!(validate_name("   ", NONE), Err(NameError::Empty));
    }

    #[test]
    fn test_rejects_each_forbidden_char() {
        for c in FORBIDDEN_CHARS {
            let name = format!("a{}b", c);
            assert_eq!(
                validate_name(&name, NONE),
                Err(NameError::ForbiddenCharacter(*c)),
                "{name}"
            );
        }
    }

    #[test]
    fn test_rejects_dot_names() {
        assert!(matches!(validate_name("..", NONE), Err(NameError::Reserved(_))));
        assert!(matches!(validate_name(".order.json", NONE), Err(NameError::Reserved(_))));
    }

    #[test]
    fn test_rejects_sibling_collision() {
        let siblings = vec!["Work".to_string(), "Home".to_string()];
        assert_eq!(
            validate_name("Work", &siblings),
            Err(NameError::AlreadyExists("Work".into()))
        );
        assert_eq!(validate_name("work", &siblings), Ok(()));
    }

    #[test]
    fn test_note_file_name() {
        assert_eq!(note_file_name("todo"), "todo.md");
        assert_eq!(note_file_name("todo.md"), "todo.md");
        assert_eq!(display_name("todo.md"), "todo");
        assert_eq!(display_name("README"), "README");
    }
}
