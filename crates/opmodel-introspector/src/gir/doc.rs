//! Doc comment helpers for the static path.
//!
//! Optional arguments of varargs functions are only declared in prose:
//!
//! ```text
//! Optional arguments:
//!
//! * @Q: %gint, quality factor
//! * @keep: #VipsForeignKeep, which metadata to retain
//! ```

use regex::Regex;
use std::sync::LazyLock;

static OPTIONAL_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\*\s*@([A-Za-z_][\w-]*)\s*:\s*(?:([%#])([A-Za-z_]\w*)\s*,?)?\s*(.*)$")
        .expect("valid regex")
});

/// One optional argument declared in a doc comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocArgument {
    pub name: String,
    /// Type hint without its `%` or `#` marker
    pub type_hint: Option<String>,
    /// `true` for `#Type` references, which name a declared type
    pub type_reference: bool,
    pub description: String,
}

/// First meaningful line of a doc comment.
pub fn summary(doc: &str) -> &str {
    doc.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("Optional arguments"))
        .unwrap_or("")
}

/// Parses the bullets of the "Optional arguments:" section.
pub fn optional_arguments(doc: &str) -> Vec<DocArgument> {
    let mut in_section = false;
    let mut seen_bullet = false;
    let mut arguments = Vec::new();

    for line in doc.lines() {
        let trimmed = line.trim();
        if !in_section {
            in_section = trimmed.starts_with("Optional arguments");
            continue;
        }
        if trimmed.is_empty() {
            if seen_bullet {
                break;
            }
            continue;
        }
        let Some(captures) = OPTIONAL_BULLET.captures(line) else {
            if seen_bullet {
                break;
            }
            continue;
        };
        seen_bullet = true;
        arguments.push(DocArgument {
            name: captures[1].replace('-', "_"),
            type_hint: captures.get(3).map(|m| m.as_str().to_string()),
            type_reference: captures.get(2).is_some_and(|m| m.as_str() == "#"),
            description: captures
                .get(4)
                .map_or_else(String::new, |m| m.as_str().trim().to_string()),
        });
    }

    arguments
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEGSAVE: &str = "Write an image to a file in JPEG format.

Optional arguments:

* @Q: %gint, quality factor
* @keep: #VipsForeignKeep, which metadata to retain
* @optimize-coding: %gboolean, compute optimal Huffman tables

See also: vips_jpegsave_buffer().";

    #[test]
    fn test_summary_skips_blank_lines() {
        assert_eq!(summary("\n\n  Invert an image.\nMore text"), "Invert an image.");
        assert_eq!(summary(""), "");
    }

    #[test]
    fn test_optional_bullets() {
        let args = optional_arguments(JPEGSAVE);
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].name, "Q");
        assert_eq!(args[0].type_hint.as_deref(), Some("gint"));
        assert!(!args[0].type_reference);
        assert_eq!(args[0].description, "quality factor");

        assert_eq!(args[1].type_hint.as_deref(), Some("VipsForeignKeep"));
        assert!(args[1].type_reference);
        assert_eq!(args[2].name, "optimize_coding");
    }

    #[test]
    fn test_no_section() {
        assert!(optional_arguments("Invert an image.\n\n* @x: %gint, not optional").is_empty());
    }

    #[test]
    fn test_bullet_without_type_hint() {
        let args = optional_arguments("Optional arguments:\n* @page: first page to load");
        assert_eq!(args[0].type_hint, None);
        assert_eq!(args[0].description, "first page to load");
    }
}
