//! Quick-prompt templates.
//!
//! A template is a canned prefix that is put in front of the next message
//! the user submits.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

/// A named quick-prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Template {
    /// Short name used to select the template.
    pub name: &'static str,
    /// Label shown in listings.
    pub title: &'static str,
    /// The prefix put in front of the next submission.
    pub prompt: &'static str,
}

/// All templates, in display order.
pub const TEMPLATES: &[Template] = &[
    Template {
        name: "review",
        title: "🔍 Code review",
        prompt: "Review this code and point out bugs, risky constructs and \
                 style problems:",
    },
    Template {
        name: "explain",
        title: "📖 Explain",
        prompt: "Explain step by step what this code does:",
    },
    Template {
        name: "optimize",
        title: "⚡ Optimize",
        prompt: "Suggest how to make this code faster or simpler:",
    },
    Template {
        name: "document",
        title: "📝 Document",
        prompt: "Write documentation comments for this code:",
    },
    Template {
        name: "test",
        title: "🧪 Tests",
        prompt: "Write unit tests covering this code:",
    },
];

/// Looks up a template by name, ignoring ASCII case.
pub fn find(name: &str) -> Result<&'static Template, UnknownTemplate> {
    let name = name.trim();
    TEMPLATES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| UnknownTemplate(name.to_owned()))
}

/// No template has the requested name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownTemplate(pub String);

impl Display for UnknownTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown template `{}`", self.0)
    }
}

impl StdError for UnknownTemplate {}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalogue() {
        let names: Vec<_> = TEMPLATES.iter().map(|t| t.name).collect();
        assert_eq!(names, ["review", "explain", "optimize", "document", "test"]);

        let unique: HashSet<_> = TEMPLATES.iter().map(|t| t.prompt).collect();
        assert_eq!(unique.len(), TEMPLATES.len());
        assert!(TEMPLATES.iter().all(|t| !t.prompt.ends_with(' ')));
    }

    #[test]
    fn test_find() {
        assert_eq!(find("explain").unwrap().name, "explain");
        assert_eq!(find(" Review ").unwrap().name, "review");
        assert_eq!(
            find("refactor").unwrap_err(),
            UnknownTemplate("refactor".to_owned())
        );
        assert_eq!(
            find("refactor").unwrap_err().to_string(),
            "unknown template `refactor`"
        );
    }
}
