use crate::error::ComputerError;

/// Uniform result of one dispatched action.
///
/// Every field is optional; a result counts as meaningful only when at least
/// one field holds a non-empty value. Results merge associatively: text
/// fields concatenate in order, and at most one side of a merge may carry an
/// image (a dispatched action yields at most one screenshot).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolResult {
    /// Stdout of the sandbox command(s).
    pub output: Option<String>,
    /// Stderr of the sandbox command(s), surfaced rather than raised.
    pub error: Option<String>,
    /// Base64-encoded PNG screenshot.
    pub image_base64: Option<String>,
    /// Out-of-band note for the agent runtime.
    pub system: Option<String>,
}

impl ToolResult {
    pub fn with_output(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Self::default()
        }
    }

    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// True when at least one field holds a non-empty value.
    pub fn has_content(&self) -> bool {
        [&self.output, &self.error, &self.image_base64, &self.system]
            .into_iter()
            .any(|f| f.as_deref().is_some_and(|s| !s.is_empty()))
    }

    /// Combine two results. Text fields concatenate; both sides carrying an
    /// image is an [`ComputerError::ImageConflict`].
    pub fn merge(self, other: Self) -> Result<Self, ComputerError> {
        let image_base64 = match (self.image_base64, other.image_base64) {
            (Some(_), Some(_)) => return Err(ComputerError::ImageConflict),
            (a, b) => a.or(b),
        };
        Ok(Self {
            output: concat(self.output, other.output),
            error: concat(self.error, other.error),
            image_base64,
            system: concat(self.system, other.system),
        })
    }
}

fn concat(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + &b),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_content() {
        assert!(!ToolResult::default().has_content());
    }

    #[test]
    fn empty_strings_are_not_content() {
        let r = ToolResult {
            output: Some(String::new()),
            error: Some(String::new()),
            ..ToolResult::default()
        };
        assert!(!r.has_content());
        assert!(ToolResult::with_output("x").has_content());
    }

    #[test]
    fn merge_concatenates_text() {
        let a = ToolResult {
            output: Some("ab".into()),
            error: Some("1".into()),
            ..ToolResult::default()
        };
        let b = ToolResult {
            output: Some("cd".into()),
            error: None,
            ..ToolResult::default()
        };
        let merged = a.merge(b).unwrap();
        assert_eq!(merged.output.as_deref(), Some("abcd"));
        assert_eq!(merged.error.as_deref(), Some("1"));
    }

    #[test]
    fn merge_keeps_single_image() {
        let a = ToolResult {
            image_base64: Some("aGk=".into()),
            ..ToolResult::default()
        };
        let b = ToolResult::with_output("done");

        let left = a.clone().merge(b.clone()).unwrap();
        assert_eq!(left.image_base64.as_deref(), Some("aGk="));

        let right = b.merge(a).unwrap();
        assert_eq!(right.image_base64.as_deref(), Some("aGk="));
    }

    #[test]
    fn merge_rejects_two_images() {
        let a = ToolResult {
            image_base64: Some("aa".into()),
            ..ToolResult::default()
        };
        let b = ToolResult {
            image_base64: Some("bb".into()),
            ..ToolResult::default()
        };
        assert!(matches!(a.merge(b), Err(ComputerError::ImageConflict)));
    }

    #[test]
    fn merge_is_associative_on_text() {
        let r = |s: &str| ToolResult::with_output(s);
        let left = r("a").merge(r("b")).unwrap().merge(r("c")).unwrap();
        let right = r("a").merge(r("b").merge(r("c")).unwrap()).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.output.as_deref(), Some("abc"));
    }
}
