use serde::Deserialize;
use serde::Serialize;

use crate::validation::DocumentShape;
use crate::validation::UnknownFragmentPolicy;

/// Knobs shared by every entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypegenOptions {
    /// Response names (aliases included) left out of the generated types.
    pub fields_to_exclude: Vec<String>,
    /// Column the printed type starts at. Nested lines are indented relative to it.
    pub indent: usize,
    /// Overrides the per-mode default. See [`DocumentShape::default_unknown_fragment_policy`].
    pub unknown_fragments: Option<UnknownFragmentPolicy>,
}

impl TypegenOptions {
    pub fn with_fields_to_exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields_to_exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_unknown_fragments(mut self, policy: UnknownFragmentPolicy) -> Self {
        self.unknown_fragments = Some(policy);
        self
    }

    pub(crate) fn unknown_fragment_policy(
        &self,
        shape: DocumentShape<'_>,
    ) -> UnknownFragmentPolicy {
        self.unknown_fragments
            .unwrap_or_else(|| shape.default_unknown_fragment_policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults_follow_document_shape() {
        let options = TypegenOptions::default();
        assert_eq!(
            options.unknown_fragment_policy(DocumentShape::SingleFragment),
            UnknownFragmentPolicy::Ignore
        );
        assert_eq!(
            options.unknown_fragment_policy(DocumentShape::MultiFragment { root: "N" }),
            UnknownFragmentPolicy::Reject
        );
        assert_eq!(
            options.unknown_fragment_policy(DocumentShape::Operation),
            UnknownFragmentPolicy::Reject
        );
    }

    #[test]
    fn explicit_policy_wins() {
        let options =
            TypegenOptions::default().with_unknown_fragments(UnknownFragmentPolicy::Reject);
        assert_eq!(
            options.unknown_fragment_policy(DocumentShape::SingleFragment),
            UnknownFragmentPolicy::Reject
        );
    }

    #[test]
    fn deserializes_partial_config() {
        let options: TypegenOptions = serde_json::from_str(
            r#"{ "fields_to_exclude": ["id"], "unknown_fragments": "ignore" }"#,
        )
        .unwrap();
        assert_eq!(
            options,
            TypegenOptions::default()
                .with_fields_to_exclude(["id"])
                .with_unknown_fragments(UnknownFragmentPolicy::Ignore)
        );
    }
}
