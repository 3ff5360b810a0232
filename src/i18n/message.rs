//! The template stored in each translation slot.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::template::{DEFAULT_LEFT_DELIM, Template, TemplateError};

/// What rendering does with an execution failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderErrorPolicy {
    /// Return the error.
    Propagate,
    /// Render the error text in place of the message.
    #[default]
    InlineText,
}

/// Source text of one message form, parsed when it contains actions.
///
/// Text without `{{` is rendered verbatim. Serializes as its source text;
/// deserializing parses it again.
#[derive(Debug, Clone, Default)]
pub struct MessageTemplate {
    src: String,
    tmpl: Option<Arc<Template>>,
}

impl MessageTemplate {
    pub fn new(src: impl Into<String>) -> Result<Self, TemplateError> {
        Self::named("message", src)
    }

    /// Like [`MessageTemplate::new`], with `name` as the template name
    /// reported in parse and execution errors.
    pub fn named(name: &str, src: impl Into<String>) -> Result<Self, TemplateError> {
        let src = src.into();
        let tmpl = if src.contains(DEFAULT_LEFT_DELIM) {
            let mut tmpl = Template::new(name);
            tmpl.parse(&src)?;
            Some(Arc::new(tmpl))
        } else {
            None
        };
        Ok(Self { src, tmpl })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn source(&self) -> &str {
        &self.src
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    pub fn render<T: Serialize + ?Sized>(
        &self,
        data: &T,
        policy: RenderErrorPolicy,
    ) -> Result<String, TemplateError> {
        let Some(tmpl) = &self.tmpl else {
            return Ok(self.src.clone());
        };
        match tmpl.render(data) {
            Ok(out) => Ok(out),
            Err(err) if policy == RenderErrorPolicy::InlineText => Ok(err.to_string()),
            Err(err) => Err(err),
        }
    }

    /// Renders with [`RenderErrorPolicy::InlineText`].
    pub fn execute<T: Serialize + ?Sized>(&self, data: &T) -> String {
        self.render(data, RenderErrorPolicy::InlineText)
            .unwrap_or_else(|err| err.to_string())
    }
}

impl PartialEq for MessageTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.src)
    }
}

impl Serialize for MessageTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.src)
    }
}

impl<'de> Deserialize<'de> for MessageTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let src = String::deserialize(deserializer)?;
        MessageTemplate::new(src).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use serde_json::json;

    #[test]
    fn test_plain_text_is_not_parsed() {
        let t = MessageTemplate::new("Hello").unwrap();
        assert!(t.tmpl.is_none());
        assert_eq!(t.execute(&json!(null)), "Hello");
    }

    #[test]
    fn test_empty_template() {
        let t = MessageTemplate::empty();
        assert!(t.is_empty());
        assert_eq!(t.execute(&json!({"Count": 1})), "");
    }

    #[test]
    fn test_render_with_data() {
        let t = MessageTemplate::new("{{.Count}} items").unwrap();
        assert_eq!(t.execute(&json!({"Count": 3})), "3 items");
    }

    #[test]
    fn test_invalid_source_is_rejected() {
        assert!(MessageTemplate::new("{{.Count").is_err());
    }

    #[test]
    fn test_render_error_inline_text() {
        let t = MessageTemplate::new("{{.Count.Value}}").unwrap();
        assert_snapshot!(
            t.execute(&json!({"Count": 2})),
            @r#"template: message:1: executing "message": can't evaluate field Value in type number"#
        );
    }

    #[test]
    fn test_render_error_propagates() {
        let t = MessageTemplate::new("{{.Count.Value}}").unwrap();
        let err = t
            .render(&json!({"Count": 2}), RenderErrorPolicy::Propagate)
            .unwrap_err();
        assert!(matches!(err, TemplateError::Exec(_)));
    }

    #[test]
    fn test_source_round_trip() {
        let src = "{{if eq .Count 1}}one item{{else}}{{.Count}} items{{end}}";
        let t = MessageTemplate::new(src).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        let back: MessageTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.source(), src);
        assert_eq!(back.execute(&json!({"Count": 1})), "one item");
        assert_eq!(back.execute(&json!({"Count": 4})), "4 items");
    }

    #[test]
    fn test_deserialize_invalid_source_fails() {
        let result: Result<MessageTemplate, _> = serde_json::from_str("\"{{end}}\"");
        assert!(result.is_err());
    }
}
