//! Prompt templates for the persona.
//!
//! Templates substitute `{{variable}}` placeholders. Placeholders without a
//! supplied value are left untouched.

/// Default system prompt for the assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are acting as {{name}}. You are answering questions on {{name}}'s website, \
particularly questions related to {{name}}'s career, background, skills and experience. \
Your responsibility is to represent {{name}} for interactions on the website as faithfully as possible. \
You are given a summary of {{name}}'s background and LinkedIn profile which you can use to answer questions. \
Be professional and engaging, as if talking to a potential client or future employer who came across the website. \
If you don't know the answer to any question, use your record_unknown_question tool to record the question that you couldn't answer, \
even if it's about something trivial or unrelated to career. \
If the user is engaging in discussion, try to steer them towards getting in touch via email; \
ask for their email and record it using your record_user_details tool.

## Summary:
{{summary}}

## LinkedIn Profile:
{{profile}}

With this context, please chat with the user, always staying in character as {{name}}.";

/// Default system prompt for the reply evaluator.
pub const DEFAULT_EVALUATOR_PROMPT: &str = "You are an evaluator that decides whether a response to a question is acceptable. \
You are provided with a conversation between a User and an Agent. \
Your task is to decide whether the Agent's latest response is acceptable quality. \
The Agent is playing the role of {{name}} and is representing {{name}} on their website. \
The Agent has been instructed to be professional and engaging, as if talking to a potential client or future employer who came across the website. \
The Agent has been provided with context on {{name}} in the form of their summary and LinkedIn details. Here's the information:

## Summary:
{{summary}}

## LinkedIn Profile:
{{profile}}

With this context, please evaluate the latest response, replying with whether the response is acceptable and your feedback.";

/// A prompt template with `{{variable}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    content: String,
}

impl PromptTemplate {
    /// Creates a template.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Renders the template, replacing each `{{name}}` with its value.
    ///
    /// Values are copied as is; placeholders inside a value are not expanded.
    #[must_use]
    pub fn render(&self, variables: &[(&str, &str)]) -> String {
        let mut rendered = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };

            let name = &after[..end];
            match variables.iter().find(|(candidate, _)| *candidate == name) {
                Some((_, value)) => rendered.push_str(value),
                None => rendered.push_str(&rest[start..start + end + 4]),
            }
            rest = &after[end + 2..];
        }

        rendered.push_str(rest);
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_occurrence() {
        let template = PromptTemplate::new("{{name}} says hi. Bye from {{name}}.");
        assert_eq!(
            template.render(&[("name", "Ada")]),
            "Ada says hi. Bye from Ada."
        );
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let template = PromptTemplate::new("{{name}} works at {{employer}}");
        assert_eq!(
            template.render(&[("name", "Ada")]),
            "Ada works at {{employer}}"
        );
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let template = PromptTemplate::new("{{name}}|{{summary}}|{{profile}}");
        let rendered = template.render(&[
            ("name", "Ada"),
            ("summary", "I write {{profile}} and {{name}} templates"),
            ("profile", "SECRET-PDF-TEXT"),
        ]);
        assert_eq!(
            rendered,
            "Ada|I write {{profile}} and {{name}} templates|SECRET-PDF-TEXT"
        );
    }

    #[test]
    fn unclosed_placeholder_is_kept() {
        let template = PromptTemplate::new("Hi {{name}}, see {{oops");
        assert_eq!(template.render(&[("name", "Ada")]), "Hi Ada, see {{oops");
    }

    #[test]
    fn default_system_prompt_mentions_both_tools() {
        let rendered = PromptTemplate::new(DEFAULT_SYSTEM_PROMPT).render(&[
            ("name", "Ada"),
            ("summary", "S"),
            ("profile", "P"),
        ]);
        assert!(rendered.starts_with("You are acting as Ada."));
        assert!(rendered.contains("record_unknown_question"));
        assert!(rendered.contains("record_user_details"));
        assert!(rendered.contains("## Summary:\nS"));
        assert!(rendered.contains("## LinkedIn Profile:\nP"));
        assert!(!rendered.contains("{{"));
    }
}
