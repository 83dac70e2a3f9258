//! Proposal template rendering.
//!
//! Pure string substitution: each `{{key}}` occurrence in subject and body
//! is replaced with the context value for `key`. Unresolved placeholders are
//! left verbatim; this leniency is an explicit contract, not an accident,
//! so a template referencing a context key the caller does not provide
//! renders instead of failing.

use std::collections::HashMap;

use crate::models::ProposalTemplate;

/// Subject used when rendering produces an empty subject line.
pub const FALLBACK_SUBJECT: &str = "(sin asunto)";

/// Context mapping of placeholder names to replacement values.
pub type TemplateContext = HashMap<String, String>;

/// A rendered subject/body pair, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Replace every `{{key}}` occurrence in `input` with the context value.
pub fn render_str(input: &str, context: &TemplateContext) -> String {
    let mut out = input.to_string();
    for (key, value) in context {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}

/// Render a template's subject and body against a context. An empty
/// rendered subject falls back to [`FALLBACK_SUBJECT`].
pub fn render(template: &ProposalTemplate, context: &TemplateContext) -> RenderedMessage {
    let subject = render_str(&template.subject, context);
    let subject = if subject.trim().is_empty() {
        FALLBACK_SUBJECT.to_string()
    } else {
        subject
    };
    RenderedMessage {
        subject,
        body: render_str(&template.body, context),
    }
}

/// Format a similarity score as a percentage with one decimal, the way it
/// appears in notification bodies (0.85 → "85.0").
pub fn score_percent(score: f32) -> String {
    format!("{:.1}", score * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProposalLabel;
    use chrono::Utc;
    use uuid::Uuid;

    fn template(subject: &str, body: &str) -> ProposalTemplate {
        ProposalTemplate {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            kind: ProposalLabel::Automatic,
            subject: subject.to_string(),
            body: body.to_string(),
            is_default: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn context(pairs: &[(&str, &str)]) -> TemplateContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_replaces_placeholders() {
        let tpl = template("Hola {{applicant_name}}", "Oferta: {{job_title}}");
        let ctx = context(&[("applicant_name", "Ana"), ("job_title", "Dev backend")]);
        let rendered = render(&tpl, &ctx);
        assert_eq!(rendered.subject, "Hola Ana");
        assert_eq!(rendered.body, "Oferta: Dev backend");
    }

    #[test]
    fn test_render_unresolved_placeholder_left_verbatim() {
        let tpl = template("Hola {{applicant_name}}", "Score: {{score}}");
        let ctx = context(&[("applicant_name", "Ana")]);
        let rendered = render(&tpl, &ctx);
        assert_eq!(rendered.subject, "Hola Ana");
        assert_eq!(rendered.body, "Score: {{score}}");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let tpl = template("{{name}}", "{{name}} y {{name}}");
        let ctx = context(&[("name", "Ana")]);
        let rendered = render(&tpl, &ctx);
        assert_eq!(rendered.body, "Ana y Ana");
    }

    #[test]
    fn test_render_empty_subject_falls_back() {
        let tpl = template("", "cuerpo");
        let rendered = render(&tpl, &TemplateContext::new());
        assert_eq!(rendered.subject, FALLBACK_SUBJECT);
        assert_eq!(rendered.body, "cuerpo");
    }

    #[test]
    fn test_render_whitespace_subject_falls_back() {
        let tpl = template("   ", "cuerpo");
        let rendered = render(&tpl, &TemplateContext::new());
        assert_eq!(rendered.subject, FALLBACK_SUBJECT);
    }

    #[test]
    fn test_render_subject_that_resolves_to_empty() {
        let tpl = template("{{subject}}", "cuerpo");
        let ctx = context(&[("subject", "")]);
        let rendered = render(&tpl, &ctx);
        assert_eq!(rendered.subject, FALLBACK_SUBJECT);
    }

    #[test]
    fn test_render_no_placeholders_is_identity() {
        let tpl = template("Asunto fijo", "Cuerpo fijo");
        let ctx = context(&[("ignored", "x")]);
        let rendered = render(&tpl, &ctx);
        assert_eq!(rendered.subject, "Asunto fijo");
        assert_eq!(rendered.body, "Cuerpo fijo");
    }

    #[test]
    fn test_score_percent_one_decimal() {
        assert_eq!(score_percent(0.85), "85.0");
        assert_eq!(score_percent(0.8123), "81.2");
        assert_eq!(score_percent(1.0), "100.0");
        assert_eq!(score_percent(0.0), "0.0");
    }
}
