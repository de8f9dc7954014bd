//! Template Renderer - Token substitution for campaign step content
//!
//! Steps carry `{{token}}` placeholders resolved per recipient. Unknown
//! tokens are left untouched so a typo in a template is visible in the
//! delivered mail rather than silently swallowed.

use regex::{Captures, Regex};
use std::collections::HashMap;

/// Template renderer for personalizing step content
#[derive(Clone)]
pub struct TemplateRenderer {
    token_re: Regex,
    tag_re: Regex,
}

impl TemplateRenderer {
    /// Create a new template renderer
    pub fn new() -> Self {
        Self {
            token_re: Regex::new(r"\{\{(\w+)\}\}").expect("valid token regex"),
            tag_re: Regex::new(r"<[^>]*>").expect("valid tag regex"),
        }
    }

    /// Build the substitution map for a lead address
    ///
    /// With no CRM record to draw on, the name falls back to a cleaned-up
    /// mailbox prefix ("john.doe42" becomes "John"), or the friendly "there".
    pub fn lead_variables(&self, lead_email: &str) -> HashMap<String, String> {
        let (local, domain) = match lead_email.split_once('@') {
            Some((local, domain)) => (local, domain),
            None => (lead_email, ""),
        };

        let first_name = first_name_from_local(local);

        let mut vars = HashMap::new();
        vars.insert("name".to_string(), first_name.clone());
        vars.insert("firstname".to_string(), first_name);
        vars.insert("lastname".to_string(), String::new());
        vars.insert("email".to_string(), lead_email.to_string());
        vars.insert("domain".to_string(), domain.to_string());
        vars
    }

    /// Render a template against a substitution map
    ///
    /// Token lookup is case-insensitive; unknown tokens stay as written.
    pub fn render(&self, template: &str, vars: &HashMap<String, String>) -> String {
        self.token_re
            .replace_all(template, |caps: &Captures| {
                let key = caps[1].to_lowercase();
                match vars.get(&key) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Derive a plain-text body from an html one by stripping tags
    pub fn strip_tags(&self, html: &str) -> String {
        self.tag_re.replace_all(html, "").into_owned()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Make the mailbox prefix look like a first name, or fall back to "there"
fn first_name_from_local(local: &str) -> String {
    let cleaned: String = local
        .chars()
        .take_while(|c| !matches!(c, '.' | '_' | '-') && !c.is_ascii_digit())
        .collect();

    if cleaned.len() > 2 {
        let mut chars = cleaned.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
            None => "there".to_string(),
        }
    } else {
        "there".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_basic_tokens() {
        let renderer = TemplateRenderer::new();
        let vars = renderer.lead_variables("john.doe@example.com");

        let result = renderer.render("Hello {{firstname}}, we emailed {{email}}", &vars);
        assert_eq!(result, "Hello John, we emailed john.doe@example.com");
    }

    #[test]
    fn test_render_is_case_insensitive() {
        let renderer = TemplateRenderer::new();
        let vars = renderer.lead_variables("maria@example.com");

        assert_eq!(renderer.render("Hi {{FirstName}}", &vars), "Hi Maria");
    }

    #[test]
    fn test_render_leaves_unknown_tokens() {
        let renderer = TemplateRenderer::new();
        let vars = renderer.lead_variables("maria@example.com");

        assert_eq!(
            renderer.render("Your {{discount}} awaits", &vars),
            "Your {{discount}} awaits"
        );
    }

    #[test]
    fn test_short_prefix_falls_back_to_there() {
        let renderer = TemplateRenderer::new();
        let vars = renderer.lead_variables("jo@example.com");

        assert_eq!(renderer.render("Hello {{name}}", &vars), "Hello there");
    }

    #[test]
    fn test_numeric_prefix_falls_back_to_there() {
        let renderer = TemplateRenderer::new();
        let vars = renderer.lead_variables("12345@example.com");

        assert_eq!(vars["name"], "there");
    }

    #[test]
    fn test_domain_variable() {
        let renderer = TemplateRenderer::new();
        let vars = renderer.lead_variables("sales@bigcorp.example");

        assert_eq!(vars["domain"], "bigcorp.example");
    }

    #[test]
    fn test_strip_tags() {
        let renderer = TemplateRenderer::new();
        assert_eq!(
            renderer.strip_tags("<p>Hello <b>there</b></p>"),
            "Hello there"
        );
    }
}
