//! Detail view builder for key-value display of a single record.

use console::{measure_text_width, pad_str, style, Alignment};

use super::colors::{label, section_header};

/// A builder for detail views (key-value display).
pub struct DetailView {
    title: String,
    sections: Vec<DetailSection>,
}

struct DetailSection {
    header: Option<String>,
    fields: Vec<(String, String)>,
    items: Vec<String>,
}

impl DetailView {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            sections: vec![DetailSection {
                header: None,
                fields: vec![],
                items: vec![],
            }],
        }
    }

    /// Add a key-value field to the current section.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        if let Some(section) = self.sections.last_mut() {
            section.fields.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Add a field only if the value is Some.
    #[must_use]
    pub fn field_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    /// Start a new named section.
    #[must_use]
    pub fn section(mut self, header: &str) -> Self {
        self.sections.push(DetailSection {
            header: Some(header.to_string()),
            fields: vec![],
            items: vec![],
        });
        self
    }

    /// Add a bullet-point item to the current section.
    #[must_use]
    pub fn item(mut self, text: impl std::fmt::Display) -> Self {
        if let Some(section) = self.sections.last_mut() {
            section.items.push(text.to_string());
        }
        self
    }

    pub fn render(&self) -> String {
        let mut lines = vec![style(&self.title).bold().to_string()];
        let key_width = self
            .sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .map(|(k, _)| k.len() + 1)
            .max()
            .unwrap_or(12);

        for section in &self.sections {
            if section.fields.is_empty() && section.items.is_empty() {
                continue;
            }
            if let Some(header) = &section.header {
                lines.push(section_header(header));
            }
            for (key, value) in &section.fields {
                let key = label(key);
                // Pad on visible width; the label carries escape codes.
                let padded = pad_str(&key, key_width.max(measure_text_width(&key)), Alignment::Left, None);
                lines.push(format!("  {padded}  {value}"));
            }
            for item in &section.items {
                lines.push(format!("  {} {}", style("\u{2022}").dim(), item));
            }
        }
        lines.join("\n")
    }
}
