//! Minimal XML element tree with pretty-printed output.

use std::fmt::{self, Display};

/// An XML element with ordered attributes and child elements.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: Option<String>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn attr(mut self, key: &str, value: impl Display) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn text(mut self, text: impl Display) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render as a standalone document with an XML declaration.
    pub fn to_document(&self) -> String {
        let mut out = String::from("<?xml version='1.0' encoding='utf-8'?>\n");
        self.write_indented(&mut out, 0);
        out
    }

    fn write_indented(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        out.push_str(&pad);
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attributes {
            out.push_str(&format!(" {}=\"{}\"", k, escape(v)));
        }

        match (&self.text, self.children.is_empty()) {
            (None, true) => out.push_str(" />\n"),
            (Some(text), true) => {
                out.push_str(&format!(">{}</{}>\n", escape(text), self.name));
            }
            (text, false) => {
                out.push_str(">\n");
                if let Some(text) = text {
                    out.push_str(&format!("{}  {}\n", pad, escape(text)));
                }
                for c in &self.children {
                    c.write_indented(out, depth + 1);
                }
                out.push_str(&format!("{}</{}>\n", pad, self.name));
            }
        }
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_indented(&mut out, 0);
        f.write_str(&out)
    }
}

/// Join numbers with single spaces, as the engine expects for parameter lists.
pub fn join_numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
