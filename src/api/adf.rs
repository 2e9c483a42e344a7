//! Atlassian Document Format (ADF) helpers.
//!
//! Jira v3 uses ADF for rich text such as descriptions, comments and worklog
//! comments. Documents are kept as open JSON; this module only renders them to
//! plain text and builds simple documents from text.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// An ADF document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlassianDoc {
    /// The node type, `doc` for root documents.
    #[serde(rename = "type")]
    pub doc_type: String,
    /// The document version (1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Top-level block nodes.
    #[serde(default)]
    pub content: Vec<Value>,
}

impl AtlassianDoc {
    /// Build a document with one paragraph per line of `text`.
    pub fn from_text(text: &str) -> Self {
        let content = text
            .lines()
            .map(|line| {
                if line.is_empty() {
                    json!({"type": "paragraph", "content": []})
                } else {
                    json!({"type": "paragraph", "content": [{"type": "text", "text": line}]})
                }
            })
            .collect();

        Self {
            content,
            ..Self::default()
        }
    }

    /// Interpret a field value that may be ADF or a legacy plain string.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::from_text(s)),
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }

    /// Convert to a JSON value for request bodies.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Render the document as plain text.
    ///
    /// Block nodes end with a newline, list items get a bullet, mentions are
    /// prefixed with `@`. Media and cards are dropped.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.content {
            render(node, &mut out);
        }
        out.trim().to_string()
    }
}

impl Default for AtlassianDoc {
    fn default() -> Self {
        Self {
            doc_type: "doc".to_string(),
            version: Some(1),
            content: vec![],
        }
    }
}

fn render_children(node: &Value, out: &mut String) {
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            render(child, out);
        }
    }
}

fn end_block(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn attr<'a>(node: &'a Value, name: &str) -> Option<&'a str> {
    node.get("attrs")?.get(name)?.as_str()
}

fn render(node: &Value, out: &mut String) {
    let node_type = node.get("type").and_then(Value::as_str).unwrap_or_default();

    match node_type {
        "text" => {
            if let Some(text) = node.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        "hardBreak" => out.push('\n'),
        "paragraph" | "heading" | "codeBlock" => {
            render_children(node, out);
            end_block(out);
        }
        "listItem" => {
            out.push_str("• ");
            render_children(node, out);
            end_block(out);
        }
        "blockquote" => {
            out.push_str("> ");
            render_children(node, out);
        }
        "mention" => {
            if let Some(text) = attr(node, "text") {
                if !text.starts_with('@') {
                    out.push('@');
                }
                out.push_str(text);
            }
        }
        "emoji" => {
            if let Some(short_name) = attr(node, "shortName") {
                out.push_str(short_name);
            }
        }
        "inlineCard" | "mediaGroup" | "mediaSingle" | "media" => {}
        _ => render_children(node, out),
    }
}
