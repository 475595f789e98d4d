//! Compiles slide markup into a complete HTML page.
//!
//! A markup file holds a `<ppt>` block of slide content plus optional `<style>` and `<script>`
//! blocks. Inside the `<ppt>` block the `ppt-*` tags are rewritten to plain HTML carrying the
//! role attributes the extraction pipeline understands.

use indexmap::IndexMap;
use log::debug;
use regex::{Captures, Regex};

use crate::errors::Result;
use crate::models::dom::{RENDER_ATTR, SLIDE_CLASS};

/// How one custom tag is rewritten: the HTML tag and the attribute it always carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMapping {
    pub source: &'static str,
    pub target: &'static str,
    pub attribute: (&'static str, &'static str),
}

pub const TAG_MAPPINGS: &[TagMapping] = &[
    TagMapping {
        source: "ppt-page",
        target: "section",
        attribute: ("class", SLIDE_CLASS),
    },
    TagMapping {
        source: "ppt-text",
        target: "div",
        attribute: (RENDER_ATTR, "text"),
    },
    TagMapping {
        source: "ppt-shape",
        target: "div",
        attribute: (RENDER_ATTR, "shape"),
    },
    TagMapping {
        source: "ppt-image",
        target: "div",
        attribute: (RENDER_ATTR, "image"),
    },
    TagMapping {
        source: "ppt-table",
        target: "table",
        attribute: (RENDER_ATTR, "table"),
    },
];

/// The three blocks of a markup file. Missing blocks are empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkupBlocks<'a> {
    pub content: &'a str,
    pub style: &'a str,
    pub script: &'a str,
}

/// Returns the text between the first `<name>` and the first `</name>` after it.
fn block<'a>(input: &'a str, name: &str) -> &'a str {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    input
        .find(&open)
        .map(|start| start + open.len())
        .and_then(|start| {
            input[start..]
                .find(&close)
                .map(|end| &input[start..start + end])
        })
        .unwrap_or("")
}

pub fn extract_blocks(input: &str) -> MarkupBlocks<'_> {
    MarkupBlocks {
        content: block(input, "ppt"),
        style: block(input, "style"),
        script: block(input, "script"),
    }
}

/// `<ppt-name attrs>`: group 1 is the tag name, group 2 the raw attribute text.
const CUSTOM_TAG_PATTERN: &str = r"<(ppt-[\w-]+)([^>]*)>";
/// `name="value"` or `name='value'`. Names may contain `-` so `data-*` attributes survive.
const ATTRIBUTE_PATTERN: &str = r#"([\w-]+)=["']([^"']*)["']"#;

/// Reads the quoted `name=value` pairs of a tag, skipping boolean and unquoted attributes.
/// Later duplicates overwrite earlier ones.
fn parse_attributes(attribute_re: &Regex, raw: &str) -> IndexMap<String, String> {
    attribute_re
        .captures_iter(raw)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

fn render_open_tag(mapping: &TagMapping, mut attributes: IndexMap<String, String>) -> String {
    let (name, value) = mapping.attribute;
    match attributes.get_mut(name) {
        Some(existing) if name == "class" => {
            existing.push(' ');
            existing.push_str(value);
        }
        Some(_) => {}
        None => {
            attributes.insert(name.to_string(), value.to_string());
        }
    }
    let rendered: Vec<String> = attributes
        .iter()
        .map(|(name, value)| format!("{}=\"{}\"", name, value))
        .collect();
    format!("<{} {}>", mapping.target, rendered.join(" "))
}

/// Rewrites `ppt-*` tags to HTML. Unknown `ppt-*` tags are left untouched; user attributes
/// are kept, and a user `class` is merged with the mapped one.
pub fn transform_tags(content: &str) -> Result<String> {
    let tag_re = Regex::new(CUSTOM_TAG_PATTERN)?;
    let attribute_re = Regex::new(ATTRIBUTE_PATTERN)?;

    let opened = tag_re.replace_all(content, |caps: &Captures| {
        match TAG_MAPPINGS.iter().find(|m| m.source == &caps[1]) {
            Some(mapping) => render_open_tag(mapping, parse_attributes(&attribute_re, &caps[2])),
            None => caps[0].to_string(),
        }
    });

    Ok(TAG_MAPPINGS.iter().fold(opened.into_owned(), |html, mapping| {
        html.replace(
            &format!("</{}>", mapping.source),
            &format!("</{}>", mapping.target),
        )
    }))
}

/// Compiles a markup file into a standalone HTML page with 1280x720 slides.
///
/// # Arguments
/// * `input` - The markup source.
///
/// # Returns
/// The complete HTML document.
pub fn compile(input: &str) -> Result<String> {
    let blocks = extract_blocks(input);
    let body = transform_tags(blocks.content)?;
    debug!(
        "Compiled markup: {} bytes of content, {} bytes of style, {} bytes of script",
        blocks.content.len(),
        blocks.style.len(),
        blocks.script.len()
    );

    Ok(format!(
        r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>WebPPT Render</title>
    <style>
        body {{ margin: 0; padding: 0; background: #f0f0f0; }}
        .slide {{
            width: 1280px;
            height: 720px;
            background: white;
            position: relative;
            overflow: hidden;
            margin-bottom: 20px;
            box-shadow: 0 0 10px rgba(0,0,0,0.1);
        }}
        {style}
    </style>
</head>
<body>
    {body}
    <script>
        {script}
    </script>
</body>
</html>
"#,
        style = blocks.style,
        body = body,
        script = blocks.script,
    ))
}
