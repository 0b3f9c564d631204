//! HTML to Markdown conversion
//!
//! This module converts course HTML (page bodies, assignment descriptions)
//! into Markdown:
//! - ATX headings, emphasis, links, lists, code blocks and pipe tables
//! - `<script>` and `<style>` content dropped
//! - `<img>` tags kept as HTML with responsive styling, optionally pointing
//!   at a local copy produced by an [`AssetSink`]

use crate::render::{AssetSink, RenderError, RenderResult};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;

/// Converts an HTML fragment into Markdown
#[async_trait]
pub trait ContentRenderer: Send + Sync {
    /// Renders `html`, materializing embedded images through `assets` if given
    async fn render(&self, html: &str, assets: Option<&dyn AssetSink>) -> RenderResult<String>;
}

/// Default [`ContentRenderer`] built on `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

#[async_trait]
impl ContentRenderer for MarkdownRenderer {
    async fn render(&self, html: &str, assets: Option<&dyn AssetSink>) -> RenderResult<String> {
        if html.trim().is_empty() {
            return Ok(String::new());
        }

        // The parsed document is not Send, so sources are collected up front
        // and the document is parsed again after every download finished.
        let mut images = HashMap::new();
        if let Some(sink) = assets {
            for src in image_sources(html)? {
                let local = sink.materialize(&src).await;
                images.insert(src, local);
            }
        }

        Ok(html_to_markdown(html, &images))
    }
}

/// Lists the distinct `src` values of every `<img>` in document order
pub fn image_sources(html: &str) -> RenderResult<Vec<String>> {
    let fragment = Html::parse_fragment(html);
    let selector =
        Selector::parse("img[src]").map_err(|e| RenderError::Selector(format!("{:?}", e)))?;

    let mut sources: Vec<String> = Vec::new();
    for element in fragment.select(&selector) {
        if let Some(src) = element.value().attr("src") {
            let src = src.trim();
            if !src.is_empty() && !sources.iter().any(|s| s == src) {
                sources.push(src.to_string());
            }
        }
    }

    Ok(sources)
}

/// Converts HTML into Markdown, replacing image sources found in `images`
///
/// # Example
///
/// ```
/// use canvas_export::render::html_to_markdown;
/// use std::collections::HashMap;
///
/// let md = html_to_markdown("<h2>Week 1</h2><p>Read <b>chapter 3</b></p>", &HashMap::new());
/// assert_eq!(md, "## Week 1\n\nRead **chapter 3**");
/// ```
pub fn html_to_markdown(html: &str, images: &HashMap<String, String>) -> String {
    let fragment = Html::parse_fragment(html);

    let mut writer = MarkdownWriter {
        out: String::new(),
        images,
        lists: Vec::new(),
    };
    writer.children(fragment.root_element());

    tidy(&writer.out)
}

struct ListState {
    ordered: bool,
    next: usize,
}

struct MarkdownWriter<'a> {
    out: String,
    images: &'a HashMap<String, String>,
    lists: Vec<ListState>,
}

impl MarkdownWriter<'_> {
    fn children(&mut self, element: ElementRef) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef) {
        let name = element.value().name();

        match name {
            "script" | "style" | "head" | "title" | "noscript" | "template" => {}

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let text = self.capture(element);
                self.block_break();
                self.out.push_str(&"#".repeat(level));
                self.out.push(' ');
                self.out.push_str(&single_line(&text));
                self.block_break();
            }

            "p" | "div" | "section" | "article" | "header" | "footer" | "main" | "figure"
            | "figcaption" | "dl" | "dt" | "dd" => {
                self.block_break();
                self.children(element);
                self.block_break();
            }

            "blockquote" => {
                let inner = tidy(&self.capture(element));
                self.block_break();
                let quoted: Vec<String> = inner
                    .lines()
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {}", line)
                        }
                    })
                    .collect();
                self.out.push_str(&quoted.join("\n"));
                self.block_break();
            }

            "br" => {
                self.trim_trailing_spaces();
                self.out.push_str("  \n");
            }

            "hr" => {
                self.block_break();
                self.out.push_str("---");
                self.block_break();
            }

            "strong" | "b" => self.wrap_inline(element, "**"),
            "em" | "i" => self.wrap_inline(element, "*"),
            "del" | "s" | "strike" => self.wrap_inline(element, "~~"),

            "code" | "kbd" | "samp" => {
                let code: String = element.text().collect();
                if !code.is_empty() {
                    self.out.push('`');
                    self.out.push_str(&code);
                    self.out.push('`');
                }
            }

            "pre" => {
                let code: String = element.text().collect();
                self.block_break();
                self.out.push_str("```\n");
                self.out.push_str(code.trim_end_matches('\n'));
                self.out.push_str("\n```");
                self.block_break();
            }

            "a" => self.link(element),

            "ul" | "ol" => {
                self.block_break();
                self.lists.push(ListState {
                    ordered: name == "ol",
                    next: element
                        .value()
                        .attr("start")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(1),
                });
                self.children(element);
                self.lists.pop();
                self.block_break();
            }

            "li" => self.list_item(element),

            "table" => self.table(element),

            "img" => {
                let tag = self.image_tag(element);
                self.out.push_str(&tag);
            }

            _ => self.children(element),
        }
    }

    fn text(&mut self, text: &str) {
        let collapsed = collapse_whitespace(text);
        if collapsed.is_empty() {
            return;
        }

        let at_line_start = self.out.is_empty() || self.out.ends_with('\n');
        if at_line_start || self.out.ends_with(' ') {
            self.out.push_str(collapsed.trim_start());
        } else {
            self.out.push_str(&collapsed);
        }
    }

    /// Renders the children of `element` into a separate buffer
    fn capture(&mut self, element: ElementRef) -> String {
        let saved = std::mem::take(&mut self.out);
        self.children(element);
        std::mem::replace(&mut self.out, saved)
    }

    fn wrap_inline(&mut self, element: ElementRef, marker: &str) {
        let inner = self.capture(element);
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            self.out.push_str(&inner);
            return;
        }

        if inner.starts_with(' ') && !self.out.ends_with(' ') {
            self.out.push(' ');
        }
        self.out.push_str(marker);
        self.out.push_str(trimmed);
        self.out.push_str(marker);
        if inner.ends_with(' ') {
            self.out.push(' ');
        }
    }

    fn link(&mut self, element: ElementRef) {
        let text = single_line(&self.capture(element));
        let href = element.value().attr("href").map(str::trim).unwrap_or("");

        if href.is_empty() {
            self.out.push_str(&text);
        } else if text.is_empty() {
            self.out.push_str(&format!("<{}>", href));
        } else {
            self.out.push_str(&format!("[{}]({})", text, href));
        }
    }

    fn list_item(&mut self, element: ElementRef) {
        let marker = match self.lists.last_mut() {
            Some(list) if list.ordered => {
                let marker = format!("{}. ", list.next);
                list.next += 1;
                marker
            }
            _ => "- ".to_string(),
        };

        let content = self.capture(element);
        let indent = " ".repeat(marker.len());
        let mut lines = content
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty());

        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }

        self.out.push_str(&marker);
        if let Some(first) = lines.next() {
            self.out.push_str(first.trim_start());
        }
        for line in lines {
            self.out.push('\n');
            self.out.push_str(&indent);
            self.out.push_str(line);
        }
        self.out.push('\n');
    }

    fn table(&mut self, element: ElementRef) {
        let mut rows: Vec<Vec<String>> = Vec::new();

        for row in element
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "tr")
        {
            let cells: Vec<String> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|e| matches!(e.value().name(), "td" | "th"))
                .map(|cell| single_line(&self.capture(cell)).replace('|', "\\|"))
                .collect();

            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        if rows.is_empty() {
            return;
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        self.block_break();

        for (index, row) in rows.iter().enumerate() {
            let mut cells = row.clone();
            cells.resize(width, String::new());
            self.out.push_str(&format!("| {} |\n", cells.join(" | ")));

            if index == 0 {
                let separator = vec!["---"; width];
                self.out.push_str(&format!("| {} |\n", separator.join(" | ")));
            }
        }

        self.block_break();
    }

    /// Serializes an `<img>` back to HTML with responsive styling
    fn image_tag(&self, element: ElementRef) -> String {
        let img = element.value();
        let existing_style = img.attr("style").unwrap_or("").trim().trim_end_matches(';');

        let mut style = if existing_style.is_empty() {
            "max-width: 100%; object-fit: contain;".to_string()
        } else {
            format!("{}; max-width: 100%; object-fit: contain;", existing_style)
        };
        if !existing_style.contains("height") && img.attr("height").is_none() {
            style.push_str(" height: auto;");
        }

        let mut tag = String::from("<img");
        if let Some(src) = img.attr("src") {
            let src = self
                .images
                .get(src.trim())
                .map(String::as_str)
                .unwrap_or(src);
            tag.push_str(&format!(" src=\"{}\"", escape_attribute(src)));
        }

        // Attribute storage order is not guaranteed, sort for stable output
        let mut attrs: Vec<(&str, &str)> = img
            .attrs()
            .filter(|(name, _)| !matches!(*name, "src" | "style" | "loading"))
            .collect();
        attrs.sort_by_key(|(name, _)| *name);
        for (name, value) in attrs {
            tag.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
        tag.push_str(&format!(
            " style=\"{}\" loading=\"lazy\">",
            escape_attribute(&style)
        ));

        tag
    }

    fn trim_trailing_spaces(&mut self) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
    }

    /// Ends the current block so the next one starts after a blank line
    fn block_break(&mut self) {
        self.trim_trailing_spaces();
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                collapsed.push(' ');
            }
            in_space = true;
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }

    collapsed
}

fn single_line(text: &str) -> String {
    collapse_whitespace(text).trim().to_string()
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Trims every line's trailing spaces (hard breaks excepted) and squeezes
/// runs of blank lines into one
fn tidy(markdown: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = false;

    for line in markdown.lines() {
        let line = if line.ends_with("  ") && !line.trim().is_empty() {
            line
        } else {
            line.trim_end()
        };

        if line.is_empty() {
            if blank_run || lines.is_empty() {
                continue;
            }
            blank_run = true;
        } else {
            blank_run = false;
        }
        lines.push(line);
    }

    while lines.last().map_or(false, |l| l.trim().is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}
