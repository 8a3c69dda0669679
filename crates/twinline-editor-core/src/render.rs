//! Block presentation: raw source in, markup plus its text runs out.
//!
//! The editor never inspects markup. Alongside the markup string, the
//! renderer reports the text runs a surface will materialize (one per text
//! node, in document order) so the offset mapper can walk rendered blocks
//! without a DOM.

use std::collections::HashMap;

use markdown_weaver::{
    Alignment, CodeBlockKind, CowStr, Event, Event::*, LinkType, Options, Parser, Tag, TagEnd,
};
use markdown_weaver_escape::{FmtWriter, StrWrite, escape_href, escape_html, escape_html_body_text};

use crate::error::RenderError;
use crate::types::PLACEHOLDER;

/// Cached render of a block's raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    /// Markup for the block's content (without the block wrapper).
    pub markup: String,
    /// Text runs as a surface materializes them, unescaped.
    pub runs: Vec<String>,
}

impl Presentation {
    /// Empty paragraph holding only the zero-width placeholder.
    ///
    /// The placeholder glyph is not part of the run: it is a caret target,
    /// not content.
    pub fn placeholder() -> Self {
        Self {
            markup: format!("<p>{}</p>", PLACEHOLDER),
            runs: vec![String::new()],
        }
    }

    /// Escaped source shown verbatim, for when rendering fails.
    pub fn plain(raw: &str) -> Self {
        let mut markup = String::with_capacity(raw.len());
        // Writing to a String cannot fail.
        let _ = escape_html_body_text(FmtWriter(&mut markup), raw);
        Self {
            markup,
            runs: vec![raw.to_string()],
        }
    }

    /// Total materialized length of the runs, in chars.
    pub fn text_len(&self) -> usize {
        self.runs.iter().map(|run| run.chars().count()).sum()
    }
}

/// Boundary to the markdown renderer.
pub trait RenderAdapter {
    /// Render one block's raw source.
    fn render(&self, raw: &str) -> Result<Presentation, RenderError>;
}

impl<T: RenderAdapter + ?Sized> RenderAdapter for &T {
    fn render(&self, raw: &str) -> Result<Presentation, RenderError> {
        (**self).render(raw)
    }
}

/// Renders with markdown-weaver.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(default_md_options())
    }
}

/// Parser options for block rendering.
pub fn default_md_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_GFM
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_MATH
        | Options::ENABLE_HEADING_ATTRIBUTES
}

impl RenderAdapter for MarkdownRenderer {
    fn render(&self, raw: &str) -> Result<Presentation, RenderError> {
        let mut markup = String::new();
        let runs = MarkupWriter::new(Parser::new_ext(raw, self.options), FmtWriter(&mut markup))
            .run()?;
        Ok(Presentation { markup, runs })
    }
}

enum TableState {
    Head,
    Body,
}

/// HTML writer that also records the text nodes it produces.
struct MarkupWriter<'a, I, W> {
    iter: I,
    writer: W,

    /// Whether or not the last write wrote a newline.
    end_newline: bool,

    runs: Vec<String>,
    /// Text accumulated since the last element boundary.
    current_run: String,

    table_state: TableState,
    table_alignments: Vec<Alignment>,
    table_cell_index: usize,
    footnote_numbers: HashMap<CowStr<'a>, usize>,
}

impl<'a, I, W> MarkupWriter<'a, I, W>
where
    I: Iterator<Item = Event<'a>>,
    W: StrWrite,
{
    fn new(iter: I, writer: W) -> Self {
        Self {
            iter,
            writer,
            end_newline: true,
            runs: Vec::new(),
            current_run: String::new(),
            table_state: TableState::Head,
            table_alignments: vec![],
            table_cell_index: 0,
            footnote_numbers: HashMap::new(),
        }
    }

    /// Element boundary: whatever text came before is its own node.
    fn flush_run(&mut self) {
        if !self.current_run.is_empty() {
            self.runs.push(std::mem::take(&mut self.current_run));
        }
    }

    /// Writes element markup (tags only, no text content).
    fn tag(&mut self, s: &str) -> Result<(), W::Error> {
        self.flush_run();
        self.writer.write_str(s)?;
        self.end_newline = false;
        Ok(())
    }

    /// Writes escaped text content.
    fn text(&mut self, s: &str) -> Result<(), W::Error> {
        escape_html_body_text(&mut self.writer, s)?;
        self.current_run.push_str(s);
        if !s.is_empty() {
            self.end_newline = s.ends_with('\n');
        }
        Ok(())
    }

    fn newline(&mut self) -> Result<(), W::Error> {
        self.text("\n")
    }

    /// Opens a block-level element on a fresh line.
    fn block_tag(&mut self, s: &str) -> Result<(), W::Error> {
        if !self.end_newline {
            self.newline()?;
        }
        self.tag(s)
    }

    fn run(mut self) -> Result<Vec<String>, W::Error> {
        while let Some(event) = self.iter.next() {
            match event {
                Start(tag) => self.start_tag(tag)?,
                End(tag) => self.end_tag(tag)?,
                Text(text) => self.text(&text)?,
                Code(text) => {
                    self.tag("<code>")?;
                    self.text(&text)?;
                    self.tag("</code>")?;
                }
                InlineMath(text) => {
                    self.tag(r#"<span class="math math-inline">"#)?;
                    self.text(&text)?;
                    self.tag("</span>")?;
                }
                DisplayMath(text) => {
                    self.tag(r#"<span class="math math-display">"#)?;
                    self.text(&text)?;
                    self.tag("</span>")?;
                }
                // Inline HTML is shown as source: the block is a line of text, not a document.
                Html(html) | InlineHtml(html) => self.text(&html)?,
                SoftBreak => self.newline()?,
                HardBreak => {
                    self.tag("<br />")?;
                    self.newline()?;
                }
                Rule => {
                    self.block_tag("<hr />")?;
                    self.newline()?;
                }
                FootnoteReference(name) => {
                    let len = self.footnote_numbers.len() + 1;
                    let number = *self.footnote_numbers.entry(name.clone()).or_insert(len);
                    self.tag("<sup class=\"footnote-reference\"><a href=\"#")?;
                    escape_html(&mut self.writer, &name)?;
                    self.writer.write_str("\">")?;
                    self.text(&number.to_string())?;
                    self.tag("</a></sup>")?;
                }
                TaskListMarker(true) => {
                    self.tag("<input disabled=\"\" type=\"checkbox\" checked=\"\"/>")?;
                }
                TaskListMarker(false) => {
                    self.tag("<input disabled=\"\" type=\"checkbox\"/>")?;
                }
                _ => {}
            }
        }
        self.flush_run();
        Ok(self.runs)
    }

    fn start_tag(&mut self, tag: Tag<'a>) -> Result<(), W::Error> {
        match tag {
            Tag::Paragraph => self.block_tag("<p>"),
            Tag::Heading { level, .. } => {
                // Heading ids and classes are dropped: block ids belong to the editor.
                self.block_tag(&format!("<{}>", level))
            }
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                self.block_tag("<table>")
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                self.tag("<thead><tr>")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                self.tag("<tr>")
            }
            Tag::TableCell => {
                let cell = match self.table_state {
                    TableState::Head => "th",
                    TableState::Body => "td",
                };
                let style = match self.table_alignments.get(self.table_cell_index) {
                    Some(&Alignment::Left) => " style=\"text-align: left\"",
                    Some(&Alignment::Center) => " style=\"text-align: center\"",
                    Some(&Alignment::Right) => " style=\"text-align: right\"",
                    _ => "",
                };
                self.tag(&format!("<{}{}>", cell, style))
            }
            Tag::BlockQuote(_) => self.block_tag("<blockquote>"),
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                let lang = info.split(' ').next().unwrap_or_default();
                if lang.is_empty() {
                    self.block_tag("<pre><code>")
                } else {
                    self.block_tag("<pre><code class=\"language-")?;
                    escape_html(&mut self.writer, lang)?;
                    self.writer.write_str("\">")
                }
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => self.block_tag("<pre><code>"),
            Tag::List(Some(1)) => self.block_tag("<ol>"),
            Tag::List(Some(start)) => self.block_tag(&format!("<ol start=\"{}\">", start)),
            Tag::List(None) => self.block_tag("<ul>"),
            Tag::Item => self.block_tag("<li>"),
            Tag::Emphasis => self.tag("<em>"),
            Tag::Strong => self.tag("<strong>"),
            Tag::Strikethrough => self.tag("<del>"),
            Tag::Superscript => self.tag("<sup>"),
            Tag::Subscript => self.tag("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                self.tag("<a href=\"")?;
                if link_type == LinkType::Email {
                    self.writer.write_str("mailto:")?;
                }
                escape_href(&mut self.writer, &dest_url)?;
                if !title.is_empty() {
                    self.writer.write_str("\" title=\"")?;
                    escape_html(&mut self.writer, &title)?;
                }
                self.writer.write_str("\">")
            }
            Tag::Image { dest_url, .. } => {
                self.tag("<img src=\"")?;
                escape_href(&mut self.writer, &dest_url)?;
                self.writer.write_str("\" alt=\"")?;
                self.alt_text()?;
                self.writer.write_str("\" />")
            }
            Tag::FootnoteDefinition(name) => {
                let len = self.footnote_numbers.len() + 1;
                let number = *self.footnote_numbers.entry(name.clone()).or_insert(len);
                self.block_tag("<div class=\"footnote-definition\" id=\"")?;
                escape_html(&mut self.writer, &name)?;
                self.writer
                    .write_str("\"><sup class=\"footnote-definition-label\">")?;
                self.text(&number.to_string())?;
                self.tag("</sup>")
            }
            _ => Ok(()),
        }
    }

    fn end_tag(&mut self, tag: TagEnd) -> Result<(), W::Error> {
        match tag {
            TagEnd::Paragraph => self.tag("</p>")?,
            TagEnd::Heading(level) => self.tag(&format!("</{}>", level))?,
            TagEnd::Table => self.tag("</tbody></table>")?,
            TagEnd::TableHead => {
                self.tag("</tr></thead><tbody>")?;
                self.table_state = TableState::Body;
            }
            TagEnd::TableRow => self.tag("</tr>")?,
            TagEnd::TableCell => {
                match self.table_state {
                    TableState::Head => self.tag("</th>")?,
                    TableState::Body => self.tag("</td>")?,
                }
                self.table_cell_index += 1;
            }
            TagEnd::BlockQuote(_) => self.tag("</blockquote>")?,
            TagEnd::CodeBlock => self.tag("</code></pre>")?,
            TagEnd::List(true) => self.tag("</ol>")?,
            TagEnd::List(false) => self.tag("</ul>")?,
            TagEnd::Item => self.tag("</li>")?,
            TagEnd::Emphasis => self.tag("</em>")?,
            TagEnd::Strong => self.tag("</strong>")?,
            TagEnd::Strikethrough => self.tag("</del>")?,
            TagEnd::Superscript => self.tag("</sup>")?,
            TagEnd::Subscript => self.tag("</sub>")?,
            TagEnd::Link => self.tag("</a>")?,
            TagEnd::FootnoteDefinition => self.tag("</div>")?,
            _ => {}
        }
        Ok(())
    }

    /// Consumes an image's inner events into its `alt` attribute. Attribute
    /// text is not a text node, so no run is recorded.
    fn alt_text(&mut self) -> Result<(), W::Error> {
        let mut nest = 0;
        while let Some(event) = self.iter.next() {
            match event {
                Start(_) => nest += 1,
                End(_) => {
                    if nest == 0 {
                        break;
                    }
                    nest -= 1;
                }
                InlineHtml(text) | Code(text) | Text(text) => {
                    escape_html(&mut self.writer, &text)?;
                }
                SoftBreak | HardBreak => self.writer.write_str(" ")?,
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(raw: &str) -> Presentation {
        MarkdownRenderer::default()
            .render(raw)
            .expect("render failed")
    }

    #[test]
    fn test_plain_paragraph() {
        let out = render("hello world");
        assert_eq!(out.markup, "<p>hello world</p>");
        assert_eq!(out.runs, vec!["hello world"]);
    }

    #[test]
    fn test_emphasis_splits_runs() {
        let out = render("a *b* c");
        assert_eq!(out.markup, "<p>a <em>b</em> c</p>");
        assert_eq!(out.runs, vec!["a ", "b", " c"]);
        assert_eq!(out.text_len(), 5);
    }

    #[test]
    fn test_runs_are_unescaped() {
        let out = render("a < b & c");
        assert_eq!(out.markup, "<p>a &lt; b &amp; c</p>");
        assert_eq!(out.runs.concat(), "a < b & c");
    }

    #[test]
    fn test_heading() {
        let out = render("## Title");
        assert_eq!(out.markup, "<h2>Title</h2>");
        assert_eq!(out.runs, vec!["Title"]);
    }

    #[test]
    fn test_code_block_is_one_run() {
        let out = render("```rust\nlet x = 1;\n```");
        assert_eq!(
            out.markup,
            "<pre><code class=\"language-rust\">let x = 1;\n</code></pre>"
        );
        assert_eq!(out.runs, vec!["let x = 1;\n"]);
    }

    #[test]
    fn test_empty_source_has_no_runs() {
        let out = render("");
        assert!(out.markup.is_empty());
        assert!(out.runs.is_empty());
    }

    #[test]
    fn test_placeholder_presentation() {
        let out = Presentation::placeholder();
        assert_eq!(out.markup, "<p>\u{200B}</p>");
        assert_eq!(out.text_len(), 0);
    }

    #[test]
    fn test_plain_fallback_escapes() {
        let out = Presentation::plain("<b>");
        assert_eq!(out.markup, "&lt;b&gt;");
        assert_eq!(out.runs, vec!["<b>"]);
    }
}
