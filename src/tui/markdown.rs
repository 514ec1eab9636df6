//! Markdown → ratatui `Text` renderer.
//!
//! Converts `pulldown_cmark` events into styled `Line`/`Span` values:
//! headings, bold, italic, strikethrough, inline code, fenced code blocks
//! (highlighted with syntect), lists, blockquotes, and links.
//!
//! The renderer is a pure function of its input, so re-rendering a growing
//! stream buffer on every chunk is safe: a longer prefix of the same text
//! always produces the same leading lines.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-eighties.dark";

/// Parse markdown into styled `Text` with `base_fg` as the default color.
///
/// Returns owned text (`'static`) so callers aren't constrained by input lifetime.
pub fn render(source: &str, base_fg: Color) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(base_fg);
    for event in Parser::new_ext(source, opts) {
        renderer.event(event);
    }
    renderer.finish()
}

struct Renderer {
    done: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    base_fg: Color,
    /// Inline style stack; styles compose via `patch` so nested bold+italic works.
    inline: Vec<Style>,
    /// Blockquote nesting depth, one `│ ` prefix per level.
    quote_depth: usize,
    /// List nesting: None = unordered, Some(n) = next ordered index.
    lists: Vec<Option<u64>>,
    /// Active fenced code block, if any.
    code: Option<CodeBlock>,
    /// Stored link URL, appended after the link text closes.
    link_url: Option<String>,
    /// Whether the next block should be preceded by a blank line.
    pending_gap: bool,
}

struct CodeBlock {
    highlighter: Option<HighlightLines<'static>>,
}

impl CodeBlock {
    fn for_language(lang: &str) -> Self {
        let highlighter = THEMES.themes.get(CODE_THEME).and_then(|theme| {
            SYNTAXES
                .find_syntax_by_token(lang)
                .map(|syntax| HighlightLines::new(syntax, theme))
        });
        CodeBlock { highlighter }
    }

    fn plain() -> Self {
        CodeBlock { highlighter: None }
    }
}

impl Renderer {
    fn new(base_fg: Color) -> Self {
        Renderer {
            done: Vec::new(),
            current: Vec::new(),
            base_fg,
            inline: Vec::new(),
            quote_depth: 0,
            lists: Vec::new(),
            code: None,
            link_url: None,
            pending_gap: false,
        }
    }

    fn style(&self) -> Style {
        self.inline
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.inline.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.inline.pop();
    }

    /// Finish the current line, prepending blockquote markers.
    fn end_line(&mut self) {
        let mut spans = std::mem::take(&mut self.current);
        for _ in 0..self.quote_depth {
            spans.insert(
                0,
                Span::styled("│ ", Style::default().fg(Color::DarkGray)),
            );
        }
        self.done.push(Line::from(spans));
    }

    fn end_line_if_open(&mut self) {
        if !self.current.is_empty() {
            self.end_line();
        }
    }

    /// Start a block element: close any open line and emit the separating
    /// blank line owed by the previous block.
    fn open_block(&mut self) {
        self.end_line_if_open();
        if self.pending_gap && !self.done.is_empty() {
            self.done.push(Line::default());
        }
        self.pending_gap = false;
    }

    fn close_block(&mut self) {
        self.end_line_if_open();
        self.pending_gap = true;
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.code.is_some() {
                    self.code_text(&text);
                } else {
                    self.inline_text(&text);
                }
            }
            Event::Code(text) => {
                let style = Style::default().fg(Color::Yellow);
                self.current.push(Span::styled(text.into_string(), style));
            }
            Event::SoftBreak | Event::HardBreak => self.end_line(),
            Event::Rule => {
                self.open_block();
                self.current.push(Span::styled(
                    "────────",
                    Style::default().fg(Color::DarkGray),
                ));
                self.close_block();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current.push(Span::styled(marker.to_string(), self.style()));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open_block(),
            Tag::Heading { level, .. } => {
                self.open_block();
                let color = match level {
                    HeadingLevel::H1 => Color::Magenta,
                    HeadingLevel::H2 => Color::Blue,
                    _ => Color::Cyan,
                };
                self.push_style(Style::default().fg(color).add_modifier(Modifier::BOLD));
            }
            Tag::BlockQuote(_) => {
                self.open_block();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.open_block();
                self.code = Some(match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                        CodeBlock::for_language(&lang)
                    }
                    _ => CodeBlock::plain(),
                });
            }
            Tag::List(start) => {
                self.end_line_if_open();
                if self.lists.is_empty() {
                    self.open_block();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.end_line_if_open();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(index)) => {
                        let m = format!("{indent}{index}. ");
                        *index += 1;
                        m
                    }
                    _ => format!("{indent}• "),
                };
                self.current
                    .push(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.push_style(
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                );
                self.link_url = Some(dest_url.into_string());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.close_block(),
            TagEnd::Heading(_) => {
                self.pop_style();
                self.close_block();
            }
            TagEnd::BlockQuote(_) => {
                self.close_block();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                self.code = None;
                self.close_block();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.close_block();
                }
            }
            TagEnd::Item => self.end_line_if_open(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_url.take() {
                    self.current.push(Span::styled(
                        format!(" ({url})"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            _ => {}
        }
    }

    fn inline_text(&mut self, text: &str) {
        let style = self.style();
        let mut first = true;
        for piece in text.split('\n') {
            if !first {
                self.end_line();
            }
            first = false;
            if !piece.is_empty() {
                self.current.push(Span::styled(piece.to_string(), style));
            }
        }
    }

    /// Code block text arrives with trailing newlines per line; each becomes
    /// its own output line, highlighted when a syntax matched the fence tag.
    fn code_text(&mut self, text: &str) {
        let fallback = Style::default().fg(Color::Gray);
        let highlighter = match &mut self.code {
            Some(block) => &mut block.highlighter,
            None => return,
        };

        for raw_line in LinesWithEndings::from(text) {
            let spans = match highlighter {
                Some(h) => match h.highlight_line(raw_line, &SYNTAXES) {
                    Ok(regions) => regions
                        .iter()
                        .map(|(style, chunk)| {
                            Span::styled(
                                chunk.trim_end_matches('\n').to_string(),
                                convert_syntect_style(style),
                            )
                        })
                        .collect(),
                    Err(_) => vec![Span::styled(
                        raw_line.trim_end_matches('\n').to_string(),
                        fallback,
                    )],
                },
                None => vec![Span::styled(
                    raw_line.trim_end_matches('\n').to_string(),
                    fallback,
                )],
            };
            self.done.push(Line::from(spans));
        }
    }

    fn finish(mut self) -> Text<'static> {
        self.end_line_if_open();
        Text::from(self.done)
    }
}

fn convert_syntect_style(style: &syntect::highlighting::Style) -> Style {
    let fg = style.foreground;
    Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b))
}
