use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{
    geometry::{FlowPoint, FlowSize},
    locale::{LocalisableText, Localiser},
    text::{GlyphRun, StyleOverride, TextStyle},
};

/// A run shared between a flow and whoever else holds it.
pub type SharedRun = Arc<Mutex<GlyphRun>>;

/// A piece of flow content, in document order.
#[derive(Clone, Debug)]
pub enum TextPart {
    /// Text split into one run per word so the flow can wrap between words.
    Words {
        text: LocalisableText,
        style: StyleOverride,
    },
    /// An explicit line or paragraph break.
    LineBreak { paragraph: bool },
    /// Runs built and owned elsewhere, placed verbatim.
    Manual { runs: Vec<Weak<Mutex<GlyphRun>>> },
}

impl TextPart {
    pub fn words(text: impl Into<LocalisableText>) -> Self {
        Self::Words {
            text: text.into(),
            style: StyleOverride::default(),
        }
    }

    pub fn manual<'a>(runs: impl IntoIterator<Item = &'a SharedRun>) -> Self {
        Self::Manual {
            runs: runs.into_iter().map(Arc::downgrade).collect(),
        }
    }

    /// Whether the realized output depends on the locale.
    pub fn is_localisable(&self) -> bool {
        matches!(
            self,
            Self::Words {
                text: LocalisableText::Key { .. },
                ..
            }
        )
    }

    /// Whether the realized output depends on the flow's default style.
    pub fn uses_default_style(&self) -> bool {
        matches!(self, Self::Words { .. })
    }

    /// Turns the part into flow children. Calling it again yields equivalent children.
    pub fn realize(&self, context: &RealizeContext<'_>) -> Vec<FlowChild> {
        match self {
            Self::Words { text, style } => {
                let style = {
                    let mut style = style.apply(context.default_style);
                    // the flow wraps between words, never inside one
                    style.allow_multiline = false;
                    style
                };
                let text = text.resolve(context.localiser).replace('\r', "");

                split_words(&text)
                    .into_iter()
                    .map(|token| match token {
                        Token::Word(word) => {
                            FlowChild::owned_run(GlyphRun::new(word, style.clone()))
                        }
                        Token::NewLine => FlowChild::line_break(context.new_line_is_paragraph),
                    })
                    .collect()
            }
            Self::LineBreak { paragraph } => vec![FlowChild::line_break(*paragraph)],
            Self::Manual { runs } => runs
                .iter()
                .filter_map(|run| {
                    let run = run.upgrade();
                    if run.is_none() {
                        log::debug!("skipping manual run dropped by its owner");
                    }
                    run
                })
                .map(FlowChild::external_run)
                .collect(),
        }
    }
}

/// Inputs shared by every part realization in one pass.
pub struct RealizeContext<'a> {
    pub default_style: &'a TextStyle,
    pub new_line_is_paragraph: bool,
    pub localiser: &'a dyn Localiser,
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    NewLine,
}

/// Splits on whitespace, keeping trailing whitespace with the word before it.
///
/// `\r` must already be stripped.
fn split_words(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_trailing_space = false;

    for (index, ch) in text.char_indices() {
        if ch == '\n' {
            if start < index {
                tokens.push(Token::Word(&text[start..index]));
            }
            tokens.push(Token::NewLine);
            start = index + ch.len_utf8();
            in_trailing_space = false;
        } else if ch.is_whitespace() {
            in_trailing_space = true;
        } else if in_trailing_space {
            tokens.push(Token::Word(&text[start..index]));
            start = index;
            in_trailing_space = false;
        }
    }

    if start < text.len() {
        tokens.push(Token::Word(&text[start..]));
    }
    tokens
}

/// Who is responsible for a child's run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Created by the flow from a [`TextPart::Words`]; lives as long as the part.
    Flow,
    /// Supplied through [`TextPart::Manual`]; the flow only borrows it.
    External,
}

#[derive(Clone, Debug)]
pub enum ChildKind {
    Run(SharedRun),
    Break { paragraph: bool },
}

/// A realized, positioned child of a flow.
#[derive(Clone, Debug)]
pub struct FlowChild {
    kind: ChildKind,
    ownership: Ownership,
    pub(crate) position: FlowPoint,
    pub(crate) size: FlowSize,
}

impl FlowChild {
    fn owned_run(run: GlyphRun) -> Self {
        Self::new(ChildKind::Run(Arc::new(Mutex::new(run))), Ownership::Flow)
    }

    fn external_run(run: SharedRun) -> Self {
        Self::new(ChildKind::Run(run), Ownership::External)
    }

    fn line_break(paragraph: bool) -> Self {
        Self::new(ChildKind::Break { paragraph }, Ownership::Flow)
    }

    fn new(kind: ChildKind, ownership: Ownership) -> Self {
        Self {
            kind,
            ownership,
            position: FlowPoint::zero(),
            size: FlowSize::zero(),
        }
    }

    pub fn kind(&self) -> &ChildKind {
        &self.kind
    }

    pub fn run(&self) -> Option<&SharedRun> {
        match &self.kind {
            ChildKind::Run(run) => Some(run),
            ChildKind::Break { .. } => None,
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self.kind, ChildKind::Break { .. })
    }

    pub fn is_paragraph_break(&self) -> bool {
        matches!(self.kind, ChildKind::Break { paragraph: true })
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Top-left corner in flow space, as of the last layout pass.
    pub fn position(&self) -> FlowPoint {
        self.position
    }

    /// Size as of the last layout pass. Breaks report their spacer height.
    pub fn size(&self) -> FlowSize {
        self.size
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::{MapLocaliser, NoLocalisation};

    fn texts(children: &[FlowChild]) -> Vec<String> {
        children
            .iter()
            .map(|child| match child.kind() {
                ChildKind::Run(run) => run.lock().text().to_owned(),
                ChildKind::Break { paragraph: true } => "<p>".to_owned(),
                ChildKind::Break { paragraph: false } => "<br>".to_owned(),
            })
            .collect()
    }

    fn context<'a>(style: &'a TextStyle, localiser: &'a dyn Localiser) -> RealizeContext<'a> {
        RealizeContext {
            default_style: style,
            new_line_is_paragraph: true,
            localiser,
        }
    }

    #[test]
    fn test_split_keeps_trailing_space_with_word() {
        assert_eq!(
            split_words("hello  big\nworld "),
            vec![
                Token::Word("hello  "),
                Token::Word("big"),
                Token::NewLine,
                Token::Word("world "),
            ]
        );
        assert!(split_words("").is_empty());
        assert_eq!(split_words("\n\n"), vec![Token::NewLine, Token::NewLine]);
    }

    #[test]
    fn test_words_realize_one_run_per_word() {
        let style = TextStyle::default();
        let part = TextPart::words("one two\nthree");
        let children = part.realize(&context(&style, &NoLocalisation));

        assert_eq!(texts(&children), vec!["one ", "two", "<p>", "three"]);
        assert!(children.iter().all(|c| c.ownership() == Ownership::Flow));

        let run = children[0].run().unwrap().lock();
        assert!(!run.style().allow_multiline);
    }

    #[test]
    fn test_new_line_as_line_break() {
        let style = TextStyle::default();
        let localiser = NoLocalisation;
        let mut context = context(&style, &localiser);
        context.new_line_is_paragraph = false;

        let children = TextPart::words("a\nb").realize(&context);
        assert_eq!(texts(&children), vec!["a", "<br>", "b"]);

        let children = TextPart::words("a\r\nb").realize(&context);
        assert_eq!(texts(&children), vec!["a", "<br>", "b"]);
    }

    #[test]
    fn test_realize_is_idempotent() {
        let style = TextStyle::default();
        let part = TextPart::words("alpha beta");
        let first = texts(&part.realize(&context(&style, &NoLocalisation)));
        let second = texts(&part.realize(&context(&style, &NoLocalisation)));
        assert_eq!(first, second);
    }

    #[test]
    fn test_style_override_applies_to_word_runs() {
        let style = TextStyle::default();
        let part = TextPart::Words {
            text: "big".into(),
            style: StyleOverride {
                text_size: Some(48.0),
                ..Default::default()
            },
        };
        let children = part.realize(&context(&style, &NoLocalisation));
        assert_eq!(children[0].run().unwrap().lock().style().text_size, 48.0);
    }

    #[test]
    fn test_manual_runs_are_shared_not_copied() {
        let style = TextStyle::default();
        let run: SharedRun = Arc::new(Mutex::new(GlyphRun::new("kept as is", style.clone())));
        let part = TextPart::manual([&run]);

        let children = part.realize(&context(&style, &NoLocalisation));
        assert_eq!(texts(&children), vec!["kept as is"]);
        assert_eq!(children[0].ownership(), Ownership::External);
        assert!(Arc::ptr_eq(children[0].run().unwrap(), &run));
    }

    #[test]
    fn test_dropped_manual_runs_are_skipped() {
        let style = TextStyle::default();
        let part = {
            let run: SharedRun = Arc::new(Mutex::new(GlyphRun::default()));
            TextPart::manual([&run])
        };
        assert!(part.realize(&context(&style, &NoLocalisation)).is_empty());
    }

    #[test]
    fn test_localised_words_follow_localiser() {
        let style = TextStyle::default();
        let mut localiser = MapLocaliser::new("en");
        localiser.insert("en", "title", "Hello there");
        let part = TextPart::words(LocalisableText::key("title", "fallback"));
        assert!(part.is_localisable());

        let children = part.realize(&context(&style, &localiser));
        assert_eq!(texts(&children), vec!["Hello ", "there"]);
    }
}
