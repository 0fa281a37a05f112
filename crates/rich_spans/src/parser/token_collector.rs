// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerOpts,
};

use crate::AttributeSet;

/// An opening tag as seen in the source, names lower-cased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlTag {
    pub name: String,
    pub attributes: AttributeSet,
    pub self_closing: bool,
}

impl HtmlTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeSet::new(),
            self_closing: false,
        }
    }

    /// The opening tag written back out, `<name attrs>` or `<name attrs />`.
    ///
    /// Values are double-quoted. An attribute with an empty value is
    /// written as its bare name, the way boolean attributes are spelled.
    pub fn to_html(&self) -> String {
        let mut html = format!("<{}", self.name);
        for (name, value) in self.attributes.iter() {
            html.push(' ');
            html.push_str(name);
            if !value.is_empty() {
                html.push_str("=\"");
                html.push_str(&html_escape::encode_double_quoted_attribute(
                    value,
                ));
                html.push('"');
            }
        }
        html.push_str(if self.self_closing { " />" } else { ">" });
        html
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum HtmlToken {
    Open(HtmlTag),
    Close(String),
    Text(String),
    Comment(String),
}

#[derive(Default)]
struct Collected {
    tokens: Vec<HtmlToken>,
    errors: Vec<String>,
}

impl Collected {
    fn push_text(&mut self, text: &str) {
        if let Some(HtmlToken::Text(last)) = self.tokens.last_mut() {
            last.push_str(text);
        } else {
            self.tokens.push(HtmlToken::Text(text.to_owned()));
        }
    }
}

/// Flattens html5ever's token stream into [HtmlToken]s.
///
/// html5ever decodes character references and lower-cases names. No tree is
/// built: nesting is tracked by the parser proper, which is what lets
/// unknown elements be captured verbatim.
#[derive(Default)]
pub(crate) struct TokenCollector {
    state: RefCell<Collected>,
}

impl TokenCollector {
    /// Returns the tokens and any tokenizer diagnostics.
    pub(crate) fn tokenize(html: &str) -> (Vec<HtmlToken>, Vec<String>) {
        let input = BufferQueue::default();
        input.push_back(StrTendril::from_slice(html));

        let tokenizer =
            Tokenizer::new(TokenCollector::default(), TokenizerOpts::default());
        let _ = tokenizer.feed(&input);
        tokenizer.end();

        let collected = tokenizer.sink.state.take();
        (collected.tokens, collected.errors)
    }
}

impl TokenSink for TokenCollector {
    type Handle = ();

    fn process_token(
        &self,
        token: Token,
        _line_number: u64,
    ) -> TokenSinkResult<()> {
        let mut state = self.state.borrow_mut();
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => {
                    let attributes = AttributeSet::from_pairs(
                        tag.attrs.iter().map(|attr| {
                            let name = attr.name.local.to_string();
                            (name, attr.value.to_string())
                        }),
                    );
                    state.tokens.push(HtmlToken::Open(HtmlTag {
                        name: tag.name.to_string(),
                        attributes,
                        self_closing: tag.self_closing,
                    }));
                }
                TagKind::EndTag => {
                    state.tokens.push(HtmlToken::Close(tag.name.to_string()))
                }
            },
            Token::CharacterTokens(text) => state.push_text(&text),
            Token::CommentToken(text) => {
                state.tokens.push(HtmlToken::Comment(text.to_string()))
            }
            Token::ParseError(msg) => state.errors.push(msg.into_owned()),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(name: &str) -> HtmlToken {
        HtmlToken::Open(HtmlTag::new(name))
    }

    #[test]
    fn tags_and_text_become_tokens() {
        let (tokens, errors) = TokenCollector::tokenize("<b>bold</b>");
        assert!(errors.is_empty());
        assert_eq!(
            tokens,
            vec![
                open("b"),
                HtmlToken::Text("bold".into()),
                HtmlToken::Close("b".into())
            ]
        );
    }

    #[test]
    fn entities_are_decoded() {
        let (tokens, _) = TokenCollector::tokenize("a &amp; b &lt;c&gt;");
        assert_eq!(tokens, vec![HtmlToken::Text("a & b <c>".into())]);
    }

    #[test]
    fn names_are_lower_cased_and_attributes_kept_in_order() {
        let (tokens, _) =
            TokenCollector::tokenize("<A HREF=\"x\" Class=\"y\">t</A>");
        let HtmlToken::Open(tag) = &tokens[0] else {
            panic!("expected an open tag, got {tokens:?}");
        };
        assert_eq!(tag.name, "a");
        assert_eq!(tag.attributes.serialize(), "href=\"x\" class=\"y\"");
        assert_eq!(tokens[2], HtmlToken::Close("a".into()));
    }

    #[test]
    fn comments_are_collected() {
        let (tokens, _) = TokenCollector::tokenize("a<!-- note -->b");
        assert_eq!(tokens[1], HtmlToken::Comment(" note ".into()));
    }

    #[test]
    fn self_closing_flag_is_kept() {
        let (tokens, _) = TokenCollector::tokenize("<br/><hr>");
        let HtmlToken::Open(br) = &tokens[0] else { panic!() };
        let HtmlToken::Open(hr) = &tokens[1] else { panic!() };
        assert!(br.self_closing);
        assert!(!hr.self_closing);
        assert_eq!(br.to_html(), "<br />");
    }

    #[test]
    fn boolean_attributes_are_written_bare() {
        let (tokens, _) =
            TokenCollector::tokenize("<video controls src='v.mp4'></video>");
        let HtmlToken::Open(video) = &tokens[0] else {
            panic!("expected an open tag, got {tokens:?}");
        };
        assert_eq!(video.to_html(), "<video controls src=\"v.mp4\">");
    }

    #[test]
    fn malformed_input_reports_errors_without_failing() {
        let (tokens, errors) = TokenCollector::tokenize("<b>unterminated <");
        assert!(!errors.is_empty());
        assert_eq!(tokens[0], open("b"));
    }
}
