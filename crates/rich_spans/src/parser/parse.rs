// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::vec::IntoIter;

use super::token_collector::{HtmlToken, TokenCollector};
use crate::serializer::push_escaped_text;
use crate::spans::{is_void_element, kind_for_tag};
use crate::{
    CommentHandler, HtmlTag, ParseContext, SpanKind, SpannedText,
    TagAction, TagHandler,
};

/// Parse with no plugins registered.
pub fn parse_html(html: &str) -> SpannedText {
    HtmlParser::new().parse(html)
}

/// The outcome of a parse, with any tokenizer complaints. Parsing itself
/// never fails.
#[derive(Debug)]
pub struct ParseReport {
    pub text: SpannedText,
    pub errors: Vec<String>,
}

#[derive(Default)]
pub struct HtmlParser {
    tag_handlers: Vec<Box<dyn TagHandler>>,
    comment_handlers: Vec<Box<dyn CommentHandler>>,
}

impl HtmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tag_handler(
        &mut self,
        handler: Box<dyn TagHandler>,
    ) -> &mut Self {
        self.tag_handlers.push(handler);
        self
    }

    pub fn register_comment_handler(
        &mut self,
        handler: Box<dyn CommentHandler>,
    ) -> &mut Self {
        self.comment_handlers.push(handler);
        self
    }

    pub fn parse(&self, html: &str) -> SpannedText {
        self.parse_with_report(html).text
    }

    pub fn parse_with_report(&self, html: &str) -> ParseReport {
        let (tokens, errors) = TokenCollector::tokenize(html);
        if !errors.is_empty() {
            tracing::debug!(
                count = errors.len(),
                first = %errors[0],
                "html tokenizer reported errors"
            );
        }

        let mut cx = ParseContext::new();
        let mut tokens = tokens.into_iter();
        while let Some(token) = tokens.next() {
            match token {
                HtmlToken::Open(tag) => {
                    self.handle_open_tag(&tag, &mut tokens, &mut cx)
                }
                HtmlToken::Close(name) => {
                    if !cx.close(&name) {
                        tracing::trace!(
                            tag = %name,
                            "ignoring unmatched close tag"
                        );
                    }
                }
                HtmlToken::Text(text) => cx.append_source_text(&text),
                HtmlToken::Comment(text) => self.handle_comment(&text, &mut cx),
            }
        }

        ParseReport {
            text: cx.finish(),
            errors,
        }
    }

    fn handle_open_tag(
        &self,
        tag: &HtmlTag,
        tokens: &mut IntoIter<HtmlToken>,
        cx: &mut ParseContext,
    ) {
        let plugin = self
            .tag_handlers
            .iter()
            .find(|handler| handler.can_handle_tag(tag));

        if let Some(handler) = plugin {
            match handler.handle_tag(tag, cx) {
                TagAction::Decline => {}
                TagAction::Open(kind) => {
                    cx.open(tag, kind);
                    return;
                }
                TagAction::Handled => {
                    cx.open_consumed(tag);
                    return;
                }
                TagAction::Verbatim => {
                    let raw = capture_subtree(tag, tokens);
                    handler.handle_verbatim(tag, &raw, cx);
                    return;
                }
            }
        }

        match kind_for_tag(&tag.name) {
            Some(kind) => cx.open(tag, kind),
            None => {
                let raw = capture_subtree(tag, tokens);
                tracing::trace!(
                    tag = %tag.name,
                    "keeping unsupported element verbatim"
                );
                cx.open(tag, SpanKind::Unknown(raw));
            }
        }
    }

    fn handle_comment(&self, text: &str, cx: &mut ParseContext) {
        let handled = self
            .comment_handlers
            .iter()
            .any(|handler| handler.handle_comment(text, cx));
        if !handled {
            cx.open(&HtmlTag::new("!--"), SpanKind::Comment(text.to_owned()));
        }
    }
}

/// Consumes tokens up to and including the close tag matching `tag` and
/// writes them back out as HTML.
fn capture_subtree(tag: &HtmlTag, tokens: &mut IntoIter<HtmlToken>) -> String {
    let mut raw = tag.to_html();
    if tag.self_closing || is_void_element(&tag.name) {
        return raw;
    }

    let mut depth = 1;
    for token in tokens.by_ref() {
        match token {
            HtmlToken::Open(inner) => {
                raw.push_str(&inner.to_html());
                let has_content =
                    !(inner.self_closing || is_void_element(&inner.name));
                if inner.name == tag.name && has_content {
                    depth += 1;
                }
            }
            HtmlToken::Close(name) => {
                raw.push_str(&format!("</{name}>"));
                if name == tag.name {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
            }
            HtmlToken::Text(text) => push_escaped_text(&mut raw, &text),
            HtmlToken::Comment(text) => {
                raw.push_str(&format!("<!--{text}-->"))
            }
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use super::*;
    use crate::{BlockKind, InlineKind};

    fn spans(text: &SpannedText) -> Vec<Summary> {
        let mut found: Vec<Summary> = text
            .spans()
            .map(|(_, s)| (s.tag.clone(), s.start(), s.end(), s.nesting_level))
            .collect();
        found.sort_by_key(|(_, start, _, level)| (*start, *level));
        found
    }

    fn span_of<'a>(text: &'a SpannedText, tag: &str) -> &'a crate::Span {
        text.spans()
            .map(|(_, s)| s)
            .find(|s| s.tag == tag)
            .unwrap_or_else(|| panic!("no <{tag}> span in {}", text.to_tree()))
    }

    type Summary = (String, usize, usize, usize);

    fn s(tag: &str, start: usize, end: usize, level: usize) -> Summary {
        (tag.to_owned(), start, end, level)
    }

    // ===================================================================
    // Text and inline spans
    // ===================================================================

    #[test]
    fn empty_input_gives_just_the_marker() {
        let text = parse_html("");
        assert_eq!(text.len(), 1);
        text.explicitly_assert_invariants();
    }

    #[test]
    fn inline_tags_become_spans_over_their_text() {
        let text = parse_html("<b>Bold</b><i>Italic</i>");
        assert_eq!(text.plain_text(), "BoldItalic");
        assert_eq!(spans(&text), vec![s("b", 0, 4, 0), s("i", 4, 10, 0)]);
        assert_eq!(
            span_of(&text, "i").kind,
            SpanKind::Inline(InlineKind::Italic)
        );
    }

    #[test]
    fn entities_are_decoded_into_the_buffer() {
        let text = parse_html("fish &amp; chips");
        assert_eq!(text.plain_text(), "fish & chips");
    }

    #[test]
    fn attributes_are_kept_in_source_order() {
        let text = parse_html("<a href=\"x\" target=\"_blank\">l</a>");
        assert_eq!(
            span_of(&text, "a").attributes.serialize(),
            "href=\"x\" target=\"_blank\""
        );
    }

    #[test]
    fn empty_inline_elements_are_dropped() {
        let text = parse_html("a<b></b>c");
        assert_that!(text.span_count()).is_equal_to(0);
    }

    #[test]
    fn unmatched_close_tags_are_ignored() {
        let text = parse_html("a</b>c</p>");
        assert_eq!(text.plain_text(), "ac");
        assert_eq!(text.span_count(), 0);
    }

    #[test]
    fn closing_an_outer_element_closes_inner_ones() {
        let text = parse_html("<b>a<i>b</b>c</i>");
        assert_eq!(spans(&text), vec![s("b", 0, 2, 0), s("i", 1, 2, 0)]);
        assert_eq!(text.plain_text(), "abc");
    }

    #[test]
    fn unclosed_elements_end_with_the_input() {
        let text = parse_html("<b>abc");
        assert_eq!(spans(&text), vec![s("b", 0, 3, 0)]);
    }

    // ===================================================================
    // Blocks
    // ===================================================================

    #[test]
    fn trailing_block_newline_becomes_the_marker() {
        let text = parse_html("<p>a</p>");
        assert_eq!(text.slice_to_string(0, text.len()), "a\u{200B}");
        assert_eq!(spans(&text), vec![s("p", 0, 2, 0)]);
    }

    #[test]
    fn nested_blocks_share_one_closing_newline() {
        let text = parse_html("<ul><li>a</li><li>b</li></ul>");
        assert_eq!(text.slice_to_string(0, text.len()), "a\nb\u{200B}");
        assert_eq!(
            spans(&text),
            vec![s("ul", 0, 4, 0), s("li", 0, 2, 1), s("li", 2, 4, 1)]
        );
        text.explicitly_assert_invariants();
    }

    #[test]
    fn empty_list_item_still_gets_a_line() {
        let text = parse_html("<ul><li></li></ul>");
        assert_eq!(text.len(), 1);
        assert_eq!(spans(&text), vec![s("ul", 0, 1, 0), s("li", 0, 1, 1)]);
    }

    #[test]
    fn block_after_text_starts_a_new_line() {
        let text = parse_html("a<p>b</p>c");
        assert_eq!(text.slice_to_string(0, text.len()), "a\nb\nc\u{200B}");
        assert_eq!(spans(&text), vec![s("p", 2, 4, 0)]);
    }

    #[test]
    fn nesting_level_counts_open_blocks() {
        let text =
            parse_html("<blockquote><ul><li><b>x</b></li></ul></blockquote>");
        assert_eq!(
            spans(&text),
            vec![
                s("blockquote", 0, 2, 0),
                s("ul", 0, 2, 1),
                s("li", 0, 2, 2),
                s("b", 0, 1, 3),
            ]
        );
        text.explicitly_assert_invariants();
    }

    #[test]
    fn headings_keep_their_level_in_the_tag() {
        let text = parse_html("<h3>t</h3>");
        let heading = span_of(&text, "h3");
        assert_eq!(heading.kind, SpanKind::Block(BlockKind::Heading));
    }

    #[test]
    fn layout_whitespace_between_blocks_is_dropped() {
        let text = parse_html("<p>a</p>\n  <p>b</p>\n");
        assert_eq!(text.plain_text(), "a\nb");
    }

    #[test]
    fn newlines_in_text_become_spaces() {
        let text = parse_html("a\nb");
        assert_eq!(text.plain_text(), "a b");
    }

    #[test]
    fn preformatted_text_keeps_newlines() {
        let text = parse_html("<pre>\nline 1\nline 2</pre>");
        assert_eq!(text.plain_text(), "line 1\nline 2");
    }

    #[test]
    fn marker_characters_in_the_source_are_dropped() {
        let text = parse_html("a\u{200B}b");
        assert_eq!(text.plain_text(), "ab");
        text.explicitly_assert_invariants();
    }

    // ===================================================================
    // Voids, comments and unknown elements
    // ===================================================================

    #[test]
    fn line_break_is_a_newline_placeholder() {
        let text = parse_html("a<br>b");
        assert_eq!(text.plain_text(), "a\nb");
        assert_eq!(spans(&text), vec![s("br", 1, 2, 0)]);
        assert_eq!(span_of(&text, "br").kind, SpanKind::Void);
    }

    #[test]
    fn rule_and_image_take_an_object_character() {
        let text = parse_html("<hr><img src=\"a.png\">");
        assert_eq!(text.plain_text(), "\u{FFFC}\u{FFFC}");
        assert_eq!(span_of(&text, "img").attributes.get("src"), Some("a.png"));
    }

    #[test]
    fn comment_becomes_a_placeholder_span() {
        let text = parse_html("a<!--more-->b");
        assert_eq!(text.plain_text(), "a\u{FFFC}b");
        assert_eq!(
            span_of(&text, "!--").kind,
            SpanKind::Comment("more".to_owned())
        );
    }

    #[test]
    fn unknown_element_is_captured_with_its_subtree() {
        let text = parse_html(
            "x<iframe class=\"classic\">Menu <b>now</b></iframe>y",
        );
        assert_eq!(text.plain_text(), "x\u{FFFC}y");
        assert_eq!(
            span_of(&text, "iframe").kind,
            SpanKind::Unknown(
                "<iframe class=\"classic\">Menu <b>now</b></iframe>".into()
            )
        );
        assert_eq!(text.span_count(), 1);
    }

    #[test]
    fn unknown_element_nested_in_itself_is_captured_whole() {
        let text = parse_html("<section><section>a</section>b</section>c");
        assert_eq!(
            span_of(&text, "section").kind,
            SpanKind::Unknown(
                "<section><section>a</section>b</section>".into()
            )
        );
        assert_eq!(text.plain_text(), "\u{FFFC}c");
    }

    #[test]
    fn unknown_void_element_captures_only_its_tag() {
        let text = parse_html("<input type=\"checkbox\">done");
        assert_eq!(text.plain_text(), "\u{FFFC}done");
        assert_eq!(
            span_of(&text, "input").kind,
            SpanKind::Unknown("<input type=\"checkbox\">".into())
        );
    }

    // ===================================================================
    // Plugins
    // ===================================================================

    struct MarkAsBold;

    impl TagHandler for MarkAsBold {
        fn can_handle_tag(&self, tag: &HtmlTag) -> bool {
            tag.name == "mark"
        }

        fn handle_tag(
            &self,
            _tag: &HtmlTag,
            _cx: &mut ParseContext,
        ) -> TagAction {
            TagAction::Open(SpanKind::Inline(InlineKind::Bold))
        }
    }

    struct Shouting;

    impl TagHandler for Shouting {
        fn can_handle_tag(&self, tag: &HtmlTag) -> bool {
            tag.name == "shout"
        }

        fn handle_tag(
            &self,
            _tag: &HtmlTag,
            _cx: &mut ParseContext,
        ) -> TagAction {
            TagAction::Verbatim
        }

        fn handle_verbatim(
            &self,
            _tag: &HtmlTag,
            raw_html: &str,
            cx: &mut ParseContext,
        ) {
            cx.append_text(&raw_html.to_uppercase());
        }
    }

    struct DecliningHandler;

    impl TagHandler for DecliningHandler {
        fn can_handle_tag(&self, _tag: &HtmlTag) -> bool {
            true
        }

        fn handle_tag(
            &self,
            _tag: &HtmlTag,
            _cx: &mut ParseContext,
        ) -> TagAction {
            TagAction::Decline
        }
    }

    struct DropComments;

    impl CommentHandler for DropComments {
        fn handle_comment(&self, text: &str, _cx: &mut ParseContext) -> bool {
            text.trim() == "drop"
        }
    }

    #[test]
    fn tag_plugin_can_open_a_native_span_kind() {
        let mut parser = HtmlParser::new();
        parser.register_tag_handler(Box::new(MarkAsBold));
        let text = parser.parse("<mark>hi</mark>");
        let mark = span_of(&text, "mark");
        assert_eq!(mark.kind, SpanKind::Inline(InlineKind::Bold));
        assert_eq!((mark.start(), mark.end()), (0, 2));
    }

    #[test]
    fn verbatim_plugin_receives_the_raw_subtree() {
        let mut parser = HtmlParser::new();
        parser.register_tag_handler(Box::new(Shouting));
        let text = parser.parse("<shout>hey <i>you</i></shout>!");
        assert_eq!(text.plain_text(), "<SHOUT>HEY <I>YOU</I></SHOUT>!");
        assert_eq!(text.span_count(), 0);
    }

    #[test]
    fn declining_plugin_falls_through_to_built_in_handling() {
        let mut parser = HtmlParser::new();
        parser.register_tag_handler(Box::new(DecliningHandler));
        let text = parser.parse("<b>x</b>");
        assert_eq!(
            span_of(&text, "b").kind,
            SpanKind::Inline(InlineKind::Bold)
        );
    }

    #[test]
    fn comment_plugin_stops_the_chain() {
        let mut parser = HtmlParser::new();
        parser.register_comment_handler(Box::new(DropComments));
        let text = parser.parse("a<!-- drop -->b<!-- keep -->");
        assert_eq!(text.plain_text(), "ab\u{FFFC}");
        assert_eq!(text.span_count(), 1);
    }

    #[test]
    fn report_carries_tokenizer_errors() {
        let report = HtmlParser::new().parse_with_report("<b>x</b><");
        assert!(!report.errors.is_empty());
        assert_eq!(report.text.plain_text(), "x<");
        assert!(report.text.is_marker_at(report.text.len() - 1));
    }
}
