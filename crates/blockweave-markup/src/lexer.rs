//! # Lexer - Tokenizing Markup
//!
//! Breaks an HTML fragment into a flat token stream using the [Logos] lexer
//! generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token. Nothing is skipped,
//! so any rewrite that leaves a token alone reproduces its bytes exactly:
//!
//! ```
//! use blockweave_markup::lexer::lex;
//!
//! let input = "<p class=\"a\">Hello <b>world</b></p>\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Raw Text Elements
//!
//! The contents of `<script>`, `<style>`, `<textarea>` and `<title>` are not
//! markup. After one of those start tags, everything up to the matching end
//! tag becomes a single [`TokenKind::RawText`] token so that a stray `<` in a
//! script can never swallow the closing tag.

use logos::{Lexer, Logos};

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<!-- ... -->`, unterminated comments run to end of input
    #[token("<!--", lex_comment)]
    Comment,

    /// `<!DOCTYPE ...>` and `<![CDATA[...]>`-style declarations
    #[regex(r"<![a-zA-Z\[][^>]*>")]
    Declaration,

    /// Opening or self-closing tag, including its attributes
    #[regex(r"<[a-zA-Z]", lex_start_tag)]
    StartTag,

    /// Closing tag
    #[regex(r"</[a-zA-Z][a-zA-Z0-9:-]*[ \t\r\n\f]*>")]
    EndTag,

    /// Whitespace outside tags. Non-breaking spaces are text, not whitespace.
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    /// Run of character data
    #[regex(r"[^< \t\r\n\f]+")]
    Text,

    /// A `<` that does not open a tag; semantically text
    #[token("<")]
    Lt,

    /// Contents of a raw text element. Never produced by Logos directly.
    RawText,
}

impl TokenKind {
    /// True for tokens that carry character data.
    pub fn is_text(self) -> bool {
        matches!(self, TokenKind::Text | TokenKind::Lt | TokenKind::RawText)
    }

    /// True for start and end tags.
    pub fn is_tag(self) -> bool {
        matches!(self, TokenKind::StartTag | TokenKind::EndTag)
    }
}

fn lex_comment(lex: &mut Lexer<TokenKind>) -> bool {
    let rest = lex.remainder();
    let len = rest.find("-->").map_or(rest.len(), |i| i + 3);
    lex.bump(len);
    true
}

/// Scans to the `>` that closes a start tag, skipping quoted attribute values.
fn lex_start_tag(lex: &mut Lexer<TokenKind>) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => {
                    lex.bump(i + 1);
                    return true;
                }
                // A new tag opening before this one closed: not a tag.
                b'<' => return false,
                _ => {}
            },
        }
    }
    false
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "textarea", "title"];

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input).into_iter().map(|(t, _)| t).collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    'segments: while offset < input.len() {
        let mut lexer = TokenKind::lexer(&input[offset..]);

        while let Some(result) = lexer.next() {
            let span = lexer.span();
            let range = offset + span.start..offset + span.end;
            // Logos error means no rule matched, e.g. `<a` with no closing `>`
            let kind = result.unwrap_or(TokenKind::Text);
            tokens.push((
                Token {
                    kind,
                    text: &input[range.clone()],
                },
                range.clone(),
            ));

            if kind == TokenKind::StartTag
                && let Some(name) = raw_text_element(&input[range.clone()])
            {
                let body_start = range.end;
                let body_end = find_end_tag(&input[body_start..], name)
                    .map_or(input.len(), |i| body_start + i);
                if body_end > body_start {
                    tokens.push((
                        Token {
                            kind: TokenKind::RawText,
                            text: &input[body_start..body_end],
                        },
                        body_start..body_end,
                    ));
                }
                offset = body_end;
                continue 'segments;
            }
        }
        break;
    }

    tokens
}

/// Returns the lowercase element name of a start or end tag token.
pub fn tag_name(tag: &str) -> &str {
    let inner = tag.trim_start_matches('<').trim_start_matches('/');
    let end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(inner.len());
    &inner[..end]
}

fn raw_text_element(tag: &str) -> Option<&'static str> {
    let name = tag_name(tag);
    if tag.ends_with("/>") {
        return None;
    }
    RAW_TEXT_ELEMENTS
        .iter()
        .copied()
        .find(|raw| raw.eq_ignore_ascii_case(name))
}

fn find_end_tag(haystack: &str, name: &str) -> Option<usize> {
    let lower = haystack.to_ascii_lowercase();
    let needle = format!("</{name}");
    let mut from = 0;
    while let Some(i) = lower[from..].find(&needle) {
        let at = from + i;
        let after = lower.as_bytes().get(at + needle.len()).copied();
        if matches!(after, None | Some(b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')) {
            return Some(at);
        }
        from = at + needle.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(kind: TokenKind, text: &str) -> Token<'_> {
        Token { kind, text }
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_plain_text() {
        assert_eq!(lex("hello"), vec![token(TokenKind::Text, "hello")]);
    }

    #[test]
    fn lex_element() {
        let tokens = lex("<p class=\"x\">hi there</p>");
        assert_eq!(
            tokens,
            vec![
                token(TokenKind::StartTag, "<p class=\"x\">"),
                token(TokenKind::Text, "hi"),
                token(TokenKind::Whitespace, " "),
                token(TokenKind::Text, "there"),
                token(TokenKind::EndTag, "</p>"),
            ]
        );
    }

    #[test]
    fn quoted_gt_stays_inside_tag() {
        let tokens = lex("<img alt=\"a > b\" src='x>y'>");
        assert_eq!(
            tokens,
            vec![token(TokenKind::StartTag, "<img alt=\"a > b\" src='x>y'>")]
        );
    }

    #[test]
    fn lex_comment_and_doctype() {
        let tokens = lex("<!DOCTYPE html><!-- wp:paragraph -->");
        assert_eq!(
            tokens,
            vec![
                token(TokenKind::Declaration, "<!DOCTYPE html>"),
                token(TokenKind::Comment, "<!-- wp:paragraph -->"),
            ]
        );
    }

    #[test]
    fn unterminated_comment_runs_to_end() {
        let tokens = lex("a<!-- open");
        assert_eq!(
            tokens,
            vec![
                token(TokenKind::Text, "a"),
                token(TokenKind::Comment, "<!-- open"),
            ]
        );
    }

    #[test]
    fn lone_lt_is_text_like() {
        let tokens = lex("1 < 2");
        assert_eq!(
            tokens,
            vec![
                token(TokenKind::Text, "1"),
                token(TokenKind::Whitespace, " "),
                token(TokenKind::Lt, "<"),
                token(TokenKind::Whitespace, " "),
                token(TokenKind::Text, "2"),
            ]
        );
    }

    #[test]
    fn script_body_is_raw_text() {
        let tokens = lex("<script>if (a<b) { x(); }</script><p>");
        assert_eq!(
            tokens,
            vec![
                token(TokenKind::StartTag, "<script>"),
                token(TokenKind::RawText, "if (a<b) { x(); }"),
                token(TokenKind::EndTag, "</script>"),
                token(TokenKind::StartTag, "<p>"),
            ]
        );
    }

    #[test]
    fn style_end_tag_matched_case_insensitively() {
        let tokens = lex("<style>p{}</STYLE>");
        assert_eq!(
            tokens,
            vec![
                token(TokenKind::StartTag, "<style>"),
                token(TokenKind::RawText, "p{}"),
                token(TokenKind::EndTag, "</STYLE>"),
            ]
        );
    }

    #[test]
    fn nbsp_is_text() {
        let tokens = lex("a\u{a0}b");
        assert_eq!(tokens, vec![token(TokenKind::Text, "a\u{a0}b")]);
    }

    #[test]
    fn tag_name_extraction() {
        assert_eq!(tag_name("<P class=\"x\">"), "P");
        assert_eq!(tag_name("</figure >"), "figure");
        assert_eq!(tag_name("<br/>"), "br");
    }

    #[test]
    fn all_bytes_preserved_complex() {
        let input = "<!-- wp:group --><div class=\"g\">\n  <p>a &amp; b</p>\n  <pre>  x  </pre><script>1<2</script>< broken <a href='q'\n</div>";
        let tokens = lex(input);
        let reconstructed: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(input, reconstructed);
    }

    #[test]
    fn token_stream_snapshot() {
        let listing: String = lex("<!-- c --><p id=a>x &lt; y</p>")
            .iter()
            .map(|t| format!("{:?} {:?}\n", t.kind, t.text))
            .collect();
        insta::assert_snapshot!(listing, @r#"
        Comment "<!-- c -->"
        StartTag "<p id=a>"
        Text "x"
        Whitespace " "
        Text "&lt;"
        Whitespace " "
        Text "y"
        EndTag "</p>"
        "#);
    }

    #[test]
    fn spans_are_correct() {
        let input = "<p>hello <em>world</em></p>";
        for (token, span) in lex_with_spans(input) {
            assert_eq!(token.text, &input[span]);
        }
    }
}
