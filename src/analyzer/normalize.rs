use std::sync::LazyLock;

use regex::Regex;

static PRE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<pre><code.*?</pre>").unwrap());
static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<code.*?</code>").unwrap());
static DOWNLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<i class="fa fa-download.*?</li>"#).unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const PARAGRAPH_END: &str = "</p>";

/// Remove markup that must never reach the classifier: code that is already
/// formatted (`<pre><code>` blocks and inline `<code>`) and attachment download
/// widgets. Every pattern is non-greedy and crosses line breaks; an opener
/// without a closer is left alone.
pub fn strip_known_noise(markup: &str) -> String {
    let text = PRE_CODE_RE.replace_all(markup, "");
    let text = INLINE_CODE_RE.replace_all(&text, "");
    DOWNLOAD_RE.replace_all(&text, "").into_owned()
}

/// Split markup on paragraph closers. The chunk after the last `</p>` is kept,
/// even when it is empty.
pub fn segment_into_paragraphs(markup: &str) -> impl Iterator<Item = &str> {
    markup.split(PARAGRAPH_END)
}

/// Reduce one paragraph chunk to plain text: newlines dropped, tags removed,
/// whitespace runs collapsed, ends trimmed.
pub fn clean_paragraph(raw: &str) -> String {
    // Newlines go first so a tag broken across lines is still one `<...>` span.
    let joined = raw.replace('\n', "");
    let untagged = TAG_RE.replace_all(&joined, "");
    WS_RE.replace_all(&untagged, " ").trim().to_string()
}

/// Lazy, order-preserving sequence of the non-empty cleaned paragraphs of a post.
pub fn paragraphs(markup: &str) -> Paragraphs {
    Paragraphs {
        markup: strip_known_noise(markup),
        pos: Some(0),
    }
}

/// Iterator returned by [`paragraphs`]. Owns the noise-stripped markup and
/// cleans one chunk per `next` call.
pub struct Paragraphs {
    markup: String,
    pos: Option<usize>,
}

impl Iterator for Paragraphs {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let start = self.pos?;
            let chunk = segment_into_paragraphs(&self.markup[start..]).next().unwrap_or("");
            let end = start + chunk.len();
            self.pos = (end < self.markup.len()).then(|| end + PARAGRAPH_END.len());

            let cleaned = clean_paragraph(chunk);
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(markup: &str) -> Vec<String> {
        paragraphs(markup).collect()
    }

    #[test]
    fn strips_pre_code_block() {
        let out = strip_known_noise("<p>a</p><pre><code class=\"language-rust\">fn main() {}\n</code></pre><p>b</p>");
        assert_eq!(out, "<p>a</p><p>b</p>");
    }

    #[test]
    fn pre_code_is_non_greedy() {
        let md = "<pre><code>one</code></pre><p>keep me</p><pre><code>two</code></pre>";
        assert_eq!(strip_known_noise(md), "<p>keep me</p>");
    }

    #[test]
    fn strips_inline_code_with_attributes() {
        let out = strip_known_noise("<p>call <code class=\"x\">foo()</code> then <code>bar()</code> done</p>");
        assert_eq!(out, "<p>call  then  done</p>");
    }

    #[test]
    fn inline_code_spans_lines() {
        let out = strip_known_noise("<p>x <code>a\nb\nc</code> y</p>");
        assert_eq!(out, "<p>x  y</p>");
    }

    #[test]
    fn unclosed_code_left_alone() {
        let md = "<p>before <code>never closed</p>";
        assert_eq!(strip_known_noise(md), md);
    }

    #[test]
    fn download_widget_keeps_siblings() {
        let md = concat!(
            "<ul><li><a href=\"/a\">first</a></li>",
            "<li><i class=\"fa fa-download\"></i> <a href=\"/f.zip\">f.zip</a> (2 KB)</li>",
            "<li>last</li></ul>",
        );
        let out = strip_known_noise(md);
        assert_eq!(out, "<ul><li><a href=\"/a\">first</a></li><li><li>last</li></ul>");
        assert!(!out.contains("f.zip"));
    }

    #[test]
    fn segment_keeps_trailing_chunk() {
        let chunks: Vec<_> = segment_into_paragraphs("<p>a</p><p>b</p>").collect();
        assert_eq!(chunks, vec!["<p>a", "<p>b", ""]);
    }

    #[test]
    fn segment_without_paragraphs() {
        let chunks: Vec<_> = segment_into_paragraphs("plain text").collect();
        assert_eq!(chunks, vec!["plain text"]);
    }

    #[test]
    fn clean_removes_tags_and_whitespace() {
        let raw = "\n<p>Hello   <strong>world</strong>,\n\t how  are <a href=\"#\">you</a>? ";
        assert_eq!(clean_paragraph(raw), "Hello world, how are you?");
    }

    #[test]
    fn clean_joins_lines_without_space() {
        assert_eq!(clean_paragraph("<p>foo\nbar</p>"), "foobar");
    }

    #[test]
    fn angle_brackets_across_lines_form_one_span() {
        // Escaped comparisons, as rendered forum HTML emits them, survive.
        assert_eq!(
            clean_paragraph("if (a &lt; b)\n{ c = d &gt; e; }"),
            "if (a &lt; b){ c = d &gt; e; }"
        );
        // Raw `<` and `>` on different lines are removed as one tag.
        assert_eq!(clean_paragraph("if (a < b)\n{ c = d > e; }"), "if (a e; }");
        assert_eq!(clean_paragraph("<a\nhref=\"x\">link</a>"), "link");
    }

    #[test]
    fn clean_is_idempotent() {
        let samples = [
            "<p>Hello   <em>there</em>\n friend</p>",
            "<a\nhref=\"x\">link</a> text",
            "if (a < b && c > d) { x++; }",
            "   ",
            "plain",
            "<<b>> nested",
        ];
        for s in samples {
            let once = clean_paragraph(s);
            assert_eq!(clean_paragraph(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn no_paragraph_markup_yields_at_most_one() {
        for md in ["", "   \n ", "just text", "<div>block</div>", "<br/>"] {
            assert!(collect(md).len() <= 1, "{:?}", md);
        }
    }

    #[test]
    fn empty_paragraphs_dropped() {
        let md = "<p>one</p>\n<p> </p>\n<p><br></p>\n<p>two</p>\n";
        assert_eq!(collect(md), vec!["one", "two"]);
    }

    #[test]
    fn code_block_between_prose() {
        let md = "<p>Here is my attempt:</p>\n<pre><code>for (int i = 0; i &lt; n; i++) {\n  sum += i;\n}\n</code></pre>\n<p>Why does it fail?</p>";
        let paras = collect(md);
        assert_eq!(paras, vec!["Here is my attempt:", "Why does it fail?"]);
        assert!(paras.iter().all(|p| !p.contains("sum")));
    }

    #[test]
    fn order_preserved() {
        let md = "<p>1</p><p>2</p><p>3</p>";
        assert_eq!(collect(md), vec!["1", "2", "3"]);
    }

    #[test]
    fn fresh_per_call() {
        let md = "<p>a</p><p>b</p>";
        assert_eq!(collect(md), collect(md));
    }

    #[test]
    fn forum_fixture() {
        let md = std::fs::read_to_string("tests/fixtures/formatted_post.html").unwrap();
        let paras = collect(&md);
        assert_eq!(paras.len(), 3, "got: {:?}", paras);
        assert!(paras.iter().all(|p| !p.contains("Console.WriteLine")));
        assert!(paras.iter().all(|p| !p.contains("projekt.zip")));
        assert!(paras.iter().any(|p| p.contains("Other attachment")));
    }
}
