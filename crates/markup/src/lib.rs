//! Convert source-platform rich text into Telegram-compatible HTML.
//!
//! Telegram accepts a small HTML subset: `<b>`, `<i>`, `<u>`, `<s>`,
//! `<code>`, `<a href="">`. The converter is pure: no I/O, no clock (the
//! caller supplies `now` for relative timestamps), and it is total over any
//! input string.

mod timestamp;

use std::sync::LazyLock;

use {
    chrono::{DateTime, Utc},
    regex::Regex,
};

/// Compile a fixed pattern. Every pattern in this crate is a literal, so
/// compilation cannot fail at runtime.
fn pattern(re: &str) -> Regex {
    #[allow(clippy::expect_used)]
    Regex::new(re).expect("static pattern")
}

static CUSTOM_EMOJI: LazyLock<Regex> =
    LazyLock::new(|| pattern(r":[A-Za-z0-9_]*[A-Za-z_][A-Za-z0-9_]*:"));
static EVERYONE_MENTION: LazyLock<Regex> = LazyLock::new(|| pattern(r"@here|@everyone"));
static BRACKETED_URL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"&lt;((?:https?|ftp)://\S+?)&gt;"));
static LINE_LEADING_SPACES: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?m)^ +"));
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| pattern(r" {2,}"));
static LINK: LazyLock<Regex> = LazyLock::new(|| pattern(r"https?://\S+"));

/// Convert raw source markup to Telegram HTML.
///
/// `mentions` holds the display names that appear as `@name` in the text;
/// each occurrence becomes an underline span. `now` anchors relative
/// timestamp tags. Conversion order matters: HTML escaping first (the token
/// patterns below match the escaped `&lt;…&gt;` forms), token expansion
/// next, emphasis markers last, whitespace cleanup at the end.
#[must_use]
pub fn normalize(text: &str, mentions: &[String], now: DateTime<Utc>) -> String {
    let text = escape_html(text);
    let text = underline_mentions(&text, mentions);
    let text = timestamp::expand_tags(&text, now);
    let text = strip_noise(&text);
    let text = convert_emphasis(&text);
    tidy_whitespace(&text)
}

/// Whether the text carries at least one plain URL. Used to decide
/// link-preview suppression on the target platform.
#[must_use]
pub fn has_links(text: &str) -> bool {
    LINK.is_match(text)
}

/// Escape HTML special characters.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replace `@displayName` occurrences (word-boundary aware) with underline spans.
fn underline_mentions(text: &str, mentions: &[String]) -> String {
    let mut text = text.to_string();
    for name in mentions {
        if name.is_empty() {
            continue;
        }
        let escaped = escape_html(name);
        let Ok(re) = Regex::new(&format!(r"(^|\s)@({})\b", regex::escape(&escaped))) else {
            continue;
        };
        text = re.replace_all(&text, "${1}<u>${2}</u>").into_owned();
    }
    text
}

/// Strip tokens that have no Telegram rendering: custom-emoji names, blanket
/// mentions, and the angle brackets wrapping bare URLs.
fn strip_noise(text: &str) -> String {
    let text = CUSTOM_EMOJI.replace_all(text, "");
    let text = EVERYONE_MENTION.replace_all(&text, "");
    BRACKETED_URL.replace_all(&text, "${1}").into_owned()
}

/// Trim leading spaces per line and collapse interior space runs.
fn tidy_whitespace(text: &str) -> String {
    let text = LINE_LEADING_SPACES.replace_all(text, "");
    SPACE_RUNS.replace_all(&text, " ").into_owned()
}

// ── Emphasis markers ─────────────────────────────────────────────────────────

type CharStream<'a> = std::iter::Peekable<std::str::Chars<'a>>;

/// Convert emphasis markers, longest match first: `***`→bold-italic,
/// `**`→bold, `__`→underline, `*`/`_`→italic, `~~`→strikethrough, backtick
/// runs→code spans. A backslash before `*`, `_` or `~` consumes the escape
/// and emits the marker literally; doubled backslashes collapse to one.
/// Unclosed markers stay literal.
fn convert_emphasis(text: &str) -> String {
    let mut chars = text.chars().peekable();
    let mut out = String::with_capacity(text.len());

    while let Some(&ch) = chars.peek() {
        match ch {
            '\\' => {
                chars.next();
                match chars.peek().copied() {
                    Some('\\') => {
                        chars.next();
                        out.push('\\');
                    },
                    Some(next @ ('*' | '_' | '~')) => {
                        chars.next();
                        out.push(next);
                    },
                    // An escaped backtick keeps both characters but never
                    // opens a code span.
                    Some('`') => {
                        chars.next();
                        out.push('\\');
                        out.push('`');
                    },
                    _ => out.push('\\'),
                }
            },
            '*' | '_' => convert_run(&mut chars, &mut out, ch),
            '~' => convert_tilde(&mut chars, &mut out),
            '`' => convert_code(&mut chars, &mut out),
            _ => {
                chars.next();
                out.push(ch);
            },
        }
    }

    out
}

fn convert_run(chars: &mut CharStream<'_>, out: &mut String, marker: char) {
    let marker_len = if marker == '*' {
        if peek_n(chars, 3) == "***" {
            3
        } else if peek_n(chars, 2) == "**" {
            2
        } else {
            1
        }
    } else if peek_n(chars, 2) == "__" {
        2
    } else {
        1
    };
    for _ in 0..marker_len {
        chars.next();
    }

    let delim: String = std::iter::repeat_n(marker, marker_len).collect();
    let (content, closed) = collect_until(chars, &delim);
    if !closed {
        out.push_str(&delim);
        out.push_str(&convert_emphasis(&content));
        return;
    }

    let inner = convert_emphasis(&content);
    let (open, close) = match (marker, marker_len) {
        ('*', 3) => ("<b><i>", "</i></b>"),
        ('*', 2) => ("<b>", "</b>"),
        ('_', 2) => ("<u>", "</u>"),
        _ => ("<i>", "</i>"),
    };
    out.push_str(open);
    out.push_str(&inner);
    out.push_str(close);
}

fn convert_tilde(chars: &mut CharStream<'_>, out: &mut String) {
    if peek_n(chars, 2) != "~~" {
        chars.next();
        out.push('~');
        return;
    }
    chars.next();
    chars.next();
    let (content, closed) = collect_until(chars, "~~");
    if closed {
        out.push_str("<s>");
        out.push_str(&convert_emphasis(&content));
        out.push_str("</s>");
    } else {
        out.push_str("~~");
        out.push_str(&convert_emphasis(&content));
    }
}

fn convert_code(chars: &mut CharStream<'_>, out: &mut String) {
    let mut fence = String::new();
    while chars.peek() == Some(&'`') {
        chars.next();
        fence.push('`');
    }
    let (content, closed) = collect_until(chars, &fence);
    if closed {
        // Code content stays verbatim; markers inside a span are literal.
        out.push_str("<code>");
        out.push_str(&content);
        out.push_str("</code>");
    } else {
        out.push_str(&fence);
        out.push_str(&convert_emphasis(&content));
    }
}

/// Consume characters until `delim` occurs. Returns the collected content and
/// whether the delimiter was found (and consumed).
fn collect_until(chars: &mut CharStream<'_>, delim: &str) -> (String, bool) {
    let delim_len = delim.chars().count();
    let mut content = String::new();
    loop {
        if chars.peek().is_none() {
            return (content, false);
        }
        if peek_n(chars, delim_len) == delim {
            for _ in 0..delim_len {
                chars.next();
            }
            return (content, true);
        }
        let Some(c) = chars.next() else {
            return (content, false);
        };
        content.push(c);
    }
}

/// Peek at the next `n` characters without consuming them.
fn peek_n(chars: &mut CharStream<'_>, n: usize) -> String {
    chars.clone().take(n).collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {chrono::TimeZone, rstest::rstest};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn convert(text: &str) -> String {
        normalize(text, &[], at(1_719_763_200))
    }

    #[rstest]
    #[case("**bold**", "<b>bold</b>")]
    #[case("*italic*", "<i>italic</i>")]
    #[case("_italic_", "<i>italic</i>")]
    #[case("__underline__", "<u>underline</u>")]
    #[case("***both***", "<b><i>both</i></b>")]
    #[case("~~old~~", "<s>old</s>")]
    #[case("`code`", "<code>code</code>")]
    #[case("``raw `tick` ``", "<code>raw `tick` </code>")]
    #[case("**a *b* c**", "<b>a <i>b</i> c</b>")]
    #[case("<script>alert(1)</script>", "&lt;script&gt;alert(1)&lt;/script&gt;")]
    #[case("a & b", "a &amp; b")]
    fn emphasis_and_escaping(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[rstest]
    #[case(r"\*literal\*", "*literal*")]
    #[case(r"\_literal\_", "_literal_")]
    #[case(r"a \\ b", r"a \ b")]
    #[case("**unclosed", "**unclosed")]
    #[case("`unclosed", "`unclosed")]
    #[case("~not struck~", "~not struck~")]
    fn escapes_and_unclosed_markers(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[test]
    fn mention_becomes_underline() {
        let out = normalize(
            "ping @Alice and @Bob!",
            &["Alice".into(), "Bob".into()],
            at(0),
        );
        assert_eq!(out, "ping <u>Alice</u> and <u>Bob</u>!");
    }

    #[test]
    fn mention_requires_word_boundary() {
        let out = normalize("mail@Alice.example stays", &["Alice".into()], at(0));
        assert_eq!(out, "mail@Alice.example stays");
    }

    #[rstest]
    #[case("say :custom_emoji: now", "say now")]
    #[case("hi @everyone and @here", "hi and ")]
    #[case("<https://example.com/a?x=1>", "https://example.com/a?x=1")]
    fn noise_is_stripped(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert(input), expected);
    }

    #[test]
    fn clock_text_survives_emoji_stripping() {
        assert_eq!(convert("meet at 4:30:25 PM"), "meet at 4:30:25 PM");
    }

    #[rstest]
    #[case("<t:1719763200:t>", "4:00 PM")]
    #[case("<t:1719763200:T>", "4:00:00 PM")]
    #[case("<t:1719763200:d>", "30/06/2024")]
    #[case("<t:1719763200:D>", "June 30, 2024")]
    #[case("<t:1719763200:f>", "June 30, 2024 at 4:00 PM")]
    #[case("<t:1719763200:F>", "Sunday, June 30, 2024 at 4:00 PM")]
    #[case("<t:1719763200>", "June 30, 2024 at 4:00 PM")]
    #[case("<t:1719763200:x>", "6/30/2024, 4:00:00 PM")]
    fn timestamp_tags_render(#[case] input: &str, #[case] expected: &str) {
        // `now` two days past the tag keeps relative output deterministic.
        let out = normalize(input, &[], at(1_719_763_200 + 2 * 86_400));
        assert_eq!(out, expected);
    }

    #[rstest]
    #[case(2 * 86_400, "2 day(s) ago")]
    #[case(3 * 3_600, "3 hour(s) ago")]
    #[case(5 * 60, "5 minute(s) ago")]
    #[case(-2 * 86_400, "2 day(s) from now")]
    #[case(-90 * 60, "1 hour(s) from now")]
    fn relative_timestamps(#[case] offset_secs: i64, #[case] expected: &str) {
        let out = normalize("<t:1719763200:R>", &[], at(1_719_763_200 + offset_secs));
        assert_eq!(out, expected);
    }

    #[test]
    fn whitespace_is_tidied() {
        assert_eq!(convert("  leading\nspread   out"), "leading\nspread out");
    }

    #[test]
    fn conversion_is_deterministic() {
        let input = "**a** _b_ :emoji: <https://x.example> @everyone  spaced";
        assert_eq!(convert(input), convert(input));
    }

    #[test]
    fn never_panics_on_marker_soup() {
        for input in ["***", "``` `` `", r"\\\*~~__**", "~~~", "__*_*__", "\\"] {
            let _ = convert(input);
        }
    }

    #[rstest]
    #[case("no links here", false)]
    #[case("see https://example.com", true)]
    #[case("see http://example.com", true)]
    fn link_detection(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(has_links(input), expected);
    }
}
