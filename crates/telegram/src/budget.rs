//! Fit post text plus signature under the platform's length ceilings.
//!
//! Plain messages and media captions have different ceilings. Overflow is
//! cut at a word boundary and handed back as a deferred tail; the head
//! always reserves room for the signature and the continuation marker, so
//! it never exceeds the ceiling.

/// Telegram message size limit (plain text).
pub const MAX_TEXT_LEN: usize = 4096;

/// Telegram caption size limit for media sends.
pub const MAX_CAPTION_LEN: usize = 1024;

/// Appended to a truncated head; the remainder follows as a continuation.
pub const CONTINUATION_MARKER: &str = "⬇️";

/// Separates the body from the signature.
const SEPARATOR: &str = "\n\n";

/// A budgeted message: the piece sent now and the overflow deferred for
/// later delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budgeted {
    pub head: String,
    pub deferred_tail: Option<String>,
}

impl Budgeted {
    fn whole(head: String) -> Self {
        Self {
            head,
            deferred_tail: None,
        }
    }
}

/// Budget `text` plus `signature` against the applicable ceiling.
///
/// All arithmetic is in characters, never bytes, so multi-byte input cannot
/// split a code point. An empty text yields the signature alone; an empty
/// signature yields the bare text.
#[must_use]
pub fn budget(text: &str, signature: &str, captioned: bool) -> Budgeted {
    let ceiling = if captioned {
        MAX_CAPTION_LEN
    } else {
        MAX_TEXT_LEN
    };

    if text.is_empty() {
        return Budgeted::whole(signature.to_string());
    }

    let sig_block = if signature.is_empty() {
        String::new()
    } else {
        format!("{SEPARATOR}{signature}")
    };

    if char_len(text) + char_len(&sig_block) <= ceiling {
        return Budgeted::whole(format!("{text}{sig_block}"));
    }

    // Reserve room for " ", the marker, and the signature block before
    // cutting the body.
    let reserved = 1 + char_len(CONTINUATION_MARKER) + char_len(&sig_block);
    let keep = ceiling.saturating_sub(reserved).max(1);

    let mut cut = byte_offset(text, keep);
    let slice = &text[..cut];
    if let Some(space) = slice.rfind('\n').or_else(|| slice.rfind(' '))
        && space > 0
    {
        cut = space;
    }

    let head_body = &text[..cut];
    let tail = text[cut..].trim();
    let head = format!("{head_body} {CONTINUATION_MARKER}{sig_block}");

    Budgeted {
        head,
        deferred_tail: (!tail.is_empty()).then(|| tail.to_string()),
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `n`-th character (or the end of the string).
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map_or(text.len(), |(offset, _)| offset)
}
