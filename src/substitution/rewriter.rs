// ============================================================
// Layer 5: Context Rewriter
// ============================================================
// Puts the replacement answer into the passage and works out
// where it ended up.
//
// Example:
//   context:     "Paris is the capital of France. Paris has 2M people."
//   answer:      "Paris" annotated at [0,5]
//   replacement: "City of Light"
//
//   1. Find every occurrence of "Paris": exact, case-sensitive
//      and on word boundaries ("Parisian" does not count).
//      The same entity often appears again unannotated.
//   2. Replace each one, left to right.
//   3. Shift every later span by the accumulated length change:
//        [0,5]   → [0,13]    (+8 chars)
//        [32,37] → [40,53]
//
// The annotated (primary) span is always part of the result.
// If the answer cannot be found at all the rewrite FAILS; an
// unmodified passage is never passed off as substituted.

use crate::domain::errors::SubstitutionFailure;
use crate::domain::span::{char_len, CharOffsets, Span};

/// One string to replace, with the spans annotated for it
#[derive(Debug, Clone, Copy)]
pub struct RewriteTarget<'a> {
    pub text:  &'a str,
    pub spans: &'a [Span],
}

impl<'a> RewriteTarget<'a> {
    pub fn new(text: &'a str, spans: &'a [Span]) -> Self {
        Self { text, spans }
    }
}

/// A rewritten passage and the char spans of the replacement in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub context: String,
    /// Every replaced occurrence, ascending
    pub spans:   Vec<Span>,
    /// Where the originally annotated answer landed
    pub primary: Span,
}

impl Rewrite {
    pub fn occurrences(&self) -> usize {
        self.spans.len()
    }
}

/// Replace every occurrence of every target with `replacement`.
///
/// The first target is the primary answer: it must be found, and its
/// first annotated span (or, without annotations, its first
/// occurrence) is reported as `Rewrite::primary`. Later targets are
/// replaced where they occur and ignored where they do not. When
/// occurrences overlap the primary one wins, then the earliest,
/// then the longest.
pub fn rewrite_all(
    context:     &str,
    targets:     &[RewriteTarget<'_>],
    replacement: &str,
) -> Result<Rewrite, SubstitutionFailure> {
    let Some(primary_target) = targets.first() else {
        return Err(SubstitutionFailure::NoAnswerInContext);
    };
    let offsets = CharOffsets::new(context);

    // ── Step 1: Pin down the primary occurrence (byte range) ─────────────────
    let primary_bytes = match primary_target.spans.first() {
        Some(&span) => {
            let found = offsets.slice(context, span);
            if found != Some(primary_target.text) || primary_target.text.is_empty() {
                return Err(SubstitutionFailure::SpanMismatch {
                    answer: primary_target.text.to_string(),
                    span,
                });
            }
            char_span_to_bytes(&offsets, context, span)
        }
        None => find_occurrences(context, primary_target.text)
            .into_iter()
            .next()
            .ok_or_else(|| SubstitutionFailure::AnswerNotInContext {
                answer: primary_target.text.to_string(),
            })?,
    };

    // ── Step 2: Collect every candidate occurrence ───────────────────────────
    let mut candidates: Vec<(usize, usize)> = Vec::new();
    for target in targets {
        if target.text.is_empty() {
            continue;
        }
        candidates.extend(find_occurrences(context, target.text));
        // Annotated spans count even where the word-boundary scan
        // would reject them, as long as they read the target text
        for &span in target.spans {
            if offsets.slice(context, span) == Some(target.text) {
                candidates.push(char_span_to_bytes(&offsets, context, span));
            }
        }
    }
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| (b.1 - b.0).cmp(&(a.1 - a.0))));
    candidates.dedup();

    let mut kept: Vec<(usize, usize)> = vec![primary_bytes];
    for cand in candidates {
        if !kept.iter().any(|k| k.0 < cand.1 && cand.0 < k.1) {
            kept.push(cand);
        }
    }
    kept.sort();

    // ── Step 3: Splice and re-measure ────────────────────────────────────────
    let replacement_chars = char_len(replacement) as isize;
    let mut out    = String::with_capacity(context.len() + kept.len() * replacement.len());
    let mut spans  = Vec::with_capacity(kept.len());
    let mut cursor = 0usize;
    let mut shift  = 0isize;
    let mut primary = None;

    for (start, end) in kept {
        out.push_str(&context[cursor..start]);
        out.push_str(replacement);
        cursor = end;

        let old_start = offsets.byte_to_char(start) as isize;
        let old_len   = char_len(&context[start..end]) as isize;
        let new_start = (old_start + shift) as usize;
        let new_span  = Span::new(new_start, new_start + replacement_chars as usize);
        shift += replacement_chars - old_len;

        if (start, end) == primary_bytes {
            primary = Some(new_span);
        }
        spans.push(new_span);
    }
    out.push_str(&context[cursor..]);

    let primary = primary.ok_or_else(|| SubstitutionFailure::AnswerNotInContext {
        answer: primary_target.text.to_string(),
    })?;

    Ok(Rewrite { context: out, spans, primary })
}

/// Byte ranges of every exact, case-sensitive, word-bounded
/// occurrence of `needle`.
///
/// A boundary is only required on a side where the needle itself
/// starts or ends with an alphanumeric char, so "$5" or "U.S." are
/// still found next to punctuation.
pub fn find_occurrences(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    let needs_left  = needle.chars().next().is_some_and(char::is_alphanumeric);
    let needs_right = needle.chars().next_back().is_some_and(char::is_alphanumeric);

    haystack
        .match_indices(needle)
        .map(|(start, m)| (start, start + m.len()))
        .filter(|&(start, end)| {
            let before_ok = !needs_left
                || !haystack[..start].chars().next_back().is_some_and(char::is_alphanumeric);
            let after_ok = !needs_right
                || !haystack[end..].chars().next().is_some_and(char::is_alphanumeric);
            before_ok && after_ok
        })
        .collect()
}

fn char_span_to_bytes(offsets: &CharOffsets, text: &str, span: Span) -> (usize, usize) {
    let start = offsets.char_to_byte(text, span.start).unwrap_or(text.len());
    let end   = offsets.char_to_byte(text, span.end).unwrap_or(text.len());
    (start, end)
}
