//! Locates the JSON payload inside a model reply.
//!
//! Rule, in order:
//! 1. a fence labeled exactly `json` (```` ```json ````): the content of that
//!    fence. Longer labels such as `jsonc` or `json5` do not count;
//! 2. otherwise the first fence of any kind, minus its label line if it has one;
//! 3. otherwise the reply text untouched.
//!
//! A fence with no closing marker runs to the end of the text.

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

pub fn extract_json_block(text: &str) -> &str {
    let labeled = text.match_indices(JSON_FENCE).find_map(|(start, _)| {
        let rest = &text[start + JSON_FENCE.len()..];
        ends_label(rest).then_some(rest)
    });
    if let Some(rest) = labeled {
        return fence_body(rest);
    }

    if let Some(start) = text.find(FENCE) {
        let rest = skip_label(&text[start + FENCE.len()..]);
        return fence_body(rest);
    }

    text
}

/// True when the `json` label is not the prefix of a longer label.
fn ends_label(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) => !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')),
    }
}

fn fence_body(rest: &str) -> &str {
    match rest.find(FENCE) {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// Drops an info string such as `JSON` or `javascript` after an opening fence.
fn skip_label(rest: &str) -> &str {
    let (first_line, remainder) = match rest.split_once('\n') {
        Some(parts) => parts,
        None => return rest,
    };

    let is_label = first_line
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'));

    if is_label {
        remainder
    } else {
        rest
    }
}
