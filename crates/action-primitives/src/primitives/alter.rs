//! Alter primitive - Pattern rewrite of the body's markup
//!
//! Sharp edge: the pattern runs over serialized markup, not over the tree, so
//! it can match across tag boundaries and leave the body structurally
//! different from what the author intended.

use dompatch_document::Document;
use fancy_regex::{Captures, Regex};
use tracing::debug;

use crate::errors::ActionError;

/// Replace every match of `old_value` in the body markup with `new_value`,
/// then re-parse the result into the body.
///
/// The pattern accepts lookaround and backreferences. Replacement templates
/// use the same tokens as ECMAScript `String.prototype.replace`:
///
/// | Token      | Inserts                                        |
/// |------------|------------------------------------------------|
/// | `$$`       | a literal `$`                                  |
/// | `$&`       | the whole match                                |
/// | `` $` ``   | the markup before the match                    |
/// | `$'`       | the markup after the match                     |
/// | `$n` `$nn` | capture group `n` (longest existing group wins)|
/// | `$<name>`  | named capture group                            |
///
/// Anything else after `$` is kept literally. Returns the number of matches.
pub fn execute_alter<D: Document>(
    document: &mut D,
    old_value: &str,
    new_value: &str,
) -> Result<usize, ActionError> {
    let pattern = Regex::new(old_value).map_err(|err| invalid(old_value, err))?;

    let markup = document.body_markup()?;
    let mut rewritten = String::with_capacity(markup.len());
    let mut last = 0;
    let mut matches = 0;

    for captures in pattern.captures_iter(&markup) {
        let captures = captures.map_err(|err| invalid(old_value, err))?;
        let Some(whole) = captures.get(0) else {
            continue;
        };
        rewritten.push_str(&markup[last..whole.start()]);
        expand(&pattern, &captures, &markup, new_value, &mut rewritten);
        last = whole.end();
        matches += 1;
    }
    rewritten.push_str(&markup[last..]);
    debug!(pattern = %old_value, matches, "Executing alter primitive");

    document.set_body_markup(&rewritten)?;
    Ok(matches)
}

fn invalid(pattern: &str, err: fancy_regex::Error) -> ActionError {
    ActionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    }
}

/// Append `template` to `out`, substituting `$` tokens from one match.
fn expand(
    pattern: &Regex,
    captures: &Captures<'_>,
    haystack: &str,
    template: &str,
    out: &mut String,
) {
    let (start, end) = match captures.get(0) {
        Some(whole) => (whole.start(), whole.end()),
        None => return,
    };
    // group 0 is the whole match
    let groups = pattern.captures_len().saturating_sub(1);
    let named = pattern.capture_names().any(|name| name.is_some());

    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let Some(offset) = template[i..].find('$') else {
            out.push_str(&template[i..]);
            break;
        };
        out.push_str(&template[i..i + offset]);
        i += offset;

        match bytes.get(i + 1).copied() {
            Some(b'$') => {
                out.push('$');
                i += 2;
            }
            Some(b'&') => {
                out.push_str(&haystack[start..end]);
                i += 2;
            }
            Some(b'`') => {
                out.push_str(&haystack[..start]);
                i += 2;
            }
            Some(b'\'') => {
                out.push_str(&haystack[end..]);
                i += 2;
            }
            Some(first @ b'0'..=b'9') => {
                let one = usize::from(first - b'0');
                let two = bytes
                    .get(i + 2)
                    .filter(|b| b.is_ascii_digit())
                    .map(|second| one * 10 + usize::from(second - b'0'));
                match two {
                    Some(index) if (1..=groups).contains(&index) => {
                        push_group(captures.get(index).map(|m| m.as_str()), out);
                        i += 3;
                    }
                    _ if (1..=groups).contains(&one) => {
                        push_group(captures.get(one).map(|m| m.as_str()), out);
                        i += 2;
                    }
                    _ => {
                        out.push('$');
                        i += 1;
                    }
                }
            }
            Some(b'<') if named => match template[i + 2..].find('>') {
                Some(close) => {
                    let name = &template[i + 2..i + 2 + close];
                    push_group(captures.name(name).map(|m| m.as_str()), out);
                    i += close + 3;
                }
                None => {
                    out.push('$');
                    i += 1;
                }
            },
            _ => {
                out.push('$');
                i += 1;
            }
        }
    }
}

/// Unmatched groups expand to nothing.
fn push_group(value: Option<&str>, out: &mut String) {
    if let Some(value) = value {
        out.push_str(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(pattern: &str, haystack: &str, template: &str) -> String {
        let pattern = Regex::new(pattern).unwrap();
        let captures = pattern.captures(haystack).unwrap().unwrap();
        let mut out = String::new();
        expand(&pattern, &captures, haystack, template, &mut out);
        out
    }

    #[test]
    fn group_reference_stops_at_the_longest_existing_group() {
        assert_eq!(render("(f)oo", "foo", "$1a"), "fa");
        assert_eq!(render("(f)oo", "foo", "$12"), "f2");
        assert_eq!(render("(f)(o)o", "foo", "$2$1"), "of");
    }

    #[test]
    fn special_tokens() {
        assert_eq!(render("b", "abc", "[$&]"), "[b]");
        assert_eq!(render("b", "abc", "$`|$'"), "a|c");
        assert_eq!(render("b", "abc", "$$1"), "$1");
    }

    #[test]
    fn unknown_references_stay_literal() {
        assert_eq!(render("(f)oo", "foo", "$3"), "$3");
        assert_eq!(render("(f)oo", "foo", "$0"), "$0");
        assert_eq!(render("foo", "foo", "$<x>"), "$<x>");
        assert_eq!(render("foo", "foo", "cost: $"), "cost: $");
    }

    #[test]
    fn named_and_unmatched_groups() {
        assert_eq!(render("(?<word>f)oo", "foo", "$<word>!"), "f!");
        assert_eq!(render("(?<word>f)oo", "foo", "$<other>!"), "!");
        assert_eq!(render("(x)?foo", "foo", "[$1]"), "[]");
    }
}
