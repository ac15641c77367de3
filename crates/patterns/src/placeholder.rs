//! Rewrites pattern-only syntax into identifiers the target grammar accepts.

/// Prefix given to metavariable placeholders, e.g. `$X` becomes `__mv_X`.
pub const METAVAR_PREFIX: &str = "__mv_";
/// Identifier standing for `...` outside string literals.
pub const ELLIPSIS: &str = "__ellipsis__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderError {
    /// `$` not followed by an uppercase metavariable name.
    InvalidMetavariable { offset: usize },
}

/// Replaces `$NAME` and `...` outside of string literals.
///
/// String literals are copied untouched so that `"..."` still reaches the
/// parser as a string and `"$X"` stays a literal.
pub fn rewrite(text: &str) -> Result<String, PlaceholderError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut i = 0;
    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            '"' | '\'' | '`' => {
                let end = string_end(&chars, i);
                let stop = chars.get(end).map_or(text.len(), |(o, _)| *o);
                out.push_str(&text[offset..stop]);
                i = end;
            }
            '$' => {
                let mut j = i + 1;
                while j < chars.len() && is_metavar_char(chars[j].1) {
                    j += 1;
                }
                let name: String = chars[i + 1..j].iter().map(|(_, c)| *c).collect();
                if !valid_name(&name) {
                    return Err(PlaceholderError::InvalidMetavariable { offset });
                }
                out.push_str(METAVAR_PREFIX);
                out.push_str(&name);
                i = j;
            }
            '.' if text[offset..].starts_with("...") => {
                out.push_str(ELLIPSIS);
                i += 3;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    Ok(out)
}

fn is_metavar_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'
}

fn valid_name(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase() || c == '_')
}

/// Index one past the closing quote of the literal opening at `start`.
/// Triple quotes are honoured; an unterminated literal runs to the end.
fn string_end(chars: &[(usize, char)], start: usize) -> usize {
    let quote = chars[start].1;
    let triple = chars.len() >= start + 3 && chars[start + 1].1 == quote && chars[start + 2].1 == quote;
    let width = if triple { 3 } else { 1 };
    let mut i = start + width;
    while i < chars.len() {
        let c = chars[i].1;
        if c == '\\' {
            i += 2;
            continue;
        }
        if c == quote {
            if !triple {
                return i + 1;
            }
            if i + 2 < chars.len() && chars[i + 1].1 == quote && chars[i + 2].1 == quote {
                return i + 3;
            }
        }
        i += 1;
    }
    chars.len()
}
