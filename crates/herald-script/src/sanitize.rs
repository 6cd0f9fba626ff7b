//! Mention escaping for rendered script output.
//!
//! A script could mass-mention by string concatenation without ever
//! calling the capability functions, so the rendered text is filtered
//! after execution: raw `@everyone`/`@here` tokens and `<@&id>` role
//! mentions are neutralized unless the corresponding sticky flag or
//! mention-list entry was set during execution. Neutralizing inserts a
//! zero-width space so the text still reads the same.

use herald_core::RoleId;

const ZWSP: char = '\u{200b}';

/// Escape unauthorized mention sequences in rendered output.
pub fn escape_mentions(
    input: &str,
    allow_everyone: bool,
    allow_here: bool,
    allowed_roles: &[RoleId],
) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let rest = &input[i..];

        if rest.starts_with("@everyone") {
            if allow_everyone {
                out.push_str("@everyone");
            } else {
                out.push('@');
                out.push(ZWSP);
                out.push_str("everyone");
            }
            i += "@everyone".len();
            continue;
        }

        if rest.starts_with("@here") {
            if allow_here {
                out.push_str("@here");
            } else {
                out.push('@');
                out.push(ZWSP);
                out.push_str("here");
            }
            i += "@here".len();
            continue;
        }

        if rest.starts_with("<@&") {
            if let Some((id, token_len)) = parse_role_mention(rest) {
                if allowed_roles.contains(&id) {
                    out.push_str(&rest[..token_len]);
                } else {
                    out.push_str("<@");
                    out.push(ZWSP);
                    out.push_str(&rest[2..token_len]);
                }
                i += token_len;
                continue;
            }
        }

        // Matches above all start with ASCII, so advancing by one full
        // char keeps us on a boundary.
        let ch = rest.chars().next().unwrap_or('\u{fffd}');
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// Parse a leading `<@&digits>` token, returning the role id and the
/// token's byte length.
fn parse_role_mention(s: &str) -> Option<(RoleId, usize)> {
    let body = s.strip_prefix("<@&")?;
    let end = body.find('>')?;
    let digits = &body[..end];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = digits.parse::<u64>().ok()?;
    Some((RoleId::new(id), 3 + end + 1))
}
