//! Escaping for the separators used inside list and map identities.
//!
//! | Char | Escape   |
//! |------|----------|
//! | `&`  | `&amp`   |
//! | `\|` | `&pipe`  |
//! | `;`  | `&sc`    |
//! | `=`  | `&eq`    |
//! | `[`  | `&lb`    |
//! | `]`  | `&rb`    |
//! | `<`  | `&lt`    |
//! | `>`  | `&gt`    |

const TABLE: &[(char, &str)] = &[
    ('&', "amp"),
    ('|', "pipe"),
    (';', "sc"),
    ('=', "eq"),
    ('[', "lb"),
    (']', "rb"),
    ('<', "lt"),
    ('>', "gt"),
];

/// Escape every separator character in `s`.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match TABLE.iter().find(|(ch, _)| *ch == c) {
            Some((_, name)) => {
                out.push('&');
                out.push_str(name);
            }
            None => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape`].  Unknown `&` sequences are kept as-is.
pub fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match TABLE.iter().find(|(_, name)| after.starts_with(name)) {
            Some((ch, name)) => {
                out.push(*ch);
                rest = &after[name.len()..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
