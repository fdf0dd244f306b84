//! Comment masking
//!
//! Strips block and line comments while preserving exact byte length, so
//! every offset computed against the masked text is also valid against the
//! original input.

/// Replace every character inside `/* ... */` and `-- ...` comments with
/// spaces, including the comment delimiters themselves.
///
/// The output has the same byte length as the input: a multi-byte character
/// inside a comment becomes as many spaces as its UTF-8 encoding occupies.
/// Block comments are non-greedy and may span lines; an unterminated block
/// comment masks everything to the end of the input. Line comments stop at
/// the newline, which is kept as-is.
pub fn mask_comments(sql: &str) -> String {
    enum State {
        Normal,
        Block,
        Line,
    }

    let mut out = String::with_capacity(sql.len());
    let mut state = State::Normal;
    let mut chars = sql.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);
        match state {
            State::Normal => {
                if ch == '/' && next == Some('*') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Block;
                } else if ch == '-' && next == Some('-') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Line;
                } else {
                    out.push(ch);
                }
            }
            State::Block => {
                if ch == '*' && next == Some('/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Normal;
                } else {
                    push_spaces(&mut out, ch);
                }
            }
            State::Line => {
                if ch == '\n' {
                    out.push('\n');
                    state = State::Normal;
                } else {
                    push_spaces(&mut out, ch);
                }
            }
        }
    }

    out
}

/// One space per byte of the masked character keeps byte offsets aligned.
fn push_spaces(out: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        out.push(' ');
    }
}
