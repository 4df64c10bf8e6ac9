//! Natural ("human") ordering of file names.
//!
//! Names are split into alternating digit and non-digit runs. Digit runs
//! compare by numeric value, so `page_2` sorts before `page_10`; other runs
//! compare byte-wise, so upper case sorts before lower case (`B.png` before
//! `a.png`). Ties fall back to fewer leading zeros first and finally to plain
//! byte order, which keeps the ordering total.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(prev) = in_digits {
        out.push(make_chunk(&s[start..], prev));
    }
    out
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Digits(s)
    } else {
        Chunk::Text(s)
    }
}

/// Compare two digit runs by value without parsing (no overflow on long runs).
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
}


/// Natural comparison of two names.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ca = chunks(a);
    let cb = chunks(b);

    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            // Numbers sort before words at the same position.
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    ca.len().cmp(&cb.len()).then_with(|| {
        // Equal by value: "7" before "007", then exact bytes.
        for (x, y) in ca.iter().zip(cb.iter()) {
            if let (Chunk::Digits(x), Chunk::Digits(y)) = (x, y) {
                let ord = x.len().cmp(&y.len());
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
        a.cmp(b)
    })
}
