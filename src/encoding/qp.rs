//! Quoted-printable (RFC 2045 §6.7).

const MAX_LINE: usize = 76;
const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Encode bytes. `\n` and `\r\n` are kept as hard line breaks (written as
/// `\n`); every other control byte, `=` and non-ASCII byte is escaped.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() + data.len() / 8);
    let mut line_len = 0usize;
    let mut i = 0;

    while i < data.len() {
        let b = data[i];

        let hard_break = b == b'\n' || (b == b'\r' && data.get(i + 1) == Some(&b'\n'));
        if hard_break {
            // Trailing whitespace before a line break must be escaped.
            escape_trailing_whitespace(&mut out);
            out.push('\n');
            line_len = 0;
            i += if b == b'\r' { 2 } else { 1 };
            continue;
        }

        let literal = ((b'!'..=b'~').contains(&b) && b != b'=') || b == b' ' || b == b'\t';
        let width = if literal { 1 } else { 3 };
        if line_len + width > MAX_LINE - 1 {
            out.push_str("=\n");
            line_len = 0;
        }
        if literal {
            out.push(b as char);
        } else {
            push_escaped(&mut out, b);
        }
        line_len += width;
        i += 1;
    }

    escape_trailing_whitespace(&mut out);
    out
}

fn push_escaped(out: &mut String, b: u8) {
    out.push('=');
    out.push(HEX[(b >> 4) as usize] as char);
    out.push(HEX[(b & 0x0F) as usize] as char);
}

fn escape_trailing_whitespace(out: &mut String) {
    if let Some(last @ (' ' | '\t')) = out.chars().last() {
        out.pop();
        push_escaped(out, last as u8);
    }
}

/// Decode leniently: invalid escapes are kept literally, soft line breaks
/// (`=` followed by optional whitespace and an EOL) are removed.
pub fn decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let b = data[i];
        if b != b'=' {
            out.push(b);
            i += 1;
            continue;
        }

        // Soft line break, allowing transport padding before the EOL.
        let mut j = i + 1;
        while j < data.len() && (data[j] == b' ' || data[j] == b'\t') {
            j += 1;
        }
        if j < data.len() && (data[j] == b'\n' || data[j] == b'\r') {
            if data[j] == b'\r' && data.get(j + 1) == Some(&b'\n') {
                j += 1;
            }
            i = j + 1;
            continue;
        }
        if j == data.len() {
            // "=" at end of input.
            i = j;
            continue;
        }

        match (data.get(i + 1).and_then(|c| hex_val(*c)), data.get(i + 2).and_then(|c| hex_val(*c))) {
            (Some(hi), Some(lo)) => {
                out.push((hi << 4) | lo);
                i += 3;
            }
            _ => {
                out.push(b'=');
                i += 1;
            }
        }
    }
    out
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_escapes_equals_and_controls() {
        assert_eq!(encode(b"a=b\x1bc"), "a=3Db=1Bc");
    }

    #[test]
    fn test_encode_keeps_line_breaks() {
        assert_eq!(encode(b"one\r\ntwo\nthree"), "one\ntwo\nthree");
    }

    #[test]
    fn test_encode_trailing_space_before_break() {
        assert_eq!(encode(b"end \nnext"), "end=20\nnext");
    }

    #[test]
    fn test_encode_wraps_long_lines() {
        let long = vec![b'x'; 200];
        let encoded = encode(&long);
        assert!(encoded.lines().all(|l| l.len() <= MAX_LINE));
        assert_eq!(decode(encoded.as_bytes()), long);
    }

    #[test]
    fn test_decode_soft_breaks_and_escapes() {
        assert_eq!(decode(b"caf=E9 =\r\nna=efve"), b"caf\xe9 na\xefve".to_vec());
        assert_eq!(decode(b"bad=ZZ"), b"bad=ZZ".to_vec());
        assert_eq!(decode(b"pad=  \nded"), b"padded".to_vec());
    }
}
