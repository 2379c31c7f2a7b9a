//! Handling SML string escapes.

/// The result of lexing a string.
#[derive(Debug, Default)]
pub(crate) struct Res {
  /// The string with escapes interpreted, if it was closed.
  pub(crate) actual: Option<String>,
  /// The errors encountered as pairs of (index where encountered, kind of error).
  pub(crate) errors: Vec<(usize, Error)>,
}

/// A kind of string error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  /// The string was not closed with a matching `"`.
  Unclosed,
  /// There was an invalid escape.
  InvalidEscape,
  /// There was non-whitespace in a string continuation.
  NonWhitespaceInContinuation,
}

/// requires `bs[*idx] == b'"'`.
pub(crate) fn get(idx: &mut usize, bs: &[u8]) -> Res {
  debug_assert_eq!(bs.get(*idx), Some(&b'"'));
  *idx += 1;
  let mut res = Res::default();
  let mut buf = Vec::<u8>::new();
  if get_(&mut res, &mut buf, idx, bs).is_some() {
    res.actual = Some(String::from_utf8_lossy(&buf).into_owned());
  } else {
    res.errors.push((*idx, Error::Unclosed));
  }
  res
}

/// returns None iff there was no matching `"` to close the string.
fn get_(res: &mut Res, buf: &mut Vec<u8>, idx: &mut usize, bs: &[u8]) -> Option<()> {
  loop {
    match *bs.get(*idx)? {
      b'\n' => return None,
      b'"' => {
        *idx += 1;
        return Some(());
      }
      b'\\' => get_escape(res, buf, idx, bs)?,
      b => {
        buf.push(b);
        *idx += 1;
      }
    }
  }
}

fn get_escape(res: &mut Res, buf: &mut Vec<u8>, idx: &mut usize, bs: &[u8]) -> Option<()> {
  *idx += 1;
  let b = *bs.get(*idx)?;
  let simple = match b {
    b'a' => Some(7),
    b'b' => Some(8),
    b't' => Some(b'\t'),
    b'n' => Some(b'\n'),
    b'v' => Some(11),
    b'f' => Some(12),
    b'r' => Some(b'\r'),
    b'"' => Some(b'"'),
    b'\\' => Some(b'\\'),
    _ => None,
  };
  if let Some(c) = simple {
    buf.push(c);
    *idx += 1;
    return Some(());
  }
  match b {
    b'^' => {
      *idx += 1;
      let c = *bs.get(*idx)?;
      if (64..=95).contains(&c) {
        buf.push(c - 64);
      } else {
        res.errors.push((*idx, Error::InvalidEscape));
      }
      *idx += 1;
    }
    b'u' => {
      *idx += 1;
      let start = *idx;
      for _ in 0..4 {
        if !bs.get(*idx)?.is_ascii_hexdigit() {
          res.errors.push((*idx, Error::InvalidEscape));
        }
        *idx += 1;
      }
      let code =
        std::str::from_utf8(&bs[start..*idx]).ok().and_then(|s| u32::from_str_radix(s, 16).ok());
      match code.and_then(char::from_u32) {
        Some(c) => {
          let mut tmp = [0u8; 4];
          buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
        None => res.errors.push((start, Error::InvalidEscape)),
      }
    }
    b if b.is_ascii_digit() => {
      let start = *idx;
      for _ in 0..3 {
        if !bs.get(*idx)?.is_ascii_digit() {
          res.errors.push((*idx, Error::InvalidEscape));
        }
        *idx += 1;
      }
      let code = std::str::from_utf8(&bs[start..*idx]).ok().and_then(|s| s.parse::<u8>().ok());
      match code {
        Some(c) => buf.push(c),
        None => res.errors.push((start, Error::InvalidEscape)),
      }
    }
    b if is_whitespace(b) => loop {
      *idx += 1;
      let b = *bs.get(*idx)?;
      if b == b'\\' {
        *idx += 1;
        break;
      }
      if !is_whitespace(b) {
        res.errors.push((*idx, Error::NonWhitespaceInContinuation));
      }
    },
    _ => {
      res.errors.push((*idx, Error::InvalidEscape));
      *idx += 1;
    }
  }
  Some(())
}

/// Returns whether `b` is a whitespace character for our purposes.
pub(crate) fn is_whitespace(b: u8) -> bool {
  b.is_ascii_whitespace() || b == 0xb
}
