//! Reserved words and punctuation.

macro_rules! kws {
  ($($name:ident = $text:literal,)*) => {
    /// A reserved word or punctuation token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[allow(missing_docs)]
    pub enum Kw {
      $($name,)*
    }

    impl Kw {
      const ALL: &'static [(&'static str, Kw)] = &[$(($text, Kw::$name),)*];

      /// Returns the text of this.
      #[must_use]
      pub fn as_str(self) -> &'static str {
        match self {
          $(Kw::$name => $text,)*
        }
      }
    }
  };
}

kws! {
  Abstype = "abstype",
  And = "and",
  Andalso = "andalso",
  As = "as",
  Case = "case",
  Datatype = "datatype",
  Do = "do",
  Else = "else",
  End = "end",
  Eqtype = "eqtype",
  Exception = "exception",
  Fn = "fn",
  Fun = "fun",
  Functor = "functor",
  Handle = "handle",
  If = "if",
  In = "in",
  Include = "include",
  Infix = "infix",
  Infixr = "infixr",
  Let = "let",
  Local = "local",
  Nonfix = "nonfix",
  Of = "of",
  Op = "op",
  Open = "open",
  Orelse = "orelse",
  Raise = "raise",
  Rec = "rec",
  Sharing = "sharing",
  Sig = "sig",
  Signature = "signature",
  Struct = "struct",
  Structure = "structure",
  Then = "then",
  Type = "type",
  Val = "val",
  Where = "where",
  While = "while",
  With = "with",
  Withtype = "withtype",
  LRound = "(",
  RRound = ")",
  LSquare = "[",
  RSquare = "]",
  LCurly = "{",
  RCurly = "}",
  Comma = ",",
  Colon = ":",
  ColonGt = ":>",
  Semicolon = ";",
  DotDotDot = "...",
  Underscore = "_",
  Bar = "|",
  Eq = "=",
  BigArrow = "=>",
  Arrow = "->",
  Hash = "#",
  Star = "*",
}

impl Kw {
  /// Returns the keyword with this text, if any.
  #[must_use]
  pub fn from_text(s: &str) -> Option<Kw> {
    Self::ALL.iter().find_map(|&(text, kw)| (text == s).then_some(kw))
  }

  /// Returns whether this is alphanumeric.
  #[must_use]
  pub fn is_alphanumeric(self) -> bool {
    self.as_str().starts_with(|c: char| c.is_ascii_alphabetic())
  }
}

impl std::fmt::Display for Kw {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::Kw;

  #[test]
  fn round_trip_text() {
    for &(text, kw) in Kw::ALL {
      assert_eq!(Kw::from_text(text), Some(kw));
      assert_eq!(kw.as_str(), text);
    }
    assert_eq!(Kw::from_text("struct"), Some(Kw::Struct));
    assert_eq!(Kw::from_text("foo"), None);
  }
}
