//! Cell coordinates along one dimension
//!
//! A [`Label`] is either numeric (the native form for indexed dimensions) or
//! text (the native form for mapped dimensions). Both forms compare, order and
//! hash by their string form, so `Label::from(3)` equals `Label::from("3")`.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A cell coordinate along one dimension.
///
/// # Examples
///
/// ```
/// use mixten_core::Label;
///
/// let numeric = Label::from(3u64);
/// let text = Label::from("3");
/// assert_eq!(numeric, text);
/// assert_eq!(text.as_numeric(), Some(3));
/// assert_eq!(Label::from("a").as_numeric(), None);
///
/// // Ordering is by string form
/// assert!(Label::from(10u64) < Label::from(9u64));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Label {
    /// A non-negative integer label
    Numeric(u64),
    /// A string label
    Text(String),
}

impl Label {
    /// The numeric value of this label, if it has one
    pub fn as_numeric(&self) -> Option<u64> {
        match self {
            Label::Numeric(n) => Some(*n),
            Label::Text(s) => s.parse().ok(),
        }
    }

    /// The string form of this label
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Label::Numeric(n) => Cow::Owned(n.to_string()),
            Label::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Whether this label is stored in numeric form
    pub fn is_numeric(&self) -> bool {
        matches!(self, Label::Numeric(_))
    }

    /// Calls `f` with the string form without allocating for numeric labels
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        match self {
            Label::Numeric(n) => f(Decimal::new(*n).as_str()),
            Label::Text(s) => f(s),
        }
    }
}

impl From<u64> for Label {
    fn from(n: u64) -> Self {
        Label::Numeric(n)
    }
}

impl From<usize> for Label {
    fn from(n: usize) -> Self {
        Label::Numeric(n as u64)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Text(s)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Label::Numeric(a), Label::Numeric(b)) => a == b,
            (Label::Text(a), Label::Text(b)) => a == b,
            _ => self.with_str(|a| other.with_str(|b| a == b)),
        }
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.with_str(|s| s.hash(state));
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.with_str(|a| other.with_str(|b| a.cmp(b)))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Numeric(n) => write!(f, "{}", n),
            Label::Text(s) => f.write_str(s),
        }
    }
}

/// Stack buffer holding the decimal digits of a `u64`.
pub(crate) struct Decimal {
    buf: [u8; 20],
    start: usize,
}

impl Decimal {
    pub(crate) fn new(mut n: u64) -> Self {
        let mut buf = [0u8; 20];
        let mut start = buf.len();
        loop {
            start -= 1;
            buf[start] = b'0' + (n % 10) as u8;
            n /= 10;
            if n == 0 {
                break;
            }
        }
        Self { buf, start }
    }

    pub(crate) fn as_str(&self) -> &str {
        // only ASCII digits are ever written
        std::str::from_utf8(&self.buf[self.start..]).unwrap_or_default()
    }
}
