//! Dotted attribute paths with validated identifier segments.

use std::fmt;

/// Errors related to attribute path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A segment is not a valid JavaScript identifier.
    InvalidSegment {
        segment: String,
        position: usize,
        message: String,
    },
    /// The path has no segments.
    Empty,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::InvalidSegment {
                segment,
                position,
                message,
            } => {
                write!(
                    f,
                    "invalid attribute '{}' at position {}: {}",
                    segment, position, message
                )
            }
            PathError::Empty => write!(f, "empty attribute path"),
        }
    }
}

impl std::error::Error for PathError {}

/// An attribute path into a library namespace, such as `RawImage.read`.
///
/// Segments are JavaScript identifier names: a `XID_Start` character, `_` or
/// `$`, followed by `XID_Continue` characters or `$`. Paths are immutable;
/// [`AttrPath::attr`] returns an extended copy.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttrPath {
    segments: Vec<String>,
}

impl AttrPath {
    /// Parse a dotted path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tjs_core::AttrPath;
    ///
    /// let path = AttrPath::parse("RawImage.read").unwrap();
    /// assert_eq!(path.len(), 2);
    /// assert_eq!(path.to_string(), "RawImage.read");
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let segments: Vec<String> = s.split('.').map(|c| c.to_string()).collect();
        for (i, segment) in segments.iter().enumerate() {
            Self::validate_segment(segment, i)?;
        }
        Ok(AttrPath { segments })
    }

    /// A single-segment path.
    pub fn root(name: &str) -> Result<Self, PathError> {
        Self::validate_segment(name, 0)?;
        Ok(AttrPath {
            segments: vec![name.to_string()],
        })
    }

    fn validate_segment(segment: &str, position: usize) -> Result<(), PathError> {
        let invalid = |message: String| PathError::InvalidSegment {
            segment: segment.to_string(),
            position,
            message,
        };

        let mut chars = segment.chars();
        let first = chars
            .next()
            .ok_or_else(|| invalid("empty segment".to_string()))?;

        if !(unicode_ident::is_xid_start(first) || first == '_' || first == '$') {
            return Err(invalid(
                "must start with a letter, '_' or '$'".to_string(),
            ));
        }

        for c in chars {
            if !(unicode_ident::is_xid_continue(c) || c == '$') {
                return Err(invalid(format!("invalid character '{}' in identifier", c)));
            }
        }

        Ok(())
    }

    /// A new path with `name` appended.
    #[must_use = "attr returns a new path and leaves this one unchanged"]
    pub fn attr(&self, name: &str) -> Result<AttrPath, PathError> {
        Self::validate_segment(name, self.segments.len())?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(AttrPath { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// The last segment and everything before it.
    pub fn split_last(&self) -> (&str, &[String]) {
        match self.segments.split_last() {
            Some((last, init)) => (last, init),
            None => ("", &[]),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::str::FromStr for AttrPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttrPath::parse(s)
    }
}

/// Macro for attribute path literals.
///
/// # Example
///
/// ```rust
/// use tjs_core::attr_path;
///
/// let p = attr_path!("env.allowLocalModels");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! attr_path {
    ($s:expr) => {
        $crate::AttrPath::parse($s).expect("invalid attribute path literal")
    };
}
