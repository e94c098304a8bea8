use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, de::Visitor};

/// The family of chrec file layouts a recording file belongs to.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatVariant {
    /// JSON lines: a header line followed by one event record per line. Written as `chrec-s`.
    ChrecStreaming,
}

impl FormatVariant {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "chrec-s" => Some(Self::ChrecStreaming),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ChrecStreaming => "chrec-s",
        }
    }
}

impl fmt::Display for FormatVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names the layout and layout revision a recording file was written with.
///
/// Written as `<variant>/<major>.<minor>.<patch>`, for example `chrec-s/0.1.0`. The same text is
/// used by [`Display`], [`FromStr`] and the `serde` implementations, which is how the identifier
/// appears in the header line of a streamed recording.
///
/// Revisions of different [variants] are unrelated to each other.
///
/// # Compatibility
///
/// Revisions are compared the way Cargo compares versions: the left-most non-zero component is
/// the one whose change breaks readers. A reader at `0.1.4` can read files written at `0.1.0`
/// to `0.1.4`, but nothing at `0.2.x`. Before `0.1.0`, every revision stands alone. See
/// [`FormatIdentifier::can_read_version`].
///
/// [`Display`]: trait@std::fmt::Display
/// [variants]: enum@FormatVariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatIdentifier {
    pub variant: FormatVariant,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for FormatIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{variant}/{major}.{minor}.{patch}",
            variant = self.variant,
            major = self.major,
            minor = self.minor,
            patch = self.patch,
        )
    }
}

impl FromStr for FormatIdentifier {
    type Err = ParseFormatVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, revision) = s
            .split_once('/')
            .filter(|(_, revision)| !revision.contains('/'))
            .ok_or(ParseFormatVersionError::IncorrectParts)?;

        let variant = FormatVariant::parse(name)
            .ok_or_else(|| ParseFormatVersionError::UnknownVariant(name.into()))?;

        let [major, minor, patch] = parse_revision(revision)
            .ok_or_else(|| ParseFormatVersionError::InvalidVersion(revision.into()))?;

        Ok(Self {
            variant,
            major,
            minor,
            patch,
        })
    }
}

/// Split `<major>.<minor>.<patch>` into its three decimal components.
fn parse_revision(revision: &str) -> Option<[u32; 3]> {
    let mut components = revision.split('.').map(str::parse::<u32>);
    let parsed = [
        components.next()?.ok()?,
        components.next()?.ok()?,
        components.next()?.ok()?,
    ];

    components.next().is_none().then_some(parsed)
}

/// A string that is not a valid [`FormatIdentifier`].
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseFormatVersionError {
    /// The string does not contain exactly one `/`.
    #[error("expected '<variant>/<major>.<minor>.<patch>' with a single '/' separator")]
    IncorrectParts,
    /// The text before the `/` names no known [`FormatVariant`].
    #[error("unknown format variant '{0}'")]
    UnknownVariant(String),
    /// The text after the `/` is not three dot-separated decimal numbers.
    #[error("format revision '{0}' is not '<major>.<minor>.<patch>'")]
    InvalidVersion(String),
}

impl FormatIdentifier {
    /// Whether a reader at this revision understands files written at `version`.
    ///
    /// Only the identifiers are compared, following the rules in the [Compatibility] section.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chrec::{FormatIdentifier, FormatVariant};
    /// let reader = FormatIdentifier {
    ///     variant: FormatVariant::ChrecStreaming,
    ///     major: 0,
    ///     minor: 1,
    ///     patch: 4,
    /// };
    /// let file = FormatIdentifier { patch: 2, ..reader.clone() };
    ///
    /// assert!(reader.can_read_version(&file));
    /// // An older reader may be missing something a newer writer relies on.
    /// assert!(!file.can_read_version(&reader));
    /// ```
    ///
    /// [Compatibility]: struct@FormatIdentifier#compatibility
    pub fn can_read_version(&self, version: &FormatIdentifier) -> bool {
        if self.variant != version.variant || self.major != version.major {
            return false;
        }

        match (self.major, self.minor) {
            (0, 0) => self.patch == version.patch,
            (0, _) => self.minor == version.minor && self.patch >= version.patch,
            _ => self.minor >= version.minor,
        }
    }
}

impl Serialize for FormatIdentifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

struct FormatIdentifierVisitor;

impl Visitor<'_> for FormatIdentifierVisitor {
    type Value = FormatIdentifier;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a format identifier such as 'chrec-s/0.1.0'")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse().map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for FormatIdentifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(FormatIdentifierVisitor)
    }
}
