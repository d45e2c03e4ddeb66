//! Validated text types shared by the care plan crates.
//!
//! Each type trims its input on construction and then enforces the field rule it is named for,
//! so a value that exists has already passed validation.

/// Minimum number of characters in a care plan title.
pub const TITLE_MIN_CHARS: usize = 3;

/// Maximum number of characters in a care plan description.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Why a piece of text was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// Nothing but whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The trimmed input is shorter than the field allows
    #[error("Text must be at least {min} characters")]
    TooShort { min: usize },
    /// The trimmed input is longer than the field allows
    #[error("Text must be at most {max} characters")]
    TooLong { max: usize },
}

/// Trimmed text with at least one character left after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and keeps it if anything remains.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Empty),
            text => Ok(Self(text.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// A care plan title: non-empty and at least [`TITLE_MIN_CHARS`] characters once trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(NonEmptyText);

impl Title {
    /// Creates a new `Title`, trimming the input first.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::TooShort`] when the trimmed
    /// input has fewer than [`TITLE_MIN_CHARS`] characters.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;
        if text.as_str().chars().count() < TITLE_MIN_CHARS {
            return Err(TextError::TooShort {
                min: TITLE_MIN_CHARS,
            });
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_inner(self) -> String {
        self.0.into_inner()
    }
}

/// An optional free-text description bounded to [`DESCRIPTION_MAX_CHARS`] characters.
///
/// Unlike [`NonEmptyText`], blank input is accepted and represents "no description".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Description(Option<String>);

impl Description {
    /// Creates a new `Description`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::TooLong`] if the trimmed input exceeds [`DESCRIPTION_MAX_CHARS`].
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Ok(Self(None));
        }
        if trimmed.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(TextError::TooLong {
                max: DESCRIPTION_MAX_CHARS,
            });
        }
        Ok(Self(Some(trimmed.to_owned())))
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        NonEmptyText::new(raw).map_err(serde::de::Error::custom)
    }
}

impl<'de> serde::Deserialize<'de> for Title {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        Title::new(raw).map_err(serde::de::Error::custom)
    }
}
