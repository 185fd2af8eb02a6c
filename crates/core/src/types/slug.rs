//! URL slug type for catalog entities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input string is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[-a-zA-Z0-9_]`.
    #[error("slug contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A URL slug for categories, subcategories and goods.
///
/// ## Constraints
///
/// - Length: 1-30 characters
/// - Only ASCII letters, digits, hyphens and underscores
///
/// ## Examples
///
/// ```
/// use saraphan_core::Slug;
///
/// assert!(Slug::parse("category-1").is_ok());
/// assert!(Slug::parse("good_small").is_ok());
///
/// assert!(Slug::parse("").is_err());
/// assert!(Slug::parse("with space").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 30;

    /// Parse a `Slug` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 30 characters, or
    /// contains anything other than ASCII letters, digits, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(SlugError::InvalidCharacter(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_slugs() {
        assert!(Slug::parse("category-1").is_ok());
        assert!(Slug::parse("subcategory_2").is_ok());
        assert!(Slug::parse("GOOD3").is_ok());
        assert!(Slug::parse(&"a".repeat(30)).is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        assert_eq!(
            Slug::parse(&"a".repeat(31)),
            Err(SlugError::TooLong { max: 30 })
        );
    }

    #[test]
    fn test_parse_invalid_characters() {
        assert_eq!(
            Slug::parse("two words"),
            Err(SlugError::InvalidCharacter(' '))
        );
        assert_eq!(Slug::parse("a/b"), Err(SlugError::InvalidCharacter('/')));
        assert!(Slug::parse("категория").is_err());
    }

    #[test]
    fn test_display_and_as_str() {
        let slug = Slug::parse("good-1").unwrap();
        assert_eq!(slug.as_str(), "good-1");
        assert_eq!(slug.to_string(), "good-1");
    }
}
