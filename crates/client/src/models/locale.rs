use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A language/region code such as `en-us` or `fr`.
///
/// Codes are compared case-insensitively by normalizing them to lowercase on
/// construction; the platform itself only ever sends lowercase codes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl FromStr for Locale {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}
impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
impl From<String> for Locale {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.0
    }
}
impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Response of the locale listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locales {
    pub locales: Vec<Locale>,
    pub default_locale: Locale,
}

impl Locales {
    /// Every locale, with the default locale guaranteed to be present.
    pub fn all(&self) -> Vec<Locale> {
        let mut all = self.locales.clone();
        if !all.contains(&self.default_locale) {
            all.push(self.default_locale.clone());
        }
        all
    }
}
