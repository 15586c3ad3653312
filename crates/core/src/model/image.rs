use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("image URL failed to parse")]
    InvalidUrl,
}

//
// ─── IMAGE REFERENCE ───────────────────────────────────────────────────────────
//

/// Reference to a stored image: a book cover or a profile picture.
///
/// The binary itself lives outside this workspace (upload handling is the
/// web layer's concern); the domain only carries where to find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    FilePath(PathBuf),
    Url(Url),
}

impl ImageRef {
    /// Builds a reference to an image on local storage.
    ///
    /// # Errors
    ///
    /// Returns `ImageRefError::Empty` for an empty path.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ImageRefError> {
        let p = path.into();
        if p.as_os_str().is_empty() {
            return Err(ImageRefError::Empty);
        }
        Ok(ImageRef::FilePath(p))
    }

    /// Builds a reference to a remotely hosted image.
    ///
    /// # Errors
    ///
    /// Returns `ImageRefError::Empty` for a blank string and
    /// `ImageRefError::InvalidUrl` if the URL fails to parse.
    pub fn from_url(url: impl AsRef<str>) -> Result<Self, ImageRefError> {
        let s = url.as_ref().trim();
        if s.is_empty() {
            return Err(ImageRefError::Empty);
        }
        let u = Url::parse(s).map_err(|_| ImageRefError::InvalidUrl)?;
        Ok(ImageRef::Url(u))
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ImageRef::FilePath(p) => Some(p.as_path()),
            ImageRef::Url(_) => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            ImageRef::Url(u) => Some(u),
            ImageRef::FilePath(_) => None,
        }
    }

    /// String form suitable for persistence; `parse` is its inverse.
    #[must_use]
    pub fn to_persisted(&self) -> String {
        match self {
            ImageRef::FilePath(p) => p.display().to_string(),
            ImageRef::Url(u) => u.as_str().to_string(),
        }
    }

    /// Rebuilds a reference from its persisted string form.
    ///
    /// Anything that parses as an absolute URL is treated as one; everything
    /// else is a file path.
    ///
    /// # Errors
    ///
    /// Returns `ImageRefError::Empty` for a blank string.
    pub fn parse(raw: &str) -> Result<Self, ImageRefError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ImageRefError::Empty);
        }
        match Url::parse(trimmed) {
            Ok(u) => Ok(ImageRef::Url(u)),
            Err(_) => Ok(ImageRef::FilePath(PathBuf::from(trimmed))),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_file_rejects_empty_path() {
        assert_eq!(ImageRef::from_file("").unwrap_err(), ImageRefError::Empty);
    }

    #[test]
    fn from_url_rejects_garbage() {
        assert_eq!(
            ImageRef::from_url("not a url").unwrap_err(),
            ImageRefError::InvalidUrl
        );
        assert_eq!(ImageRef::from_url("   ").unwrap_err(), ImageRefError::Empty);
    }

    #[test]
    fn persisted_form_round_trips() {
        let file = ImageRef::from_file("covers/dune.jpg").unwrap();
        assert_eq!(ImageRef::parse(&file.to_persisted()).unwrap(), file);

        let url = ImageRef::from_url("https://covers.example.com/dune.jpg").unwrap();
        assert_eq!(ImageRef::parse(&url.to_persisted()).unwrap(), url);
    }

    #[test]
    fn accessors_match_variant() {
        let file = ImageRef::from_file("pic.png").unwrap();
        assert!(file.as_path().is_some());
        assert!(file.as_url().is_none());
    }
}
