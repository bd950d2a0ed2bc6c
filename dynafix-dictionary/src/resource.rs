/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Bundled definition discovery.
//!
//! Version tags map to definition file names; the directory holding them is
//! resolved from the [`SPEC_DIR_ENV`] environment override first, then the
//! crate's packaged `spec/` directory.

use dynafix_core::error::SchemaError;
use std::path::{Path, PathBuf};

/// Environment variable overriding the definition directory.
pub const SPEC_DIR_ENV: &str = "DYNAFIX_SPEC_DIR";

/// Directory the crate ships its definitions in.
const BUNDLED_SPEC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/spec");

/// Maps a version tag to its definition file name.
fn spec_file_name(tag: &str) -> Option<&'static str> {
    match tag {
        "fix40" => Some("FIX40.xml"),
        "fix41" => Some("FIX41.xml"),
        "fix42" => Some("FIX42.xml"),
        "fix43" => Some("FIX43.xml"),
        "fix44" => Some("FIX44.xml"),
        _ => None,
    }
}

/// Resolves the definition file path for a version tag.
///
/// # Errors
/// [`SchemaError::UnsupportedVersion`] for an unknown tag;
/// [`SchemaError::SpecNotFound`] when no file exists at the resolved path.
pub fn locate_spec(tag: &str) -> Result<PathBuf, SchemaError> {
    let file = spec_file_name(tag)
        .ok_or_else(|| SchemaError::UnsupportedVersion(tag.to_string()))?;

    let dir = std::env::var(SPEC_DIR_ENV).unwrap_or_else(|_| BUNDLED_SPEC_DIR.to_string());
    let path = Path::new(&dir).join(file);
    if path.is_file() {
        Ok(path)
    } else {
        Err(SchemaError::SpecNotFound {
            path: path.display().to_string(),
        })
    }
}

/// Reads the definition XML for a version tag.
///
/// # Errors
/// As [`locate_spec`], plus [`SchemaError::SpecNotFound`] if the file
/// disappears between discovery and read.
pub fn read_spec(tag: &str) -> Result<String, SchemaError> {
    let path = locate_spec(tag)?;
    std::fs::read_to_string(&path).map_err(|_| SchemaError::SpecNotFound {
        path: path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_is_unsupported() {
        assert!(matches!(
            locate_spec("fix30"),
            Err(SchemaError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            locate_spec("fixt11"),
            Err(SchemaError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_bundled_fix44_is_discoverable() {
        let path = locate_spec("fix44").unwrap();
        assert!(path.ends_with("FIX44.xml"));
    }

    #[test]
    fn test_known_tag_without_bundled_file() {
        // Only FIX 4.4 ships with the crate.
        assert!(matches!(
            locate_spec("fix40"),
            Err(SchemaError::SpecNotFound { .. })
        ));
    }
}
