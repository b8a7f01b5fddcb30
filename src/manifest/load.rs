//! `manifest.json` on disk.
//!
//! The runtime reads the manifest once at startup. A missing or unreadable
//! file is fatal; there is no default manifest.

use super::codec::{SerializedManifest, deserialize};
use super::{Manifest, ManifestError};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Write the manifest into `dir`, returning the file path.
pub fn write_manifest(dir: &Path, manifest: &SerializedManifest) -> Result<PathBuf, ManifestError> {
    let path = dir.join(MANIFEST_FILE);
    let json = manifest.to_json()?;
    fs::create_dir_all(dir).map_err(|e| ManifestError::Io(dir.to_path_buf(), e))?;
    fs::write(&path, json).map_err(|e| ManifestError::Io(path.clone(), e))?;
    crate::debug!("manifest"; "wrote {}", path.display());
    Ok(path)
}

/// Read and decode the manifest in `dir`.
pub fn load_manifest(dir: &Path) -> Result<Manifest, ManifestError> {
    let path = dir.join(MANIFEST_FILE);
    let json = fs::read_to_string(&path).map_err(|e| ManifestError::Io(path.clone(), e))?;
    deserialize(SerializedManifest::from_json(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BuildFormat, TrailingSlash};
    use crate::manifest::{EncryptionKey, ManifestCore, codec::serialize};
    use std::collections::{BTreeMap, BTreeSet};

    fn manifest() -> Manifest {
        Manifest::new(
            ManifestCore {
                adapter_name: String::new(),
                routes: Vec::new(),
                site: None,
                base: "/".into(),
                trailing_slash: TrailingSlash::Never,
                build_format: BuildFormat::File,
                compress_html: false,
                assets_prefix: Some("https://cdn.example.com".into()),
                component_metadata: BTreeMap::new(),
                entry_modules: BTreeMap::new(),
                assets: BTreeSet::new(),
                i18n: None,
                csp: None,
            },
            EncryptionKey::derive(b"disk"),
        )
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let original = manifest();
        let path = write_manifest(&dir.path().join("server"), &serialize(&original)).unwrap();
        assert!(path.ends_with(MANIFEST_FILE));

        let loaded = load_manifest(&dir.path().join("server")).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Io(..)));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_unparsable_manifest_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
        assert!(matches!(
            load_manifest(dir.path()),
            Err(ManifestError::Decode(_))
        ));
    }
}
