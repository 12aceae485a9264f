use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Extensions analyzed when none are given on the command line.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Case-insensitive extension allow-list.
///
/// Entries are stored lowercased with every `.` removed, so `".JPG"`,
/// `"jpg"` and `"Jpg"` all normalise to `"jpg"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: BTreeSet<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        Self { extensions }
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(&normalize_extension(extension))
    }

    /// Normalised extensions in sorted order.
    pub fn to_vec(&self) -> Vec<String> {
        self.extensions.iter().cloned().collect()
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.to_lowercase().replace('.', "")
}

/// Why an entry was left out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAFile,
    ExtensionNotAllowed(String),
    Unreadable(String),
    NonUtf8Path,
}

impl SkipReason {
    /// Reasons worth a warning; the rest are expected filter misses.
    pub fn is_warning(&self) -> bool {
        matches!(self, SkipReason::Unreadable(_) | SkipReason::NonUtf8Path)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAFile => write!(f, "not a file"),
            SkipReason::ExtensionNotAllowed(ext) => {
                write!(f, "extension '{}' not in allow-list", ext)
            }
            SkipReason::Unreadable(err) => write!(f, "unreadable: {}", err),
            SkipReason::NonUtf8Path => write!(f, "path is not valid UTF-8"),
        }
    }
}

/// Decides whether `path` should be hashed.
///
/// Symlinks are resolved, so a link to a regular file is accepted like the
/// file itself. Anything else that is not a regular file (directories,
/// dangling links, sockets) is rejected.
pub fn classify(path: &Path, extensions: &ExtensionSet) -> Result<(), SkipReason> {
    match path.metadata() {
        Ok(metadata) if metadata.is_file() => {}
        _ => return Err(SkipReason::NotAFile),
    }

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !extensions.contains(&extension) {
        return Err(SkipReason::ExtensionNotAllowed(extension));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn extension_set_ignores_case_and_dots() {
        let set = ExtensionSet::new(["JPG", ".jpeg"]);
        assert_eq!(set.to_vec(), vec!["jpeg".to_string(), "jpg".to_string()]);
        assert!(set.contains("jpg"));
        assert!(set.contains(".JPEG"));
        assert!(!set.contains("png"));
    }

    #[test]
    fn default_set_is_jpeg() {
        assert_eq!(ExtensionSet::default(), ExtensionSet::new(["jpeg", "jpg"]));
    }

    #[test]
    fn classify_accepts_matching_files_only() {
        let dir = tempdir().unwrap();
        let photo = dir.path().join("photo.JPG");
        let notes = dir.path().join("notes.txt");
        let bare = dir.path().join("README");
        fs::write(&photo, b"x").unwrap();
        fs::write(&notes, b"y").unwrap();
        fs::write(&bare, b"z").unwrap();

        let set = ExtensionSet::new(["jpg"]);
        assert_eq!(classify(&photo, &set), Ok(()));
        assert_eq!(
            classify(&notes, &set),
            Err(SkipReason::ExtensionNotAllowed("txt".into()))
        );
        assert_eq!(
            classify(&bare, &set),
            Err(SkipReason::ExtensionNotAllowed(String::new()))
        );
        assert_eq!(classify(dir.path(), &set), Err(SkipReason::NotAFile));
        assert_eq!(
            classify(&dir.path().join("missing.jpg"), &set),
            Err(SkipReason::NotAFile)
        );
    }

    #[test]
    fn directories_named_like_images_are_not_files() {
        let dir = tempdir().unwrap();
        let fake = dir.path().join("album.jpg");
        fs::create_dir(&fake).unwrap();
        assert_eq!(
            classify(&fake, &ExtensionSet::default()),
            Err(SkipReason::NotAFile)
        );
    }
}
