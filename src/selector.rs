// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Glob-based selection of files to package. */

use {
    crate::error::Result,
    std::path::{Path, PathBuf},
};

/// A file resolved from an include pattern against the source tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectedFile {
    /// Path relative to the source directory, `/`-separated on every
    /// platform.
    pub relative: String,
    /// Absolute path of the file on disk.
    pub source: PathBuf,
}

/// Match options applied to both include expansion and exclude filtering.
///
/// Dotfiles match like any other file name.
fn match_options() -> glob::MatchOptions {
    glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    }
}

/// Expand include patterns against `base_dir`, honoring exclude patterns.
///
/// Patterns are evaluated independently and in the order given, and their
/// match sets are concatenated without global deduplication. A file matched
/// by several patterns therefore appears once per pattern; the staging tree
/// resolves the overlap by letting later copies overwrite earlier ones.
/// Only regular files are selected (symlinks are followed, directories
/// skipped). An invalid pattern is an error; a pattern with no matches is
/// not.
pub fn select_files(
    include: &[String],
    exclude: &[String],
    base_dir: &Path,
) -> Result<Vec<SelectedFile>> {
    let mut exclude_patterns = Vec::with_capacity(exclude.len());
    for pattern in exclude {
        exclude_patterns.push(glob::Pattern::new(pattern)?);
    }

    let mut selected = Vec::new();

    for pattern in include {
        let search = format!("{}/{}", base_dir.display(), pattern);

        for entry in glob::glob_with(&search, match_options())? {
            let path = entry?;

            if !path.is_file() {
                continue;
            }

            let relative = relative_posix(&path, base_dir)?;

            if exclude_patterns
                .iter()
                .any(|pattern| pattern.matches_with(&relative, match_options()))
            {
                continue;
            }

            selected.push(SelectedFile {
                relative,
                source: path,
            });
        }
    }

    Ok(selected)
}

/// Express `path` relative to `base`, joined with `/` regardless of the
/// platform separator.
fn relative_posix(path: &Path, base: &Path) -> Result<String> {
    let relative = path.strip_prefix(base)?;

    Ok(relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
