// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Materialization of the temporary install tree.

The staging tree mirrors the target filesystem: every selected file is
copied to `<install root>/<install path>/<relative path>` and the generated
service unit lands at its fixed systemd location. The tree, minus the root
itself, is exactly what the data archive will contain.
*/

use {
    crate::{
        error::{PackagerError, Result},
        selector::SelectedFile,
        systemd,
    },
    std::{fs, path::Path},
};

/// Copy selected files into the install tree.
///
/// Files are copied in order, so a path selected twice ends up with the
/// content of the last copy. Intermediate directories are created as
/// needed; symlinked sources are followed, copying content rather than the
/// link.
pub fn copy_selected_files(
    install_root: &Path,
    install_path: &str,
    files: &[SelectedFile],
) -> Result<()> {
    let target_dir = install_root.join(install_path.trim_start_matches('/'));

    for file in files {
        let target = target_dir.join(&file.relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|error| PackagerError::IoPath(parent.display().to_string(), error))?;
        }

        fs::copy(&file.source, &target)
            .map_err(|error| PackagerError::IoPath(file.source.display().to_string(), error))?;
    }

    Ok(())
}

/// Install-time paths of the given files, for the conffiles member.
pub fn install_paths(install_path: &str, files: &[SelectedFile]) -> Vec<String> {
    let prefix = install_path.trim_end_matches('/');

    files
        .iter()
        .map(|file| format!("{}/{}", prefix, file.relative))
        .collect()
}

/// Write the rendered service unit at its fixed location under the
/// install root.
pub fn write_service_unit(install_root: &Path, unit_file_name: &str, unit: &str) -> Result<()> {
    let unit_dir = install_root.join(systemd::UNIT_INSTALL_DIR);

    fs::create_dir_all(&unit_dir)
        .map_err(|error| PackagerError::IoPath(unit_dir.display().to_string(), error))?;
    fs::write(unit_dir.join(unit_file_name), unit)?;

    Ok(())
}
