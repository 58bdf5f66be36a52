// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Rendering of binary package control metadata. */

use crate::config::PackageConfig;

/// Render the `control` member of the control archive.
///
/// Fields are emitted as `Name: value` lines in a fixed order, `Depends`
/// only when the dependency list is non-empty, and the paragraph ends with
/// a blank line.
pub fn render_control(config: &PackageConfig) -> String {
    let mut lines = vec![
        format!("Package: {}", config.name),
        format!("Version: {}", config.version),
        format!("Architecture: {}", config.architecture),
        format!("Maintainer: {}", config.maintainer),
        format!("Description: {}", config.description),
    ];

    if !config.depends.is_empty() {
        lines.push(format!("Depends: {}", config.depends.join(", ")));
    }

    format!("{}\n\n", lines.join("\n"))
}

/// Render the `conffiles` member from install-time paths.
///
/// Returns `None` when no configuration file was selected, in which case
/// the member is not emitted at all.
pub fn render_conffiles(install_paths: &[String]) -> Option<String> {
    if install_paths.is_empty() {
        None
    } else {
        Some(format!("{}\n", install_paths.join("\n")))
    }
}
