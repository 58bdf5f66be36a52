// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Maintainer script composition.

dpkg runs up to four maintainer scripts at defined points of the package
lifecycle. Scripts are composed from an optional rendered template plus an
optional user-supplied fragment; composition is pure, so whether a hook
produces a script is known without probing the filesystem afterwards.
*/

use {
    crate::{error::Result, template},
    log::warn,
    std::{
        collections::BTreeMap,
        fs,
        path::{Path, PathBuf},
    },
    strum::{Display, EnumIter},
};

/// Sentinel before which custom fragments are spliced into a template.
const EXIT_SENTINEL: &str = "\nexit 0\n";

/// The four maintainer scripts recognized by dpkg, in lifecycle order.
#[derive(Clone, Copy, Debug, Display, EnumIter, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum MaintainerScript {
    Preinst,
    Postinst,
    Prerm,
    Postrm,
}

impl MaintainerScript {
    /// File name of this script inside the control archive.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Preinst => "preinst",
            Self::Postinst => "postinst",
            Self::Prerm => "prerm",
            Self::Postrm => "postrm",
        }
    }
}

/// Compose the content of one maintainer script.
///
/// The template, when present, is rendered with `vars` to form the base
/// script. A non-empty fragment is then injected: immediately before the
/// final `exit 0` line when the base script carries one, appended together
/// with a fresh `exit 0` when it does not, or wrapped in a minimal POSIX
/// shell script when there is no template at all. Returns `None` when
/// neither source contributed content, meaning no file is emitted for the
/// hook.
pub fn compose(
    script: MaintainerScript,
    template_text: Option<&str>,
    vars: &BTreeMap<&str, String>,
    fragment: Option<&str>,
) -> Option<String> {
    let mut content = template_text.map(|text| template::render(text, vars));

    if let Some(fragment) = fragment.filter(|fragment| !fragment.is_empty()) {
        let comment = format!("# Custom {} script", script);

        content = Some(match content {
            None => format!(
                "#!/bin/sh\nset -e\n\n{}\n{}\n\nexit 0\n",
                comment, fragment
            ),
            Some(base) => match base.find(EXIT_SENTINEL) {
                Some(position) => format!(
                    "{}\n{}\n{}\n{}",
                    &base[..position],
                    comment,
                    fragment,
                    &base[position..]
                ),
                None => format!("{}\n{}\n{}\n\nexit 0\n", base, comment, fragment),
            },
        });
    }

    content
}

/// Read a user-supplied script fragment.
///
/// Relative paths are resolved against the source directory. An unreadable
/// file is not fatal: a warning is logged and the fragment is treated as
/// absent.
pub fn read_custom_fragment(source_dir: &Path, script_path: Option<&str>) -> Option<String> {
    let script_path = script_path?;

    let absolute = if Path::new(script_path).is_absolute() {
        PathBuf::from(script_path)
    } else {
        source_dir.join(script_path)
    };

    match fs::read_to_string(&absolute) {
        Ok(content) => Some(content),
        Err(error) => {
            warn!(
                "could not read custom script at {}: {}",
                absolute.display(),
                error
            );
            None
        }
    }
}

/// Write a composed script with the executable bit set.
pub fn write_script(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    set_executable(path)?;

    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
}

#[cfg(windows)]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
