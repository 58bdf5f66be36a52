// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The resolved build description consumed by the packager.

Types here represent configuration after all defaulting and merging has
happened. The packager does not read manifests or apply defaults itself;
callers hand it a complete [PackageConfig] and [PackageConfig::validate]
rejects values that violate the invariants every later stage relies on.
*/

use {
    crate::{
        error::{PackagerError, Result},
        scripts::MaintainerScript,
    },
    serde::{Deserialize, Serialize},
    std::path::Path,
    strum::{Display, EnumString},
};

/// Systemd restart policy for the packaged service.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RestartPolicy {
    Always,
    OnFailure,
    No,
}

/// File selection patterns and the target install location.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSpec {
    /// Glob patterns naming the files to install.
    pub include: Vec<String>,
    /// Glob patterns removed from every include match set.
    pub exclude: Vec<String>,
    /// Glob patterns naming files dpkg should treat as conffiles.
    pub config_include: Vec<String>,
    /// Glob patterns removed from every conffile match set.
    pub config_exclude: Vec<String>,
    /// Absolute directory the selected files are installed under.
    pub install_path: String,
}

/// Description of the systemd service shipped with the package.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Account the service runs as.
    pub user: String,
    /// Group the service runs as.
    pub group: String,
    /// Entry point, relative to the install path.
    pub entry_point: String,
    pub restart: RestartPolicy,
    /// Seconds systemd waits before a restart.
    pub restart_sec: u32,
    /// Whether `postinst` enables the unit.
    pub enable_service: bool,
    /// Whether `postinst` starts the unit.
    pub start_service: bool,
    /// Whether the entry point is launched through the node runtime
    /// executable rather than directly.
    pub use_node_executor: bool,
}

/// Optional user-supplied maintainer-script fragments.
///
/// Each value is a path, absolute or relative to the source directory.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomScripts {
    pub preinst: Option<String>,
    pub postinst: Option<String>,
    pub prerm: Option<String>,
    pub postrm: Option<String>,
}

impl CustomScripts {
    /// Configured fragment path for the given hook.
    pub fn path_for(&self, script: MaintainerScript) -> Option<&str> {
        match script {
            MaintainerScript::Preinst => self.preinst.as_deref(),
            MaintainerScript::Postinst => self.postinst.as_deref(),
            MaintainerScript::Prerm => self.prerm.as_deref(),
            MaintainerScript::Postrm => self.postrm.as_deref(),
        }
    }
}

/// A fully-resolved package build description.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageConfig {
    pub name: String,
    pub version: String,
    pub architecture: String,
    pub maintainer: String,
    pub description: String,
    /// Runtime package dependencies, in the order they appear in `Depends`.
    pub depends: Vec<String>,
    pub files: FileSpec,
    pub systemd: ServiceSpec,
    pub custom_scripts: Option<CustomScripts>,
}

impl PackageConfig {
    /// Verify the invariants the build pipeline relies on.
    ///
    /// Violations are configuration errors and are reported before any
    /// filesystem mutation happens.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(PackagerError::Config("package name is empty".into()));
        }

        if self.version.is_empty() {
            return Err(PackagerError::Config("package version is empty".into()));
        }

        if self.files.install_path.is_empty() {
            return Err(PackagerError::Config("install path is empty".into()));
        }

        if !Path::new(&self.files.install_path).is_absolute() {
            return Err(PackagerError::Config(format!(
                "install path is not absolute: {}",
                self.files.install_path
            )));
        }

        // Surface malformed patterns here, before the build mutates the
        // filesystem; selection would otherwise fail mid-pipeline.
        for pattern in self
            .files
            .include
            .iter()
            .chain(&self.files.exclude)
            .chain(&self.files.config_include)
            .chain(&self.files.config_exclude)
        {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }

    /// Deterministic output file name: `<name>_<version>_<architecture>.deb`.
    pub fn package_file_name(&self) -> String {
        format!(
            "{}_{}_{}.deb",
            self.name, self.version, self.architecture
        )
    }
}
