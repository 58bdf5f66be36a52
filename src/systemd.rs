// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Generation of the packaged systemd service unit. */

use {
    crate::{config::PackageConfig, template},
    std::collections::BTreeMap,
};

/// Directory under the install root where the unit file is placed.
pub const UNIT_INSTALL_DIR: &str = "lib/systemd/system";

/// Path of the node runtime executable used when the entry point is run
/// through the interpreter rather than directly.
const NODE_EXECUTOR: &str = "/usr/bin/node";

/// Render the service unit template for this package.
pub fn render_service_unit(config: &PackageConfig, template_text: &str) -> String {
    let vars: BTreeMap<&str, String> = [
        ("description", config.description.clone()),
        ("user", config.systemd.user.clone()),
        ("group", config.systemd.group.clone()),
        ("entryPoint", exec_start(config)),
        ("workingDirectory", config.files.install_path.clone()),
        ("restart", config.systemd.restart.to_string()),
        ("restartSec", config.systemd.restart_sec.to_string()),
    ]
    .into_iter()
    .collect();

    template::render(template_text, &vars)
}

/// Placeholder map shared by the maintainer-script templates.
pub fn script_vars(config: &PackageConfig) -> BTreeMap<&str, String> {
    [
        ("name", config.name.clone()),
        ("user", config.systemd.user.clone()),
        ("group", config.systemd.group.clone()),
        ("enableService", config.systemd.enable_service.to_string()),
        ("startService", config.systemd.start_service.to_string()),
    ]
    .into_iter()
    .collect()
}

/// File name of the generated unit.
pub fn unit_file_name(config: &PackageConfig) -> String {
    format!("{}.service", config.name)
}

/// The fully-qualified `ExecStart` value: the entry point joined under the
/// install path, optionally prefixed with the node runtime executable.
fn exec_start(config: &PackageConfig) -> String {
    let install_path = config.files.install_path.trim_matches('/');
    let entry_point = config.systemd.entry_point.trim_start_matches('/');
    let target = format!("/{}/{}", install_path, entry_point);

    if config.systemd.use_node_executor {
        format!("{} {}", NODE_EXECUTOR, target)
    } else {
        target
    }
}
