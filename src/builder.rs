// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The package build orchestrator.

[PackageBuilder] sequences the whole pipeline: prepare the working
directories, write the version marker and control metadata, select and
stage files, render the service unit and maintainer scripts, build the
control and data archives, and pack the final ar container.

The pipeline is linear with one fan-out point: the two archives read
disjoint subtrees of the temp directory and are built on scoped threads,
joined before packing. The temp directory is exclusively owned by one
build at a time; callers running concurrent builds must use distinct
output directories.
*/

use {
    crate::{
        ar::{self, ArEntry},
        config::PackageConfig,
        control,
        error::{PackagerError, Result},
        progress::{NullReporter, ProgressReporter},
        scripts::{self, MaintainerScript},
        selector, staging, systemd, tarball,
    },
    log::info,
    std::{
        fs, io,
        io::Write,
        path::{Path, PathBuf},
        thread,
        time::{SystemTime, UNIX_EPOCH},
    },
    strum::IntoEnumIterator,
};

/// Content of the `debian-binary` version marker.
const DEBIAN_BINARY: &str = "2.0\n";

/// Name of the per-build scratch directory inside the output directory.
const TEMP_DIR_NAME: &str = ".temp";

/// Prepares the source tree before packaging and restores it afterwards.
///
/// The typical use is pruning development dependencies (e.g.
/// `npm prune --omit=dev`) so they never enter the data archive, then
/// reinstalling them once the archive is built. `prune` runs before any
/// file is collected; `restore` runs after the data archive completes.
pub trait DependencyPruner: Sync {
    fn prune(&self) -> Result<()>;

    fn restore(&self) -> Result<()>;
}

/// Builds a `.deb` package from a resolved configuration and a source tree.
pub struct PackageBuilder<'a> {
    config: PackageConfig,
    source_dir: PathBuf,
    output_dir: PathBuf,
    temp_dir: PathBuf,
    template_dir: PathBuf,
    progress: &'a dyn ProgressReporter,
    pruner: Option<&'a dyn DependencyPruner>,
}

impl<'a> PackageBuilder<'a> {
    /// Construct a builder after validating the configuration.
    ///
    /// `template_dir` must contain `systemd.service`, `postinst.sh`, and
    /// `prerm.sh`. Configuration errors are reported here, before any
    /// filesystem mutation.
    pub fn new(
        source_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        template_dir: impl AsRef<Path>,
        config: PackageConfig,
    ) -> Result<Self> {
        config.validate()?;

        let output_dir = output_dir.as_ref().to_path_buf();

        Ok(Self {
            config,
            source_dir: source_dir.as_ref().to_path_buf(),
            temp_dir: output_dir.join(TEMP_DIR_NAME),
            output_dir,
            template_dir: template_dir.as_ref().to_path_buf(),
            progress: &NullReporter,
            pruner: None,
        })
    }

    /// Attach a progress reporter.
    pub fn progress_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.progress = reporter;
        self
    }

    /// Attach a dependency pruner invoked around file collection.
    pub fn dependency_pruner(mut self, pruner: &'a dyn DependencyPruner) -> Self {
        self.pruner = Some(pruner);
        self
    }

    /// Run the build pipeline and return the path of the written package.
    pub fn build(&self) -> Result<PathBuf> {
        info!(
            "building {} from {}",
            self.config.package_file_name(),
            self.source_dir.display()
        );

        self.progress.phase("prepare directories");
        self.prepare_directories()?;

        if let Some(pruner) = self.pruner {
            self.progress.phase("prune dependencies");
            pruner.prune()?;
        }

        self.progress.phase("write version marker");
        fs::write(self.temp_dir.join("debian-binary"), DEBIAN_BINARY)?;

        self.progress.phase("write control metadata");
        fs::write(
            self.temp_dir.join("control"),
            control::render_control(&self.config),
        )?;

        self.progress.phase("select configuration files");
        let install_root = self.temp_dir.join("install");
        let config_files = selector::select_files(
            &self.config.files.config_include,
            &self.config.files.config_exclude,
            &self.source_dir,
        )?;
        staging::copy_selected_files(
            &install_root,
            &self.config.files.install_path,
            &config_files,
        )?;

        let conffiles = control::render_conffiles(&staging::install_paths(
            &self.config.files.install_path,
            &config_files,
        ));
        let has_conffiles = conffiles.is_some();
        if let Some(text) = conffiles {
            fs::write(self.temp_dir.join("conffiles"), text)?;
        }

        self.progress.phase("render service unit");
        let unit_template = self.read_template("systemd.service")?;
        let unit = systemd::render_service_unit(&self.config, &unit_template);
        let unit_file_name = systemd::unit_file_name(&self.config);
        fs::write(self.temp_dir.join(&unit_file_name), &unit)?;

        self.progress.phase("compose maintainer scripts");
        let emitted_scripts = self.write_maintainer_scripts()?;

        self.progress.phase("stage install tree");
        let data_files = selector::select_files(
            &self.config.files.include,
            &self.config.files.exclude,
            &self.source_dir,
        )?;
        staging::copy_selected_files(&install_root, &self.config.files.install_path, &data_files)?;
        staging::write_service_unit(&install_root, &unit_file_name, &unit)?;

        let staged = config_files.len() + data_files.len();
        self.progress.progress(staged, staged, "files staged");

        self.progress.phase("build archives");
        let mut control_members = vec!["control".to_string()];
        control_members.extend(
            emitted_scripts
                .iter()
                .map(|script| script.file_name().to_string()),
        );
        if has_conffiles {
            control_members.push("conffiles".to_string());
        }

        let (control_tar, data_tar) = thread::scope(|scope| {
            let control =
                scope.spawn(|| tarball::tar_gz_members(&self.temp_dir, &control_members));
            let data = scope.spawn(|| tarball::tar_gz_directory(&install_root));

            (join_archive(control), join_archive(data))
        });
        let control_tar = control_tar?;
        let data_tar = data_tar?;

        fs::write(self.temp_dir.join("control.tar.gz"), &control_tar)?;
        fs::write(self.temp_dir.join("data.tar.gz"), &data_tar)?;

        if let Some(pruner) = self.pruner {
            self.progress.phase("restore dependencies");
            pruner.restore()?;
        }

        self.progress.phase("pack ar container");
        let mtime = mtime();
        let entries = [
            ArEntry::new("debian-binary", DEBIAN_BINARY.as_bytes().to_vec(), mtime)?,
            ArEntry::new("control.tar.gz", control_tar, mtime)?,
            ArEntry::new("data.tar.gz", data_tar, mtime)?,
        ];

        let output_file = self.output_dir.join(self.config.package_file_name());
        let mut writer = io::BufWriter::new(fs::File::create(&output_file).map_err(
            |error| PackagerError::IoPath(output_file.display().to_string(), error),
        )?);
        ar::write_archive(&mut writer, &entries)?;
        writer.flush()?;

        info!("wrote package {}", output_file.display());

        Ok(output_file)
    }

    /// Remove any previous output tree and recreate the working
    /// directories. Re-running a build therefore starts from a clean
    /// slate; a stale temp directory left by a crashed build is removed
    /// here as well.
    fn prepare_directories(&self) -> Result<()> {
        match fs::remove_dir_all(&self.output_dir) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                return Err(PackagerError::IoPath(
                    self.output_dir.display().to_string(),
                    error,
                ))
            }
        }

        fs::create_dir_all(&self.temp_dir)?;

        Ok(())
    }

    /// Compose and write the maintainer scripts that produced content.
    ///
    /// Returns the emitted hooks in lifecycle order so the control archive
    /// includes exactly those members.
    fn write_maintainer_scripts(&self) -> Result<Vec<MaintainerScript>> {
        let vars = systemd::script_vars(&self.config);
        let mut emitted = Vec::new();

        for script in MaintainerScript::iter() {
            let template_text = match script {
                MaintainerScript::Postinst => Some(self.read_template("postinst.sh")?),
                MaintainerScript::Prerm => Some(self.read_template("prerm.sh")?),
                MaintainerScript::Preinst | MaintainerScript::Postrm => None,
            };

            let fragment = scripts::read_custom_fragment(
                &self.source_dir,
                self.config
                    .custom_scripts
                    .as_ref()
                    .and_then(|custom| custom.path_for(script)),
            );

            if let Some(content) =
                scripts::compose(script, template_text.as_deref(), &vars, fragment.as_deref())
            {
                scripts::write_script(&self.temp_dir.join(script.file_name()), &content)?;
                emitted.push(script);
            }
        }

        Ok(emitted)
    }

    fn read_template(&self, name: &str) -> Result<String> {
        let path = self.template_dir.join(name);

        fs::read_to_string(&path)
            .map_err(|error| PackagerError::IoPath(path.display().to_string(), error))
    }
}

fn join_archive(handle: thread::ScopedJoinHandle<'_, Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

fn mtime() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("times before UNIX epoch not accepted")
        .as_secs()
}
