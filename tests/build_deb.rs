// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! End-to-end package builds against real source trees. */

use {
    deb_packager::{
        builder::{DependencyPruner, PackageBuilder},
        config::{CustomScripts, FileSpec, PackageConfig, RestartPolicy, ServiceSpec},
        error::Result,
    },
    std::{
        fs,
        io::Read,
        path::{Path, PathBuf},
        sync::atomic::{AtomicUsize, Ordering},
    },
};

fn template_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

fn demo_config() -> PackageConfig {
    PackageConfig {
        name: "demo".into(),
        version: "1.0.0".into(),
        architecture: "all".into(),
        maintainer: "Example <maintainer@example.com>".into(),
        description: "demo service".into(),
        depends: vec!["nodejs".into()],
        files: FileSpec {
            include: vec!["index.js".into()],
            exclude: vec![],
            config_include: vec![],
            config_exclude: vec![],
            install_path: "/usr/share/demo".into(),
        },
        systemd: ServiceSpec {
            user: "demo".into(),
            group: "demo".into(),
            entry_point: "index.js".into(),
            restart: RestartPolicy::Always,
            restart_sec: 10,
            enable_service: true,
            start_service: true,
            use_node_executor: true,
        },
        custom_scripts: None,
    }
}

/// Parse an ar archive into (name, content) pairs, checking the container
/// contract along the way.
fn read_ar(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    assert_eq!(&data[0..8], b"!<arch>\n", "ar magic");

    let mut members = Vec::new();
    let mut offset = 8;

    while offset < data.len() {
        let header = &data[offset..offset + 60];
        assert_eq!(&header[58..60], b"`\n", "header terminator");

        let name = std::str::from_utf8(&header[0..16])
            .unwrap()
            .trim_end()
            .to_string();
        let size: usize = std::str::from_utf8(&header[48..58])
            .unwrap()
            .trim_end()
            .parse()
            .unwrap();

        offset += 60;
        members.push((name, data[offset..offset + size].to_vec()));
        offset += size;

        if size % 2 == 1 {
            assert_eq!(data[offset], b'\n', "pad byte after odd-length member");
            offset += 1;
        }
    }

    members
}

/// Decode a gzip-compressed tar member into (path, content) pairs.
fn read_tar_gz(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut tar_data = Vec::new();
    libflate::gzip::Decoder::new(std::io::Cursor::new(data))?.read_to_end(&mut tar_data)?;

    let mut archive = tar::Archive::new(std::io::Cursor::new(tar_data));
    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry
            .path()?
            .display()
            .to_string()
            .trim_end_matches('/')
            .to_string();

        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        entries.push((path, content));
    }

    Ok(entries)
}

fn member<'a>(members: &'a [(String, Vec<u8>)], name: &str) -> &'a [u8] {
    &members
        .iter()
        .find(|(member_name, _)| member_name == name)
        .unwrap_or_else(|| panic!("member {} missing", name))
        .1
}

fn entry_content(entries: &[(String, Vec<u8>)], path: &str) -> String {
    String::from_utf8_lossy(
        &entries
            .iter()
            .find(|(entry_path, _)| entry_path == path)
            .unwrap_or_else(|| panic!("entry {} missing", path))
            .1,
    )
    .to_string()
}

#[test]
fn test_demo_package_layout() -> Result<()> {
    let source = tempfile::tempdir()?;
    fs::write(source.path().join("index.js"), "console.log('hi');\n")?;

    let output_dir = source.path().join("deb");
    let builder = PackageBuilder::new(source.path(), &output_dir, template_dir(), demo_config())?;
    let deb_path = builder.build()?;

    assert_eq!(deb_path, output_dir.join("demo_1.0.0_all.deb"));

    let members = read_ar(&fs::read(&deb_path)?);
    let names: Vec<&str> = members.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["debian-binary", "control.tar.gz", "data.tar.gz"]);

    assert_eq!(member(&members, "debian-binary"), b"2.0\n");

    let control_entries = read_tar_gz(member(&members, "control.tar.gz"))?;
    let control = entry_content(&control_entries, "control");
    assert!(control.starts_with("Package: demo\nVersion: 1.0.0\nArchitecture: all\n"));
    assert!(control.contains("Depends: nodejs\n"));
    assert!(control.ends_with("\n\n"));

    let data_entries = read_tar_gz(member(&members, "data.tar.gz"))?;
    let data_paths: Vec<&str> = data_entries
        .iter()
        .map(|(path, _)| path.as_str())
        .collect();
    assert!(data_paths.contains(&"usr/share/demo/index.js"));
    assert!(data_paths.contains(&"lib/systemd/system/demo.service"));

    assert_eq!(
        entry_content(&data_entries, "usr/share/demo/index.js"),
        "console.log('hi');\n"
    );

    let unit = entry_content(&data_entries, "lib/systemd/system/demo.service");
    assert!(unit.contains("Description=demo service"));
    assert!(unit.contains("ExecStart=/usr/bin/node /usr/share/demo/index.js"));
    assert!(unit.contains("Restart=always"));
    assert!(!unit.contains("{{"));

    Ok(())
}

#[test]
fn test_default_control_members_and_order() -> Result<()> {
    let source = tempfile::tempdir()?;
    fs::write(source.path().join("index.js"), "main\n")?;

    let builder = PackageBuilder::new(
        source.path(),
        source.path().join("deb"),
        template_dir(),
        demo_config(),
    )?;
    let deb_path = builder.build()?;

    let members = read_ar(&fs::read(deb_path)?);
    let control_entries = read_tar_gz(member(&members, "control.tar.gz"))?;
    let paths: Vec<&str> = control_entries
        .iter()
        .map(|(path, _)| path.as_str())
        .collect();

    // No custom preinst/postrm and no conffiles: only the templated hooks.
    assert_eq!(paths, vec!["control", "postinst", "prerm"]);

    let postinst = entry_content(&control_entries, "postinst");
    assert!(postinst.starts_with("#!/bin/sh\n"));
    assert!(postinst.contains("systemctl enable \"demo.service\""));
    assert!(postinst.contains("systemctl start \"demo.service\""));

    let prerm = entry_content(&control_entries, "prerm");
    assert!(prerm.contains("systemctl stop \"demo.service\""));

    Ok(())
}

#[test]
fn test_custom_postinst_fragment_runs_before_exit() -> Result<()> {
    let source = tempfile::tempdir()?;
    fs::write(source.path().join("index.js"), "main\n")?;
    fs::create_dir_all(source.path().join("scripts"))?;
    fs::write(
        source.path().join("scripts/extra.sh"),
        "echo extra-step\n",
    )?;

    let mut config = demo_config();
    config.custom_scripts = Some(CustomScripts {
        postinst: Some("scripts/extra.sh".into()),
        ..CustomScripts::default()
    });

    let builder = PackageBuilder::new(
        source.path(),
        source.path().join("deb"),
        template_dir(),
        config,
    )?;
    let deb_path = builder.build()?;

    let members = read_ar(&fs::read(deb_path)?);
    let control_entries = read_tar_gz(member(&members, "control.tar.gz"))?;
    let postinst = entry_content(&control_entries, "postinst");

    // Template boilerplate and the fragment are both present, fragment
    // before the final exit 0.
    assert!(postinst.contains("systemctl daemon-reload"));
    assert!(postinst.contains("# Custom postinst script"));
    let fragment_at = postinst.find("echo extra-step").unwrap();
    let exit_at = postinst.rfind("exit 0").unwrap();
    assert!(fragment_at < exit_at);
    assert!(postinst.trim_end().ends_with("exit 0"));

    Ok(())
}

#[test]
fn test_custom_preinst_gets_minimal_wrapper() -> Result<()> {
    let source = tempfile::tempdir()?;
    fs::write(source.path().join("index.js"), "main\n")?;
    fs::write(source.path().join("before.sh"), "echo before\n")?;

    let mut config = demo_config();
    config.custom_scripts = Some(CustomScripts {
        preinst: Some("before.sh".into()),
        ..CustomScripts::default()
    });

    let builder = PackageBuilder::new(
        source.path(),
        source.path().join("deb"),
        template_dir(),
        config,
    )?;
    let deb_path = builder.build()?;

    let members = read_ar(&fs::read(deb_path)?);
    let control_entries = read_tar_gz(member(&members, "control.tar.gz"))?;
    let paths: Vec<&str> = control_entries
        .iter()
        .map(|(path, _)| path.as_str())
        .collect();
    assert_eq!(paths, vec!["control", "preinst", "postinst", "prerm"]);

    let preinst = entry_content(&control_entries, "preinst");
    assert!(preinst.starts_with("#!/bin/sh\nset -e\n"));
    assert!(preinst.contains("echo before"));
    assert!(preinst.trim_end().ends_with("exit 0"));

    Ok(())
}

#[test]
fn test_conffiles_emitted_with_install_paths() -> Result<()> {
    let source = tempfile::tempdir()?;
    fs::write(source.path().join("index.js"), "main\n")?;
    fs::create_dir_all(source.path().join("config"))?;
    fs::write(source.path().join("config/app.json"), "{}\n")?;

    let mut config = demo_config();
    config.files.config_include = vec!["config/*.json".into()];

    let builder = PackageBuilder::new(
        source.path(),
        source.path().join("deb"),
        template_dir(),
        config,
    )?;
    let deb_path = builder.build()?;

    let members = read_ar(&fs::read(deb_path)?);

    let control_entries = read_tar_gz(member(&members, "control.tar.gz"))?;
    assert_eq!(
        entry_content(&control_entries, "conffiles"),
        "/usr/share/demo/config/app.json\n"
    );

    // Config-selected files are staged into the data archive as well.
    let data_entries = read_tar_gz(member(&members, "data.tar.gz"))?;
    assert_eq!(
        entry_content(&data_entries, "usr/share/demo/config/app.json"),
        "{}\n"
    );

    Ok(())
}

#[test]
fn test_rebuild_is_deterministic_apart_from_timestamps() -> Result<()> {
    let source = tempfile::tempdir()?;
    fs::write(source.path().join("index.js"), "main\n")?;
    fs::create_dir_all(source.path().join("lib"))?;
    fs::write(source.path().join("lib/util.js"), "util\n")?;

    let mut config = demo_config();
    config.files.include = vec!["**/*.js".into()];

    let run = || -> Result<(Vec<(String, Vec<u8>)>, Vec<(String, Vec<u8>)>)> {
        let builder = PackageBuilder::new(
            source.path(),
            source.path().join("deb"),
            template_dir(),
            config.clone(),
        )?;
        let deb_path = builder.build()?;
        let members = read_ar(&fs::read(deb_path)?);

        Ok((
            read_tar_gz(member(&members, "control.tar.gz"))?,
            read_tar_gz(member(&members, "data.tar.gz"))?,
        ))
    };

    let (first_control, first_data) = run()?;
    let (second_control, second_data) = run()?;

    assert_eq!(first_control, second_control);
    assert_eq!(first_data, second_data);

    Ok(())
}

struct RecordingPruner {
    prunes: AtomicUsize,
    restores: AtomicUsize,
}

impl DependencyPruner for RecordingPruner {
    fn prune(&self) -> Result<()> {
        self.prunes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn restore(&self) -> Result<()> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_dependency_pruner_runs_once_around_collection() -> Result<()> {
    let source = tempfile::tempdir()?;
    fs::write(source.path().join("index.js"), "main\n")?;

    let pruner = RecordingPruner {
        prunes: AtomicUsize::new(0),
        restores: AtomicUsize::new(0),
    };

    let builder = PackageBuilder::new(
        source.path(),
        source.path().join("deb"),
        template_dir(),
        demo_config(),
    )?
    .dependency_pruner(&pruner);
    builder.build()?;

    assert_eq!(pruner.prunes.load(Ordering::SeqCst), 1);
    assert_eq!(pruner.restores.load(Ordering::SeqCst), 1);

    Ok(())
}
