// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Creation of the gzip-compressed tar members of a package. */

use {
    crate::error::Result,
    log::debug,
    std::path::Path,
};

/// Create a gzip-compressed tarball from the full contents of a directory.
///
/// Entry paths are relative to `root`. The walk is sorted so archive
/// content does not depend on filesystem iteration order, and symlinks are
/// followed so the archive stores file content rather than links.
pub fn tar_gz_directory(root: &Path) -> Result<Vec<u8>> {
    let mut tar_data = Vec::new();

    {
        let mut builder = tar::Builder::new(&mut tar_data);
        builder.mode(tar::HeaderMode::Deterministic);
        builder.follow_symlinks(true);

        // The tar crate isn't deterministic when iterating directories, so
        // iteration happens here.
        let walk =
            walkdir::WalkDir::new(root).sort_by(|a, b| a.file_name().cmp(b.file_name()));

        for entry in walk {
            let entry = entry?;
            let path = entry.path();

            if path == root {
                continue;
            }

            let archive_path = path.strip_prefix(root)?;

            debug!("adding {} as {}", path.display(), archive_path.display());
            builder.append_path_with_name(path, archive_path)?;
        }

        builder.finish()?;
    }

    gzip(&tar_data)
}

/// Create a gzip-compressed tarball from named members of a directory.
///
/// Members are archived in the order given, each under its bare name.
pub fn tar_gz_members(dir: &Path, members: &[String]) -> Result<Vec<u8>> {
    let mut tar_data = Vec::new();

    {
        let mut builder = tar::Builder::new(&mut tar_data);
        builder.mode(tar::HeaderMode::Deterministic);

        for member in members {
            builder.append_path_with_name(dir.join(member), member)?;
        }

        builder.finish()?;
    }

    gzip(&tar_data)
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let header = libflate::gzip::HeaderBuilder::new().finish();

    let mut buffer = Vec::new();
    let mut encoder = libflate::gzip::Encoder::with_options(
        &mut buffer,
        libflate::gzip::EncodeOptions::new().header(header),
    )?;
    std::io::copy(&mut std::io::Cursor::new(data), &mut encoder)?;
    encoder.finish().into_result()?;

    Ok(buffer)
}
