// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum PackagerError {
    #[error("invalid build configuration: {0}")]
    Config(String),

    #[error("glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("glob iteration error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on path {0}: {1:?}")]
    IoPath(String, std::io::Error),

    #[error("path prefix error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    #[error("ar member name not representable: {0}")]
    ArMemberName(String),

    #[error("ar header field {0} does not fit its slot: {1}")]
    ArHeaderField(&'static str, String),
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, PackagerError>;
