// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian binary package assembly for systemd services.

This crate turns a fully-resolved build description plus a source tree into
a `.deb` package file: an `ar` container holding a `debian-binary` version
marker, a `control.tar.gz` with package metadata and maintainer scripts,
and a `data.tar.gz` with the files to install.

The entry point is [builder::PackageBuilder]. Given a source directory, an
output directory, a template directory, and a validated [config::PackageConfig],
its `build()` method runs the whole pipeline and returns the path of the
produced package:

```no_run
use deb_packager::{builder::PackageBuilder, config::PackageConfig};

# fn example(config: PackageConfig) -> deb_packager::error::Result<()> {
let builder = PackageBuilder::new("/src/myapp", "/src/myapp/deb", "/usr/share/deb-packager/templates", config)?;
let deb = builder.build()?;
println!("wrote {}", deb.display());
# Ok(())
# }
```

# A Tour of Functionality

[config] defines the resolved build description consumed by the rest of the
crate: package identity, file selection patterns, the systemd service
description, and optional custom maintainer-script fragments. The crate
deliberately accepts only fully-resolved values; discovering and merging
configuration sources is a caller concern.

[selector] expands include/exclude glob patterns against the source tree
into concrete file lists. [staging] materializes those files into a
temporary install root mirroring the target filesystem. [template] performs
`{{key}}` placeholder substitution, used by [systemd] for the generated
service unit and by [scripts] for the four dpkg maintainer scripts.

[control] renders the `control` metadata member and the optional
`conffiles` list. [tarball] produces the two gzip-compressed tar archives.
[ar] implements the Unix ar container format byte-for-byte; it is the one
component with a bit-exact external contract, and any deviation produces a
package standard tooling rejects.

[progress] defines the event surface for observing a build, and
[builder::DependencyPruner] is the seam for pruning development
dependencies from the source tree before files are collected.

# Determinism

Given identical configuration and an unchanged source tree, rebuilds
produce archives with identical member lists and metadata; only
timestamp-bearing fields differ. Directory walks are explicitly sorted and
substitution maps are ordered to keep output stable across platforms.
*/

pub mod ar;
pub mod builder;
pub mod config;
pub mod control;
pub mod error;
pub mod progress;
pub mod scripts;
pub mod selector;
pub mod staging;
pub mod systemd;
pub mod tarball;
pub mod template;

pub use crate::{
    builder::PackageBuilder,
    config::PackageConfig,
    error::{PackagerError, Result},
};
