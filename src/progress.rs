// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Build progress events. */

/// Receives progress events emitted while a package builds.
///
/// All methods have no-op default implementations. Builds behave
/// identically whether or not a reporter is attached; reporters observe,
/// they never steer.
pub trait ProgressReporter: Sync {
    /// A named pipeline phase began.
    fn phase(&self, _name: &str) {}

    /// Forward progress within the running phase.
    fn progress(&self, _completed: usize, _total: usize, _detail: &str) {}
}

/// Reporter that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {}
