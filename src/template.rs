// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Placeholder substitution for generated files. */

use std::collections::BTreeMap;

/// Replace every `{{key}}` occurrence in `template` with its value.
///
/// Keys absent from the template are ignored. Placeholders with no matching
/// key are left in place. This is a pure text transform: identical inputs
/// always yield identical output, and the `BTreeMap` keeps substitution
/// order independent of how the map was populated.
pub fn render(template: &str, vars: &BTreeMap<&str, String>) -> String {
    let mut rendered = template.to_string();

    for (key, value) in vars {
        rendered = rendered.replace(&format!("{{{{{}}}}}", key), value);
    }

    rendered
}
