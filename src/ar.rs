// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Unix ar container writing.

A `.deb` file is a common-format ar archive with exactly three members:
`debian-binary`, `control.tar.gz`, and `data.tar.gz`, in that order. The
container format is fixed: an 8-byte magic, then per member a 60-byte
header of left-justified, space-padded ASCII fields followed by the raw
content and a single `\n` pad byte when the content length is odd.

This is the one part of the crate with a bit-exact external contract; a
single malformed header field produces a package `dpkg` and `ar` refuse to
read.
*/

use {
    crate::error::{PackagerError, Result},
    std::io::Write,
};

/// Magic bytes opening every ar archive.
pub const MAGIC: &[u8; 8] = b"!<arch>\n";

/// Encoded size of a member header.
pub const HEADER_LEN: usize = 60;

/// Width of the header's name field, the longest member name expressible.
const NAME_WIDTH: usize = 16;

/// A member of an ar archive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArEntry {
    name: String,
    mtime: u64,
    uid: u32,
    gid: u32,
    mode: u32,
    data: Vec<u8>,
}

impl ArEntry {
    /// Create a regular-file member owned by root with mode 0644.
    ///
    /// The name must be ASCII and at most 16 bytes, the widest value the
    /// header's name field can carry.
    pub fn new(name: impl Into<String>, data: Vec<u8>, mtime: u64) -> Result<Self> {
        let name = name.into();

        if name.len() > NAME_WIDTH || !name.is_ascii() {
            return Err(PackagerError::ArMemberName(name));
        }

        Ok(Self {
            name,
            mtime,
            uid: 0,
            gid: 0,
            mode: 0o100_644,
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encode the fixed 60-byte member header.
    pub fn encode_header(&self) -> Result<[u8; HEADER_LEN]> {
        let mut header = [b' '; HEADER_LEN];

        write_field(&mut header[0..16], "name", &self.name)?;
        write_field(&mut header[16..28], "mtime", &self.mtime.to_string())?;
        write_field(&mut header[28..34], "uid", &self.uid.to_string())?;
        write_field(&mut header[34..40], "gid", &self.gid.to_string())?;
        write_field(&mut header[40..48], "mode", &format!("{:o}", self.mode))?;
        write_field(&mut header[48..58], "size", &self.data.len().to_string())?;
        header[58] = b'`';
        header[59] = b'\n';

        Ok(header)
    }

    /// Write the header, content, and alignment padding for this member.
    ///
    /// Content is padded to an even offset with a single `\n`, exactly when
    /// its length is odd.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode_header()?)?;
        writer.write_all(&self.data)?;

        if self.data.len() % 2 == 1 {
            writer.write_all(b"\n")?;
        }

        Ok(())
    }
}

/// Serialize a complete archive from the ordered member list.
pub fn write_archive<W: Write>(writer: &mut W, entries: &[ArEntry]) -> Result<()> {
    writer.write_all(MAGIC)?;

    for entry in entries {
        entry.write(writer)?;
    }

    Ok(())
}

/// Left-justify `value` into `slot`, leaving the space padding in place.
fn write_field(slot: &mut [u8], field: &'static str, value: &str) -> Result<()> {
    if value.len() > slot.len() {
        return Err(PackagerError::ArHeaderField(field, value.to_string()));
    }

    slot[..value.len()].copy_from_slice(value.as_bytes());

    Ok(())
}
