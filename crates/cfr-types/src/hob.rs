//! Hand-off block (HOB) list scanning.
//!
//! The boot environment hands over each CFR form tree as the payload of a
//! GUID-extension HOB. A HOB list is a packed sequence of records:
//!
//! ```text
//! ┌────────────┬──────────────┬────────────────┬─────────────────────────┐
//! │ type (u16) │ length (u16) │ reserved (u32) │ type-specific body      │
//! └────────────┴──────────────┴────────────────┴─────────────────────────┘
//! GUID extension body: name (16-byte GUID), then `length - 24` data bytes.
//! ```
//!
//! [`HobList::guid_data`] plays the role of "get first / get next GUID HOB":
//! it yields every matching payload in list order.

use cfr_error::{CfrError, Result};
use tracing::warn;

use crate::encoding::slice_at;
use crate::guid::{GUID_SIZE, Guid};

/// Generic HOB header length.
pub const HOB_HEADER_SIZE: usize = 8;
/// HOB type of a GUID extension.
pub const HOB_TYPE_GUID_EXTENSION: u16 = 0x0004;
/// HOB type terminating the list.
pub const HOB_TYPE_END_OF_LIST: u16 = 0xFFFF;

/// One entry of a HOB list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hob<'a> {
    pub hob_type: u16,
    pub offset: usize,
    /// Whole HOB, header included.
    pub bytes: &'a [u8],
}

impl<'a> Hob<'a> {
    /// For a GUID extension HOB, its name and data.
    #[must_use]
    pub fn as_guid_extension(&self) -> Option<(Guid, &'a [u8])> {
        if self.hob_type != HOB_TYPE_GUID_EXTENSION {
            return None;
        }
        let name_end = HOB_HEADER_SIZE + GUID_SIZE;
        let name: [u8; GUID_SIZE] = self.bytes.get(HOB_HEADER_SIZE..name_end)?.try_into().ok()?;
        Some((Guid::from_bytes(name), &self.bytes[name_end..]))
    }
}

/// A borrowed HOB list.
#[derive(Debug, Clone, Copy)]
pub struct HobList<'a> {
    buf: &'a [u8],
}

impl<'a> HobList<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Iterate HOBs until the end-of-list marker or the end of the buffer.
    #[must_use]
    pub const fn iter(&self) -> HobIter<'a> {
        HobIter {
            buf: self.buf,
            offset: 0,
            done: false,
        }
    }

    /// Payloads of every GUID extension HOB named `guid`, in list order.
    ///
    /// Stops at the first malformed HOB; everything yielded before it is
    /// still valid.
    pub fn guid_data(&self, guid: Guid) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.iter()
            .map_while(|hob| match hob {
                Ok(hob) => Some(hob),
                Err(error) => {
                    warn!(error = %error, "malformed HOB list, stopping scan");
                    None
                }
            })
            .filter_map(move |hob| match hob.as_guid_extension() {
                Some((name, data)) if name == guid => Some(data),
                _ => None,
            })
    }
}

/// Iterator over a [`HobList`].
#[derive(Debug, Clone)]
pub struct HobIter<'a> {
    buf: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> HobIter<'a> {
    fn read_hob(&self) -> Result<Hob<'a>> {
        let header = slice_at(self.buf, self.offset, HOB_HEADER_SIZE, self.buf.len())?;
        let hob_type = u16::from_le_bytes([header[0], header[1]]);
        let raw_length = u16::from_le_bytes([header[2], header[3]]);
        let length = usize::from(raw_length);
        if hob_type == HOB_TYPE_END_OF_LIST {
            return Ok(Hob {
                hob_type,
                offset: self.offset,
                bytes: header,
            });
        }
        let min = if hob_type == HOB_TYPE_GUID_EXTENSION {
            HOB_HEADER_SIZE + GUID_SIZE
        } else {
            HOB_HEADER_SIZE
        };
        if length < min {
            return Err(CfrError::RecordTooSmall {
                offset: self.offset,
                tag: u32::from(hob_type),
                size: u32::from(raw_length),
                min,
            });
        }
        let bytes = slice_at(self.buf, self.offset, length, self.buf.len())?;
        Ok(Hob {
            hob_type,
            offset: self.offset,
            bytes,
        })
    }
}

impl<'a> Iterator for HobIter<'a> {
    type Item = Result<Hob<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.buf.len() {
            return None;
        }
        match self.read_hob() {
            Ok(hob) if hob.hob_type == HOB_TYPE_END_OF_LIST => {
                self.done = true;
                None
            }
            Ok(hob) => {
                self.offset += hob.bytes.len();
                Some(Ok(hob))
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

/// Build a GUID extension HOB around `data`, padded to 8 bytes.
pub fn encode_guid_hob(guid: Guid, data: &[u8]) -> Result<Vec<u8>> {
    let unpadded = HOB_HEADER_SIZE + GUID_SIZE + data.len();
    let length = unpadded.div_ceil(8) * 8;
    let raw_length = u16::try_from(length).map_err(|_| {
        CfrError::internal(format!("{} data bytes do not fit in one HOB", data.len()))
    })?;
    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(&HOB_TYPE_GUID_EXTENSION.to_le_bytes());
    out.extend_from_slice(&raw_length.to_le_bytes());
    out.extend_from_slice(&[0_u8; 4]);
    out.extend_from_slice(&guid.to_bytes());
    out.extend_from_slice(data);
    out.resize(length, 0);
    Ok(out)
}

/// The end-of-list HOB.
#[must_use]
pub fn encode_end_of_list() -> Vec<u8> {
    let mut out = Vec::with_capacity(HOB_HEADER_SIZE);
    out.extend_from_slice(&HOB_TYPE_END_OF_LIST.to_le_bytes());
    out.extend_from_slice(&8_u16.to_le_bytes());
    out.extend_from_slice(&[0_u8; 4]);
    out
}
