use std::fmt;
use std::str::FromStr;

use cfr_error::CfrError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A firmware GUID.
///
/// Stored in the mixed-endian wire layout: the first three groups are
/// little-endian integers, the last eight bytes are taken as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

/// Wire size of a GUID.
pub const GUID_SIZE: usize = 16;

/// Formset GUID of the CFR setup menu.
pub const SETUP_MENU_FORMSET_GUID: Guid = Guid::from_fields(
    0x93E6_FCD9,
    0x8E17,
    0x43DF,
    [0xB7, 0xF0, 0x91, 0x3E, 0x58, 0xB1, 0xA7, 0x89],
);

impl Guid {
    #[must_use]
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Decode from wire bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; GUID_SIZE]) -> Self {
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4: [
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14],
                bytes[15],
            ],
        }
    }

    /// Encode to wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; GUID_SIZE] {
        let mut out = [0_u8; GUID_SIZE];
        out[0..4].copy_from_slice(&self.data1.to_le_bytes());
        out[4..6].copy_from_slice(&self.data2.to_le_bytes());
        out[6..8].copy_from_slice(&self.data3.to_le_bytes());
        out[8..16].copy_from_slice(&self.data4);
        out
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

impl FromStr for Guid {
    type Err = CfrError;

    /// Parse the canonical `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CfrError::InvalidGuid { text: s.to_owned() };
        let groups: Vec<&str> = s.split('-').collect();
        let lengths = [8, 4, 4, 4, 12];
        if groups.len() != lengths.len()
            || groups
                .iter()
                .zip(lengths)
                .any(|(group, len)| {
                    group.len() != len || !group.bytes().all(|byte| byte.is_ascii_hexdigit())
                })
        {
            return Err(invalid());
        }

        let data1 = u32::from_str_radix(groups[0], 16).map_err(|_| invalid())?;
        let data2 = u16::from_str_radix(groups[1], 16).map_err(|_| invalid())?;
        let data3 = u16::from_str_radix(groups[2], 16).map_err(|_| invalid())?;
        let tail = format!("{}{}", groups[3], groups[4]);
        let mut data4 = [0_u8; 8];
        for (index, byte) in data4.iter_mut().enumerate() {
            let pair = tail.get(index * 2..index * 2 + 2).ok_or_else(invalid)?;
            *byte = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        }
        Ok(Self {
            data1,
            data2,
            data3,
            data4,
        })
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
