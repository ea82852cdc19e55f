//! Record - one fixed-size entry of the data store.

use std::borrow::Cow;

use crate::common::config::{PAYLOAD_SIZE, RECORD_SIZE};
use crate::common::{Error, Key, Result};

/// A keyed payload with a logical-delete flag.
///
/// # Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     key (i32, little-endian)
/// 4       1     flags (bit 0 = active)
/// 5       3     reserved (zero)
/// 8       64    payload (NUL-padded)
/// 72      4     crc32 over bytes 0..72
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    key: Key,
    active: bool,
    payload: [u8; PAYLOAD_SIZE],
}

impl Record {
    const OFFSET_KEY: usize = 0;
    const OFFSET_FLAGS: usize = 4;
    const OFFSET_PAYLOAD: usize = 8;
    const OFFSET_CRC: usize = Self::OFFSET_PAYLOAD + PAYLOAD_SIZE;

    const FLAG_ACTIVE: u8 = 0b0000_0001;

    /// Create an active record.
    ///
    /// # Errors
    /// Returns `Error::PayloadTooLarge` if `payload` exceeds [`PAYLOAD_SIZE`].
    pub fn new(key: Key, payload: &[u8]) -> Result<Self> {
        if payload.len() > PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                max: PAYLOAD_SIZE,
            });
        }

        let mut buf = [0u8; PAYLOAD_SIZE];
        buf[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            key,
            active: true,
            payload: buf,
        })
    }

    /// The sample payload written by text import: `record-<key>`.
    pub fn sample(key: Key) -> Self {
        let text = format!("record-{}", key);
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload[..text.len()].copy_from_slice(text.as_bytes());
        Self {
            key,
            active: true,
            payload,
        }
    }

    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Payload bytes up to the first NUL.
    pub fn payload(&self) -> &[u8] {
        let end = self
            .payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PAYLOAD_SIZE);
        &self.payload[..end]
    }

    /// Payload as text, with invalid UTF-8 replaced.
    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.payload())
    }

    pub(crate) fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut data = [0u8; RECORD_SIZE];
        data[Self::OFFSET_KEY..Self::OFFSET_KEY + 4].copy_from_slice(&self.key.to_le_bytes());
        if self.active {
            data[Self::OFFSET_FLAGS] = Self::FLAG_ACTIVE;
        }
        data[Self::OFFSET_PAYLOAD..Self::OFFSET_CRC].copy_from_slice(&self.payload);

        let crc = Self::compute_checksum(&data);
        data[Self::OFFSET_CRC..].copy_from_slice(&crc.to_le_bytes());
        data
    }

    /// Decode the record stored at `index`.
    ///
    /// # Errors
    /// Returns `Error::Corrupt` if the checksum does not match.
    pub(crate) fn decode(index: u32, data: &[u8; RECORD_SIZE]) -> Result<Self> {
        let mut crc = [0u8; 4];
        crc.copy_from_slice(&data[Self::OFFSET_CRC..]);
        if u32::from_le_bytes(crc) != Self::compute_checksum(data) {
            return Err(Error::corrupt(index, "record checksum mismatch"));
        }

        let mut key = [0u8; 4];
        key.copy_from_slice(&data[Self::OFFSET_KEY..Self::OFFSET_KEY + 4]);
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&data[Self::OFFSET_PAYLOAD..Self::OFFSET_CRC]);

        Ok(Self {
            key: Key::from_le_bytes(key),
            active: data[Self::OFFSET_FLAGS] & Self::FLAG_ACTIVE != 0,
            payload,
        })
    }

    /// CRC32 of everything before the checksum field.
    fn compute_checksum(data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&data[..Self::OFFSET_CRC]);
        hasher.finalize()
    }
}
