//! Snapshot modules for cartridge state.
//!
//! Layout of a module:
//!
//! ```text
//! +0   name      16 bytes, NUL padded
//! +16  major     u8
//! +17  minor     u8
//! +18  size      u32 LE, payload bytes that follow
//! +22  payload   enabled u8, switch u8, page u32 LE, memory
//! ```

use crate::core::cartridge::{CartridgeError, CartridgeResult};
use bytemuck::{Pod, Zeroable};
use log::{debug, warn};

/// Current format version
pub const SNAP_MAJOR: u8 = 0;
pub const SNAP_MINOR: u8 = 1;

pub const MODULE_NAME_LEN: usize = 16;

/// Fixed module header, read and written as raw bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModuleHeader {
    name: [u8; MODULE_NAME_LEN],
    major: u8,
    minor: u8,
    size: [u8; 4],
}

pub const HEADER_LEN: usize = std::mem::size_of::<ModuleHeader>();

/// Bytes of the payload before the memory dump
const PAYLOAD_FIXED_LEN: usize = 6;

impl ModuleHeader {
    fn new(module: &str, payload_len: usize) -> Self {
        let mut name = [0u8; MODULE_NAME_LEN];
        let bytes = module.as_bytes();
        let len = bytes.len().min(MODULE_NAME_LEN);
        name[..len].copy_from_slice(&bytes[..len]);

        Self {
            name,
            major: SNAP_MAJOR,
            minor: SNAP_MINOR,
            size: (payload_len as u32).to_le_bytes(),
        }
    }

    /// Module name without the NUL padding
    pub fn name(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(MODULE_NAME_LEN);
        &self.name[..end]
    }

    pub fn version(&self) -> (u8, u8) {
        (self.major, self.minor)
    }

    pub fn payload_len(&self) -> usize {
        u32::from_le_bytes(self.size) as usize
    }
}

/// Decoded cartridge state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub enabled: bool,
    pub switch_on: bool,
    pub page: u32,
    pub memory: Vec<u8>,
}

impl SnapshotRecord {
    /// Serialize under the given module name
    pub fn encode(&self, module: &str) -> Vec<u8> {
        let payload_len = PAYLOAD_FIXED_LEN + self.memory.len();
        let header = ModuleHeader::new(module, payload_len);

        let mut out = Vec::with_capacity(HEADER_LEN + payload_len);
        out.extend_from_slice(bytemuck::bytes_of(&header));
        out.push(self.enabled as u8);
        out.push(self.switch_on as u8);
        out.extend_from_slice(&self.page.to_le_bytes());
        out.extend_from_slice(&self.memory);

        debug!("Snapshot {} written: {} bytes", module, out.len());
        out
    }

    /// Parse and fully validate a module.
    ///
    /// `memory_len` is the size the memory dump must have when the record
    /// is enabled. Nothing is returned unless every check passes.
    pub fn decode(data: &[u8], module: &str, memory_len: usize) -> CartridgeResult<SnapshotRecord> {
        if data.len() < HEADER_LEN {
            warn!("Snapshot {}: truncated header", module);
            return Err(CartridgeError::InvalidSnapshot);
        }

        let header: ModuleHeader = bytemuck::try_pod_read_unaligned(&data[..HEADER_LEN])
            .map_err(|_| CartridgeError::InvalidSnapshot)?;

        if header.name() != module.as_bytes() {
            warn!(
                "Snapshot module mismatch: expected {}, found {}",
                module,
                String::from_utf8_lossy(header.name())
            );
            return Err(CartridgeError::InvalidSnapshot);
        }

        let (major, minor) = header.version();
        if major != SNAP_MAJOR || minor > SNAP_MINOR {
            warn!(
                "Snapshot {}: version {}.{} not supported (expected {}.{})",
                module, major, minor, SNAP_MAJOR, SNAP_MINOR
            );
            return Err(CartridgeError::UnsupportedSnapshotVersion);
        }

        let payload = &data[HEADER_LEN..];
        if payload.len() != header.payload_len() || payload.len() < PAYLOAD_FIXED_LEN {
            warn!("Snapshot {}: payload size mismatch", module);
            return Err(CartridgeError::InvalidSnapshot);
        }

        let enabled = payload[0] != 0;
        let switch_on = payload[1] != 0;
        let page = u32::from_le_bytes([payload[2], payload[3], payload[4], payload[5]]);
        let memory = &payload[PAYLOAD_FIXED_LEN..];

        // A disabled record carries no memory
        if enabled && memory.len() != memory_len {
            warn!(
                "Snapshot {}: memory is {} bytes, expected {}",
                module,
                memory.len(),
                memory_len
            );
            return Err(CartridgeError::InvalidSnapshot);
        }

        Ok(SnapshotRecord {
            enabled,
            switch_on,
            page,
            memory: memory.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SnapshotRecord {
        SnapshotRecord {
            enabled: true,
            switch_on: true,
            page: 5,
            memory: (0..16).collect(),
        }
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(HEADER_LEN, 22);
        let data = record().encode("CARTTEST");
        assert_eq!(&data[..8], b"CARTTEST");
        assert_eq!(data[16], SNAP_MAJOR);
        assert_eq!(data[17], SNAP_MINOR);
        assert_eq!(data.len(), HEADER_LEN + 6 + 16);
    }

    #[test]
    fn test_decode_encoded() {
        let data = record().encode("CARTTEST");
        assert_eq!(SnapshotRecord::decode(&data, "CARTTEST", 16), Ok(record()));
    }

    #[test]
    fn test_wrong_module_rejected() {
        let data = record().encode("CARTOTHER");
        assert_eq!(
            SnapshotRecord::decode(&data, "CARTTEST", 16),
            Err(CartridgeError::InvalidSnapshot)
        );
    }

    #[test]
    fn test_version_checks() {
        let mut data = record().encode("CARTTEST");
        data[16] = SNAP_MAJOR + 1;
        assert_eq!(
            SnapshotRecord::decode(&data, "CARTTEST", 16),
            Err(CartridgeError::UnsupportedSnapshotVersion)
        );

        let mut data = record().encode("CARTTEST");
        data[17] = SNAP_MINOR + 1;
        assert_eq!(
            SnapshotRecord::decode(&data, "CARTTEST", 16),
            Err(CartridgeError::UnsupportedSnapshotVersion)
        );

        // Older minor is still readable
        let mut data = record().encode("CARTTEST");
        data[17] = 0;
        assert!(SnapshotRecord::decode(&data, "CARTTEST", 16).is_ok());
    }

    #[test]
    fn test_truncated_rejected() {
        let data = record().encode("CARTTEST");
        assert_eq!(
            SnapshotRecord::decode(&data[..data.len() - 1], "CARTTEST", 16),
            Err(CartridgeError::InvalidSnapshot)
        );
        assert_eq!(
            SnapshotRecord::decode(&data[..10], "CARTTEST", 16),
            Err(CartridgeError::InvalidSnapshot)
        );
    }

    #[test]
    fn test_memory_size_checked() {
        let data = record().encode("CARTTEST");
        assert_eq!(
            SnapshotRecord::decode(&data, "CARTTEST", 2048),
            Err(CartridgeError::InvalidSnapshot)
        );
    }
}
