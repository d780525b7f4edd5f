//! Cartridge image files: raw memory dumps and `.crt` containers.

use crate::core::cartridge::{CartridgeError, CartridgeResult};
use log::{info, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// `.crt` file signature
pub const CRT_SIGNATURE: &[u8; 16] = b"C64 CARTRIDGE   ";
/// CHIP packet signature
pub const CHIP_SIGNATURE: &[u8; 4] = b"CHIP";

const CRT_MIN_HEADER_LEN: usize = 0x40;
const CHIP_HEADER_LEN: usize = 0x10;

/// Container format of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Raw,
    Crt,
}

/// One CHIP packet of a `.crt` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrtChip {
    pub chip_type: u16,
    pub bank: u16,
    pub load_address: u16,
    pub data: Vec<u8>,
}

/// Parsed image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartImage {
    pub kind: ImageKind,
    /// Hardware type from the `.crt` header, `None` for raw dumps
    pub hw_type: Option<u16>,
    pub name: String,
    pub chips: Vec<CrtChip>,
}

impl CartImage {
    /// Load an image from disk
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CartridgeResult<CartImage> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            warn!("Cannot open cartridge image {}: {}", path.display(), e);
            CartridgeError::InvalidImage
        })?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer).map_err(|e| {
            warn!("Cannot read cartridge image {}: {}", path.display(), e);
            CartridgeError::InvalidImage
        })?;

        let image = CartImage::load_from_buffer(&buffer)?;
        info!(
            "Cartridge image {} loaded: {:?}, {} bytes",
            path.display(),
            image.kind,
            image.contents_len()
        );
        Ok(image)
    }

    /// Parse an image from memory. Anything without the `.crt` signature is a raw dump.
    pub fn load_from_buffer(buffer: &[u8]) -> CartridgeResult<CartImage> {
        if buffer.starts_with(CRT_SIGNATURE) {
            return parse_crt(buffer);
        }
        if buffer.is_empty() {
            warn!("Empty cartridge image");
            return Err(CartridgeError::InvalidImage);
        }

        Ok(CartImage {
            kind: ImageKind::Raw,
            hw_type: None,
            name: String::new(),
            chips: vec![CrtChip {
                chip_type: 0,
                bank: 0,
                load_address: 0,
                data: buffer.to_vec(),
            }],
        })
    }

    /// All chip data concatenated in bank order
    pub fn contents(&self) -> Vec<u8> {
        let mut chips: Vec<&CrtChip> = self.chips.iter().collect();
        chips.sort_by_key(|chip| chip.bank);
        chips.iter().flat_map(|chip| chip.data.iter().copied()).collect()
    }

    pub fn contents_len(&self) -> usize {
        self.chips.iter().map(|chip| chip.data.len()).sum()
    }
}

fn be16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

fn be32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn parse_crt(buffer: &[u8]) -> CartridgeResult<CartImage> {
    if buffer.len() < CRT_MIN_HEADER_LEN {
        warn!("CRT header truncated");
        return Err(CartridgeError::InvalidImage);
    }

    let header_len = be32(buffer, 0x10) as usize;
    if header_len < CRT_MIN_HEADER_LEN || header_len > buffer.len() {
        warn!("CRT header length {} invalid", header_len);
        return Err(CartridgeError::InvalidImage);
    }

    let hw_type = be16(buffer, 0x16);
    let name_bytes = &buffer[0x20..0x40];
    let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
    let name = String::from_utf8_lossy(&name_bytes[..name_end]).trim_end().to_string();

    let mut chips = Vec::new();
    let mut pos = header_len;
    while pos < buffer.len() {
        if buffer.len() - pos < CHIP_HEADER_LEN || &buffer[pos..pos + 4] != CHIP_SIGNATURE {
            warn!("CRT: bad CHIP packet at offset ${:X}", pos);
            return Err(CartridgeError::InvalidImage);
        }

        let packet_len = be32(buffer, pos + 4) as usize;
        let image_size = be16(buffer, pos + 0x0E) as usize;
        let data_start = pos + CHIP_HEADER_LEN;
        if packet_len < CHIP_HEADER_LEN + image_size || data_start + image_size > buffer.len() {
            warn!("CRT: CHIP packet at offset ${:X} truncated", pos);
            return Err(CartridgeError::InvalidImage);
        }

        chips.push(CrtChip {
            chip_type: be16(buffer, pos + 0x08),
            bank: be16(buffer, pos + 0x0A),
            load_address: be16(buffer, pos + 0x0C),
            data: buffer[data_start..data_start + image_size].to_vec(),
        });

        pos = pos.saturating_add(packet_len);
    }

    if chips.is_empty() {
        warn!("CRT without CHIP packets");
        return Err(CartridgeError::InvalidImage);
    }

    Ok(CartImage {
        kind: ImageKind::Crt,
        hw_type: Some(hw_type),
        name,
        chips,
    })
}
