//! Mach-O architecture sniffing for generic `.dylib` payloads.
//!
//! Windows, iOS and Android payloads are classified by file-name suffix
//! alone; only a bare `.dylib` needs content inspection to tell Intel
//! from ARM slices. The whole decision reads the first 12 bytes.

use crate::error::ApiError;
use log::debug;

/// Universal (fat) archive magic, as the bytes appear on disk.
const FAT_MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];
/// Little-endian 64-bit Mach-O magic for a single-architecture binary.
const THIN_MAGIC: [u8; 4] = [0xCF, 0xFA, 0xED, 0xFE];

/// Byte layout for one recognized magic: where the CPU type and
/// subtype live, and which (type, subtype) pairs mean Intel or ARM.
/// Keeping this as data keeps the classification matrix testable
/// against the table in the format notes.
struct MachoLayout {
    magic: [u8; 4],
    fat: bool,
    type_offset: usize,
    subtype_offset: usize,
    intel: (u8, u8),
    arm: (u8, u8),
}

const LAYOUTS: [MachoLayout; 2] = [
    // Fat headers are big-endian: with a single embedded arch, the low
    // byte of cputype sits at offset 11 and its marker byte at 8.
    MachoLayout {
        magic: FAT_MAGIC,
        fat: true,
        type_offset: 8,
        subtype_offset: 11,
        intel: (0x01, 0x07),
        arm: (0x01, 0x0C),
    },
    // Thin headers are little-endian, so the same fields land at
    // offsets 4 and 7 with the pair order flipped.
    MachoLayout {
        magic: THIN_MAGIC,
        fat: false,
        type_offset: 4,
        subtype_offset: 7,
        intel: (0x07, 0x01),
        arm: (0x0C, 0x01),
    },
];

/// Offset of the architecture count in a fat header.
const FAT_ARCH_COUNT_OFFSET: usize = 7;

/// Classify a Mach-O payload by its supported architectures.
///
/// Returns `(supports_arm, supports_intel)`. Anything that is not a
/// recognizable fat archive or single-architecture binary is an
/// [`ApiError::UnknownBinaryFormat`].
pub fn sniff_mac_binary(bytes: &[u8]) -> Result<(bool, bool), ApiError> {
    let header: &[u8; 12] = bytes
        .get(..12)
        .and_then(|h| h.try_into().ok())
        .ok_or(ApiError::UnknownBinaryFormat)?;

    let layout = LAYOUTS
        .iter()
        .find(|l| header[..4] == l.magic)
        .ok_or(ApiError::UnknownBinaryFormat)?;

    if layout.fat {
        match header[FAT_ARCH_COUNT_OFFSET] {
            // Dual-slice universal binary: ARM + Intel.
            0x2 => return Ok((true, true)),
            0x1 => {}
            count => {
                debug!("fat archive with unsupported arch count {}", count);
                return Err(ApiError::UnknownBinaryFormat);
            }
        }
    }

    let pair = (header[layout.type_offset], header[layout.subtype_offset]);
    if pair == layout.intel {
        Ok((false, true))
    } else if pair == layout.arm {
        Ok((true, false))
    } else {
        debug!("unrecognized cpu type/subtype pair {:02x?}", pair);
        Err(ApiError::UnknownBinaryFormat)
    }
}
