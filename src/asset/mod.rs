//! Asset classification module
//!
//! This module provides validation and classification for the binary
//! and image assets bundled inside a package archive: Mach-O payloads
//! are sniffed for supported architectures, and logos are checked and
//! normalized to the index's canonical size.

mod logo;
mod macho;

pub use logo::validate_logo;
pub use macho::sniff_mac_binary;
