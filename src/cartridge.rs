//! Cartridge ROM images.
//!
//! Only unbanked 32 KiB images are mapped; larger ROMs load but anything
//! past the first two banks is unreachable.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::EmuError;

pub struct Cartridge {
    pub rom: Vec<u8>,
    pub title: String,
}

impl Cartridge {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EmuError> {
        let rom = fs::read(path)?;
        Ok(Self::from_bytes(rom))
    }

    pub fn from_bytes(rom: Vec<u8>) -> Self {
        let title = read_title(&rom);
        info!("cartridge \"{title}\", {} bytes", rom.len());
        if rom.len() > 0x8000 {
            warn!(
                "ROM is {} banks but banking is not implemented; using the first two",
                rom.len().div_ceil(0x4000)
            );
        }
        Self { rom, title }
    }
}

/// ASCII title from the header at 0x134, NUL-padded on real carts.
fn read_title(rom: &[u8]) -> String {
    rom.get(0x134..0x144)
        .map(|bytes| {
            bytes
                .iter()
                .take_while(|&&b| b != 0)
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_parsed_from_the_header() {
        let mut rom = vec![0u8; 0x8000];
        rom[0x134..0x134 + 4].copy_from_slice(b"PONG");
        let cart = Cartridge::from_bytes(rom);
        assert_eq!(cart.title, "PONG");
    }

    #[test]
    fn short_images_have_no_title() {
        let cart = Cartridge::from_bytes(vec![0u8; 0x100]);
        assert_eq!(cart.title, "");
    }
}
