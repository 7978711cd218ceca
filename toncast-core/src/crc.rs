//! Checksums used by the container and address formats: CRC32-C
//! (Castagnoli) trails bag-of-cells byte streams, CRC16-XMODEM closes
//! friendly address strings.

/// CRC16-XMODEM: polynomial 0x1021, zero init, no reflection.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// CRC32-C (Castagnoli): reflected polynomial 0x82F63B78, init and final
/// xor 0xFFFFFFFF.
pub fn crc32c(data: &[u8]) -> u32 {
    const POLY: u32 = 0x82F6_3B78;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }
    !crc
}
