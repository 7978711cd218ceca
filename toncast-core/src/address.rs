use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::crc::crc16_xmodem;
use crate::error::{Error, Result};

/// Tag byte of a bounceable friendly address.
const TAG_BOUNCEABLE: u8 = 0x11;
/// Tag byte of a non-bounceable friendly address.
const TAG_NON_BOUNCEABLE: u8 = 0x51;
/// Flag bit marking a testnet-only address.
const TAG_TEST_ONLY: u8 = 0x80;

/// A workchain-qualified account identifier: signed 8-bit workchain plus
/// the 256-bit account hash. Immutable after construction.
///
/// The friendly text form is 36 bytes in base64 (or base64url): tag byte
/// (bounceable / non-bounceable, optionally test-only), workchain byte,
/// 32-byte hash, CRC16-XMODEM over the first 34 bytes, big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// Workchain id (0 = basechain, -1 = masterchain).
    pub workchain: i8,
    /// 256-bit account hash.
    pub hash: [u8; 32],
}

impl Address {
    /// Creates an address from its parts.
    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Address { workchain, hash }
    }

    /// Parses a 48-character friendly address string. Both the standard
    /// and the URL-safe base64 alphabets are accepted; the bounceable and
    /// test-only tag flags are validated, then discarded.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != 48 {
            return Err(Error::InvalidAddress(format!(
                "expected 48 characters, got {}",
                s.len()
            )));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .or_else(|_| STANDARD_NO_PAD.decode(s))
            .map_err(|e| Error::InvalidAddress(format!("base64: {e}")))?;
        if bytes.len() != 36 {
            return Err(Error::InvalidAddress(format!(
                "expected 36 bytes, got {}",
                bytes.len()
            )));
        }

        let tag = bytes[0] & !TAG_TEST_ONLY;
        if tag != TAG_BOUNCEABLE && tag != TAG_NON_BOUNCEABLE {
            return Err(Error::InvalidAddress(format!(
                "unknown tag byte {:#04x}",
                bytes[0]
            )));
        }

        let expected = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc16_xmodem(&bytes[..34]) != expected {
            return Err(Error::InvalidAddress("checksum mismatch".into()));
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok(Address {
            workchain: bytes[1] as i8,
            hash,
        })
    }

    /// Renders the friendly base64url form with explicit flags.
    pub fn to_string_with(&self, bounceable: bool, testnet: bool) -> String {
        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if testnet {
            tag |= TAG_TEST_ONLY;
        }

        let mut bytes = [0u8; 36];
        bytes[0] = tag;
        bytes[1] = self.workchain as u8;
        bytes[2..34].copy_from_slice(&self.hash);
        let crc = crc16_xmodem(&bytes[..34]);
        bytes[34..36].copy_from_slice(&crc.to_be_bytes());
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

/// Default rendering: bounceable, mainnet, URL-safe.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(true, false))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}:", self.workchain)?;
        for byte in &self.hash {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAINNET_BOUNCEABLE: &str = "EQCQMcvQkJaukQkocQUG2dnTAk-s2_WzAx8JOnxI7LKDKdm8";
    const TESTNET_NON_BOUNCEABLE: &str = "0QC5aIl4jhHxR-xpt27LGmkkXSKqKrfPDrIFRVbw3pJp1ak1";
    const TESTNET_BOUNCEABLE: &str = "kQDj2G5LWf9mdG4jOKPB-Ihse9N6IQapSyUonvGPM6W5Q0SL";

    #[test]
    fn parse_and_render_mainnet() {
        let addr = Address::parse(MAINNET_BOUNCEABLE).unwrap();
        assert_eq!(addr.workchain, 0);
        assert_eq!(addr.to_string_with(true, false), MAINNET_BOUNCEABLE);
        assert_eq!(addr.to_string(), MAINNET_BOUNCEABLE);
    }

    #[test]
    fn parse_and_render_testnet_flags() {
        let addr = Address::parse(TESTNET_NON_BOUNCEABLE).unwrap();
        assert_eq!(addr.to_string_with(false, true), TESTNET_NON_BOUNCEABLE);

        let addr = Address::parse(TESTNET_BOUNCEABLE).unwrap();
        assert_eq!(addr.to_string_with(true, true), TESTNET_BOUNCEABLE);
    }

    #[test]
    fn flags_do_not_change_identity() {
        let a = Address::parse(MAINNET_BOUNCEABLE).unwrap();
        let b = Address::parse(&a.to_string_with(false, true)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let mut s: Vec<char> = MAINNET_BOUNCEABLE.chars().collect();
        // Flip a character inside the hash region.
        s[10] = if s[10] == 'A' { 'B' } else { 'A' };
        let s: String = s.into_iter().collect();
        assert!(matches!(
            Address::parse(&s),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(Address::parse("EQCQ").is_err());
        assert!(Address::parse("").is_err());
    }
}
