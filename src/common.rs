//! Shared identifiers and small value types used throughout the crate.

use ethereum_types::{H160, H256, U256};

/// Opaque 20-byte account identifier.
pub type Address = H160;

/// Fixed-width 256-bit EVM word.
pub type Word = U256;

/// 32-byte content hash of contract bytecode (KECCAK256).
pub type CodeHash = H256;

/// Named hardfork, gating opcode availability, gas costs and EIP activation.
///
/// Ordered chronologically; `Hardfork::latest()` is the newest revision this
/// crate understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hardfork {
    Frontier = 0,
    Homestead = 1,
    Tangerine = 2,
    Spurious = 3,
    Byzantium = 4,
    Constantinople = 5,
    Petersburg = 6,
    Istanbul = 7,
    Berlin = 8,
    London = 9,
    Shanghai = 10,
    Cancun = 11,
}

impl Hardfork {
    pub fn iter() -> impl Iterator<Item = Self> {
        [
            Self::Frontier,
            Self::Homestead,
            Self::Tangerine,
            Self::Spurious,
            Self::Byzantium,
            Self::Constantinople,
            Self::Petersburg,
            Self::Istanbul,
            Self::Berlin,
            Self::London,
            Self::Shanghai,
            Self::Cancun,
        ]
        .into_iter()
    }

    pub const fn len() -> usize {
        Self::Cancun as usize + 1
    }

    pub const fn latest() -> Self {
        Self::Cancun
    }
}

impl core::fmt::Display for Hardfork {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Frontier => "Frontier",
            Self::Homestead => "Homestead",
            Self::Tangerine => "Tangerine Whistle",
            Self::Spurious => "Spurious Dragon",
            Self::Byzantium => "Byzantium",
            Self::Constantinople => "Constantinople",
            Self::Petersburg => "Petersburg",
            Self::Istanbul => "Istanbul",
            Self::Berlin => "Berlin",
            Self::London => "London",
            Self::Shanghai => "Shanghai",
            Self::Cancun => "Cancun",
        };
        f.write_str(name)
    }
}

/// Convert a word holding a right-aligned 20-byte address into an [`Address`].
#[inline]
pub(crate) fn u256_to_address(v: U256) -> Address {
    H256(v.into()).into()
}

/// Left-pad an address into a word.
#[inline]
pub(crate) fn address_to_u256(v: Address) -> U256 {
    U256::from_big_endian(&v.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardfork_ordering() {
        assert!(Hardfork::Frontier < Hardfork::Cancun);
        assert_eq!(Hardfork::len(), 12);
        assert_eq!(Hardfork::latest(), Hardfork::Cancun);
    }

    #[test]
    fn address_word_roundtrip() {
        let addr = Address::from_low_u64_be(0x1234);
        assert_eq!(u256_to_address(address_to_u256(addr)), addr);
    }
}
