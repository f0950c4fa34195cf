//! Chord node Id or a key's position on the ring.
use sha1_smol::Sha1;
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use crate::{Error, Result};

/// The size of node IDs in bytes.
pub const ID_SIZE: usize = 20;
/// The size of the identifier space in bits, the ring is `0..2^ID_BITS`.
pub const ID_BITS: usize = ID_SIZE * 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
/// Position on the Chord ring, a 160 bits big-endian unsigned integer.
pub struct Id([u8; ID_SIZE]);

impl Id {
    /// Compute the identifier of an address (or any string) by hashing its
    /// UTF-8 bytes with SHA-1.
    ///
    /// Two nodes with the same address always land on the same position.
    pub fn from_address(address: &str) -> Id {
        let mut hasher = Sha1::new();
        hasher.update(address.as_bytes());

        Id(hasher.digest().bytes())
    }

    /// Create a new Id from some bytes. Returns Err if `bytes` is not of length
    /// [ID_SIZE](crate::common::ID_SIZE).
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Id> {
        let bytes = bytes.as_ref();
        if bytes.len() != ID_SIZE {
            return Err(Error::InvalidIdSize(bytes.len()));
        }

        let mut tmp: [u8; ID_SIZE] = [0; ID_SIZE];
        tmp.copy_from_slice(bytes);

        Ok(Id(tmp))
    }

    /// Target identifier of the finger table slot `finger` (1-indexed):
    /// `(self + 2^(finger - 1)) mod 2^160`.
    ///
    /// Slots above [ID_BITS] wrap around to `self`.
    pub fn finger_target(&self, finger: usize) -> Result<Id> {
        if finger == 0 {
            return Err(Error::InvalidFingerIndex(finger));
        }

        Ok(self.add_power_of_two(finger - 1))
    }

    /// `(self + 2^exponent) mod 2^160`
    fn add_power_of_two(&self, exponent: usize) -> Id {
        if exponent >= ID_BITS {
            return *self;
        }

        let mut bytes = self.0;

        let mut index = ID_SIZE - 1 - exponent / 8;
        let mut carry: u16 = 1 << (exponent % 8);

        loop {
            let sum = bytes[index] as u16 + carry;
            bytes[index] = (sum & 0xff) as u8;
            carry = sum >> 8;

            // Overflow past the most significant byte is the modulo.
            if carry == 0 || index == 0 {
                break;
            }
            index -= 1;
        }

        Id(bytes)
    }
}

/// Finger target of `address` for the 1-indexed `finger` slot.
///
/// Equivalent to `Id::from_address(address).finger_target(finger)`.
pub fn ring_offset(address: &str, finger: usize) -> Result<Id> {
    Id::from_address(address).finger_target(finger)
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Id> {
        if s.len() % 2 != 0 {
            return Err(Error::InvalidIdEncoding(s.into()));
        }

        let bytes = (0..s.len())
            .step_by(2)
            .map(|i| {
                s.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            })
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| Error::InvalidIdEncoding(s.into()))?;

        Id::from_bytes(bytes)
    }
}

impl From<[u8; ID_SIZE]> for Id {
    fn from(bytes: [u8; ID_SIZE]) -> Id {
        Id(bytes)
    }
}
