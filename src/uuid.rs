//! Bluetooth UUID representation ([Vol 3] Part B, Section 2.5.1).

use std::fmt::{Debug, Formatter};
use std::num::{NonZeroU128, NonZeroU16};
use std::str::FromStr;

use structbuf::Unpack;

const SHIFT: u32 = u128::BITS - u32::BITS;
const BASE: u128 = 0x0000_1000_8000_00805F9B34FB;
const MASK_16: u128 = !((u16::MAX as u128) << SHIFT);

/// 16- or 128-bit UUID. Assigned 16-bit UUIDs are stored in expanded form
/// using the Bluetooth Base UUID.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Uuid(NonZeroU128);

impl Uuid {
    /// UUID size in bytes.
    pub const BYTES: usize = std::mem::size_of::<Self>();

    /// Creates a UUID from a `u128`. Returns `None` if the value is zero.
    #[inline]
    #[must_use]
    pub const fn new(v: u128) -> Option<Self> {
        // TODO: Use map() when it is const stable
        match NonZeroU128::new(v) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Creates a UUID from a `u128`.
    ///
    /// # Panics
    ///
    /// Panics if the value is zero. Intended for UUID constants.
    #[inline]
    #[must_use]
    pub const fn from_u128(v: u128) -> Self {
        match Self::new(v) {
            Some(u) => u,
            None => panic!("zero UUID"),
        }
    }

    /// Converts an assigned 16-bit SIG UUID to `u16`. Returns `None` if the
    /// UUID is not a valid Base UUID expansion.
    #[inline]
    #[must_use]
    pub fn as_u16(self) -> Option<u16> {
        #[allow(clippy::cast_possible_truncation)]
        let v = (self.0.get() >> SHIFT) as u16;
        (self.0.get() & MASK_16 == BASE && v > 0).then_some(v)
    }

    /// Returns the raw 128-bit value.
    #[inline(always)]
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0.get()
    }

    /// Returns the UUID as a little-endian byte array.
    #[inline]
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::BYTES] {
        self.0.get().to_le_bytes()
    }
}

impl From<Uuid16> for Uuid {
    #[inline]
    fn from(u: Uuid16) -> Self {
        u.as_uuid()
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = ();

    /// Creates a UUID from a little-endian 2- or 16-byte slice.
    #[inline]
    fn try_from(v: &[u8]) -> Result<Self, Self::Error> {
        match v.len() {
            Self::BYTES => Self::new(v.unpack().u128()),
            Uuid16::BYTES => Uuid16::new(v.unpack().u16()).map(Uuid16::as_uuid),
            _ => None,
        }
        .ok_or(())
    }
}

impl Debug for Uuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(v) = self.as_u16() {
            return write!(f, "{v:#06X}");
        }
        let v = self.0.get();
        #[allow(clippy::cast_possible_truncation)]
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xFFFF_FFFF_FFFF
        )
    }
}

impl FromStr for Uuid {
    type Err = ParseUuidError;

    /// Parses the hyphenated `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = s.as_bytes();
        if b.len() != 36 {
            return Err(ParseUuidError);
        }
        let mut v: u128 = 0;
        for (i, &c) in b.iter().enumerate() {
            if matches!(i, 8 | 13 | 18 | 23) {
                if c != b'-' {
                    return Err(ParseUuidError);
                }
                continue;
            }
            let d = (c as char).to_digit(16).ok_or(ParseUuidError)?;
            v = (v << 4) | u128::from(d);
        }
        Self::new(v).ok_or(ParseUuidError)
    }
}

/// Error returned when a UUID string is malformed or zero.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid UUID string")]
pub struct ParseUuidError;

/// Assigned 16-bit SIG UUID.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Uuid16(NonZeroU16);

impl Uuid16 {
    /// UUID size in bytes.
    pub const BYTES: usize = std::mem::size_of::<Self>();

    /// Creates a 16-bit UUID from a `u16`. Returns `None` if the value is
    /// zero.
    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Option<Self> {
        match NonZeroU16::new(v) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Creates a 16-bit UUID from a `u16`.
    ///
    /// # Panics
    ///
    /// Panics if the value is zero. Intended for UUID constants.
    #[inline]
    #[must_use]
    pub const fn from_u16(v: u16) -> Self {
        match Self::new(v) {
            Some(u) => u,
            None => panic!("zero UUID"),
        }
    }

    /// Returns the full 128-bit UUID using the Bluetooth Base UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        Uuid::from_u128(((self.0.get() as u128) << SHIFT) | BASE)
    }

    /// Returns the raw 16-bit value.
    #[inline(always)]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0.get()
    }
}

impl Debug for Uuid16 {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06X}", self.0.get())
    }
}

impl PartialEq<Uuid> for Uuid16 {
    #[inline]
    fn eq(&self, rhs: &Uuid) -> bool {
        self.as_uuid() == *rhs
    }
}

impl PartialEq<Uuid16> for Uuid {
    #[inline]
    fn eq(&self, rhs: &Uuid16) -> bool {
        rhs.as_uuid() == *self
    }
}

crate::impl_display_via_debug! { Uuid, Uuid16 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let u: Uuid = "7905F431-B5CE-4E99-A40F-4B1E122D00D0".parse().unwrap();
        assert_eq!(u, Uuid::from_u128(0x7905F431_B5CE_4E99_A40F_4B1E122D00D0));
        assert_eq!(u.to_string(), "7905F431-B5CE-4E99-A40F-4B1E122D00D0");
        assert_eq!(
            "7905f431-b5ce-4e99-a40f-4b1e122d00d0".parse::<Uuid>().unwrap(),
            u
        );
        assert!("7905F431B5CE4E99A40F4B1E122D00D0".parse::<Uuid>().is_err());
        assert!("7905F431-B5CE-4E99-A40F-4B1E122D00G0".parse::<Uuid>().is_err());
        assert!("00000000-0000-0000-0000-000000000000".parse::<Uuid>().is_err());
    }

    #[test]
    fn uuid16() {
        let ccc = Uuid16::from_u16(0x2902);
        assert_eq!(ccc.as_uuid().as_u16(), Some(0x2902));
        assert_eq!(ccc.to_string(), "0x2902");
        assert_eq!(ccc, ccc.as_uuid());
        assert!(Uuid::from_u128(0x7905F431_B5CE_4E99_A40F_4B1E122D00D0)
            .as_u16()
            .is_none());
    }

    #[test]
    fn bytes() {
        let u = Uuid::from_u128(0x7905F431_B5CE_4E99_A40F_4B1E122D00D0);
        assert_eq!(Uuid::try_from(u.to_bytes().as_ref()), Ok(u));
        assert_eq!(
            Uuid::try_from([0x02, 0x29].as_ref()),
            Ok(Uuid16::from_u16(0x2902).as_uuid())
        );
        assert!(Uuid::try_from([0x02, 0x29, 0x00].as_ref()).is_err());
    }
}
