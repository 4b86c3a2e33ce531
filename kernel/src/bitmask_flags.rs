use num_traits::{One, PrimInt};

/// Trait implemented by values that address a single bit of a mask.
///
/// Collision tags are plain indices, so `u8` implements it directly; the index must be smaller
/// than the number of bits in `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A tag index addressing one bit of a 16-bit collision mask row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TagBit(pub u8);

impl FlagBitmask for TagBit {
    type Storage = u16;

    fn bit_index(&self) -> u8 {
        self.0
    }
}

/// A small copyable bit set over a primitive integer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    /// Every bit set.
    pub fn all() -> Self {
        Self { bits: !T::zero() }
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, flag: U) {
        self.bits = self.bits | flag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, flag: U) {
        self.bits = self.bits & !flag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, flag: U) -> bool {
        (self.bits & flag.mask()) != T::zero()
    }

    /// Set or clear one bit.
    pub fn set<U: FlagBitmask<Storage = T>>(&mut self, flag: U, on: bool) {
        if on {
            self.add(flag);
        } else {
            self.remove(flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_has_every_tag() {
        let row = BitmaskFlags::<u16>::all();
        assert!((0..16).all(|i| row.has(TagBit(i))));
    }

    #[test]
    fn set_toggles_single_bit() {
        let mut row = BitmaskFlags::<u16>::all();
        row.set(TagBit(3), false);
        assert!(!row.has(TagBit(3)));
        assert!(row.has(TagBit(2)));
        assert_eq!(row.bits, 0xFFF7);
        row.set(TagBit(3), true);
        assert_eq!(row.bits, 0xFFFF);
    }
}
