use std::fmt;

/// Packed MSB-first bit sequence holding one symbol's code.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct BitVec {
    bits: Vec<u8>,
    bit_count: usize,
}

impl BitVec {
    pub fn new() -> Self {
        BitVec {
            bits: Vec::new(),
            bit_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.bit_count
    }

    pub fn is_empty(&self) -> bool {
        self.bit_count == 0
    }

    pub fn push_bit(&mut self, bit: bool) {
        let byte_index = self.bit_count / 8; // which byte is target?
        let bit_offset = self.bit_count % 8; // which bit position is target?

        // make a new byte if needed
        if byte_index >= self.bits.len() {
            self.bits.push(0);
        }

        if bit {
            self.bits[byte_index] |= 1 << (7 - bit_offset);
        }

        self.bit_count += 1;
    }

    pub fn pop_bit(&mut self) -> Option<bool> {
        if self.bit_count == 0 {
            return None;
        }
        self.bit_count -= 1;
        let byte_index = self.bit_count / 8;
        let mask = 1 << (7 - self.bit_count % 8);
        let bit = self.bits[byte_index] & mask != 0;

        // keep unused bits zeroed so equality stays structural
        self.bits[byte_index] &= !mask;
        if self.bit_count % 8 == 0 {
            self.bits.pop();
        }
        Some(bit)
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.bit_count {
            return None;
        }
        Some(self.bits[index / 8] & (1 << (7 - index % 8)) != 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_count).map(move |i| self.bits[i / 8] & (1 << (7 - i % 8)) != 0)
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bv = BitVec::new();
        for bit in iter {
            bv.push_bit(bit);
        }
        bv
    }
}

impl fmt::Display for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop_across_byte_boundary() {
        let mut bv = BitVec::new();
        let pattern = [true, false, true, true, false, false, true, false, true, true];
        for &b in &pattern {
            bv.push_bit(b);
        }
        assert_eq!(bv.len(), 10);
        assert_eq!(bv.to_string(), "1011001011");
        assert_eq!(bv.get(8), Some(true));
        assert_eq!(bv.get(10), None);

        assert_eq!(bv.pop_bit(), Some(true));
        assert_eq!(bv.pop_bit(), Some(true));
        assert_eq!(bv, pattern[..8].iter().copied().collect::<BitVec>());
    }

    #[test]
    fn popping_restores_equality() {
        let mut a: BitVec = [true, true].into_iter().collect();
        a.push_bit(true);
        a.pop_bit();
        let b: BitVec = [true, true].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(BitVec::new().pop_bit(), None);
    }
}
