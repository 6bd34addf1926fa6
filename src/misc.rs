// SPDX-License-Identifier: GPL-3.0-or-later

#[derive(Clone, Copy)]
pub struct Prng(u64);

// xorshift64star Pseudo-Random Number Generator
// This class is based on original code written and dedicated
// to the public domain by Sebastiano Vigna (2014).
// It has the following characteristics:
//
//  -  Outputs 64-bit numbers
//  -  Passes Dieharder and SmallCrush test batteries
//  -  Does not require warm-up, no zeroland to escape
//  -  Internal state is a single 64-bit integer
//  -  Period is 2^64 - 1
//  -  Speed: 1.60 ns/call (Core i7 @3.40GHz)
//
// For further analysis see
//   <http://vigna.di.unimi.it/ftp/papers/xorshift.pdf>

impl Prng {
    pub fn new(seed: u64) -> Prng {
        Prng(seed)
    }

    pub fn rand64(&mut self) -> u64 {
        (*self).0 ^= (*self).0 >> 12;
        (*self).0 ^= (*self).0 << 25;
        (*self).0 ^= (*self).0 >> 27;
        u64::wrapping_mul(self.0, 2685821657736338717)
    }

    // Special generator used to fast init magic numbers. Output values only
    // have 1/8th of their bits set on average.
    pub fn sparse_rand(&mut self) -> u64 {
        self.rand64() & self.rand64() & self.rand64()
    }
}

#[cfg(test)]
mod tests {
    use super::Prng;

    #[test]
    fn prng_is_deterministic() {
        let mut a = Prng::new(1070372);
        let mut b = Prng::new(1070372);
        for _ in 0..16 {
            assert_eq!(a.rand64(), b.rand64());
        }
        assert_ne!(a.rand64(), 0);
    }
}
