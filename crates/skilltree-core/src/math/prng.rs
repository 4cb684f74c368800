// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
/// Stateful 128-bit xorshift-family generator used for timeless rerolls.
///
/// * Not cryptographically secure; use only for deterministic game rolls.
/// * The same seed words always yield the same sequence, independent of call
///   order elsewhere in the process or the platform.
#[derive(Debug, Clone, Copy)]
pub struct RerollRng {
    state: [u32; 4],
}

const INITIAL_STATE: [u32; 4] = [0x4033_6050, 0xcfa3_723c, 0x3cac_5f6f, 0x3793_fdff];

/// Folds one seed word into the state at `index`.
fn mix(state: &mut [u32; 4], index: &mut usize, value: u32) {
    let i = *index;
    let mut round = state[i] ^ state[(i + 1) & 3] ^ state[(i + 3) & 3];
    round = (round ^ (round >> 27)).wrapping_mul(0x0019_660d);
    state[(i + 1) & 3] = state[(i + 1) & 3].wrapping_add(round);
    round = round.wrapping_add(value).wrapping_add(i as u32);
    state[(i + 2) & 3] = state[(i + 2) & 3].wrapping_add(round);
    state[i] = round;
    *index = (i + 1) & 3;
}

impl RerollRng {
    /// Constructs a generator by folding `seed` words into the fixed initial
    /// state, then running the avalanche schedule and eight warm-up steps.
    pub fn new(seed: &[u32]) -> Self {
        let mut state = INITIAL_STATE;
        let mut index = 1usize;
        for &value in seed {
            mix(&mut state, &mut index, value);
        }
        for _ in 0..5 {
            mix(&mut state, &mut index, 0);
        }
        for _ in 0..4 {
            let i = index;
            let mut round = state[i]
                .wrapping_add(state[(i + 1) & 3])
                .wrapping_add(state[(i + 3) & 3]);
            round = (round ^ (round >> 27)).wrapping_mul(0x5d58_8b65);
            state[(i + 1) & 3] ^= round;
            round = round.wrapping_sub(i as u32);
            state[(i + 2) & 3] ^= round;
            state[i] = round;
            index = (i + 1) & 3;
        }

        let mut rng = Self { state };
        for _ in 0..8 {
            rng.step();
        }
        rng
    }

    fn step(&mut self) {
        let s = &mut self.state;
        let mut a = s[3];
        let mut b = (s[0] & 0x7fff_ffff) ^ s[1] ^ s[2];
        a ^= a << 1;
        b ^= (b >> 1) ^ a;
        s[0] = s[1];
        s[1] = s[2];
        s[2] = a ^ (b << 10);
        s[3] = b;
        if b & 1 != 0 {
            s[1] ^= 0x8f70_11ee;
            s[2] ^= 0xfc78_ff1f;
        }
    }

    fn temper(&self) -> u32 {
        let s = &self.state;
        let mut a = s[3];
        let b = s[0].wrapping_add(s[2] >> 8);
        a ^= b;
        if b & 1 != 0 {
            a ^= 0x3793_fdff;
        }
        a
    }

    /// Returns the next tempered 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        self.step();
        self.temper()
    }

    /// Returns the next output reduced modulo `modulus` (0 when `modulus` is 0).
    pub fn modulo(&mut self, modulus: u32) -> u32 {
        let value = self.next_u32();
        value.checked_rem(modulus).unwrap_or(0)
    }

    /// Returns the next integer in the inclusive range `[min, max]`.
    ///
    /// Plain modulo reduction; the bias is part of the reroll contract and
    /// must not be corrected.
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        let value = i64::from(self.next_u32());
        let span = max - min + 1;
        if span <= 0 {
            return min;
        }
        value % span + min
    }
}
