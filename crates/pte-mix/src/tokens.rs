//! Slot tokens: small integer ids in `[0, W)` handed to concurrently running cells.
//!
//! Free/used state is an atomic bitset. `acquire` claims the lowest free bit with a
//! compare-and-swap and spins while every slot is taken; `release` clears the bit.
//! A token is only reissued after it has been released.

use std::hint;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::error::{MixError, MixResult};

const BITS: usize = u64::BITS as usize;

/// Spins before yielding the thread while waiting for a free slot.
const SPINS_BEFORE_YIELD: u32 = 64;

#[derive(Debug)]
pub struct SlotTokens {
    width: usize,
    words: Vec<AtomicU64>,
}

impl SlotTokens {
    pub fn new(width: usize) -> MixResult<Self> {
        if width == 0 {
            return Err(MixError::TokenWidth {
                width,
                what: "must be at least 1",
            });
        }
        let nwords = width.div_ceil(BITS);
        Ok(Self {
            width,
            words: (0..nwords).map(|_| AtomicU64::new(0)).collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Bits of word `w` that correspond to real slots.
    fn valid_mask(&self, w: usize) -> u64 {
        let remaining = self.width - w * BITS;
        if remaining >= BITS {
            u64::MAX
        } else {
            (1u64 << remaining) - 1
        }
    }

    /// Claims a free slot without waiting.
    pub fn try_acquire(&self) -> Option<SlotToken<'_>> {
        for (w, word) in self.words.iter().enumerate() {
            let mask = self.valid_mask(w);
            let mut cur = word.load(Ordering::Relaxed);
            loop {
                let free = !cur & mask;
                if free == 0 {
                    break;
                }
                let bit = free.trailing_zeros() as usize;
                match word.compare_exchange_weak(
                    cur,
                    cur | (1u64 << bit),
                    Ordering::Acquire,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        return Some(SlotToken {
                            pool: self,
                            id: w * BITS + bit,
                        });
                    }
                    Err(actual) => cur = actual,
                }
            }
        }
        None
    }

    /// Claims a free slot, waiting for one to be released if necessary.
    pub fn acquire(&self) -> SlotToken<'_> {
        let mut spins = 0u32;
        loop {
            if let Some(tok) = self.try_acquire() {
                return tok;
            }
            if spins < SPINS_BEFORE_YIELD {
                spins += 1;
                hint::spin_loop();
            } else {
                thread::yield_now();
            }
        }
    }

    /// Number of slots currently held.
    pub fn active(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    fn release_id(&self, id: usize) {
        let (w, bit) = (id / BITS, id % BITS);
        let prev = self.words[w].fetch_and(!(1u64 << bit), Ordering::Release);
        debug_assert!(prev & (1u64 << bit) != 0, "slot {id} released twice");
    }
}

/// A held slot. Returned to the pool on drop.
#[derive(Debug)]
pub struct SlotToken<'a> {
    pool: &'a SlotTokens,
    id: usize,
}

impl SlotToken<'_> {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Explicit release; same as dropping the token.
    pub fn release(self) {}
}

impl Drop for SlotToken<'_> {
    fn drop(&mut self) {
        self.pool.release_id(self.id);
    }
}
