//! Bit-field extraction from raw 64-bit word snapshots.
//!
//! A field lives in at most two consecutive words: its low part is
//! `(word[i] & mask_a) >> shift_a` and its high part `(word[i + 1] & mask_b) << shift_b`.
//! A field entirely inside one word has `mask_b == 0`, and may then sit in the last
//! word of the snapshot.

use serde::{Deserialize, Serialize};

/// How the raw bits of a field are interpreted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceEncoding {
    UnsignedBits,
    /// Two's complement, sign-extended from the field width.
    TwosComplementSignedBits,
    /// IEEE 754 single precision bit pattern in the low 32 bits.
    Float32,
}

/// How a field is written to its output stream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DestinationEncoding {
    SignedBits,
    Float32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Int(i32),
    Float(f32),
}

/// Location of a field inside a snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitField {
    /// Index of the low word.
    pub word: usize,
    pub mask_a: u64,
    pub shift_a: u32,
    #[serde(default)]
    pub mask_b: u64,
    #[serde(default)]
    pub shift_b: u32,
}

impl BitField {
    /// A field of `width` bits starting at absolute bit `offset` of the snapshot.
    pub fn span(offset: u32, width: u32) -> Self {
        let word = (offset / 64) as usize;
        let bit = offset % 64;
        let low_width = width.min(64 - bit);
        let high_width = width - low_width;
        Self {
            word,
            mask_a: low_mask(low_width) << bit,
            shift_a: bit,
            mask_b: low_mask(high_width),
            shift_b: low_width,
        }
    }

    /// Number of words the field reads, counted from word 0.
    pub fn words_required(&self) -> usize {
        if self.mask_b == 0 {
            self.word + 1
        } else {
            self.word + 2
        }
    }

    /// Field width in bits.
    pub fn width(&self) -> u32 {
        self.mask_a.count_ones() + self.mask_b.count_ones()
    }

    #[inline]
    fn high_word(&self, words: &[u64]) -> u64 {
        if self.mask_b == 0 {
            0
        } else {
            words.get(self.word + 1).copied().unwrap_or(0)
        }
    }

    /// True if any bit of the field is set in `changed`.
    #[inline]
    pub fn is_changed(&self, changed: &[u64]) -> bool {
        let lo = changed.get(self.word).copied().unwrap_or(0);
        (lo & self.mask_a) | (self.high_word(changed) & self.mask_b) != 0
    }

    /// The raw field bits, right aligned.
    #[inline]
    pub fn extract(&self, words: &[u64]) -> u64 {
        let lo = words.get(self.word).copied().unwrap_or(0);
        let low = (lo & self.mask_a).checked_shr(self.shift_a).unwrap_or(0);
        let high = (self.high_word(words) & self.mask_b)
            .checked_shl(self.shift_b)
            .unwrap_or(0);
        low | high
    }
}

fn low_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn sign_extend(raw: u64, width: u32) -> i64 {
    if width == 0 || width >= 64 {
        return raw as i64;
    }
    let shift = 64 - width;
    ((raw << shift) as i64) >> shift
}

/// Reinterprets raw field bits and converts them to the destination encoding.
///
/// Unsigned fields are read as 32-bit values; bits above 32 are dropped.
pub fn convert(raw: u64, width: u32, source: SourceEncoding, destination: DestinationEncoding) -> FieldValue {
    use DestinationEncoding as D;
    use SourceEncoding as S;
    match (source, destination) {
        (S::UnsignedBits, D::SignedBits) => FieldValue::Int(raw as i32),
        (S::UnsignedBits, D::Float32) => FieldValue::Float(raw as u32 as f32),
        (S::TwosComplementSignedBits, D::SignedBits) => FieldValue::Int(sign_extend(raw, width) as i32),
        (S::TwosComplementSignedBits, D::Float32) => FieldValue::Float(sign_extend(raw, width) as f32),
        (S::Float32, D::SignedBits) => FieldValue::Int(f32::from_bits(raw as u32) as i32),
        (S::Float32, D::Float32) => FieldValue::Float(f32::from_bits(raw as u32)),
    }
}

/// Word-wise `changed = snapshot ^ previous`, then `previous = snapshot`.
pub fn diff_words(snapshot: &[u64], previous: &mut [u64], changed: &mut [u64]) {
    debug_assert!(snapshot.len() == previous.len() && snapshot.len() == changed.len());
    for ((&s, p), c) in snapshot.iter().zip(previous.iter_mut()).zip(changed.iter_mut()) {
        *c = s ^ *p;
        *p = s;
    }
}
