//! Frame word encoding
//!
//! One strip update is a single 32-bit word, sent MSB-first:
//!
//! ```text
//! bits 31-30: constant 0b11 (mode marker)
//! bits 29-28: anti-code(blue)
//! bits 27-26: anti-code(green)
//! bits 25-24: anti-code(red)
//! bits 23-16: blue byte
//! bits 15-8:  green byte
//! bits  7-0:  red byte
//! ```
//!
//! The anti-code is an inverted-high-bits marker the strip's receiver checks
//! against each color byte. The layout must match the hardware exactly.

/// 2-bit anti-code for a color byte: bit 1 set when bit 7 of the byte is
/// clear, bit 0 set when bit 6 is clear.
pub fn anti_code(byte: u8) -> u8 {
    let mut code = 0;
    if byte & 0x80 == 0 {
        code |= 0x02;
    }
    if byte & 0x40 == 0 {
        code |= 0x01;
    }
    code
}

/// Pack a clamped RGB triple into the strip's 32-bit frame word.
pub fn encode_frame(red: u8, green: u8, blue: u8) -> u32 {
    let mut word: u32 = 0x03 << 30;
    word |= u32::from(anti_code(blue)) << 28;
    word |= u32::from(anti_code(green)) << 26;
    word |= u32::from(anti_code(red)) << 24;
    word |= u32::from(blue) << 16;
    word |= u32::from(green) << 8;
    word |= u32::from(red);
    word
}
