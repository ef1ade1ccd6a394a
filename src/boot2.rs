//! The RP2040 second-stage bootloader image
//!
//! The boot ROM copies the first 256 bytes of flash into SRAM, checks that
//! the last four bytes are the CRC-32 (MPEG-2 parameters) of the first
//! 252, and jumps to it. Our stage is the minimal flash bring-up: put the
//! XIP SSI into standard 03h serial-read mode - correct for any 25-series
//! part including the Pico's W25Q080, if not the fastest - and then enter
//! the kernel through the vector table that follows this image in flash.
//!
//! The payload is kept as hand-assembled Thumb halfwords. It is 60 bytes
//! of straight-line register writes, and spelling the words out keeps the
//! image auditable against the datasheet and lets a `const fn` stamp the
//! checksum in at compile time.

/// The stage-2 code, one halfword per instruction.
///
/// Register map: r3 = XIP_SSI base, r1 = scratch value, r0 = scratch
/// address. SSI offsets: CTRLR0 0x00, CTRLR1 0x04, SSIENR 0x08, BAUDR
/// 0x14, SPI_CTRLR0 0xF4 (out of `str`'s immediate range, hence the
/// separate address literal).
const PAYLOAD_CODE: [u16; 20] = [
    0x4B09, // ldr  r3, =0x18000000     ; XIP_SSI
    0x2100, // movs r1, #0
    0x6099, // str  r1, [r3, #0x08]     ; SSIENR = 0, configure while disabled
    0x2104, // movs r1, #4
    0x6159, // str  r1, [r3, #0x14]     ; BAUDR = 4 (clk_sys / 4)
    0x4908, // ldr  r1, =0x001F0300     ; 32-bit frames, EEPROM-read mode
    0x6019, // str  r1, [r3, #0x00]     ; CTRLR0
    0x2100, // movs r1, #0
    0x6059, // str  r1, [r3, #0x04]     ; CTRLR1: NDF = 0
    0x4807, // ldr  r0, =0x180000F4     ; &SPI_CTRLR0
    0x4907, // ldr  r1, =0x03000218     ; cmd 03h, 24-bit address, 8-bit instr
    0x6001, // str  r1, [r0]
    0x2101, // movs r1, #1
    0x6099, // str  r1, [r3, #0x08]     ; SSIENR = 1, XIP reads are live
    0x4806, // ldr  r0, =0x10000100     ; vector table, just past this image
    0x6801, // ldr  r1, [r0]
    0xF381, // msr  msp, r1             ; (32-bit encoding, first half)
    0x8808, //                          ; (second half)
    0x6841, // ldr  r1, [r0, #4]
    0x4708, // bx   r1                  ; into the reset handler
];

/// The literal pool the `ldr`s above reach into, placed right after the code
const PAYLOAD_LITERALS: [u32; 5] = [
    0x1800_0000, // XIP_SSI base
    0x001F_0300, // CTRLR0: DFS_32 = 31, TMOD = EEPROM read
    0x1800_00F4, // &SPI_CTRLR0
    0x0300_0218, // SPI_CTRLR0: XIP_CMD = 03h, ADDR_L = 24 bit, INST_L = 8 bit
    0x1000_0100, // flash base + 0x100: the vector table
];

/// CRC-32 with the MPEG-2 parameter set the boot ROM checks: polynomial
/// `0x04C11DB7`, initial value `0xFFFFFFFF`, no input or output
/// reflection, no final xor.
pub(crate) const fn crc32_mpeg2(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    let mut index = 0;
    while index < bytes.len() {
        crc ^= (bytes[index] as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ 0x04C1_1DB7
            } else {
                crc << 1
            };
            bit += 1;
        }
        index += 1;
    }
    crc
}

/// Assemble the full 256-byte image: code, literals, `0xFF` padding, and
/// the checksum over bytes 0..252 in the final four bytes, little-endian.
const fn build_image() -> [u8; 256] {
    let mut image = [0xFFu8; 256];
    let mut offset = 0;
    let mut index = 0;
    while index < PAYLOAD_CODE.len() {
        let [low, high] = PAYLOAD_CODE[index].to_le_bytes();
        image[offset] = low;
        image[offset + 1] = high;
        offset += 2;
        index += 1;
    }
    index = 0;
    while index < PAYLOAD_LITERALS.len() {
        let bytes = PAYLOAD_LITERALS[index].to_le_bytes();
        let mut byte = 0;
        while byte < 4 {
            image[offset] = bytes[byte];
            offset += 1;
            byte += 1;
        }
        index += 1;
    }
    let (payload, _checksum) = image.split_at(252);
    let crc = crc32_mpeg2(payload).to_le_bytes();
    image[252] = crc[0];
    image[253] = crc[1];
    image[254] = crc[2];
    image[255] = crc[3];
    image
}

/// The image the linker pins to flash offset 0
#[cfg(target_os = "none")]
#[unsafe(no_mangle)]
#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2_IMAGE: [u8; 256] = build_image();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_golden_value_over_padding() {
        // CRC-32/MPEG-2 over 252 bytes of 0xFF.
        assert_eq!(crc32_mpeg2(&[0xFF; 252]), 0x0B8F_D31A);
    }

    #[test]
    fn crc_of_nothing_is_the_initial_value() {
        assert_eq!(crc32_mpeg2(&[]), 0xFFFF_FFFF);
    }

    #[test]
    fn image_shape() {
        let image = build_image();
        assert_eq!(image.len(), 256);
        // Code and literals, then padding up to the checksum.
        let payload_len = 2 * PAYLOAD_CODE.len() + 4 * PAYLOAD_LITERALS.len();
        assert_eq!(payload_len, 60);
        assert!(image[payload_len..252].iter().all(|&b| b == 0xFF));
        // The tail is the checksum of everything before it.
        let crc = crc32_mpeg2(&image[..252]);
        assert_eq!(image[252..256], crc.to_le_bytes());
    }

    #[test]
    fn literal_pool_is_where_the_loads_point() {
        // Each `ldr rt, [pc, #imm]` must resolve inside the literal pool:
        // target = align4(instr_addr + 4) + imm8 * 4.
        let pool_start = 2 * PAYLOAD_CODE.len();
        let pool_end = pool_start + 4 * PAYLOAD_LITERALS.len();
        for (index, &word) in PAYLOAD_CODE.iter().enumerate() {
            if word & 0xF800 != 0x4800 {
                continue;
            }
            let instr_addr = index * 2;
            let target = ((instr_addr + 4) & !3) + 4 * (word & 0xFF) as usize;
            assert!(
                (pool_start..pool_end).contains(&target) && target.is_multiple_of(4),
                "ldr at {instr_addr:#x} points outside the pool"
            );
        }
    }
}

// End of File
