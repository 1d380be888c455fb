use crate::error::AssetError;

// Opcode map for the packed pixel stream:
// 0x00         terminator
// 0x01..=0x1F  literal, cmd bytes follow
// 0x20..=0x3F  unassigned, rejected
// 0x40..=0x5F  short run: next byte repeated (cmd & 0x3F) + 3 times
// 0x60..=0x7F  long run: ((cmd & 0x1F) << 8) + len_byte + 36 repeats of val_byte
// 0x80..=0x9F  copy 2 from distance (cmd & 0x1F) + 2
// 0xA0..=0xBF  copy 3 from distance (cmd & 0x1F) + 3
// 0xC0..=0xFF  long copy, length 4..19, 9-bit offset in cmd low bits + next byte
pub const OP_TERMINATOR: u8 = 0x00;

const SHORT_RUN_BIAS: usize = 3;
const LONG_RUN_BIAS: usize = 36;
const COPY2_BIAS: usize = 2;
const COPY3_BIAS: usize = 3;

/// Expand a packed pixel stream to exactly `expected_len` index bytes.
/// Back-references may reach behind the start of output; those positions
/// read as zero (the history window starts zero-filled).
pub fn expand(stream: &[u8], expected_len: usize) -> Result<Vec<u8>, AssetError> {
    let mut out: Vec<u8> = Vec::with_capacity(expected_len.min(1 << 20));
    let mut pos = 0usize;

    while pos < stream.len() {
        let cmd = stream[pos];
        match cmd {
            OP_TERMINATOR => break,

            0x01..=0x1F => {
                let n = cmd as usize;
                let lit = take(stream, pos + 1, n)?;
                out.extend_from_slice(lit);
                pos += 1 + n;
            }

            0x20..=0x3F => {
                return Err(AssetError::MalformedContainer(format!(
                    "unassigned opcode {:#04x} at stream offset {}",
                    cmd, pos
                )));
            }

            0x40..=0x5F => {
                let n = (cmd & 0x3F) as usize + SHORT_RUN_BIAS;
                let val = take(stream, pos + 1, 1)?[0];
                out.resize(out.len() + n, val);
                pos += 2;
            }

            0x60..=0x7F => {
                let rest = take(stream, pos + 1, 2)?;
                let n = (((cmd & 0x1F) as usize) << 8) + rest[0] as usize + LONG_RUN_BIAS;
                out.resize(out.len() + n, rest[1]);
                pos += 3;
            }

            0x80..=0x9F => {
                copy_back(&mut out, (cmd & 0x1F) as usize + COPY2_BIAS, 2);
                pos += 1;
            }

            0xA0..=0xBF => {
                copy_back(&mut out, (cmd & 0x1F) as usize + COPY3_BIAS, 3);
                pos += 1;
            }

            0xC0..=0xFF => {
                let lo = take(stream, pos + 1, 1)?[0];
                let group = ((cmd >> 4) - 0xC) as usize;
                let len = 4 * group + 4 + ((cmd >> 2) & 0x3) as usize;
                let dist = ((((cmd & 0x3) as usize) << 8) | lo as usize) + len;
                copy_back(&mut out, dist, len);
                pos += 2;
            }
        }

        if out.len() > expected_len {
            return Err(AssetError::MalformedContainer(format!(
                "packed stream expanded to {} bytes, {} declared",
                out.len(),
                expected_len
            )));
        }
    }

    if out.len() < expected_len {
        return Err(AssetError::TruncatedContainer(format!(
            "packed stream produced {} of {} pixel bytes",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}

fn take(stream: &[u8], at: usize, n: usize) -> Result<&[u8], AssetError> {
    if at + n > stream.len() {
        return Err(AssetError::TruncatedContainer(format!(
            "packed stream ends inside an opcode at offset {}",
            at
        )));
    }
    Ok(&stream[at..at + n])
}

// Distance always covers the copy length (the bias construction guarantees
// dist >= len), so the source bytes all precede this opcode's output.
fn copy_back(out: &mut Vec<u8>, dist: usize, len: usize) {
    let base = out.len() as isize - dist as isize;
    for i in 0..len as isize {
        let idx = base + i;
        let byte = if idx < 0 { 0 } else { out[idx as usize] };
        out.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_opcode_copies_bytes() {
        let stream = [0x03, 0xAA, 0xBB, 0xCC, OP_TERMINATOR];
        let out = expand(&stream, 3).expect("expand");
        assert_eq!(out, vec![0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn short_run_repeats_value() {
        // 0x40 -> (0x40 & 0x3F) + 3 = 3 repeats
        let stream = [0x40, 0x7E, OP_TERMINATOR];
        assert_eq!(expand(&stream, 3).unwrap(), vec![0x7E; 3]);
        // 0x5F -> 31 + 3 = 34 repeats
        let stream = [0x5F, 0x01, OP_TERMINATOR];
        assert_eq!(expand(&stream, 34).unwrap(), vec![0x01; 34]);
    }

    #[test]
    fn long_run_uses_extension_byte() {
        // 0x60, 0x00 -> 0 + 0 + 36 repeats
        let stream = [0x60, 0x00, 0x42, OP_TERMINATOR];
        assert_eq!(expand(&stream, 36).unwrap(), vec![0x42; 36]);
        // 0x61, 0x04 -> 256 + 4 + 36 = 296 repeats
        let stream = [0x61, 0x04, 0x05, OP_TERMINATOR];
        assert_eq!(expand(&stream, 296).unwrap(), vec![0x05; 296]);
    }

    #[test]
    fn copy2_and_copy3_reference_history() {
        // Emit AA BB CC, then copy 2 from distance 2 -> BB CC
        let stream = [0x03, 0xAA, 0xBB, 0xCC, 0x80, OP_TERMINATOR];
        assert_eq!(
            expand(&stream, 5).unwrap(),
            vec![0xAA, 0xBB, 0xCC, 0xBB, 0xCC]
        );
        // Copy 3 from distance 3 repeats the last three bytes
        let stream = [0x03, 0x01, 0x02, 0x03, 0xA0, OP_TERMINATOR];
        assert_eq!(
            expand(&stream, 6).unwrap(),
            vec![0x01, 0x02, 0x03, 0x01, 0x02, 0x03]
        );
    }

    #[test]
    fn long_copy_decodes_length_and_offset() {
        // cmd 0xC0, lo 0x00: len = 4, dist = 0 + 4 -> copies the last 4 bytes
        let stream = [0x04, 0x10, 0x20, 0x30, 0x40, 0xC0, 0x00, OP_TERMINATOR];
        assert_eq!(
            expand(&stream, 8).unwrap(),
            vec![0x10, 0x20, 0x30, 0x40, 0x10, 0x20, 0x30, 0x40]
        );
        // cmd 0xD4: group 1 -> base 8, extra 1 -> len 9
        let stream = [
            0x09, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0xD4, 0x00, OP_TERMINATOR,
        ];
        let out = expand(&stream, 18).unwrap();
        assert_eq!(&out[9..], &out[..9]);
    }

    #[test]
    fn references_behind_start_read_zero() {
        // Copy 2 from distance 9 with empty history -> two zero bytes
        let stream = [0x87, 0x01, 0xFF, OP_TERMINATOR];
        assert_eq!(expand(&stream, 3).unwrap(), vec![0x00, 0x00, 0xFF]);
    }

    #[test]
    fn unassigned_opcodes_are_rejected() {
        let err = expand(&[0x20], 1).unwrap_err();
        assert_eq!(err.kind(), "malformed-container");
        let err = expand(&[0x3F], 1).unwrap_err();
        assert_eq!(err.kind(), "malformed-container");
    }

    #[test]
    fn output_overrun_is_malformed() {
        let stream = [0x40, 0x00, OP_TERMINATOR]; // produces 3 bytes
        let err = expand(&stream, 2).unwrap_err();
        assert_eq!(err.kind(), "malformed-container");
    }

    #[test]
    fn short_stream_and_cut_opcode_are_truncated() {
        // Terminator before enough output
        let err = expand(&[0x01, 0xAA, OP_TERMINATOR], 5).unwrap_err();
        assert_eq!(err.kind(), "truncated-container");
        // Literal opcode promising more bytes than remain
        let err = expand(&[0x05, 0xAA], 5).unwrap_err();
        assert_eq!(err.kind(), "truncated-container");
        // Stream ending with no terminator and short output
        let err = expand(&[0x01, 0xAA], 5).unwrap_err();
        assert_eq!(err.kind(), "truncated-container");
    }
}
