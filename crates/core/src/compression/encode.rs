use super::{FOOTER_LEN, MAX_DISPLACEMENT, MAX_MATCH, MIN_MATCH};

/// Largest `end_delta` the footer's 24-bit field can hold.
const MAX_END_DELTA: usize = 0x00FF_FFFF;

/// Output and stream positions after each encoded unit (literal or back-reference).
struct Progress {
    produced: usize,
    consumed: usize,
}

/// Compress `plain` into the stored backward-LZSS layout.
///
/// Greedy encoder: good enough for fixtures and round-trip checks, not tuned for
/// ratio. Like the console toolchain it leaves a leading part of the module
/// uncompressed so the result is also safe to decode in place: the stream is cut
/// where `produced - consumed` peaks, which keeps the in-place write cursor from
/// ever overtaking unread input.
///
/// Returns `None` when nothing would be saved, since the footer cannot express a
/// module that does not grow on decompression.
pub fn compress(plain: &[u8]) -> Option<Vec<u8>> {
    let reversed: Vec<u8> = plain.iter().rev().copied().collect();
    let (stream, progress) = encode_forward(&reversed);

    let cut = progress.iter().max_by_key(|p| p.produced as isize - p.consumed as isize)?;
    let prefix_len = plain.len() - cut.produced;

    let pad = (4 - (prefix_len + cut.consumed) % 4) % 4;
    let padding = pad + FOOTER_LEN;
    let end_delta = cut.consumed + padding;
    if end_delta >= cut.produced || end_delta > MAX_END_DELTA {
        return None;
    }
    let start_delta = cut.produced - end_delta;

    let mut stored = Vec::with_capacity(prefix_len + end_delta);
    stored.extend_from_slice(&plain[..prefix_len]);
    stored.extend(stream[..cut.consumed].iter().rev());
    stored.resize(stored.len() + pad, 0xFF);
    stored.extend_from_slice(&(((padding as u32) << 24) | end_delta as u32).to_le_bytes());
    stored.extend_from_slice(&(start_delta as u32).to_le_bytes());
    Some(stored)
}

fn encode_forward(data: &[u8]) -> (Vec<u8>, Vec<Progress>) {
    let mut out = Vec::with_capacity(data.len() + data.len() / 8 + 1);
    let mut progress = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let flag_pos = out.len();
        out.push(0u8);

        for bit in 0..8 {
            if pos >= data.len() {
                break;
            }
            match longest_match(data, pos) {
                Some((len, displacement)) => {
                    out[flag_pos] |= 0x80 >> bit;
                    let token = (((len - MIN_MATCH) << 12) | (displacement - MIN_MATCH)) as u16;
                    out.extend_from_slice(&token.to_be_bytes());
                    pos += len;
                }
                None => {
                    out.push(data[pos]);
                    pos += 1;
                }
            }
            progress.push(Progress { produced: pos, consumed: out.len() });
        }
    }

    (out, progress)
}

/// Longest earlier occurrence of the bytes at `pos`, as `(length, displacement)`.
fn longest_match(data: &[u8], pos: usize) -> Option<(usize, usize)> {
    let max_len = MAX_MATCH.min(data.len() - pos);
    if max_len < MIN_MATCH {
        return None;
    }

    let mut best: Option<(usize, usize)> = None;
    for displacement in MIN_MATCH..=MAX_DISPLACEMENT.min(pos) {
        let src = pos - displacement;
        let len = (0..max_len).take_while(|&i| data[src + i] == data[pos + i]).count();
        if len >= MIN_MATCH && best.map_or(true, |(b, _)| len > b) {
            best = Some((len, displacement));
            if len == max_len {
                break;
            }
        }
    }
    best
}
