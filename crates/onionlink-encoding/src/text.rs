//! Ascii85 and decimal renderings of binary data

/// First character of the Ascii85 alphabet ('!'); the alphabet is the 85
/// consecutive code points starting here.
const B85_OFFSET: u8 = 33;

/// Encode bytes as Ascii85.
///
/// Every 4-byte group becomes 5 characters. A trailing group of `n` bytes is
/// zero-extended and truncated to `n + 1` characters. There is no `z`
/// shorthand for all-zero groups.
pub fn b85_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(4) * 5);

    for group in data.chunks(4) {
        let mut word = [0u8; 4];
        word[..group.len()].copy_from_slice(group);
        let mut value = u32::from_be_bytes(word);

        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (value % 85) as u8 + B85_OFFSET;
            value /= 85;
        }

        for &d in &digits[..group.len() + 1] {
            out.push(char::from(d));
        }
    }

    out
}

/// Render bytes as the decimal value of their big-endian unsigned integer.
///
/// Empty input renders as `"0"`.
pub fn b10_encode(data: &[u8]) -> String {
    // Little-endian base-10^9 limbs
    const LIMB: u64 = 1_000_000_000;
    let mut limbs: Vec<u64> = vec![0];

    for &byte in data {
        let mut carry = u64::from(byte);
        for limb in limbs.iter_mut() {
            let v = *limb * 256 + carry;
            *limb = v % LIMB;
            carry = v / LIMB;
        }
        while carry > 0 {
            limbs.push(carry % LIMB);
            carry /= LIMB;
        }
    }

    let mut out = String::new();
    let mut iter = limbs.iter().rev();
    if let Some(top) = iter.next() {
        out.push_str(&top.to_string());
    }
    for limb in iter {
        out.push_str(&format!("{limb:09}"));
    }
    out
}
