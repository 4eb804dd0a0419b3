//! Filename -> owner id hashing.
//!
//! Owner id 0 is reserved for tombstones; both hashes below reject the
//! empty name and never produce 0 for a non-empty one.

use crate::error::{Error, Result};

/// The additive hash from the reference C implementation's
/// `file_name_to_owner`, reproduced bit-for-bit including its
/// statement-ordering quirk: `ch` is read one iteration stale relative to
/// `i`, so the first byte is added twice (at weights `2^0` and `2^1`) and
/// every later byte `k` lands at weight `2^(k+1)` instead of the `2^k` the
/// "obvious" formula would suggest. Weak, collision-prone, and not what a
/// fresh implementation would choose — but required for bit-for-bit
/// compatibility with volumes written by that implementation.
pub fn legacy_owner_hash(name: &str) -> Result<u32> {
    if name.is_empty() {
        return Err(Error::InvalidName);
    }

    // Mirror the C do-while's NUL-terminated scan; `name` has no trailing
    // NUL of its own, so append one to stand in for the C string terminator.
    let bytes: Vec<u8> = name.bytes().chain(std::iter::once(0u8)).collect();

    let mut owner: u32 = 0;
    let mut i: u32 = 0;
    let mut ch = bytes[i as usize];
    loop {
        owner = owner.wrapping_add((ch as u32).wrapping_shl(i));
        ch = bytes[i as usize];
        i += 1;
        if ch == 0 {
            break;
        }
    }

    Ok(non_zero_owner(owner))
}

/// FNV-1a over the name's UTF-8 bytes. The crate's default for greenfield
/// volumes, per the spec's own recommendation to prefer a stronger
/// injective hash when legacy on-disk compatibility isn't required.
pub fn owner_hash(name: &str) -> Result<u32> {
    if name.is_empty() {
        return Err(Error::InvalidName);
    }

    const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut hash = FNV_OFFSET_BASIS;
    for &byte in name.as_bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    Ok(non_zero_owner(hash))
}

/// Owner id 0 is reserved for tombstones; remap the one hash value that
/// would collide with it rather than ever returning 0 for a valid name.
fn non_zero_owner(hash: u32) -> u32 {
    if hash == 0 {
        1
    } else {
        hash
    }
}
