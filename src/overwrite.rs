/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::error::OverwriteError;
use crate::random::RandomSource;

/// The fixed 8-entry byte-fill schedule used in `secure` mode
/// (spec.md §3's pattern schedule P). Compile-time fixed, never
/// shortened at runtime.
pub const PATTERN_SCHEDULE: [u8; 8] = [0x00, 0xFF, 0xAA, 0x55, 0x3D, 0xC2, 0x8E, 0x4E];

const OPEN_RETRIES: u32 = 10;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Opens `path` read/write, retrying up to 10 times 500ms apart before
/// giving up (spec.md §4.5/§4.6's `[Open]` state).
pub fn open_with_retries(path: &Path) -> Result<File, OverwriteError> {
    let mut last_err = None;
    for attempt in 1..=OPEN_RETRIES {
        match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => return Ok(file),
            Err(err) => {
                last_err = Some(err);
                if attempt < OPEN_RETRIES {
                    thread::sleep(OPEN_RETRY_DELAY);
                }
            }
        }
    }
    Err(OverwriteError::Open {
        path: path.to_path_buf(),
        attempts: OPEN_RETRIES,
        source: last_err.expect("loop ran at least once"),
    })
}

fn write_at(file: &mut File, path: &Path, offset: u64, buf: &[u8]) -> Result<(), OverwriteError> {
    file.seek(SeekFrom::Start(offset))
        .map_err(|source| OverwriteError::Seek {
            path: path.to_path_buf(),
            offset,
            source,
        })?;
    file.write_all(buf).map_err(|source| OverwriteError::Write {
        path: path.to_path_buf(),
        offset,
        source,
    })
}

/// Runs one top-level overwrite pass (spec.md §4.5's "Pass schedule").
/// Returns the bytes written to disk, sized exactly to `size`, when
/// `verify` is requested (otherwise an empty buffer since nothing will
/// read it back).
pub fn run_pass(
    file: &mut File,
    path: &Path,
    size: u64,
    block_size: u64,
    secure: bool,
    verify: bool,
    pass_index: u32,
    random: &RandomSource,
) -> Result<Vec<u8>, OverwriteError> {
    if secure {
        run_secure_pass(file, path, size, block_size, verify, pass_index, random)
    } else {
        run_random_pass(file, path, size, block_size, verify, pass_index, random)
    }
}

/// `secure = false`: a single fresh-random fill of the whole file,
/// written `block_size` bytes at a time (same block-aligned buffer
/// reused across the pass as the secure-mode kernel does).
fn run_random_pass(
    file: &mut File,
    path: &Path,
    size: u64,
    block_size: u64,
    verify: bool,
    pass_index: u32,
    random: &RandomSource,
) -> Result<Vec<u8>, OverwriteError> {
    let mut last_written = if verify {
        vec![0u8; size as usize]
    } else {
        Vec::new()
    };
    let mut offset = 0u64;
    let mut buf = vec![0u8; block_size as usize];
    while offset < size {
        let len = std::cmp::min(block_size, size - offset) as usize;
        random.fill(&mut buf[..len], pass_index, 0, offset);
        write_at(file, path, offset, &buf[..len])?;
        if verify {
            last_written[offset as usize..offset as usize + len].copy_from_slice(&buf[..len]);
        }
        offset += len as u64;
    }
    Ok(last_written)
}

/// `secure = true`: for each file-aligned block, the 8-entry pattern
/// schedule with random interleaved after each odd sub-pass (`k` is
/// zero-indexed over the schedule, so random follows P[1], P[3], P[5],
/// P[7] — the 1st, 2nd, 3rd, 4th random insertion of the region, in
/// that order; see DESIGN.md's "Sub-pass random-fill parity" entry),
/// followed by the three DoD 5220.22-M sub-passes (zero, one, fresh
/// random). The region is fully processed before the kernel advances
/// to the next block.
fn run_secure_pass(
    file: &mut File,
    path: &Path,
    size: u64,
    block_size: u64,
    verify: bool,
    pass_index: u32,
    random: &RandomSource,
) -> Result<Vec<u8>, OverwriteError> {
    let mut last_written = if verify {
        vec![0u8; size as usize]
    } else {
        Vec::new()
    };
    let mut offset = 0u64;
    while offset < size {
        let region_len = std::cmp::min(block_size, size - offset) as usize;
        let mut buf = vec![0u8; region_len];

        for (k, pattern) in PATTERN_SCHEDULE.iter().enumerate() {
            let k = k as u8;
            buf.fill(*pattern);
            write_at(file, path, offset, &buf)?;
            if k % 2 == 1 {
                random.fill(&mut buf, pass_index, k, offset);
                write_at(file, path, offset, &buf)?;
            }
        }

        // DoD 5220.22-M coda: all-zero, all-one, fresh random.
        buf.fill(0x00);
        write_at(file, path, offset, &buf)?;
        buf.fill(0xFF);
        write_at(file, path, offset, &buf)?;
        random.fill(&mut buf, pass_index, 10, offset);
        write_at(file, path, offset, &buf)?;

        if verify {
            last_written[offset as usize..offset as usize + region_len].copy_from_slice(&buf);
        }
        offset += region_len as u64;
    }
    Ok(last_written)
}

/// Verifies on-disk contents against `last_written` (spec.md §4.5's
/// "Verification" step). Uses the SHA-256 hasher when the `hash-verify`
/// feature is enabled; otherwise (and always as the fallback) compares
/// block by block.
pub fn verify_pass(
    file: &mut File,
    path: &Path,
    last_written: &[u8],
    block_size: u64,
) -> Result<bool, OverwriteError> {
    #[cfg(feature = "hash-verify")]
    {
        if let Ok(matched) = verify_by_hash(file, path, last_written) {
            return Ok(matched);
        }
    }
    verify_by_bytes(file, path, last_written, block_size)
}

#[cfg(feature = "hash-verify")]
fn verify_by_hash(
    file: &mut File,
    path: &Path,
    last_written: &[u8],
) -> Result<bool, OverwriteError> {
    let mut on_disk = Vec::with_capacity(last_written.len());
    file.seek(SeekFrom::Start(0))
        .map_err(|source| OverwriteError::VerifyRead {
            path: path.to_path_buf(),
            source,
        })?;
    file.read_to_end(&mut on_disk)
        .map_err(|source| OverwriteError::VerifyRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(crate::hasher::digest(&on_disk) == crate::hasher::digest(last_written))
}

fn verify_by_bytes(
    file: &mut File,
    path: &Path,
    last_written: &[u8],
    block_size: u64,
) -> Result<bool, OverwriteError> {
    file.seek(SeekFrom::Start(0))
        .map_err(|source| OverwriteError::VerifyRead {
            path: path.to_path_buf(),
            source,
        })?;
    let mut buf = vec![0u8; block_size as usize];
    let mut offset = 0usize;
    while offset < last_written.len() {
        let len = std::cmp::min(block_size as usize, last_written.len() - offset);
        file.read_exact(&mut buf[..len])
            .map_err(|source| OverwriteError::VerifyRead {
                path: path.to_path_buf(),
                source,
            })?;
        if buf[..len] != last_written[offset..offset + len] {
            return Ok(false);
        }
        offset += len;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RandomSource;
    use tempfile::NamedTempFile;

    fn open_rw(path: &Path) -> File {
        OpenOptions::new().read(true).write(true).open(path).unwrap()
    }

    #[test]
    fn random_pass_round_trips_under_verify() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path();
        std::fs::write(path, vec![0x41u8; 4096]).unwrap();
        let mut file = open_rw(path);
        let random = RandomSource::new();
        let last_written = run_pass(&mut file, path, 4096, 4096, false, true, 1, &random).unwrap();
        assert_eq!(last_written.len(), 4096);
        let matched = verify_pass(&mut file, path, &last_written, 4096).unwrap();
        assert!(matched);
    }

    #[test]
    fn secure_pass_prefix_follows_fixed_schedule() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path();
        std::fs::write(path, vec![0x00u8; 8192]).unwrap();
        let mut file = open_rw(path);
        let random = RandomSource::new();
        let last_written =
            run_pass(&mut file, path, 8192, 8192, true, true, 1, &random).unwrap();
        assert_eq!(last_written.len(), 8192);
        let matched = verify_pass(&mut file, path, &last_written, 8192).unwrap();
        assert!(matched);
    }

    #[test]
    fn random_pass_chunks_by_block_size_across_multiple_blocks() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path();
        let size = 10_000u64;
        std::fs::write(path, vec![0x11u8; size as usize]).unwrap();
        let mut file = open_rw(path);
        let random = RandomSource::new();
        let last_written = run_pass(&mut file, path, size, 4096, false, true, 1, &random).unwrap();
        assert_eq!(last_written.len(), size as usize);
        let matched = verify_pass(&mut file, path, &last_written, 4096).unwrap();
        assert!(matched);
    }

    #[test]
    fn size_smaller_than_block_writes_exact_region() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path();
        std::fs::write(path, vec![0x42u8; 10]).unwrap();
        let mut file = open_rw(path);
        let random = RandomSource::new();
        let last_written = run_pass(&mut file, path, 10, 4096, false, true, 1, &random).unwrap();
        assert_eq!(last_written.len(), 10);
    }
}
