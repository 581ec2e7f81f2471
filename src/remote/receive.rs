//! Atomic local writes for downloaded files

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

const BUFFER_SIZE: usize = 128 * 1024;

/// Stream exactly `expected` bytes from `reader` into `dest` using the
/// write-then-rename strategy:
/// 1. Write to a temporary `.part` file next to `dest`
/// 2. Flush and sync to disk
/// 3. Rename over `dest`
///
/// The `.part` file is removed if anything fails, so `dest` is either the old
/// content or the complete new content.
pub(crate) fn receive_atomic<R: Read>(
    reader: &mut R,
    dest: &Path,
    expected: u64,
) -> io::Result<u64> {
    let part_path = part_path_for(dest);

    let result = write_part(reader, &part_path, expected);
    match result {
        Ok(total) => {
            fs::rename(&part_path, dest)?;
            Ok(total)
        }
        Err(e) => {
            let _ = fs::remove_file(&part_path);
            Err(e)
        }
    }
}

fn write_part<R: Read>(reader: &mut R, part_path: &Path, expected: u64) -> io::Result<u64> {
    let mut part_file = File::create(part_path)?;
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;

    while total < expected {
        let want = usize::try_from(expected - total)
            .unwrap_or(BUFFER_SIZE)
            .min(BUFFER_SIZE);
        let n = reader.read(&mut buffer[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended after {} of {} bytes", total, expected),
            ));
        }
        part_file.write_all(&buffer[..n])?;
        total += n as u64;
    }

    part_file.sync_all()?;
    Ok(total)
}

/// `name.ext` -> `name.ext.part`
fn part_path_for(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
