//! Host file <-> inode copy helpers.
//!
//! They only stream bytes through the engine; the lock is taken once per chunk.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use simple_fs::SharedFileSystem;

const CHUNK_SIZE: usize = 16384;

/// Copies a host file into inode `inumber`, returning the bytes copied.
///
/// A short write (disk full) stops the copy without failing it.
pub fn copyin(fs: &SharedFileSystem, path: impl AsRef<Path>, inumber: u32) -> io::Result<usize> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0; CHUNK_SIZE];
    let mut offset = 0;

    loop {
        let len = file.read(&mut buffer)?;
        if len == 0 {
            break;
        }

        let actual = match fs.lock().write(inumber, &buffer[..len], offset) {
            Ok(actual) => actual,
            Err(err) if offset > 0 => {
                log::warn!("copy stopped after {offset} bytes: {err}");
                break;
            }
            Err(err) => return Err(io::Error::other(err)),
        };

        offset += actual;
        if actual != len {
            log::warn!("fs write only wrote {actual} bytes, not {len} bytes");
            break;
        }
    }

    Ok(offset)
}

/// Streams inode `inumber` into `out`, returning the bytes copied.
pub fn copyout(fs: &SharedFileSystem, inumber: u32, out: &mut impl Write) -> io::Result<usize> {
    let mut buffer = vec![0; CHUNK_SIZE];
    let mut offset = 0;

    loop {
        let len = fs
            .lock()
            .read(inumber, &mut buffer, offset)
            .map_err(io::Error::other)?;
        if len == 0 {
            break;
        }

        out.write_all(&buffer[..len])?;
        offset += len;
    }

    Ok(offset)
}
