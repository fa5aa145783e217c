//! Double-SHA256, used for block/transaction hashes and legacy sighash digests.

use sha2::{Digest, Sha256};
use std::io;

/// An incremental double-SHA256 writer.
///
/// Bytes written to this type are hashed once with SHA256 as they arrive;
/// `finish` applies the second SHA256 pass over the accumulated digest.
#[derive(Default)]
pub struct Writer(Sha256);

impl Writer {
    pub fn finish(self) -> [u8; 32] {
        let first = self.0.finalize();
        let second = Sha256::digest(first);
        let mut out = [0u8; 32];
        out.copy_from_slice(&second);
        out
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Double-SHA256 of a single buffer, as used for legacy sighash digests.
pub fn digest(bytes: &[u8]) -> [u8; 32] {
    let mut writer = Writer::default();
    io::Write::write_all(&mut writer, bytes).expect("writing to a Writer is infallible");
    writer.finish()
}
