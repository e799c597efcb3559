use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::error::FollowError;

/// A capture file opened for incremental reading.
///
/// Plain files are read as-is. Files ending in `.gz` are decompressed on
/// the fly, and their total size comes from the gzip footer: the last
/// four bytes hold the uncompressed length, little-endian.
///
/// ```text
///   raw .gz file:  [ header | deflate members ... | crc32 | isize ]
///                                                          ^^^^^
///                                        uncompressed size mod 2^32
/// ```
///
/// The footer only stores the size modulo 2^32, so for content of 4 GiB
/// or more `total_size` is wrong and progress saturates early. That is a
/// limit of the format and is left as is.
///
/// `position` counts *uncompressed* bytes delivered so far, which is what
/// progress is measured against.
pub struct CaptureSource {
    path: PathBuf,
    reader: BufReader<Box<dyn Read + Send>>,
    total_size: u64,
    position: u64,
    compressed: bool,
}

impl CaptureSource {
    /// Open `path`. With `tail` set, start at the current end of the file
    /// so only content appended later is read.
    ///
    /// # Errors
    ///
    /// - [`FollowError::Open`] if the file cannot be opened.
    /// - [`FollowError::GzipFooter`] if a `.gz` file is under 4 bytes.
    /// - [`FollowError::Io`] if seeking, or skipping to the end of a
    ///   compressed stream, fails.
    pub fn open(path: impl AsRef<Path>, tail: bool) -> Result<Self, FollowError> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).map_err(|source| FollowError::Open {
            path: path.clone(),
            source,
        })?;

        let compressed = is_gzip(&path);
        let mut position = 0;
        let (inner, total_size): (Box<dyn Read + Send>, u64) = if compressed {
            let total = read_gzip_footer(&mut file, &path)?;
            file.seek(SeekFrom::Start(0))?;
            (Box::new(MultiGzDecoder::new(file)), u64::from(total))
        } else {
            let len = file.metadata()?.len();
            if tail {
                position = file.seek(SeekFrom::End(0))?;
            }
            (Box::new(file), len)
        };

        let mut reader = BufReader::new(inner);
        if tail && compressed {
            // A deflate stream cannot seek; decompress and discard instead.
            position = io::copy(&mut reader, &mut io::sink())?;
        }

        debug!(
            path = %path.display(),
            compressed,
            total_size,
            position,
            "opened capture source"
        );

        Ok(Self {
            path,
            reader,
            total_size,
            position,
            compressed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size the source had when opened, in uncompressed bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Uncompressed bytes read so far, including any skipped by tail mode.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// `position / total_size`, clamped to `[0, 1]`. An empty source is
    /// always complete.
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total_size == 0 {
            return 1.0;
        }
        (self.position as f64 / self.total_size as f64).min(1.0)
    }

    /// Append bytes up to and including the next `\n` to `buf`.
    ///
    /// Returns the number of bytes appended; zero means end of file for
    /// now. The last line of a file may lack its terminator.
    ///
    /// # Errors
    ///
    /// Propagates read and decompression errors.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let n = self.reader.read_until(b'\n', buf)?;
        self.position += n as u64;
        Ok(n)
    }

    /// Read up to `buf.len()` bytes. Zero means end of file for now.
    ///
    /// # Errors
    ///
    /// Propagates read and decompression errors.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = loop {
            match self.reader.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                result => break result?,
            }
        };
        self.position += n as u64;
        Ok(n)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Read the uncompressed size stored in the last four bytes of a gzip file.
fn read_gzip_footer(file: &mut File, path: &Path) -> Result<u32, FollowError> {
    let len = file.metadata()?.len();
    if len < 4 {
        return Err(FollowError::GzipFooter {
            path: path.to_path_buf(),
            len,
        });
    }

    let mut footer = [0u8; 4];
    file.seek(SeekFrom::End(-4))?;
    file.read_exact(&mut footer)?;
    Ok(u32::from_le_bytes(footer))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::TempDir;

    use super::*;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn plain_file_size_and_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.log");
        std::fs::write(&path, b"one\ntwo\nthree").unwrap();

        let mut source = CaptureSource::open(&path, false).unwrap();
        assert!(!source.is_compressed());
        assert_eq!(source.total_size(), 13);
        assert_eq!(source.position(), 0);

        let mut line = Vec::new();
        assert_eq!(source.read_line(&mut line).unwrap(), 4);
        assert_eq!(line, b"one\n");
        assert!((source.fraction() - 4.0 / 13.0).abs() < 1e-9);

        line.clear();
        source.read_line(&mut line).unwrap();
        line.clear();
        assert_eq!(source.read_line(&mut line).unwrap(), 5);
        assert_eq!(line, b"three");
        assert_eq!(source.read_line(&mut line).unwrap(), 0);
        assert!((source.fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gzip_total_size_comes_from_footer() {
        let body = b"0123456789".repeat(100);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capture.log.gz");
        std::fs::write(&path, gzip(&body)).unwrap();

        let mut source = CaptureSource::open(&path, false).unwrap();
        assert!(source.is_compressed());
        assert_eq!(source.total_size(), 1000);

        let mut chunk = vec![0u8; 4096];
        let mut out = Vec::new();
        loop {
            let n = source.read_chunk(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(out, body);
        assert_eq!(source.position(), 1000);
    }

    #[test]
    fn tail_mode_starts_at_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tail.log");
        std::fs::write(&path, b"old line\n").unwrap();

        let mut source = CaptureSource::open(&path, true).unwrap();
        assert_eq!(source.position(), 9);

        let mut line = Vec::new();
        assert_eq!(source.read_line(&mut line).unwrap(), 0);

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"new line\n").unwrap();
        file.flush().unwrap();

        assert_eq!(source.read_line(&mut line).unwrap(), 9);
        assert_eq!(line, b"new line\n");
    }

    #[test]
    fn tail_mode_on_gzip_skips_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tail.log.gz");
        std::fs::write(&path, gzip(b"abcdef")).unwrap();

        let mut source = CaptureSource::open(&path, true).unwrap();
        assert_eq!(source.position(), 6);
        let mut chunk = [0u8; 16];
        assert_eq!(source.read_chunk(&mut chunk).unwrap(), 0);
    }

    #[test]
    fn short_gzip_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.gz");
        std::fs::write(&path, [0x1F, 0x8B]).unwrap();
        let err = CaptureSource::open(&path, false).err();
        assert!(matches!(err, Some(FollowError::GzipFooter { len: 2, .. })));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist.log");
        let err = CaptureSource::open(&path, false).err();
        assert!(matches!(err, Some(FollowError::Open { .. })));
    }

    #[test]
    fn empty_file_is_complete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.log");
        std::fs::write(&path, b"").unwrap();
        let source = CaptureSource::open(&path, false).unwrap();
        assert!((source.fraction() - 1.0).abs() < f64::EPSILON);
    }
}
