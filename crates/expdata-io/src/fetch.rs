//! HTTP download and transparent gzip reading.

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::info;

use crate::error::{IoError, IoResult};

/// Download `url` into `dest`, creating parent directories as needed.
///
/// The body is written to a sibling `.part` file first and renamed into
/// place, so an interrupted download never leaves a truncated `dest`.
pub fn download_file(url: &str, dest: &Path) -> IoResult<()> {
    info!(%url, dest = %dest.display(), "downloading");

    let http_err = |message: String| IoError::Http {
        url: url.to_string(),
        message,
    };

    let response = ureq::get(url)
        .call()
        .map_err(|e| http_err(format!("request failed: {}", e)))?;
    if response.status() != 200 {
        return Err(http_err(format!("HTTP status {}", response.status())));
    }

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| http_err(format!("reading body failed: {}", e)))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let partial = dest.with_extension("part");
    fs::write(&partial, &bytes)?;
    fs::rename(&partial, dest)?;

    info!(dest = %dest.display(), bytes = bytes.len(), "download complete");
    Ok(())
}

/// Open `path` for reading, decompressing on the fly when it ends in `.gz`.
pub fn open_maybe_gz(path: &Path) -> IoResult<Box<dyn Read + Send>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => IoError::NotFound(path.to_path_buf()),
        _ => IoError::Io(e),
    })?;
    let reader = BufReader::new(file);
    if path.extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("expdata-fetch-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_open_plain_and_gz() {
        let dir = scratch_dir();
        let plain = dir.join("labels.bin");
        fs::write(&plain, [1u8, 2, 3]).unwrap();

        let gz = dir.join("labels.bin.gz");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&[1u8, 2, 3]).unwrap();
        fs::write(&gz, enc.finish().unwrap()).unwrap();

        for p in [&plain, &gz] {
            let mut out = Vec::new();
            open_maybe_gz(p).unwrap().read_to_end(&mut out).unwrap();
            assert_eq!(out, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_open_missing() {
        let missing = scratch_dir().join("nope.gz");
        assert!(matches!(open_maybe_gz(&missing), Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_download_unreachable() {
        let dest = scratch_dir().join("never.gz");
        let err = download_file("http://127.0.0.1:9/never.gz", &dest).unwrap_err();
        assert!(matches!(err, IoError::Http { .. }));
        assert!(!dest.exists());
    }
}
