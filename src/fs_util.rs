use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::OceanError;

/// Decompresses a gzip file into `target`, then removes the compressed file.
pub fn gunzip_replace(gz_path: &Path, target: &Path) -> Result<u64, OceanError> {
    let file = fs::File::open(gz_path)
        .map_err(|err| OceanError::Filesystem(format!("open {}: {err}", gz_path.display())))?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut outfile =
        fs::File::create(target).map_err(|err| OceanError::Filesystem(err.to_string()))?;
    let written = match io::copy(&mut decoder, &mut outfile) {
        Ok(written) => written,
        Err(err) => {
            drop(outfile);
            let _ = fs::remove_file(target);
            return Err(OceanError::Decompression(format!(
                "{}: {err}",
                gz_path.display()
            )));
        }
    };
    fs::remove_file(gz_path).map_err(|err| OceanError::Filesystem(err.to_string()))?;
    Ok(written)
}

/// First line of a text file, for previews.
pub fn first_line(path: &Path) -> Result<Option<String>, OceanError> {
    let file = fs::File::open(path).map_err(|err| OceanError::Filesystem(err.to_string()))?;
    let mut line = Vec::new();
    let read = BufReader::new(file)
        .read_until(b'\n', &mut line)
        .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&line).trim_end().to_string()))
}
