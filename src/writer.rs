use std::io::Write;
use std::num::NonZeroUsize;

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::DEFAULT_MAX_ROWS_PER_FILE;
use crate::error::OceanError;
use crate::events::{EventSink, EventStatus};
use crate::record::CanonicalRecordSet;

/// Sizes of `parts` contiguous partitions of `n` rows.
pub fn partition_sizes(n: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return Vec::new();
    }
    let base = n / parts;
    let extra = n % parts;
    (0..parts)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

pub fn part_count(n: usize, max_rows: NonZeroUsize) -> usize {
    n.div_ceil(max_rows.get())
}

/// Writes a record set as `<prefix>_<stem>_processed.csv` when it fits the
/// bound, otherwise as `ceil(n / bound)` contiguous parts named
/// `<prefix>_<stem>_processed_partNNN.csv`. The first `n % parts` parts carry
/// one extra row, so part sizes differ by at most one.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedWriter {
    max_rows: NonZeroUsize,
}

impl Default for ChunkedWriter {
    fn default() -> Self {
        Self {
            max_rows: NonZeroUsize::new(DEFAULT_MAX_ROWS_PER_FILE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl ChunkedWriter {
    pub fn new(max_rows: NonZeroUsize) -> Self {
        Self { max_rows }
    }

    pub fn max_rows(&self) -> NonZeroUsize {
        self.max_rows
    }

    /// Writes `set` into `output_dir` and returns the created paths in order.
    ///
    /// An empty set writes nothing and returns [`OceanError::EmptyResult`].
    pub fn write(
        &self,
        set: &CanonicalRecordSet,
        output_dir: &Utf8Path,
        sink: &dyn EventSink,
    ) -> Result<Vec<Utf8PathBuf>, OceanError> {
        let n = set.len();
        if n == 0 {
            sink.log(
                "PROCESSOR",
                "SAVE",
                EventStatus::Warning,
                "Empty record set, nothing to save",
            );
            return Err(OceanError::EmptyResult(format!(
                "{}_{}",
                set.source, set.stem
            )));
        }
        std::fs::create_dir_all(output_dir.as_std_path())
            .map_err(|err| OceanError::Filesystem(err.to_string()))?;

        if n <= self.max_rows.get() {
            let path = output_dir.join(format!("{}_{}_processed.csv", set.source, set.stem));
            write_rows(set, 0..n, &path)?;
            sink.log(
                "PROCESSOR",
                "SAVE",
                EventStatus::Info,
                &format!("Saved {n} rows to {}", path.file_name().unwrap_or_default()),
            );
            return Ok(vec![path]);
        }

        let parts = part_count(n, self.max_rows);
        sink.log(
            "PROCESSOR",
            "SAVE",
            EventStatus::Info,
            &format!("Splitting {n} rows into {parts} files"),
        );

        let mut outputs = Vec::with_capacity(parts);
        let mut start = 0;
        for (index, size) in partition_sizes(n, parts).into_iter().enumerate() {
            let path = output_dir.join(format!(
                "{}_{}_processed_part{:03}.csv",
                set.source,
                set.stem,
                index + 1
            ));
            write_rows(set, start..start + size, &path)?;
            sink.log(
                "PROCESSOR",
                "SAVE",
                EventStatus::Info,
                &format!("Saved part {}: {size} rows", index + 1),
            );
            start += size;
            outputs.push(path);
        }
        Ok(outputs)
    }
}

fn write_rows(
    set: &CanonicalRecordSet,
    rows: std::ops::Range<usize>,
    path: &Utf8Path,
) -> Result<(), OceanError> {
    let parent = path
        .parent()
        .ok_or_else(|| OceanError::Filesystem("invalid destination path".to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("ocean-sync-part")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file_mut());
        writer
            .write_record(set.headers())
            .map_err(|err| OceanError::Filesystem(err.to_string()))?;
        for index in rows {
            writer
                .write_record(set.row(index))
                .map_err(|err| OceanError::Filesystem(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    }
    temp.as_file_mut()
        .flush()
        .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_even_split() {
        assert_eq!(partition_sizes(10, 3), vec![4, 3, 3]);
        assert_eq!(partition_sizes(9001, 2), vec![4501, 4500]);
        assert_eq!(partition_sizes(18000, 2), vec![9000, 9000]);
        assert!(partition_sizes(5, 0).is_empty());
    }

    #[test]
    fn part_count_is_ceiling() {
        let bound = NonZeroUsize::new(9000).unwrap();
        assert_eq!(part_count(9000, bound), 1);
        assert_eq!(part_count(9001, bound), 2);
        assert_eq!(part_count(27001, bound), 4);
    }
}
