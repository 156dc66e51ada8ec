//! Chunked CSV reader. Header row must include `metric_name,
//! metric_value, timestamp, name, method, url, status`.

use std::path::Path;

use loadbench_core::schema::is_metric_of_interest;
use loadbench_core::{Error, RawRow};
use serde::Deserialize;

#[derive(Deserialize)]
struct CsvRow {
    metric_name: String,
    metric_value: f64,
    timestamp: String,
    name: Option<String>,
    method: Option<String>,
    url: Option<String>,
    status: Option<String>,
}

pub struct CsvChunkReader {
    records: csv::DeserializeRecordsIntoIter<std::fs::File, CsvRow>,
    chunk_size: usize,
    done: bool,
}

impl CsvChunkReader {
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self, Error> {
        let reader = csv::Reader::from_path(&path).map_err(|e| {
            Error::InputNotFound(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Ok(Self {
            records: reader.into_deserialize(),
            chunk_size,
            done: false,
        })
    }
}

impl Iterator for CsvChunkReader {
    type Item = Result<Vec<RawRow>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.chunk_size);
        loop {
            match self.records.next() {
                Some(Ok(row)) => {
                    if !is_metric_of_interest(&row.metric_name) {
                        continue;
                    }
                    let timestamp = match row.timestamp.parse() {
                        Ok(ts) => ts,
                        Err(_) => continue,
                    };
                    batch.push(RawRow {
                        timestamp,
                        metric_name: row.metric_name,
                        metric_value: row.metric_value,
                        name: row.name,
                        method: row.method,
                        url: row.url,
                        status: row.status,
                    });
                    if batch.len() >= self.chunk_size {
                        return Some(Ok(batch));
                    }
                }
                Some(Err(_)) => continue,
                None => {
                    self.done = true;
                    if batch.is_empty() {
                        return None;
                    }
                    return Some(Ok(batch));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "metric_name,metric_value,timestamp,name,method,url,status").unwrap();
        for row in rows {
            writeln!(f, "{}", row).unwrap();
        }
        f
    }

    #[test]
    fn filters_uninteresting_metrics() {
        let f = write_csv(&[
            "http_req_duration,120,2024-01-01T00:00:00Z,home,GET,home,200",
            "vus,1,2024-01-01T00:00:00Z,home,GET,home,200",
            "http_req_duration,80,2024-01-01T00:00:01Z,home,GET,home,200",
        ]);
        let mut reader = CsvChunkReader::open(f.path(), 50).unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn chunking_respects_chunk_size() {
        let rows: Vec<String> = (0..5)
            .map(|i| format!("http_req_duration,{},2024-01-01T00:00:00Z,home,GET,home,200", i))
            .collect();
        let row_refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        let f = write_csv(&row_refs);
        let mut reader = CsvChunkReader::open(f.path(), 2).unwrap();
        assert_eq!(reader.next().unwrap().unwrap().len(), 2);
        assert_eq!(reader.next().unwrap().unwrap().len(), 2);
        assert_eq!(reader.next().unwrap().unwrap().len(), 1);
        assert!(reader.next().is_none());
    }

    #[test]
    fn empty_csv_yields_no_batches() {
        let f = write_csv(&[]);
        let mut reader = CsvChunkReader::open(f.path(), 50).unwrap();
        assert!(reader.next().is_none());
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(CsvChunkReader::open("/nonexistent/file.csv", 50).is_err());
    }

    #[test]
    fn malformed_row_is_skipped_not_fatal() {
        let f = write_csv(&[
            "http_req_duration,120,2024-01-01T00:00:00Z,home,GET,home,200",
            "http_req_duration,not_a_number,2024-01-01T00:00:00Z,home,GET,home,200",
            "http_req_duration,80,2024-01-01T00:00:01Z,home,GET,home,200",
        ]);
        let mut reader = CsvChunkReader::open(f.path(), 50).unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert!(reader.next().is_none());
    }
}
