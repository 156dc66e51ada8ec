//! Line-delimited JSON reader. Each line is a self-contained
//! `{type, metric, data: {time, value, tags}}` object; lines that fail to
//! parse are skipped, never fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};
use loadbench_core::schema::is_metric_of_interest;
use loadbench_core::{Error, RawRow};
use serde::Deserialize;

#[derive(Deserialize)]
struct PointLine {
    #[serde(rename = "type")]
    point_type: String,
    metric: String,
    data: PointData,
}

#[derive(Deserialize)]
struct PointData {
    time: String,
    value: f64,
    #[serde(default)]
    tags: PointTags,
}

#[derive(Deserialize, Default)]
struct PointTags {
    name: Option<String>,
    method: Option<String>,
    url: Option<String>,
    status: Option<String>,
}

/// Yields batches of at most `chunk_size` raw rows from a line-delimited
/// JSON file, with O(chunk_size) peak memory.
pub struct JsonChunkReader {
    lines: std::io::Lines<BufReader<File>>,
    chunk_size: usize,
    done: bool,
}

impl JsonChunkReader {
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self, Error> {
        let file = File::open(&path).map_err(|e| {
            Error::InputNotFound(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            chunk_size,
            done: false,
        })
    }

    fn parse_line(line: &str) -> Option<RawRow> {
        let point: PointLine = serde_json::from_str(line).ok()?;
        if point.point_type != "Point" || !is_metric_of_interest(&point.metric) {
            return None;
        }
        let timestamp: DateTime<Utc> = point.data.time.parse().ok()?;
        Some(RawRow {
            timestamp,
            metric_name: point.metric,
            metric_value: point.data.value,
            name: point.data.tags.name,
            method: point.data.tags.method,
            url: point.data.tags.url,
            status: point.data.tags.status,
        })
    }
}

impl Iterator for JsonChunkReader {
    type Item = Result<Vec<RawRow>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.chunk_size);
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if let Some(row) = Self::parse_line(&line) {
                        batch.push(row);
                    }
                    if batch.len() >= self.chunk_size {
                        return Some(Ok(batch));
                    }
                }
                Some(Err(e)) => return Some(Err(Error::InputNotFound(e.to_string()))),
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

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        f
    }

    fn point_line(metric: &str, value: f64, status: &str) -> String {
        format!(
            r#"{{"type":"Point","metric":"{}","data":{{"time":"2024-01-01T00:00:00Z","value":{},"tags":{{"name":"home","method":"GET","url":"home","status":"{}"}}}}}}"#,
            metric, value, status
        )
    }

    #[test]
    fn two_requests_one_url_produces_two_rows() {
        let lines = [point_line("http_req_duration", 120.0, "200"), point_line("http_req_duration", 80.0, "200")];
        let lines: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
        let file = write_lines(&lines);
        let mut reader = JsonChunkReader::open(file.path(), 50).unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert!(reader.next().is_none());
    }

    #[test]
    fn malformed_line_is_skipped_not_fatal() {
        let good = point_line("http_req_duration", 100.0, "200");
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{}", good).unwrap();
        writeln!(f, "not valid json at all").unwrap();
        writeln!(f, "{}", good).unwrap();

        let mut reader = JsonChunkReader::open(f.path(), 50).unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn non_point_and_uninteresting_metrics_are_filtered() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"{{"type":"Metric","metric":"http_req_duration","data":{{"time":"2024-01-01T00:00:00Z","value":1,"tags":{{}}}}}}"#).unwrap();
        writeln!(f, r#"{{"type":"Point","metric":"vus","data":{{"time":"2024-01-01T00:00:00Z","value":1,"tags":{{}}}}}}"#).unwrap();
        writeln!(f, "{}", point_line("http_req_duration", 50.0, "200")).unwrap();

        let mut reader = JsonChunkReader::open(f.path(), 50).unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn chunk_boundary_splits_batches_at_chunk_size() {
        let lines: Vec<String> = (0..5)
            .map(|i| point_line("http_req_duration", i as f64, "200"))
            .collect();
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for line in &lines {
            writeln!(f, "{}", line).unwrap();
        }
        let mut reader = JsonChunkReader::open(f.path(), 2).unwrap();
        assert_eq!(reader.next().unwrap().unwrap().len(), 2);
        assert_eq!(reader.next().unwrap().unwrap().len(), 2);
        assert_eq!(reader.next().unwrap().unwrap().len(), 1);
        assert!(reader.next().is_none());
    }

    #[test]
    fn empty_file_yields_no_batches() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let mut reader = JsonChunkReader::open(f.path(), 50).unwrap();
        assert!(reader.next().is_none());
    }

    #[test]
    fn missing_file_is_fatal() {
        let result = JsonChunkReader::open("/nonexistent/path/file.json", 50);
        assert!(result.is_err());
    }
}
