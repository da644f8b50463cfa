use std::io::{self, Write};

use ingest_core::{IdStrategy, Record, RecordFields};
use ingest_engine::{EmitError, RecordEmitter};
use pretty_assertions::assert_eq;

fn record(content: &str) -> Record {
    RecordFields {
        source: "guide.pdf".to_string(),
        content: content.to_string(),
        ..RecordFields::default()
    }
    .into_record(IdStrategy::Random)
}

#[test]
fn each_record_is_one_json_line() {
    let emitter = RecordEmitter::new(Vec::new());
    let first = record("line one\nline two");
    let second = record("");
    emitter.emit(&first).unwrap();
    emitter.emit(&second).unwrap();
    assert_eq!(emitter.emitted(), 2);

    let output = String::from_utf8(emitter.into_inner()).unwrap();
    assert!(output.ends_with('\n'));
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);

    let parsed: Vec<Record> = lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed, vec![first, second]);

    let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert!(value["url"].is_null());
    assert!(value["title"].is_null());
    assert_eq!(value["content"], "");
}

#[test]
fn concurrent_emitters_never_interleave_lines() {
    let emitter = RecordEmitter::new(Vec::new());
    std::thread::scope(|scope| {
        for worker in 0..4 {
            let emitter = &emitter;
            scope.spawn(move || {
                for n in 0..25 {
                    emitter.emit(&record(&format!("worker {worker} record {n}"))).unwrap();
                }
            });
        }
    });
    assert_eq!(emitter.emitted(), 100);

    let output = String::from_utf8(emitter.into_inner()).unwrap();
    let parsed: Vec<Record> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed.len(), 100);
}

/// Accepts a fixed number of writes, then fails like a closed pipe.
struct ClosingSink {
    writes_left: usize,
    flushed: usize,
}

impl Write for ClosingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.writes_left == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        self.writes_left -= 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushed += 1;
        Ok(())
    }
}

#[test]
fn records_are_flushed_as_they_are_written() {
    let emitter = RecordEmitter::new(ClosingSink {
        writes_left: 1,
        flushed: 0,
    });
    emitter.emit(&record("kept")).unwrap();

    let err = emitter.emit(&record("lost")).unwrap_err();
    assert!(matches!(err, EmitError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    assert_eq!(emitter.emitted(), 1);
    assert_eq!(emitter.into_inner().flushed, 1);
}
