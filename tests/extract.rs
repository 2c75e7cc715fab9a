use fastx_faidx::{
    FaiIndex, FastaReader, FastaRecord, FastaWriter, FastxError, IndexError, ReaderOptions,
    WriterOptions,
};
use std::io::Cursor;

const WIDTH: usize = 7;
const LENGTHS: [usize; 6] = [20, 7, 1, 0, 15, 14];

fn synthetic() -> Vec<FastaRecord> {
    LENGTHS
        .iter()
        .enumerate()
        .map(|(i, &len)| {
            let seq: Vec<u8> = (0..len).map(|k| b"ACGT"[(k * 3 + i) % 4]).collect();
            FastaRecord::from_parts(format!("s{i} extra"), seq).unwrap()
        })
        .collect()
}

fn write_wrapped(records: &[FastaRecord]) -> Vec<u8> {
    let mut w = FastaWriter::with_options(
        Vec::new(),
        WriterOptions {
            line_width: WIDTH,
            ..WriterOptions::default()
        },
    );
    for rec in records {
        w.write_record(rec).unwrap();
    }
    w.into_inner().unwrap()
}

fn to_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    for &b in data {
        if b == b'\n' {
            out.push(b'\r');
        }
        out.push(b);
    }
    out
}

fn indexed(data: Vec<u8>, capacity: usize) -> FastaReader<Cursor<Vec<u8>>> {
    let index = FaiIndex::faidx(&data[..]).unwrap();
    FastaReader::with_options(
        Cursor::new(data),
        ReaderOptions {
            buffer_capacity: capacity,
        },
    )
    .with_index(index)
}

fn check_all_ranges(mut rdr: FastaReader<Cursor<Vec<u8>>>, records: &[FastaRecord]) {
    let mut rec = FastaRecord::new();
    for (i, expected) in records.iter().enumerate() {
        let name = format!("s{i}");
        let len = expected.len() as u64;
        if len == 0 {
            continue;
        }
        let mut ranges = vec![1..=len, 1..=1, len..=len, len.min(7)..=len.min(8)];
        if len >= 3 {
            ranges.push(3..=len.min(16));
        }
        for range in ranges {
            let (s, e) = (*range.start() as usize, *range.end() as usize);
            let got = rdr.extract(&name, range.clone()).unwrap();
            assert_eq!(got, &expected.sequence()[s - 1..e], "{name}:{range:?}");

            // the reader now sits on this record's header
            assert!(rdr.read_record(&mut rec).unwrap());
            assert_eq!(&rec, expected);
            assert_eq!(rdr.line(), None);
        }
    }
}

#[test]
fn extract_short_record() {
    let data = b">abc\nTAGA\nTA".to_vec();
    let mut rdr = indexed(data, 1024);
    assert_eq!(rdr.extract("abc", 2..=3).unwrap(), b"AG");
    assert_eq!(rdr.extract("abc", 4..=5).unwrap(), b"AT");
    assert_eq!(rdr.extract("abc", 1..=6).unwrap(), b"TAGATA");
}

#[test]
fn extract_across_wrapped_lines() {
    let records = synthetic();
    let data = write_wrapped(&records);
    check_all_ranges(indexed(data.clone(), 1024), &records);
    check_all_ranges(indexed(data, 3), &records);
}

#[test]
fn extract_across_crlf_lines() {
    let records = synthetic();
    let data = to_crlf(&write_wrapped(&records));
    let rdr = indexed(data, 1024);
    assert_eq!(rdr.index().unwrap().get("s0").unwrap().terminator_len(), 2);
    check_all_ranges(rdr, &records);
}

#[test]
fn seek_then_iterate() {
    let records = synthetic();
    let mut rdr = indexed(write_wrapped(&records), 5);
    assert_eq!(rdr.line(), Some(1));

    rdr.seek_record(4usize).unwrap();
    assert_eq!(rdr.line(), None);
    let rest: Vec<_> = rdr.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(rest, records[4..]);

    rdr.seek_record("s1").unwrap();
    let mut rec = FastaRecord::new();
    assert!(rdr.read_record(&mut rec).unwrap());
    assert_eq!(rec, records[1]);

    // empty records have a well-defined header position too
    rdr.seek_record("s3").unwrap();
    assert!(rdr.read_record(&mut rec).unwrap());
    assert_eq!(rec.identifier(), b"s3");
    assert!(rec.is_empty());

    assert!(matches!(
        rdr.seek_record(6usize),
        Err(FastxError::OrdinalOutOfBounds { ordinal: 6, len: 6 })
    ));
}

#[test]
fn extract_into_reuses_buffer() {
    let mut rdr = indexed(b">abc\nTAGA\nTA\n".to_vec(), 1024);
    let mut buf = b"stale".to_vec();
    rdr.extract_into("abc", 3..=6, &mut buf).unwrap();
    assert_eq!(buf, b"GATA");

    // reversed ranges select nothing
    rdr.extract_into("abc", 3..=2, &mut buf).unwrap();
    assert!(buf.is_empty());
}

#[test]
fn extract_rejects_bad_requests() {
    let mut rdr = indexed(b">abc\nTAGA\nTA\n".to_vec(), 1024);

    assert!(matches!(
        rdr.extract("abc", 0..=2),
        Err(FastxError::RangeOutOfBounds { start: 0, .. })
    ));
    assert!(matches!(
        rdr.extract("abc", 5..=7),
        Err(FastxError::RangeOutOfBounds {
            start: 5,
            end: 7,
            len: 6
        })
    ));
    assert!(matches!(
        rdr.extract("zz", 1..=1),
        Err(FastxError::UnknownSequence(_))
    ));

    let mut plain = FastaReader::new(Cursor::new(b">abc\nTAGA\n".to_vec()));
    assert!(matches!(
        plain.extract("abc", 1..=2),
        Err(FastxError::MissingIndex)
    ));
    assert!(matches!(plain.seek_record(0usize), Err(FastxError::MissingIndex)));
}

#[test]
fn stale_index_is_detected() {
    let index = FaiIndex::faidx(&b">abc\nTAGA\nTA\n"[..]).unwrap();
    let mut rdr = FastaReader::new(Cursor::new(b">abc\nTA\nGATA\n".to_vec())).with_index(index);

    match rdr.extract("abc", 1..=6) {
        Err(FastxError::Index(IndexError::LayoutMismatch { name })) => assert_eq!(name, "abc"),
        other => panic!("unexpected {other:?}"),
    }

    // still repositioned on the record
    let mut rec = FastaRecord::new();
    assert!(rdr.read_record(&mut rec).unwrap());
    assert_eq!(rec.sequence(), b"TAGATA");
}

#[test]
fn index_beyond_end_of_file() {
    let index = FaiIndex::parse(b"abc\t100\t5\t4\t5\n").unwrap();
    let mut rdr = FastaReader::new(Cursor::new(b">abc\nTAGA\n".to_vec())).with_index(index);

    let err = rdr.extract("abc", 90..=100).unwrap_err();
    assert!(matches!(err, FastxError::Io { .. }));
    assert_eq!(rdr.position(), 0);
}

#[test]
fn open_indexed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ref.fa");
    std::fs::write(&path, write_wrapped(&synthetic())).unwrap();
    FaiIndex::faidx_path(&path)
        .unwrap()
        .write_path(dir.path().join("ref.fa.fai"))
        .unwrap();

    let mut rdr = FastaReader::open_indexed(&path).unwrap();
    assert_eq!(rdr.index().unwrap().len(), LENGTHS.len());
    let expected = synthetic()[4].sequence()[5..12].to_vec();
    assert_eq!(rdr.extract("s4", 6..=12).unwrap(), expected);
}

#[test]
fn seek_recovers_after_a_failed_read() {
    let index = FaiIndex::faidx(&b">a\nAC\n>b\nAGC\n"[..]).unwrap();
    let mut rdr = FastaReader::new(Cursor::new(b">a\nAC\n>b\nA>C\n".to_vec())).with_index(index);
    let mut rec = FastaRecord::new();

    assert!(rdr.read_record(&mut rec).unwrap());
    assert!(rdr.read_record(&mut rec).is_err());
    assert!(!rdr.read_record(&mut rec).unwrap());

    rdr.seek_record("a").unwrap();
    assert!(rdr.read_record(&mut rec).unwrap());
    assert_eq!(rec.sequence(), b"AC");
}
