use fastx_faidx::{FaiIndex, FastxError, FormatError, IndexError, validate_fasta};

fn index_err(text: &str) -> IndexError {
    FaiIndex::parse(text.as_bytes()).unwrap_err()
}

fn faidx_index_err(data: &[u8]) -> IndexError {
    match FaiIndex::faidx(data) {
        Err(FastxError::Index(e)) => e,
        other => panic!("expected an index error, got {other:?}"),
    }
}

#[test]
fn faidx_single_record() {
    let idx = FaiIndex::faidx(&b">abc\nTAGA\nTA"[..]).unwrap();
    assert_eq!(idx.len(), 1);

    let e = idx.get("abc").unwrap();
    assert_eq!(
        (e.length, e.offset, e.line_bases, e.line_width),
        (6, 5, 4, 5)
    );
    assert_eq!(e.terminator_len(), 1);
    assert_eq!(e.line_count(), 2);
    assert_eq!(idx.to_string(), "abc\t6\t5\t4\t5\n");
}

#[test]
fn faidx_crlf_and_empty_records() {
    let data = b">a desc\r\nACGT\r\nAC\r\n>b\r\n>c\r\nG\r\n";
    let idx = FaiIndex::faidx(&data[..]).unwrap();
    assert_eq!(
        idx.to_string(),
        "a\t6\t9\t4\t6\nb\t0\t23\t0\t2\nc\t1\t27\t1\t3\n"
    );

    // every header offset is recomputed from the previous entry
    for (ordinal, header) in [(0, 0), (1, 19), (2, 23)] {
        assert_eq!(idx.header_offset(ordinal), Some(header));
        assert_eq!(data[header as usize], b'>');
    }
    assert_eq!(idx.header_offset(3), None);
}

#[test]
fn faidx_allows_trailing_blank_lines() {
    let idx = FaiIndex::faidx(&b">a\nACG\nA\n\n\n>b\nT\n"[..]).unwrap();
    assert_eq!(idx.to_string(), "a\t4\t3\t3\t4\nb\t1\t14\t1\t2\n");
}

#[test]
fn faidx_is_stricter_than_the_reader() {
    let longer = b">a\nAC\nACG\nA\n";
    assert_eq!(
        faidx_index_err(longer),
        IndexError::NonUniformLineLength {
            name: "a".into(),
            line: 3
        }
    );
    assert!(validate_fasta(&longer[..]).is_ok());

    let after_short = b">a\nACG\nA\nACG\n";
    assert_eq!(
        faidx_index_err(after_short),
        IndexError::NonUniformLineLength {
            name: "a".into(),
            line: 4
        }
    );
    assert!(validate_fasta(&after_short[..]).is_ok());

    let after_blank = b">a\nACG\n\nACG\n";
    assert!(matches!(
        faidx_index_err(after_blank),
        IndexError::NonUniformLineLength { line: 4, .. }
    ));

    let mixed = b">a\nAC\r\nAC\n";
    assert_eq!(
        faidx_index_err(mixed),
        IndexError::MixedLineEndings {
            name: "a".into(),
            line: 2
        }
    );
    assert!(validate_fasta(&mixed[..]).is_ok());

    assert!(matches!(
        faidx_index_err(b">a(1)\nAC\n"),
        IndexError::InvalidName { line: 1, .. }
    ));
    assert!(matches!(
        faidx_index_err(b">a\nAC\n>a\nGT\n"),
        IndexError::DuplicateName { .. }
    ));
}

#[test]
fn faidx_format_errors() {
    match FaiIndex::faidx(&b"ACGT\n"[..]) {
        Err(FastxError::Format {
            source: FormatError::MissingHeader { .. },
            ctx,
        }) => assert_eq!(ctx.line_num, Some(1)),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        FaiIndex::faidx(&b">a\nAC>G\n"[..]),
        Err(FastxError::Format {
            source: FormatError::MisplacedMarker { .. },
            ..
        })
    ));
    assert!(matches!(
        FaiIndex::faidx(&b">a\nAC\n>b"[..]),
        Err(FastxError::Format {
            source: FormatError::UnexpectedEof,
            ..
        })
    ));
}

#[test]
fn parse_accepts_canonical_text() {
    let text = concat!(
        "chr1\t248956422\t6\t60\t61\n",
        "chr2\t10\t253105766\t10\t12\n",
        "empty\t0\t253105778\t0\t1\n",
    );
    let idx = FaiIndex::parse(text.as_bytes()).unwrap();
    assert_eq!(idx.len(), 3);
    assert_eq!(idx.ordinal("chr2"), Some(1));
    assert_eq!(idx.get("chr2").unwrap().terminator_len(), 2);

    let mut out = Vec::new();
    idx.write_to(&mut out).unwrap();
    assert_eq!(out, text.as_bytes());
}

#[test]
fn parse_sorts_by_offset() {
    let idx = FaiIndex::parse(b"b\t4\t20\t4\t5\na\t4\t3\t4\t5\n").unwrap();
    assert_eq!(idx.ordinal("a"), Some(0));
    assert_eq!(idx.ordinal("b"), Some(1));
    assert_eq!(idx.to_string(), "a\t4\t3\t4\t5\nb\t4\t20\t4\t5\n");

    let names: Vec<_> = idx.iter().map(|e| e.name).collect();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn parse_blank_lines() {
    assert!(FaiIndex::parse(b"").unwrap().is_empty());
    assert!(FaiIndex::parse(b"\n").unwrap().is_empty());
    assert_eq!(FaiIndex::parse(b"\na\t4\t3\t4\t5\n\n\n").unwrap().len(), 1);
    assert_eq!(
        index_err("a\t4\t3\t4\t5\n\nb\t4\t13\t4\t5\n"),
        IndexError::BlankLine { line: 2 }
    );
}

#[test]
fn parse_rejects_bad_fields() {
    assert_eq!(index_err("a\t1\t0\t1\t2"), IndexError::ZeroOffset { line: 1 });
    assert_eq!(
        index_err("a\t4\t3\t4\t7"),
        IndexError::InvalidLineWidth { line: 1 }
    );
    assert_eq!(
        index_err("a\t4\t3\t4\t4"),
        IndexError::InvalidLineWidth { line: 1 }
    );
    assert_eq!(
        index_err("a\t2\t3\t4\t5"),
        IndexError::LineBasesExceedLength { line: 1 }
    );
    assert_eq!(
        index_err("a\t4\t3\t0\t1"),
        IndexError::ZeroLineBases { line: 1 }
    );
    assert_eq!(
        index_err("a\t99999999999999999999\t3\t4\t5"),
        IndexError::Overflow {
            line: 1,
            field: "length"
        }
    );
    assert_eq!(
        index_err("a\t4\t+3\t4\t5"),
        IndexError::InvalidNumber {
            line: 1,
            field: "offset"
        }
    );
    assert_eq!(
        index_err("a\t4\t3\t4"),
        IndexError::MissingField {
            line: 1,
            field: "linewidth"
        }
    );
    assert_eq!(
        index_err("a\t4\t3\t4\t5\tx"),
        IndexError::TrailingField { line: 1 }
    );
    assert!(matches!(
        index_err("a b\t4\t3\t4\t5"),
        IndexError::InvalidName { line: 1, .. }
    ));
    assert_eq!(
        index_err("a\t4\t3\t4\t5\nb\t4\t13\t4\t5\na\t4\t23\t4\t5\n"),
        IndexError::DuplicateName { name: "a".into() }
    );
}

#[test]
fn parse_rejects_records_past_u64_offsets() {
    assert_eq!(
        index_err("a\t18446744073709551615\t1\t1\t2\nb\t1\t5\t1\t2\n"),
        IndexError::OffsetOverflow { line: 1 }
    );
    assert_eq!(
        index_err("a\t4\t3\t4\t5\nb\t10\t18446744073709551610\t10\t11\n"),
        IndexError::OffsetOverflow { line: 2 }
    );

    // the last addressable byte is still fine
    let idx = FaiIndex::parse(b"a\t4\t3\t4\t5\nb\t10\t18446744073709551604\t10\t11\n").unwrap();
    assert_eq!(idx.header_offset(1), Some(8));
    let b = idx.get("b").unwrap();
    assert_eq!(b.offset + b.footprint(), u64::MAX);
    assert_eq!(b.byte_offset(9), u64::MAX - 2);
}

#[test]
fn names_may_not_start_with_star_or_equals() {
    for name in ["*", "*a", "=", "=a"] {
        assert!(matches!(
            index_err(&format!("{name}\t4\t3\t4\t5")),
            IndexError::InvalidName { line: 1, .. }
        ));
    }
    assert!(matches!(
        faidx_index_err(b">*chr1\nAC\n"),
        IndexError::InvalidName { line: 1, .. }
    ));

    let idx = FaiIndex::parse(b"a*\t4\t3\t4\t5\nb=\t4\t13\t4\t5\n").unwrap();
    assert_eq!(idx.len(), 2);
}

struct Limited {
    written: Vec<u8>,
    limit: usize,
}

impl std::io::Write for Limited {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.limit - self.written.len());
        if n == 0 {
            return Err(std::io::ErrorKind::WriteZero.into());
        }
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_errors_name_the_failing_line() {
    let idx = FaiIndex::parse(b"a\t4\t3\t4\t5\nb\t4\t13\t4\t5\n").unwrap();
    let mut out = Limited {
        written: Vec::new(),
        limit: 12,
    };
    match idx.write_to(&mut out) {
        Err(FastxError::Io { ctx, .. }) => {
            assert_eq!(ctx.line_num, Some(2));
            assert_eq!(ctx.byte_pos, 10);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(&out.written[..10], b"a\t4\t3\t4\t5\n");
}

#[test]
fn resolve_names_and_ordinals() {
    let idx = FaiIndex::parse(b"a\t4\t3\t4\t5\nb\t4\t13\t4\t5\n").unwrap();
    assert_eq!(idx.resolve("b").unwrap(), 1);
    assert_eq!(idx.resolve(0usize).unwrap(), 0);
    assert!(matches!(
        idx.resolve(2usize),
        Err(FastxError::OrdinalOutOfBounds { ordinal: 2, len: 2 })
    ));
    assert!(matches!(
        idx.resolve("zz"),
        Err(FastxError::UnknownSequence(name)) if name == "zz"
    ));
}

#[test]
fn path_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let fasta = dir.path().join("ref.fa");
    std::fs::write(&fasta, b">x\nACGTA\nCG\n>y z\nTT\n").unwrap();

    let built = FaiIndex::faidx_path(&fasta).unwrap();
    let fai = dir.path().join("ref.fa.fai");
    built.write_path(&fai).unwrap();

    assert_eq!(
        std::fs::read_to_string(&fai).unwrap(),
        "x\t7\t3\t5\t6\ny\t2\t17\t2\t3\n"
    );
    assert_eq!(FaiIndex::from_path(&fai).unwrap(), built);
}
