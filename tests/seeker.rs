use lineseeker::*;
use rstest::rstest;
use std::fs::File;
use std::io::{Cursor, Write};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cursor_at(bytes: &[u8], pos: u64) -> Cursor<Vec<u8>> {
    let mut cursor = Cursor::new(bytes.to_vec());
    cursor.set_position(pos);
    cursor
}

fn read_all_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut cursor = Cursor::new(bytes.to_vec());
    let mut seeker = LineSeeker::new(&mut cursor);
    let mut lines = Vec::new();
    while let Some(line) = seeker.read_line(0).unwrap() {
        lines.push(line);
    }
    lines
}

#[rstest]
fn test_mixed_eol_boundaries(#[values(1, 2, 3, 64)] cap: usize) {
    init();
    let bytes = b"x\r\ny\rz\n";
    let starts = [0, 0, 0, 3, 3, 5, 5];
    let ends = [2, 2, 2, 4, 4, 6, 6];

    for p in 0..bytes.len() {
        let mut cursor = cursor_at(bytes, p as u64);
        let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
        assert_eq!(seeker.line_start().unwrap(), starts[p], "line_start at {}", p);

        let mut cursor = cursor_at(bytes, p as u64);
        let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
        assert_eq!(seeker.line_end().unwrap(), ends[p], "line_end at {}", p);
    }

    let mut cursor = cursor_at(bytes, 7);
    let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
    assert_eq!(seeker.line_start().unwrap(), 5);
    seeker.move_to_end().unwrap();
    assert_eq!(seeker.line_end().unwrap(), 7);
}

#[rstest]
fn test_mixed_eol_has_three_lines(#[values(1, 64)] cap: usize) {
    let bytes = b"x\r\ny\rz\n";
    assert_eq!(
        read_all_lines(bytes),
        vec![b"x\r\n".to_vec(), b"y\r".to_vec(), b"z\n".to_vec()]
    );

    let mut cursor = Cursor::new(bytes.to_vec());
    let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
    assert_eq!(seeker.line_next().unwrap(), Some(3));
    assert_eq!(seeker.line_next().unwrap(), Some(5));
    assert_eq!(seeker.line_next().unwrap(), None);
    assert_eq!(seeker.position().unwrap(), 5);
}

#[test]
fn test_trailing_terminator_is_one_line() {
    let bytes = b"a\n";
    assert_eq!(read_all_lines(bytes), vec![b"a\n".to_vec()]);

    let mut cursor = Cursor::new(bytes.to_vec());
    let mut seeker = LineSeeker::new(&mut cursor);
    assert_eq!(seeker.line_next().unwrap(), None);
    assert_eq!(seeker.move_forward(3).unwrap(), 0);

    seeker.move_to_end().unwrap();
    assert_eq!(seeker.line_start().unwrap(), 0);
    seeker.move_to_end().unwrap();
    assert_eq!(seeker.line_prev().unwrap(), 0);
}

#[rstest]
#[case(b"a\n\nb")]
#[case(b"\n\n")]
#[case(b"\r\r\n\r")]
#[case(b"abc")]
#[case(b"\r\n\r\n")]
#[case(b"ab\r\ncd\ref\n")]
#[case(b"\n\r\n")]
fn test_line_start_and_end_enclose_cursor(
    #[case] bytes: &[u8],
    #[values(1, 2, 64)] cap: usize,
) {
    init();
    for p in 0..bytes.len() as u64 {
        let mut cursor = cursor_at(bytes, p);
        let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
        let start = seeker.line_start().unwrap();
        assert!(start <= p, "start {} > {}", start, p);
        assert_eq!(seeker.line_start().unwrap(), start);

        let mut cursor = cursor_at(bytes, p);
        let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
        let end = seeker.line_end().unwrap();
        assert!(p <= end, "end {} < {}", end, p);
    }
}

#[rstest]
fn test_empty_lines_get_their_own_start(#[values(1, 64)] cap: usize) {
    // lines start at 0, 1 and 3
    let bytes = b"\n\r\n\r";
    let expected = [0, 1, 1, 3];
    for p in 0..bytes.len() {
        let mut cursor = cursor_at(bytes, p as u64);
        let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
        assert_eq!(seeker.line_start().unwrap(), expected[p], "line_start at {}", p);
    }
}

#[rstest]
#[case(b"one\r\ntwo\rthree\nfour")]
#[case(b"a\n\n\nb\n")]
#[case(b"\r\r\r")]
fn test_prev_then_next_returns_to_line_start(
    #[case] bytes: &[u8],
    #[values(1, 4, 64)] cap: usize,
) {
    for p in 0..bytes.len() as u64 {
        let mut cursor = cursor_at(bytes, p);
        let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
        let start = seeker.line_start().unwrap();
        if start == 0 {
            continue;
        }

        let mut cursor = cursor_at(bytes, p);
        let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
        let prev = seeker.line_prev().unwrap();
        assert!(prev < start);
        assert_eq!(seeker.line_next().unwrap(), Some(start), "from {}", p);
    }
}

#[test]
fn test_line_prev_on_first_line_does_not_wrap() {
    let mut cursor = cursor_at(b"abc\ndef\n", 2);
    let mut seeker = LineSeeker::new(&mut cursor);
    assert_eq!(seeker.line_prev().unwrap(), 0);
    assert_eq!(seeker.line_prev().unwrap(), 0);
    assert_eq!(seeker.position().unwrap(), 0);
}

#[test]
fn test_line_next_without_trailing_terminator() {
    let mut cursor = cursor_at(b"abc\ndef", 5);
    let mut seeker = LineSeeker::new(&mut cursor);
    assert_eq!(seeker.line_next().unwrap(), None);
    assert_eq!(seeker.position().unwrap(), 5);
}

// lines start at 0, 2, 5, 6 and 9
#[rstest]
#[case(b"a\nbb\r\rc\r\nd", &[6, 5, 2, 0])]
#[case(b"a\nbb\r\rc\r\nd\n", &[9, 6, 5, 2, 0])]
#[case(b"a\nbb\r\rc\r\nd\r\n", &[9, 6, 5, 2, 0])]
fn test_move_back_stops_at_start(
    #[case] bytes: &[u8],
    #[case] back: &[u64],
    #[values(0, 1, 2, 3, 4, 5, 10, 1000)] n: usize,
) {
    let mut cursor = Cursor::new(bytes.to_vec());
    let mut seeker = LineSeeker::new(&mut cursor);
    seeker.move_to_end().unwrap();
    let pos = seeker.move_back(n).unwrap();

    if n == 0 {
        assert_eq!(pos, bytes.len() as u64);
    } else {
        assert_eq!(pos, back[std::cmp::min(n, back.len()) - 1]);
    }
    assert_eq!(seeker.position().unwrap(), pos);
}

#[rstest]
#[case(b"a\nb\n", 2)]
#[case(b"a\r\nb\r\n", 3)]
#[case(b"a\rb\r", 2)]
#[case(b"a\n\n", 2)]
#[case(b"a\n", 0)]
#[case(b"a\nb", 0)]
#[case(b"", 0)]
fn test_line_prev_from_end(
    #[case] bytes: &[u8],
    #[case] expected: u64,
    #[values(1, 64)] cap: usize,
) {
    let mut cursor = Cursor::new(bytes.to_vec());
    let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
    seeker.move_to_end().unwrap();
    assert_eq!(seeker.line_prev().unwrap(), expected);
    assert_eq!(seeker.position().unwrap(), expected);

    seeker.move_to_end().unwrap();
    assert_eq!(seeker.move_back(1).unwrap(), expected);
}

#[test]
fn test_last_line_after_move_back_from_end() {
    let mut cursor = Cursor::new(b"a\nb\n".to_vec());
    let mut seeker = LineSeeker::new(&mut cursor);
    seeker.move_to_end().unwrap();
    assert_eq!(seeker.move_back(1).unwrap(), 2);
    assert_eq!(seeker.read_line(0).unwrap().unwrap(), b"b\n");
    assert_eq!(seeker.read_line(0).unwrap(), None);

    assert_eq!(seeker.move_back(2).unwrap(), 0);
    assert_eq!(seeker.read_line(0).unwrap().unwrap(), b"a\n");
}

#[test]
fn test_read_line_max_len_one_reads_a_byte() {
    let mut cursor = Cursor::new(b"ab\n".to_vec());
    let mut seeker = LineSeeker::new(&mut cursor);

    assert_eq!(seeker.read_line(1).unwrap().unwrap(), b"a");
    assert_eq!(seeker.peek_line(1).unwrap().unwrap(), b"b");
    assert_eq!(seeker.read_line(1).unwrap().unwrap(), b"b");
    assert_eq!(seeker.read_line(1).unwrap().unwrap(), b"\n");
    assert_eq!(seeker.read_line(1).unwrap(), None);
}

#[rstest]
fn test_move_forward_stops_at_last_line(#[values(0, 1, 2, 3, 4, 10, 1000)] n: usize) {
    let bytes = b"a\nbb\r\rc\r\nd";
    let starts = [0, 2, 5, 6, 9];

    let mut cursor = Cursor::new(bytes.to_vec());
    let mut seeker = LineSeeker::new(&mut cursor);
    let pos = seeker.move_forward(n).unwrap();
    assert_eq!(pos, starts[std::cmp::min(n, starts.len() - 1)]);
    assert_eq!(seeker.position().unwrap(), pos);
}

#[rstest]
fn test_unget_line_reads_lines_backwards(#[values(1, 3, 64)] cap: usize) {
    init();
    let bytes = b"ab\r\ncd\ref\n\ngh";
    let mut forward = read_all_lines(bytes);
    forward.reverse();

    let mut cursor = Cursor::new(bytes.to_vec());
    let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
    seeker.move_to_end().unwrap();
    let mut backward = Vec::new();
    while let Some(line) = seeker.unget_line(0).unwrap() {
        backward.push(line);
    }

    assert_eq!(backward, forward);
    assert_eq!(seeker.position().unwrap(), 0);
}

#[rstest]
fn test_unget_line_round_trip(#[values(1, 64)] cap: usize) {
    let bytes = b"ab\r\ncd\ref\n\ngh";
    // last byte of each line, and the line itself
    let lines: [(u64, &[u8]); 5] = [
        (3, b"ab\r\n"),
        (6, b"cd\r"),
        (9, b"ef\n"),
        (10, b"\n"),
        (12, b"gh"),
    ];

    for &(last, line) in lines.iter() {
        let mut cursor = cursor_at(bytes, last);
        let mut seeker = LineSeeker::with_capacity(&mut cursor, cap);
        assert_eq!(seeker.unget_line(0).unwrap().unwrap(), line);

        let start = last + 1 - line.len() as u64;
        if start == 0 {
            assert_eq!(seeker.position().unwrap(), 0);
        } else {
            assert_eq!(seeker.position().unwrap(), start - 1);
            assert_eq!(seeker.line_next().unwrap(), Some(start));
        }
        assert_eq!(seeker.read_line(0).unwrap().unwrap(), line);
    }
}

#[test]
fn test_unget_line_mid_line() {
    let mut cursor = cursor_at(b"abc\ndef\n", 5);
    let mut seeker = LineSeeker::new(&mut cursor);
    assert_eq!(seeker.unget_line(0).unwrap().unwrap(), b"de");
    assert_eq!(seeker.position().unwrap(), 3);
    assert_eq!(seeker.unget_line(0).unwrap().unwrap(), b"abc\n");
    assert_eq!(seeker.unget_line(0).unwrap(), None);
}

#[test]
fn test_unget_line_max_len_keeps_nearest_bytes() {
    let mut cursor = Cursor::new(b"abcdef\n".to_vec());
    let mut seeker = LineSeeker::new(&mut cursor);
    seeker.move_to_end().unwrap();

    assert_eq!(seeker.unget_line(4).unwrap().unwrap(), b"ef\n");
    assert_eq!(seeker.position().unwrap(), 3);
    assert_eq!(seeker.unget_line(4).unwrap().unwrap(), b"bcd");
    assert_eq!(seeker.position().unwrap(), 0);
    assert_eq!(seeker.unget_line(4).unwrap().unwrap(), b"a");
    assert_eq!(seeker.unget_line(4).unwrap(), None);
}

#[test]
fn test_unget_byte_from_end() {
    let mut cursor = Cursor::new(b"ab".to_vec());
    let mut seeker = LineSeeker::new(&mut cursor);
    seeker.move_to_end().unwrap();

    assert_eq!(seeker.unget_byte().unwrap(), None);
    assert_eq!(seeker.unget_byte().unwrap(), Some(b'b'));
    assert_eq!(seeker.unget_byte().unwrap(), Some(b'a'));
    assert_eq!(seeker.unget_byte().unwrap(), None);
    assert_eq!(seeker.position().unwrap(), 0);

    assert_eq!(seeker.read_byte().unwrap(), Some(b'a'));
    assert_eq!(seeker.unget_byte().unwrap(), Some(b'b'));
    assert_eq!(seeker.unget_byte().unwrap(), Some(b'a'));
}

#[test]
fn test_peek_line_does_not_move() {
    let mut cursor = cursor_at(b"abc\r\ndef", 1);
    let mut seeker = LineSeeker::new(&mut cursor);
    assert_eq!(seeker.peek_line(0).unwrap().unwrap(), b"bc\r\n");
    assert_eq!(seeker.peek_line(2).unwrap().unwrap(), b"b");
    assert_eq!(seeker.position().unwrap(), 1);

    seeker.move_to_end().unwrap();
    assert_eq!(seeker.peek_line(0).unwrap(), None);
    assert_eq!(seeker.position().unwrap(), 8);
}

#[test]
fn test_stream_position_primitives() {
    let mut cursor = cursor_at(b"hello\n", 2);
    let mut seeker = LineSeeker::new(&mut cursor);

    assert_eq!(seeker.tell_end().unwrap(), 6);
    assert_eq!(seeker.position().unwrap(), 2);
    assert!(!seeker.is_at_end().unwrap());
    assert!(!seeker.is_on_eol().unwrap());

    assert_eq!(seeker.move_to_end().unwrap(), 6);
    assert!(seeker.is_at_end().unwrap());
    assert_eq!(seeker.read_byte().unwrap(), None);

    assert_eq!(seeker.move_to_start().unwrap(), 0);
    assert!(!seeker.is_at_end().unwrap());
    assert_eq!(seeker.read_byte().unwrap(), Some(b'h'));
    assert_eq!(seeker.position().unwrap(), 1);
}

#[test]
fn test_empty_stream() {
    let mut cursor = Cursor::new(Vec::new());
    let mut seeker = LineSeeker::new(&mut cursor);

    assert!(seeker.is_at_end().unwrap());
    assert_eq!(seeker.tell_end().unwrap(), 0);
    assert_eq!(seeker.line_start().unwrap(), 0);
    assert_eq!(seeker.line_end().unwrap(), 0);
    assert_eq!(seeker.line_prev().unwrap(), 0);
    assert_eq!(seeker.line_next().unwrap(), None);
    assert_eq!(seeker.read_line(0).unwrap(), None);
    assert_eq!(seeker.unget_line(0).unwrap(), None);
    assert_eq!(seeker.unget_byte().unwrap(), None);
}

#[test]
fn test_cursor_past_end() {
    let mut cursor = cursor_at(b"ab\ncd", 100);
    let mut seeker = LineSeeker::new(&mut cursor);

    assert!(seeker.is_at_end().unwrap());
    assert_eq!(seeker.line_end().unwrap(), 5);

    let mut cursor = cursor_at(b"ab\ncd", 100);
    let mut seeker = LineSeeker::new(&mut cursor);
    assert_eq!(seeker.line_start().unwrap(), 3);
}

#[test]
fn test_not_on_eol() {
    let mut cursor = cursor_at(b"ab\n", 1);
    let mut seeker = LineSeeker::new(&mut cursor);
    match seeker.move_after_eol() {
        Ok(_) => assert!(false),
        Err(e) => match *e.kind() {
            ErrorKind::NotOnEol => assert!(true),
            _ => assert!(false),
        },
    }
    assert_eq!(seeker.position().unwrap(), 1);
}

#[test]
fn test_navigate_file() {
    init();
    let mut tmp = tempfile::tempfile().unwrap();
    for i in 0..500 {
        write!(tmp, "line {}\r\n", i).unwrap();
    }
    tmp.flush().unwrap();

    let mut f: File = tmp;
    let mut seeker = LineSeeker::new(&mut f);
    seeker.move_to_end().unwrap();
    seeker.move_back(1).unwrap();
    assert_eq!(seeker.read_line(0).unwrap().unwrap(), b"line 499\r\n");

    seeker.move_to_start().unwrap();
    seeker.move_forward(250).unwrap();
    assert_eq!(seeker.peek_line(0).unwrap().unwrap(), b"line 250\r\n");

    assert_eq!(seeker.unget_line(0).unwrap(), Some(b"l".to_vec()));
    assert_eq!(seeker.unget_line(0).unwrap().unwrap(), b"line 249\r\n");
}
