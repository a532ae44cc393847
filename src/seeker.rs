use crate::error::{Error, ErrorKind, Result};
use memchr::{memchr2, memrchr2};
use std::cmp;
use std::io::{self, Read, Seek, SeekFrom};

const DEFAULT_CHUNK_SIZE: usize = 64;

pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';

/// Seeker that moves the cursor of a byte stream by whole lines, in either direction.
///
/// # Examples
///
/// ```
/// use lineseeker::LineSeeker;
/// use std::io::Cursor;
///
/// let mut cursor = Cursor::new(b"first\r\nsecond\rthird\n".to_vec());
/// let mut seeker = LineSeeker::new(&mut cursor);
///
/// assert_eq!(seeker.line_next().unwrap(), Some(7));
/// assert_eq!(seeker.line_next().unwrap(), Some(14));
/// assert_eq!(seeker.line_next().unwrap(), None);
///
/// assert_eq!(seeker.line_prev().unwrap(), 7);
/// assert_eq!(seeker.read_line(0).unwrap().unwrap(), b"second\r");
/// ```
///
/// `LineSeeker` never buffers the stream. Line boundaries are located by reading fixed-size
/// windows around the cursor into an internal buffer, whose size defaults to `64` bytes and can
/// be chosen with [`LineSeeker::with_capacity`]. The cursor itself is the position of the
/// underlying stream, so a `LineSeeker` starts wherever the stream was left.
///
/// The three end-of-line conventions `\r\n`, `\n` and `\r` are recognised, mixed freely within
/// the same stream. An end-of-line sequence belongs to the line it terminates.
#[derive(Debug)]
pub struct LineSeeker<'a, RS: 'a + Read + Seek> {
    inner: &'a mut RS,
    buf: Vec<u8>,
    state: State,
}

#[derive(Clone, Copy, Debug, Default)]
struct State {
    // A backward read has consumed the byte at offset 0.
    rewound: bool,
}

impl<'a, RS: 'a + Read + Seek> LineSeeker<'a, RS> {
    /// Creates a new `LineSeeker` that wraps a byte stream that implements `Read` and `Seek`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::LineSeeker;
    /// use std::io::Cursor;
    ///
    /// let mut cursor = Cursor::new(b"a\nb\n".to_vec());
    /// let seeker = LineSeeker::new(&mut cursor);
    /// assert_eq!(seeker.capacity(), 64);
    /// ```
    pub fn new(stream: &'a mut RS) -> Self {
        LineSeeker::with_capacity(stream, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a new `LineSeeker` that scans the stream in windows of `cap` bytes.
    ///
    /// A capacity of zero is bumped to one.
    pub fn with_capacity(stream: &'a mut RS, cap: usize) -> Self {
        Self {
            inner: stream,
            buf: vec![0; cmp::max(cap, 1)],
            state: State::default(),
        }
    }

    /// Returns the size of the window used when scanning for line boundaries.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the current offset of the cursor.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Returns the offset one past the last byte of the stream, leaving the cursor where it was.
    pub fn tell_end(&mut self) -> Result<u64> {
        let pos = self.position()?;
        let end = self.inner.seek(SeekFrom::End(0));
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(end?)
    }

    /// Moves the cursor to the start of the stream.
    pub fn move_to_start(&mut self) -> Result<u64> {
        self.seek_to(0)
    }

    /// Moves the cursor to the end of the stream, one past the last byte.
    pub fn move_to_end(&mut self) -> Result<u64> {
        self.state.rewound = false;
        Ok(self.inner.seek(SeekFrom::End(0))?)
    }

    /// Returns `true` if there is no byte under the cursor.
    ///
    /// This is derived from a fresh read each time, so it holds right after any seek.
    pub fn is_at_end(&mut self) -> Result<bool> {
        Ok(self.peek_byte()?.is_none())
    }

    /// Returns the byte under the cursor without consuming it, or `None` at the end of the
    /// stream.
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        let pos = self.position()?;
        let byte = self.next_byte();
        self.inner.seek(SeekFrom::Start(pos))?;
        byte
    }

    /// Reads the byte under the cursor and advances past it, or returns `None` at the end of the
    /// stream.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        self.state.rewound = false;
        self.next_byte()
    }

    /// Reads a line forwards, including its end-of-line sequence, and leaves the cursor right
    /// after it.
    ///
    /// Reading stops after `max_len - 1` bytes if the line is longer than that, and a `max_len`
    /// of zero means no limit. A `\r\n` pair is never split by the limit check unless the limit
    /// falls exactly between the two bytes.
    ///
    /// Unlike a C-style `fgets`, `max_len == 1` does not read zero bytes: it reads one, the same
    /// as `max_len == 2`, so that a loop over `read_line` always makes progress.
    ///
    /// Returns `None` if the cursor is at the end of the stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::LineSeeker;
    /// use std::io::Cursor;
    ///
    /// let mut cursor = Cursor::new(b"one\r\ntwo".to_vec());
    /// let mut seeker = LineSeeker::new(&mut cursor);
    ///
    /// assert_eq!(seeker.read_line(0).unwrap().unwrap(), b"one\r\n");
    /// assert_eq!(seeker.read_line(3).unwrap().unwrap(), b"tw");
    /// assert_eq!(seeker.read_line(0).unwrap().unwrap(), b"o");
    /// assert_eq!(seeker.read_line(0).unwrap(), None);
    /// ```
    pub fn read_line(&mut self, max_len: usize) -> Result<Option<Vec<u8>>> {
        self.state.rewound = false;

        let start = self.position()?;
        let end = self.tell_end()?;
        if start >= end {
            return Ok(None);
        }

        let limit = line_limit(max_len);
        let mut line = Vec::new();
        let mut lo = start;
        loop {
            let room = limit.map_or(self.buf.len(), |l| cmp::min(self.buf.len(), l - line.len()));
            let n = cmp::min(room as u64, end - lo) as usize;
            if n == 0 {
                break;
            }

            self.inner.seek(SeekFrom::Start(lo))?;
            self.inner.read_exact(&mut self.buf[..n])?;
            if let Some(i) = memchr2(CR, LF, &self.buf[..n]) {
                line.extend_from_slice(&self.buf[..=i]);
                lo += i as u64 + 1;
                break;
            }
            line.extend_from_slice(&self.buf[..n]);
            lo += n as u64;
        }

        // The `\n` of a `\r\n` pair may sit beyond the window that held the `\r`.
        let has_room = limit.map_or(true, |l| line.len() < l);
        if line.last() == Some(&CR) && has_room && self.byte_at(lo)? == Some(LF) {
            line.push(LF);
            lo += 1;
        }

        self.inner.seek(SeekFrom::Start(lo))?;
        Ok(Some(line))
    }

    /// Same as [`read_line`](LineSeeker::read_line), but leaves the cursor where it was.
    ///
    /// The limit works as in `read_line`, including `max_len == 1` returning one byte rather
    /// than none.
    pub fn peek_line(&mut self, max_len: usize) -> Result<Option<Vec<u8>>> {
        let pos = self.position()?;
        let state = self.state;
        let line = self.read_line(max_len);
        self.inner.seek(SeekFrom::Start(pos))?;
        self.state = state;
        line
    }
}

impl<'a, RS: 'a + Read + Seek> LineSeeker<'a, RS> {
    /// Returns `true` if the cursor rests on a `\r` or `\n` byte.
    pub fn is_on_eol(&mut self) -> Result<bool> {
        Ok(is_eol(self.peek_byte()?))
    }

    /// Steps backwards over the end-of-line sequence under the cursor, if there is one.
    ///
    /// On `\n` the cursor steps back one byte; then, if it rests on `\r`, it steps back once
    /// more. Stepping back from offset 0 does nothing. Returns the resulting offset.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::LineSeeker;
    /// use std::io::{Cursor, Seek, SeekFrom};
    ///
    /// let mut cursor = Cursor::new(b"ab\r\ncd".to_vec());
    /// cursor.seek(SeekFrom::Start(3)).unwrap();
    ///
    /// let mut seeker = LineSeeker::new(&mut cursor);
    /// assert_eq!(seeker.move_before_eol().unwrap(), 1);
    /// ```
    pub fn move_before_eol(&mut self) -> Result<u64> {
        if self.peek_byte()? == Some(LF) {
            self.step_back()?;
        }
        if self.peek_byte()? == Some(CR) {
            self.step_back()?;
        }
        self.position()
    }

    /// Moves the cursor onto the last byte of the end-of-line sequence it starts on.
    ///
    /// A `\r` followed by `\n` moves the cursor onto the `\n`; a lone `\r` or a `\n` leaves the
    /// cursor in place. Returns the resulting offset.
    ///
    /// # Errors
    ///
    /// If the cursor is not on a `\r` or `\n` byte, an error variant of `ErrorKind::NotOnEol`
    /// is returned and the cursor does not move.
    pub fn move_end_of_eol(&mut self) -> Result<u64> {
        match self.peek_byte()? {
            Some(CR) => {
                let pos = self.seek_to_current(1)?;
                if self.peek_byte()? == Some(LF) {
                    Ok(pos)
                } else {
                    self.seek_to(pos - 1)
                }
            }
            Some(LF) => self.position(),
            _ => Err(Error::new(ErrorKind::NotOnEol)),
        }
    }

    /// Moves the cursor past the end-of-line sequence it starts on, onto the first byte of the
    /// next line (or the end of the stream).
    ///
    /// # Errors
    ///
    /// Same as [`move_end_of_eol`](LineSeeker::move_end_of_eol).
    pub fn move_after_eol(&mut self) -> Result<u64> {
        self.move_end_of_eol()?;
        self.seek_to_current(1)
    }
}

impl<'a, RS: 'a + Read + Seek> LineSeeker<'a, RS> {
    /// Moves the cursor to the first byte of the line it is on, and returns that offset.
    ///
    /// The end-of-line sequence of the line itself is ignored, so a cursor resting on it finds
    /// the start of the line it terminates. A cursor at the end of the stream counts as resting
    /// on the last byte, which means a trailing terminator never opens an empty last line.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::LineSeeker;
    /// use std::io::{Cursor, Seek, SeekFrom};
    ///
    /// let mut cursor = Cursor::new(b"x\r\ny\rz\n".to_vec());
    /// cursor.seek(SeekFrom::Start(4)).unwrap();
    ///
    /// let mut seeker = LineSeeker::new(&mut cursor);
    /// assert_eq!(seeker.line_start().unwrap(), 3);
    ///
    /// seeker.move_to_end().unwrap();
    /// assert_eq!(seeker.line_start().unwrap(), 5);
    /// ```
    pub fn line_start(&mut self) -> Result<u64> {
        let end = self.tell_end()?;
        if end == 0 {
            return self.seek_to(0);
        }

        let pos = cmp::min(self.position()?, end - 1);
        let hi = match self.eol_sequence_start(pos)? {
            Some(seq) => seq,
            None => pos,
        };

        match self.rfind_eol(hi)? {
            Some(eol) => self.seek_to(eol + 1),
            None => self.seek_to(0),
        }
    }

    /// Moves the cursor to the last byte of the end-of-line sequence terminating the current
    /// line, and returns that offset.
    ///
    /// If the line runs to the end of the stream without a terminator, the cursor moves to the
    /// end of the stream instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::LineSeeker;
    /// use std::io::Cursor;
    ///
    /// let mut cursor = Cursor::new(b"ab\r\ncd".to_vec());
    /// let mut seeker = LineSeeker::new(&mut cursor);
    ///
    /// assert_eq!(seeker.line_end().unwrap(), 3);
    /// seeker.move_after_eol().unwrap();
    /// assert_eq!(seeker.line_end().unwrap(), 6);
    /// ```
    pub fn line_end(&mut self) -> Result<u64> {
        let end = self.tell_end()?;
        let pos = self.position()?;
        if pos >= end {
            return self.seek_to(end);
        }
        if self.is_on_eol()? {
            return self.move_end_of_eol();
        }

        match self.find_eol(pos, end)? {
            Some(eol) => {
                self.seek_to(eol)?;
                self.move_end_of_eol()
            }
            None => self.seek_to(end),
        }
    }

    /// Moves the cursor to the start of the previous line, and returns that offset.
    ///
    /// Does not wrap: on the first line, the cursor moves to offset 0.
    ///
    /// At the end of a stream that ends with a line break, the previous line is the last one.
    pub fn line_prev(&mut self) -> Result<u64> {
        let end = self.tell_end()?;
        if end > 0 && self.position()? >= end && is_eol(self.byte_at(end - 1)?) {
            self.seek_to(end)?;
            return self.line_start();
        }

        let start = self.line_start()?;
        if start == 0 {
            return Ok(0);
        }
        self.seek_to(start - 1)?;
        self.line_start()
    }

    /// Moves the cursor to the start of the next line, and returns that offset.
    ///
    /// Does not wrap: if the current line is the last one, `None` is returned and the cursor
    /// stays where it was.
    pub fn line_next(&mut self) -> Result<Option<u64>> {
        let origin = self.position()?;
        let end = self.tell_end()?;

        if self.line_end()? < end {
            let next = self.move_after_eol()?;
            if next < end {
                return Ok(Some(next));
            }
        }

        self.seek_to(origin)?;
        Ok(None)
    }

    /// Moves the cursor back by `n` lines, stopping at the start of the stream, and returns the
    /// resulting offset.
    ///
    /// From the end of a stream that ends with a line break, `move_back(1)` lands on the start of
    /// the last line.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::LineSeeker;
    /// use std::io::Cursor;
    ///
    /// let mut cursor = Cursor::new(b"a\nb\nc\nd\n".to_vec());
    /// let mut seeker = LineSeeker::new(&mut cursor);
    ///
    /// seeker.move_to_end().unwrap();
    /// assert_eq!(seeker.move_back(2).unwrap(), 4);
    /// assert_eq!(seeker.move_back(100).unwrap(), 0);
    /// ```
    pub fn move_back(&mut self, n: usize) -> Result<u64> {
        let mut pos = self.position()?;
        for _ in 0..n {
            pos = self.line_prev()?;
            if pos == 0 {
                break;
            }
        }
        Ok(pos)
    }

    /// Moves the cursor forward by `n` lines, stopping at the start of the last line, and
    /// returns the resulting offset.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::LineSeeker;
    /// use std::io::Cursor;
    ///
    /// let mut cursor = Cursor::new(b"a\nb\nc\nd\n".to_vec());
    /// let mut seeker = LineSeeker::new(&mut cursor);
    ///
    /// assert_eq!(seeker.move_forward(2).unwrap(), 4);
    /// assert_eq!(seeker.move_forward(100).unwrap(), 6);
    /// ```
    pub fn move_forward(&mut self, n: usize) -> Result<u64> {
        let mut pos = self.position()?;
        for _ in 0..n {
            match self.line_next()? {
                Some(next) => pos = next,
                None => break,
            }
        }
        Ok(pos)
    }
}

impl<'a, RS: 'a + Read + Seek> LineSeeker<'a, RS> {
    /// Returns the byte under the cursor, then steps the cursor back by one.
    ///
    /// This is the backward twin of [`read_byte`](LineSeeker::read_byte). At the end of the
    /// stream `None` is returned, and the cursor still steps back onto the last byte. At offset
    /// 0 the byte is returned once; after that, `unget_byte` and
    /// [`unget_line`](LineSeeker::unget_line) return `None` until the cursor is moved by another
    /// operation.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::LineSeeker;
    /// use std::io::{Cursor, Seek, SeekFrom};
    ///
    /// let mut cursor = Cursor::new(b"ab".to_vec());
    /// cursor.seek(SeekFrom::Start(1)).unwrap();
    ///
    /// let mut seeker = LineSeeker::new(&mut cursor);
    /// assert_eq!(seeker.unget_byte().unwrap(), Some(b'b'));
    /// assert_eq!(seeker.unget_byte().unwrap(), Some(b'a'));
    /// assert_eq!(seeker.unget_byte().unwrap(), None);
    /// ```
    pub fn unget_byte(&mut self) -> Result<Option<u8>> {
        if self.state.rewound {
            return Ok(None);
        }

        let byte = self.peek_byte()?;
        if self.position()? == 0 {
            self.state.rewound = true;
        } else {
            self.inner.seek(SeekFrom::Current(-1))?;
        }
        Ok(byte)
    }

    /// Reads the current line backwards, from its start up to and including the byte under the
    /// cursor, and leaves the cursor one byte before the returned text.
    ///
    /// A cursor at the end of the stream counts as resting on the last byte. If `max_len` is not
    /// zero and the text is longer than `max_len - 1` bytes, only the bytes nearest to the cursor
    /// are returned, and the next call picks up the rest of the line.
    ///
    /// Returns `None` on an empty stream, or once the start of the stream has been ungotten.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::LineSeeker;
    /// use std::io::Cursor;
    ///
    /// let mut cursor = Cursor::new(b"one\ntwo\n".to_vec());
    /// let mut seeker = LineSeeker::new(&mut cursor);
    /// seeker.move_to_end().unwrap();
    ///
    /// assert_eq!(seeker.unget_line(0).unwrap().unwrap(), b"two\n");
    /// assert_eq!(seeker.unget_line(0).unwrap().unwrap(), b"one\n");
    /// assert_eq!(seeker.unget_line(0).unwrap(), None);
    /// ```
    pub fn unget_line(&mut self, max_len: usize) -> Result<Option<Vec<u8>>> {
        if self.state.rewound {
            return Ok(None);
        }

        let end = self.tell_end()?;
        if end == 0 {
            return Ok(None);
        }

        let pos = cmp::min(self.position()?, end - 1);
        self.seek_to(pos)?;
        let mut from = self.line_start()?;
        if let Some(limit) = line_limit(max_len) {
            from = cmp::max(from, (pos + 1).saturating_sub(limit as u64));
        }

        let mut line = vec![0; buf_len(pos + 1 - from)?];
        self.inner.seek(SeekFrom::Start(from))?;
        self.inner.read_exact(&mut line)?;

        if from == 0 {
            self.inner.seek(SeekFrom::Start(0))?;
            self.state.rewound = true;
        } else {
            self.inner.seek(SeekFrom::Start(from - 1))?;
        }
        Ok(Some(line))
    }
}

impl<'a, RS: 'a + Read + Seek> LineSeeker<'a, RS> {
    fn seek_to(&mut self, pos: u64) -> Result<u64> {
        self.state.rewound = false;
        Ok(self.inner.seek(SeekFrom::Start(pos))?)
    }

    fn seek_to_current(&mut self, offset: i64) -> Result<u64> {
        self.state.rewound = false;
        Ok(self.inner.seek(SeekFrom::Current(offset))?)
    }

    fn step_back(&mut self) -> Result<u64> {
        match self.position()? {
            0 => self.seek_to(0),
            pos => self.seek_to(pos - 1),
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.inner.read_exact(&mut byte) {
            Ok(()) => Ok(Some(byte[0])),
            Err(ref err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    // Leaves the cursor right after `pos`, or on it if there is no byte there.
    fn byte_at(&mut self, pos: u64) -> Result<Option<u8>> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.next_byte()
    }

    // Offset of the first byte of the end-of-line sequence covering `pos`, if any.
    fn eol_sequence_start(&mut self, pos: u64) -> Result<Option<u64>> {
        match self.byte_at(pos)? {
            Some(LF) if pos > 0 && self.byte_at(pos - 1)? == Some(CR) => Ok(Some(pos - 1)),
            Some(CR) | Some(LF) => Ok(Some(pos)),
            _ => Ok(None),
        }
    }

    // Offset of the last `\r` or `\n` before `hi`, scanning one window at a time.
    fn rfind_eol(&mut self, hi: u64) -> Result<Option<u64>> {
        let cap = self.buf.len() as u64;
        let mut hi = hi;
        while hi > 0 {
            let lo = hi.saturating_sub(cap);
            let n = (hi - lo) as usize;
            self.inner.seek(SeekFrom::Start(lo))?;
            self.inner.read_exact(&mut self.buf[..n])?;
            log::trace!("scanned {} bytes backwards from {}", n, hi);

            if let Some(i) = memrchr2(CR, LF, &self.buf[..n]) {
                return Ok(Some(lo + i as u64));
            }
            hi = lo;
        }
        Ok(None)
    }

    // Offset of the first `\r` or `\n` in `lo..end`, scanning one window at a time.
    fn find_eol(&mut self, lo: u64, end: u64) -> Result<Option<u64>> {
        let cap = self.buf.len() as u64;
        let mut lo = lo;
        while lo < end {
            let n = cmp::min(cap, end - lo) as usize;
            self.inner.seek(SeekFrom::Start(lo))?;
            self.inner.read_exact(&mut self.buf[..n])?;
            log::trace!("scanned {} bytes forwards from {}", n, lo);

            if let Some(i) = memchr2(CR, LF, &self.buf[..n]) {
                return Ok(Some(lo + i as u64));
            }
            lo += n as u64;
        }
        Ok(None)
    }
}

fn is_eol(byte: Option<u8>) -> bool {
    matches!(byte, Some(CR) | Some(LF))
}

// Lines longer than the address space can't be buffered.
fn buf_len(n: u64) -> io::Result<usize> {
    usize::try_from(n).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("a line of {} bytes does not fit in memory", n),
        )
    })
}

// The number of bytes a line read with `max_len` may hold, `None` if unbounded.
fn line_limit(max_len: usize) -> Option<usize> {
    match max_len {
        0 => None,
        n => Some(cmp::max(n - 1, 1)),
    }
}
