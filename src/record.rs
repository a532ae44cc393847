use crate::error::{Error, ErrorKind, Result};
use crate::seeker::{LineSeeker, CR, LF};
use std::io::{Read, Seek};
use std::iter::FusedIterator;

/// A delimited record: the fields of one or more lines, in stream order.
pub type Record = Vec<Vec<u8>>;

/// Options for reading delimited records.
///
/// # Examples
///
/// ```
/// use lineseeker::RecordOptions;
///
/// let options = RecordOptions::new().delimiter(b';').expected_fields(4);
/// assert_eq!(options.get_delimiter(), b';');
/// assert_eq!(options.get_expected_fields(), Some(4));
/// assert_eq!(options.get_max_len(), 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordOptions {
    max_len: usize,
    delimiter: u8,
    expected_fields: Option<usize>,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            max_len: 0,
            delimiter: b',',
            expected_fields: None,
        }
    }
}

impl RecordOptions {
    /// Creates the default options: no length limit, `,` as delimiter, no expected field count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits each line read to `max_len - 1` bytes, in the same way as
    /// [`LineSeeker::read_line`]. Zero means no limit.
    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Sets the byte fields are split on.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Keeps reading lines into the same record until it holds at least `n` fields.
    ///
    /// This lets a record span lines whose fields contain unescaped line breaks.
    pub fn expected_fields(mut self, n: usize) -> Self {
        self.expected_fields = Some(n);
        self
    }

    /// Returns the line length limit.
    pub fn get_max_len(&self) -> usize {
        self.max_len
    }

    /// Returns the field delimiter.
    pub fn get_delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Returns the expected number of fields, if any.
    pub fn get_expected_fields(&self) -> Option<usize> {
        self.expected_fields
    }
}

impl<'a, RS: 'a + Read + Seek> LineSeeker<'a, RS> {
    /// Reads the next record forwards, and leaves the cursor right after it.
    ///
    /// A line is split on the delimiter without any regard to quoting. If the options ask for
    /// more fields than the line holds, the following lines are read as well: the first field
    /// of each one is joined onto the last field so far, line break included. Trailing `\r` and
    /// `\n` bytes are trimmed from the last field only.
    ///
    /// A record may end up with more fields than expected. Returns `None` at the end of the
    /// stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::{LineSeeker, RecordOptions};
    /// use std::io::Cursor;
    ///
    /// let mut cursor = Cursor::new(b"a,b\nc,d\n".to_vec());
    /// let mut seeker = LineSeeker::new(&mut cursor);
    /// let options = RecordOptions::new().expected_fields(3);
    ///
    /// let record = seeker.read_record(&options).unwrap().unwrap();
    /// assert_eq!(record, vec![b"a".to_vec(), b"b\nc".to_vec(), b"d".to_vec()]);
    /// assert_eq!(seeker.read_record(&options).unwrap(), None);
    /// ```
    pub fn read_record(&mut self, options: &RecordOptions) -> Result<Option<Record>> {
        let line = match self.read_line(options.max_len)? {
            Some(line) => line,
            None => return Ok(None),
        };

        let mut fields = split(&line, options.delimiter);
        if let Some(expected) = options.expected_fields {
            while fields.len() < expected {
                let line = match self.read_line(options.max_len)? {
                    Some(line) => line,
                    None => break,
                };
                let mut rest = split(&line, options.delimiter).into_iter();
                if let (Some(last), Some(first)) = (fields.last_mut(), rest.next()) {
                    last.extend_from_slice(&first);
                }
                fields.extend(rest);
                log::debug!("record continued onto next line, {} fields", fields.len());
            }
        }

        trim_last(&mut fields);
        Ok(Some(fields))
    }

    /// Reads the previous record backwards, and leaves the cursor one byte before it.
    ///
    /// This is the backward twin of [`read_record`](LineSeeker::read_record), built on
    /// [`unget_line`](LineSeeker::unget_line). When more fields are expected, earlier lines are
    /// read: the last field of each earlier line is joined in front of the first field so far.
    ///
    /// # Errors
    ///
    /// Combining `expected_fields` with a non-zero `max_len` is not supported, and an error
    /// variant of `ErrorKind::UnsupportedOptions` is returned before anything is read.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::{LineSeeker, RecordOptions};
    /// use std::io::Cursor;
    ///
    /// let mut cursor = Cursor::new(b"a,b,c\nd,e\n".to_vec());
    /// let mut seeker = LineSeeker::new(&mut cursor);
    /// let options = RecordOptions::new();
    /// seeker.move_to_end().unwrap();
    ///
    /// let record = seeker.read_record_reverse(&options).unwrap().unwrap();
    /// assert_eq!(record, vec![b"d".to_vec(), b"e".to_vec()]);
    /// let record = seeker.read_record_reverse(&options).unwrap().unwrap();
    /// assert_eq!(record, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    /// assert_eq!(seeker.read_record_reverse(&options).unwrap(), None);
    /// ```
    pub fn read_record_reverse(&mut self, options: &RecordOptions) -> Result<Option<Record>> {
        if options.expected_fields.is_some() && options.max_len != 0 {
            return Err(Error::new(ErrorKind::UnsupportedOptions));
        }

        let line = match self.unget_line(options.max_len)? {
            Some(line) => line,
            None => return Ok(None),
        };

        let mut fields = split(&line, options.delimiter);
        if let Some(expected) = options.expected_fields {
            while fields.len() < expected {
                let line = match self.unget_line(0)? {
                    Some(line) => line,
                    None => break,
                };
                let mut earlier = split(&line, options.delimiter);
                if let Some(mut joined) = earlier.pop() {
                    joined.extend_from_slice(&fields[0]);
                    fields[0] = joined;
                }
                earlier.append(&mut fields);
                fields = earlier;
                log::debug!("record continued onto previous line, {} fields", fields.len());
            }
        }

        trim_last(&mut fields);
        Ok(Some(fields))
    }

    /// Returns an iterator over the records from the cursor to the end of the stream.
    ///
    /// The iterator stops after the first error.
    pub fn records(&mut self, options: RecordOptions) -> Records<'_, 'a, RS> {
        Records::new(self, options, Dir::Start)
    }

    /// Returns an iterator over the records from the cursor back to the start of the stream.
    ///
    /// The iterator stops after the first error.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineseeker::{LineSeeker, RecordOptions};
    /// use std::io::Cursor;
    ///
    /// let mut cursor = Cursor::new(b"1;x\n2;y\n3;z".to_vec());
    /// let mut seeker = LineSeeker::new(&mut cursor);
    /// seeker.move_to_end().unwrap();
    ///
    /// let firsts: Vec<Vec<u8>> = seeker
    ///     .records_rev(RecordOptions::new().delimiter(b';'))
    ///     .map(|record| record.unwrap().remove(0))
    ///     .collect();
    /// assert_eq!(firsts, vec![b"3".to_vec(), b"2".to_vec(), b"1".to_vec()]);
    /// ```
    pub fn records_rev(&mut self, options: RecordOptions) -> Records<'_, 'a, RS> {
        Records::new(self, options, Dir::End)
    }
}

#[derive(Clone, Copy, Debug)]
enum Dir {
    Start,
    End,
}

/// An iterator over the records of a stream, in either direction.
///
/// Created by [`LineSeeker::records`] and [`LineSeeker::records_rev`].
#[derive(Debug)]
pub struct Records<'s, 'a, RS: 'a + Read + Seek> {
    seeker: &'s mut LineSeeker<'a, RS>,
    options: RecordOptions,
    dir: Dir,
    done: bool,
}

impl<'s, 'a, RS: 'a + Read + Seek> Records<'s, 'a, RS> {
    fn new(seeker: &'s mut LineSeeker<'a, RS>, options: RecordOptions, dir: Dir) -> Self {
        Self {
            seeker,
            options,
            dir,
            done: false,
        }
    }
}

impl<'s, 'a, RS: 'a + Read + Seek> Iterator for Records<'s, 'a, RS> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let record = match self.dir {
            Dir::Start => self.seeker.read_record(&self.options),
            Dir::End => self.seeker.read_record_reverse(&self.options),
        };
        match record {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<'s, 'a, RS: 'a + Read + Seek> FusedIterator for Records<'s, 'a, RS> {}

fn split(line: &[u8], delimiter: u8) -> Record {
    line.split(|&b| b == delimiter).map(<[u8]>::to_vec).collect()
}

fn trim_last(fields: &mut Record) {
    if let Some(last) = fields.last_mut() {
        while let Some(&b) = last.last() {
            if b != CR && b != LF {
                break;
            }
            last.pop();
        }
    }
}
