//! This library provides the [`LineSeeker`] type to move the cursor of a seekable byte stream
//! line by line, forwards or backwards, without indexing or loading the whole stream.
//!
//! Lines may end with `\r\n`, `\n` or `\r`, mixed within the same stream. On top of the line
//! navigation, [`LineSeeker::read_record`] and [`LineSeeker::read_record_reverse`] split lines
//! into delimited fields, optionally joining lines whose fields contain unescaped line breaks.
//!
//! # Examples
//!
//! - Print the last two lines of a log file, without loading the entire file into memory.
//!
//! ```no_run
//! use lineseeker::{LineSeeker, Result};
//! use std::fs::File;
//!
//! fn tail(f: &mut File, n: usize) -> Result<Vec<Vec<u8>>> {
//!     let mut seeker = LineSeeker::new(f);
//!     seeker.move_to_end()?;
//!     seeker.move_back(n)?;
//!
//!     let mut lines = Vec::new();
//!     while let Some(line) = seeker.read_line(0)? {
//!         lines.push(line);
//!     }
//!     Ok(lines)
//! }
//!
//! fn main() -> Result<()> {
//!    let mut f = File::open("./server.log")?;
//!    for line in tail(&mut f, 2)? {
//!        print!("{}", String::from_utf8_lossy(&line));
//!    }
//!    Ok(())
//! }
//! ```
//!
//! - Read the records of a CSV-like file from the last one to the first.
//!
//! ```
//! use lineseeker::{LineSeeker, RecordOptions};
//! use std::io::Cursor;
//!
//! let mut cursor = Cursor::new(b"id,note\r\n1,first\r\n2,multi\r\nline\r\n".to_vec());
//! let mut seeker = LineSeeker::new(&mut cursor);
//! seeker.move_to_end().unwrap();
//!
//! let options = RecordOptions::new().expected_fields(2);
//! let record = seeker.read_record_reverse(&options).unwrap().unwrap();
//! assert_eq!(record, vec![b"2".to_vec(), b"multi\r\nline".to_vec()]);
//! ```
//!
//! [`LineSeeker`]: struct.LineSeeker.html
#![deny(missing_docs)]

mod error;
pub use error::{Error, ErrorKind, Result};

mod seeker;
pub use seeker::LineSeeker;

mod record;
pub use record::{Record, RecordOptions, Records};
