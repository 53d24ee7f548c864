use crate::error::DecodeError;
use std::io::BufRead;

/// Supplies the lines of a response one at a time.
pub trait LineSource {
    /// Next line without its line ending, or `None` once the input is closed.
    fn next_line(&mut self) -> Result<Option<String>, DecodeError>;
}

impl<R: BufRead> LineSource for R {
    fn next_line(&mut self) -> Result<Option<String>, DecodeError> {
        let mut bytes = Vec::new();
        if self.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        Ok(Some(line_from_bytes(&bytes)))
    }
}

/// Converts raw line bytes without failing on invalid UTF-8. Such bytes are
/// replaced and then rejected as invalid characters by the unpacker.
pub(crate) fn line_from_bytes(bytes: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(bytes).into_owned();
    trim_line_ending(&mut line);
    line
}

fn trim_line_ending(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

/// Removes the trailing checksum character. The checksum is not verified.
pub(crate) fn strip_checksum(line: &str) -> &str {
    match line.char_indices().last() {
        Some((index, _)) => &line[..index],
        None => line,
    }
}

/// Skips the rest of a response up to and including its blank line.
pub(crate) fn skip_to_end_of_frame<S: LineSource + ?Sized>(
    source: &mut S,
) -> Result<usize, DecodeError> {
    let mut n_skipped = 0;
    while let Some(line) = source.next_line()? {
        if line.is_empty() {
            break;
        }
        n_skipped += 1;
    }
    Ok(n_skipped)
}
