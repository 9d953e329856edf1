use std::io::{self, Cursor};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

/// Framing over the stream: every message is a line of UTF-8 text
/// terminated by `\n` (a trailing `\r` is tolerated). A request field
/// occupies exactly one line; a response is a block of one or more
/// non-empty lines terminated by a single empty line, so response payloads
/// must never contain empty lines of their own.
#[derive(Debug)]
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(socket: TcpStream) -> Connection {
        Connection {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Reads one field. Returns `None` when the peer closed the connection
    /// cleanly before starting a new line; a close mid-line is an error.
    pub async fn read_field(&mut self) -> Result<Option<String>, crate::Error> {
        loop {
            if let Some(field) = self.parse_field()? {
                return Ok(Some(field));
            }

            // read_buf returns the number of bytes appended to the buffer;
            // zero means the peer closed its end.
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                } else {
                    return Err("connection reset by peer".into());
                }
            }
        }
    }

    /// Reads one response block: every line up to, and excluding, the empty
    /// terminator line. Returns `None` when the peer closed the connection
    /// instead of sending a block.
    pub async fn read_block(&mut self) -> Result<Option<String>, crate::Error> {
        let mut lines: Vec<String> = Vec::new();

        loop {
            let line = match self.read_field().await? {
                Some(line) => line,
                None if lines.is_empty() => return Ok(None),
                None => return Err("connection reset by peer".into()),
            };

            if line.is_empty() {
                return Ok(Some(lines.join("\n")));
            }

            lines.push(line);
        }
    }

    /// Extracts one complete line from the read buffer, if one has arrived.
    fn parse_field(&mut self) -> Result<Option<String>, crate::Error> {
        let mut buf = Cursor::new(&self.buffer[..]);

        let line = match get_line(&mut buf) {
            Some(line) => line.to_vec(),
            None => return Ok(None),
        };

        let consumed = buf.position() as usize;
        self.buffer.advance(consumed);

        let mut field = String::from_utf8(line)?;
        if field.ends_with('\r') {
            field.pop();
        }

        Ok(Some(field))
    }

    pub async fn write_field(&mut self, field: &str) -> io::Result<()> {
        self.stream.write_all(field.as_bytes()).await?;
        self.stream.write_u8(b'\n').await?;
        self.stream.flush().await
    }

    /// Writes one response block followed by the empty terminator line.
    pub async fn write_block(&mut self, text: &str) -> io::Result<()> {
        for line in text.lines() {
            self.stream.write_all(line.as_bytes()).await?;
            self.stream.write_u8(b'\n').await?;
        }

        self.stream.write_u8(b'\n').await?;
        self.stream.flush().await
    }
}

/// A line is a sequence of bytes terminated by `\n`; the terminator is
/// consumed but not returned.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Option<&'a [u8]> {
    let start = src.position() as usize;
    let slice = *src.get_ref();

    for i in start..slice.len() {
        if slice[i] == b'\n' {
            src.set_position((i + 1) as u64);

            return Some(&slice[start..i]);
        }
    }

    None
}
