use crate::error::{FrameParseError, InternalError};

/// read cursor over a received frame
///
/// every read that runs off the end of the slice fails without consuming anything
pub(crate) struct ReadCursor<'a> {
    src: &'a [u8],
}

impl<'a> ReadCursor<'a> {
    pub(crate) fn new(src: &'a [u8]) -> Self {
        Self { src }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.src.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    pub(crate) fn expect_empty(&self) -> Result<(), FrameParseError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(FrameParseError::TrailingBytes(self.remaining()))
        }
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, FrameParseError> {
        match self.src.split_first() {
            Some((first, rest)) => {
                self.src = rest;
                Ok(*first)
            }
            None => Err(FrameParseError::InsufficientBytes),
        }
    }

    pub(crate) fn read_u16_be(&mut self) -> Result<u16, FrameParseError> {
        match self.read_bytes(2)? {
            [high, low] => Ok(u16::from_be_bytes([*high, *low])),
            _ => Err(FrameParseError::InsufficientBytes),
        }
    }

    pub(crate) fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], FrameParseError> {
        if self.src.len() < count {
            return Err(FrameParseError::InsufficientBytes);
        }
        let (ret, rest) = self.src.split_at(count);
        self.src = rest;
        Ok(ret)
    }
}

/// custom write cursor
pub(crate) struct WriteCursor<'a> {
    dest: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    pub(crate) fn new(dest: &'a mut [u8]) -> WriteCursor<'a> {
        WriteCursor { dest, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.dest.len() - self.pos
    }

    pub(crate) fn seek_from_current(&mut self, count: usize) -> Result<(), InternalError> {
        if self.remaining() < count {
            return Err(InternalError::BadSeekOperation);
        }
        self.pos += count;
        Ok(())
    }

    pub(crate) fn seek_from_start(&mut self, count: usize) -> Result<(), InternalError> {
        if self.dest.len() < count {
            return Err(InternalError::BadSeekOperation);
        }
        self.pos = count;
        Ok(())
    }

    pub(crate) fn write_u8(&mut self, value: u8) -> Result<(), InternalError> {
        match self.dest.get_mut(self.pos) {
            Some(x) => {
                *x = value;
                self.pos += 1;
                Ok(())
            }
            None => Err(InternalError::InsufficientWriteSpace(1, 0)),
        }
    }

    pub(crate) fn write_u16_be(&mut self, value: u16) -> Result<(), InternalError> {
        if self.remaining() < 2 {
            // don't write any bytes if there isn't space for the whole thing
            return Err(InternalError::InsufficientWriteSpace(2, self.remaining()));
        }
        let [upper, lower] = value.to_be_bytes();
        self.write_u8(upper)?;
        self.write_u8(lower)
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), InternalError> {
        let remaining = self.remaining();
        match self.dest.get_mut(self.pos..self.pos + bytes.len()) {
            Some(dest) => {
                dest.copy_from_slice(bytes);
                self.pos += bytes.len();
                Ok(())
            }
            None => Err(InternalError::InsufficientWriteSpace(bytes.len(), remaining)),
        }
    }

    pub(crate) fn written(&self) -> &[u8] {
        &self.dest[..self.pos]
    }
}
