use crate::util::{TakeArray, TakeVec};
use crc::{CRC_32_ISO_HDLC, Crc};
use std::fmt::{self, Display};
use std::str::from_utf8;
use thiserror::Error;

const CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub const STANDARD_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Debug, Error)]
pub enum PngError {
    #[error("missing PNG signature")]
    BadSignature,

    #[error("stream ends inside a chunk")]
    Truncated,

    #[error("invalid chunk type {0:?}")]
    InvalidChunkType([u8; 4]),

    #[error("CRC mismatch in {chunk} chunk: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        chunk: ChunkType,
        stored: u32,
        computed: u32,
    },

    #[error("first chunk must be IHDR")]
    MissingHeader,

    #[error("no IDAT chunk")]
    MissingData,

    #[error("last chunk must be IEND")]
    MissingEnd,

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] ::png::EncodingError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkType {
    data: [u8; 4],
}

impl TryFrom<[u8; 4]> for ChunkType {
    type Error = PngError;

    fn try_from(value: [u8; 4]) -> Result<Self, Self::Error> {
        if value.iter().all(u8::is_ascii_alphabetic) {
            Ok(ChunkType { data: value })
        } else {
            Err(PngError::InvalidChunkType(value))
        }
    }
}

impl Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Validated as ASCII on construction
        write!(f, "{}", from_utf8(&self.data).map_err(|_| fmt::Error)?)
    }
}

impl ChunkType {
    pub fn bytes(&self) -> [u8; 4] {
        self.data
    }

    pub fn is(&self, name: &[u8; 4]) -> bool {
        &self.data == name
    }
}

#[derive(Debug, Clone)]
pub struct Chunk {
    chunk_type: ChunkType,
    data: Vec<u8>,
    crc: u32,
}

impl Chunk {
    pub fn new(chunk_type: ChunkType, data: Vec<u8>) -> Chunk {
        let mut digest = CRC.digest();
        digest.update(&chunk_type.bytes());
        digest.update(&data);

        Self {
            chunk_type,
            data,
            crc: digest.finalize(),
        }
    }

    pub fn chunk_type(&self) -> &ChunkType {
        &self.chunk_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }
}

/// Fields of the IHDR chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub interlace: u8,
}

impl PngHeader {
    const LEN: usize = 13;

    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != Self::LEN {
            return None;
        }
        Some(PngHeader {
            width: u32::from_be_bytes(data[0..4].try_into().ok()?),
            height: u32::from_be_bytes(data[4..8].try_into().ok()?),
            bit_depth: data[8],
            color_type: data[9],
            interlace: data[12],
        })
    }
}

/// Walk every chunk of a PNG stream, checking CRCs, and return its IHDR
pub fn read_header(data: &[u8]) -> Result<PngHeader, PngError> {
    let mut stream = data.iter().copied();
    let signature: [u8; 8] = stream.take_array().ok_or(PngError::BadSignature)?;
    if signature != STANDARD_HEADER {
        return Err(PngError::BadSignature);
    }

    let chunks = stream.parse().collect::<Result<Vec<Chunk>, _>>()?;

    let header = chunks
        .first()
        .filter(|c| c.chunk_type().is(b"IHDR"))
        .and_then(|c| PngHeader::parse(c.data()))
        .ok_or(PngError::MissingHeader)?;
    if !chunks.iter().any(|c| c.chunk_type().is(b"IDAT")) {
        return Err(PngError::MissingData);
    }
    if !chunks.last().is_some_and(|c| c.chunk_type().is(b"IEND")) {
        return Err(PngError::MissingEnd);
    }

    tracing::trace!(chunks = chunks.len(), ?header, "parsed png");
    Ok(header)
}

/// Encode straight (non-premultiplied) 8-bit RGBA pixels as a PNG stream
pub fn encode_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>, PngError> {
    let mut out = Vec::new();
    {
        let mut encoder = ::png::Encoder::new(&mut out, width, height);
        encoder.set_color(::png::ColorType::Rgba);
        encoder.set_depth(::png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgba)?;
        writer.finish()?;
    }
    Ok(out)
}

///Parse file data into a stream of chunks
impl<I: Iterator<Item = u8>> Iterator for Parser<I> {
    type Item = Result<Chunk, PngError>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        // Clean end of stream between chunks
        let length: [u8; 4] = match self.byte_stream.take_array() {
            Some(length) => length,
            None => {
                self.done = true;
                return None;
            }
        };
        let result = self.read_chunk(u32::from_be_bytes(length) as usize);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl<I: Iterator<Item = u8>> Parser<I> {
    fn read_chunk(&mut self, data_length: usize) -> Result<Chunk, PngError> {
        let type_bytes: [u8; 4] = self.byte_stream.take_array().ok_or(PngError::Truncated)?;
        let chunk_type = ChunkType::try_from(type_bytes)?;
        let chunk_data = self
            .byte_stream
            .take_vec(data_length)
            .ok_or(PngError::Truncated)?;
        let stored: [u8; 4] = self.byte_stream.take_array().ok_or(PngError::Truncated)?;
        let stored = u32::from_be_bytes(stored);

        let chunk = Chunk::new(chunk_type, chunk_data);
        if chunk.crc() != stored {
            return Err(PngError::CrcMismatch {
                chunk: chunk.chunk_type().clone(),
                stored,
                computed: chunk.crc(),
            });
        }
        Ok(chunk)
    }
}

struct Parser<I>
where
    I: Iterator<Item = u8>,
{
    byte_stream: I,
    done: bool,
}

///Construct a Parser
trait Parse: Iterator<Item = u8> + Sized {
    fn parse(self) -> Parser<Self>;
}

impl<I> Parse for I
where
    I: Iterator<Item = u8>,
{
    fn parse(self) -> Parser<I> {
        Parser {
            byte_stream: self,
            done: false,
        }
    }
}
