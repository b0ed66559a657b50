//! ICO container encoding.
//!
//! Layout: a 6-byte header, one 16-byte directory entry per image, then the
//! image payloads back to back. All multi-byte fields are little-endian.
//! Payloads written here are always PNG streams. Reading ICO files back is
//! left to the `ico` crate.

use crate::error::{IcoError, InvalidInput};
use crate::img::RasterImage;
use std::collections::HashSet;

pub const HEADER_SIZE: usize = 6;
pub const DIR_ENTRY_SIZE: usize = 16;
pub const MAX_EDGE_LENGTH: u32 = 256;

const RESERVED: u16 = 0;
const TYPE_ICON: u16 = 1;
const COLOR_PLANES: u16 = 1;
const BITS_PER_PIXEL: u16 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcoDirectoryEntry {
    pub width: u8,
    pub height: u8,
    pub color_count: u8,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub byte_size: u32,
    pub data_offset: u32,
}

impl IcoDirectoryEntry {
    fn new(edge_length: u32, byte_size: u32, data_offset: u32) -> Self {
        IcoDirectoryEntry {
            width: dimension_byte(edge_length),
            height: dimension_byte(edge_length),
            color_count: 0,
            planes: COLOR_PLANES,
            bits_per_pixel: BITS_PER_PIXEL,
            byte_size,
            data_offset,
        }
    }

    fn as_bytes(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut bytes = [0u8; DIR_ENTRY_SIZE];
        bytes[0] = self.width;
        bytes[1] = self.height;
        bytes[2] = self.color_count;
        bytes[3] = 0; // reserved
        bytes[4..6].copy_from_slice(&self.planes.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.bits_per_pixel.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.byte_size.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.data_offset.to_le_bytes());
        bytes
    }
}

// A single byte cannot hold 256, so the format stores it as 0.
fn dimension_byte(edge_length: u32) -> u8 {
    if edge_length == MAX_EDGE_LENGTH {
        0
    } else {
        edge_length as u8
    }
}

fn validate(images: &[RasterImage]) -> Result<(), InvalidInput> {
    if images.is_empty() {
        return Err(InvalidInput::EmptyImageSet);
    }

    let mut seen = HashSet::new();
    for img in images {
        let edge = img.edge_length();
        if !(1..=MAX_EDGE_LENGTH).contains(&edge) {
            return Err(InvalidInput::EdgeLengthOutOfRange(edge));
        }
        if img.encoded_bytes().is_empty() {
            return Err(InvalidInput::EmptyImageData(edge));
        }
        if !seen.insert(edge) {
            return Err(InvalidInput::DuplicateEdgeLength(edge));
        }
    }
    Ok(())
}

/// Assemble `images` into one ICO file, smallest edge length first.
///
/// The sort makes the output independent of input order, so repeated runs
/// over the same rasters produce byte-identical files.
pub fn encode(images: &[RasterImage]) -> Result<Vec<u8>, IcoError> {
    encode_within(images, u32::MAX as usize)
}

// `limit` is the largest file the 32-bit offset and size fields can address
fn encode_within(images: &[RasterImage], limit: usize) -> Result<Vec<u8>, IcoError> {
    validate(images)?;

    let mut sorted: Vec<&RasterImage> = images.iter().collect();
    sorted.sort_by_key(|img| img.edge_length());

    let count = sorted.len();
    let directory_end = HEADER_SIZE + DIR_ENTRY_SIZE * count;
    let total_size = directory_end + sorted.iter().map(|img| img.byte_size()).sum::<usize>();
    if total_size > limit {
        return Err(InvalidInput::TooLarge(total_size).into());
    }

    let mut out = Vec::with_capacity(total_size);
    out.extend_from_slice(&RESERVED.to_le_bytes());
    out.extend_from_slice(&TYPE_ICON.to_le_bytes());
    // At most 256 distinct edge lengths survive validation
    out.extend_from_slice(&(count as u16).to_le_bytes());

    let mut data_offset = directory_end;
    for img in &sorted {
        let entry =
            IcoDirectoryEntry::new(img.edge_length(), img.byte_size() as u32, data_offset as u32);
        tracing::debug!(
            edge = img.edge_length(),
            size = entry.byte_size,
            offset = entry.data_offset,
            "ico directory entry"
        );
        out.extend_from_slice(&entry.as_bytes());
        data_offset += img.byte_size();
    }

    for img in &sorted {
        out.extend_from_slice(img.encoded_bytes());
    }

    debug_assert_eq!(out.len(), total_size);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn image(edge: u32, len: usize) -> RasterImage {
        RasterImage::new(edge, vec![edge as u8; len])
    }

    fn entry_at(ico: &[u8], index: usize) -> &[u8] {
        let start = HEADER_SIZE + DIR_ENTRY_SIZE * index;
        &ico[start..start + DIR_ENTRY_SIZE]
    }

    #[test]
    fn test_three_size_layout() {
        let ico = encode(&[image(16, 100), image(32, 150), image(48, 200)]).unwrap();

        assert_eq!(&ico[0..6], &[0x00, 0x00, 0x01, 0x00, 0x03, 0x00]);
        assert_eq!(ico.len(), 504);

        let expected = [(16u8, 100u32, 54u32), (32, 150, 154), (48, 200, 304)];
        for (i, (edge, size, offset)) in expected.into_iter().enumerate() {
            let entry = entry_at(&ico, i);
            assert_eq!(entry[0], edge);
            assert_eq!(entry[1], edge);
            assert_eq!(entry[2], 0);
            assert_eq!(entry[3], 0);
            assert_eq!(&entry[4..6], &1u16.to_le_bytes());
            assert_eq!(&entry[6..8], &32u16.to_le_bytes());
            assert_eq!(&entry[8..12], &size.to_le_bytes());
            assert_eq!(&entry[12..16], &offset.to_le_bytes());
        }

        assert!(ico[54..154].iter().all(|&b| b == 16));
        assert!(ico[154..304].iter().all(|&b| b == 32));
        assert!(ico[304..504].iter().all(|&b| b == 48));
    }

    #[test]
    fn test_total_size_and_offsets() {
        let images = [image(1, 7), image(64, 1), image(128, 300), image(200, 42), image(256, 9)];
        let ico = encode(&images).unwrap();

        let payload: usize = images.iter().map(|i| i.byte_size()).sum();
        assert_eq!(ico.len(), HEADER_SIZE + DIR_ENTRY_SIZE * images.len() + payload);

        let mut expected_offset = HEADER_SIZE + DIR_ENTRY_SIZE * images.len();
        for (i, img) in images.iter().enumerate() {
            let entry = entry_at(&ico, i);
            let offset = u32::from_le_bytes(entry[12..16].try_into().unwrap());
            assert_eq!(offset as usize, expected_offset);
            expected_offset += img.byte_size();
        }
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = image(16, 10);
        let b = image(32, 20);
        let c = image(48, 30);

        let reference = encode(&[a.clone(), b.clone(), c.clone()]).unwrap();
        assert_eq!(encode(&[c.clone(), a.clone(), b.clone()]).unwrap(), reference);
        assert_eq!(encode(&[b.clone(), c.clone(), a.clone()]).unwrap(), reference);
        assert_eq!(encode(&[c, b, a]).unwrap(), reference);
    }

    #[test]
    fn test_256_wraps_to_zero() {
        let ico = encode(&[image(255, 4), image(256, 4)]).unwrap();
        assert_eq!(entry_at(&ico, 0)[0..2], [255, 255]);
        assert_eq!(entry_at(&ico, 1)[0..2], [0, 0]);
    }

    #[test]
    fn test_rejects_empty_set() {
        assert_eq!(
            encode(&[]),
            Err(IcoError::InvalidInput(InvalidInput::EmptyImageSet))
        );
    }

    #[test]
    fn test_rejects_out_of_range_edge() {
        assert_eq!(
            encode(&[image(0, 4)]),
            Err(IcoError::InvalidInput(InvalidInput::EdgeLengthOutOfRange(0)))
        );
        assert_eq!(
            encode(&[image(16, 4), image(257, 4)]),
            Err(IcoError::InvalidInput(InvalidInput::EdgeLengthOutOfRange(257)))
        );
    }

    #[test]
    fn test_rejects_empty_image_data() {
        assert_eq!(
            encode(&[image(16, 4), RasterImage::new(32, vec![])]),
            Err(IcoError::InvalidInput(InvalidInput::EmptyImageData(32)))
        );
    }

    #[test]
    fn test_rejects_duplicate_edge() {
        assert_eq!(
            encode(&[image(32, 4), image(16, 4), image(32, 8)]),
            Err(IcoError::InvalidInput(InvalidInput::DuplicateEdgeLength(32)))
        );
    }

    #[test]
    fn test_rejects_files_past_the_offset_limit() {
        let images = [image(16, 40), image(32, 40)];
        // 6 + 32 + 80 bytes
        assert!(encode_within(&images, 118).is_ok());
        assert_eq!(
            encode_within(&images, 117),
            Err(IcoError::InvalidInput(InvalidInput::TooLarge(118)))
        );
    }

    fn png_image(edge: u32) -> RasterImage {
        let rgba = vec![90u8; (edge * edge * 4) as usize];
        RasterImage::new(edge, crate::png::encode_rgba(edge, edge, &rgba).unwrap())
    }

    #[test]
    fn test_standard_reader_round_trip() {
        let images: Vec<RasterImage> = [48, 16, 256, 32].into_iter().map(png_image).collect();
        let bytes = encode(&images).unwrap();
        let dir = ::ico::IconDir::read(Cursor::new(&bytes)).unwrap();

        assert_eq!(dir.resource_type(), ::ico::ResourceType::Icon);
        let widths: Vec<u32> = dir.entries().iter().map(|e| e.width()).collect();
        assert_eq!(widths, vec![16, 32, 48, 256]);
        for entry in dir.entries() {
            assert_eq!(entry.height(), entry.width());
            assert_eq!(entry.bits_per_pixel(), 32);
            assert!(entry.is_png());
            let source = images
                .iter()
                .find(|i| i.edge_length() == entry.width())
                .unwrap();
            assert_eq!(entry.data(), source.encoded_bytes());

            let decoded = entry.decode().unwrap();
            assert_eq!((decoded.width(), decoded.height()), (entry.width(), entry.width()));
        }
    }
}
