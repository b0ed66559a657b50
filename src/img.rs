/// A square raster icon variant, already encoded as a PNG stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    edge_length: u32,
    encoded_bytes: Vec<u8>,
}

impl RasterImage {
    pub fn new(edge_length: u32, encoded_bytes: Vec<u8>) -> Self {
        RasterImage {
            edge_length,
            encoded_bytes,
        }
    }

    /// Pixel width, which is also the height
    pub fn edge_length(&self) -> u32 {
        self.edge_length
    }

    pub fn encoded_bytes(&self) -> &[u8] {
        &self.encoded_bytes
    }

    pub fn byte_size(&self) -> usize {
        self.encoded_bytes.len()
    }
}
