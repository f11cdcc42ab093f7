//! Morton (Z-order) pixel ordering for kernel launches.
//!
//! Consecutive threads of a GPU launch that trace neighbouring pixels touch
//! similar parts of the hierarchy. [`ZOrder`] assigns each pixel a rank along
//! the Morton curve so a kernel can map its linear thread id to a pixel.

/// Bijection between pixel coordinates and Morton rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZOrder {
    width: u32,
    height: u32,
    to_index: Vec<u32>,
    to_coord: Vec<[u32; 2]>,
}

impl ZOrder {
    /// Build the tables for a `width x height` image.
    ///
    /// The curve is walked over the smallest power-of-two square covering
    /// the image and out-of-range cells are skipped, so ranks stay dense.
    /// A zero dimension gives empty tables.
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = width as usize * height as usize;
        let mut to_index = vec![0u32; pixels];
        let mut to_coord = Vec::with_capacity(pixels);

        if pixels > 0 {
            let side = u64::from(width.max(height).next_power_of_two());
            for code in 0..side * side {
                let x = compact_bits(code);
                let y = compact_bits(code >> 1);
                if x < width && y < height {
                    to_index[y as usize * width as usize + x as usize] = to_coord.len() as u32;
                    to_coord.push([x, y]);
                }
            }
        }

        Self {
            width,
            height,
            to_index,
            to_coord,
        }
    }

    /// Image width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.to_coord.len()
    }

    /// `true` for a zero-sized image.
    pub fn is_empty(&self) -> bool {
        self.to_coord.is_empty()
    }

    /// Rank of each pixel, indexed by `y * width + x`.
    pub fn to_index(&self) -> &[u32] {
        &self.to_index
    }

    /// Pixel `[x, y]` of each rank.
    pub fn to_coord(&self) -> &[[u32; 2]] {
        &self.to_coord
    }

    /// Raw bytes of the rank-to-pixel table for upload.
    pub fn coord_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.to_coord)
    }

    /// Raw bytes of the pixel-to-rank table for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.to_index)
    }
}

/// Gather the even bits of `v` into the low half.
fn compact_bits(v: u64) -> u32 {
    let mut v = v & 0x5555_5555_5555_5555;
    v = (v | (v >> 1)) & 0x3333_3333_3333_3333;
    v = (v | (v >> 2)) & 0x0f0f_0f0f_0f0f_0f0f;
    v = (v | (v >> 4)) & 0x00ff_00ff_00ff_00ff;
    v = (v | (v >> 8)) & 0x0000_ffff_0000_ffff;
    v = (v | (v >> 16)) & 0x0000_0000_ffff_ffff;
    v as u32
}
