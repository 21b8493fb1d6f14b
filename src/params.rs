/// Per-dispatch parameters shared by every invocation.
///
/// The byte layout is the uniform record bound at binding 0: five 4-byte
/// scalars in declaration order, 20 bytes total.
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
pub struct SceneParameters {
    /// Elapsed seconds.
    pub time: f32,
    /// Frequency or modulation control.
    pub freq: f32,
    /// Logical element count, owned by the host.
    pub count: u32,
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
}

impl SceneParameters {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }

    pub fn with_freq(mut self, freq: f32) -> Self {
        self.freq = freq;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Number of cells in the logical domain, `width * height`.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Row-major offset of `(x, y)`, or `None` outside `[0, width) × [0, height)`.
    pub fn linear_index(&self, x: u32, y: u32) -> Option<usize> {
        self.contains(x, y)
            .then(|| x as usize + y as usize * self.width as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_uniform_record() {
        assert_eq!(std::mem::size_of::<SceneParameters>(), 20);
        let params = SceneParameters::new(3, 4)
            .with_time(1.5)
            .with_freq(43000.0)
            .with_count(8);
        let words: &[u32] = bytemuck::cast_slice(bytemuck::bytes_of(&params));
        assert_eq!(
            words,
            &[1.5f32.to_bits(), 43000.0f32.to_bits(), 8, 3, 4]
        );
    }

    #[test]
    fn linear_index_is_row_major() {
        let params = SceneParameters::new(10, 7);
        assert_eq!(params.linear_index(0, 0), Some(0));
        assert_eq!(params.linear_index(9, 0), Some(9));
        assert_eq!(params.linear_index(0, 1), Some(10));
        assert_eq!(params.linear_index(9, 6), Some(69));
        assert_eq!(params.linear_index(10, 0), None);
        assert_eq!(params.linear_index(0, 7), None);
    }

    #[test]
    fn empty_domain_has_no_index() {
        let params = SceneParameters::new(0, 5);
        assert_eq!(params.cell_count(), 0);
        assert_eq!(params.linear_index(0, 0), None);
    }
}
