use crate::{Error, Pixel};

/// Owned row-major grid. Element `(x, y)` lives at `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn contains(&self, p: Pixel) -> bool {
        p.x < self.width && p.y < self.height
    }

    /// Row-major offset of `p`, or `None` when `p` is outside the grid.
    #[inline]
    pub fn offset(&self, p: Pixel) -> Option<usize> {
        if self.contains(p) {
            Some(p.y * self.width + p.x)
        } else {
            None
        }
    }

    #[inline]
    pub fn pixel_at(&self, offset: usize) -> Pixel {
        Pixel::new(offset % self.width, offset / self.width)
    }

    pub fn get(&self, p: Pixel) -> Option<&T> {
        self.offset(p).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, p: Pixel) -> Option<&mut T> {
        self.offset(p).map(|i| &mut self.data[i])
    }

    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Fails with [`Error::DimensionMismatch`] unless `other` has this grid's size.
    pub fn ensure_same_dims<U>(&self, other: &Image<U>) -> Result<(), Error> {
        if self.dims() != other.dims() {
            return Err(Error::DimensionMismatch {
                expected: self.dims(),
                actual: other.dims(),
            });
        }
        Ok(())
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl<T> Default for Image<T> {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        let len = width.checked_mul(height).expect("image size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Resizes to `width x height` and resets every element to `value`.
    pub fn reset(&mut self, width: usize, height: usize, value: T) {
        let len = width.checked_mul(height).expect("image size overflow");
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(len, value);
    }
}

/// Borrowed read-only grid over a contiguous row-major slice.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    width: usize,
    height: usize,
    data: &'a [T],
}

impl<'a, T> ImageView<'a, T> {
    pub fn from_slice(width: usize, height: usize, data: &'a [T]) -> Result<Self, Error> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &'a [T] {
        self.data
    }

}

pub fn depth_from_u16(img: &ImageView<'_, u16>) -> Image<f32> {
    Image {
        width: img.width(),
        height: img.height(),
        data: img.data().iter().map(|&d| d as f32).collect(),
    }
}
