// THEORY:
// The `Frame` module represents one raster handed over by the frame source. Like
// `Pixel`, it is a "dumb" data container: it owns the raw bytes, knows its own
// geometry, and can hand out pixels and the subsampling grid that every analysis
// stage walks. It never compares itself to other frames; that is the job of the
// motion detector.
//
// Key architectural principles:
// 1.  **Validated once**: the byte buffer is checked against width, height and
//     channel count at construction. After that, every coordinate on the sampling
//     grid is guaranteed to be readable, so the hot loops never bounds-fail.
// 2.  **Format agnostic**: RGB and RGBA sources are both accepted. Analysis only
//     ever reads the colour channels.
// 3.  **Shared sampling grid**: `sampled_points` is the single definition of the
//     stride-based subsampling used by both the target locator and the motion
//     detector, so the two can never drift apart.

pub mod frame {
    use crate::core_modules::pixel::pixel::{Byte, Pixel};
    use crate::core_modules::point::Point;
    use thiserror::Error;

    /// Channel layout of a frame buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PixelFormat {
        Rgb8,
        Rgba8,
    }

    impl PixelFormat {
        pub fn channels(self) -> usize {
            match self {
                PixelFormat::Rgb8 => 3,
                PixelFormat::Rgba8 => 4,
            }
        }
    }

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum FrameError {
        #[error("frame buffer holds {actual} bytes, expected {expected}")]
        BufferSizeMismatch { expected: usize, actual: usize },
        #[error("frame dimensions must be non-zero, got {width}x{height}")]
        ZeroDimension { width: u32, height: u32 },
    }

    /// An immutable raster of 8-bit pixels.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Frame {
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<Byte>,
    }

    impl Frame {
        pub fn new(
            width: u32,
            height: u32,
            format: PixelFormat,
            data: Vec<Byte>,
        ) -> Result<Self, FrameError> {
            if width == 0 || height == 0 {
                return Err(FrameError::ZeroDimension { width, height });
            }
            let expected = width as usize * height as usize * format.channels();
            if data.len() != expected {
                return Err(FrameError::BufferSizeMismatch {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(Self {
                width,
                height,
                format,
                data,
            })
        }

        /// A frame filled with a single colour.
        pub fn filled(width: u32, height: u32, fill: Pixel) -> Result<Self, FrameError> {
            let pixel_count = width as usize * height as usize;
            let mut data = Vec::with_capacity(pixel_count * 4);
            for _ in 0..pixel_count {
                data.extend_from_slice(&[fill.red, fill.green, fill.blue, fill.alpha]);
            }
            Self::new(width, height, PixelFormat::Rgba8, data)
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn format(&self) -> PixelFormat {
            self.format
        }

        pub fn as_bytes(&self) -> &[Byte] {
            &self.data
        }

        pub fn same_dimensions(&self, other: &Frame) -> bool {
            self.width == other.width && self.height == other.height
        }

        /// Reads the pixel at `(x, y)`. Callers must stay inside the frame.
        #[inline]
        pub fn pixel(&self, x: u32, y: u32) -> Pixel {
            let channels = self.format.channels();
            let index = (y as usize * self.width as usize + x as usize) * channels;
            Pixel::from_bytes(&self.data[index..index + channels])
        }

        /// Overwrites the pixel at `(x, y)`. Alpha is dropped for RGB frames.
        pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
            let channels = self.format.channels();
            let index = (y as usize * self.width as usize + x as usize) * channels;
            let bytes = [pixel.red, pixel.green, pixel.blue, pixel.alpha];
            self.data[index..index + channels].copy_from_slice(&bytes[..channels]);
        }

        /// Row-major walk over every `stride`-th pixel in each axis, starting at the origin.
        /// A stride of zero is treated as one.
        pub fn sampled_points(&self, stride: u32) -> impl Iterator<Item = Point> + '_ {
            let stride = stride.max(1) as usize;
            (0..self.height)
                .step_by(stride)
                .flat_map(move |y| (0..self.width).step_by(stride).map(move |x| Point::new(x, y)))
        }
    }

    impl TryFrom<image::RgbaImage> for Frame {
        type Error = FrameError;

        fn try_from(image: image::RgbaImage) -> Result<Self, Self::Error> {
            let (width, height) = image.dimensions();
            Self::new(width, height, PixelFormat::Rgba8, image.into_raw())
        }
    }

    impl TryFrom<image::RgbImage> for Frame {
        type Error = FrameError;

        fn try_from(image: image::RgbImage) -> Result<Self, Self::Error> {
            let (width, height) = image.dimensions();
            Self::new(width, height, PixelFormat::Rgb8, image.into_raw())
        }
    }
}
