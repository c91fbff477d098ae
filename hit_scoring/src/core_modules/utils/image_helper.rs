pub mod image_helper {
    use crate::core_modules::frame::frame::{Frame, FrameError, PixelFormat};
    use image::ImageEncoder;
    use std::path::Path;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum LoadError {
        #[error(transparent)]
        Image(#[from] image::ImageError),
        #[error(transparent)]
        Frame(#[from] FrameError),
    }

    /// Decodes any still image the `image` crate understands into an RGBA frame.
    pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<Frame, LoadError> {
        Ok(Frame::try_from(image::open(path)?.to_rgba8())?)
    }

    pub fn save_frame<P: AsRef<Path>>(frame: &Frame, path: P) -> Result<(), image::ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);
        let color = match frame.format() {
            PixelFormat::Rgb8 => image::ExtendedColorType::Rgb8,
            PixelFormat::Rgba8 => image::ExtendedColorType::Rgba8,
        };

        encoder.write_image(frame.as_bytes(), frame.width(), frame.height(), color)?;

        Ok(())
    }
}
