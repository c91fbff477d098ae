// THEORY (single-pixel heuristics):
// The `Pixel` module is the most fundamental unit of the scoring system. It is a
// "dumb" data container for one sampled pixel plus the two heuristics every later
// stage is built on:
//
// - Classification: is this pixel "target-colored"? The rule is a fixed box in RGB
//   space (strong red, weak green and blue) tuned for a saturated red marker.
// - Comparison: how much did this pixel change against the same coordinate in the
//   previous frame? Measured as the sum of absolute channel differences, which is
//   cheap and good enough to separate an impact from sensor flicker.
//
// Alpha is carried through for RGBA sources but never takes part in either
// heuristic.

pub mod pixel {
    use serde::{Deserialize, Serialize};

    pub type Byte = u8;
    pub type Channel = Byte;
    pub type ColorDelta = u16;

    /// A fixed RGB box that separates the target marker from the background.
    /// All comparisons are strict.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TargetColorRule {
        /// Red must be strictly above this value.
        pub min_red: Channel,
        /// Green must be strictly below this value.
        pub max_green: Channel,
        /// Blue must be strictly below this value.
        pub max_blue: Channel,
    }

    impl Default for TargetColorRule {
        fn default() -> Self {
            Self {
                min_red: 150,
                max_green: 100,
                max_blue: 100,
            }
        }
    }

    /// A "dumb" data container representing a single pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha channel value (0-255). Opaque for RGB sources.
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Self {
                red,
                green,
                blue,
                alpha,
            }
        }

        pub fn rgb(red: Channel, green: Channel, blue: Channel) -> Self {
            Self::new(red, green, blue, Channel::MAX)
        }

        /// Builds a pixel from a 3 or 4 byte slice. Missing alpha reads as opaque.
        pub fn from_bytes(bytes: &[Byte]) -> Self {
            match bytes {
                [r, g, b, a, ..] => Self::new(*r, *g, *b, *a),
                [r, g, b] => Self::rgb(*r, *g, *b),
                _ => Self::default(),
            }
        }

        pub fn is_target_colored(&self, rule: &TargetColorRule) -> bool {
            self.red > rule.min_red && self.green < rule.max_green && self.blue < rule.max_blue
        }

        /// Sum of absolute RGB differences. Ranges over 0..=765.
        pub fn channel_difference(&self, other: &Pixel) -> ColorDelta {
            self.red.abs_diff(other.red) as ColorDelta
                + self.green.abs_diff(other.green) as ColorDelta
                + self.blue.abs_diff(other.blue) as ColorDelta
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            Self::from_bytes(bytes)
        }
    }
}
