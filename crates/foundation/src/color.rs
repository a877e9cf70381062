/// 24-bit sRGB color with `#rrggbb` parsing and formatting.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidHexColor {
    pub raw: String,
}

impl std::fmt::Display for InvalidHexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid hex color: {:?}", self.raw)
    }
}

impl std::error::Error for InvalidHexColor {}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub fn parse_hex(raw: &str) -> Result<Self, InvalidHexColor> {
        let digits = raw.strip_prefix('#').unwrap_or(raw);
        let component = |range: std::ops::Range<usize>| {
            digits
                .get(range)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| InvalidHexColor {
                    raw: raw.to_string(),
                })
        };
        // from_str_radix tolerates a sign prefix, so gate on the digit set.
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidHexColor {
                raw: raw.to_string(),
            });
        }
        Ok(Rgb::new(component(0..2)?, component(2..4)?, component(4..6)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Componentwise linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(a: Rgb, b: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        Rgb::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub value: f64,
    pub color: Rgb,
}

/// Three-stop linear color scale.
///
/// Stops are ordered by value; `color_at` clamps outside the stop range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorScale {
    stops: [ColorStop; 3],
}

impl ColorScale {
    pub const fn new(stops: [ColorStop; 3]) -> Self {
        ColorScale { stops }
    }

    /// The scale used for the 0-100 opportunity score encoding.
    pub const fn score_default() -> Self {
        ColorScale::new([
            ColorStop {
                value: 0.0,
                color: Rgb::new(0xe5, 0xe7, 0xeb),
            },
            ColorStop {
                value: 50.0,
                color: Rgb::new(0xa5, 0xb4, 0xfc),
            },
            ColorStop {
                value: 100.0,
                color: Rgb::new(0x37, 0x30, 0xa3),
            },
        ])
    }

    pub fn stops(&self) -> &[ColorStop; 3] {
        &self.stops
    }

    pub fn color_at(&self, value: f64) -> Rgb {
        let [lo, mid, hi] = self.stops;
        if value <= lo.value {
            return lo.color;
        }
        if value >= hi.value {
            return hi.color;
        }
        let (a, b) = if value < mid.value { (lo, mid) } else { (mid, hi) };
        let span = b.value - a.value;
        let t = if span > 0.0 { (value - a.value) / span } else { 0.0 };
        Rgb::lerp(a.color, b.color, t)
    }
}
