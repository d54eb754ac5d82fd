use image::Rgb;

/// An endless sequence of smoothly changing colours, cycling the HSV hue.
///
/// Hue, saturation, value and the hue increment are all given on a 0-255 scale. Each colour
/// drawn first advances the hue, wrapping back to red after a full turn.
#[derive(Debug, Clone)]
pub struct ColourCycle {
    hue: f64,
    increment: f64,
    saturation: f64,
    value: f64,
}

impl ColourCycle {
    pub fn new(start_hue: u8, speed: f32) -> ColourCycle {
        ColourCycle {
            hue: f64::from(start_hue) / 255.0,
            increment: f64::from(speed) / 255.0,
            saturation: 1.0,
            value: 1.0,
        }
    }

    pub fn with_saturation_value(mut self, saturation: u8, value: u8) -> ColourCycle {
        self.saturation = f64::from(saturation) / 255.0;
        self.value = f64::from(value) / 255.0;
        self
    }

    pub fn next_colour(&mut self) -> Rgb<u8> {
        self.hue = (self.hue + self.increment) % 1.0;
        hsv_to_rgb(self.hue, self.saturation, self.value)
    }
}

impl Iterator for ColourCycle {
    type Item = Rgb<u8>;

    fn next(&mut self) -> Option<Rgb<u8>> {
        Some(self.next_colour())
    }
}

/// Convert hue, saturation and value, each in `[0, 1]`, to an 8 bit rgb colour.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb<u8> {
    let channels = if s == 0.0 {
        (v, v, v)
    } else {
        let sector = (h * 6.0).floor();
        let f = h * 6.0 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        match (sector as i64).rem_euclid(6) {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        }
    };

    let to_u8 = |c: f64| (c * 255.0).round().max(0.0).min(255.0) as u8;
    Rgb([to_u8(channels.0), to_u8(channels.1), to_u8(channels.2)])
}
