use image::Rgb;

pub const PALETTE_NAMES: &[&str] = &[
    "viridis", "plasma", "inferno", "magma", "cividis", "Blues", "Greens", "Reds", "Oranges",
    "Purples", "Greys", "coolwarm", "Spectral", "rainbow",
];

const REVERSED_SUFFIX: &str = "_r";

fn stops(name: &str) -> Option<&'static [u32]> {
    let table: &'static [u32] = match name {
        "viridis" => &[0x440154, 0x3b528b, 0x21918c, 0x5ec962, 0xfde725],
        "plasma" => &[0x0d0887, 0x7e03a8, 0xcc4778, 0xf89540, 0xf0f921],
        "inferno" => &[0x000004, 0x57106e, 0xbc3754, 0xf98e09, 0xfcffa4],
        "magma" => &[0x000004, 0x51127c, 0xb73779, 0xfc8961, 0xfcfdbf],
        "cividis" => &[0x00224e, 0x414d6b, 0x7c7b78, 0xbcaf6f, 0xfee838],
        "Blues" => &[0xf7fbff, 0xc6dbef, 0x6baed6, 0x2171b5, 0x08306b],
        "Greens" => &[0xf7fcf5, 0xc7e9c0, 0x74c476, 0x238b45, 0x00441b],
        "Reds" => &[0xfff5f0, 0xfcbba1, 0xfb6a4a, 0xcb181d, 0x67000d],
        "Oranges" => &[0xfff5eb, 0xfdd0a2, 0xfd8d3c, 0xd94801, 0x7f2704],
        "Purples" => &[0xfcfbfd, 0xdadaeb, 0x9e9ac8, 0x6a51a3, 0x3f007d],
        "Greys" => &[0xffffff, 0xd9d9d9, 0x969696, 0x525252, 0x000000],
        "coolwarm" => &[0x3b4cc0, 0x8db0fe, 0xdddddd, 0xf49a7b, 0xb40426],
        "Spectral" => &[0x9e0142, 0xf46d43, 0xffffbf, 0x66c2a5, 0x5e4fa2],
        "rainbow" => &[0x8000ff, 0x00b5eb, 0x80ffb4, 0xffb360, 0xff0000],
        _ => return None,
    };
    Some(table)
}

/// A named colour map sampled on `[0, 1]`. Names are case-sensitive and an
/// `_r` suffix reverses the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    stops: Vec<Rgb<u8>>,
}

impl Palette {
    pub fn by_name(name: &str) -> Option<Self> {
        let (base, reversed) = match name.strip_suffix(REVERSED_SUFFIX) {
            Some(base) => (base, true),
            None => (name, false),
        };
        let mut colors = stops(base)?.iter().map(|hex| unpack(*hex)).collect::<Vec<_>>();
        if reversed {
            colors.reverse();
        }
        Some(Self {
            name: name.to_string(),
            stops: colors,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample(&self, t: f32) -> Rgb<u8> {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let last = self.stops.len() - 1;
        let scaled = t * last as f32;
        let index = (scaled.floor() as usize).min(last);
        if index == last {
            return self.stops[last];
        }
        let frac = scaled - index as f32;
        let a = self.stops[index].0;
        let b = self.stops[index + 1].0;
        Rgb([
            lerp(a[0], b[0], frac),
            lerp(a[1], b[1], frac),
            lerp(a[2], b[2], frac),
        ])
    }
}

pub fn hex_color(color: Rgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0[0], color.0[1], color.0[2])
}

fn unpack(hex: u32) -> Rgb<u8> {
    Rgb([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8])
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}
