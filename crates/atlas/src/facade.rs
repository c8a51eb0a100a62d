use cityscape_common::SplitMix64;
use serde::{Deserialize, Serialize};

/// Window layout of a facade texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacadeStyle {
    /// Separate windows on a regular grid.
    WindowGrid,
    /// Continuous ribbon windows, one per floor.
    Bands,
    /// Tall window columns separated by wide piers.
    Strips,
}

impl FacadeStyle {
    pub const ALL: [FacadeStyle; 3] = [Self::WindowGrid, Self::Bands, Self::Strips];

    pub fn name(self) -> &'static str {
        match self {
            Self::WindowGrid => "window grid",
            Self::Bands => "bands",
            Self::Strips => "strips",
        }
    }
}

/// One square RGBA8 facade image, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct FacadeImage {
    size: u32,
    style: FacadeStyle,
    pixels: Vec<u8>,
}

impl FacadeImage {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn style(&self) -> FacadeStyle {
        self.style
    }

    /// Tightly packed RGBA8 pixels, `size * size * 4` bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.size + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Fraction of pixels brighter than the wall, i.e. lit window area.
    pub fn lit_fraction(&self) -> f32 {
        let lit = self
            .pixels
            .chunks_exact(4)
            .filter(|p| p[0] as u32 + p[1] as u32 + p[2] as u32 > LIT_THRESHOLD)
            .count();
        lit as f32 / (self.size * self.size) as f32
    }

    /// Paint a facade. `rng` fully determines the result.
    pub(crate) fn synthesize(size: u32, style: FacadeStyle, rng: &mut SplitMix64) -> Self {
        let mut painter = Painter::new(size);

        let wall = [
            rng.range_f32(8.0, 22.0) as u8,
            rng.range_f32(8.0, 20.0) as u8,
            rng.range_f32(10.0, 26.0) as u8,
        ];
        painter.fill(wall);

        // Window cell in pixels; a texture holds `size / cell` windows per axis.
        let cell = (size / 16).max(4);
        let lit_ratio = rng.range_f32(0.2, 0.6);
        let warmth = rng.next_f32();

        let (inset_x, inset_y, merge_x, merge_y) = match style {
            FacadeStyle::WindowGrid => (cell / 4, cell / 4, false, false),
            FacadeStyle::Bands => (0, cell / 3, true, false),
            FacadeStyle::Strips => (cell / 3, 0, false, true),
        };

        let cells = size / cell;
        for row in 0..cells {
            // Lit windows come in runs along a floor, like occupied offices.
            let mut lit = rng.chance(lit_ratio);
            for col in 0..cells {
                if rng.chance(0.25) {
                    lit = rng.chance(lit_ratio);
                }
                let x0 = col * cell + if merge_x { 0 } else { inset_x };
                let x1 = (col + 1) * cell - if merge_x { 0 } else { inset_x.max(1) };
                let y0 = row * cell + if merge_y { 0 } else { inset_y };
                let y1 = (row + 1) * cell - if merge_y { 0 } else { inset_y.max(1) };

                if lit {
                    let brightness = rng.range_f32(0.55, 1.0);
                    painter.window(x0, x1, y0, y1, lit_color(brightness, warmth));
                } else {
                    let glow = rng.range_f32(0.0, 1.0);
                    painter.window(x0, x1, y0, y1, unlit_color(glow));
                }
            }
            if merge_x {
                // Mullions keep a ribbon window readable as separate panes.
                let step = cell * 2;
                let mut x = step;
                while x < size {
                    painter.column(x, row * cell, (row + 1) * cell, wall);
                    x += step;
                }
            }
        }

        Self {
            size,
            style,
            pixels: painter.pixels,
        }
    }
}

/// Sum of RGB above which a pixel counts as lit.
const LIT_THRESHOLD: u32 = 240;

fn lit_color(brightness: f32, warmth: f32) -> [u8; 3] {
    let warm = [255.0, 214.0, 150.0];
    let cool = [210.0, 225.0, 255.0];
    let mut out = [0u8; 3];
    for (i, c) in out.iter_mut().enumerate() {
        let base = cool[i] + (warm[i] - cool[i]) * warmth;
        *c = (base * brightness).clamp(0.0, 255.0) as u8;
    }
    out
}

fn unlit_color(glow: f32) -> [u8; 3] {
    [
        (18.0 + 10.0 * glow) as u8,
        (20.0 + 12.0 * glow) as u8,
        (30.0 + 18.0 * glow) as u8,
    ]
}

struct Painter {
    size: u32,
    pixels: Vec<u8>,
}

impl Painter {
    fn new(size: u32) -> Self {
        Self {
            size,
            pixels: vec![0u8; (size * size * 4) as usize],
        }
    }

    fn put(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = ((y * self.size + x) * 4) as usize;
        self.pixels[i..i + 4].copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
    }

    fn fill(&mut self, rgb: [u8; 3]) {
        for y in 0..self.size {
            for x in 0..self.size {
                self.put(x, y, rgb);
            }
        }
    }

    /// Window rectangle `[x0, x1) x [y0, y1)`, darker towards the top edge.
    fn window(&mut self, x0: u32, x1: u32, y0: u32, y1: u32, rgb: [u8; 3]) {
        let x1 = x1.min(self.size);
        let y1 = y1.min(self.size);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let h = (y1 - y0) as f32;
        for y in y0..y1 {
            let shade = 0.75 + 0.25 * ((y - y0) as f32 + 1.0) / h;
            let c = [
                (rgb[0] as f32 * shade) as u8,
                (rgb[1] as f32 * shade) as u8,
                (rgb[2] as f32 * shade) as u8,
            ];
            for x in x0..x1 {
                self.put(x, y, c);
            }
        }
    }

    fn column(&mut self, x: u32, y0: u32, y1: u32, rgb: [u8; 3]) {
        if x >= self.size {
            return;
        }
        for y in y0..y1.min(self.size) {
            self.put(x, y, rgb);
        }
    }
}
