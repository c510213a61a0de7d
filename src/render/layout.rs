use image::GrayImage;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::mask::is_excluded;

const CELL: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub word: String,
    pub font_size: f32,
    /// Top-left corner of the text box.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    pub width: u32,
    pub height: u32,
    pub max_font_size: f32,
    pub min_font_size: f32,
    /// Factor applied to the font size when a word does not fit.
    pub shrink: f32,
    pub margin: f32,
    pub line_height: f32,
}

impl LayoutConfig {
    pub fn for_canvas(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            max_font_size: height as f32 * 0.35,
            min_font_size: 8.0,
            shrink: 0.9,
            margin: 2.0,
            line_height: 1.2,
        }
    }
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w[\w-]*").expect("word pattern"))
}

/// Counts words, most frequent first, ties in order of first appearance.
pub fn count_words(text: &str, max_words: usize) -> Vec<WordFrequency> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, found) in word_pattern().find_iter(text).enumerate() {
        let entry = counts.entry(found.as_str()).or_insert((0, position));
        entry.0 += 1;
    }
    let mut words = counts.into_iter().collect::<Vec<_>>();
    words.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
    words
        .into_iter()
        .take(max_words)
        .map(|(word, (count, _))| WordFrequency {
            word: word.to_string(),
            count,
        })
        .collect()
}

/// Places words along a spiral from the canvas centre, largest first. Words
/// that cannot fit even at the minimum size are dropped.
pub fn layout_words<F>(
    words: &[WordFrequency],
    mask: Option<&GrayImage>,
    config: &LayoutConfig,
    measure: F,
) -> Vec<PlacedWord>
where
    F: Fn(&str, f32) -> f32,
{
    let Some(max_count) = words.first().map(|word| word.count.max(1)) else {
        return Vec::new();
    };
    let mut grid = OccupancyGrid::new(config.width, config.height, mask);
    let mut placed = Vec::new();
    let mut last_size = config.max_font_size;

    for (rank, entry) in words.iter().enumerate() {
        let relative = entry.count as f32 / max_count as f32;
        let mut font_size = (config.max_font_size * (0.5 * relative + 0.5)).min(last_size);
        while font_size >= config.min_font_size {
            let width = measure(&entry.word, font_size) + config.margin * 2.0;
            let height = font_size * config.line_height + config.margin * 2.0;
            if let Some((x, y)) = find_position(&grid, config, width, height) {
                grid.occupy(x, y, width, height);
                placed.push(PlacedWord {
                    word: entry.word.clone(),
                    font_size,
                    x: x + config.margin,
                    y: y + config.margin,
                    width: width - config.margin * 2.0,
                    height: height - config.margin * 2.0,
                    rank,
                });
                last_size = font_size;
                break;
            }
            font_size *= config.shrink;
        }
    }
    placed
}

fn find_position(
    grid: &OccupancyGrid,
    config: &LayoutConfig,
    width: f32,
    height: f32,
) -> Option<(f32, f32)> {
    let canvas_w = config.width as f32;
    let canvas_h = config.height as f32;
    if width > canvas_w || height > canvas_h {
        return None;
    }
    let cx = canvas_w / 2.0;
    let cy = canvas_h / 2.0;
    let aspect = canvas_w / canvas_h;
    let max_radius = (cx / aspect).hypot(cy);
    let turn_spacing = CELL as f32 * 2.0;
    let step_px = CELL as f32;

    let mut theta = 0.0f32;
    loop {
        let radius = turn_spacing * theta / std::f32::consts::TAU;
        if radius > max_radius {
            return None;
        }
        let px = cx + radius * theta.cos() * aspect;
        let py = cy + radius * theta.sin();
        let x = px - width / 2.0;
        let y = py - height / 2.0;
        if grid.is_free(x, y, width, height) {
            return Some((x, y));
        }
        theta += (step_px / radius.max(1.0)).min(0.5);
    }
}

/// Coarse occupancy over `CELL`-sized squares with a summed-area table for
/// constant-time rectangle queries.
struct OccupancyGrid {
    cols: usize,
    rows: usize,
    width: f32,
    height: f32,
    cells: Vec<u8>,
    integral: Vec<u32>,
}

impl OccupancyGrid {
    fn new(width: u32, height: u32, mask: Option<&GrayImage>) -> Self {
        let cols = width.div_ceil(CELL) as usize;
        let rows = height.div_ceil(CELL) as usize;
        let mut cells = vec![0u8; cols * rows];
        if let Some(mask) = mask {
            let (mask_w, mask_h) = mask.dimensions();
            for y in 0..height.min(mask_h) {
                for x in 0..width.min(mask_w) {
                    if is_excluded(mask, x, y) {
                        cells[(y / CELL) as usize * cols + (x / CELL) as usize] = 1;
                    }
                }
            }
        }
        let mut grid = Self {
            cols,
            rows,
            width: width as f32,
            height: height as f32,
            cells,
            integral: vec![0; (cols + 1) * (rows + 1)],
        };
        grid.rebuild();
        grid
    }

    fn rebuild(&mut self) {
        let stride = self.cols + 1;
        for row in 0..self.rows {
            let mut row_sum = 0u32;
            for col in 0..self.cols {
                row_sum += u32::from(self.cells[row * self.cols + col]);
                self.integral[(row + 1) * stride + col + 1] =
                    self.integral[row * stride + col + 1] + row_sum;
            }
        }
    }

    fn cell_span(&self, x: f32, y: f32, w: f32, h: f32) -> (usize, usize, usize, usize) {
        let c0 = (x / CELL as f32).floor().max(0.0) as usize;
        let r0 = (y / CELL as f32).floor().max(0.0) as usize;
        let c1 = ((x + w) / CELL as f32).ceil() as usize;
        let r1 = ((y + h) / CELL as f32).ceil() as usize;
        (c0, r0, c1.min(self.cols), r1.min(self.rows))
    }

    fn is_free(&self, x: f32, y: f32, w: f32, h: f32) -> bool {
        if x < 0.0 || y < 0.0 || x + w > self.width || y + h > self.height {
            return false;
        }
        let (c0, r0, c1, r1) = self.cell_span(x, y, w, h);
        let stride = self.cols + 1;
        let total = self.integral[r1 * stride + c1] + self.integral[r0 * stride + c0];
        let minus = self.integral[r0 * stride + c1] + self.integral[r1 * stride + c0];
        total == minus
    }

    fn occupy(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (c0, r0, c1, r1) = self.cell_span(x, y, w, h);
        for row in r0..r1 {
            for col in c0..c1 {
                self.cells[row * self.cols + col] = 1;
            }
        }
        self.rebuild();
    }
}
