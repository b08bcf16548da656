/// Normalized correlation coefficient surface
///
/// Zero-mean normalized cross-correlation over RGB rasters, channels summed.
/// Window statistics come from integral tables; the cross term is an exact
/// integer dot product, so scores only lose precision in the final division.
use image::RgbImage;
use rayon::prelude::*;

const CHANNELS: usize = 3;

/// Per-position scores of a template slid over an image
pub(crate) struct CorrelationSurface {
    width: u32,
    height: u32,
    scores: Vec<f32>,
}

impl CorrelationSurface {
    /// Score every position where `template` fits entirely inside `image`.
    ///
    /// Returns `None` when the template is empty or larger than the image.
    pub(crate) fn compute(image: &RgbImage, template: &RgbImage) -> Option<Self> {
        let (iw, ih) = image.dimensions();
        let (tw, th) = template.dimensions();
        if tw == 0 || th == 0 || tw > iw || th > ih {
            return None;
        }

        let width = iw - tw + 1;
        let height = ih - th + 1;
        let stats = TemplateStats::new(template);
        let table = IntegralTable::new(image);

        let rows: Vec<Vec<f32>> = (0..height)
            .into_par_iter()
            .map(|y| {
                (0..width)
                    .map(|x| score_at(image, template, &stats, &table, x, y))
                    .collect()
            })
            .collect();

        Some(Self {
            width,
            height,
            scores: rows.into_iter().flatten().collect(),
        })
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> f32 {
        self.scores[(y * self.width + x) as usize]
    }

    /// Positions scoring at least `threshold`, row-major
    pub(crate) fn at_or_above(&self, threshold: f32) -> impl Iterator<Item = (u32, u32, f32)> + '_ {
        let width = self.width;
        self.scores
            .iter()
            .enumerate()
            .filter(move |(_, score)| **score >= threshold)
            .map(move |(i, score)| (i as u32 % width, i as u32 / width, *score))
    }

    /// Highest score and its position
    pub(crate) fn peak(&self) -> Option<(u32, u32, f32)> {
        self.scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, score)| (i as u32 % self.width, i as u32 / self.width, *score))
    }
}

struct TemplateStats {
    pixels: i128,
    sums: [u64; CHANNELS],
    /// n * sum(T^2) - sum(T)^2, summed over channels
    variance: i128,
}

impl TemplateStats {
    fn new(template: &RgbImage) -> Self {
        let mut sums = [0u64; CHANNELS];
        let mut squares = 0u64;
        for pixel in template.pixels() {
            for (c, &v) in pixel.0.iter().enumerate() {
                sums[c] += v as u64;
                squares += v as u64 * v as u64;
            }
        }
        let pixels = template.width() as i128 * template.height() as i128;
        Self {
            pixels,
            sums,
            variance: scaled_variance(pixels, &sums, squares),
        }
    }
}

fn scaled_variance(pixels: i128, sums: &[u64; CHANNELS], squares: u64) -> i128 {
    pixels * squares as i128 - sums.iter().map(|&s| s as i128 * s as i128).sum::<i128>()
}

/// Summed-area tables of channel values and squared values
struct IntegralTable {
    stride: usize,
    sums: Vec<[u64; CHANNELS]>,
    squares: Vec<u64>,
}

impl IntegralTable {
    fn new(image: &RgbImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sums = vec![[0u64; CHANNELS]; stride * (h + 1)];
        let mut squares = vec![0u64; stride * (h + 1)];

        for (y, row) in image.as_raw().chunks_exact(w * CHANNELS).enumerate() {
            let mut row_sums = [0u64; CHANNELS];
            let mut row_squares = 0u64;
            for (x, pixel) in row.chunks_exact(CHANNELS).enumerate() {
                for (c, &v) in pixel.iter().enumerate() {
                    row_sums[c] += v as u64;
                    row_squares += v as u64 * v as u64;
                }
                let idx = (y + 1) * stride + x + 1;
                let above = y * stride + x + 1;
                for c in 0..CHANNELS {
                    sums[idx][c] = sums[above][c] + row_sums[c];
                }
                squares[idx] = squares[above] + row_squares;
            }
        }

        Self {
            stride,
            sums,
            squares,
        }
    }

    /// Channel sums and total squared sum of the window at (x, y) sized w x h
    fn window(&self, x: u32, y: u32, w: u32, h: u32) -> ([u64; CHANNELS], u64) {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        let a = y0 * self.stride + x0;
        let b = y0 * self.stride + x1;
        let c = y1 * self.stride + x0;
        let d = y1 * self.stride + x1;

        let mut sums = [0u64; CHANNELS];
        for (ch, sum) in sums.iter_mut().enumerate() {
            *sum = (self.sums[d][ch] + self.sums[a][ch]) - (self.sums[b][ch] + self.sums[c][ch]);
        }
        let squares = (self.squares[d] + self.squares[a]) - (self.squares[b] + self.squares[c]);
        (sums, squares)
    }
}

fn score_at(
    image: &RgbImage,
    template: &RgbImage,
    stats: &TemplateStats,
    table: &IntegralTable,
    x: u32,
    y: u32,
) -> f32 {
    let (tw, th) = template.dimensions();
    let (window_sums, window_squares) = table.window(x, y, tw, th);
    let window_variance = scaled_variance(stats.pixels, &window_sums, window_squares);

    if stats.variance == 0 || window_variance == 0 {
        // Flat regions have no correlation structure; only identical flats match
        return if stats.variance == 0 && window_variance == 0 && stats.sums == window_sums {
            1.0
        } else {
            0.0
        };
    }

    let image_raw = image.as_raw();
    let template_raw = template.as_raw();
    let image_stride = image.width() as usize * CHANNELS;
    let row_len = tw as usize * CHANNELS;
    let x_offset = x as usize * CHANNELS;

    let mut cross = 0u64;
    for ty in 0..th as usize {
        let start = (y as usize + ty) * image_stride + x_offset;
        let image_row = &image_raw[start..start + row_len];
        let template_row = &template_raw[ty * row_len..(ty + 1) * row_len];
        cross += image_row
            .iter()
            .zip(template_row)
            .map(|(&a, &b)| a as u32 * b as u32)
            .map(u64::from)
            .sum::<u64>();
    }

    let mean_product: i128 = stats
        .sums
        .iter()
        .zip(window_sums.iter())
        .map(|(&t, &w)| t as i128 * w as i128)
        .sum();
    let numerator = stats.pixels * cross as i128 - mean_product;
    let denominator = (stats.variance as f64 * window_variance as f64).sqrt();

    ((numerator as f64 / denominator) as f32).clamp(-1.0, 1.0)
}
