//! Grid and extent value types shared with the collaborator seams.

/// Row-major grid of floating point samples over an area's pixel raster.
///
/// Used for coordinate grids and solar-geometry grids. Kept deliberately
/// small: the production logic only ever reads single samples, it never
/// iterates pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl Grid {
    /// Builds a grid from row-major values.
    ///
    /// Returns `None` when the value count does not match the dimensions.
    pub fn from_values(width: usize, height: usize, values: Vec<f64>) -> Option<Self> {
        if values.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            values,
        })
    }

    /// Builds a grid where every sample holds `value`.
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    /// Builds a grid by evaluating `f(x, y)` per sample.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            values,
        }
    }

    /// Grid width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample at pixel `(x, y)`. `None` outside the raster.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y * self.width + x).copied()
    }

    /// Sample at the raster midpoint, `(width / 2, height / 2)` with
    /// integer division.
    pub fn midpoint(&self) -> Option<f64> {
        self.get(self.width / 2, self.height / 2)
    }
}

/// Geographic bounding box in projection coordinates.
///
/// Carried on the scene-loading seam so a backend can restrict reading to
/// a sub-region. The controller itself always loads the full extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    /// Western bound.
    pub min_x: f64,
    /// Southern bound.
    pub min_y: f64,
    /// Eastern bound.
    pub max_x: f64,
    /// Northern bound.
    pub max_y: f64,
}
