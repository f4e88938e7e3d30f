use ratatui::layout::Rect;

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 5.0;

/// Globe radius in canvas units at scale 1. The canvas spans [-1, 1] vertically.
const BASE_RADIUS: f64 = 0.95;

/// Degrees of rotation per terminal cell dragged, at scale 1.
pub const DRAG_DEGREES_PER_CELL: f64 = 4.0;

/// Orthographic view of the sphere, rotated so `(lon0, lat0)` faces the viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Globe {
    pub lon0: f64,
    pub lat0: f64,
    pub scale: f64,
}

impl Default for Globe {
    fn default() -> Self {
        Self {
            lon0: 10.0,
            lat0: 25.0,
            scale: MIN_SCALE,
        }
    }
}

impl Globe {
    pub fn radius(&self) -> f64 {
        BASE_RADIUS * self.scale
    }

    /// Canvas position of a geographic point, or `None` on the far side.
    pub fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let (phi, lambda) = (lat.to_radians(), lon.to_radians());
        let (phi0, lambda0) = (self.lat0.to_radians(), self.lon0.to_radians());
        let dl = lambda - lambda0;

        let cos_c = phi0.sin() * phi.sin() + phi0.cos() * phi.cos() * dl.cos();
        if cos_c < 0.0 {
            return None;
        }
        let r = self.radius();
        let x = r * phi.cos() * dl.sin();
        let y = r * (phi0.cos() * phi.sin() - phi0.sin() * phi.cos() * dl.cos());
        Some((x, y))
    }

    /// Geographic point under a canvas position, or `None` outside the disc.
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let r = self.radius();
        let rho = (x * x + y * y).sqrt();
        if rho > r {
            return None;
        }
        if rho < f64::EPSILON {
            return Some((self.lon0, self.lat0));
        }
        let (phi0, lambda0) = (self.lat0.to_radians(), self.lon0.to_radians());
        let c = (rho / r).min(1.0).asin();
        let (sin_c, cos_c) = c.sin_cos();

        let phi = (cos_c * phi0.sin() + y * sin_c * phi0.cos() / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lambda = lambda0
            + (x * sin_c).atan2(rho * cos_c * phi0.cos() - y * sin_c * phi0.sin());
        Some((wrap_lon(lambda.to_degrees()), phi.to_degrees()))
    }

    pub fn rotate(&mut self, dlon: f64, dlat: f64) {
        self.lon0 = wrap_lon(self.lon0 + dlon);
        self.lat0 = (self.lat0 + dlat).clamp(-90.0, 90.0);
    }

    /// Rotation for a pointer drag of `(dx, dy)` cells. The surface follows the pointer.
    pub fn drag(&mut self, dx: i32, dy: i32) {
        let step = DRAG_DEGREES_PER_CELL / self.scale;
        self.rotate(-(dx as f64) * step, dy as f64 * step);
    }

    pub fn zoom(&mut self, factor: f64) {
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn center_on(&mut self, lon: f64, lat: f64) {
        self.lon0 = wrap_lon(lon);
        self.lat0 = lat.clamp(-90.0, 90.0);
    }
}

pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Maps terminal cells of a canvas area to canvas coordinates.
///
/// Cells are about twice as tall as they are wide, so the horizontal bounds
/// widen with the area's aspect ratio to keep the globe round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub area: Rect,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl Viewport {
    pub fn new(area: Rect) -> Self {
        let half_width = if area.height == 0 {
            1.0
        } else {
            area.width as f64 / (area.height as f64 * 2.0)
        };
        Self {
            area,
            x_bounds: [-half_width, half_width],
            y_bounds: [-1.0, 1.0],
        }
    }

    pub fn contains_cell(&self, col: u16, row: u16) -> bool {
        col >= self.area.x
            && col < self.area.x + self.area.width
            && row >= self.area.y
            && row < self.area.y + self.area.height
    }

    /// Canvas coordinates at the middle of a cell.
    pub fn cell_to_canvas(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        if !self.contains_cell(col, row) {
            return None;
        }
        let [xmin, xmax] = self.x_bounds;
        let [ymin, ymax] = self.y_bounds;
        let fx = (col - self.area.x) as f64 + 0.5;
        let fy = (row - self.area.y) as f64 + 0.5;
        let x = xmin + fx / self.area.width as f64 * (xmax - xmin);
        let y = ymax - fy / self.area.height as f64 * (ymax - ymin);
        Some((x, y))
    }

    pub fn center_cell(&self) -> (u16, u16) {
        (
            self.area.x + self.area.width / 2,
            self.area.y + self.area.height / 2,
        )
    }
}
