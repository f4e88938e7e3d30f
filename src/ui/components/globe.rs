use std::collections::BTreeMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Circle, Points};
use ratatui::widgets::{Block, Widget};

use crate::geo::dataset::Atlas;
use crate::geo::projection::{Globe, Viewport};
use crate::ui::theme::Theme;

const GRATICULE_STEP: f64 = 30.0;
const GRATICULE_SAMPLE: f64 = 2.0;

/// Chooses the fill of a country: `(atlas index, hovered)`.
pub type PaintFn<'a> = Box<dyn Fn(usize, bool) -> Color + 'a>;

pub struct GlobeView<'a> {
    pub atlas: Option<&'a Atlas>,
    pub globe: &'a Globe,
    pub theme: &'a Theme,
    pub title: String,
    pub hovered: Option<usize>,
    pub crosshair: bool,
    paint: PaintFn<'a>,
}

impl<'a> GlobeView<'a> {
    pub fn new(atlas: Option<&'a Atlas>, globe: &'a Globe, theme: &'a Theme) -> Self {
        Self {
            atlas,
            globe,
            theme,
            title: String::new(),
            hovered: None,
            crosshair: true,
            paint: Box::new(move |_, hovered| {
                if hovered {
                    theme.colors.land_hover()
                } else {
                    theme.colors.land()
                }
            }),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn hovered(mut self, hovered: Option<usize>) -> Self {
        self.hovered = hovered;
        self
    }

    pub fn crosshair(mut self, crosshair: bool) -> Self {
        self.crosshair = crosshair;
        self
    }

    pub fn paint(mut self, paint: impl Fn(usize, bool) -> Color + 'a) -> Self {
        self.paint = Box::new(paint);
        self
    }
}

/// The area a [`GlobeView`] draws the sphere into, inside its border.
pub fn canvas_area(area: Rect) -> Rect {
    Block::bordered().inner(area)
}

/// Canvas coordinates at the centre of every braille dot of `viewport`.
pub fn dot_samples(viewport: &Viewport) -> impl Iterator<Item = (f64, f64)> + '_ {
    let cols = viewport.area.width as usize * 2;
    let rows = viewport.area.height as usize * 4;
    let [xmin, xmax] = viewport.x_bounds;
    let [ymin, ymax] = viewport.y_bounds;
    (0..rows).flat_map(move |j| {
        let y = ymax - (j as f64 + 0.5) / rows as f64 * (ymax - ymin);
        (0..cols).map(move |i| (xmin + (i as f64 + 0.5) / cols as f64 * (xmax - xmin), y))
    })
}

fn graticule_points(globe: &Globe) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    let mut lon = -180.0;
    while lon < 180.0 {
        let mut lat = -90.0;
        while lat <= 90.0 {
            points.extend(globe.project(lon, lat));
            lat += GRATICULE_SAMPLE;
        }
        lon += GRATICULE_STEP;
    }
    let mut lat = -60.0;
    while lat <= 60.0 {
        let mut lon = -180.0;
        while lon < 180.0 {
            points.extend(globe.project(lon, lat));
            lon += GRATICULE_SAMPLE;
        }
        lat += GRATICULE_STEP;
    }
    points
}

impl Widget for GlobeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let mut block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        if !self.title.is_empty() {
            block = block.title(format!(" {} ", self.title));
        }
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let viewport = Viewport::new(inner);
        let mut ocean = Vec::new();
        let mut land: BTreeMap<usize, Vec<(f64, f64)>> = BTreeMap::new();
        for (x, y) in dot_samples(&viewport) {
            let Some((lon, lat)) = self.globe.invert(x, y) else {
                continue;
            };
            match self.atlas.and_then(|a| a.hit_test(lon, lat)) {
                Some(idx) => land.entry(idx).or_default().push((x, y)),
                None => ocean.push((x, y)),
            }
        }
        let land: Vec<(Color, Vec<(f64, f64)>)> = land
            .into_iter()
            .map(|(idx, coords)| ((self.paint)(idx, self.hovered == Some(idx)), coords))
            .collect();
        let graticule = graticule_points(self.globe);
        let radius = self.globe.radius();

        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds(viewport.x_bounds)
            .y_bounds(viewport.y_bounds)
            .background_color(colors.bg())
            .paint(|ctx| {
                ctx.draw(&Points {
                    coords: &ocean,
                    color: colors.ocean(),
                });
                ctx.draw(&Points {
                    coords: &graticule,
                    color: colors.graticule(),
                });
                for (color, coords) in &land {
                    ctx.draw(&Points {
                        coords,
                        color: *color,
                    });
                }
                ctx.layer();
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius,
                    color: colors.border_focused(),
                });
                if self.crosshair {
                    ctx.print(
                        0.0,
                        0.0,
                        Span::styled(
                            "\u{253c}",
                            Style::default()
                                .fg(colors.crosshair())
                                .add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            })
            .render(inner, buf);
    }
}
