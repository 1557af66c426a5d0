use std::path::Path;

use image::{imageops, ImageFormat, Pixel, Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{MapConfig, MarkerStyle};
use crate::session::{SessionRecord, SessionStore};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("nothing has been rendered yet")]
    NotRendered,
}

/// A fully transparent surface sized for `map`
pub fn new_surface(map: &MapConfig) -> RgbaImage {
    RgbaImage::new(map.width, map.height)
}

pub fn load_background<P: AsRef<Path>>(path: P) -> Result<RgbaImage, RenderError> {
    let img = image::open(path.as_ref())?;
    Ok(img.to_rgba8())
}

/// Repaint `surface`: background at the origin, then one marker per point in order.
///
/// Every call starts from a cleared surface, so the result only depends on
/// the arguments.
#[instrument(skip_all, fields(points = points.len()))]
pub fn render_map(
    surface: &mut RgbaImage,
    background: &RgbaImage,
    points: &[SessionRecord],
    map: &MapConfig,
) {
    for pixel in surface.pixels_mut() {
        *pixel = Rgba([0, 0, 0, 0]);
    }
    imageops::replace(surface, background, 0, 0);

    for point in points {
        let center = map.transform.apply(point);
        draw_marker(surface, center.x, center.y, &map.marker);
    }
    debug!("map repainted");
}

/// Filled circle with a stroke centred on its edge, the way a 2D canvas
/// `arc` + `fill` + `stroke` would paint it. Pixels are sampled at their centres.
pub fn draw_marker(surface: &mut RgbaImage, cx: f64, cy: f64, style: &MarkerStyle) {
    if !cx.is_finite() || !cy.is_finite() {
        return;
    }

    let half_stroke = (style.stroke_width / 2.0).max(0.0);
    let outer = style.radius + half_stroke;
    let inner = (style.radius - half_stroke).max(0.0);
    let fill = Rgba(style.fill_color);
    let stroke = Rgba(style.stroke_color);

    let (width, height) = surface.dimensions();
    let x0 = ((cx - outer).floor() as i64).max(0);
    let y0 = ((cy - outer).floor() as i64).max(0);
    let x1 = ((cx + outer).ceil() as i64).min(width as i64 - 1);
    let y1 = ((cy + outer).ceil() as i64).min(height as i64 - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();

            let (x, y) = (x as u32, y as u32);
            if d <= style.radius {
                surface.get_pixel_mut(x, y).blend(&fill);
            }
            if half_stroke > 0.0 && d >= inner && d <= outer {
                surface.get_pixel_mut(x, y).blend(&stroke);
            }
        }
    }
}

/// The on-screen map: a surface, its background, and which store generation
/// it last painted.
///
/// Painting only happens once sessions are loaded and both the surface and
/// the background are present. Without a background nothing is ever drawn.
#[derive(Debug)]
pub struct MapView {
    map: MapConfig,
    surface: Option<RgbaImage>,
    background: Option<RgbaImage>,
    painted_generation: Option<u64>,
}

impl MapView {
    pub fn new(map: MapConfig) -> Self {
        Self {
            map,
            surface: None,
            background: None,
            painted_generation: None,
        }
    }

    pub fn map(&self) -> &MapConfig {
        &self.map
    }

    /// Allocate the drawing surface
    pub fn mount(&mut self) {
        if self.surface.is_none() {
            self.surface = Some(new_surface(&self.map));
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn set_background(&mut self, background: RgbaImage) {
        if background.dimensions() != (self.map.width, self.map.height) {
            warn!(
                image = ?background.dimensions(),
                surface = ?(self.map.width, self.map.height),
                "background size differs from the map surface"
            );
        }
        self.background = Some(background);
        self.painted_generation = None;
    }

    pub fn load_background<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RenderError> {
        let path = path.as_ref();
        match load_background(path) {
            Ok(img) => {
                info!(path = %path.display(), "loaded background map");
                self.set_background(img);
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "background map unavailable, nothing will be drawn");
                Err(e)
            }
        }
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Repaint if the store changed since the last paint. Returns whether it painted.
    pub fn refresh(&mut self, store: &SessionStore) -> bool {
        let Some(points) = store.sessions() else {
            return false;
        };
        if self.painted_generation == Some(store.generation()) {
            return false;
        }
        let (Some(surface), Some(background)) = (self.surface.as_mut(), self.background.as_ref())
        else {
            return false;
        };

        render_map(surface, background, points, &self.map);
        self.painted_generation = Some(store.generation());
        true
    }

    pub fn is_painted(&self) -> bool {
        self.painted_generation.is_some()
    }

    pub fn surface(&self) -> Option<&RgbaImage> {
        self.surface.as_ref()
    }

    /// Always written as PNG, whatever the extension says
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        let surface = self
            .surface
            .as_ref()
            .filter(|_| self.is_painted())
            .ok_or(RenderError::NotRendered)?;
        surface.save_with_format(path.as_ref(), ImageFormat::Png)?;
        info!(path = %path.as_ref().display(), "wrote rendered map");
        Ok(())
    }
}
