//! Map widget state: a base tile layer, a view center and accumulated markers.

use std::f64::consts::PI;

use serde::Serialize;

use crate::model::Coordinates;

/// Zoom level every update re-centers to.
pub const DEFAULT_ZOOM: u8 = 10;

/// Deepest zoom the OpenStreetMap tile servers render.
pub const MAX_ZOOM: u8 = 19;

pub const OSM_TILE_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Web Mercator stops being square past this latitude.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// An image-tile layer addressed by `{s}`, `{z}`, `{x}`, `{y}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub subdomains: Vec<char>,
    pub attribution: String,
}

impl TileLayer {
    pub fn openstreetmap() -> Self {
        Self {
            url_template: OSM_TILE_TEMPLATE.to_string(),
            subdomains: vec!['a', 'b', 'c'],
            attribution: OSM_ATTRIBUTION.to_string(),
        }
    }

    pub fn tile_url(&self, tile: TileId) -> String {
        let subdomain = if self.subdomains.is_empty() {
            String::new()
        } else {
            let idx = (tile.x as usize + tile.y as usize) % self.subdomains.len();
            self.subdomains[idx].to_string()
        };

        self.url_template
            .replace("{s}", &subdomain)
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

/// Slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileId {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileId {
    /// Tile containing `at` at `zoom`, clamped to [`MAX_ZOOM`].
    pub fn containing(at: Coordinates, zoom: u8) -> Self {
        let zoom = zoom.min(MAX_ZOOM);
        let n = f64::from(1u32 << zoom);
        let lat = at.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let lon = at.lon.clamp(-180.0, 180.0);

        let x = ((lon + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n).floor();

        let max = n - 1.0;
        Self {
            x: x.clamp(0.0, max) as u32,
            y: y.clamp(0.0, max) as u32,
            zoom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub position: Coordinates,
}

/// A live map: created once, then re-centered and annotated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    center: Coordinates,
    zoom: u8,
    tile_layer: TileLayer,
    markers: Vec<Marker>,
}

impl MapView {
    /// `zoom` is clamped to [`MAX_ZOOM`].
    pub fn new(center: Coordinates, zoom: u8, tile_layer: TileLayer) -> Self {
        Self {
            center,
            zoom: zoom.min(MAX_ZOOM),
            tile_layer,
            markers: Vec::new(),
        }
    }

    pub fn set_view(&mut self, center: Coordinates, zoom: u8) {
        self.center = center;
        self.zoom = zoom.min(MAX_ZOOM);
    }

    pub fn add_marker(&mut self, position: Coordinates) {
        self.markers.push(Marker { position });
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn tile_layer(&self) -> &TileLayer {
        &self.tile_layer
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn center_tile(&self) -> TileId {
        TileId::containing(self.center, self.zoom)
    }

    pub fn center_tile_url(&self) -> String {
        self.tile_layer.tile_url(self.center_tile())
    }
}

/// Lazily created map. Nothing exists until the first [`MapHandle::update`].
#[derive(Debug, Default)]
pub struct MapHandle {
    view: Option<MapView>,
}

impl MapHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Center the map on (`lat`, `lon`) and drop a marker there.
    ///
    /// The first call builds the view with the OpenStreetMap base layer.
    /// Previous markers are kept.
    pub fn update(&mut self, lat: f64, lon: f64) -> &MapView {
        let at = Coordinates::new(lat, lon);

        if let Some(view) = self.view.as_mut() {
            view.set_view(at, DEFAULT_ZOOM);
        }

        let view = self
            .view
            .get_or_insert_with(|| MapView::new(at, DEFAULT_ZOOM, TileLayer::openstreetmap()));
        view.add_marker(at);
        view
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.view.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_creates_view_with_base_layer() {
        let mut map = MapHandle::new();
        assert!(!map.is_initialized());

        let view = map.update(6.4541, 3.3947);
        assert_eq!(view.center(), Coordinates::new(6.4541, 3.3947));
        assert_eq!(view.zoom(), DEFAULT_ZOOM);
        assert_eq!(view.tile_layer().attribution, OSM_ATTRIBUTION);
        assert_eq!(view.markers().len(), 1);
    }

    #[test]
    fn second_update_recenters_and_keeps_markers() {
        let mut map = MapHandle::new();
        map.update(6.4541, 3.3947);
        map.update(51.5074, -0.1278);

        let view = map.view().expect("map initialized");
        assert_eq!(view.center(), Coordinates::new(51.5074, -0.1278));
        assert_eq!(view.zoom(), DEFAULT_ZOOM);
        assert_eq!(
            view.markers(),
            &[
                Marker {
                    position: Coordinates::new(6.4541, 3.3947)
                },
                Marker {
                    position: Coordinates::new(51.5074, -0.1278)
                },
            ]
        );
    }

    #[test]
    fn same_point_twice_still_adds_two_markers() {
        let mut map = MapHandle::new();
        map.update(1.0, 1.0);
        map.update(1.0, 1.0);
        assert_eq!(map.view().unwrap().markers().len(), 2);
    }

    #[test]
    fn tile_containing_known_points() {
        assert_eq!(
            TileId::containing(Coordinates::new(0.0, 0.0), 1),
            TileId { x: 1, y: 1, zoom: 1 }
        );
        // London, zoom 10.
        assert_eq!(
            TileId::containing(Coordinates::new(51.5074, -0.1278), 10),
            TileId {
                x: 511,
                y: 340,
                zoom: 10
            }
        );
        // Poles and the antimeridian stay inside the grid.
        let edge = TileId::containing(Coordinates::new(90.0, 180.0), 3);
        assert_eq!(
            edge,
            TileId {
                x: 7,
                y: 0,
                zoom: 3
            }
        );
    }

    #[test]
    fn zoom_beyond_tile_range_is_clamped() {
        let at = Coordinates::new(6.45, 3.39);
        assert_eq!(TileId::containing(at, 32).zoom, MAX_ZOOM);
        assert_eq!(TileId::containing(at, u8::MAX), TileId::containing(at, MAX_ZOOM));

        let mut view = MapView::new(at, 40, TileLayer::openstreetmap());
        assert_eq!(view.zoom(), MAX_ZOOM);
        view.set_view(at, 200);
        assert_eq!(view.zoom(), MAX_ZOOM);
        assert!(view.center_tile_url().contains("/19/"));
    }

    #[test]
    fn tile_url_expands_template() {
        let layer = TileLayer::openstreetmap();
        let url = layer.tile_url(TileId {
            x: 511,
            y: 340,
            zoom: 10,
        });
        // (511 + 340) % 3 == 2 -> "c"
        assert_eq!(url, "https://c.tile.openstreetmap.org/10/511/340.png");
    }
}
