use geo::{Coord, LineString, Polygon};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KmlError {
    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
}

/// The parts of a KML Placemark the plan parser and the AOI resolver care about.
///
/// Namespace prefixes are ignored. `data` keeps `ExtendedData` entries (`Data`/`value` and
/// `SimpleData`) in document order. Rings that fail to parse leave a message in
/// `geometry_error` instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placemark {
    pub name: Option<String>,
    pub description: Option<String>,
    pub time_begin: Option<String>,
    pub time_end: Option<String>,
    pub data: Vec<(String, String)>,
    pub polygons: Vec<Polygon<f64>>,
    pub geometry_error: Option<String>,
}

#[derive(Default)]
struct PlacemarkBuilder {
    placemark: Placemark,
    data_name: Option<String>,
    simple_data_name: Option<String>,
    coordinates: String,
    ring: Option<LineString<f64>>,
    exterior: Option<LineString<f64>>,
    interiors: Vec<LineString<f64>>,
}

impl PlacemarkBuilder {
    fn start(&mut self, name: &str, element: &BytesStart) {
        match name {
            "Data" => self.data_name = attribute(element, "name"),
            "SimpleData" => self.simple_data_name = attribute(element, "name"),
            "coordinates" => self.coordinates.clear(),
            "Polygon" => {
                self.exterior = None;
                self.interiors.clear();
            }
            _ => {}
        }
    }

    fn text(&mut self, path: &[String], text: &str) {
        let Some(tag) = path.last() else { return };
        let parent = path.len().checked_sub(2).map(|i| path[i].as_str());
        let pm = &mut self.placemark;

        match tag.as_str() {
            "coordinates" => {
                self.coordinates.push(' ');
                self.coordinates.push_str(text);
            }
            "name" if parent == Some("Placemark") => pm.name = Some(text.trim().to_string()),
            "description" => pm.description.get_or_insert_with(String::new).push_str(text),
            "begin" => pm.time_begin = Some(text.trim().to_string()),
            "end" => pm.time_end = Some(text.trim().to_string()),
            "when" => {
                pm.time_begin.get_or_insert_with(|| text.trim().to_string());
                pm.time_end.get_or_insert_with(|| text.trim().to_string());
            }
            "value" if parent == Some("Data") => {
                if let Some(key) = &self.data_name {
                    pm.data.push((key.clone(), text.trim().to_string()));
                }
            }
            "SimpleData" => {
                if let Some(key) = &self.simple_data_name {
                    pm.data.push((key.clone(), text.trim().to_string()));
                }
            }
            _ => {}
        }
    }

    /// `path` no longer contains the element that just closed.
    fn end(&mut self, name: &str, path: &[String]) {
        let inside = |tag: &str| path.iter().any(|p| p == tag);

        match name {
            // Point and LineString coordinates are not area geometry.
            "coordinates" if path.last().is_some_and(|p| p == "LinearRing") => {
                match parse_coordinates(&self.coordinates) {
                    Ok(ring) => self.ring = Some(ring),
                    Err(e) => self.fail(e),
                }
            }
            "LinearRing" => {
                let Some(ring) = self.ring.take() else { return };
                if inside("innerBoundaryIs") {
                    self.interiors.push(ring);
                } else if inside("Polygon") {
                    self.exterior = Some(ring);
                } else {
                    self.placemark.polygons.push(Polygon::new(ring, Vec::new()));
                }
            }
            "Polygon" => match self.exterior.take() {
                Some(exterior) => {
                    let interiors = std::mem::take(&mut self.interiors);
                    self.placemark.polygons.push(Polygon::new(exterior, interiors));
                }
                None => self.fail("polygon without outer boundary".into()),
            },
            "Data" => self.data_name = None,
            "SimpleData" => self.simple_data_name = None,
            _ => {}
        }
    }

    fn fail(&mut self, message: String) {
        self.placemark.geometry_error.get_or_insert(message);
    }
}

/// Read every Placemark of a KML document.
///
/// Only broken XML is an error; placemarks with unusable content are returned as they are and
/// left for the caller to judge.
pub fn read_placemarks(xml: &str) -> Result<Vec<Placemark>, KmlError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut placemarks = Vec::new();
    let mut current: Option<PlacemarkBuilder> = None;

    loop {
        let event = reader.read_event().map_err(|source| KmlError::Xml {
            position: reader.buffer_position(),
            source,
        })?;

        match event {
            Event::Start(element) => {
                let name = local_name(&element);
                if name == "Placemark" {
                    current = Some(PlacemarkBuilder::default());
                } else if let Some(builder) = current.as_mut() {
                    builder.start(&name, &element);
                }
                path.push(name);
            }
            Event::Text(text) => {
                if let Some(builder) = current.as_mut() {
                    let text = text.unescape().map_err(|source| KmlError::Xml {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    builder.text(&path, &text);
                }
            }
            Event::CData(data) => {
                if let Some(builder) = current.as_mut() {
                    let bytes = data.into_inner();
                    builder.text(&path, &String::from_utf8_lossy(&bytes));
                }
            }
            Event::End(_) => {
                let name = path.pop().unwrap_or_default();
                if name == "Placemark" {
                    if let Some(builder) = current.take() {
                        placemarks.push(builder.placemark);
                    }
                } else if let Some(builder) = current.as_mut() {
                    builder.end(&name, &path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(placemarks)
}

/// Parse a KML `coordinates` payload: whitespace separated `lon,lat[,alt]` tuples.
pub fn parse_coordinates(text: &str) -> Result<LineString<f64>, String> {
    let mut coords = Vec::new();

    for tuple in text.split_whitespace() {
        let mut parts = tuple.split(',');
        let lon = parts.next().and_then(|v| v.parse::<f64>().ok());
        let lat = parts.next().and_then(|v| v.parse::<f64>().ok());
        match (lon, lat) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => coords.push(Coord { x, y }),
            _ => return Err(format!("invalid coordinate tuple '{}'", tuple)),
        }
    }

    if coords.len() < 3 {
        return Err(format!("ring needs at least 3 coordinates, got {}", coords.len()));
    }

    Ok(LineString::new(coords))
}

fn local_name(element: &BytesStart) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart, key: &str) -> Option<String> {
    element
        .try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
