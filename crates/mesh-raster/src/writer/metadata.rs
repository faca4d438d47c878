//! GDAL metadata XML carried in the `GDAL_METADATA` TIFF tag.
//!
//! ```xml
//! <GDALMetadata>
//!   <Item name="analysis_time">20190101 000000</Item>
//!   <Item name="DESCRIPTION" sample="0" role="description">water_level</Item>
//! </GDALMetadata>
//! ```

use std::collections::BTreeMap;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{RasterError, Result};

const ROOT: &[u8] = b"GDALMetadata";

/// File-level items plus per-band descriptions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GdalMetadata {
    pub items: BTreeMap<String, String>,
    /// Band description keyed by zero-based band index.
    pub descriptions: BTreeMap<usize, String>,
}

impl GdalMetadata {
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<GDALMetadata>\n");
        for (name, value) in &self.items {
            xml.push_str(&format!(
                "  <Item name=\"{}\">{}</Item>\n",
                escape(name.as_str()),
                escape(value.as_str())
            ));
        }
        for (band, description) in &self.descriptions {
            xml.push_str(&format!(
                "  <Item name=\"DESCRIPTION\" sample=\"{}\" role=\"description\">{}</Item>\n",
                band,
                escape(description.as_str())
            ));
        }
        xml.push_str("</GDALMetadata>");
        xml
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut metadata = Self::default();
        let mut current: Option<ItemAttrs> = None;
        let mut text = String::new();
        let mut closed = false;

        loop {
            match reader.read_event() {
                Ok(Event::Empty(e)) if e.name().as_ref() == ROOT => closed = true,
                Ok(Event::End(e)) if e.name().as_ref() == ROOT => closed = true,
                Ok(Event::Start(e)) if e.name().as_ref() == b"Item" => {
                    current = Some(ItemAttrs::from_start(&e)?);
                    text.clear();
                }
                Ok(Event::Empty(e)) if e.name().as_ref() == b"Item" => {
                    metadata.insert(ItemAttrs::from_start(&e)?, String::new());
                }
                Ok(Event::Text(t)) if current.is_some() => {
                    let value = t
                        .unescape()
                        .map_err(|e| RasterError::raster_read(format!("GDAL metadata: {}", e)))?;
                    text.push_str(&value);
                }
                Ok(Event::End(e)) if e.name().as_ref() == b"Item" => {
                    if let Some(attrs) = current.take() {
                        metadata.insert(attrs, std::mem::take(&mut text));
                    }
                }
                Ok(Event::Eof) => {
                    if current.is_some() || !closed {
                        return Err(RasterError::raster_read(
                            "GDAL metadata ends before the document is closed",
                        ));
                    }
                    break;
                }
                Err(e) => {
                    return Err(RasterError::raster_read(format!(
                        "GDAL metadata at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
        }

        Ok(metadata)
    }

    fn insert(&mut self, attrs: ItemAttrs, value: String) {
        match (attrs.sample, attrs.role.as_deref()) {
            (Some(band), Some("description")) => {
                self.descriptions.insert(band, value);
            }
            // other per-band items are not used
            (Some(_), _) => {}
            (None, _) => {
                self.items.insert(attrs.name, value);
            }
        }
    }
}

#[derive(Debug, Default)]
struct ItemAttrs {
    name: String,
    sample: Option<usize>,
    role: Option<String>,
}

impl ItemAttrs {
    fn from_start(e: &BytesStart) -> Result<Self> {
        let mut attrs = Self::default();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| RasterError::raster_read(format!("GDAL metadata: {}", e)))?;
            let value = attr
                .unescape_value()
                .map_err(|e| RasterError::raster_read(format!("GDAL metadata: {}", e)))?
                .into_owned();
            match attr.key.as_ref() {
                b"name" => attrs.name = value,
                b"sample" => {
                    attrs.sample = Some(value.parse().map_err(|_| {
                        RasterError::raster_read(format!("bad band index '{}'", value))
                    })?)
                }
                b"role" => attrs.role = Some(value),
                _ => {}
            }
        }
        Ok(attrs)
    }
}
