//! Little-endian classic TIFF encoding and decoding of float64 rasters.
//!
//! Layout: 8-byte header, then the strips of band 0, band 1, ... (planar
//! configuration 2), then a single IFD followed by its out-of-line values.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use mesh_common::{CrsCode, GeoTransform};
use rayon::prelude::*;

use crate::config::Compression;
use crate::error::{RasterError, Result};
use crate::types::{OutputRaster, RasterBand};
use crate::writer::metadata::GdalMetadata;

/// Target uncompressed size of one strip.
const STRIP_TARGET_BYTES: usize = 64 * 1024;

const BYTES_PER_SAMPLE: usize = 8;

mod tag {
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC: u16 = 262;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const PLANAR_CONFIGURATION: u16 = 284;
    pub const EXTRA_SAMPLES: u16 = 338;
    pub const SAMPLE_FORMAT: u16 = 339;
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const GEO_KEY_DIRECTORY: u16 = 34735;
    pub const GDAL_METADATA: u16 = 42112;
    pub const GDAL_NODATA: u16 = 42113;
}

mod geokey {
    pub const MODEL_TYPE: u16 = 1024;
    pub const RASTER_TYPE: u16 = 1025;
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const PROJECTED_CS_TYPE: u16 = 3072;

    pub const MODEL_PROJECTED: u16 = 1;
    pub const MODEL_GEOGRAPHIC: u16 = 2;
    pub const RASTER_PIXEL_IS_AREA: u16 = 1;
}

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_DOUBLE: u16 = 12;

const SAMPLE_FORMAT_FLOAT: u64 = 3;
const PHOTOMETRIC_MIN_IS_BLACK: u16 = 1;
const PLANAR_SEPARATE: u16 = 2;

// =============================================================================
// Encoding
// =============================================================================

enum Values {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Double(Vec<f64>),
    Ascii(String),
}

struct Entry {
    tag: u16,
    values: Values,
}

impl Entry {
    fn short(tag: u16, values: Vec<u16>) -> Self {
        Self {
            tag,
            values: Values::Short(values),
        }
    }

    fn long(tag: u16, values: Vec<u32>) -> Self {
        Self {
            tag,
            values: Values::Long(values),
        }
    }

    fn double(tag: u16, values: Vec<f64>) -> Self {
        Self {
            tag,
            values: Values::Double(values),
        }
    }

    fn ascii(tag: u16, value: String) -> Self {
        Self {
            tag,
            values: Values::Ascii(value),
        }
    }

    /// Field type, value count and little-endian value bytes.
    fn encode(&self) -> (u16, usize, Vec<u8>) {
        match &self.values {
            Values::Short(v) => (TYPE_SHORT, v.len(), v.iter().flat_map(|x| x.to_le_bytes()).collect()),
            Values::Long(v) => (TYPE_LONG, v.len(), v.iter().flat_map(|x| x.to_le_bytes()).collect()),
            Values::Double(v) => (TYPE_DOUBLE, v.len(), v.iter().flat_map(|x| x.to_le_bytes()).collect()),
            Values::Ascii(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                (TYPE_ASCII, bytes.len(), bytes)
            }
        }
    }
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| RasterError::raster_write(format!("{} ({}) exceeds classic TIFF limits", what, value)))
}

/// Rows per strip so that one strip stays near [`STRIP_TARGET_BYTES`].
fn rows_per_strip(width: usize, height: usize) -> usize {
    (STRIP_TARGET_BYTES / (width * BYTES_PER_SAMPLE)).clamp(1, height.max(1))
}

fn encode_strip(samples: &[f64], compression: Compression) -> Result<Vec<u8>> {
    let raw: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
    match compression {
        Compression::None => Ok(raw),
        Compression::Deflate => {
            let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder
                .write_all(&raw)
                .map_err(|e| RasterError::raster_write(format!("strip compression failed: {}", e)))?;
            encoder
                .finish()
                .map_err(|e| RasterError::raster_write(format!("strip compression failed: {}", e)))
        }
    }
}

fn geo_key_directory(crs: CrsCode) -> Vec<u16> {
    let (model, key) = if crs.is_geographic() {
        (geokey::MODEL_GEOGRAPHIC, geokey::GEOGRAPHIC_TYPE)
    } else {
        (geokey::MODEL_PROJECTED, geokey::PROJECTED_CS_TYPE)
    };
    vec![
        1, 1, 0, 3, // version, revision, minor revision, key count
        geokey::MODEL_TYPE, 0, 1, model,
        geokey::RASTER_TYPE, 0, 1, geokey::RASTER_PIXEL_IS_AREA,
        key, 0, 1, crs.epsg(),
    ]
}

/// Encode a raster as a GeoTIFF byte stream.
pub fn encode_geotiff(raster: &OutputRaster, compression: Compression) -> Result<Vec<u8>> {
    let width = raster.width();
    let height = raster.height();
    let band_count = raster.bands().len();
    let samples = u16::try_from(band_count)
        .map_err(|_| RasterError::raster_write(format!("{} bands is too many", band_count)))?;

    let rows = rows_per_strip(width, height);
    let strip_len = rows * width;

    let chunks: Vec<&[f64]> = raster
        .bands()
        .iter()
        .flat_map(|band| band.data().chunks(strip_len))
        .collect();
    let strips = chunks
        .par_iter()
        .map(|chunk| encode_strip(chunk, compression))
        .collect::<Result<Vec<_>>>()?;

    let mut buf = Vec::with_capacity(8 + strips.iter().map(Vec::len).sum::<usize>());
    buf.extend_from_slice(b"II");
    buf.extend_from_slice(&42u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());

    let mut offsets = Vec::with_capacity(strips.len());
    let mut byte_counts = Vec::with_capacity(strips.len());
    for strip in &strips {
        offsets.push(to_u32(buf.len(), "strip offset")?);
        byte_counts.push(to_u32(strip.len(), "strip size")?);
        buf.extend_from_slice(strip);
    }

    // ASCII tags end at the first NUL
    if let Some((key, _)) = raster
        .tags
        .iter()
        .find(|(k, v)| k.contains('\0') || v.contains('\0'))
    {
        return Err(RasterError::raster_write(format!(
            "tag '{}' contains a NUL byte",
            key.escape_debug()
        )));
    }
    if let Some(band) = raster.bands().iter().find(|b| b.name().contains('\0')) {
        return Err(RasterError::raster_write(format!(
            "band name '{}' contains a NUL byte",
            band.name().escape_debug()
        )));
    }

    let metadata = GdalMetadata {
        items: raster.tags.clone(),
        descriptions: raster
            .bands()
            .iter()
            .enumerate()
            .map(|(i, band)| (i, band.name().to_string()))
            .collect(),
    };

    let t = &raster.transform;
    let mut entries = vec![
        Entry::long(tag::IMAGE_WIDTH, vec![to_u32(width, "width")?]),
        Entry::long(tag::IMAGE_LENGTH, vec![to_u32(height, "height")?]),
        Entry::short(tag::BITS_PER_SAMPLE, vec![64; band_count]),
        Entry::short(tag::COMPRESSION, vec![compression.tiff_code()]),
        Entry::short(tag::PHOTOMETRIC, vec![PHOTOMETRIC_MIN_IS_BLACK]),
        Entry::long(tag::STRIP_OFFSETS, offsets),
        Entry::short(tag::SAMPLES_PER_PIXEL, vec![samples]),
        Entry::long(tag::ROWS_PER_STRIP, vec![to_u32(rows, "rows per strip")?]),
        Entry::long(tag::STRIP_BYTE_COUNTS, byte_counts),
        Entry::short(tag::PLANAR_CONFIGURATION, vec![PLANAR_SEPARATE]),
        Entry::short(tag::SAMPLE_FORMAT, vec![SAMPLE_FORMAT_FLOAT as u16; band_count]),
        Entry::double(tag::MODEL_PIXEL_SCALE, vec![t.pixel_width, -t.pixel_height, 0.0]),
        Entry::double(tag::MODEL_TIEPOINT, vec![0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0]),
        Entry::short(tag::GEO_KEY_DIRECTORY, geo_key_directory(raster.crs)),
        Entry::ascii(tag::GDAL_METADATA, metadata.to_xml()),
    ];
    if band_count > 1 {
        // unspecified extra samples
        entries.push(Entry::short(tag::EXTRA_SAMPLES, vec![0; band_count - 1]));
    }
    if let Some(nodata) = raster.nodata {
        entries.push(Entry::ascii(tag::GDAL_NODATA, nodata.to_string()));
    }
    entries.sort_by_key(|e| e.tag);

    if buf.len() % 2 == 1 {
        buf.push(0);
    }
    let ifd_offset = buf.len();
    let data_start = ifd_offset + 2 + entries.len() * 12 + 4;
    let mut data_area = Vec::new();

    buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in &entries {
        let (field_type, count, bytes) = entry.encode();
        buf.extend_from_slice(&entry.tag.to_le_bytes());
        buf.extend_from_slice(&field_type.to_le_bytes());
        buf.extend_from_slice(&to_u32(count, "tag value count")?.to_le_bytes());
        if bytes.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..bytes.len()].copy_from_slice(&bytes);
            buf.extend_from_slice(&inline);
        } else {
            if data_area.len() % 2 == 1 {
                data_area.push(0);
            }
            let offset = to_u32(data_start + data_area.len(), "tag offset")?;
            buf.extend_from_slice(&offset.to_le_bytes());
            data_area.extend_from_slice(&bytes);
        }
    }
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&data_area);
    to_u32(buf.len(), "file size")?;

    let ifd = to_u32(ifd_offset, "IFD offset")?.to_le_bytes();
    buf[4..8].copy_from_slice(&ifd);

    Ok(buf)
}

// =============================================================================
// Decoding
// =============================================================================

#[derive(Debug)]
enum Field {
    Unsigned(Vec<u64>),
    Double(Vec<f64>),
    Ascii(String),
}

fn read_err(msg: impl Into<String>) -> RasterError {
    RasterError::raster_read(msg)
}

fn slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| read_err(format!("{} bytes at offset {} run past end of file", len, offset)))
}

fn u16_at(bytes: &[u8], offset: usize) -> Result<u16> {
    let b = slice(bytes, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn u32_at(bytes: &[u8], offset: usize) -> Result<u32> {
    let b = slice(bytes, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn f64_from(chunk: &[u8]) -> f64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(chunk);
    f64::from_le_bytes(b)
}

fn type_size(field_type: u16) -> Option<usize> {
    match field_type {
        TYPE_BYTE | TYPE_ASCII => Some(1),
        TYPE_SHORT => Some(2),
        TYPE_LONG => Some(4),
        TYPE_DOUBLE => Some(8),
        _ => None,
    }
}

fn read_ifd(bytes: &[u8]) -> Result<BTreeMap<u16, Field>> {
    let order = slice(bytes, 0, 2)?;
    if order != b"II" {
        return Err(read_err("only little-endian TIFF is supported"));
    }
    match u16_at(bytes, 2)? {
        42 => {}
        43 => return Err(read_err("BigTIFF is not supported")),
        other => return Err(read_err(format!("not a TIFF file (magic {})", other))),
    }

    let ifd = u32_at(bytes, 4)? as usize;
    let count = u16_at(bytes, ifd)? as usize;
    let mut fields = BTreeMap::new();

    for i in 0..count {
        let entry = ifd + 2 + i * 12;
        let tag = u16_at(bytes, entry)?;
        let field_type = u16_at(bytes, entry + 2)?;
        let n = u32_at(bytes, entry + 4)? as usize;

        let Some(size) = type_size(field_type) else {
            continue;
        };
        let len = size
            .checked_mul(n)
            .ok_or_else(|| read_err(format!("tag {} is too large", tag)))?;
        let data = if len <= 4 {
            slice(bytes, entry + 8, len)?
        } else {
            slice(bytes, u32_at(bytes, entry + 8)? as usize, len)?
        };

        let field = match field_type {
            TYPE_BYTE => Field::Unsigned(data.iter().map(|&b| b as u64).collect()),
            TYPE_SHORT => Field::Unsigned(
                data.chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]) as u64)
                    .collect(),
            ),
            TYPE_LONG => Field::Unsigned(
                data.chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as u64)
                    .collect(),
            ),
            TYPE_DOUBLE => Field::Double(data.chunks_exact(8).map(f64_from).collect()),
            _ => {
                let text = data.split(|&b| b == 0).next().unwrap_or_default();
                Field::Ascii(
                    String::from_utf8(text.to_vec())
                        .map_err(|_| read_err(format!("tag {} is not valid UTF-8", tag)))?,
                )
            }
        };
        fields.insert(tag, field);
    }

    Ok(fields)
}

fn unsigned<'a>(fields: &'a BTreeMap<u16, Field>, tag: u16) -> Result<&'a [u64]> {
    match fields.get(&tag) {
        Some(Field::Unsigned(v)) if !v.is_empty() => Ok(v),
        _ => Err(read_err(format!("missing or invalid tag {}", tag))),
    }
}

fn doubles<'a>(fields: &'a BTreeMap<u16, Field>, tag: u16, min_len: usize) -> Result<&'a [f64]> {
    match fields.get(&tag) {
        Some(Field::Double(v)) if v.len() >= min_len => Ok(v),
        _ => Err(read_err(format!("missing or invalid tag {}", tag))),
    }
}

fn ascii(fields: &BTreeMap<u16, Field>, tag: u16) -> Option<&str> {
    match fields.get(&tag) {
        Some(Field::Ascii(s)) => Some(s),
        _ => None,
    }
}

fn first(fields: &BTreeMap<u16, Field>, tag: u16, default: u64) -> Result<u64> {
    match fields.get(&tag) {
        None => Ok(default),
        Some(_) => Ok(unsigned(fields, tag)?[0]),
    }
}

fn crs_from_geo_keys(keys: &[u64]) -> Result<CrsCode> {
    if keys.len() < 4 {
        return Err(read_err("GeoKeyDirectory is truncated"));
    }
    for key in keys[4..].chunks_exact(4).take(keys[3] as usize) {
        let (id, location, value) = (key[0] as u16, key[1], key[3]);
        if location == 0 && (id == geokey::GEOGRAPHIC_TYPE || id == geokey::PROJECTED_CS_TYPE) {
            return CrsCode::from_epsg(value as u16).map_err(|e| read_err(e.to_string()));
        }
    }
    Err(read_err("GeoKeyDirectory names no EPSG code"))
}

fn decode_strip(data: &[u8], compression: u64, expected: usize) -> Result<Vec<u8>> {
    let raw = match compression {
        1 => data.to_vec(),
        8 | 32946 => {
            let mut out = Vec::with_capacity(expected);
            flate2::read::ZlibDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| read_err(format!("strip decompression failed: {}", e)))?;
            out
        }
        other => return Err(read_err(format!("unsupported compression {}", other))),
    };
    if raw.len() < expected {
        return Err(read_err(format!(
            "strip holds {} bytes, expected {}",
            raw.len(),
            expected
        )));
    }
    Ok(raw)
}

/// Decode a GeoTIFF written by [`encode_geotiff`] (or any float64, planar,
/// strip-organised little-endian GeoTIFF).
pub fn decode_geotiff(bytes: &[u8]) -> Result<OutputRaster> {
    let fields = read_ifd(bytes)?;

    let width = unsigned(&fields, tag::IMAGE_WIDTH)?[0] as usize;
    let height = unsigned(&fields, tag::IMAGE_LENGTH)?[0] as usize;
    let band_count = first(&fields, tag::SAMPLES_PER_PIXEL, 1)? as usize;
    let compression = first(&fields, tag::COMPRESSION, 1)?;
    let planar = first(&fields, tag::PLANAR_CONFIGURATION, 1)?;
    let rows = (first(&fields, tag::ROWS_PER_STRIP, height as u64)? as usize).clamp(1, height.max(1));

    if unsigned(&fields, tag::BITS_PER_SAMPLE)?.iter().any(|&b| b != 64) {
        return Err(read_err("only 64-bit samples are supported"));
    }
    if unsigned(&fields, tag::SAMPLE_FORMAT)?.iter().any(|&f| f != SAMPLE_FORMAT_FLOAT) {
        return Err(read_err("only floating-point samples are supported"));
    }
    if band_count > 1 && planar != PLANAR_SEPARATE as u64 {
        return Err(read_err("only planar configuration 2 is supported"));
    }

    let offsets = unsigned(&fields, tag::STRIP_OFFSETS)?;
    let byte_counts = unsigned(&fields, tag::STRIP_BYTE_COUNTS)?;
    let strips_per_band = height.div_ceil(rows);
    if offsets.len() != band_count * strips_per_band || byte_counts.len() != offsets.len() {
        return Err(read_err(format!(
            "expected {} strips, found {} offsets and {} byte counts",
            band_count * strips_per_band,
            offsets.len(),
            byte_counts.len()
        )));
    }

    let metadata = match ascii(&fields, tag::GDAL_METADATA) {
        Some(xml) => GdalMetadata::parse(xml)?,
        None => GdalMetadata::default(),
    };

    let mut bands = Vec::with_capacity(band_count);
    for b in 0..band_count {
        let mut data = Vec::with_capacity(width * height);
        for s in 0..strips_per_band {
            let i = b * strips_per_band + s;
            let strip_rows = rows.min(height - s * rows);
            let expected = strip_rows * width * BYTES_PER_SAMPLE;
            let stored = slice(bytes, offsets[i] as usize, byte_counts[i] as usize)?;
            let raw = decode_strip(stored, compression, expected)?;
            data.extend(raw[..expected].chunks_exact(BYTES_PER_SAMPLE).map(f64_from));
        }
        let name = metadata
            .descriptions
            .get(&b)
            .cloned()
            .unwrap_or_else(|| format!("band_{}", b + 1));
        bands.push(RasterBand::new(name, width, height, data)?);
    }

    let scale = doubles(&fields, tag::MODEL_PIXEL_SCALE, 2)?;
    let tie = doubles(&fields, tag::MODEL_TIEPOINT, 6)?;
    let transform = GeoTransform {
        origin_x: tie[3] - tie[0] * scale[0],
        pixel_width: scale[0],
        origin_y: tie[4] + tie[1] * scale[1],
        pixel_height: -scale[1],
    };
    let crs = crs_from_geo_keys(unsigned(&fields, tag::GEO_KEY_DIRECTORY)?)?;

    let nodata = match ascii(&fields, tag::GDAL_NODATA) {
        Some(s) => Some(
            s.trim()
                .parse::<f64>()
                .map_err(|_| read_err(format!("bad GDAL_NODATA '{}'", s)))?,
        ),
        None => None,
    };

    OutputRaster::new(bands, transform, crs, metadata.items, nodata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_common::BoundingBox;

    fn sample_raster(width: usize, height: usize) -> OutputRaster {
        let a: Vec<f64> = (0..width * height).map(|i| i as f64 * 0.5).collect();
        let b: Vec<f64> = (0..width * height)
            .map(|i| if i % 7 == 0 { f64::NAN } else { -(i as f64) })
            .collect();
        let bands = vec![
            RasterBand::new("water_level", width, height, a).unwrap(),
            RasterBand::new("boundary_mask", width, height, b).unwrap(),
        ];
        let transform =
            GeoTransform::from_bounds(&BoundingBox::new(160.0, -10.0, 200.0, 10.0), width, height);
        let mut tags = BTreeMap::new();
        tags.insert("analysis_time".to_string(), "20190101 000000".to_string());
        OutputRaster::new(bands, transform, CrsCode::Epsg4326, tags, Some(-9999.0)).unwrap()
    }

    fn assert_same(a: &OutputRaster, b: &OutputRaster) {
        assert_eq!(a.transform, b.transform);
        assert_eq!(a.crs, b.crs);
        assert_eq!(a.tags, b.tags);
        assert_eq!(a.nodata, b.nodata);
        assert_eq!(a.band_names(), b.band_names());
        for (x, y) in a.bands().iter().zip(b.bands()) {
            assert_eq!(x.shape(), y.shape());
            for (p, q) in x.data().iter().zip(y.data()) {
                assert_eq!(p.to_bits(), q.to_bits());
            }
        }
    }

    #[test]
    fn test_header_and_ifd_offset() {
        let bytes = encode_geotiff(&sample_raster(4, 3), Compression::None).unwrap();
        assert_eq!(&bytes[0..4], &[b'I', b'I', 42, 0]);
        // one uncompressed strip per band, directly after the header
        let ifd = u32_at(&bytes, 4).unwrap() as usize;
        assert_eq!(ifd, 8 + 2 * 4 * 3 * 8);
    }

    #[test]
    fn test_round_trip_uncompressed() {
        let raster = sample_raster(5, 4);
        let decoded = decode_geotiff(&encode_geotiff(&raster, Compression::None).unwrap()).unwrap();
        assert_same(&raster, &decoded);
    }

    #[test]
    fn test_round_trip_deflate_multi_strip() {
        // 2000 columns gives 4 rows per strip, so 10 rows span 3 strips
        let raster = sample_raster(2000, 10);
        let bytes = encode_geotiff(&raster, Compression::Deflate).unwrap();
        let fields = read_ifd(&bytes).unwrap();
        assert_eq!(unsigned(&fields, tag::STRIP_OFFSETS).unwrap().len(), 6);
        assert_eq!(unsigned(&fields, tag::COMPRESSION).unwrap(), &[8]);
        assert_same(&raster, &decode_geotiff(&bytes).unwrap());
    }

    #[test]
    fn test_geo_keys() {
        let bytes = encode_geotiff(&sample_raster(2, 2), Compression::None).unwrap();
        let fields = read_ifd(&bytes).unwrap();
        let keys = unsigned(&fields, tag::GEO_KEY_DIRECTORY).unwrap();
        assert_eq!(&keys[4..8], &[1024, 0, 1, 2]);
        assert_eq!(&keys[12..16], &[2048, 0, 1, 4326]);
        assert_eq!(ascii(&fields, tag::GDAL_NODATA), Some("-9999"));
    }

    #[test]
    fn test_projected_crs_round_trip() {
        let mut raster = sample_raster(2, 2);
        raster.crs = CrsCode::Epsg3857;
        let decoded = decode_geotiff(&encode_geotiff(&raster, Compression::None).unwrap()).unwrap();
        assert_eq!(decoded.crs, CrsCode::Epsg3857);
    }

    #[test]
    fn test_rejects_non_tiff() {
        assert!(matches!(
            decode_geotiff(b"MM\0*\0\0\0\x08"),
            Err(RasterError::RasterRead(_))
        ));
        assert!(decode_geotiff(b"II").is_err());
        assert!(decode_geotiff(b"II+\0\0\0\0\0").is_err());
    }

    #[test]
    fn test_rejects_truncated_strips() {
        let mut bytes = encode_geotiff(&sample_raster(4, 4), Compression::None).unwrap();
        // cut the file inside the IFD
        let ifd = u32_at(&bytes, 4).unwrap() as usize;
        bytes.truncate(ifd + 2);
        assert!(decode_geotiff(&bytes).is_err());
    }

    #[test]
    fn test_rows_per_strip() {
        assert_eq!(rows_per_strip(1000, 1000), 8);
        assert_eq!(rows_per_strip(100_000, 10), 1);
        assert_eq!(rows_per_strip(2, 3), 3);
    }

    #[test]
    fn test_nul_in_tag_is_rejected() {
        let mut raster = sample_raster(2, 2);
        raster.tags.insert("history".to_string(), "a\0b".to_string());
        assert!(matches!(
            encode_geotiff(&raster, Compression::None),
            Err(RasterError::RasterWrite(_))
        ));

        let mut raster = sample_raster(2, 2);
        raster.tags.insert("hist\0ory".to_string(), "ab".to_string());
        assert!(encode_geotiff(&raster, Compression::Deflate).is_err());
    }
}
