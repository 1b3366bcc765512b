use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

use super::HeightSamples;

/// Scale applied to raw numeric heightmap entries (`0x400 / 0xffff`).
pub const NUMERIC_HEIGHT_SCALE: f32 = 1024.0 / 65535.0;

/// Divisor applied to the summed RGB channels of an image heightmap, before
/// the caller-supplied scale.
const IMAGE_CHANNEL_DIVISOR: f32 = 12.0;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("GET {url} returned status {status}")]
    Fetch { url: String, status: u16 },
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid heightmap JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cannot decode image {origin}: {source}")]
    Image {
        origin: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Cannot tell heightmap format of '{0}', pass --format")]
    UnknownFormat(String),
    #[error("Image height scale must be a positive number, got {0}")]
    InvalidScale(f32),
}

/// Where an asset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    /// `http://` and `https://` identifiers are URLs, anything else is a path.
    pub fn parse(identifier: &str) -> Self {
        let lower = identifier.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(identifier.to_string())
        } else {
            Source::Path(PathBuf::from(identifier))
        }
    }

    /// Fetch the raw bytes of the asset.
    ///
    /// URLs are fetched with a single blocking GET. Any non-success status is
    /// a [`LoadError::Fetch`].
    pub fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        match self {
            Source::Url(url) => {
                let http_err = |source| LoadError::Http {
                    url: url.clone(),
                    source,
                };
                let response = reqwest::blocking::get(url.as_str()).map_err(http_err)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::Fetch {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                let bytes = response.bytes().map_err(http_err)?;
                Ok(bytes.to_vec())
            }
            Source::Path(path) => fs::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            }),
        }
    }

    fn extension(&self) -> Option<String> {
        let path = match self {
            // Ignore query strings and fragments
            Source::Url(url) => {
                let end = url.find(['?', '#']).unwrap_or(url.len());
                Path::new(&url[..end]).to_path_buf()
            }
            Source::Path(path) => path.clone(),
        };
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Encoding of a heightmap source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HeightFormat {
    /// JSON array of raw numbers
    Json,
    /// Raster image, height from summed RGB
    Image,
}

impl HeightFormat {
    /// Guess the format from the source's file extension.
    pub fn detect(source: &Source) -> Result<Self, LoadError> {
        match source.extension().as_deref() {
            Some("json") => Ok(HeightFormat::Json),
            Some("png" | "jpg" | "jpeg") => Ok(HeightFormat::Image),
            _ => Err(LoadError::UnknownFormat(source.to_string())),
        }
    }
}

/// Scale factors for the two heightmap encodings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightScale {
    /// Multiplier for numeric entries
    pub numeric: f32,
    /// Divisor (after the channel divisor) for image-derived heights
    pub image: f32,
}

impl HeightScale {
    /// The image scale is a divisor, so it must be finite and above zero.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.image.is_finite() && self.image > 0.0 {
            Ok(())
        } else {
            Err(LoadError::InvalidScale(self.image))
        }
    }
}

impl Default for HeightScale {
    fn default() -> Self {
        Self {
            numeric: NUMERIC_HEIGHT_SCALE,
            image: 1.0,
        }
    }
}

/// Load a heightmap from `source`.
///
/// The format is detected from the extension unless `format` is given.
pub fn load_heights(
    source: &Source,
    format: Option<HeightFormat>,
    scale: HeightScale,
) -> Result<HeightSamples, LoadError> {
    let format = match format {
        Some(format) => format,
        None => HeightFormat::detect(source)?,
    };
    if format == HeightFormat::Image {
        scale.validate()?;
    }
    let bytes = source.fetch()?;

    match format {
        HeightFormat::Json => parse_numeric_heights(&bytes, scale.numeric).map_err(|source_err| {
            LoadError::Json {
                origin: source.to_string(),
                source: source_err,
            }
        }),
        HeightFormat::Image => {
            let image = decode_rgba(&bytes, source)?;
            Ok(heights_from_rgba(&image, scale.image))
        }
    }
}

/// Parse a JSON array of numbers, multiplying each entry by `scale`.
pub fn parse_numeric_heights(bytes: &[u8], scale: f32) -> Result<HeightSamples, serde_json::Error> {
    let raw: Vec<f32> = serde_json::from_slice(bytes)?;
    Ok(HeightSamples::new(scale_numeric(raw, scale)))
}

/// Multiply every raw numeric entry by `scale`.
pub fn scale_numeric(mut raw: Vec<f32>, scale: f32) -> Vec<f32> {
    for value in &mut raw {
        *value *= scale;
    }
    raw
}

/// Height of one pixel: `(R + G + B) / (12 * scale)`. Alpha is ignored.
pub fn pixel_height(rgba: [u8; 4], scale: f32) -> f32 {
    let sum = rgba[0] as f32 + rgba[1] as f32 + rgba[2] as f32;
    sum / (IMAGE_CHANNEL_DIVISOR * scale)
}

/// Convert every pixel of `image`, row-major, into a height sample.
pub fn heights_from_rgba(image: &RgbaImage, scale: f32) -> HeightSamples {
    let values = image.pixels().map(|p| pixel_height(p.0, scale)).collect();
    HeightSamples::with_dims(values, image.width() as usize, image.height() as usize)
}

/// Load a colour texture for a terrain layer.
pub fn load_texture(source: &Source) -> Result<RgbaImage, LoadError> {
    let bytes = source.fetch()?;
    decode_rgba(&bytes, source)
}

fn decode_rgba(bytes: &[u8], source: &Source) -> Result<RgbaImage, LoadError> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|err| LoadError::Image {
            origin: source.to_string(),
            source: err,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Write;

    #[test]
    fn test_pixel_height_white() {
        assert_eq!(pixel_height([255, 255, 255, 255], 1.0), 63.75);
    }

    #[test]
    fn test_pixel_height_ignores_alpha() {
        assert_eq!(
            pixel_height([30, 60, 90, 0], 2.0),
            pixel_height([30, 60, 90, 255], 2.0)
        );
        assert_eq!(pixel_height([30, 60, 90, 0], 2.0), 7.5);
    }

    #[test]
    fn test_numeric_scale_boundaries() {
        let scaled = scale_numeric(vec![0.0, 65535.0], NUMERIC_HEIGHT_SCALE);
        assert_eq!(scaled[0], 0.0);
        assert!((scaled[1] - 1024.0).abs() < 1e-3);
    }

    #[test]
    fn test_parse_numeric_heights() {
        let samples = parse_numeric_heights(b"[0, 2, 4.5]", 2.0).unwrap();
        assert_eq!(samples.values, vec![0.0, 4.0, 9.0]);
        assert!(samples.dims.is_none());
    }

    #[test]
    fn test_parse_numeric_rejects_objects() {
        assert!(parse_numeric_heights(br#"{"heights": [1, 2]}"#, 1.0).is_err());
    }

    #[test]
    fn test_heights_from_rgba_row_major() {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([12, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 24, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 36, 255]));
        image.put_pixel(1, 1, Rgba([12, 12, 24, 0]));

        let samples = heights_from_rgba(&image, 1.0);
        assert_eq!(samples.values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(samples.dims, Some((2, 2)));
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("https://example.com/a.json"),
            Source::Url("https://example.com/a.json".to_string())
        );
        assert_eq!(
            Source::parse("assets/a.json"),
            Source::Path(PathBuf::from("assets/a.json"))
        );
    }

    #[test]
    fn test_detect_format() {
        let json = Source::parse("assets/5000000000.hght.json");
        let png = Source::parse("http://host/map.PNG?v=2");
        let other = Source::parse("terrain.bin");

        assert_eq!(HeightFormat::detect(&json).unwrap(), HeightFormat::Json);
        assert_eq!(HeightFormat::detect(&png).unwrap(), HeightFormat::Image);
        assert!(matches!(
            HeightFormat::detect(&other),
            Err(LoadError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "[0, 65535, 0, 65535]").unwrap();

        let source = Source::Path(file.path().to_path_buf());
        let samples = load_heights(&source, None, HeightScale::default()).unwrap();

        assert_eq!(samples.len(), 4);
        assert_eq!(samples.values[0], 0.0);
        assert!((samples.values[1] - 1024.0).abs() < 1e-3);
    }

    #[test]
    fn test_load_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heights.png");
        let mut image = RgbaImage::new(3, 2);
        for pixel in image.pixels_mut() {
            *pixel = Rgba([255, 255, 255, 255]);
        }
        image.save(&path).unwrap();

        let samples = load_heights(&Source::Path(path), None, HeightScale::default()).unwrap();
        assert_eq!(samples.dims, Some((3, 2)));
        assert!(samples.values.iter().all(|&h| h == 63.75));
    }

    #[test]
    fn test_forced_format_overrides_extension() {
        let mut file = tempfile::Builder::new().suffix(".dat").tempfile().unwrap();
        write!(file, "[1, 2]").unwrap();

        let source = Source::Path(file.path().to_path_buf());
        let samples = load_heights(
            &source,
            Some(HeightFormat::Json),
            HeightScale {
                numeric: 1.0,
                image: 1.0,
            },
        )
        .unwrap();
        assert_eq!(samples.values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_missing_file() {
        let result = load_heights(
            &Source::parse("/nonexistent/heights.json"),
            None,
            HeightScale::default(),
        );
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_image_scale_must_be_positive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heights.png");
        RgbaImage::new(2, 2).save(&path).unwrap();
        let source = Source::Path(path);

        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let scale = HeightScale {
                image: bad,
                ..HeightScale::default()
            };
            let result = load_heights(&source, None, scale);
            assert!(matches!(result, Err(LoadError::InvalidScale(_))), "scale {}", bad);
        }

        let scale = HeightScale {
            image: 0.5,
            ..HeightScale::default()
        };
        assert!(load_heights(&source, None, scale).is_ok());
    }

    #[test]
    fn test_image_scale_ignored_for_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "[1]").unwrap();

        let scale = HeightScale {
            numeric: 1.0,
            image: 0.0,
        };
        let samples = load_heights(&Source::Path(file.path().to_path_buf()), None, scale).unwrap();
        assert_eq!(samples.values, vec![1.0]);
    }

    /// Serve one canned HTTP response on a local port and return its base URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use std::io::{BufRead, BufReader};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            // Drain the request head
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            )
            .unwrap();
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_http_error_status() {
        let url = format!("{}/heights.json", serve_once("404 Not Found", "missing"));

        let result = load_heights(&Source::parse(&url), None, HeightScale::default());
        match result {
            Err(LoadError::Fetch { url: failed, status }) => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected fetch error, got {:?}", other.map(|s| s.values)),
        }
    }

    #[test]
    fn test_http_json_heights() {
        let url = format!("{}/heights.json", serve_once("200 OK", "[0, 65535]"));

        let samples = load_heights(&Source::parse(&url), None, HeightScale::default()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples.values[0], 0.0);
        assert!((samples.values[1] - 1024.0).abs() < 1e-3);
    }

    #[test]
    fn test_texture_rejects_garbage() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"not an image").unwrap();

        let result = load_texture(&Source::Path(file.path().to_path_buf()));
        assert!(matches!(result, Err(LoadError::Image { .. })));
    }
}
