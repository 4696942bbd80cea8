use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, redirect, Url};
use resvg::{tiny_skia, usvg};

use crate::error::{AppError, Result};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: usize = 5;
/// Edge of the square PNG produced from vector QR codes.
const RASTER_SIZE: u32 = 512;
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl QrImage {
    pub fn is_vector(&self) -> bool {
        self.content_type.contains("svg")
    }

    /// Raster images pass through; SVG is rendered onto a white square.
    pub async fn into_png(self) -> Result<QrImage> {
        if !self.is_vector() {
            return Ok(self);
        }
        let bytes = tokio::task::spawn_blocking(move || rasterize_svg(&self.bytes))
            .await
            .map_err(|e| AppError::Internal(format!("QR rasterisation task failed: {}", e)))??;
        Ok(QrImage {
            bytes,
            content_type: "image/png".to_string(),
        })
    }
}

/// Renders an SVG document centred on a white `RASTER_SIZE` square and
/// encodes it as PNG.
pub fn rasterize_svg(svg: &[u8]) -> Result<Vec<u8>> {
    let tree = usvg::Tree::from_data(svg, &usvg::Options::default())
        .map_err(|e| AppError::BadRequest(format!("QR image is not valid SVG: {}", e)))?;

    let mut pixmap = tiny_skia::Pixmap::new(RASTER_SIZE, RASTER_SIZE)
        .ok_or_else(|| AppError::Internal("Failed to allocate QR canvas".to_string()))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let edge = RASTER_SIZE as f32;
    let size = tree.size();
    let scale = (edge / size.width()).min(edge / size.height());
    let transform = tiny_skia::Transform::from_scale(scale, scale).post_translate(
        (edge - size.width() * scale) / 2.0,
        (edge - size.height() * scale) / 2.0,
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| AppError::Internal(format!("Failed to encode QR PNG: {}", e)))
}

/// How a QR image reaches the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrExport {
    Download { image: QrImage, filename: String },
    /// Nothing could be fetched; the user opens the gateway URL directly.
    OpenInBrowser(String),
}

/// Fetches QR images from the gateway's document hosts for download.
pub struct QrExporter {
    http: reqwest::Client,
    allowed_hosts: Vec<String>,
}

impl QrExporter {
    /// Only URLs on `allowed_hosts` are fetched, and redirects may not leave
    /// them either.
    pub fn new(allowed_hosts: Vec<String>) -> Result<Self> {
        let allowed_hosts: Vec<String> = allowed_hosts
            .into_iter()
            .map(|host| host.trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();

        let redirect_hosts = allowed_hosts.clone();
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.stop()
            } else if host_allowed(&redirect_hosts, attempt.url()) {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });

        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(policy)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, allowed_hosts })
    }

    /// Downloads an http(s) image from one of the allowed hosts.
    pub async fn fetch(&self, url: &str) -> Result<QrImage> {
        let url = Url::parse(url)
            .map_err(|_| AppError::BadRequest("QR url is not a valid URL".to_string()))?;
        if !matches!(url.scheme(), "https" | "http") {
            return Err(AppError::BadRequest("QR url must be http or https".to_string()));
        }
        if !host_allowed(&self.allowed_hosts, &url) {
            return Err(AppError::BadRequest("QR url host is not allowed".to_string()));
        }

        let response = self.http
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "image/*,*/*")
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(header::REFERER, "https://dashboard.omise.co/")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::External(format!("QR download returned {}", status)));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(QrImage { bytes, content_type })
    }

    /// Data URIs are decoded locally and anything else is fetched; either
    /// way the download is a PNG. When that fails the user is sent to the
    /// URL itself.
    pub async fn export(&self, url: &str, stem: &str) -> QrExport {
        let image = match decode_data_uri(url) {
            Some(image) => Ok(image),
            None => self.fetch(url).await,
        };
        let image = match image {
            Ok(image) => image.into_png().await,
            Err(e) => Err(e),
        };

        match image {
            Ok(image) => QrExport::Download {
                image,
                filename: format!("qr-payment-{}.png", stem),
            },
            Err(e) => {
                tracing::warn!("QR download failed, falling back to the original URL: {}", e);
                QrExport::OpenInBrowser(url.to_string())
            }
        }
    }
}

fn host_allowed(allowed: &[String], url: &Url) -> bool {
    url.host_str()
        .map(|host| allowed.iter().any(|a| a.eq_ignore_ascii_case(host)))
        .unwrap_or(false)
}

/// Decodes `data:<mime>;base64,<payload>`. Returns `None` for anything else.
pub fn decode_data_uri(uri: &str) -> Option<QrImage> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let content_type = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;

    Some(QrImage {
        bytes,
        content_type: if content_type.is_empty() {
            "application/octet-stream".to_string()
        } else {
            content_type.to_string()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="21" height="21" viewBox="0 0 21 21"><rect width="7" height="7" fill="#000"/></svg>"##;

    fn exporter() -> QrExporter {
        QrExporter::new(vec!["api.omise.co".to_string()]).unwrap()
    }

    #[test]
    fn decodes_base64_data_uri() {
        let image = decode_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(&image.bytes[1..4], b"PNG");
        assert!(!image.is_vector());
    }

    #[test]
    fn rejects_non_data_uris() {
        assert!(decode_data_uri("https://api.omise.co/x.svg").is_none());
        assert!(decode_data_uri("data:image/svg+xml,<svg/>").is_none());
    }

    #[tokio::test]
    async fn export_falls_back_to_url_for_unfetchable_scheme() {
        let export = exporter().export("ftp://example.com/qr.svg", "chrg_1").await;
        assert_eq!(export, QrExport::OpenInBrowser("ftp://example.com/qr.svg".to_string()));
    }

    #[tokio::test]
    async fn fetch_refuses_hosts_outside_the_gateway() {
        for url in [
            "http://127.0.0.1:9/qr.png",
            "http://169.254.169.254/latest/meta-data",
            "https://api.omise.co.attacker.test/qr.svg",
            "https://localhost/qr.svg",
        ] {
            let err = exporter().fetch(url).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{} was not refused", url);
        }
    }

    #[tokio::test]
    async fn svg_export_downloads_as_png() {
        let uri = format!("data:image/svg+xml;base64,{}", STANDARD.encode(SVG));
        let export = exporter().export(&uri, "chrg_1").await;

        let QrExport::Download { image, filename } = export else {
            panic!("expected a download, got {:?}", export);
        };
        assert_eq!(filename, "qr-payment-chrg_1.png");
        assert_eq!(image.content_type, "image/png");
        assert!(image.bytes.starts_with(b"\x89PNG\r\n\x1a\n"));

        let pixmap = tiny_skia::Pixmap::decode_png(&image.bytes).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (RASTER_SIZE, RASTER_SIZE));
        let corner = pixmap.pixel(RASTER_SIZE - 1, RASTER_SIZE - 1).unwrap();
        assert_eq!((corner.red(), corner.green(), corner.blue()), (255, 255, 255));
        let module = pixmap.pixel(10, 10).unwrap();
        assert_eq!((module.red(), module.green(), module.blue()), (0, 0, 0));
    }

    #[test]
    fn broken_svg_is_not_rasterised() {
        assert!(rasterize_svg(b"<svg").is_err());
    }
}
