//! Backdrop image painted behind the grid.

use base64::{engine::general_purpose, Engine as _};
use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Largest file accepted for embedding as a data URI.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("Image size should not exceed 2MB.")]
    TooLarge,
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a base64 data URI")]
    InvalidDataUri,
    #[error("could not download image: {0}")]
    Fetch(String),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

pub fn encode_data_uri(bytes: &[u8], mime: &str) -> Result<String, BackgroundError> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(BackgroundError::TooLarge);
    }
    Ok(format!(
        "data:{mime};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    ))
}

/// Read an image file and embed it as a `data:` URI.
pub fn data_uri_from_file(path: &Path) -> Result<String, BackgroundError> {
    let size = std::fs::metadata(path)
        .map_err(|source| BackgroundError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if size > MAX_IMAGE_BYTES as u64 {
        return Err(BackgroundError::TooLarge);
    }
    let bytes = std::fs::read(path).map_err(|source| BackgroundError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    encode_data_uri(&bytes, mime_for_path(path))
}

pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, BackgroundError> {
    let rest = uri.strip_prefix("data:").ok_or(BackgroundError::InvalidDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(BackgroundError::InvalidDataUri)?;
    if !meta.ends_with(";base64") {
        return Err(BackgroundError::InvalidDataUri);
    }
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| BackgroundError::InvalidDataUri)
}

fn fetch_bytes(url: &str) -> Result<Vec<u8>, BackgroundError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("widgetopia background")
        .build()
        .map_err(|e| BackgroundError::Fetch(e.to_string()))?;
    let resp = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| BackgroundError::Fetch(e.to_string()))?;
    let bytes = resp.bytes().map_err(|e| BackgroundError::Fetch(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Resolve a backdrop source (data URI, http(s) URL or local path) into pixels.
pub fn load_source(source: &str) -> Result<egui::ColorImage, BackgroundError> {
    let bytes = if source.starts_with("data:") {
        decode_data_uri(source)?
    } else if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(source)?
    } else {
        let path = Path::new(source);
        std::fs::read(path).map_err(|source| BackgroundError::Read {
            path: path.to_path_buf(),
            source,
        })?
    };
    let img = image::load_from_memory(&bytes)?;
    let size = [img.width() as usize, img.height() as usize];
    let rgba = img.to_rgba8();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// UV rectangle that scales an image to cover `target` while keeping its
/// aspect ratio, cropping the overflow evenly on both sides.
pub fn cover_uv(image: egui::Vec2, target: egui::Vec2) -> egui::Rect {
    let full = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    if image.x <= 0.0 || image.y <= 0.0 || target.x <= 0.0 || target.y <= 0.0 {
        return full;
    }
    let image_aspect = image.x / image.y;
    let target_aspect = target.x / target.y;
    if image_aspect > target_aspect {
        let visible = target_aspect / image_aspect;
        let inset = (1.0 - visible) / 2.0;
        egui::Rect::from_min_max(egui::pos2(inset, 0.0), egui::pos2(1.0 - inset, 1.0))
    } else {
        let visible = image_aspect / target_aspect;
        let inset = (1.0 - visible) / 2.0;
        egui::Rect::from_min_max(egui::pos2(0.0, inset), egui::pos2(1.0, 1.0 - inset))
    }
}

type PendingImage = (String, Result<egui::ColorImage, BackgroundError>);

/// Holds the decoded backdrop texture and loads new sources off the UI thread.
#[derive(Default)]
pub struct Background {
    source: Option<String>,
    texture: Option<egui::TextureHandle>,
    pending: Option<Receiver<PendingImage>>,
}

impl Background {
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: Option<String>) {
        if self.source == source {
            return;
        }
        self.texture = None;
        self.pending = None;
        self.source = source.clone();
        let Some(source) = source else {
            return;
        };
        let (tx, rx) = channel();
        self.pending = Some(rx);
        thread::spawn(move || {
            let result = load_source(&source);
            let _ = tx.send((source, result));
        });
    }

    fn poll(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.pending else {
            return;
        };
        let Ok((source, result)) = rx.try_recv() else {
            ctx.request_repaint_after(Duration::from_millis(100));
            return;
        };
        self.pending = None;
        if self.source.as_deref() != Some(source.as_str()) {
            return;
        }
        match result {
            Ok(image) => {
                self.texture =
                    Some(ctx.load_texture("dashboard-background", image, egui::TextureOptions::LINEAR));
            }
            Err(err) => tracing::warn!(error = %err, "background image could not be loaded"),
        }
    }

    /// Paint the backdrop over `rect`, covering it fully.
    pub fn paint(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: egui::Rect) {
        self.poll(ctx);
        if let Some(tex) = &self.texture {
            let uv = cover_uv(tex.size_vec2(), rect.size());
            painter.image(tex.id(), rect, uv, egui::Color32::WHITE);
        }
    }
}
