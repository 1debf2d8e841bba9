//! Photo album and the rotating 3D ring of memory cards.
//!
//! Ingestion is atomic: one worker thread decodes every selected file in
//! order, builds the complete replacement list, and hands it over a
//! channel; the UI thread swaps it in whole. Final ordering is therefore
//! deterministic no matter how long individual decodes take.

use crate::config::{Palette, PhotoConfig};
use crate::projection::{Camera, Vec3};
use crossbeam_channel::{bounded, Receiver};
use egui::{
    Align2, Color32, ColorImage, FontId, Painter, Rect, Rounding, Stroke, TextureHandle,
    TextureOptions, Vec2,
};
use image::RgbaImage;
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::thread;
use tracing::warn;

/// An opaque photo reference plus its stable identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Photo {
    pub id: String,
    pub source: String,
}

/// A photo with whatever could be resolved from its reference. A missing
/// image renders as a placeholder card; other cards are unaffected.
pub struct LoadedPhoto {
    pub photo: Photo,
    pub image: Option<RgbaImage>,
    texture: Option<TextureHandle>,
}

impl LoadedPhoto {
    fn placeholder(id: &str, source: &str) -> Self {
        Self {
            photo: Photo {
                id: id.to_string(),
                source: source.to_string(),
            },
            image: None,
            texture: None,
        }
    }
}

fn default_entries(max: usize) -> Vec<LoadedPhoto> {
    (1..=max)
        .map(|i| LoadedPhoto::placeholder(&i.to_string(), &format!("assets/{i}.jpg")))
        .collect()
}

/// The ordered photo collection shown on the ring.
pub struct PhotoAlbum {
    entries: Vec<LoadedPhoto>,
    pending: Option<Receiver<Vec<LoadedPhoto>>>,
}

impl PhotoAlbum {
    pub fn new(cfg: &PhotoConfig) -> Self {
        Self {
            entries: default_entries(cfg.max_photos),
            pending: None,
        }
    }

    pub fn entries(&self) -> &[LoadedPhoto] {
        &self.entries
    }

    /// Decode the selected files on a worker thread and stage a complete
    /// replacement list. Uploads come first, then the defaults, truncated
    /// to the ring capacity.
    pub fn ingest(&mut self, paths: Vec<PathBuf>, cfg: &PhotoConfig) {
        if paths.is_empty() {
            return;
        }
        let max = cfg.max_photos;
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let mut next: Vec<LoadedPhoto> = Vec::new();
            for (index, path) in paths.into_iter().take(max).enumerate() {
                let source = path.display().to_string();
                let image = match image::open(&path) {
                    Ok(img) => Some(img.to_rgba8()),
                    Err(err) => {
                        warn!("could not read photo {source}: {err}");
                        None
                    }
                };
                next.push(LoadedPhoto {
                    photo: Photo {
                        id: format!("upload-{index}"),
                        source,
                    },
                    image,
                    texture: None,
                });
            }
            next.extend(default_entries(max));
            next.truncate(max);
            let _ = tx.send(next);
        });
        self.pending = Some(rx);
    }

    /// Swap in a finished ingest, if any. Returns whether the list changed.
    pub fn poll(&mut self) -> bool {
        if let Some(rx) = &self.pending {
            if let Ok(next) = rx.try_recv() {
                self.entries = next;
                self.pending = None;
                return true;
            }
        }
        false
    }
}

/// World-space card centers for `count` items at the given spin angle.
/// Item 0 starts nearest the viewer and the ring turns about the vertical
/// axis.
pub fn ring_slots(count: usize, radius: f32, spin: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = spin + TAU * i as f32 / count as f32;
            Vec3::new(angle.sin() * radius, 0.0, -angle.cos() * radius)
        })
        .collect()
}

/// Spin state plus projected rendering of the album.
pub struct PhotoRing {
    spin: f32,
}

impl PhotoRing {
    pub fn new() -> Self {
        Self { spin: 0.0 }
    }

    pub fn advance(&mut self, dt: f32, cfg: &PhotoConfig) {
        self.spin += cfg.spin_speed * dt;
    }

    /// Draw the ring. `view` maps world units onto the current canvas
    /// (same factor the tree uses, so the ring encircles it).
    pub fn render(
        &self,
        painter: &Painter,
        rect: Rect,
        album: &mut PhotoAlbum,
        camera: &Camera,
        cfg: &PhotoConfig,
        palette: &Palette,
        view: f32,
    ) {
        let count = album.entries.len();
        if count == 0 || view <= 0.0 {
            return;
        }
        let center = rect.center();
        let slots = ring_slots(count, cfg.ring_radius, self.spin);

        // Cards are opaque, so unlike the particle field they need
        // far-to-near painter order.
        let mut order: Vec<usize> = (0..count).collect();
        order.sort_by(|&a, &b| {
            slots[b]
                .z
                .partial_cmp(&slots[a].z)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let [gr, gg, gb] = palette.gold_trim;
        for i in order {
            let Some(proj) = camera.project(slots[i]) else {
                continue;
            };
            let pos = center + proj.offset * view;
            let size = Vec2::new(cfg.card_width, cfg.card_height) * proj.scale * view;
            if size.x < 2.0 || size.y < 2.0 {
                continue;
            }
            let card = Rect::from_center_size(pos, size);
            let fade = (proj.scale * 0.9).clamp(0.35, 1.0);
            let alpha = (fade * 255.0) as u8;

            let entry = &mut album.entries[i];
            painter.rect_filled(
                card,
                Rounding::same(6.0),
                Color32::from_rgba_unmultiplied(8, 10, 18, alpha.saturating_sub(40)),
            );

            if entry.texture.is_none() {
                if let Some(img) = &entry.image {
                    let color_image = ColorImage::from_rgba_unmultiplied(
                        [img.width() as usize, img.height() as usize],
                        img.as_raw(),
                    );
                    entry.texture = Some(painter.ctx().load_texture(
                        format!("photo-{}", entry.photo.id),
                        color_image,
                        TextureOptions::LINEAR,
                    ));
                }
            }

            let inner = card.shrink(size.x * 0.03);
            match &entry.texture {
                Some(texture) => {
                    let tint = Color32::from_rgba_unmultiplied(255, 255, 255, alpha);
                    painter.image(
                        texture.id(),
                        inner,
                        Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        tint,
                    );
                }
                None => {
                    // Unresolvable reference: placeholder visual, local to
                    // this card.
                    painter.rect_filled(
                        inner,
                        Rounding::same(4.0),
                        Color32::from_rgba_unmultiplied(24, 30, 48, alpha),
                    );
                    painter.text(
                        inner.center(),
                        Align2::CENTER_CENTER,
                        "✶",
                        FontId::proportional((size.y * 0.2).max(8.0)),
                        Color32::from_rgba_unmultiplied(gr, gg, gb, alpha),
                    );
                }
            }

            painter.rect_stroke(
                card,
                Rounding::same(6.0),
                Stroke::new(
                    1.0,
                    Color32::from_rgba_unmultiplied(gr, gg, gb, alpha / 2),
                ),
            );
            painter.text(
                egui::pos2(card.center().x, card.bottom() - size.y * 0.06),
                Align2::CENTER_CENTER,
                format!("Memory {}", i + 1),
                FontId::proportional((size.y * 0.07).max(7.0)),
                Color32::from_rgba_unmultiplied(255, 245, 200, alpha),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_for_swap(album: &mut PhotoAlbum) {
        for _ in 0..200 {
            if album.poll() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("ingest never completed");
    }

    #[test]
    fn album_starts_with_full_placeholder_ring() {
        let cfg = PhotoConfig::default();
        let album = PhotoAlbum::new(&cfg);
        assert_eq!(album.entries().len(), cfg.max_photos);
        assert!(album.entries().iter().all(|e| e.image.is_none()));
    }

    #[test]
    fn ingest_swaps_one_ordered_list() {
        let cfg = PhotoConfig::default();
        let mut album = PhotoAlbum::new(&cfg);
        album.ingest(
            vec![
                PathBuf::from("/nonexistent/a.png"),
                PathBuf::from("/nonexistent/b.png"),
            ],
            &cfg,
        );
        wait_for_swap(&mut album);

        // Uploads lead in selection order, defaults fill the rest, and the
        // ring capacity holds.
        assert_eq!(album.entries().len(), cfg.max_photos);
        assert_eq!(album.entries()[0].photo.id, "upload-0");
        assert_eq!(album.entries()[1].photo.id, "upload-1");
        assert_eq!(album.entries()[2].photo.id, "1");
        // Unreadable files became placeholders, not dropped items.
        assert!(album.entries()[0].image.is_none());
    }

    #[test]
    fn ingest_truncates_to_capacity() {
        let cfg = PhotoConfig {
            max_photos: 3,
            ..Default::default()
        };
        let mut album = PhotoAlbum::new(&cfg);
        let paths = (0..10)
            .map(|i| PathBuf::from(format!("/nonexistent/{i}.png")))
            .collect();
        album.ingest(paths, &cfg);
        wait_for_swap(&mut album);
        assert_eq!(album.entries().len(), 3);
        assert!(album.entries().iter().all(|e| e.photo.id.starts_with("upload-")));
    }

    #[test]
    fn empty_selection_is_a_no_op() {
        let cfg = PhotoConfig::default();
        let mut album = PhotoAlbum::new(&cfg);
        album.ingest(Vec::new(), &cfg);
        assert!(!album.poll());
        assert_eq!(album.entries().len(), cfg.max_photos);
    }

    #[test]
    fn ring_slots_are_evenly_spaced() {
        let slots = ring_slots(6, 300.0, 0.0);
        assert_eq!(slots.len(), 6);
        // First card sits nearest the viewer.
        assert!((slots[0].z + 300.0).abs() < 1e-3);
        assert!(slots[0].x.abs() < 1e-3);
        for slot in &slots {
            let r = (slot.x * slot.x + slot.z * slot.z).sqrt();
            assert!((r - 300.0).abs() < 1e-3);
            assert_eq!(slot.y, 0.0);
        }
        // Opposite card is at the far side.
        assert!((slots[3].z - 300.0).abs() < 1e-3);
    }
}
