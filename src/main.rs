//! Yuletide - Main Application
//! Interactive holiday card: a particle Christmas tree that explodes into
//! a rotating ring of photos over a warp starfield, with optional
//! camera-driven hand gestures and ambient music

mod config;
mod gesture;
mod greeting;
mod mode;
mod music;
mod photos;
mod projection;
mod starfield;
mod tree;

use config::AppConfig;
use gesture::{CameraFeed, GesturePipeline, HandTracker};
use greeting::{CannedGreeting, GreetingFetcher};
use mode::ModeController;
use music::MusicPlayer;
use photos::{PhotoAlbum, PhotoRing};
use starfield::StarField;
use tree::TreeField;

use crossbeam_channel::Sender;
use eframe::egui;
use std::time::Instant;
use tracing::warn;

const CONFIG_PATH: &str = "yuletide.json";

/// Gesture machinery owned by the session while the camera toggle is on.
/// Dropping the rig releases the tracker and its camera independently of
/// the render loop.
struct GestureRig {
    pipeline: GesturePipeline,
    /// Readiness side of the pipeline: an embedded tracker backend
    /// delivers the loaded tracker here exactly once.
    #[allow(dead_code)]
    tracker_tx: Sender<Box<dyn HandTracker>>,
    /// Camera frames, when a capture backend is attached.
    feed: Option<Box<dyn CameraFeed>>,
}

impl GestureRig {
    fn new(cfg: &config::GestureConfig) -> Self {
        let (tracker_tx, tracker_rx) = crossbeam_channel::bounded(1);
        Self {
            pipeline: GesturePipeline::new(tracker_rx, cfg),
            tracker_tx,
            feed: None,
        }
    }
}

/// Main application state. Every piece of loop state — rotation, smoothed
/// warp speed, the music-started flag — lives on these engines, not in
/// globals.
struct YuletideApp {
    config: AppConfig,
    tree: TreeField,
    starfield: StarField,
    mode: ModeController,
    album: PhotoAlbum,
    ring: PhotoRing,
    greeting: GreetingFetcher,
    gesture: Option<GestureRig>,
    gesture_active: bool,
    music: MusicPlayer,
    last_update: Instant,
    last_dt: f32,
}

impl YuletideApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Night-sky theme
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_unmultiplied(10, 12, 22, 245);
        visuals.panel_fill = egui::Color32::from_rgba_unmultiplied(8, 10, 18, 240);
        cc.egui_ctx.set_visuals(visuals);

        let config = AppConfig::load(CONFIG_PATH).unwrap_or_else(|_| AppConfig::default());
        let album = PhotoAlbum::new(&config.photos);

        let mut music = MusicPlayer::new();
        // Autoplay attempt; environments that block it get another try on
        // the first interaction.
        music.try_start(config.music_path.as_deref());

        Self {
            config,
            tree: TreeField::new(),
            starfield: StarField::new(),
            mode: ModeController::new(),
            album,
            ring: PhotoRing::new(),
            greeting: GreetingFetcher::new(),
            gesture: None,
            gesture_active: false,
            music,
            last_update: Instant::now(),
            last_dt: 1.0 / 60.0,
        }
    }

    fn on_user_interaction(&mut self) {
        let path = self.config.music_path.clone();
        self.music.try_start(path.as_deref());
    }

    fn toggle_mode(&mut self) {
        self.mode.toggle();
        self.on_user_interaction();
    }

    fn set_gesture_active(&mut self, active: bool) {
        if active == self.gesture_active {
            return;
        }
        self.gesture_active = active;
        if active {
            self.gesture = Some(GestureRig::new(&self.config.gesture));
        } else if let Some(mut rig) = self.gesture.take() {
            rig.pipeline.release();
        }
        self.on_user_interaction();
    }

    /// Feed any camera frames through the classifier and apply the
    /// resulting events edge-triggered. Runs on the UI cadence; the mode
    /// flag is the single-writer handoff the render loop reads.
    fn drive_gesture(&mut self) {
        let Some(rig) = &mut self.gesture else { return };
        let Some(feed) = &mut rig.feed else { return };

        let mut changed = false;
        loop {
            match feed.next_frame() {
                Ok(Some(frame)) => {
                    if let Some(event) =
                        rig.pipeline
                            .process_frame(&frame, &self.config.gesture, Instant::now())
                    {
                        changed |= self.mode.apply_gesture(event);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("camera feed failed: {err:#}");
                    break;
                }
            }
        }
        if changed {
            let path = self.config.music_path.clone();
            self.music.try_start(path.as_deref());
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("🎄 Yuletide");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let fps = 1.0 / self.last_dt.max(0.001);
                    ui.label(format!("FPS: {:.0}", fps));
                });
            });
        });
    }

    fn render_controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let gesture_label = if self.gesture_active {
                    "✋ Gesture On"
                } else {
                    "🖐 Gesture"
                };
                if ui
                    .selectable_label(self.gesture_active, gesture_label)
                    .on_hover_text("Open your hand to reveal, close it to restore")
                    .clicked()
                {
                    self.set_gesture_active(!self.gesture_active);
                }

                if ui.button("🖼 Photos").clicked() {
                    if let Some(paths) = rfd::FileDialog::new()
                        .add_filter("Images", &["png", "jpg", "jpeg"])
                        .pick_files()
                    {
                        self.album.ingest(paths, &self.config.photos);
                    }
                    self.on_user_interaction();
                }

                let magic_label = if self.mode.is_open() {
                    "✨ Reset"
                } else {
                    "✨ Magic"
                };
                if ui.button(magic_label).clicked() {
                    self.toggle_mode();
                }
            });
        });
    }

    fn render_canvas(&mut self, ctx: &egui::Context, dt: f32) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click());
                if response.clicked() {
                    self.toggle_mode();
                }
                if rect.width() <= 0.0 || rect.height() <= 0.0 {
                    // Surface not ready yet; resolves on a later frame.
                    return;
                }

                // Dimensions are re-derived every frame so a resize lands
                // before any projection math.
                let mut rng = rand::thread_rng();
                if self.starfield.is_seeded() {
                    self.starfield.resize(rect.width(), rect.height());
                } else {
                    self.starfield
                        .seed(rect.width(), rect.height(), &self.config.starfield, &mut rng);
                }
                self.tree
                    .generate(&self.config.tree, &self.config.palette, &mut rng);

                let open = self.mode.is_open();
                self.starfield
                    .update(open, dt, &self.config.starfield, &mut rng);
                self.tree.update(open, dt, &self.config.tree);
                self.ring.advance(dt, &self.config.photos);

                let painter = ui.painter_at(rect);
                let [br, bg, bb] = self.config.palette.background;
                painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(br, bg, bb));

                self.starfield
                    .render(&painter, rect, &self.config.starfield, &self.config.palette);
                self.tree
                    .render(&painter, rect, &self.config.camera, &self.config.tree);

                let [gr, gg, gb] = self.config.palette.gold_trim;
                painter.text(
                    egui::pos2(rect.center().x, rect.top() + 18.0),
                    egui::Align2::CENTER_TOP,
                    "Merry Christmas",
                    egui::FontId::proportional(34.0),
                    egui::Color32::from_rgba_unmultiplied(gr, gg, gb, 210),
                );

                if open {
                    let view =
                        rect.width().min(rect.height()) / self.config.tree.reference_size;
                    self.ring.render(
                        &painter,
                        rect,
                        &mut self.album,
                        &self.config.camera,
                        &self.config.photos,
                        &self.config.palette,
                        view,
                    );

                    if let Some(text) = self.greeting.poll() {
                        painter.text(
                            egui::pos2(rect.right() - 24.0, rect.bottom() - 36.0),
                            egui::Align2::RIGHT_BOTTOM,
                            format!("\u{201c}{text}\u{201d}"),
                            egui::FontId::proportional(16.0),
                            egui::Color32::from_rgba_unmultiplied(255, 240, 190, 220),
                        );
                    }
                }
            });
    }
}

impl eframe::App for YuletideApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        // Clamp pathological pauses (window drags, suspends) so the
        // integrators never see a giant step.
        let dt = now.duration_since(self.last_update).as_secs_f32().min(0.1);
        self.last_update = now;
        self.last_dt = dt;

        self.album.poll();
        self.drive_gesture();

        // The greeting follows the mode: fetched once per opening, gone
        // when the tree closes. The transition never waits for it.
        if self.mode.is_open() {
            self.greeting.request(CannedGreeting);
        } else {
            self.greeting.clear();
        }

        self.render_top_bar(ctx);
        self.render_controls(ctx);
        self.render_canvas(ctx, dt);

        // Request continuous repaint for animation
        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(mut rig) = self.gesture.take() {
            rig.pipeline.release();
        }
        self.music.stop();
    }
}

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Yuletide")
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Yuletide",
        options,
        Box::new(|cc| Box::new(YuletideApp::new(cc))),
    )
}
