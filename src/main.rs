use eframe::egui;
use std::path::PathBuf;
use widgetopia::gui::WidgetopiaApp;
use widgetopia::logging;
use widgetopia::settings::Settings;
use widgetopia::store::Store;

fn main() -> anyhow::Result<()> {
    let settings_path = Settings::path();
    let settings = Settings::load(&settings_path)?;
    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));

    let data_dir = settings.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!(dir = %data_dir.display(), "opening storage");
    let store = Store::open_dir(&data_dir);

    let (w, h) = settings.window_size.unwrap_or((1280.0, 800.0));
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Widgetopia")
            .with_inner_size([w, h])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Widgetopia",
        native_options,
        Box::new(move |_cc| Box::new(WidgetopiaApp::new(settings, settings_path, store))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run dashboard window: {e}"))
}
