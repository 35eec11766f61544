//! Vantage application entry point

use vantage::ViewerApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Vantage"),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    eframe::run_native(
        "Vantage",
        options,
        Box::new(|cc| match ViewerApp::new(cc) {
            Ok(app) => Ok(Box::new(app)),
            Err(err) => Err(Box::new(err)),
        }),
    )
}
