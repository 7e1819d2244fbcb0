use labeldoc::app;
use labeldoc::settings::Settings;
use labeldoc::template;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::from_env()?;

    let default_filter = if settings.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    template::set_display_logs(settings.debug);

    log::info!(
        "Cards: {} x {} mm, margin {} mm, image {} mm wide, {}",
        settings.layout.page_width_mm,
        settings.layout.page_height_mm,
        settings.layout.margin_mm,
        settings.layout.image_width_mm,
        settings.layout.symbology
    );

    let router = app::build_router(settings.clone());
    router.run(&settings).await
}
