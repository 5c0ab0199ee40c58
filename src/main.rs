use anyhow::Context;
use motorpool_app::Application;
use motorpool_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load motorpool settings")?;
    motorpool_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.store.backend,
        "motorpool-app bootstrap starting"
    );

    Application::build(settings).await?.serve().await
}
