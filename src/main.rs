use nhadat_core::config::Config;
use nhadat_core::AppState;

// Smoke probe: bootstrap the store against the configured gateway and
// report what landed.
#[tokio::main]
async fn main() {
    nhadat_core::logging::init();

    let config = Config::init();
    let state = AppState::new(config);

    state.store.initialize().await;
    println!("✅ Data store initialized");

    println!(
        "🏠 {} properties | 📰 {} news | 🏗 {} projects",
        state.store.get_properties(None).len(),
        state.store.get_news(None).len(),
        state.store.get_projects(None).len()
    );

    let errors = state.store.errors();
    for (name, error) in [
        ("properties", errors.properties),
        ("news", errors.news),
        ("projects", errors.projects),
    ] {
        if let Some(error) = error {
            println!("🔥 {} failed: {}", name, error);
        }
    }

    for (key, count) in state.monitor.duplicates() {
        println!("⚠️ duplicate API call: {} x{}", key, count);
    }
}
