use anyhow::Context;
use clap::Parser;
use isoreach::adapters::{feature_collection::to_feature_collection, poi_file::load_pois};
use isoreach::core::provider::IsochroneProvider;
use isoreach::domain::ports::RoutingConfig;
use isoreach::utils::error::{ErrorSeverity, IsochroneError};
use isoreach::utils::{logger, validation::Validate};
use isoreach::{CliConfig, RingSource, Settings, TomlConfig};

fn fail(e: &IsochroneError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn load_settings(cli: &CliConfig) -> Result<Settings, IsochroneError> {
    let file = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let config = TomlConfig::from_file(path)?;
            config.validate()?;
            Some(config)
        }
        None => None,
    };

    let settings = cli.resolve(file.as_ref())?;
    settings.validate()?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let settings = load_settings(&cli).unwrap_or_else(|e| fail(&e));
    if settings.credential().is_none() {
        tracing::info!("No routing API key configured, isochrones will be approximate");
    }

    let provider = IsochroneProvider::from_config(&settings);
    let request = settings.request();
    let set = provider
        .get_isochrones(&request, settings.credential())
        .await;

    let source = match set.source() {
        Some(RingSource::Live) => "live",
        _ => "approximate",
    };
    println!(
        "📍 {} ({:.4}, {:.4}) - {} - {} isochrones",
        settings.origin_name,
        settings.origin.lat,
        settings.origin.lng,
        settings.mode.label(),
        source
    );
    for ring in set.rings() {
        let minutes = ring.threshold_minutes();
        println!(
            "  {:>3} min  {:>3} vertices  opacity {:.2}  {}",
            minutes,
            ring.vertices().len(),
            ring.opacity,
            provider.generator().speeds().describe_reach(settings.mode, minutes)
        );
    }

    if let Some(path) = &settings.geojson_out {
        let collection = to_feature_collection(&set);
        let json = serde_json::to_string_pretty(&collection)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing GeoJSON to {}", path))?;
        println!("📁 GeoJSON saved to: {}", path);
    }

    if let Some(path) = &settings.pois {
        let pois = load_pois(path).unwrap_or_else(|e| fail(&e));
        let result = settings
            .filter()
            .filter_pois(&pois, &settings.categories, &set, settings.selected_minutes);

        println!(
            "✅ {} of {} POIs reachable within {} min",
            result.len(),
            pois.len(),
            settings.selected_minutes
        );
        for poi in result.iter() {
            let rating = poi
                .rating
                .map(|r| format!(" ★{:.1}", r))
                .unwrap_or_default();
            println!("  [{}] {}{}", poi.category, poi.name, rating);
        }
    }

    Ok(())
}
