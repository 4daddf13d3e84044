use clap::Parser;
use contract_scanner::config::{Command, KeysAction, OutputFormat};
use contract_scanner::core::report;
use contract_scanner::domain::ports::{CredentialStore, VerdictCache};
use contract_scanner::utils::{logger, validation::Validate};
use contract_scanner::{
    CliConfig, Credentials, FileCredentials, FileVerdictCache, LocalStorage, MemoryCredentials,
    MemoryVerdictCache, ScanResult, Scanner, ScannerConfig,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.json_logs);
    tracing::info!("🚀 Starting contract-scanner");

    let config = match ScannerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(&config.storage.data_dir);
    let stored_credentials = FileCredentials::new(storage.clone());

    match cli.command {
        Command::Scan {
            format,
            watch,
            interval,
        } => {
            let scanner = build_scanner(&config, storage, &stored_credentials).await?;
            if watch {
                let every = interval.unwrap_or(config.scan.interval_seconds).max(1);
                run_watch(&scanner, format, Duration::from_secs(every)).await?;
            } else {
                let results = scanner.get_results().await;
                println!("{}", render(&results, format)?);
            }
        }
        Command::Check { address } => {
            let scanner = build_scanner(&config, storage, &stored_credentials).await?;
            let verdict = scanner.analyze_contract(&address).await;
            println!("{}  {}", address, verdict);
        }
        Command::Keys { action } => run_keys(&stored_credentials, &config, &action).await?,
    }

    Ok(())
}

/// 設定檔與環境變數的金鑰優先，缺的再從 credentials 檔補上
async fn build_scanner(
    config: &ScannerConfig,
    storage: LocalStorage,
    stored_credentials: &FileCredentials<LocalStorage>,
) -> anyhow::Result<Scanner> {
    let stored = stored_credentials
        .get_credentials()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("⚠️ Ignoring unreadable credentials file: {}", e);
            Credentials::default()
        });
    let credentials = Arc::new(MemoryCredentials::new(
        config.credentials.merged_with(&stored),
    ));

    let cache: Arc<dyn VerdictCache> = match config.cache.backend.as_str() {
        "memory" => Arc::new(MemoryVerdictCache::new()),
        _ => Arc::new(FileVerdictCache::new(storage)),
    };
    tracing::debug!("Verdict cache backend: {}", config.cache.backend);

    Ok(Scanner::from_config(config, cache, credentials)?)
}

fn render(results: &[ScanResult], format: OutputFormat) -> anyhow::Result<String> {
    let output = match format {
        OutputFormat::Table => report::render_table(results),
        OutputFormat::Json => report::render_json(results)?,
        OutputFormat::Csv => report::render_csv(results)?,
    };
    Ok(output)
}

async fn run_watch(scanner: &Scanner, format: OutputFormat, every: Duration) -> anyhow::Result<()> {
    tracing::info!("🔍 Watching for new pairs every {:?}", every);
    let mut ticker = tokio::time::interval(every);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let results = scanner.get_results().await;
                println!("{}", render(&results, format)?);
            }
            _ = &mut shutdown => {
                tracing::info!("🛑 Stopping scanner");
                break;
            }
        }
    }

    Ok(())
}

async fn run_keys(
    store: &FileCredentials<LocalStorage>,
    config: &ScannerConfig,
    action: &KeysAction,
) -> anyhow::Result<()> {
    let stored = store.get_credentials().await?;

    match action {
        KeysAction::Show => {
            let effective = config.credentials.merged_with(&stored);
            let (explorer, model) = effective.masked();
            println!("Explorer API key: {}", explorer);
            println!("Model API key:    {}", model);
        }
        KeysAction::Set {
            explorer_key,
            model_key,
        } => {
            if explorer_key.is_none() && model_key.is_none() {
                eprintln!("💡 Nothing to update: pass --explorer-key and/or --model-key");
                return Ok(());
            }

            let updated = Credentials {
                explorer_api_key: explorer_key
                    .clone()
                    .unwrap_or_else(|| stored.explorer_api_key.clone()),
                llm_api_key: model_key
                    .clone()
                    .unwrap_or_else(|| stored.llm_api_key.clone()),
            };
            store.set_credentials(&updated).await?;
            println!("✅ Settings saved.");
        }
    }

    Ok(())
}
