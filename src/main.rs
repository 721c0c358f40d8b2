use clap::Parser;
use tracing::Level;

use cysafe::args::{CysafeArgs, ScanCommand};
use cysafe::config::{AppConfig, ConfigLoader};
use cysafe::errors::{generic_error, AppError};
use cysafe::logging::{init_logging, LogFormat, LoggingConfig};
use cysafe::types::ScanTarget;
use cysafe::Scanner;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let args = CysafeArgs::parse();

    let loader = ConfigLoader::new();
    let mut config: AppConfig = match &args.config {
        Some(path) => loader.load_from_file(path)?,
        None => loader.load_config()?,
    };
    if args.offline {
        config.scan.offline = true;
    }

    if let Some(format) = &args.log_format {
        format.parse::<LogFormat>().map_err(generic_error)?;
        config.logging.format = format.clone();
    }
    let mut logging = LoggingConfig::from_settings(&config.logging);
    if args.verbose {
        logging.level = Level::DEBUG;
    }
    if let Err(e) = init_logging(logging) {
        eprintln!("⚠️ 日志初始化失败: {}", e);
    }

    let scanner = Scanner::from_config(&config)?;

    let report = match args.command {
        ScanCommand::Url { url } => scanner.scan_url(&url).await?,
        ScanCommand::File { path, mime } => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| AppError::IO(format!("reading {}", path.display()), e))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string());
            scanner
                .scan_bytes(&bytes, mime.as_deref().unwrap_or_default(), file_name)
                .await?
        }
        ScanCommand::Hash { hash, size, mime } => {
            let target = ScanTarget::file(&hash, size, mime.unwrap_or_default())?;
            scanner.scan(&target).await
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
