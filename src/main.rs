//! 命令行入口：翻译一个 HTML 或纯文本文件

use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use translation_manager::env::{self, EnvVar};
use translation_manager::translation::{ConfigManager, TranslationService};

/// Translate HTML fragments or plain text through a translation API
#[derive(Parser, Debug)]
#[command(name = "translation-manager", version, about)]
struct Args {
    /// Input file; reads stdin when omitted or "-"
    input: Option<PathBuf>,

    /// Target language (defaults to the configured one)
    #[arg(short, long)]
    lang: Option<String>,

    /// Translation API endpoint
    #[arg(short = 'u', long)]
    api_url: Option<String>,

    /// Path to a TOML or JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Treat the input as plain text instead of HTML
    #[arg(short, long)]
    plain: bool,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH")]
    generate_config: Option<String>,

    /// Print the supported environment variables and exit
    #[arg(long)]
    env_docs: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = env::core::LogLevel::get().unwrap_or_else(|e| {
            eprintln!("{}", e);
            "info".to_string()
        });
        EnvFilter::new(format!("translation_manager={}", level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(input: Option<&PathBuf>) -> io::Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path),
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if args.env_docs {
        print!("{}", env::generate_env_docs());
        return Ok(());
    }

    if let Some(path) = &args.generate_config {
        ConfigManager::generate_example_config(path)?;
        eprintln!("已生成示例配置文件: {}", path);
        return Ok(());
    }

    init_logging();

    let manager = match &args.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    let target_lang = args
        .lang
        .clone()
        .unwrap_or_else(|| manager.get_config().target_lang.clone());
    let config = manager.create_simple_config(&target_lang, args.api_url.as_deref());

    let content = read_input(args.input.as_ref())?;
    let service = TranslationService::from_config(config)?;

    let translated = if args.plain {
        service.translate(&content, &target_lang).await
    } else {
        service.translate_html(&content, &target_lang).await
    };

    let stats = service.get_stats();
    tracing::info!(
        "完成: 后端调用 {} 次, 重试 {} 次, 回退原文 {} 条",
        stats.backend_calls,
        stats.retries,
        stats.fallbacks
    );

    match &args.output {
        Some(path) => fs::write(path, translated)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(translated.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
