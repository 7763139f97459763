use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use sms_format::config::{AppConfig, get_config_path, load_app_config, save_app_config};
use sms_format::dataset::TemplateType;
use sms_format::error::SmsFormatError;
use sms_format::logging::get_current_log_path;
use sms_format::pipeline::PipelineController;
use sms_format::selection::SelectionStore;
use sms_format::service::{
    Backend, ChosenFile, FileDownloadSink, FileHandoffSink, HttpBackend, LocalBackend,
};
use sms_format::session::{KeyringStore, Session, SessionStatus};
use sms_format::utils::truncate;
use std::path::PathBuf;

/// Longest message line printed by `preview`.
const PREVIEW_LINE_WIDTH: usize = 100;

#[derive(Parser)]
#[command(
    name = "sms-format",
    version,
    about = "Prepare SMS result messages from mark sheets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store the API token in the OS keyring
    Login {
        #[arg(long, env = "SMS_FORMAT_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Forget the stored API token
    Logout,
    /// Check whether the stored token is still accepted
    Status,
    /// Show or change the saved settings
    Config(ConfigArgs),
    /// List the available result templates
    Templates,
    /// Show which rows a range expression selects
    Range {
        /// Row range, e.g. `5`, `20-50` or `60-`
        #[arg(long)]
        expr: String,

        /// Number of rows in the dataset
        #[arg(long)]
        rows: usize,
    },
    /// Upload a sheet and print the generated messages
    Preview {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Upload a sheet and save the selected messages as a workbook
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory. Defaults to the configured output directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a sheet and pass the selected messages to the messaging screen
    Handoff {
        #[command(flatten)]
        source: SourceArgs,

        /// Payload file. Defaults to the configured handoff path.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct SourceArgs {
    /// Mark sheet to upload (.xlsx online; .csv or .json with --offline)
    #[arg(short, long)]
    file: PathBuf,

    /// Result template. Defaults to the configured template.
    #[arg(short = 't', long = "type")]
    template: Option<TemplateType>,

    /// Keep only these rows, e.g. `20-50`
    #[arg(short, long)]
    range: Option<String>,

    /// Flip individual rows (1-based), applied after --range
    #[arg(long, value_delimiter = ',')]
    toggle: Vec<usize>,

    /// Start from an empty selection
    #[arg(long)]
    deselect_all: bool,

    /// Render messages locally instead of calling the results service
    #[arg(long)]
    offline: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Results service base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Template used when --type is not given
    #[arg(long)]
    template: Option<TemplateType>,

    /// Directory exports are saved to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Footer line of offline messages
    #[arg(long)]
    signature: Option<String>,

    /// Start over from the defaults
    #[arg(long)]
    reset: bool,
}

enum Action {
    Preview,
    Export(Option<PathBuf>),
    Handoff(Option<PathBuf>),
}

pub async fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Login { token } => handle_login(&token).await,
        Commands::Config(args) => handle_config(args),
        Commands::Logout => handle_logout(),
        Commands::Status => handle_status().await,
        Commands::Templates => {
            for template in TemplateType::ALL {
                println!("{:<8} {}", template.as_str(), template.label());
            }
            Ok(())
        }
        Commands::Range { expr, rows } => handle_range(&expr, rows),
        Commands::Preview { source } => handle_source(source, Action::Preview).await,
        Commands::Export { source, output } => handle_source(source, Action::Export(output)).await,
        Commands::Handoff { source, path } => handle_source(source, Action::Handoff(path)).await,
    }
}

fn http_backend(config: &AppConfig) -> Result<HttpBackend> {
    Ok(HttpBackend::new(
        config.api_base_url.clone(),
        config.request_timeout(),
    )?)
}

fn stored_session() -> Result<Session> {
    Session::from_store(Box::new(KeyringStore::default())).context("Failed to open keyring")
}

async fn handle_login(token: &str) -> Result<()> {
    let token = token.trim().to_owned();
    anyhow::ensure!(!token.is_empty(), "Token must not be empty");

    let config = load_app_config();
    let backend = http_backend(&config)?;
    let mut session = stored_session()?;
    session.login(token)?;

    match session.verify(&backend).await {
        Ok(_) => println!("Logged in to {}", backend.base_url()),
        Err(SmsFormatError::AuthExpired) => anyhow::bail!("The service rejected this token"),
        // Token is kept; the service may just be unreachable right now.
        Err(e) => println!("Token stored, but it could not be checked: {e}"),
    }
    Ok(())
}

fn handle_logout() -> Result<()> {
    stored_session()?.invalidate();
    println!("Logged out");
    Ok(())
}

async fn handle_status() -> Result<()> {
    let config = load_app_config();
    let backend = http_backend(&config)?;
    let mut session = stored_session()?;

    match session.verify(&backend).await {
        Ok(SessionStatus::Valid) => println!("Logged in to {}", backend.base_url()),
        Ok(SessionStatus::Missing) => println!("Not logged in"),
        Err(SmsFormatError::AuthExpired) => println!("{}", SmsFormatError::AuthExpired),
        Err(e) => return Err(e.into()),
    }
    if let Ok(path) = get_current_log_path() {
        println!("Log file: {}", path.display());
    }
    Ok(())
}

fn handle_config(args: ConfigArgs) -> Result<()> {
    let mut config = if args.reset {
        AppConfig::default()
    } else {
        load_app_config()
    };
    let mut changed = args.reset;

    if let Some(url) = args.api_url {
        config.api_base_url = url.trim().to_owned();
        changed = true;
    }
    if let Some(template) = args.template {
        config.default_template = template;
        changed = true;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = Some(dir);
        changed = true;
    }
    if let Some(signature) = args.signature {
        config.signature = signature;
        changed = true;
    }

    if changed {
        save_app_config(&config)?;
        println!("Saved {}", get_config_path().display());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn handle_range(expr: &str, rows: usize) -> Result<()> {
    let mut selection = SelectionStore::new(rows);
    selection
        .apply_range(expr)
        .map_err(SmsFormatError::from)?;

    let mut indices = selection.indices();
    match (indices.next(), indices.last()) {
        (Some(first), Some(last)) => println!("Rows {}-{}", first + 1, last + 1),
        (Some(only), None) => println!("Row {}", only + 1),
        _ => println!("No rows"),
    }
    println!("{}", selection.summary());
    Ok(())
}

async fn handle_source(source: SourceArgs, action: Action) -> Result<()> {
    let config = load_app_config();
    if source.offline {
        let backend = LocalBackend::new(config.signature.clone());
        return run_pipeline(&backend, Session::anonymous(), &config, source, action).await;
    }

    let backend = http_backend(&config)?;
    let session = stored_session()?;
    anyhow::ensure!(
        session.is_authenticated(),
        "Not logged in. Run `sms-format login --token <TOKEN>` or pass --offline"
    );
    run_pipeline(&backend, session, &config, source, action).await
}

async fn run_pipeline<B: Backend>(
    backend: &B,
    session: Session,
    config: &AppConfig,
    source: SourceArgs,
    action: Action,
) -> Result<()> {
    let template = source.template.unwrap_or(config.default_template);
    let mut controller = PipelineController::new(session)
        .with_template(template)
        .select_all_on_preview(config.select_all_on_preview);

    controller.choose_file(ChosenFile::new(source.file))?;
    controller.run_preview(backend).await?;

    if source.deselect_all {
        controller.deselect_all();
    }
    if let Some(expr) = &source.range {
        controller.apply_range(expr)?;
    }
    for row in source.toggle {
        if row == 0 || row > controller.selection().dataset_len() {
            tracing::warn!(row, "Ignoring --toggle outside the sheet");
            continue;
        }
        controller.toggle(row - 1);
    }

    match action {
        Action::Preview => print_preview(&controller, config.preview_row_limit),
        Action::Export(output) => {
            let sink = FileDownloadSink::new(output.unwrap_or_else(|| config.output_dir()));
            println!("{}", controller.selection().summary());
            let saved = controller.export(backend, &sink).await?;
            println!("Saved {}", saved.display());
        }
        Action::Handoff(path) => {
            let sink = FileHandoffSink::new(path.unwrap_or_else(|| config.handoff_path()));
            let rows = controller.handoff(&sink)?;
            println!("Handed off {rows} rows to {}", sink.path().display());
        }
    }
    Ok(())
}

fn print_preview(controller: &PipelineController, limit: usize) {
    let Some(preview) = controller.preview() else {
        println!("No preview rows");
        return;
    };

    println!(
        "{} ({})",
        preview.template().label(),
        controller.selection().summary()
    );
    for (index, row) in preview.iter().enumerate().take(limit) {
        let mark = if controller.selection().contains(index) {
            'x'
        } else {
            ' '
        };
        println!(
            "[{mark}] #{:<4} Student: {:<14} Guardian: {}",
            index + 1,
            row.student_phone(),
            row.guardian_phone()
        );
        for line in row.result().lines() {
            println!("         {}", truncate(line, PREVIEW_LINE_WIDTH));
        }
    }
    if preview.len() > limit {
        println!("... {} more rows", preview.len() - limit);
    }
}

/// Follow-up advice for a failed command.
pub fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    let err = err.downcast_ref::<SmsFormatError>()?;
    if err.is_fatal() {
        Some("Run `sms-format login --token <TOKEN>` to sign in again")
    } else if err.is_retryable() {
        Some("The request can be retried")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_hints() {
        let expired = anyhow::Error::from(SmsFormatError::AuthExpired);
        assert!(error_hint(&expired).is_some_and(|h| h.contains("login")));

        let network = anyhow::Error::from(SmsFormatError::Network("reset".to_owned()));
        assert_eq!(error_hint(&network), Some("The request can be retried"));

        let empty = anyhow::Error::from(SmsFormatError::NoDataToExport);
        assert_eq!(error_hint(&empty), None);
        assert_eq!(error_hint(&anyhow::anyhow!("other")), None);
    }

    #[test]
    fn test_config_flags_parse() {
        let cli = Cli::try_parse_from(["sms-format", "config", "--template", "medical"])
            .expect("valid args");
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs {
                template: Some(TemplateType::Medical),
                ..
            })
        ));
    }
}
