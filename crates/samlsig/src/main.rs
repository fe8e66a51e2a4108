#![forbid(unsafe_code)]

//! samlsig CLI: verify the signature on a SAML document.

use clap::{Parser, Subcommand};
use samlsig::{Error, IdTarget, Verifier, VerifyConfig, XmlDsigProvider};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "samlsig",
    about = "Verify enveloped XML-DSig signatures on SAML documents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a signed SAML document
    Verify {
        /// Input XML file
        file: PathBuf,

        /// PEM certificate holding the signer's public key
        #[arg(long)]
        cert: PathBuf,

        /// Register an ID attribute (ATTR:ELEMENT[:NAMESPACE])
        #[arg(long = "id-attr", value_name = "ATTR:ELEMENT[:NS]")]
        id_attr: Vec<String>,

        /// Do not register ID on samlp:Response
        #[arg(long = "no-default-id")]
        no_default_id: bool,

        /// Give up after this many milliseconds (0 waits forever)
        #[arg(long = "timeout-ms", value_name = "N")]
        timeout_ms: Option<u64>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List supported algorithms
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Verify {
            file,
            cert,
            id_attr,
            no_default_id,
            timeout_ms,
            verbose,
        } => {
            init_logging(verbose);
            match cmd_verify(&file, &cert, &id_attr, no_default_id, timeout_ms) {
                Ok(true) => {
                    println!("OK");
                    ExitCode::SUCCESS
                }
                Ok(false) => {
                    println!("INVALID");
                    ExitCode::from(1)
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    ExitCode::from(2)
                }
            }
        }
        Commands::Info => {
            cmd_info();
            ExitCode::SUCCESS
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_verify(
    file: &Path,
    cert: &Path,
    id_attr: &[String],
    no_default_id: bool,
    timeout_ms: Option<u64>,
) -> Result<bool, Error> {
    let config = build_config(id_attr, no_default_id, timeout_ms)?;
    let xml = read_file(file)?;
    let pem = read_file(cert)?;

    tracing::debug!(file = %file.display(), cert = %cert.display(), "verifying");
    let verifier = Verifier::with_config(Arc::new(XmlDsigProvider::new()), config);
    verifier.verify(&xml, &pem)
}

fn build_config(
    id_attr: &[String],
    no_default_id: bool,
    timeout_ms: Option<u64>,
) -> Result<VerifyConfig, Error> {
    let mut config = VerifyConfig::default();
    if no_default_id {
        config = config.without_default_ids();
    }
    for target in id_attr {
        config = config.add_id_target(IdTarget::parse(target)?);
    }
    match timeout_ms {
        Some(0) => config = config.with_timeout(None),
        Some(ms) => config = config.with_timeout(Some(Duration::from_millis(ms))),
        None => {}
    }
    Ok(config)
}

fn cmd_info() {
    println!("samlsig: SAML XML-DSig signature verification");
    println!();
    println!("Supported digest algorithms:");
    for uri in samlsig::crypto::digest::SUPPORTED {
        println!("  {uri}");
    }
    println!();
    println!("Supported signature algorithms:");
    for uri in samlsig::crypto::sign::supported() {
        println!("  {uri}");
    }
    println!();
    println!("Supported canonicalization:");
    for mode in samlsig::c14n::C14nMode::ALL {
        println!("  {}", mode.uri());
    }
    println!();
    println!("Supported transforms:");
    println!("  {}", samlsig::core::algorithm::ENVELOPED_SIGNATURE);
    println!();
    println!("Supported key formats:");
    println!("  X.509 certificate (PEM, DER), SubjectPublicKeyInfo (PEM): RSA, EC P-256, EC P-384");
}

fn read_file(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}
