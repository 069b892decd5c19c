use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use wipecert_core::{Certificate, Signer, SigningKeyHandle, Verifier, VerifyingKey};

#[derive(Parser)]
#[command(name = "wipecert")]
#[command(about = "Sign and verify device-sanitization certificates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an Ed25519 signing keypair (hex seed + hex public key)
    Keygen {
        /// Seed file to write (keep this one private)
        #[arg(long, default_value = "wipecert.key")]
        out: PathBuf,

        /// Public key file to write
        #[arg(long, default_value = "wipecert.pub")]
        public: PathBuf,
    },

    /// Sign an unsigned certificate document
    Sign {
        /// Unsigned certificate (JSON)
        certificate: PathBuf,

        /// Hex-encoded Ed25519 seed file
        key: PathBuf,

        /// Key identifier recorded in the detached signature
        #[arg(long, env = "WIPECERT_KEY_ID", default_value = "wipecert-signing-key")]
        key_id: String,

        /// Output path (default: <certificate>.signed.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify a signed certificate artifact (exit 0 = valid, 1 = rejected)
    Verify {
        /// Signed certificate artifact (JSON container)
        artifact: PathBuf,

        /// Hex-encoded Ed25519 public key file
        public_key: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Keygen { out, public } => {
            let key = SigningKeyHandle::generate("wipecert-signing-key");
            write_key_file(&out, &hex::encode(&*key.seed_bytes()))?;
            write_key_file(&public, &key.public_key_hex())?;
            println!("seed:       {}", out.display());
            println!("public key: {}", public.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Sign {
            certificate,
            key,
            key_id,
            output,
        } => {
            let bytes = fs::read(&certificate)
                .with_context(|| format!("reading {}", certificate.display()))?;
            let cert = Certificate::from_json(&bytes).context("parsing certificate document")?;
            // Fail fast before touching key material; no partial artifact
            // is ever written.
            cert.validate().context("certificate rejected")?;

            let handle = SigningKeyHandle::load(&key, key_id)?;
            let signed = Signer::sign(cert, &handle)?;
            drop(handle);

            let out = output.unwrap_or_else(|| artifact_path(&certificate));
            signed
                .save(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            info!(artifact = %out.display(), "certificate signed");
            println!("{}", out.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Verify {
            artifact,
            public_key,
        } => {
            let verifying_key = load_verifying_key(&public_key)?;
            let bytes =
                fs::read(&artifact).with_context(|| format!("reading {}", artifact.display()))?;

            let outcome = Verifier::verify_artifact(&bytes, &verifying_key);
            println!("{outcome}");
            Ok(if outcome.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn artifact_path(certificate: &Path) -> PathBuf {
    certificate.with_extension("signed.json")
}

fn write_key_file(path: &Path, hex_text: &str) -> Result<()> {
    fs::write(path, format!("{hex_text}\n"))
        .with_context(|| format!("writing {}", path.display()))
}

fn load_verifying_key(path: &Path) -> Result<VerifyingKey> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let bytes = hex::decode(text.trim()).context("public key file is not valid hex")?;
    let bytes: [u8; 32] = match bytes.try_into() {
        Ok(bytes) => bytes,
        Err(bytes) => bail!("expected a 32-byte public key, got {} bytes", bytes.len()),
    };
    VerifyingKey::from_bytes(&bytes).context("public key is not a valid Ed25519 point")
}
