//! eitherbox command-line harness.
//! Generates key pairs, seals and opens envelopes, and runs the two-recipient demo.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use eitherbox::{decrypt, encrypt, KeyPair, PrivateKey, PublicKey};

#[derive(Parser)]
#[command(name = "eitherbox")]
#[command(about = "Seal data so that either of two key holders can open it", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key pair and print it as hex
    Keygen,
    /// Seal input for exactly two recipients
    Encrypt {
        /// Recipient public key (hex), given twice
        #[arg(long = "to", num_args = 1, required = true)]
        to: Vec<String>,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Open an envelope with one key pair
    Decrypt {
        /// Own public key (hex)
        #[arg(long)]
        public: String,
        /// Own private key (hex)
        #[arg(long)]
        private: String,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Walk through Alice, Bob and Eve
    Demo,
}

fn read_input(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => fs::write(path, data).with_context(|| format!("writing {}", path.display())),
        None => io::stdout().write_all(data).context("writing stdout"),
    }
}

fn run_demo() -> Result<()> {
    let alice = KeyPair::generate()?;
    let bob = KeyPair::generate()?;
    let eve = KeyPair::generate()?;

    let secret = b"hello world";
    let envelope = encrypt(secret, &alice.public, &bob.public)?;
    println!("Envelope size: {} bytes", envelope.len());

    let alice_msg = envelope.decrypt(&alice.public, &alice.private).unwrap_or_default();
    let bob_msg = envelope.decrypt(&bob.public, &bob.private).unwrap_or_default();
    let eve_msg = envelope.decrypt(&eve.public, &eve.private).unwrap_or_default();

    println!("Alice got: {}", String::from_utf8_lossy(&alice_msg));
    println!("Bob got: {}", String::from_utf8_lossy(&bob_msg));
    println!("Eve got: {}", String::from_utf8_lossy(&eve_msg));
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen => {
            let pair = KeyPair::generate().context("generating key pair")?;
            println!("public  {}", pair.public.to_hex());
            println!("private {}", pair.private.to_hex());
        }
        Commands::Encrypt { to, input, output } => {
            let [first, second] = to.as_slice() else {
                bail!("expected exactly two --to recipients, got {}", to.len());
            };
            let recipient1 = PublicKey::from_hex(first).context("parsing first recipient")?;
            let recipient2 = PublicKey::from_hex(second).context("parsing second recipient")?;

            let payload = read_input(input.as_ref())?;
            let envelope = encrypt(&payload, &recipient1, &recipient2)?;
            write_output(output.as_ref(), envelope.as_bytes())?;
        }
        Commands::Decrypt {
            public,
            private,
            input,
            output,
        } => {
            let public = PublicKey::from_hex(&public).context("parsing public key")?;
            let private = PrivateKey::from_hex(&private).context("parsing private key")?;

            let envelope = read_input(input.as_ref())?;
            let payload = decrypt(&envelope, &public, &private).context("opening envelope")?;
            write_output(output.as_ref(), &payload)?;
        }
        Commands::Demo => run_demo()?,
    }

    Ok(())
}
