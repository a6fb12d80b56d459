use merkle_lamport_signatures::{
    address, config::DEFAULT_BIT_COUNT, merkle::TreeSerializer, sign, storage, verify,
    BuilderConfig, MerkleTreeBuilder,
};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Tree layers hold only public hashes and are stored unsealed.
const STORE_PASSWORD: &str = "";

#[derive(Parser, Debug)]
struct Arguments {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Builds a wallet tree, stores it and prints its address.
    #[command(name = "keygen")]
    KeyGen {
        #[arg(long)]
        secret_file: PathBuf,
        #[arg(long)]
        layers: usize,
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        wallet: String,
        #[arg(long, default_value_t = DEFAULT_BIT_COUNT)]
        bit_count: usize,
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Signs a message file with one leaf of a stored wallet tree.
    Sign {
        #[arg(long)]
        secret_file: PathBuf,
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        index: usize,
        #[arg(long)]
        message: PathBuf,
        #[arg(long, default_value_t = DEFAULT_BIT_COUNT)]
        bit_count: usize,
    },
    /// Checks a signature file against an address.
    Verify {
        #[arg(long)]
        message: PathBuf,
        #[arg(long)]
        signature: PathBuf,
        #[arg(long)]
        index: usize,
        #[arg(long)]
        layers: usize,
        #[arg(long)]
        address: String,
        #[arg(long, default_value_t = DEFAULT_BIT_COUNT)]
        bit_count: usize,
    },
    /// Prints the type of an address, or why it is invalid.
    ValidateAddress { address: String },
}

fn read_secret(file: &Path) -> anyhow::Result<String> {
    let secret = fs::read_to_string(file)
        .with_context(|| format!("reading secret from {}", file.display()))?;
    let secret = secret.trim_end_matches(['\r', '\n']).to_owned();
    if secret.is_empty() {
        bail!("secret file {} is empty", file.display());
    }
    Ok(secret)
}

fn read_message(file: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(file).with_context(|| format!("reading message from {}", file.display()))
}

fn serializer(
    store: &Path,
) -> anyhow::Result<TreeSerializer<storage::FileStorage, storage::PlaintextKeyStore>> {
    let storage = storage::FileStorage::open(store)
        .with_context(|| format!("opening tree store {}", store.display()))?;
    Ok(TreeSerializer::new(storage, storage::PlaintextKeyStore))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let args = Arguments::parse();
    use Command::*;
    match args.cmd {
        KeyGen {
            secret_file,
            layers,
            store,
            wallet,
            bit_count,
            workers,
        } => {
            let secret = read_secret(&secret_file)?;
            let mut config = BuilderConfig::default().with_bit_count(bit_count);
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }
            let tree = MerkleTreeBuilder::new(config)
                .generate_with_progress(&secret, layers, |progress| {
                    debug!(progress, "generating leaves")
                })
                .context("generating wallet tree")?;
            serializer(&store)?
                .save(&tree, &wallet, STORE_PASSWORD)
                .context("saving wallet tree")?;
            info!(wallet = %wallet, store = %store.display(), "wallet tree stored");
            println!("{}", tree.address());
        }
        Sign {
            secret_file,
            store,
            wallet,
            index,
            message,
            bit_count,
        } => {
            let secret = read_secret(&secret_file)?;
            let message = read_message(&message)?;
            let tree = serializer(&store)?
                .load(&wallet, STORE_PASSWORD)
                .with_context(|| format!("loading wallet {wallet}"))?;
            let signature = sign(&tree, &secret, index, message, bit_count)?;
            println!("{signature}");
        }
        Verify {
            message,
            signature,
            index,
            layers,
            address,
            bit_count,
        } => {
            let message = read_message(&message)?;
            let signature = fs::read_to_string(&signature)
                .with_context(|| format!("reading signature from {}", signature.display()))?;
            let valid = verify(message, signature.trim(), index, layers, &address, bit_count);
            println!("signature validity: {valid}");
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        ValidateAddress { address } => match address::validate(&address) {
            Ok(address_type) => match address_type.layer_count() {
                Some(layers) => println!("{address_type} address for a tree of {layers} layers"),
                None => println!("{address_type} address"),
            },
            Err(err) => {
                println!("invalid address ({}): {err}", err.code());
                return Ok(ExitCode::FAILURE);
            }
        },
    }
    Ok(ExitCode::SUCCESS)
}
