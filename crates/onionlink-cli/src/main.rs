//! onionlink: local endpoint CLI
//!
//! Commands:
//!   init [--no-calibrate]        - create the login record, settings and identity
//!   identity                     - print the local public key (Base58)
//!   fingerprint <key>            - print the fingerprints shared with a contact
//!   log append|show|prune        - encrypted message log
//!   settings show|set            - view or change stored settings
//!   passwd [--no-calibrate]      - change the master password
//!   config show                  - display current configuration

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use zeroize::Zeroize;

use onionlink_core::config::OnionlinkConfig;
use onionlink_core::consts::X448_PUBLIC_KEY_LENGTH;
use onionlink_core::{Error, RecoverableKind};
use onionlink_crypto::{format_fingerprint, KdfParams, PublicKey, SymmetricKey};
use onionlink_encoding::b58_decode;
use onionlink_store::{
    calibrate_params, change_master_key, decode_entry, encode_entry, AeadSealer, BlobStore,
    DigestSealer, IdentityDb, MasterKeyDb, MessageLog, Profile, SettingsContext, SettingsDb,
};

const PASSWORD_ENV: &str = "ONIONLINK_PASSWORD";
const NEW_PASSWORD_ENV: &str = "ONIONLINK_NEW_PASSWORD";

const FATAL_EXIT: u8 = 1;
const RECOVERABLE_EXIT: u8 = 2;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "onionlink",
    version,
    about = "OnionLink local endpoint",
    long_about = "onionlink: manage the encrypted databases, identity and message log of one endpoint"
)]
struct Cli {
    /// Path to onionlink.toml configuration file
    #[arg(long, short = 'c', env = "ONIONLINK_CONFIG", default_value = "onionlink.toml")]
    config: PathBuf,

    /// Endpoint whose databases are used (prefix of every database file)
    #[arg(long, short = 'o', default_value = "tx")]
    operation: String,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, env = "ONIONLINK_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the login record, settings and local identity
    ///
    /// The password is read from ONIONLINK_PASSWORD or prompted for twice.
    Init {
        /// Use the configured Argon2 time cost instead of measuring one
        #[arg(long)]
        no_calibrate: bool,
    },

    /// Print the local X448 public key
    Identity,

    /// Print the fingerprints shared with a contact
    Fingerprint {
        /// Contact's public key in Base58
        public_key: String,
    },

    /// Encrypted message log
    Log {
        #[command(subcommand)]
        action: LogAction,
    },

    /// Stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Change the master password and re-encrypt every database
    ///
    /// The new password is read from ONIONLINK_NEW_PASSWORD or prompted for twice.
    Passwd {
        /// Use the configured Argon2 time cost instead of measuring one
        #[arg(long)]
        no_calibrate: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum LogAction {
    /// Append a message (at most 254 characters)
    Append { message: String },
    /// Print every entry in insertion order
    Show,
    /// Remove entries older than the given number of days
    Prune {
        #[arg(long)]
        days: u32,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print every setting
    Show,
    /// Change one setting
    Set { name: String, value: String },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code(&err);
            if code == FATAL_EXIT {
                tracing::error!("{err:#}");
            } else {
                tracing::warn!("{err:#}");
            }
            eprintln!("onionlink: {err:#}");
            ExitCode::from(code)
        }
    }
}

/// Fatal errors (and anything unclassified) exit with 1, recoverable ones with 2.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.chain().find_map(|cause| cause.downcast_ref::<Error>()) {
        Some(e) if !e.is_fatal() => RECOVERABLE_EXIT,
        _ => FATAL_EXIT,
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = OnionlinkConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;
    init_logging(
        cli.log_level.as_deref().unwrap_or(&config.log.level),
        &config.log.format,
    );

    let dbs = Databases {
        profile: Profile::new(&config.storage.data_dir, &cli.operation),
        retry_limit: config.storage.write_retry_limit,
    };

    match cli.command {
        Commands::Init { no_calibrate } => cmd_init(&config, &dbs, !no_calibrate),
        Commands::Identity => cmd_identity(&dbs),
        Commands::Fingerprint { public_key } => cmd_fingerprint(&dbs, &public_key),
        Commands::Log { action: LogAction::Append { message } } => cmd_log_append(&dbs, &message),
        Commands::Log { action: LogAction::Show } => cmd_log_show(&dbs),
        Commands::Log { action: LogAction::Prune { days } } => cmd_log_prune(&dbs, days),
        Commands::Settings { action: SettingsAction::Show } => cmd_settings_show(&dbs),
        Commands::Settings { action: SettingsAction::Set { name, value } } => {
            cmd_settings_set(&dbs, &name, &value)
        }
        Commands::Passwd { no_calibrate } => cmd_passwd(&config, &dbs, !no_calibrate),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Databases of one profile ──────────────────────────────────────────────────

struct Databases {
    profile: Profile,
    retry_limit: usize,
}

impl Databases {
    fn login(&self) -> MasterKeyDb {
        MasterKeyDb::with_store(
            BlobStore::new(self.profile.login_path(), DigestSealer).with_retry_limit(self.retry_limit),
        )
    }

    fn settings(&self, key: &SymmetricKey) -> SettingsDb {
        SettingsDb::with_store(self.encrypted(self.profile.settings_path(), key))
    }

    fn identity(&self, key: &SymmetricKey) -> IdentityDb {
        IdentityDb::with_store(self.encrypted(self.profile.identity_path(), key))
    }

    fn log(&self, key: &SymmetricKey) -> Result<MessageLog> {
        let log = MessageLog::open(self.profile.log_path(), key.clone())?;
        Ok(log.with_retry_limit(self.retry_limit))
    }

    fn encrypted(&self, path: PathBuf, key: &SymmetricKey) -> BlobStore<AeadSealer> {
        BlobStore::new(path, AeadSealer::new(key.clone())).with_retry_limit(self.retry_limit)
    }

    /// Prompt for the password and derive the master key.
    fn unlock(&self) -> Result<SymmetricKey> {
        let login = self.login();
        if !login.exists()? {
            bail!(
                "no login record at {} (run `onionlink init` first)",
                login.path().display()
            );
        }
        let password = read_password(PASSWORD_ENV, "Password: ")?;
        Ok(login.unlock(&password)?)
    }
}

// ── Passwords and key derivation ──────────────────────────────────────────────

fn read_password(var: &str, prompt: &str) -> Result<SecretString> {
    if let Ok(password) = std::env::var(var) {
        return Ok(SecretString::from(password));
    }
    let password = rpassword::prompt_password(prompt).context("reading password")?;
    Ok(SecretString::from(password))
}

/// Read a password that is about to become the master password.
fn read_new_password(var: &str) -> Result<SecretString> {
    if let Ok(password) = std::env::var(var) {
        return Ok(SecretString::from(password));
    }
    let password = rpassword::prompt_password("New password: ").context("reading password")?;
    let mut confirm = rpassword::prompt_password("Confirm password: ").context("reading password")?;
    let matches = password == confirm;
    confirm.zeroize();
    if !matches {
        let mut password = password;
        password.zeroize();
        return Err(Error::recoverable(RecoverableKind::InvalidInput, "passwords do not match").into());
    }
    Ok(SecretString::from(password))
}

fn kdf_params(config: &OnionlinkConfig, calibrate: bool) -> Result<KdfParams> {
    let kdf = &config.kdf;
    if !calibrate {
        return Ok(KdfParams {
            time_cost: kdf.time_cost,
            memory_cost_kib: kdf.memory_cost_kib,
            parallelism: kdf.parallelism,
        });
    }

    let min = Duration::try_from_secs_f64(kdf.min_derivation_secs)
        .context("kdf.min_derivation_secs")?;
    let max = Duration::try_from_secs_f64(kdf.max_derivation_secs)
        .context("kdf.max_derivation_secs")?;
    eprintln!(
        "Calibrating key derivation ({:.1}-{:.1} s)...",
        kdf.min_derivation_secs, kdf.max_derivation_secs
    );
    Ok(calibrate_params(kdf.memory_cost_kib, kdf.parallelism, min, max)?)
}

// ── `onionlink init` ──────────────────────────────────────────────────────────

fn cmd_init(config: &OnionlinkConfig, dbs: &Databases, calibrate: bool) -> Result<()> {
    let login = dbs.login();
    if login.exists()? {
        bail!("already initialised: {}", login.path().display());
    }

    let password = read_new_password(PASSWORD_ENV)?;
    let params = kdf_params(config, calibrate)?;
    let key = login.create(&password, params)?;

    dbs.settings(&key).load_or_create()?;
    let identity = dbs.identity(&key).load_or_create()?;
    dbs.log(&key)?;

    println!("Initialised {}", dbs.profile.data_dir().display());
    println!("  time cost:   {}", params.time_cost);
    println!("  memory cost: {} KiB", params.memory_cost_kib);
    println!("  public key:  {}", identity.b58_public_key());
    Ok(())
}

// ── `onionlink identity` / `fingerprint` ──────────────────────────────────────

fn cmd_identity(dbs: &Databases) -> Result<()> {
    let key = dbs.unlock()?;
    let identity = dbs.identity(&key).load()?;
    println!("{}", identity.b58_public_key());
    Ok(())
}

fn cmd_fingerprint(dbs: &Databases, public_key: &str) -> Result<()> {
    let bytes = b58_decode(public_key.trim(), true)?;
    if bytes.len() != X448_PUBLIC_KEY_LENGTH {
        return Err(Error::recoverable(
            RecoverableKind::InvalidInput,
            format!(
                "public key must be {X448_PUBLIC_KEY_LENGTH} bytes (got {})",
                bytes.len()
            ),
        )
        .into());
    }
    let contact = PublicKey::from_slice(&bytes)?;

    let key = dbs.unlock()?;
    let identity = dbs.identity(&key).load()?;
    let subkeys = identity.subkeys_with(&contact)?;

    println!("  yours:   {}", format_fingerprint(&subkeys.tx_fp));
    println!("  contact: {}", format_fingerprint(&subkeys.rx_fp));
    Ok(())
}

// ── `onionlink log` ───────────────────────────────────────────────────────────

fn cmd_log_append(dbs: &Databases, message: &str) -> Result<()> {
    let entry = encode_entry(Utc::now(), message)?;
    let key = dbs.unlock()?;
    let mut log = dbs.log(&key)?;
    log.insert(&entry)?;
    println!("appended ({} entries)", log.len()?);
    Ok(())
}

fn cmd_log_show(dbs: &Databases) -> Result<()> {
    let key = dbs.unlock()?;
    let entries = dbs.log(&key)?.entries()?;
    if entries.is_empty() {
        println!("log is empty");
        return Ok(());
    }

    for (index, entry) in entries.into_iter().enumerate() {
        match entry.and_then(|plaintext| decode_entry(&plaintext)) {
            Ok((time, text)) => println!("{}  {text}", time.format("%Y-%m-%d %H:%M:%S")),
            Err(e) => {
                tracing::warn!(row = index + 1, "unreadable log entry: {e}");
                println!("<entry {} unreadable>", index + 1);
            }
        }
    }
    Ok(())
}

fn cmd_log_prune(dbs: &Databases, days: u32) -> Result<()> {
    let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
    let key = dbs.unlock()?;
    let mut log = dbs.log(&key)?;

    let before = log.len()?;
    let kept = log.rewrite(
        |entry| decode_entry(entry).map_or(true, |(time, _)| time >= cutoff),
        None,
    )?;
    println!("removed {} of {before} entries", before - kept);
    Ok(())
}

// ── `onionlink settings` ──────────────────────────────────────────────────────

fn cmd_settings_show(dbs: &Databases) -> Result<()> {
    let key = dbs.unlock()?;
    let settings = dbs.settings(&key).load_or_create()?;
    for (name, value) in settings.values() {
        println!("  {name:<32} {value}");
    }
    Ok(())
}

fn cmd_settings_set(dbs: &Databases, name: &str, value: &str) -> Result<()> {
    let key = dbs.unlock()?;
    let db = dbs.settings(&key);
    let mut settings = db.load_or_create()?;

    // no contact or group databases exist yet, so no limit is in use
    db.change_setting(&mut settings, name, value, &SettingsContext::default())?;
    if let Some(value) = settings.get(name) {
        println!("  {name} = {value}");
    }
    Ok(())
}

// ── `onionlink passwd` ────────────────────────────────────────────────────────

fn cmd_passwd(config: &OnionlinkConfig, dbs: &Databases, calibrate: bool) -> Result<()> {
    let old_key = dbs.unlock()?;
    let new_password = read_new_password(NEW_PASSWORD_ENV)?;
    let params = kdf_params(config, calibrate)?;

    change_master_key(&dbs.profile, &old_key, &new_password, params, dbs.retry_limit)
        .context("changing master password")?;
    println!("master password changed");
    Ok(())
}

// ── `onionlink config show` ───────────────────────────────────────────────────

fn cmd_config_show(config: &OnionlinkConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
