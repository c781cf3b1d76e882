// # dnspind - dnspin daemon
//
// Thin integration layer: parses the command line, initializes tracing and
// the runtime, performs the fatal-at-startup checks (address discoverable,
// credentials valid, zone resolvable), then hands off to the scheduler.
// All reconciliation logic lives in dnspin-core.
//
// ## Usage
//
// ```bash
// dnspind -a <API_KEY> -z <zone/domain name> -s <subdomain name>
// dnspind --API_KEY=<key> --ZONE=<zone> --SUBDOMAIN=<sub>
// dnspind -h | --help
// ```
//
// ## Exit codes
//
// - 0: clean shutdown (or help requested)
// - 1: no public address discoverable at startup
// - 2: argument-parsing error or invalid option value
// - 3: missing required options
// - 4: credential verification failed
// - 5: zone not found at the provider
//
// Once the loop is running, nothing exits the process except a signal.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use dnspin_core::traits::{AddressSource, DnsProvider, RecordType};
use dnspin_core::{Error, Reconciler, Scheduler, Settings};
use dnspin_ip_dns::ResolverAddressSource;
use dnspin_ip_http::HttpEchoSource;
use dnspin_provider_cloudflare::CloudflareProvider;

/// Where to create a scoped API token
const TOKEN_DASHBOARD_URL: &str = "https://dash.cloudflare.com/profile/api-tokens";

/// Where to add a zone to the account
const ADD_SITE_URL: &str = "https://www.cloudflare.com/a/add-site";

/// Exit codes for the startup-only fatal conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnspinExitCode {
    /// Clean shutdown (signal received)
    CleanShutdown = 0,
    /// No public address discoverable at startup
    AddressUnavailable = 1,
    /// An option carried an invalid value
    InvalidArguments = 2,
    /// One of the required options is missing
    MissingOptions = 3,
    /// The provider rejected the API token
    CredentialsRejected = 4,
    /// The zone does not exist in the account
    ZoneNotFound = 5,
}

impl From<DnspinExitCode> for ExitCode {
    fn from(code: DnspinExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "dnspind",
    version,
    about = "Keeps a DNS name pointed at this host's current public address",
    override_usage = "dnspind -a <API_KEY> -z <ZONE> -s <SUBDOMAIN>\n       dnspind --API_KEY=<API_KEY> --ZONE=<ZONE> --SUBDOMAIN=<SUBDOMAIN>"
)]
struct Cli {
    /// Provider API token (scoped, with DNS edit permission)
    #[arg(short = 'a', long = "API_KEY", value_name = "API_KEY")]
    api_key: Option<String>,

    /// Zone (domain) name the record lives under
    #[arg(short = 'z', long = "ZONE", value_name = "ZONE")]
    zone: Option<String>,

    /// Subdomain to keep pointed at this host
    #[arg(short = 's', long = "SUBDOMAIN", value_name = "SUBDOMAIN")]
    subdomain: Option<String>,

    /// Record type to manage
    #[arg(long = "record-type", value_enum, default_value = "aaaa")]
    record_type: RecordTypeArg,

    /// Seconds between reconciliation ticks
    #[arg(long = "interval", value_name = "SECS", default_value_t = 50)]
    interval: u64,

    /// Upper bound on the random extra delay added to each tick, in seconds
    #[arg(long = "jitter", value_name = "SECS", default_value_t = 0)]
    jitter: u64,

    /// Discover the address via this HTTPS echo endpoint instead of a
    /// resolver query
    #[arg(long = "ip-url", value_name = "URL")]
    ip_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum RecordTypeArg {
    A,
    Aaaa,
}

impl From<RecordTypeArg> for RecordType {
    fn from(arg: RecordTypeArg) -> Self {
        match arg {
            RecordTypeArg::A => RecordType::A,
            RecordTypeArg::Aaaa => RecordType::Aaaa,
        }
    }
}

fn main() -> ExitCode {
    // clap exits 2 on a parse error and 0 after printing help
    let cli = Cli::parse();

    let (api_key, zone, subdomain) = match (cli.api_key, cli.zone, cli.subdomain) {
        (Some(api_key), Some(zone), Some(subdomain)) => (api_key, zone, subdomain),
        _ => {
            eprintln!("Missing options.");
            let _ = Cli::command().print_help();
            return DnspinExitCode::MissingOptions.into();
        }
    };

    let settings = Settings::new(api_key, zone, subdomain)
        .with_record_type(cli.record_type.into())
        .with_interval_secs(cli.interval)
        .with_jitter_secs(cli.jitter);

    if let Err(e) = settings.validate() {
        eprintln!("{e}");
        return DnspinExitCode::InvalidArguments.into();
    }

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e}");
        return DnspinExitCode::InvalidArguments.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnspinExitCode::InvalidArguments.into();
        }
    };

    rt.block_on(run(settings, cli.ip_url)).into()
}

/// Initialize the global tracing subscriber
///
/// Level comes from `DNSPIN_LOG_LEVEL` (trace/debug/info/warn/error),
/// defaulting to info.
fn init_tracing() -> Result<()> {
    let log_level = match env::var("DNSPIN_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => anyhow::bail!("DNSPIN_LOG_LEVEL '{other}' is not a valid level"),
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Startup checks, then the forever-loop
async fn run(settings: Settings, ip_url: Option<String>) -> DnspinExitCode {
    let fqdn = settings.fqdn();
    info!(
        "managing {} record for {} (interval {}s)",
        settings.record_type, fqdn, settings.interval_secs
    );

    let source: Arc<dyn AddressSource> = match ip_url {
        Some(url) => Arc::new(HttpEchoSource::for_url(url)),
        None => Arc::new(ResolverAddressSource::new()),
    };

    // Startup discovery: a host with no public address cannot be pinned
    let family = settings.record_type.family();
    let address = match source.discover(family).await {
        Ok(address) => address,
        Err(e) => {
            eprintln!(
                "No usable public address for a {} record: {e}\n\
                 Check this host's connectivity and try again.",
                settings.record_type
            );
            return DnspinExitCode::AddressUnavailable;
        }
    };
    info!("current public address: {}", address);

    let provider = match CloudflareProvider::new(settings.api_token.clone()) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            eprintln!("{e}");
            return DnspinExitCode::InvalidArguments;
        }
    };

    match provider.verify_credentials().await {
        Ok(true) => info!("credentials verified"),
        Ok(false) => {
            eprintln!(
                "Invalid credentials: the provider rejected the API key.\n\
                 Make sure the API_KEY is correct. A scoped API token can be\n\
                 created at {TOKEN_DASHBOARD_URL}"
            );
            return DnspinExitCode::CredentialsRejected;
        }
        Err(e) => {
            eprintln!("Could not verify credentials: {e}");
            return DnspinExitCode::CredentialsRejected;
        }
    }

    let zone = match provider.find_zone(&settings.zone_name).await {
        Ok(Some(zone)) => zone,
        Ok(None) => {
            let err = Error::resolution(format!(
                "zone {} was not found in your account",
                settings.zone_name
            ));
            eprintln!(
                "{err}\n\
                 Make sure the ZONE option is correct and the domain exists\n\
                 in your account. A new domain can be added at {ADD_SITE_URL}"
            );
            return DnspinExitCode::ZoneNotFound;
        }
        Err(e) => {
            eprintln!("Could not resolve zone {}: {e}", settings.zone_name);
            return DnspinExitCode::ZoneNotFound;
        }
    };
    info!("zone {} resolved to id {}", zone.name, zone.id);

    let provider: Arc<dyn DnsProvider> = provider;
    let reconciler = Reconciler::new(provider, zone, fqdn, settings.record_type);
    let scheduler = Scheduler::new(
        source,
        reconciler,
        Duration::from_secs(settings.interval_secs),
        Duration::from_secs(settings.jitter_secs),
    );

    // Steady state: reconcile forever, stop only on a signal
    if let Err(e) = scheduler.run(address).await {
        error!("scheduler terminated: {}", e);
    }

    DnspinExitCode::CleanShutdown
}
