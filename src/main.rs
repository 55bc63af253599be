// src/main.rs
use clap::Parser;
use kube_client_config::cert::{describe, CertificateSummary};
use kube_client_config::utils::{FileLogger, Logger, MultiLogger, StderrLogger, SystemEnvironment};
use kube_client_config::{
    discover, Authentication, ClientConfig, ClientOptions, ConfigResolver, ConfigSource,
    ContextSelector, KubeConfig, RedirectPolicy, ResolveError, ServiceAccountResolver, Timeout,
};
use openssl::x509::X509;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Resolve the client configuration a Kubernetes client would use", long_about = None)]
pub struct Args {
    /// Kubeconfig to read instead of $KUBECONFIG / ~/.kube/config
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Context to use instead of current-context
    #[arg(long)]
    pub context: Option<String>,

    /// Only consider the in-cluster service account
    #[arg(long, conflicts_with_all = ["kubeconfig", "context"])]
    pub in_cluster: bool,

    /// Connect and read timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long, default_value_t = 5)]
    pub max_redirects: usize,

    #[arg(long)]
    pub no_redirects: bool,

    #[arg(long)]
    pub compression: bool,

    #[arg(short, long)]
    pub debug: bool,

    #[arg(long)]
    pub log_file: Option<String>,
}

impl Args {
    fn options(&self) -> ClientOptions {
        let timeout = self.timeout.map(Duration::from_secs);
        ClientOptions {
            context: self.context.clone(),
            timeout: Timeout::new(timeout, timeout),
            redirect_policy: if self.no_redirects {
                RedirectPolicy::Disallow
            } else {
                RedirectPolicy::Follow {
                    max: self.max_redirects,
                    allow_cycles: false,
                }
            },
            use_compression: self.compression,
        }
    }
}

#[derive(Serialize)]
struct Summary {
    source: ConfigSource,
    server: String,
    namespace: String,
    authentication: AuthSummary,
    trust_roots: Vec<CertificateSummary>,
    insecure_skip_verify: bool,
    timeout: Timeout,
    redirect_policy: RedirectPolicy,
    proxy: Option<String>,
    compression: bool,
}

#[derive(Serialize)]
struct AuthSummary {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate: Option<CertificateSummary>,
}

fn summarize(source: ConfigSource, config: &ClientConfig, logger: &mut dyn Logger) -> Summary {
    let certificate = match config.authentication() {
        Authentication::ClientCertificate { certificate, .. } => X509::from_pem(certificate)
            .map_err(ResolveError::from)
            .and_then(|cert| describe(&cert))
            .map_err(|e| logger.warn(&format!("Unable to describe client certificate: {}", e)))
            .ok(),
        _ => None,
    };
    let username = match config.authentication() {
        Authentication::Basic { username, .. } => Some(username.clone()),
        _ => None,
    };

    let trust_roots = config
        .trust_roots()
        .map(|roots| {
            roots
                .certificates()
                .iter()
                .filter_map(|cert| {
                    describe(cert)
                        .map_err(|e| logger.warn(&format!("Unable to describe CA: {}", e)))
                        .ok()
                })
                .collect()
        })
        .unwrap_or_default();

    Summary {
        source,
        server: config.server_url().to_string(),
        namespace: config.namespace().to_string(),
        authentication: AuthSummary {
            kind: config.authentication().kind(),
            username,
            certificate,
        },
        trust_roots,
        insecure_skip_verify: config.insecure_skip_verify(),
        timeout: config.timeout(),
        redirect_policy: config.redirect_policy(),
        proxy: config.proxy_url().map(|u| u.to_string()),
        compression: config.use_compression(),
    }
}

fn resolve(args: &Args, logger: &mut dyn Logger) -> Option<(ConfigSource, ClientConfig)> {
    let env = SystemEnvironment;
    let options = args.options();

    if args.in_cluster {
        return ServiceAccountResolver::new(&env)
            .resolve(options.timeout, options.redirect_policy, logger)
            .map(|config| {
                (
                    ConfigSource::ServiceAccount,
                    config.with_compression(options.use_compression),
                )
            });
    }

    if let Some(path) = &args.kubeconfig {
        let document = KubeConfig::load(path, &env)
            .map_err(|e| logger.warn(&e.to_string()))
            .ok()?;
        return ConfigResolver::new(&env)
            .resolve(
                &document,
                &ContextSelector::from(options.context.clone()),
                options.timeout,
                options.redirect_policy,
                logger,
            )
            .map(|config| {
                (
                    ConfigSource::Kubeconfig,
                    config.with_compression(options.use_compression),
                )
            });
    }

    discover(&env, &options, logger)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut logger = MultiLogger::new().with(Box::new(StderrLogger::new(args.debug)));
    if let Some(log_file) = &args.log_file {
        match FileLogger::new(log_file, args.debug) {
            Ok(file_logger) => logger = logger.with(Box::new(file_logger)),
            Err(e) => eprintln!("Failed to open log file {}: {}", log_file, e),
        }
    }

    let Some((source, config)) = resolve(&args, &mut logger) else {
        eprintln!("No Kubernetes client configuration could be resolved");
        return ExitCode::FAILURE;
    };

    let summary = summarize(source, &config, &mut logger);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
