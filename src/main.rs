use hosttech_dns::{
    dns::{hosttech::HosttechProvider, Provider},
    settings::Settings,
};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let zone = std::env::args()
        .nth(1)
        .ok_or("usage: hosttech-dns <zone>")?;
    let cfg = Settings::new()?;

    run(cfg, &zone).await
}

async fn run(cfg: Settings, zone: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = reqwest::Client::builder();
    if let Some(timeout) = cfg.timeout()? {
        client = client.timeout(timeout);
    }
    let provider = HosttechProvider::with_client(client.build()?, cfg.api_token()?, cfg.base_url())?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling");
                cancel.cancel();
            }
        }
    });

    let records = provider.list_records(&cancel, zone).await?;
    for r in records {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            r.id,
            r.record_type,
            r.name,
            humantime::format_duration(r.ttl),
            r.priority,
            r.value,
        );
    }

    Ok(())
}
