//! kubectl-watch: print pod events as they happen
use anyhow::{Context, Result};
use clap::Parser;
use kube::{config::Kubeconfig, Client, Config};
use podwatch::{output, App, KubeClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();
    init_tracing(app.verbose);
    app.validate()?;

    let kubeconfig = match &app.kubeconfig {
        Some(path) => {
            let file = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
            Config::from_custom_kubeconfig(file, &app.kubeconfig_options())
                .await
                .context("failed to load the selected kubeconfig")?
        }
        None if app.selects_kubeconfig() => Config::from_kubeconfig(&app.kubeconfig_options())
            .await
            .context("failed to load the selected kubeconfig")?,
        None => Config::infer().await.context("failed to infer a cluster config")?,
    };
    let config = app.into_config(&kubeconfig.default_namespace)?;
    let client = Client::try_from(kubeconfig).context("failed to create the kube client")?;

    let sink = output::sink(config.output, std::io::stdout()).context("failed to write to stdout")?;
    let mut task = podwatch::start(KubeClient::new(client), &config, sink)
        .await
        .context("failed to connect to the api server")?;

    tokio::select! {
        res = &mut task => res?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, stopping the watch");
            task.cancel();
            task.await?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
