use std::sync::Arc;

use clap::Args;
use tokio::sync::mpsc;

use hutch::LogListener;

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Id of the container
    pub target: String,

    /// Keep streaming new output until interrupted
    #[arg(short, long)]
    pub follow: bool,
}

/// Forwards fragments onto a channel so the collector task never blocks
/// on terminal output.
struct ChannelListener {
    tx: mpsc::UnboundedSender<String>,
}

impl LogListener for ChannelListener {
    fn on_log_updated(&self, _container_id: &str, fragment: &str) {
        let _ = self.tx.send(fragment.to_string());
    }
}

pub async fn execute(args: LogsArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let sessions = global.create_sessions();

    if !sessions.is_running(&args.target).await? {
        anyhow::bail!("Container '{}' is not running", args.target);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = Arc::new(ChannelListener { tx });
    sessions.register_listener(&args.target, &listener);

    if !sessions.start_collecting(&args.target) {
        anyhow::bail!("Already collecting logs for '{}'", args.target);
    }

    if args.follow {
        loop {
            tokio::select! {
                fragment = rx.recv() => match fragment {
                    Some(fragment) => print!("{}", fragment),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }
    } else {
        // Let the collector complete a couple of polls, then print
        // whatever accumulated.
        tokio::time::sleep(sessions.options().poll_interval * 2).await;
        print!("{}", sessions.buffered_logs(&args.target));
    }

    sessions.stop_collecting(&args.target).await;
    Ok(())
}
