use clap::Args;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only print container ids that are currently running
    #[arg(long)]
    pub running: bool,
}

pub async fn execute(args: ListArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let sessions = global.create_sessions();

    let ids = sessions.list_containers().await?;
    for id in ids {
        if args.running && !sessions.is_running(&id).await? {
            continue;
        }
        println!("{}", id);
    }
    Ok(())
}
