use clap::Args;

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Id of the container(s) to delete
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: RmArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let sessions = global.create_sessions();

    let mut active_error = false;
    for target in args.targets {
        match sessions.delete_container(&target).await {
            Ok(true) => println!("{}", target),
            Ok(false) => {
                eprintln!("Error: daemon refused to delete '{}'", target);
                active_error = true;
            }
            Err(e) => {
                eprintln!("Error deleting container '{}': {}", target, e);
                active_error = true;
            }
        }
    }

    if active_error {
        anyhow::bail!("Some containers could not be deleted");
    }
    Ok(())
}
