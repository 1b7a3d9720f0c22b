use clap::Args;

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Id of the container(s) to stop
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: StopArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let sessions = global.create_sessions();

    let mut errors = Vec::new();
    for target in args.targets {
        match sessions.stop(&target).await {
            Ok(true) => println!("{}", target),
            Ok(false) => {
                eprintln!("Error: daemon refused to stop '{}'", target);
                errors.push(target);
            }
            Err(e) => {
                eprintln!("Error stopping container '{}': {}", target, e);
                errors.push(target);
            }
        }
    }

    if !errors.is_empty() {
        anyhow::bail!("Failed to stop {} container(s)", errors.len());
    }
    Ok(())
}
