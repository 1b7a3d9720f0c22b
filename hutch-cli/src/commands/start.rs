use clap::Args;

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Id of the container(s) to start
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: StartArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let sessions = global.create_sessions();

    let mut errors = Vec::new();
    for target in args.targets {
        match sessions.start(&target).await {
            Ok(true) => println!("{}", target),
            Ok(false) => {
                eprintln!("Error: daemon refused to start '{}'", target);
                errors.push(target);
            }
            Err(e) => {
                eprintln!("Error starting container '{}': {}", target, e);
                errors.push(target);
            }
        }
    }

    if !errors.is_empty() {
        anyhow::bail!("Failed to start {} container(s)", errors.len());
    }
    Ok(())
}
