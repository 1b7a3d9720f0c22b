use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Id to register the container under
    pub id: String,

    /// Path to the rootfs image file
    pub image: PathBuf,
}

pub async fn execute(args: AddArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let sessions = global.create_sessions();

    if sessions.add_container(&args.id, &args.image).await? {
        println!("{}", args.id);
        Ok(())
    } else {
        anyhow::bail!("Container '{}' was not added", args.id)
    }
}
