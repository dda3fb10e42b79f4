//! `chunkpipe pause|resume|cancel` – signal the active `chunkpipe run` over its control socket.

use anyhow::Result;
use chunkpipe_core::ControlCommand;

use crate::cli::control_socket;

pub async fn run_control(cmd: ControlCommand) -> Result<()> {
    let path = chunkpipe_core::control::default_control_socket_path()?;
    control_socket::send_command(&path, cmd).await?;
    println!("Sent {} to the active run", cmd.as_str());
    Ok(())
}
