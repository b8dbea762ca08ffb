//! Subcommand implementations. Each returns the text printed on success.

use crate::cli::ToolCommand;
use gateway_router::{RouterConfig, RouterError};

pub fn run(config: &RouterConfig, command: &ToolCommand) -> Result<String, RouterError> {
    config.validate()?;
    let namespace = config.command_namespace()?;
    let bounds = config.service_type_bounds()?;

    match *command {
        ToolCommand::Check => Ok(format!(
            "ok: offset {}, routable service types {}..{}, relay cmd {}, stale affinity {:?}",
            namespace.offset(),
            bounds.gateway() + 1,
            bounds.size(),
            config.routing.relay_cmd,
            config.routing.stale_affinity
        )),
        ToolCommand::Decode { cmd } => {
            let (service_type, local_cmd) = namespace.decode(cmd);
            let routable = if bounds.is_routable(service_type) {
                "routable"
            } else {
                "not routable"
            };
            Ok(format!(
                "cmd {cmd}: service type {service_type}, local cmd {local_cmd} ({routable})"
            ))
        }
        ToolCommand::Encode {
            service_type,
            local_cmd,
        } => Ok(namespace.try_encode(service_type, local_cmd)?.to_string()),
    }
}
