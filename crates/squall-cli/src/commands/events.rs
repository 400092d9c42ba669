//! The `events` command: tail daemon notifications.

use anyhow::anyhow;

use squall_client::Gateway;
use squall_events::Event;

use crate::cli::EventsArgs;
use crate::client::{CliError, CliResult};

/// Print one line per daemon notification until the connection ends.
pub(crate) async fn handle_events(gateway: &Gateway, args: EventsArgs) -> CliResult<()> {
    let mut events = gateway
        .events()
        .ok_or_else(|| CliError::failure(anyhow!("event stream already taken")))?;

    while let Some(event) = events.recv().await {
        if !wanted(&args, &event) {
            continue;
        }
        let rendered = serde_json::to_string(&event.args())
            .map_err(|err| CliError::failure(anyhow!("failed to render event args: {err}")))?;
        println!("{} {rendered}", event.name());
    }
    Ok(())
}

fn wanted(args: &EventsArgs, event: &Event) -> bool {
    args.kind.is_empty() || args.kind.iter().any(|kind| kind == event.name())
}
