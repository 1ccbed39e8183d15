//! `etlas prompt`: print the system instruction the assistant receives.

use anyhow::{Result, bail};
use uuid::Uuid;

use crate::state::AppState;

pub async fn show_prompt(state: &AppState, scheme: Option<Uuid>, json: bool) -> Result<()> {
    let schema = match scheme {
        Some(id) => match state.scheme_service.get(id).await? {
            Some(scheme) => Some(scheme.content),
            None => bail!("scheme {id} not found"),
        },
        None => None,
    };
    let text = state.template.render_with_schema(schema.as_deref());

    if json {
        let out = serde_json::json!({
            "version": state.template.version,
            "prompt": text,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{text}");
    }
    Ok(())
}
