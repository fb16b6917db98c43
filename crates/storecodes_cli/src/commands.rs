use crate::cli::{Cli, Command, StoreArgs};
use serde_json::{json, Value};
use storecodes_core::{
    ConsistencyManager, DiscountCodePayload, ServiceError, ServiceResult, StorePayload,
};

/// Runs one ledger operation and renders its result as JSON.
pub fn dispatch(ledger: &ConsistencyManager<'_>, command: Command) -> Result<Value, ServiceError> {
    match command {
        Command::ListStores => render(ledger.list_stores()),
        Command::GetStore(args) => render(ledger.get_store(&args.id)),
        Command::AddStore(args) => render(ledger.add_store(&store_payload(args))),
        Command::UpdateStore(args) => {
            render(ledger.update_store(&args.id, &store_payload(args.store)))
        }
        Command::DeleteStore(args) => render(ledger.delete_store(&args.id)),
        Command::ListCodes(args) => render(ledger.list_store_discount_codes(&args.id)),
        Command::AddCode(args) => render(
            ledger.add_store_discount_code(&args.store_id, &DiscountCodePayload::new(args.value)),
        ),
        Command::GetCode(args) => render(ledger.get_discount_code(&args.id)),
        Command::DeleteCode(args) => render(ledger.delete_discount(&args.id)),
        Command::Audit => {
            let violations = ledger.verify_invariants()?;
            Ok(json!({
                "consistent": violations.is_empty(),
                "violations": violations.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }))
        }
    }
}

/// JSON body printed for a failed operation.
pub fn error_body(err: &ServiceError) -> Value {
    json!({
        "error": err.kind().as_str(),
        "message": err.to_string(),
    })
}

pub fn wants_logging(cli: &Cli) -> Option<(&str, &str)> {
    let dir = cli.log_dir.as_deref()?;
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| storecodes_core::default_log_level());
    Some((level, dir))
}

fn store_payload(args: StoreArgs) -> StorePayload {
    StorePayload {
        title: Some(args.title),
        kind: args.kind,
    }
}

fn render<T: serde::Serialize>(result: ServiceResult<T>) -> Result<Value, ServiceError> {
    let value = result?;
    serde_json::to_value(value)
        .map_err(|err| ServiceError::InconsistentState(format!("unrenderable record: {err}")))
}
