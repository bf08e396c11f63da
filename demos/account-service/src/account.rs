//! The account model and the create-account chain.

use catena::prelude::*;
use serde_json::{json, Value};

/// Length every account id must have.
pub const ID_LENGTH: usize = 3;

/// Schema of an account item.
///
/// `id` is the key, exactly three characters long and stored upper case.
pub fn account_schema() -> Schema {
    Schema::builder()
        .attribute(
            "id",
            Attribute::string()
                .key()
                .validate(|value| match value.as_str() {
                    Some(id) if id.chars().count() == ID_LENGTH => Ok(()),
                    _ => Err("ID must be exactly 3 characters long".to_string()),
                })
                .transform(|value| match value {
                    Value::String(id) => Value::String(id.to_uppercase()),
                    other => other,
                }),
        )
        .attribute("name", Attribute::string())
        .build()
}

/// Builds the create-account chain.
pub fn create_account(config: &CatenaConfig) -> LambdaChain {
    pipeline_with(&config.pipeline)
        .with(TracingMiddleware::new(config.logging.service_name.clone()))
        .with(JsonBodyParser::new())
        .with(Validator::new(account_schema(), ValidationMode::Put))
        .handler(FnHandler::new(
            |_: &ApiGatewayProxyEvent, _: ApiGatewayProxyResult, _: &LambdaContext, ctx: &PipelineContext| {
                let result = match ctx.get_extension::<ParsedItem>() {
                    Some(parsed) => {
                        tracing::info!(account.id = ?parsed.get("id"), "account accepted");
                        Ok(ApiGatewayProxyResult::json(201, &json!({ "account": parsed.item() })))
                    }
                    None => Err(StageError::internal("validated account missing from context")),
                };
                std::future::ready(result)
            },
        ))
}
