use refurl::errors::RefineError;
use refurl::validator::UrlValidator;
use crate::cli::commands::CheckArgs;
use tracing::info;

pub async fn handle_check(args: CheckArgs) -> Result<(), RefineError> {
    let config = super::load_config(args.config.as_deref()).await?;
    let max_concurrent = config.validation.max_concurrent;
    let validator = UrlValidator::new(config.validation)?;

    info!(urls = args.urls.len(), max_concurrent, "Validating URLs");
    let results = validator.validate_batch(&args.urls, max_concurrent).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!("{}", super::render::render_validation(result));
        }
    }
    Ok(())
}
