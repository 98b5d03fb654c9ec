use auto_tagger::{Request, Response, RunConfig};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    let config = RunConfig::resolve(&event.payload);
    Ok(auto_tagger::run(&config).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    run(service_fn(function_handler)).await
}
