use lambda_runtime::Error;
use log_minder_lambda::handlers::Operation;
use log_minder_lambda::runtime::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(Operation::DeleteEmptyLogGroups).await
}
