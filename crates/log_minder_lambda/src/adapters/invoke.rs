use aws_sdk_lambda::types::InvocationType;
use log_minder_core::fan_out::TaskSubmitter;

/// Fire-and-forget Lambda invocations: the service accepts the event and
/// runs it later; nothing is awaited beyond the acceptance.
#[derive(Debug, Clone)]
pub struct LambdaTaskSubmitter {
    lambda_client: aws_sdk_lambda::Client,
}

impl LambdaTaskSubmitter {
    pub fn new(lambda_client: aws_sdk_lambda::Client) -> Self {
        Self { lambda_client }
    }
}

impl TaskSubmitter for LambdaTaskSubmitter {
    fn submit(&self, target: &str, payload: &[u8]) -> Result<(), String> {
        let request_payload = payload.to_vec();
        let client = self.lambda_client.clone();
        let function_name = target.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .invoke()
                    .function_name(function_name)
                    .invocation_type(InvocationType::Event)
                    .set_payload(Some(request_payload.into()))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to invoke {target}: {error}"))
            })
        })
    }
}
