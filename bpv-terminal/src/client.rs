/// Blocking HTTP transport for the blueprint API
use std::time::Duration;

use bpv_core::{BlueprintClient, Credential, FetchError};

pub struct HttpBlueprintClient {
    http: reqwest::blocking::Client,
}

impl HttpBlueprintClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(Self { http })
    }
}

impl BlueprintClient for HttpBlueprintClient {
    fn get_blueprint(
        &self,
        url: &str,
        credential: Option<&Credential>,
    ) -> Result<String, FetchError> {
        let mut request = self.http.get(url);
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.token());
        }

        let response = request
            .send()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        response
            .text()
            .map_err(|err| FetchError::Transport(err.to_string()))
    }
}
