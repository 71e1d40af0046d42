use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::identity::IdentityManager;
use crate::types::{Device, DevicesResponse, GetDeviceRequest, Location, Room};

pub const DEFAULT_API_ENDPOINT: &str = "https://wavin-api.jablotron.cloud";
pub const DEFAULT_API_VERSION: &str = "v1";

/// Client for the Wavin Sentio cloud API.
///
/// Every call asks the identity manager for a token first, so an expired
/// token is renewed transparently.
pub struct WsClient {
    client: reqwest::Client,
    identity: IdentityManager,
    endpoint: String,
    version: String,
}

impl WsClient {
    pub fn new(client: reqwest::Client, identity: IdentityManager) -> Self {
        Self::new_with_endpoint(
            client,
            identity,
            DEFAULT_API_ENDPOINT.to_string(),
            DEFAULT_API_VERSION.to_string(),
        )
    }

    pub fn new_with_endpoint(
        client: reqwest::Client,
        identity: IdentityManager,
        endpoint: String,
        version: String,
    ) -> Self {
        Self {
            client,
            identity,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            version: version.trim_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_headers(&mut self) -> Result<HeaderMap> {
        let token = self.identity.get_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = format!("Bearer {}", token.id);
        let auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| Error::InvalidResponse(format!("Token is not a valid header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Fetch a resource and decode its JSON body.
    async fn fetch<T, B>(&mut self, method: Method, url: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let headers = self.get_headers().await?;

        debug!("{} {}", method, url);
        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("Request to {} failed with status {}", url, status);
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body: response_text,
            });
        }

        serde_json::from_str::<T>(&response_text).map_err(|e| {
            debug!("Raw response: {}", response_text);
            Error::Json(e)
        })
    }

    fn versioned_url(&self, resource: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.version, resource)
    }

    pub async fn list_devices(&mut self) -> Result<Vec<Device>> {
        let url = format!("{}/ListDevices", self.endpoint);
        let response: DevicesResponse = self
            .fetch(Method::POST, &url, Some(&serde_json::json!({})))
            .await?;

        debug!("Found {} devices", response.devices.len());
        Ok(response.devices)
    }

    pub async fn get_device(&mut self, name: &str) -> Result<Device> {
        let url = format!("{}/GetDevice", self.endpoint);
        let device: Device = self
            .fetch(Method::POST, &url, Some(&GetDeviceRequest { name }))
            .await?;

        debug!("Fetched device {}", device.name);
        Ok(device)
    }

    pub async fn list_locations(&mut self) -> Result<Vec<Location>> {
        let url = self.versioned_url("locations");
        let locations: Vec<Location> = self.fetch(Method::GET, &url, None::<&()>).await?;

        debug!("Found {} locations", locations.len());
        Ok(locations)
    }

    pub async fn list_rooms(&mut self, location: &str) -> Result<Vec<Room>> {
        let url = reqwest::Url::parse_with_params(
            &self.versioned_url("rooms"),
            &[("location", location)],
        )
        .map_err(|e| Error::Config(format!("Invalid API endpoint: {}", e)))?;
        let rooms: Vec<Room> = self.fetch(Method::GET, url.as_str(), None::<&()>).await?;

        debug!("Found {} rooms in location {}", rooms.len(), location);
        Ok(rooms)
    }
}
