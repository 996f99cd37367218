use super::headers::derive_headers;
use super::{HttpResponse, PageRequest, Transport, TransportError, TransportErrorKind};
use crate::config::HttpConfig;
use crate::identity::Identity;
use crate::proxy::SelectedProxy;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, Proxy};
use std::sync::Arc;
use url::Url;

/// Cookie-bearing HTTP transport
///
/// A client is built per attempt because the proxy and identity change
/// between attempts; all clients share one cookie jar, so cookies set during
/// warm-up and by earlier responses are sent on every request.
pub struct HttpSessionClient {
    jar: Arc<Jar>,
    http: HttpConfig,
}

impl HttpSessionClient {
    pub fn new(http: &HttpConfig) -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            http: http.clone(),
        }
    }

    /// The shared cookie jar
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// Stores a `Set-Cookie` style string for `url`
    pub fn add_cookie(&self, cookie: &str, url: &Url) {
        self.jar.add_cookie_str(cookie, url);
    }

    /// Builds a client for one attempt
    ///
    /// # Arguments
    ///
    /// * `identity` - Identity whose user agent and client hints are sent
    /// * `proxy` - Proxy to route through, or `None` for a direct connection
    /// * `referer` - Referer header value
    ///
    /// # Returns
    ///
    /// * `Ok(Client)` - Client with headers, proxy, cookies and timeouts applied
    /// * `Err(reqwest::Error)` - The proxy URL or TLS backend was rejected
    pub fn build_client(
        &self,
        identity: &Identity,
        proxy: Option<&SelectedProxy>,
        referer: Option<&str>,
    ) -> Result<Client, reqwest::Error> {
        let headers = derive_headers(identity, &self.http, referer, &mut rand::thread_rng());
        let connect = self.http.connect_timeout();
        let read = self.http.read_timeout();

        let mut builder = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&self.jar))
            .connect_timeout(connect)
            .read_timeout(read)
            .timeout(connect + read)
            .gzip(true)
            .brotli(true);

        builder = match proxy {
            Some(p) => {
                let mut upstream = Proxy::all(p.server_url())?;
                if let Some(credentials) = &p.credentials {
                    upstream = upstream.basic_auth(&credentials.username, &credentials.password);
                }
                builder.proxy(upstream)
            }
            None => builder.no_proxy(),
        };

        builder.build()
    }
}

#[async_trait]
impl Transport for HttpSessionClient {
    async fn get(
        &self,
        request: &PageRequest,
        identity: &Identity,
        proxy: Option<&SelectedProxy>,
    ) -> Result<HttpResponse, TransportError> {
        let client = self
            .build_client(identity, proxy, request.referer.as_deref())
            .map_err(|e| TransportError::from_reqwest(&request.url, &e))?;

        let response = client
            .get(&request.url)
            .query(&request.query)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, &e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let body = response.text().await.map_err(|e| {
            let mut error = TransportError::from_reqwest(&request.url, &e);
            if error.kind == TransportErrorKind::Connect {
                error.kind = TransportErrorKind::Other;
            }
            error
        })?;

        tracing::trace!("GET {} -> {} ({} bytes)", final_url, status, body.len());

        Ok(HttpResponse {
            status,
            final_url,
            body,
        })
    }
}
